use log::{error, warn};

use svarog_install::cli::Args;
use svarog_install::install::{self, SystemCommandRunner, signals};
use svarog_install::{InstallError, InstallOutcome, config, logging};

fn main() {
    let args = Args::parse_args();
    logging::init(args.verbose);

    if let Err(e) = signals::install_handlers() {
        warn!("Failed to install signal handlers: {e:#}");
    }

    let code = match real_main(&args) {
        Ok(outcome) => outcome.exit_code(),
        Err(InstallError::Step(e)) => {
            error!("Unexpected error: {e:#}");
            1
        }
        Err(e) => {
            error!("{e}");
            1
        }
    };
    std::process::exit(code);
}

fn real_main(args: &Args) -> Result<InstallOutcome, InstallError> {
    let config = config::resolve(args)?;
    install::run_install(&config, &SystemCommandRunner::new())
}
