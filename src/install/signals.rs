//! Interrupt handling
//!
//! The first SIGINT/SIGTERM only sets a flag; the pipeline, backoff loops and
//! the archive download check it and turn it into an "interrupted" failure
//! with exit code 1. The handler resets to the default disposition, so a
//! second signal terminates the process.

use std::sync::atomic::{AtomicUsize, Ordering};

// Cheap, polling-based Unix signal handling (lock-free).
static RECEIVED_SIGNAL: AtomicUsize = AtomicUsize::new(0);

/// Register handlers for SIGINT and SIGTERM.
#[cfg(unix)]
pub fn install_handlers() -> anyhow::Result<()> {
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    extern "C" fn handler(sig: i32) {
        RECEIVED_SIGNAL.store(sig as usize, Ordering::SeqCst);
    }

    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only performs an atomic store.
        unsafe { signal::sigaction(sig, &action) }
            .map_err(|e| anyhow::anyhow!("Failed to register {sig} handler: {e}"))?;
    }
    Ok(())
}

/// Ctrl-C terminates the process directly on platforms without sigaction.
#[cfg(not(unix))]
pub fn install_handlers() -> anyhow::Result<()> {
    Ok(())
}

/// Whether an interrupt has been received.
pub fn interrupted() -> bool {
    RECEIVED_SIGNAL.load(Ordering::SeqCst) != 0 || simulated()
}

#[cfg(not(test))]
fn simulated() -> bool {
    false
}

#[cfg(test)]
thread_local! {
    static SIMULATED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

#[cfg(test)]
fn simulated() -> bool {
    SIMULATED.with(|flag| flag.get())
}

/// Make [`interrupted`] report true on the current thread until the guard drops.
///
/// Scoped to one thread so tests running in parallel are unaffected.
#[cfg(test)]
pub(crate) fn simulate_interrupt() -> SimulatedInterrupt {
    SIMULATED.with(|flag| flag.set(true));
    SimulatedInterrupt
}

#[cfg(test)]
pub(crate) struct SimulatedInterrupt;

#[cfg(test)]
impl Drop for SimulatedInterrupt {
    fn drop(&mut self) {
        SIMULATED.with(|flag| flag.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_interrupt_is_thread_local_and_scoped() {
        assert!(!interrupted());
        {
            let _guard = simulate_interrupt();
            assert!(interrupted());
            let other = std::thread::spawn(interrupted).join().unwrap();
            assert!(!other);
        }
        assert!(!interrupted());
    }
}
