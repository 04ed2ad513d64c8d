//! Archive download over HTTP(S)

use anyhow::{Context, Result, anyhow, bail};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::config::Timings;
use crate::install::signals;

const USER_AGENT: &str = concat!("svarog-install/", env!("CARGO_PKG_VERSION"));
const CHUNK_SIZE: usize = 64 * 1024;

/// Download `url` into `dest`, returning the number of bytes written.
///
/// Non-2xx responses are errors, and so is an interrupt received while the
/// body is streaming. A partially written file is left for the caller's temp
/// directory to clean up.
pub fn download_archive(url: &str, dest: &Path, timings: &Timings) -> Result<u64> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(timings.download_connect_timeout)
        .timeout(timings.download_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to request {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Download error for {}: HTTP {}",
            url,
            response.status()
        ));
    }

    let mut file = File::create(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let written = copy_interruptible(&mut response, &mut file)
        .with_context(|| format!("Failed to write archive to {}", dest.display()))?;
    file.flush()?;
    file.sync_all()
        .with_context(|| format!("Failed to sync {}", dest.display()))?;

    Ok(written)
}

/// Copy `reader` into `writer` chunk by chunk, stopping once an interrupt
/// has been received.
fn copy_interruptible(reader: &mut impl Read, writer: &mut impl Write) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        if signals::interrupted() {
            bail!("Download interrupted after {written} bytes");
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read response body"),
        };
        writer.write_all(&buf[..n])?;
        written += n as u64;
    }
}
