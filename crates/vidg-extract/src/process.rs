//! External process invocation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::ExtractionError;

/// Run `program` to completion and capture its output.
///
/// The child is killed if the timeout elapses or the returned future is
/// dropped. `path` is the media file being worked on, for error context.
pub(crate) async fn run<I, S>(
    program: &str,
    args: I,
    timeout: Option<Duration>,
    path: &Path,
) -> Result<Output, ExtractionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExtractionError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let wait = child.wait_with_output();
    let output = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
            ExtractionError::Timeout {
                program: program.to_string(),
                path: path.to_path_buf(),
                timeout,
            }
        })?,
        None => wait.await,
    }
    .map_err(|source| ExtractionError::Process {
        program: program.to_string(),
        source,
    })?;

    debug!(
        program,
        path = %path.display(),
        status = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        "Process finished"
    );
    Ok(output)
}
