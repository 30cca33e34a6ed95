//! Blocking subprocess execution for external collaborators.
//!
//! Output is captured into scratch files rather than pipes so that a chatty
//! child can never block on a full pipe while we poll for exit. All scratch
//! files are removed when they go out of scope, on every path.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::error::CollaboratorError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `program --version` and return its first line.
pub fn probe(program: &str) -> Result<String, CollaboratorError> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| CollaboratorError::Missing {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CollaboratorError::Failed {
            program: program.to_string(),
            path: program.into(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let banner = String::from_utf8_lossy(&output.stdout);
    Ok(banner.lines().next().unwrap_or_default().trim().to_string())
}

/// Run `program args... input` and return its stdout.
///
/// With `timeout` set, the child is killed once it has run that long.
pub fn run_captured(
    program: &str,
    args: &[String],
    input: &Path,
    timeout: Option<Duration>,
) -> Result<String, CollaboratorError> {
    let io_err = |source: std::io::Error| CollaboratorError::Io {
        path: input.to_path_buf(),
        source,
    };

    let mut stdout = tempfile::tempfile().map_err(io_err)?;
    let mut stderr = tempfile::tempfile().map_err(io_err)?;

    debug!(program, input = %input.display(), "running collaborator");
    let mut child = Command::new(program)
        .args(args)
        .arg(input)
        .stdin(Stdio::null())
        .stdout(stdout.try_clone().map_err(io_err)?)
        .stderr(stderr.try_clone().map_err(io_err)?)
        .spawn()
        .map_err(|source| CollaboratorError::Missing {
            program: program.to_string(),
            source,
        })?;

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().map_err(io_err)? {
            break status;
        }
        if let Some(limit) = timeout {
            if started.elapsed() > limit {
                warn!(program, input = %input.display(), "collaborator timed out, killing");
                drop(child.kill());
                drop(child.wait());
                return Err(CollaboratorError::TimedOut {
                    program: program.to_string(),
                    path: input.to_path_buf(),
                    timeout_secs: limit.as_secs(),
                });
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    if !status.success() {
        return Err(CollaboratorError::Failed {
            program: program.to_string(),
            path: input.to_path_buf(),
            code: status.code(),
            stderr: read_all(&mut stderr).map_err(io_err)?.trim().to_string(),
        });
    }

    read_all(&mut stdout).map_err(io_err)
}

/// Copy `source` into a scratch file under `dir`, optionally preceded by a
/// `prelude` line. The file is deleted when the handle is dropped.
pub fn scratch_copy(
    source: &Path,
    dir: &Path,
    prelude: Option<&str>,
) -> Result<NamedTempFile, CollaboratorError> {
    let io_err = |source_err: std::io::Error| CollaboratorError::Io {
        path: source.to_path_buf(),
        source: source_err,
    };

    let contents = fs::read(source).map_err(io_err)?;
    let mut scratch = tempfile::Builder::new()
        .prefix(".calltrees-")
        .suffix(
            &source
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
        )
        .tempfile_in(dir)
        .map_err(io_err)?;

    if let Some(line) = prelude {
        writeln!(scratch, "{}", line).map_err(io_err)?;
    }
    scratch.write_all(&contents).map_err(io_err)?;
    scratch.flush().map_err(io_err)?;
    Ok(scratch)
}

fn read_all(file: &mut fs::File) -> std::io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
