use std::path::Path;
use std::process::Stdio;

use log::info;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStdout, Command};
use tokio::sync::oneshot;

const READ_CHUNK: usize = 2048;

/// Arguments passed to the server process: the fixed logging flags first,
/// then the launcher's own trailing CLI arguments verbatim.
pub fn server_args(extra: &[String]) -> Vec<String> {
    let mut args = vec!["-Log".to_string(), "-Verbose".to_string()];
    args.extend(extra.iter().cloned());
    args
}

/// Spawn the entrypoint and supervise it until exit.
///
/// The child runs with `project_dir` as its working directory and the full
/// parent environment. Its stdout is owned by one reader task that logs
/// each chunk as it arrives; stderr is not captured. Clean EOF on stdout
/// is informational, while any other read error is fatal.
///
/// # Errors
/// Returns an error when the child cannot be spawned, exits non-zero (the
/// message carries the exact code), is killed by a signal, or its stdout
/// reader fails mid-stream.
pub async fn supervise(
    entrypoint: &Path,
    project_dir: &Path,
    args: &[String],
) -> Result<(), String> {
    info!("process: using entrypoint: {}", entrypoint.display());

    let mut child = Command::new(entrypoint)
        .args(args)
        .current_dir(project_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| format!("failed to start the server process: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to attach to the server stdout pipe".to_string())?;
    let mut reader_done = spawn_output_reader(stdout);
    let mut reader_finished = false;

    // A read error is fatal even while the child is still running; clean
    // EOF just means we keep waiting for the exit status.
    let status = loop {
        tokio::select! {
            outcome = &mut reader_done, if !reader_finished => {
                reader_finished = true;
                if let Ok(Err(err)) = outcome {
                    return Err(err);
                }
            }
            status = child.wait() => {
                break status
                    .map_err(|e| format!("failed to wait for the server process: {e}"))?;
            }
        }
    };

    // Drain the reader signal so a late read error still surfaces.
    if !reader_finished
        && let Ok(Err(err)) = reader_done.await
    {
        return Err(err);
    }

    interpret_exit(status)
}

/// Hand the stdout handle to a dedicated reader task. The returned channel
/// yields `Ok(())` on clean EOF and `Err` on any other read failure.
fn spawn_output_reader(mut stdout: ChildStdout) -> oneshot::Receiver<Result<(), String>> {
    let (done, signal) = oneshot::channel();
    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK];
        let outcome = loop {
            match stdout.read(&mut buf).await {
                Ok(0) => {
                    info!("the server process has exited");
                    break Ok(());
                }
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buf[..n]);
                    info!("{}", chunk.trim_end_matches('\n'));
                }
                Err(err) => {
                    break Err(format!("failed to read the server process pipe: {err}"));
                }
            }
        };
        let _ = done.send(outcome);
    });
    signal
}

fn interpret_exit(status: std::process::ExitStatus) -> Result<(), String> {
    if status.success() {
        info!("server exited normally");
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(format!("server exit code: {code}")),
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                if let Some(signal) = status.signal() {
                    return Err(format!("server killed by signal: {signal}"));
                }
            }
            Err("server exited abnormally".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builds_server_arguments_in_order() {
        assert_eq!(server_args(&[]), vec!["-Log", "-Verbose"]);
        let extra = vec!["-Port=7777".to_string(), "MyMap".to_string()];
        assert_eq!(
            server_args(&extra),
            vec!["-Log", "-Verbose", "-Port=7777", "MyMap"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn clean_exit_supervises_successfully() {
        let args = vec!["-c".to_string(), "echo serving; exit 0".to_string()];
        supervise(&PathBuf::from("/bin/sh"), Path::new("/"), &args)
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_the_exact_code() {
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let err = supervise(&PathBuf::from("/bin/sh"), Path::new("/"), &args)
            .await
            .unwrap_err();
        assert_eq!(err, "server exit code: 3");
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let err = supervise(
            &PathBuf::from("/nonexistent/FooServer"),
            Path::new("."),
            &[],
        )
        .await
        .unwrap_err();
        assert!(err.starts_with("failed to start the server process"));
    }
}
