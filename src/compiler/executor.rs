//! Compiler subprocess execution.
//!
//! Two capture modes:
//!
//! - **Blocking**: the child runs to completion and both streams are
//!   returned in full.
//! - **Streaming**: one reader task per stream forwards tagged lines into a
//!   bounded channel. The coordinating loop receives lines and waits for the
//!   child concurrently, then keeps draining until both readers hit EOF, so
//!   no line is lost after exit. Order is preserved within a stream; across
//!   streams lines arrive in whatever order the readers forward them.

use super::command::CompilerInvocation;
use crate::config::BuildConfig;
use crate::diagnostics::collect_crash_reports;
use crate::error::{Error, Result, SPAWN_FAILURE_EXIT_CODE, ToolchainFailure};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the line channel between the reader tasks and the coordinator.
pub const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Variable used to silence Python warnings in the compiler process.
pub const WARNINGS_ENV_VAR: &str = "PYTHONWARNINGS";

/// Marker appended to captured stderr when the compiler was killed.
pub const TERMINATED_BY_SIGNAL: &str = "compiler terminated by signal";

/// Extensions tried, in order, when the binary is not at its plain name.
pub const ALTERNATE_BINARY_EXTENSIONS: &[&str] = &["bin", "exe"];

/// Which output stream a line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOrigin {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl fmt::Display for StreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOrigin::Stdout => f.write_str("stdout"),
            StreamOrigin::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line of compiler output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamLine {
    /// Stream it was written to.
    pub origin: StreamOrigin,
    /// Line text without the trailing newline.
    pub line: String,
}

/// Output of a finished child process.
#[derive(Debug)]
pub struct Captured {
    /// Exit status.
    pub status: ExitStatus,
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
}

/// Why a run produced no exit status.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The process could not be started.
    #[error("failed to start: {0}")]
    Spawn(#[source] io::Error),

    /// The process started but waiting on it failed.
    #[error("failed to wait for process: {error}")]
    Wait {
        /// Underlying wait error.
        #[source]
        error: io::Error,
        /// Standard output read before the failure.
        stdout: String,
        /// Standard error read before the failure.
        stderr: String,
    },
}

/// Outcome of a successful compiler run.
#[derive(Clone, Debug, Serialize)]
pub struct BuildResult {
    /// Exit code (0).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Produced binary, when one was found.
    pub binary: Option<PathBuf>,
}

/// Runs compiler invocations for one project.
#[derive(Clone, Debug)]
pub struct BuildExecutor {
    root: PathBuf,
    build_dir: PathBuf,
    output_name: String,
}

impl BuildExecutor {
    /// Executor for the project in `config`.
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            root: config.layout.root.clone(),
            build_dir: config.build_dir(),
            output_name: config.layout.output_name.clone(),
        }
    }

    /// Runs `invocation` from the project root.
    ///
    /// In streaming mode `on_line` sees every line as it arrives; in
    /// blocking mode it is never called. A non-zero exit becomes
    /// [`Error::Toolchain`] carrying the captured output and any crash
    /// reports found in the build directory.
    pub async fn execute<F>(
        &self,
        invocation: &CompilerInvocation,
        streaming: bool,
        on_line: F,
    ) -> Result<BuildResult>
    where
        F: FnMut(&StreamLine),
    {
        tokio::fs::create_dir_all(&self.build_dir).await?;

        let mut cmd = Command::new(&invocation.program);
        cmd.args(invocation.args())
            .current_dir(&self.root)
            .stdin(Stdio::null());
        if std::env::var_os(WARNINGS_ENV_VAR).is_none() {
            cmd.env(WARNINGS_ENV_VAR, "ignore");
        }

        log::info!(
            "Running compiler ({} mode)",
            if streaming { "streaming" } else { "blocking" }
        );
        log::debug!("Compiler command: {}", invocation.display_line());

        let program = invocation.program.display().to_string();
        let captured = if streaming {
            run_streaming(cmd, on_line).await
        } else {
            run_blocking(cmd).await
        };

        let captured = match captured {
            Ok(captured) => captured,
            Err(RunError::Spawn(e)) => {
                return Err(Error::from(ToolchainFailure {
                    stderr: format!("failed to start {program}: {e}"),
                    command: program,
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                    stdout: String::new(),
                    crash_reports: Vec::new(),
                }));
            }
            Err(RunError::Wait {
                error,
                stdout,
                stderr,
            }) => {
                log::error!("Lost track of the compiler: {error}");
                let mut failure = wait_failure(program, &error, stdout, stderr);
                failure.crash_reports = collect_crash_reports(&self.build_dir).await;
                return Err(Error::from(failure));
            }
        };

        let exit_code = exit_code(captured.status);
        if exit_code != 0 {
            log::error!("Compiler exited with code {exit_code}");
            let mut stderr = captured.stderr;
            if let Some(signal) = termination_signal(captured.status) {
                stderr.push_str(&format!("{TERMINATED_BY_SIGNAL} {signal}\n"));
            }
            return Err(Error::from(ToolchainFailure {
                command: program,
                exit_code,
                stdout: captured.stdout,
                stderr,
                crash_reports: collect_crash_reports(&self.build_dir).await,
            }));
        }

        let binary = locate_binary(&self.build_dir, &self.output_name);
        match &binary {
            Some(path) => log::info!("Executable generated: {}", path.display()),
            None => log::warn!(
                "Compiler succeeded but no {} binary was found in {}",
                self.output_name,
                self.build_dir.display()
            ),
        }

        Ok(BuildResult {
            exit_code,
            stdout: captured.stdout,
            stderr: captured.stderr,
            binary,
        })
    }
}

/// Toolchain failure for a compiler whose exit status could not be read.
///
/// Exits 1 and keeps whatever output was captured, followed by the wait error.
pub fn wait_failure(
    command: String,
    error: &io::Error,
    stdout: String,
    mut stderr: String,
) -> ToolchainFailure {
    if !stderr.is_empty() && !stderr.ends_with('\n') {
        stderr.push('\n');
    }
    stderr.push_str(&format!("failed to wait for {command}: {error}\n"));
    ToolchainFailure {
        command,
        exit_code: 1,
        stdout,
        stderr,
        crash_reports: Vec::new(),
    }
}

/// Runs `cmd` to completion with both streams captured.
pub async fn run_blocking(mut cmd: Command) -> std::result::Result<Captured, RunError> {
    let child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RunError::Spawn)?;
    let output = child
        .wait_with_output()
        .await
        .map_err(|error| RunError::Wait {
            error,
            stdout: String::new(),
            stderr: String::new(),
        })?;
    Ok(Captured {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Runs `cmd`, handing each output line to `on_line` as it arrives.
///
/// If waiting on the child fails it is killed, the reader tasks are aborted
/// and the lines already received come back in [`RunError::Wait`].
pub async fn run_streaming<F>(
    mut cmd: Command,
    mut on_line: F,
) -> std::result::Result<Captured, RunError>
where
    F: FnMut(&StreamLine),
{
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RunError::Spawn)?;

    let (tx, mut rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
    let readers = [
        child
            .stdout
            .take()
            .map(|out| spawn_reader(out, StreamOrigin::Stdout, tx.clone())),
        child
            .stderr
            .take()
            .map(|err| spawn_reader(err, StreamOrigin::Stderr, tx.clone())),
    ];
    // The channel closes once both readers have finished.
    drop(tx);

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut status = None;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(line) => {
                    on_line(&line);
                    record(&line, &mut stdout, &mut stderr);
                }
                None => break,
            },
            exited = child.wait(), if status.is_none() => match exited {
                Ok(exited) => {
                    log::debug!("Compiler exited ({exited}); draining remaining output");
                    status = Some(exited);
                }
                Err(error) => {
                    if let Err(e) = child.start_kill() {
                        log::warn!("Failed to kill compiler: {e}");
                    }
                    for reader in readers.iter().flatten() {
                        reader.abort();
                    }
                    while let Ok(line) = rx.try_recv() {
                        on_line(&line);
                        record(&line, &mut stdout, &mut stderr);
                    }
                    return Err(RunError::Wait { error, stdout, stderr });
                }
            }
        }
    }

    let status = match status {
        Some(status) => status,
        None => match child.wait().await {
            Ok(status) => status,
            Err(error) => return Err(RunError::Wait { error, stdout, stderr }),
        },
    };

    for reader in readers.into_iter().flatten() {
        if let Err(e) = reader.await {
            log::warn!("Output reader task failed: {e}");
        }
    }

    Ok(Captured {
        status,
        stdout,
        stderr,
    })
}

fn record(line: &StreamLine, stdout: &mut String, stderr: &mut String) {
    let buf = match line.origin {
        StreamOrigin::Stdout => stdout,
        StreamOrigin::Stderr => stderr,
    };
    buf.push_str(&line.line);
    buf.push('\n');
}

fn spawn_reader<R>(stream: R, origin: StreamOrigin, tx: mpsc::Sender<StreamLine>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buf)).into_owned();
                    if tx.send(StreamLine { origin, line }).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read compiler {origin}: {e}");
                    break;
                }
            }
        }
    })
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Exit code to propagate. Termination by a signal maps to 1.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Signal that terminated the process, if any.
pub fn termination_signal(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    }
    #[cfg(not(unix))]
    {
        let _ = status;
        None
    }
}

/// Finds the produced binary: the plain name first, then alternate extensions.
pub fn locate_binary(build_dir: &Path, output_name: &str) -> Option<PathBuf> {
    std::iter::once(build_dir.join(output_name))
        .chain(
            ALTERNATE_BINARY_EXTENSIONS
                .iter()
                .map(|ext| build_dir.join(format!("{output_name}.{ext}"))),
        )
        .find(|path| path.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::PackageSettings;
    use crate::config::{JitMode, ProjectLayout, TargetPlatform};

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            layout: ProjectLayout::new(root),
            python: PathBuf::from("sh"),
            platform: TargetPlatform::Linux,
            encrypt_data: false,
            compression: false,
            version: "0.1.0".to_string(),
            stream_output: false,
            jit_mode: JitMode::Auto,
            formats: Vec::new(),
            package: PackageSettings::default(),
        }
    }

    /// `sh -c <script> main.py`; the entry lands in `$0`.
    fn shell(script: &str) -> CompilerInvocation {
        CompilerInvocation {
            program: PathBuf::from("sh"),
            leading: vec!["-c".to_string(), script.to_string()],
            flags: Vec::new(),
            entry: "main.py".to_string(),
        }
    }

    fn sh_command(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn streaming_delivers_every_line_once_in_stream_order() {
        let script = r#"
            i=1
            while [ $i -le 40 ]; do
                echo "out $i"
                echo "err $i" >&2
                if [ $((i % 10)) -eq 0 ]; then sleep 0.05; fi
                i=$((i + 1))
            done
            printf 'tail without newline'
        "#;

        let mut delivered = Vec::new();
        let captured = run_streaming(sh_command(script), |line| delivered.push(line.clone()))
            .await
            .unwrap();
        assert!(captured.status.success());

        let stdout: Vec<_> = delivered
            .iter()
            .filter(|l| l.origin == StreamOrigin::Stdout)
            .map(|l| l.line.as_str())
            .collect();
        let stderr: Vec<_> = delivered
            .iter()
            .filter(|l| l.origin == StreamOrigin::Stderr)
            .map(|l| l.line.as_str())
            .collect();

        let mut expected_out: Vec<String> = (1..=40).map(|i| format!("out {i}")).collect();
        expected_out.push("tail without newline".to_string());
        let expected_err: Vec<String> = (1..=40).map(|i| format!("err {i}")).collect();

        assert_eq!(stdout, expected_out);
        assert_eq!(stderr, expected_err);
        assert_eq!(delivered.len(), 81);
        assert!(captured.stdout.starts_with("out 1\nout 2\n"));
        assert!(captured.stderr.ends_with("err 40\n"));
    }

    #[tokio::test]
    async fn streaming_drains_output_written_just_before_exit() {
        let script = "i=0; while [ $i -lt 500 ]; do echo line$i; i=$((i+1)); done; exit 4";
        let mut count = 0;
        let captured = run_streaming(sh_command(script), |_| count += 1).await.unwrap();
        assert_eq!(count, 500);
        assert_eq!(exit_code(captured.status), 4);
    }

    #[tokio::test]
    async fn blocking_mode_captures_both_streams() {
        let captured = run_blocking(sh_command("echo hello; echo oops >&2")).await.unwrap();
        assert!(captured.status.success());
        assert_eq!(captured.stdout, "hello\n");
        assert_eq!(captured.stderr, "oops\n");
    }

    #[tokio::test]
    async fn failure_carries_output_and_crash_report() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let executor = BuildExecutor::new(&cfg);
        let inv = shell(
            "echo compiling; echo 'fatal error' >&2; \
             echo 'Traceback: boom' > build/nuitka-crash-report.txt; exit 1",
        );

        for streaming in [false, true] {
            let err = executor.execute(&inv, streaming, |_| {}).await.unwrap_err();
            assert_eq!(err.exit_code(), 1);
            match err {
                Error::Toolchain(failure) => {
                    assert_eq!(failure.stdout, "compiling\n");
                    assert_eq!(failure.stderr, "fatal error\n");
                    assert_eq!(failure.crash_reports.len(), 1);
                    assert!(failure.crash_reports[0].contents.contains("Traceback: boom"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn killed_compiler_exits_one_and_names_the_signal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let executor = BuildExecutor::new(&cfg);

        let err = executor
            .execute(&shell("kill -9 $$"), false, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
        match err {
            Error::Toolchain(failure) => {
                assert!(failure.stderr.ends_with(&format!("{TERMINATED_BY_SIGNAL} 9\n")));
                assert!(crate::diagnostics::looks_like_oom(failure.exit_code, &failure.stderr));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn success_locates_binary_with_alternate_extension() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let executor = BuildExecutor::new(&cfg);
        let inv = shell("echo \"$PYTHONWARNINGS\"; : > build/EXECUTABLE.bin");

        let result = executor.execute(&inv, false, |_| {}).await.unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.binary, Some(dir.path().join("build/EXECUTABLE.bin")));
        if std::env::var_os(WARNINGS_ENV_VAR).is_none() {
            assert_eq!(result.stdout, "ignore\n");
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let executor = BuildExecutor::new(&cfg);
        let mut inv = shell("true");
        inv.program = dir.path().join("no-such-python");

        let err = executor.execute(&inv, false, |_| {}).await.unwrap_err();
        assert_eq!(err.exit_code(), SPAWN_FAILURE_EXIT_CODE);
    }

    #[test]
    fn lost_child_keeps_partial_output_and_exits_one() {
        let error = io::Error::other("no child processes");
        let failure = wait_failure(
            "python3".to_string(),
            &error,
            "Nuitka: compiling\n".to_string(),
            "Nuitka-Options: used".to_string(),
        );

        assert_eq!(failure.exit_code, 1);
        assert_eq!(failure.stdout, "Nuitka: compiling\n");
        assert_eq!(
            failure.stderr,
            "Nuitka-Options: used\nfailed to wait for python3: no child processes\n"
        );
        assert_eq!(Error::from(failure).exit_code(), 1);
    }

    #[tokio::test]
    async fn spawn_error_is_not_a_wait_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-python");
        for streaming in [false, true] {
            let cmd = Command::new(&missing);
            let err = if streaming {
                run_streaming(cmd, |_| {}).await.unwrap_err()
            } else {
                run_blocking(cmd).await.unwrap_err()
            };
            assert!(matches!(err, RunError::Spawn(_)), "{err}");
        }
    }

    #[test]
    fn plain_binary_name_wins_over_alternates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.bin"), b"").unwrap();
        std::fs::write(dir.path().join("app"), b"").unwrap();
        assert_eq!(locate_binary(dir.path(), "app"), Some(dir.path().join("app")));
        assert_eq!(locate_binary(dir.path(), "other"), None);
    }
}
