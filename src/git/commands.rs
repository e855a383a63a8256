use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};

/// One invocation of the git binary, as handed to a [`GitRunner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitCommand {
    pub args: Vec<String>,
    /// Fed to the process on stdin (patches for `git apply`).
    pub stdin: Option<String>,
    pub env: Vec<(String, String)>,
}

impl GitCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The command line as typed at a shell, without the `git` prefix.
    pub fn display(&self) -> String {
        self.args.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Non-empty stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().filter(|l| !l.is_empty())
    }
}

/// The single seam through which the core talks to git.
///
/// `run` only fails when the process could not be driven to completion
/// (spawn failure, host cancellation). A non-zero exit is a normal
/// [`GitOutput`].
pub trait GitRunner {
    fn run(&self, command: &GitCommand) -> Result<GitOutput>;
}

impl<T: GitRunner + ?Sized> GitRunner for &T {
    fn run(&self, command: &GitCommand) -> Result<GitOutput> {
        (**self).run(command)
    }
}

/// Convenience helpers layered over any [`GitRunner`].
pub trait GitRunnerExt: GitRunner {
    /// Run and turn a non-zero exit into [`Error::ExternalCommandFailed`].
    fn run_checked(&self, command: &GitCommand) -> Result<GitOutput> {
        let output = self.run(command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::ExternalCommandFailed {
                command: command.display(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim_end().to_string(),
            })
        }
    }

    fn git<I, S>(&self, args: I) -> Result<GitOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_checked(&GitCommand::new(args))
    }

    /// Run a query whose non-zero exit means "no answer" (unset config,
    /// missing ref) rather than failure. Returns trimmed stdout.
    fn query<I, S>(&self, args: I) -> Result<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output = self.run(&GitCommand::new(args))?;
        if output.success() {
            Ok(Some(output.stdout.trim_end().to_string()))
        } else {
            Ok(None)
        }
    }
}

impl<T: GitRunner + ?Sized> GitRunnerExt for T {}

/// One entry of the command history kept by [`GitCli`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

const HISTORY_LIMIT: usize = 200;

/// How often a running command checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Stops whatever command a [`GitCli`] is running, from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a cancellation so the next command runs normally.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the real git binary inside a working directory.
pub struct GitCli {
    workdir: PathBuf,
    program: String,
    history: RefCell<VecDeque<HistoryEntry>>,
    cancel: CancelHandle,
}

impl GitCli {
    pub fn new(workdir: &Path) -> Self {
        Self::with_program(workdir, "git")
    }

    pub fn with_program(workdir: &Path, program: &str) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            program: program.to_string(),
            history: RefCell::new(VecDeque::new()),
            cancel: CancelHandle::default(),
        }
    }

    /// A cancelled command is killed and reported as [`Error::Cancelled`].
    /// Stays cancelled until [`CancelHandle::reset`].
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Most recent invocations, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.borrow().iter().cloned().collect()
    }

    fn record(&self, entry: HistoryEntry) {
        let mut history = self.history.borrow_mut();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(entry);
    }
}

impl GitRunner for GitCli {
    fn run(&self, command: &GitCommand) -> Result<GitOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&command.args)
            .current_dir(&self.workdir)
            // Never block on an editor or a credential prompt.
            .env("GIT_EDITOR", "true")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        cmd.stdin(if command.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().map(read_pipe);
        let stderr = child.stderr.take().map(read_pipe);
        if let Some(input) = &command.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes())?;
            }
        }

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                tracing::info!(command = %command.display(), "git cancelled");
                return Err(Error::Cancelled);
            }
            thread::sleep(POLL_INTERVAL);
        };

        let result = GitOutput {
            stdout: String::from_utf8_lossy(&join_pipe(stdout)).into_owned(),
            stderr: String::from_utf8_lossy(&join_pipe(stderr)).into_owned(),
            exit_code: status.code().unwrap_or(-1),
        };
        tracing::debug!(
            command = %command.display(),
            exit_code = result.exit_code,
            "git"
        );
        self.record(HistoryEntry {
            command: command.display(),
            exit_code: result.exit_code,
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        });
        Ok(result)
    }
}

fn read_pipe<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_pipe(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
