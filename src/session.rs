use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use porcelain::git::{CancelHandle, HistoryEntry};
use porcelain::popup::{detect_scope, Context, Dispatch, Dispatcher, HostAction, Outcome, PopupKind, PopupRows};
use porcelain::status::{Change, HeadInfo, Selection, Status, StatusOptions, StatusRow};
use porcelain::{GitCli, GitConfig, Interaction};

use crate::config::AppConfig;

/// Work the UI hands to the session. Jobs run one at a time, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Refresh,
    OpenPopup(PopupKind),
    /// Open `popup` and feed it `key` in one go.
    Shortcut { popup: PopupKind, key: String },
    PopupKey(String),
    History,
    Toggle(usize),
    Locate(usize),
    Stage(Selection),
    StageTracked,
    StageAll,
    Unstage(Selection),
    UnstageAll,
    Discard(Selection),
    Untrack(Selection),
}

/// Everything the UI draws from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub head: HeadInfo,
    pub rows: Vec<StatusRow>,
    pub popup: Option<PopupView>,
}

#[derive(Debug, Clone)]
pub struct PopupView {
    pub rows: PopupRows,
    /// Keys typed so far of an unfinished chord.
    pub pending: Vec<String>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub snapshot: Snapshot,
    /// Text for the message line; the flag marks errors.
    pub message: Option<(String, bool)>,
    /// Output to open in the viewer.
    pub show: Option<(String, String)>,
    /// An action the UI carries out itself.
    pub host: Option<HostAction>,
    /// File and line to show in the viewer.
    pub open: Option<(PathBuf, Option<u32>)>,
}

impl Report {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: Some((message.into(), false)),
            ..Self::default()
        }
    }
}

/// The core objects of one repository: the git runner, the status model and
/// the popup stack.
pub struct Session {
    git: GitCli,
    status: Status,
    dispatcher: Dispatcher,
}

impl Session {
    pub fn load(workdir: &Path, config: &AppConfig) -> Result<Self> {
        let git = GitCli::with_program(workdir, &config.git);
        let options = StatusOptions {
            context_lines: config.context_lines,
            recent_commits: config.recent_commits,
        };
        let status = Status::load(&git, options).context("Failed to read repository status")?;
        Ok(Self {
            git,
            status,
            dispatcher: Dispatcher::new(),
        })
    }

    /// Handle the UI keeps to cancel the command of a running job.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.git.cancel_handle()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            head: self.status.tree().head.clone(),
            rows: self.status.rows().to_vec(),
            popup: self.dispatcher.current().map(|state| PopupView {
                rows: state.rows(),
                pending: self.dispatcher.pending().to_vec(),
                depth: self.dispatcher.depth(),
            }),
        }
    }

    /// Run one job to completion. Failures become an error message; they
    /// never tear the session down.
    pub fn run(&mut self, job: Job, ui: &mut dyn Interaction) -> Report {
        tracing::debug!(?job, "running job");
        self.git.cancel_handle().reset();
        let mut report = match self.dispatch(job, ui) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(%err, "job failed");
                Report {
                    message: Some((err.to_string(), true)),
                    ..Report::default()
                }
            }
        };
        report.snapshot = self.snapshot();
        report
    }

    fn dispatch(&mut self, job: Job, ui: &mut dyn Interaction) -> porcelain::Result<Report> {
        let git = &self.git;
        let report = match job {
            Job::Refresh => {
                self.status.refresh(git)?;
                Report::default()
            }
            Job::OpenPopup(kind) => {
                self.open(kind)?;
                Report::default()
            }
            Job::Shortcut { popup, key } => {
                self.open(popup)?;
                self.popup_key(&key, ui)?
            }
            Job::PopupKey(key) => self.popup_key(&key, ui)?,
            Job::History => self.outcome(Outcome::Host(HostAction::History))?,
            Job::Toggle(row) => {
                self.status.toggle(row);
                Report::default()
            }
            Job::Locate(row) => match self.status.location(row) {
                Some((path, line)) => Report {
                    open: Some((git.workdir().join(path), line)),
                    ..Report::default()
                },
                None => Report::info("Not on a file"),
            },
            Job::Stage(selection) => {
                let change = self.status.stage(git, selection)?;
                describe(change, "Staged", "Nothing to stage")
            }
            Job::StageTracked => {
                let change = self.status.stage_tracked(git)?;
                describe(change, "Staged tracked files", "Nothing to stage")
            }
            Job::StageAll => {
                let change = self.status.stage_all(git)?;
                describe(change, "Staged everything", "Nothing to stage")
            }
            Job::Unstage(selection) => {
                let change = self.status.unstage(git, selection)?;
                describe(change, "Unstaged", "Nothing to unstage")
            }
            Job::UnstageAll => {
                let change = self.status.unstage_all(git)?;
                describe(change, "Unstaged everything", "Nothing to unstage")
            }
            Job::Discard(selection) => {
                let change = self.status.discard(git, ui, selection)?;
                describe(change, "Discarded", "Nothing to discard")
            }
            Job::Untrack(selection) => {
                let change = self.status.untrack(git, selection)?;
                describe(change, "Untracked", "Nothing to untrack")
            }
        };
        Ok(report)
    }

    fn open(&mut self, kind: PopupKind) -> porcelain::Result<()> {
        let config = GitConfig::new(&self.git);
        let scope = detect_scope(&self.git, &config)?;
        self.dispatcher.open(kind, scope, &config);
        Ok(())
    }

    fn popup_key(&mut self, key: &str, ui: &mut dyn Interaction) -> porcelain::Result<Report> {
        let config = GitConfig::new(&self.git);
        let mut ctx = Context::new(&self.git, &config, ui);
        let outcome = match self.dispatcher.key(key, &mut ctx)? {
            Dispatch::Invoke(invocation) => {
                tracing::info!(popup = %invocation.popup, key = %invocation.key, "action fired");
                invocation.execute(&mut ctx)?
            }
            Dispatch::Message(message) => return Ok(Report::info(message)),
            _ => return Ok(Report::default()),
        };
        self.outcome(outcome)
    }

    fn outcome(&mut self, outcome: Outcome) -> porcelain::Result<Report> {
        let report = match outcome {
            Outcome::Completed {
                command,
                message,
                refresh,
            } => {
                if refresh {
                    self.status.refresh(&self.git)?;
                }
                Report::info(message.unwrap_or_else(|| format!("git {command}")))
            }
            Outcome::Show { title, text } => Report {
                show: Some((title, text)),
                ..Report::default()
            },
            Outcome::Declined => Report::info("Cancelled"),
            Outcome::Aborted { message } => match message {
                Some(message) => Report::info(message),
                None => Report::default(),
            },
            Outcome::Host(HostAction::Refresh) => {
                self.status.refresh(&self.git)?;
                Report::info("Refreshed")
            }
            Outcome::Host(HostAction::History) => Report {
                show: Some(("Git command history".to_string(), history_text(&self.git.history()))),
                ..Report::default()
            },
            Outcome::Host(action) => Report {
                host: Some(action),
                ..Report::default()
            },
        };
        Ok(report)
    }
}

fn describe(change: Change, applied: &str, unchanged: &str) -> Report {
    match change {
        Change::Applied => Report::info(applied),
        Change::Declined => Report::info("Cancelled"),
        Change::Unchanged => Report::info(unchanged),
    }
}

/// Newest first, each command followed by its indented output.
fn history_text(history: &[HistoryEntry]) -> String {
    let mut out = String::new();
    for entry in history.iter().rev() {
        let mark = if entry.exit_code == 0 { ' ' } else { '!' };
        out.push_str(&format!("{mark} {:>3}  git {}\n", entry.exit_code, entry.command));
        for line in entry.stdout.lines().chain(entry.stderr.lines()) {
            out.push_str("        ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use porcelain::interaction::Decline;
    use porcelain::status::{RowTarget, SectionKind};
    use std::fs;
    use std::process::Command;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?}");
    }

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q", "-b", "master"]);
        fs::write(dir.path().join("tracked.txt"), "one\n").unwrap();
        git(dir.path(), &["add", "tracked.txt"]);
        git(dir.path(), &["commit", "-q", "-m", "Initial commit"]);
        dir
    }

    fn row_of(snapshot: &Snapshot, target: RowTarget) -> usize {
        snapshot
            .rows
            .iter()
            .position(|r| r.target == target)
            .unwrap()
    }

    #[test]
    fn staging_a_section_moves_it_to_the_index() {
        if !git_available() {
            return;
        }
        let dir = repo();
        fs::write(dir.path().join("new.txt"), "hello\n").unwrap();

        let mut session = Session::load(dir.path(), &AppConfig::default()).unwrap();
        let at = row_of(&session.snapshot(), RowTarget::Section(SectionKind::Untracked));
        let report = session.run(Job::Stage(Selection::row(at)), &mut Decline);

        assert_eq!(report.message, Some(("Staged".to_string(), false)));
        assert_eq!(session.status.tree().count(SectionKind::Untracked), 0);
        assert_eq!(session.status.tree().count(SectionKind::Staged), 1);
    }

    #[test]
    fn history_host_action_opens_the_command_log() {
        if !git_available() {
            return;
        }
        let dir = repo();
        let mut session = Session::load(dir.path(), &AppConfig::default()).unwrap();
        let report = session.run(
            Job::Shortcut {
                popup: PopupKind::Help,
                key: "$".to_string(),
            },
            &mut Decline,
        );
        let (title, text) = report.show.unwrap();
        assert_eq!(title, "Git command history");
        assert!(text.contains("git diff --no-color --no-ext-diff --cached"));
        assert!(report.snapshot.popup.is_none());
    }

    #[test]
    fn popup_keys_update_the_snapshot() {
        if !git_available() {
            return;
        }
        let dir = repo();
        let mut session = Session::load(dir.path(), &AppConfig::default()).unwrap();
        let report = session.run(Job::OpenPopup(PopupKind::Log), &mut Decline);
        let popup = report.snapshot.popup.unwrap();
        assert_eq!(popup.depth, 1);

        let report = session.run(Job::PopupKey("<esc>".to_string()), &mut Decline);
        assert!(report.snapshot.popup.is_none());
    }

    #[test]
    fn failures_surface_as_error_messages() {
        if !git_available() {
            return;
        }
        let dir = repo();
        let mut session = Session::load(dir.path(), &AppConfig::default()).unwrap();
        let report = session.run(Job::Stage(Selection::row(10_000)), &mut Decline);
        let (_, is_error) = report.message.unwrap();
        assert!(is_error);
    }

    #[test]
    fn history_lists_newest_first() {
        let entries = vec![
            HistoryEntry {
                command: "status".into(),
                exit_code: 0,
                stdout: "clean\n".into(),
                stderr: String::new(),
            },
            HistoryEntry {
                command: "push".into(),
                exit_code: 128,
                stdout: String::new(),
                stderr: "rejected\n".into(),
            },
        ];
        assert_eq!(
            history_text(&entries),
            "! 128  git push\n        rejected\n    0  git status\n        clean\n"
        );
    }
}
