//! Running a fired action: operands are resolved, guards consulted, and the
//! final argument list handed to the git runner.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::spec::*;
use crate::error::{Error, Result};
use crate::git::commands::{GitCommand, GitRunner, GitRunnerExt};
use crate::git::config::ConfigStore;
use crate::git::query::Query;
use crate::interaction::Interaction;

/// The collaborators an action may touch.
pub struct Context<'a> {
    pub git: &'a dyn GitRunner,
    pub config: &'a dyn ConfigStore,
    pub ui: &'a mut dyn Interaction,
}

impl<'a> Context<'a> {
    pub fn new(
        git: &'a dyn GitRunner,
        config: &'a dyn ConfigStore,
        ui: &'a mut dyn Interaction,
    ) -> Self {
        Self { git, config, ui }
    }

    fn query(&self) -> Query<'_, dyn GitRunner + 'a> {
        Query::new(self.git)
    }
}

/// What the host gets back after running an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran; refresh the status view when `refresh` is set.
    Completed {
        command: String,
        message: Option<String>,
        refresh: bool,
    },
    /// Output to display, e.g. a log or a diff.
    Show { title: String, text: String },
    /// A confirmation was answered with no. Nothing ran.
    Declined,
    /// A prompt was dismissed or had nothing to offer. Nothing ran.
    Aborted { message: Option<String> },
    /// An action the host performs itself.
    Host(HostAction),
}

/// A terminal action together with the arguments its popup had when fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub popup: PopupKind,
    pub key: String,
    pub description: String,
    pub kind: ActionKind,
    pub arguments: Vec<String>,
    pub scope: Scope,
}

/// Early exits while resolving operands.
enum Stop {
    Failed(Error),
    Aborted(Option<String>),
}

impl From<Error> for Stop {
    fn from(err: Error) -> Self {
        Stop::Failed(err)
    }
}

type Step<T> = std::result::Result<T, Stop>;

fn dismissed<T>() -> Step<T> {
    Err(Stop::Aborted(None))
}

impl CommandInvocation {
    /// Run the action. External failures come back as errors; declined
    /// confirmations and dismissed prompts are outcomes.
    pub fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        tracing::info!(popup = %self.popup, key = %self.key, "dispatching action");
        let step = match &self.kind {
            ActionKind::Run(run) => self.run(run, ctx),
            ActionKind::Host(action) => Ok(Outcome::Host(*action)),
            ActionKind::Ignore(scope) => ignore(*scope, ctx),
            ActionKind::Popup(_) | ActionKind::ScopedPopup { .. } => Ok(Outcome::Aborted { message: None }),
        };
        match step {
            Ok(outcome) => Ok(outcome),
            Err(Stop::Aborted(message)) => Ok(Outcome::Aborted { message }),
            Err(Stop::Failed(err)) => {
                tracing::warn!(%err, "action failed");
                Err(err)
            }
        }
    }

    fn run(&self, run: &RunSpec, ctx: &mut Context<'_>) -> Step<Outcome> {
        let mut resolver = Resolver {
            ctx,
            extra_flags: Vec::new(),
            config_writes: Vec::new(),
        };
        let mut operands = Vec::with_capacity(run.operands.len());
        for operand in &run.operands {
            let resolved = resolver.resolve(operand, &operands)?;
            operands.push(resolved);
        }

        let mut args = run.args.clone();
        // Pathspecs after `--` have to stay last.
        let mut pathspec = Vec::new();
        if run.with_arguments {
            let split = self
                .arguments
                .iter()
                .position(|a| a == "--")
                .unwrap_or(self.arguments.len());
            args.extend_from_slice(&self.arguments[..split]);
            pathspec.extend_from_slice(&self.arguments[split..]);
        }

        match &run.guard {
            Some(Guard::Confirm(prompt)) => {
                let prompt = fill_template(prompt, &operands);
                if !resolver.ctx.ui.confirm(&prompt) {
                    return Ok(Outcome::Declined);
                }
            }
            Some(Guard::PushDivergence) => {
                if !resolver.check_divergence(&args, &operands)? {
                    return Ok(Outcome::Declined);
                }
            }
            None => {}
        }

        for (key, value) in resolver.config_writes.drain(..) {
            resolver.ctx.config.set(&key, &value)?;
        }
        args.extend(resolver.extra_flags.drain(..));
        args.extend(operands.iter().flatten().cloned());
        args.extend(pathspec);

        let mut command = GitCommand::new(args);
        for (key, value) in &run.env {
            command = command.env(key.as_str(), value.as_str());
        }
        let shown = command.display();
        tracing::info!(command = %shown, "running action");
        let output = resolver.ctx.git.run_checked(&command)?;

        if run.view {
            return Ok(Outcome::Show {
                title: self.description.clone(),
                text: output.stdout,
            });
        }
        Ok(Outcome::Completed {
            command: shown,
            message: run.message.as_deref().map(|m| fill_template(m, &operands)),
            refresh: true,
        })
    }
}

/// Replace `{n}` with the n-th resolved operand.
fn fill_template(template: &str, operands: &[Vec<String>]) -> String {
    operands
        .iter()
        .enumerate()
        .fold(template.to_string(), |out, (i, operand)| {
            out.replace(&format!("{{{i}}}"), &operand.join(" "))
        })
}

struct Resolver<'c, 'a> {
    ctx: &'c mut Context<'a>,
    /// Flags a resolution step asks for, e.g. `--set-upstream`.
    extra_flags: Vec<String>,
    /// Config a resolution step bootstraps; written once every guard passed.
    config_writes: Vec<(String, String)>,
}

impl Resolver<'_, '_> {
    fn resolve(&mut self, operand: &Operand, earlier: &[Vec<String>]) -> Step<Vec<String>> {
        match operand {
            Operand::Lit(value) => Ok(vec![value.clone()]),
            Operand::CurrentBranch => Ok(vec![self.current_branch()?]),
            Operand::PushRemote(form) => self.push_remote(*form),
            Operand::Upstream(form) => self.upstream(*form),
            Operand::RemoteBranch { prompt } => {
                let choice = self.choose(prompt, Candidates::RemoteBranches)?;
                let (remote, branch) = self.split_remote_ref(&choice)?;
                Ok(vec![remote, branch])
            }
            Operand::Choose {
                prompt,
                from,
                format,
            } => {
                let choice = self.choose(prompt, *from)?;
                let value = match from {
                    // Candidates carry a description after the name.
                    Candidates::Commits | Candidates::Stashes => choice
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    _ => choice,
                };
                Ok(vec![match format {
                    Some(format) => format.replace("{}", &value),
                    None => value,
                }])
            }
            Operand::Text {
                prompt,
                flag,
                default,
            } => {
                let text = self.input(prompt, default.as_deref())?;
                Ok(match flag {
                    Some(flag) => vec![flag.clone(), text],
                    None => vec![text],
                })
            }
            Operand::BranchName { prompt } => {
                let text = self.input(prompt, None)?;
                Ok(vec![text.split_whitespace().collect::<Vec<_>>().join("-")])
            }
            Operand::RemoteUrl { name_operand } => {
                let name = earlier
                    .get(*name_operand)
                    .and_then(|o| o.first())
                    .cloned()
                    .unwrap_or_default();
                let suggestion = self
                    .ctx
                    .query()
                    .remote_url("origin")?
                    .and_then(|url| suggest_url(&url, &name));
                let url = self.input(&format!("URL for {name}"), suggestion.as_deref())?;
                Ok(vec![url])
            }
        }
    }

    fn current_branch(&self) -> Step<String> {
        Ok(self.ctx.query().current_branch()?.ok_or(Error::NoBranch)?)
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Step<String> {
        match self.ctx.ui.input(prompt, default) {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => dismissed(),
        }
    }

    fn candidates(&self, from: Candidates) -> Result<Vec<String>> {
        let query = self.ctx.query();
        match from {
            Candidates::LocalBranches => query.local_branches(),
            Candidates::Branches => query.branches(),
            Candidates::RemoteBranches => query.remote_branches(),
            Candidates::Remotes => query.remotes(),
            Candidates::Tags => query.tags(),
            Candidates::Stashes => Ok(query
                .stashes()?
                .into_iter()
                .map(|s| format!("{} {}", s.name, s.message))
                .collect()),
            Candidates::Commits => Ok(query
                .recent_commits(100)?
                .into_iter()
                .map(|c| format!("{} {}", c.hash, c.subject))
                .collect()),
            Candidates::Worktrees => query.worktrees(),
        }
    }

    fn choose(&mut self, prompt: &str, from: Candidates) -> Step<String> {
        let candidates = self.candidates(from)?;
        self.choose_among(prompt, &candidates, from.empty_message())
    }

    fn choose_among(&mut self, prompt: &str, candidates: &[String], empty: &str) -> Step<String> {
        if candidates.is_empty() {
            return Err(Stop::Aborted(Some(empty.to_string())));
        }
        match self.ctx.ui.choose(prompt, candidates) {
            Some(choice) => Ok(choice),
            None => dismissed(),
        }
    }

    /// Split `origin/feature/x` at the longest configured remote name.
    fn split_remote_ref(&self, name: &str) -> Step<(String, String)> {
        let remotes = self.ctx.query().remotes()?;
        let split = remotes
            .iter()
            .filter_map(|r| Some((r, name.strip_prefix(r.as_str())?.strip_prefix('/')?)))
            .max_by_key(|(r, _)| r.len())
            .map(|(r, b)| (r.clone(), b.to_string()))
            .or_else(|| name.split_once('/').map(|(r, b)| (r.to_string(), b.to_string())));
        match split {
            Some(pair) => Ok(pair),
            None => Ok((".".to_string(), name.to_string())),
        }
    }

    fn push_remote(&mut self, form: RefForm) -> Step<Vec<String>> {
        let branch = self.current_branch()?;
        let key = format!("branch.{branch}.pushRemote");
        let configured = match self.ctx.config.get(&key)? {
            Some(remote) => Some(remote),
            None => self.ctx.config.get("remote.pushDefault")?,
        };
        let remote = match configured {
            Some(remote) => remote,
            None => {
                let remotes = self.ctx.query().remotes()?;
                let remote = match remotes.as_slice() {
                    [only] => only.clone(),
                    _ => self.choose_among(
                        &format!("Set pushRemote of {branch}"),
                        &remotes,
                        Candidates::Remotes.empty_message(),
                    )?,
                };
                self.config_writes.push((key, remote.clone()));
                remote
            }
        };
        Ok(render_ref(form, &remote, &branch, &branch))
    }

    fn upstream(&mut self, form: RefForm) -> Step<Vec<String>> {
        let branch = self.current_branch()?;
        let remote_key = format!("branch.{branch}.remote");
        let merge_key = format!("branch.{branch}.merge");
        let remote = self.ctx.config.get(&remote_key)?;
        let merge = self.ctx.config.get(&merge_key)?;
        if let (Some(remote), Some(merge)) = (remote, merge) {
            let target = merge.strip_prefix("refs/heads/").unwrap_or(&merge).to_string();
            return Ok(render_ref(form, &remote, &branch, &target));
        }

        // Offer a same-named branch on every remote even if it does not exist yet.
        let mut candidates = Vec::new();
        for remote in self.ctx.query().remotes()? {
            candidates.push(format!("{remote}/{branch}"));
        }
        for existing in self.ctx.query().remote_branches()? {
            if !candidates.contains(&existing) {
                candidates.push(existing);
            }
        }
        let choice = self.choose_among(
            &format!("Set upstream of {branch}"),
            &candidates,
            Candidates::RemoteBranches.empty_message(),
        )?;
        let (remote, target) = self.split_remote_ref(&choice)?;
        if form == RefForm::Refspec {
            // The push itself records the upstream.
            self.extra_flags.push("--set-upstream".to_string());
        } else {
            self.config_writes.push((remote_key, remote.clone()));
            self.config_writes
                .push((merge_key, format!("refs/heads/{target}")));
        }
        Ok(render_ref(form, &remote, &branch, &target))
    }

    /// Ask before overwriting a remote branch HEAD does not contain. A yes
    /// adds `--force-with-lease`; returns false on a no.
    fn check_divergence(&mut self, args: &[String], operands: &[Vec<String>]) -> Step<bool> {
        let flat: Vec<&String> = operands.iter().flatten().collect();
        let Some(remote) = flat.first() else {
            return Ok(true);
        };
        let target = match flat.get(1) {
            Some(spec) => spec.rsplit(':').next().unwrap_or(spec).to_string(),
            None => self.current_branch()?,
        };
        let tracking = format!("refs/remotes/{remote}/{target}");
        let query = self.ctx.query();
        if !query.ref_exists(&tracking)? || query.is_ancestor(&tracking, "HEAD")? {
            return Ok(true);
        }
        tracing::warn!(%tracking, "remote branch has diverged");
        let prompt = format!("Remote branch {remote}/{target} has diverged. Force push?");
        if !self.ctx.ui.confirm(&prompt) {
            return Ok(false);
        }
        let forced = args
            .iter()
            .chain(&self.extra_flags)
            .any(|a| a == "--force" || a == "--force-with-lease");
        if !forced {
            self.extra_flags.push("--force-with-lease".to_string());
        }
        Ok(true)
    }
}

fn render_ref(form: RefForm, remote: &str, local: &str, target: &str) -> Vec<String> {
    match form {
        RefForm::Pair => vec![remote.to_string(), target.to_string()],
        RefForm::Refspec => vec![remote.to_string(), format!("{local}:{target}")],
        RefForm::Ref => vec![format!("{remote}/{target}")],
        RefForm::Remote => vec![remote.to_string()],
    }
}

/// `git@host:owner/repo.git` becomes `git@host:<name>/repo.git`.
fn suggest_url(origin: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let (base, repo) = origin.rsplit_once('/')?;
    let cut = base.rfind(['/', ':'])?;
    Some(format!("{}{name}/{repo}", &base[..=cut]))
}

fn ignore(scope: IgnoreScope, ctx: &mut Context<'_>) -> Step<Outcome> {
    let pattern = match ctx.ui.input("File or pattern to ignore", None) {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => return dismissed(),
    };
    let path = match scope {
        IgnoreScope::TopLevel => PathBuf::from(ctx.query().toplevel()?).join(".gitignore"),
        IgnoreScope::SubDirectory => {
            let dir = match ctx.ui.input("Sub-directory", None) {
                Some(d) if !d.trim().is_empty() => d.trim().to_string(),
                _ => return dismissed(),
            };
            PathBuf::from(ctx.query().toplevel()?)
                .join(dir)
                .join(".gitignore")
        }
        IgnoreScope::Private => PathBuf::from(ctx.query().git_dir()?)
            .join("info")
            .join("exclude"),
    };
    append_pattern(&path, &pattern).map_err(Error::from)?;
    tracing::info!(path = %path.display(), %pattern, "ignore pattern added");
    Ok(Outcome::Completed {
        command: format!("ignore {pattern}"),
        message: Some(format!("Added '{pattern}' to {}", path.display())),
        refresh: true,
    })
}

fn append_pattern(path: &std::path::Path, pattern: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let existing = fs::read_to_string(path).unwrap_or_default();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{pattern}")
}
