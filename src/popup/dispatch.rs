use super::builder::build_arguments;
use super::catalog;
use super::invocation::{CommandInvocation, Context};
use super::keymap::{popup_keymap, Binding, KeyTrie, Lookup};
use super::spec::*;
use super::state::PopupState;
use crate::error::Result;
use crate::git::commands::GitRunner;
use crate::git::config::ConfigStore;
use crate::git::query::Query;

/// Result of feeding one key to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The key starts a chord; more keys are needed.
    Pending,
    /// Unbound key or a dismissed prompt. Nothing changed.
    Ignored,
    /// The visible popup changed: a value was set or a popup opened or closed.
    Updated,
    /// The last popup was closed.
    Closed,
    /// Something to tell the user; state is unchanged.
    Message(String),
    /// A terminal action fired. The stack is already closed.
    Invoke(CommandInvocation),
}

struct Frame {
    state: PopupState,
    keys: KeyTrie<Binding>,
}

impl Frame {
    fn new(state: PopupState) -> Self {
        let keys = popup_keymap(state.spec());
        Self { state, keys }
    }
}

/// Stack of open popups. The top frame receives keys; closing it returns to
/// its parent untouched.
#[derive(Default)]
pub struct Dispatcher {
    stack: Vec<Frame>,
    pending: Vec<String>,
}

/// Branch and remote a popup opened from the status view is scoped to.
/// The remote is `remote.pushDefault`, else `origin`.
pub fn detect_scope(git: &dyn GitRunner, config: &dyn ConfigStore) -> Result<Scope> {
    let query = Query::new(git);
    let branch = query.current_branch()?;
    let remote = config
        .get("remote.pushDefault")?
        .unwrap_or_else(|| "origin".to_string());
    Ok(Scope {
        branch,
        remote: Some(remote),
    })
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a root popup, replacing whatever was open.
    pub fn open(&mut self, kind: PopupKind, scope: Scope, config: &dyn ConfigStore) {
        tracing::debug!(popup = %kind, ?scope, "opening popup");
        self.stack.clear();
        self.pending.clear();
        let state = PopupState::open(catalog::popup(kind), scope, config);
        self.stack.push(Frame::new(state));
    }

    pub fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> Option<&PopupState> {
        self.stack.last().map(|f| &f.state)
    }

    /// Keys typed so far of an unfinished chord.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn close_all(&mut self) {
        self.stack.clear();
        self.pending.clear();
    }

    /// Feed one key. Errors leave every popup state as it was.
    pub fn key(&mut self, key: &str, ctx: &mut Context<'_>) -> Result<Dispatch> {
        if self.stack.is_empty() {
            return Ok(Dispatch::Ignored);
        }
        if key == "<esc>" || key == "q" {
            return Ok(self.back());
        }

        self.pending.push(key.to_string());
        let Some(frame) = self.stack.last() else {
            return Ok(Dispatch::Ignored);
        };
        let binding = match frame.keys.lookup(&self.pending) {
            Lookup::Pending => return Ok(Dispatch::Pending),
            Lookup::NoMatch => {
                tracing::debug!(keys = ?self.pending, "unbound key sequence");
                self.pending.clear();
                return Ok(Dispatch::Ignored);
            }
            Lookup::Match(binding) => binding.clone(),
        };
        self.pending.clear();

        match binding {
            Binding::Argument(key) => self.argument(&key, ctx),
            Binding::Action(key) => self.action(&key, ctx),
        }
    }

    fn back(&mut self) -> Dispatch {
        if !self.pending.is_empty() {
            self.pending.clear();
            return Dispatch::Updated;
        }
        self.stack.pop();
        if self.stack.is_empty() {
            Dispatch::Closed
        } else {
            Dispatch::Updated
        }
    }

    fn replace_top(&mut self, state: PopupState) -> Dispatch {
        if let Some(frame) = self.stack.last_mut() {
            frame.state = state;
        }
        Dispatch::Updated
    }

    fn argument(&mut self, key: &str, ctx: &mut Context<'_>) -> Result<Dispatch> {
        let Some(state) = self.current().cloned() else {
            return Ok(Dispatch::Ignored);
        };
        let Some(argument) = state.spec().argument(key).cloned() else {
            return Ok(Dispatch::Ignored);
        };

        let next = match &argument.kind {
            ArgumentKind::Switch => state.toggle(key)?,
            ArgumentKind::Option { choices, .. } => {
                if state.option_value(key).is_some() {
                    state.set_option(key, None)?
                } else {
                    let value = if choices.is_empty() {
                        ctx.ui.input(&argument.description, None)
                    } else {
                        ctx.ui.choose(&argument.description, choices)
                    };
                    match value {
                        Some(value) => state.set_option(key, Some(&value))?,
                        None => return Ok(Dispatch::Ignored),
                    }
                }
            }
            ArgumentKind::Variable { input, .. } => {
                let name = state
                    .variable_key(key)
                    .unwrap_or_else(|| state.scope().label(&argument.description));
                match input {
                    VariableInput::Free => {
                        match ctx.ui.input(&name, state.variable_value(key)) {
                            Some(value) => state.set_variable(key, Some(&value), ctx.config)?,
                            None => return Ok(Dispatch::Ignored),
                        }
                    }
                    VariableInput::Cycle { .. } => {
                        let value = state.next_cycle_value(key)?;
                        state.set_variable(key, value.as_deref(), ctx.config)?
                    }
                    VariableInput::Upstream => {
                        if state.variable_value(key).is_some() {
                            let command = state.upstream_command(key, None)?;
                            state.apply(&command, ctx.config)?
                        } else {
                            let query = Query::new(ctx.git);
                            let branches = query.branches()?;
                            if branches.is_empty() {
                                return Ok(Dispatch::Message(
                                    Candidates::Branches.empty_message().to_string(),
                                ));
                            }
                            let remotes = query.remotes()?;
                            let Some(choice) = ctx.ui.choose(&name, &branches) else {
                                return Ok(Dispatch::Ignored);
                            };
                            let target = upstream_target(&choice, &remotes);
                            let command = state.upstream_command(key, Some(target))?;
                            state.apply(&command, ctx.config)?
                        }
                    }
                    VariableInput::Remote => {
                        if state.variable_value(key).is_some() {
                            state.set_variable(key, None, ctx.config)?
                        } else {
                            let remotes = Query::new(ctx.git).remotes()?;
                            if remotes.is_empty() {
                                return Ok(Dispatch::Message(
                                    Candidates::Remotes.empty_message().to_string(),
                                ));
                            }
                            match ctx.ui.choose(&name, &remotes) {
                                Some(remote) => state.set_variable(key, Some(&remote), ctx.config)?,
                                None => return Ok(Dispatch::Ignored),
                            }
                        }
                    }
                }
            }
        };
        Ok(self.replace_top(next))
    }

    fn action(&mut self, key: &str, ctx: &mut Context<'_>) -> Result<Dispatch> {
        let Some(state) = self.current().cloned() else {
            return Ok(Dispatch::Ignored);
        };
        let Some(action) = state.spec().action(key).cloned() else {
            return Ok(Dispatch::Ignored);
        };

        match action.kind {
            ActionKind::Popup(kind) => {
                self.push(kind, state.scope().clone(), ctx.config);
                Ok(Dispatch::Updated)
            }
            ActionKind::ScopedPopup { popup, source } => {
                let query = Query::new(ctx.git);
                let mut scope = state.scope().clone();
                match source {
                    ScopeSource::Branch => {
                        let mut branches = query.local_branches()?;
                        // Current branch first so a bare confirm picks it.
                        if let Some(current) = &scope.branch {
                            if let Some(i) = branches.iter().position(|b| b == current) {
                                let current = branches.remove(i);
                                branches.insert(0, current);
                            }
                        }
                        if branches.is_empty() {
                            return Ok(Dispatch::Message(
                                Candidates::LocalBranches.empty_message().to_string(),
                            ));
                        }
                        match ctx.ui.choose("Configure branch", &branches) {
                            Some(branch) => scope.branch = Some(branch),
                            None => return Ok(Dispatch::Ignored),
                        }
                    }
                    ScopeSource::Remote => {
                        let remotes = query.remotes()?;
                        if remotes.is_empty() {
                            return Ok(Dispatch::Message(
                                Candidates::Remotes.empty_message().to_string(),
                            ));
                        }
                        match ctx.ui.choose("Configure remote", &remotes) {
                            Some(remote) => scope.remote = Some(remote),
                            None => return Ok(Dispatch::Ignored),
                        }
                    }
                }
                self.push(popup, scope, ctx.config);
                Ok(Dispatch::Updated)
            }
            kind => {
                let invocation = CommandInvocation {
                    popup: state.kind(),
                    key: action.key,
                    description: action.description,
                    kind,
                    arguments: build_arguments(&state),
                    scope: state.scope().clone(),
                };
                self.close_all();
                Ok(Dispatch::Invoke(invocation))
            }
        }
    }

    fn push(&mut self, kind: PopupKind, scope: Scope, config: &dyn ConfigStore) {
        tracing::debug!(popup = %kind, ?scope, "opening child popup");
        let state = PopupState::open(catalog::popup(kind), scope, config);
        self.stack.push(Frame::new(state));
    }
}

/// A chosen branch as an upstream pair; local branches track remote `.`.
fn upstream_target<'a>(choice: &'a str, remotes: &[String]) -> (&'a str, &'a str) {
    remotes
        .iter()
        .filter_map(|r| {
            let branch = choice.strip_prefix(r.as_str())?.strip_prefix('/')?;
            Some((&choice[..r.len()], branch))
        })
        .max_by_key(|(remote, _)| remote.len())
        .unwrap_or((".", choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::invocation::Outcome;
    use crate::testing::{FakeGit, MemoryConfig, ScriptedInteraction};

    fn master() -> Scope {
        Scope {
            branch: Some("master".into()),
            remote: Some("origin".into()),
        }
    }

    fn press(
        dispatcher: &mut Dispatcher,
        keys: &str,
        git: &FakeGit,
        config: &MemoryConfig,
        ui: &mut ScriptedInteraction,
    ) -> Dispatch {
        let mut ctx = Context::new(git, config, ui);
        let mut last = Dispatch::Ignored;
        for key in key_sequence(keys) {
            last = dispatcher.key(&key, &mut ctx).unwrap();
        }
        last
    }

    #[test]
    fn every_popup_opens_without_a_branch() {
        let config = MemoryConfig::new();
        for kind in PopupKind::ALL {
            let mut dispatcher = Dispatcher::new();
            dispatcher.open(kind, Scope::default(), &config);
            let rows = dispatcher.current().unwrap().rows();
            assert!(!rows.title.is_empty());
        }
    }

    #[test]
    fn switches_toggle_and_invoke_carries_them() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Push, master(), &config);

        assert_eq!(press(&mut dispatcher, "-", &git, &config, &mut ui), Dispatch::Pending);
        assert_eq!(press(&mut dispatcher, "f", &git, &config, &mut ui), Dispatch::Updated);
        assert!(dispatcher.current().unwrap().is_enabled("-f"));

        let Dispatch::Invoke(invocation) = press(&mut dispatcher, "p", &git, &config, &mut ui)
        else {
            panic!("expected invocation");
        };
        assert_eq!(invocation.arguments, vec!["--force-with-lease"]);
        assert!(!dispatcher.is_open());
    }

    #[test]
    fn unmatched_sequences_are_no_ops() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::BranchConfig, master(), &config);
        let before = dispatcher.current().cloned();

        assert_eq!(press(&mut dispatcher, "a", &git, &config, &mut ui), Dispatch::Pending);
        assert_eq!(press(&mut dispatcher, "z", &git, &config, &mut ui), Dispatch::Ignored);
        assert!(dispatcher.pending().is_empty());
        assert_eq!(dispatcher.current().cloned(), before);
    }

    #[test]
    fn chords_set_variables() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::BranchConfig, master(), &config);

        press(&mut dispatcher, "as", &git, &config, &mut ui);
        assert_eq!(config.value("branch.autoSetupMerge").as_deref(), Some("always"));
        press(&mut dispatcher, "R", &git, &config, &mut ui);
        assert_eq!(config.value("pull.rebase").as_deref(), Some("true"));
    }

    #[test]
    fn escape_pops_back_to_parent() {
        let git = FakeGit::new();
        git.respond_ok(["remote"], "origin\n");
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new().choosing("origin");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Remote, master(), &config);

        assert_eq!(press(&mut dispatcher, "C", &git, &config, &mut ui), Dispatch::Updated);
        assert_eq!(dispatcher.depth(), 2);
        assert_eq!(dispatcher.current().unwrap().kind(), PopupKind::RemoteConfig);

        assert_eq!(press(&mut dispatcher, "<esc>", &git, &config, &mut ui), Dispatch::Updated);
        assert_eq!(dispatcher.current().unwrap().kind(), PopupKind::Remote);
        assert_eq!(press(&mut dispatcher, "q", &git, &config, &mut ui), Dispatch::Closed);
    }

    #[test]
    fn configure_remote_needs_a_remote() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Remote, master(), &config);
        assert_eq!(
            press(&mut dispatcher, "C", &git, &config, &mut ui),
            Dispatch::Message("No remotes found".into())
        );
        assert_eq!(dispatcher.depth(), 1);
    }

    #[test]
    fn configure_remote_is_scoped_to_choice() {
        let git = FakeGit::new();
        git.respond_ok(["remote"], "origin\nfork\n");
        let config = MemoryConfig::with([("remote.fork.url", "git@example.com:fork/repo.git")]);
        let mut ui = ScriptedInteraction::new().choosing("fork");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Remote, master(), &config);
        press(&mut dispatcher, "C", &git, &config, &mut ui);

        let rows = dispatcher.current().unwrap().rows();
        let (heading, variables) = &rows.variables[0];
        assert_eq!(heading, "Configure remote");
        assert_eq!(variables[0].name, "remote.fork.url");
        assert_eq!(
            variables[0].value,
            crate::popup::state::VariableValue::Text(Some("git@example.com:fork/repo.git".into()))
        );
    }

    #[test]
    fn upstream_variable_sets_then_unsets() {
        let git = FakeGit::new();
        git.respond_ok(
            ["for-each-ref", "--format=%(refname)", "refs/heads/"],
            "refs/heads/master\n",
        );
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new().choosing("master");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::BranchConfig, master(), &config);

        press(&mut dispatcher, "u", &git, &config, &mut ui);
        assert_eq!(config.value("branch.master.merge").as_deref(), Some("refs/heads/master"));
        assert_eq!(config.value("branch.master.remote").as_deref(), Some("."));

        press(&mut dispatcher, "u", &git, &config, &mut ui);
        assert_eq!(config.value("branch.master.merge"), None);
        assert_eq!(config.value("branch.master.remote"), None);
    }

    #[test]
    fn upstream_target_splits_on_known_remotes() {
        let remotes = vec!["origin".to_string(), "team/fork".to_string()];
        assert_eq!(upstream_target("origin/main", &remotes), ("origin", "main"));
        assert_eq!(upstream_target("team/fork/x/y", &remotes), ("team/fork", "x/y"));
        assert_eq!(upstream_target("feature/x", &remotes), (".", "feature/x"));
    }

    #[test]
    fn free_variable_prompts_and_empty_unsets() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new().typing("hello world").typing("");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::BranchConfig, master(), &config);

        press(&mut dispatcher, "d", &git, &config, &mut ui);
        assert_eq!(
            config.value("branch.master.description").as_deref(),
            Some("hello world")
        );
        assert_eq!(ui.prompts[0], "branch.master.description");
        press(&mut dispatcher, "d", &git, &config, &mut ui);
        assert_eq!(config.value("branch.master.description"), None);
    }

    #[test]
    fn options_prompt_then_clear() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new().choosing("date");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Log, master(), &config);

        press(&mut dispatcher, "-o", &git, &config, &mut ui);
        assert_eq!(dispatcher.current().unwrap().option_value("-o"), Some("date"));
        press(&mut dispatcher, "-o", &git, &config, &mut ui);
        assert_eq!(dispatcher.current().unwrap().option_value("-o"), None);
    }

    #[test]
    fn variable_without_branch_is_an_error_and_keeps_state() {
        let git = FakeGit::new();
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Pull, Scope::default(), &config);
        let mut ctx = Context::new(&git, &config, &mut ui);
        assert!(dispatcher.key("r", &mut ctx).is_err());
        assert!(dispatcher.is_open());
        assert!(config.value("pull.rebase").is_none());
    }

    #[test]
    fn help_commands_open_child_popups() {
        let git = FakeGit::new();
        git.respond_ok(["remote"], "origin\n");
        let config = MemoryConfig::new();
        let mut ui = ScriptedInteraction::new().choosing("origin");
        let mut dispatcher = Dispatcher::new();
        dispatcher.open(PopupKind::Help, master(), &config);

        press(&mut dispatcher, "M", &git, &config, &mut ui);
        assert_eq!(dispatcher.current().unwrap().kind(), PopupKind::Remote);
        let Dispatch::Invoke(invocation) = press(&mut dispatcher, "x", &git, &config, &mut ui)
        else {
            panic!("expected invocation");
        };
        let mut ctx = Context::new(&git, &config, &mut ui);
        let outcome = invocation.execute(&mut ctx).unwrap();
        let Outcome::Completed { message, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(message.as_deref(), Some("Removed remote 'origin'"));
    }

    #[test]
    fn scope_prefers_push_default() {
        let git = FakeGit::new();
        git.respond_ok(["symbolic-ref", "--quiet", "--short", "HEAD"], "main\n");
        let config = MemoryConfig::with([("remote.pushDefault", "fork")]);
        let scope = detect_scope(&git, &config).unwrap();
        assert_eq!(scope.branch.as_deref(), Some("main"));
        assert_eq!(scope.remote.as_deref(), Some("fork"));

        let detached = FakeGit::new();
        detached.respond_exit(["symbolic-ref", "--quiet", "--short", "HEAD"], 1, "");
        let scope = detect_scope(&detached, &MemoryConfig::new()).unwrap();
        assert_eq!(scope.branch, None);
        assert_eq!(scope.remote.as_deref(), Some("origin"));
    }
}
