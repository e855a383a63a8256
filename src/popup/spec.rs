//! Immutable popup declarations.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PopupKind {
    Bisect,
    Branch,
    BranchConfig,
    CherryPick,
    Commit,
    Diff,
    Fetch,
    Help,
    Ignore,
    Log,
    Margin,
    Merge,
    Pull,
    Push,
    Rebase,
    Remote,
    RemoteConfig,
    Reset,
    Revert,
    Stash,
    Tag,
    Worktree,
}

impl PopupKind {
    pub const ALL: [PopupKind; 22] = [
        PopupKind::Bisect,
        PopupKind::Branch,
        PopupKind::BranchConfig,
        PopupKind::CherryPick,
        PopupKind::Commit,
        PopupKind::Diff,
        PopupKind::Fetch,
        PopupKind::Help,
        PopupKind::Ignore,
        PopupKind::Log,
        PopupKind::Margin,
        PopupKind::Merge,
        PopupKind::Pull,
        PopupKind::Push,
        PopupKind::Rebase,
        PopupKind::Remote,
        PopupKind::RemoteConfig,
        PopupKind::Reset,
        PopupKind::Revert,
        PopupKind::Stash,
        PopupKind::Tag,
        PopupKind::Worktree,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PopupKind::Bisect => "bisect",
            PopupKind::Branch => "branch",
            PopupKind::BranchConfig => "branch_config",
            PopupKind::CherryPick => "cherry_pick",
            PopupKind::Commit => "commit",
            PopupKind::Diff => "diff",
            PopupKind::Fetch => "fetch",
            PopupKind::Help => "help",
            PopupKind::Ignore => "ignore",
            PopupKind::Log => "log",
            PopupKind::Margin => "margin",
            PopupKind::Merge => "merge",
            PopupKind::Pull => "pull",
            PopupKind::Push => "push",
            PopupKind::Rebase => "rebase",
            PopupKind::Remote => "remote",
            PopupKind::RemoteConfig => "remote_config",
            PopupKind::Reset => "reset",
            PopupKind::Revert => "revert",
            PopupKind::Stash => "stash",
            PopupKind::Tag => "tag",
            PopupKind::Worktree => "worktree",
        }
    }
}

impl fmt::Display for PopupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PopupKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PopupKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| Error::UnknownArgument(s.to_string()))
    }
}

/// The branch and remote a popup's variables are bound to. Missing values
/// render as `unset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub branch: Option<String>,
    pub remote: Option<String>,
}

impl Scope {
    /// Substitute `{branch}` and `{remote}`. `None` when a placeholder has no value.
    pub fn expand(&self, template: &str) -> Option<String> {
        let mut out = template.to_string();
        if out.contains("{branch}") {
            out = out.replace("{branch}", self.branch.as_deref()?);
        }
        if out.contains("{remote}") {
            out = out.replace("{remote}", self.remote.as_deref()?);
        }
        Some(out)
    }

    /// Like [`Scope::expand`] but keeps a readable placeholder.
    pub fn label(&self, template: &str) -> String {
        template
            .replace("{branch}", self.branch.as_deref().unwrap_or("(detached)"))
            .replace("{remote}", self.remote.as_deref().unwrap_or("(none)"))
    }
}

/// How pressing a variable's key obtains the next value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableInput {
    /// Prompt for text; empty input unsets.
    Free,
    /// Step through `choices`. With a fallback the cycle passes through
    /// `unset`, shown as `key:value` of the global setting.
    Cycle {
        choices: Vec<String>,
        fallback: Option<(String, String)>,
    },
    /// `branch.<b>.merge` plus `branch.<b>.remote`, set from a chosen branch
    /// and cleared on the next press.
    Upstream,
    /// A remote name, chosen from the configured remotes and cleared on the next press.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentKind {
    Switch,
    Option {
        /// Allowed values; empty means free-form.
        choices: Vec<String>,
        default: Option<String>,
        /// Mutually exclusive with other options of the same group.
        group: Option<String>,
    },
    Variable {
        /// Config key with `{branch}`/`{remote}` placeholders.
        config_key: String,
        input: VariableInput,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub key: String,
    pub description: String,
    /// For options: a trailing `=` joins flag and value, a `{}` is replaced by the value.
    pub cli_flag: String,
    /// Heading the argument is listed under.
    pub section: String,
    pub kind: ArgumentKind,
}

impl ArgumentSpec {
    pub fn is_switch(&self) -> bool {
        matches!(self.kind, ArgumentKind::Switch)
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, ArgumentKind::Option { .. })
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, ArgumentKind::Variable { .. })
    }

    /// Flag as shown next to the description, e.g. `--[topo|date]-order`.
    pub fn flag_hint(&self) -> String {
        match &self.kind {
            ArgumentKind::Option { choices, .. } if self.cli_flag.contains("{}") => self
                .cli_flag
                .replace("{}", &format!("[{}]", choices.join("|"))),
            _ => self.cli_flag.clone(),
        }
    }

    /// Render an option value into command-line arguments.
    pub fn render_option(&self, value: &str) -> Vec<String> {
        if self.cli_flag.contains("{}") {
            vec![self.cli_flag.replace("{}", value)]
        } else if self.cli_flag.ends_with('=') {
            vec![format!("{}{value}", self.cli_flag)]
        } else {
            vec![self.cli_flag.clone(), value.to_string()]
        }
    }
}

/// Where a candidate list for a choice prompt comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidates {
    LocalBranches,
    Branches,
    RemoteBranches,
    Remotes,
    Tags,
    Stashes,
    Commits,
    Worktrees,
}

impl Candidates {
    /// Message shown when the list is empty.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Candidates::LocalBranches | Candidates::Branches => "No branches found",
            Candidates::RemoteBranches => "No remote branches found",
            Candidates::Remotes => "No remotes found",
            Candidates::Tags => "No tags found",
            Candidates::Stashes => "No stashes found",
            Candidates::Commits => "No commits found",
            Candidates::Worktrees => "No worktrees found",
        }
    }
}

/// How a resolved remote/branch pair is spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefForm {
    /// `<remote> <branch>`
    Pair,
    /// `<remote> <local>:<branch>`
    Refspec,
    /// `<remote>/<branch>`
    Ref,
    /// `<remote>`
    Remote,
}

/// A trailing command-line argument resolved when the action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Lit(String),
    /// The checked out branch; fails with `NoBranch` when detached.
    CurrentBranch,
    /// `branch.<b>.pushRemote`, falling back to `remote.pushDefault`; set
    /// from the only remote, or a chosen one, when neither exists.
    PushRemote(RefForm),
    /// `branch.<b>.remote` and `branch.<b>.merge`; chosen from remote
    /// branches when unset.
    Upstream(RefForm),
    /// A remote branch split into `<remote> <branch>`.
    RemoteBranch { prompt: String },
    /// One of a candidate list. `format` wraps the choice, e.g. `{}^`.
    Choose {
        prompt: String,
        from: Candidates,
        format: Option<String>,
    },
    /// Free text, optionally preceded by a flag such as `--message`.
    Text {
        prompt: String,
        flag: Option<String>,
        default: Option<String>,
    },
    /// Free text with spaces replaced by dashes.
    BranchName { prompt: String },
    /// URL for the remote named by an earlier operand, suggested from `origin`.
    RemoteUrl { name_operand: usize },
}

/// Checks performed before a destructive command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Ask first. `{0}` is replaced by the first operand.
    Confirm(String),
    /// Ask before pushing over a diverged remote branch; confirming adds
    /// `--force-with-lease`.
    PushDivergence,
}

/// A git invocation declared by an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub args: Vec<String>,
    pub operands: Vec<Operand>,
    pub guard: Option<Guard>,
    pub env: Vec<(String, String)>,
    /// Include the popup's switches and options.
    pub with_arguments: bool,
    /// Show stdout to the user instead of refreshing.
    pub view: bool,
    /// Success message; `{n}` refers to the n-th operand.
    pub message: Option<String>,
}

impl RunSpec {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            operands: Vec::new(),
            guard: None,
            env: Vec::new(),
            with_arguments: true,
            view: false,
            message: None,
        }
    }

    pub fn operand(mut self, operand: Operand) -> Self {
        self.operands.push(operand);
        self
    }

    pub fn confirm(mut self, prompt: &str) -> Self {
        self.guard = Some(Guard::Confirm(prompt.to_string()));
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn without_arguments(mut self) -> Self {
        self.with_arguments = false;
        self
    }

    pub fn view(mut self) -> Self {
        self.view = true;
        self
    }

    pub fn message(mut self, template: &str) -> Self {
        self.message = Some(template.to_string());
        self
    }
}

/// Actions the host performs itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Refresh,
    History,
    GoToFile,
    Toggle,
    Stage,
    StageUnstaged,
    StageAll,
    Unstage,
    UnstageStaged,
    Discard,
    Untrack,
    ToggleMargin,
    CycleMarginStyle,
    ToggleMarginDetails,
    ToggleShortstat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreScope {
    /// `.gitignore` at the top level.
    TopLevel,
    /// `.gitignore` in a chosen sub-directory.
    SubDirectory,
    /// `.git/info/exclude`
    Private,
}

/// Where a scoped child popup gets its scope from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSource {
    /// Choose a local branch, current branch first.
    Branch,
    /// Choose a configured remote.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Run(RunSpec),
    Popup(PopupKind),
    ScopedPopup { popup: PopupKind, source: ScopeSource },
    Host(HostAction),
    Ignore(IgnoreScope),
}

impl ActionKind {
    /// Whether firing the action closes the popup stack.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ActionKind::Popup(_) | ActionKind::ScopedPopup { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub key: String,
    pub description: String,
    /// Column heading; may contain `{branch}`.
    pub group: String,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSpec {
    pub kind: PopupKind,
    pub title: String,
    pub arguments: Vec<ArgumentSpec>,
    pub actions: Vec<ActionSpec>,
}

impl PopupSpec {
    pub fn builder(kind: PopupKind, title: &str) -> PopupBuilder {
        PopupBuilder {
            spec: PopupSpec {
                kind,
                title: title.to_string(),
                arguments: Vec::new(),
                actions: Vec::new(),
            },
            section: "Arguments".to_string(),
            group: "Actions".to_string(),
        }
    }

    pub fn argument(&self, key: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.key == key)
    }

    pub fn action(&self, key: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.key == key)
    }
}

/// Declares a popup top to bottom; arguments and actions keep their order.
pub struct PopupBuilder {
    spec: PopupSpec,
    section: String,
    group: String,
}

impl PopupBuilder {
    /// Start a new argument heading.
    pub fn section(mut self, heading: &str) -> Self {
        self.section = heading.to_string();
        self
    }

    /// Start a new action column.
    pub fn group(mut self, heading: &str) -> Self {
        self.group = heading.to_string();
        self
    }

    fn push_argument(mut self, key: &str, description: &str, cli_flag: &str, kind: ArgumentKind) -> Self {
        self.spec.arguments.push(ArgumentSpec {
            key: key.to_string(),
            description: description.to_string(),
            cli_flag: cli_flag.to_string(),
            section: self.section.clone(),
            kind,
        });
        self
    }

    pub fn switch(self, key: &str, description: &str, cli_flag: &str) -> Self {
        self.push_argument(key, description, cli_flag, ArgumentKind::Switch)
    }

    pub fn option(self, key: &str, description: &str, cli_flag: &str) -> Self {
        self.push_argument(
            key,
            description,
            cli_flag,
            ArgumentKind::Option {
                choices: Vec::new(),
                default: None,
                group: None,
            },
        )
    }

    pub fn option_with_default(self, key: &str, description: &str, cli_flag: &str, default: &str) -> Self {
        self.push_argument(
            key,
            description,
            cli_flag,
            ArgumentKind::Option {
                choices: Vec::new(),
                default: Some(default.to_string()),
                group: None,
            },
        )
    }

    pub fn choice(self, key: &str, description: &str, cli_flag: &str, choices: &[&str]) -> Self {
        self.push_argument(
            key,
            description,
            cli_flag,
            ArgumentKind::Option {
                choices: choices.iter().map(|c| c.to_string()).collect(),
                default: None,
                group: None,
            },
        )
    }

    pub fn exclusive(self, key: &str, description: &str, cli_flag: &str, group: &str) -> Self {
        self.push_argument(
            key,
            description,
            cli_flag,
            ArgumentKind::Option {
                choices: Vec::new(),
                default: None,
                group: Some(group.to_string()),
            },
        )
    }

    pub fn variable(self, key: &str, config_key: &str, input: VariableInput) -> Self {
        self.push_argument(
            key,
            config_key,
            "",
            ArgumentKind::Variable {
                config_key: config_key.to_string(),
                input,
            },
        )
    }

    pub fn cycle(self, key: &str, config_key: &str, choices: &[&str]) -> Self {
        self.variable(
            key,
            config_key,
            VariableInput::Cycle {
                choices: choices.iter().map(|c| c.to_string()).collect(),
                fallback: None,
            },
        )
    }

    pub fn action(mut self, key: &str, description: &str, kind: ActionKind) -> Self {
        self.spec.actions.push(ActionSpec {
            key: key.to_string(),
            description: description.to_string(),
            group: self.group.clone(),
            kind,
        });
        self
    }

    pub fn run(self, key: &str, description: &str, run: RunSpec) -> Self {
        self.action(key, description, ActionKind::Run(run))
    }

    pub fn build(self) -> PopupSpec {
        self.spec
    }
}

/// Split a key string into keystrokes: `<c-s>` is one, `-f` is two.
pub fn key_sequence(key: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' && key.len() > 1 {
            let mut token = String::from('<');
            for next in chars.by_ref() {
                token.push(next);
                if next == '>' {
                    break;
                }
            }
            keys.push(token);
        } else {
            keys.push(c.to_string());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_names_round_trip() {
        for kind in PopupKind::ALL {
            assert_eq!(kind.name().parse::<PopupKind>().unwrap(), kind);
        }
        assert!("nope".parse::<PopupKind>().is_err());
    }

    #[test]
    fn scope_expansion() {
        let scope = Scope {
            branch: Some("main".into()),
            remote: None,
        };
        assert_eq!(
            scope.expand("branch.{branch}.merge").as_deref(),
            Some("branch.main.merge")
        );
        assert_eq!(scope.expand("remote.{remote}.url"), None);
        assert_eq!(scope.label("remote.{remote}.url"), "remote.(none).url");
    }

    #[test]
    fn option_rendering() {
        let spec = PopupSpec::builder(PopupKind::Log, "Log")
            .option("-A", "Limit to author", "--author=")
            .option("-G", "Search changes", "-G")
            .choice("-o", "Order commits by", "--{}-order", &["topo", "date"])
            .build();
        assert_eq!(spec.arguments[0].render_option("me"), vec!["--author=me"]);
        assert_eq!(spec.arguments[1].render_option("fn x"), vec!["-G", "fn x"]);
        assert_eq!(spec.arguments[2].render_option("topo"), vec!["--topo-order"]);
        assert_eq!(spec.arguments[2].flag_hint(), "--[topo|date]-order");
    }

    #[test]
    fn key_sequences() {
        assert_eq!(key_sequence("-f"), vec!["-", "f"]);
        assert_eq!(key_sequence("<c-s>"), vec!["<c-s>"]);
        assert_eq!(key_sequence("<"), vec!["<"]);
        assert_eq!(key_sequence("as"), vec!["a", "s"]);
    }
}
