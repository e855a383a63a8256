//! Declarations of every popup.

use super::spec::*;

fn choose(prompt: &str, from: Candidates) -> Operand {
    Operand::Choose {
        prompt: prompt.to_string(),
        from,
        format: None,
    }
}

fn choose_as(prompt: &str, from: Candidates, format: &str) -> Operand {
    Operand::Choose {
        prompt: prompt.to_string(),
        from,
        format: Some(format.to_string()),
    }
}

fn text(prompt: &str) -> Operand {
    Operand::Text {
        prompt: prompt.to_string(),
        flag: None,
        default: None,
    }
}

fn flagged(prompt: &str, flag: &str) -> Operand {
    Operand::Text {
        prompt: prompt.to_string(),
        flag: Some(flag.to_string()),
        default: None,
    }
}

fn branch_name(prompt: &str) -> Operand {
    Operand::BranchName {
        prompt: prompt.to_string(),
    }
}

fn lit(value: &str) -> Operand {
    Operand::Lit(value.to_string())
}

fn git<const N: usize>(args: [&str; N]) -> RunSpec {
    RunSpec::new(args)
}

fn pull_rebase() -> VariableInput {
    VariableInput::Cycle {
        choices: vec!["true".into(), "false".into()],
        fallback: Some(("pull.rebase".into(), "false".into())),
    }
}

/// Sequence editor that rewrites the first todo line to `command`.
fn first_todo(command: &str) -> String {
    format!("sed -i -e '1s/^pick/{command}/'")
}

pub fn popup(kind: PopupKind) -> PopupSpec {
    match kind {
        PopupKind::Bisect => bisect(),
        PopupKind::Branch => branch(),
        PopupKind::BranchConfig => branch_config(),
        PopupKind::CherryPick => cherry_pick(),
        PopupKind::Commit => commit(),
        PopupKind::Diff => diff(),
        PopupKind::Fetch => fetch(),
        PopupKind::Help => help(),
        PopupKind::Ignore => ignore(),
        PopupKind::Log => log(),
        PopupKind::Margin => margin(),
        PopupKind::Merge => merge(),
        PopupKind::Pull => pull(),
        PopupKind::Push => push(),
        PopupKind::Rebase => rebase(),
        PopupKind::Remote => remote(),
        PopupKind::RemoteConfig => remote_config(),
        PopupKind::Reset => reset(),
        PopupKind::Revert => revert(),
        PopupKind::Stash => stash(),
        PopupKind::Tag => tag(),
        PopupKind::Worktree => worktree(),
    }
}

fn bisect() -> PopupSpec {
    PopupSpec::builder(PopupKind::Bisect, "Bisect")
        .switch("-r", "Don't checkout commits", "--no-checkout")
        .switch("-p", "Follow only first parent of a merge", "--first-parent")
        .group("Bisect")
        .run(
            "B",
            "Start",
            git(["bisect", "start"])
                .operand(Operand::Text {
                    prompt: "Start bisect with bad revision".into(),
                    flag: None,
                    default: Some("HEAD".into()),
                })
                .operand(choose("Good revision", Candidates::Commits)),
        )
        .run(
            "S",
            "Scripted",
            git(["bisect", "run", "sh", "-c"])
                .operand(text("Bisect shell command"))
                .without_arguments(),
        )
        .build()
}

fn branch() -> PopupSpec {
    PopupSpec::builder(PopupKind::Branch, "Branch")
        .section("Variables")
        .variable("d", "branch.{branch}.description", VariableInput::Free)
        .variable("u", "branch.{branch}.merge", VariableInput::Upstream)
        .variable("r", "branch.{branch}.rebase", pull_rebase())
        .variable("p", "branch.{branch}.pushRemote", VariableInput::Remote)
        .section("Arguments")
        .switch("-r", "Recurse submodules when checking out an existing branch", "--recurse-submodules")
        .group("Checkout")
        .run(
            "b",
            "branch/revision",
            git(["checkout"]).operand(choose("Checkout", Candidates::Branches)),
        )
        .run(
            "l",
            "local branch",
            git(["checkout"]).operand(choose("Checkout local branch", Candidates::LocalBranches)),
        )
        .run(
            "c",
            "new branch",
            git(["checkout", "-b"])
                .operand(branch_name("Name for new branch"))
                .operand(choose("Create branch starting at", Candidates::Branches))
                .without_arguments(),
        )
        .group("Create")
        .run(
            "n",
            "new branch",
            git(["branch"])
                .operand(branch_name("Name for new branch"))
                .operand(choose("Create branch starting at", Candidates::Branches))
                .without_arguments(),
        )
        .group("Do")
        .action(
            "C",
            "Configure...",
            ActionKind::ScopedPopup {
                popup: PopupKind::BranchConfig,
                source: ScopeSource::Branch,
            },
        )
        .run(
            "m",
            "rename",
            git(["branch", "-m"])
                .operand(choose("Rename branch", Candidates::LocalBranches))
                .operand(branch_name("Rename to"))
                .without_arguments()
                .message("Renamed '{0}' -> '{1}'"),
        )
        .run(
            "X",
            "reset",
            git(["branch", "--force"])
                .operand(choose("Reset branch", Candidates::LocalBranches))
                .operand(choose("Reset to", Candidates::Branches))
                .confirm("Reset branch {0}?")
                .without_arguments(),
        )
        .run(
            "D",
            "delete",
            git(["branch", "-d"])
                .operand(choose("Delete branch", Candidates::LocalBranches))
                .confirm("Delete branch {0}?")
                .without_arguments()
                .message("Deleted branch {0}"),
        )
        .build()
}

fn branch_config() -> PopupSpec {
    PopupSpec::builder(PopupKind::BranchConfig, "Configure branch")
        .section("Configure branch")
        .variable("d", "branch.{branch}.description", VariableInput::Free)
        .variable("u", "branch.{branch}.merge", VariableInput::Upstream)
        .variable("r", "branch.{branch}.rebase", pull_rebase())
        .variable("p", "branch.{branch}.pushRemote", VariableInput::Remote)
        .section("Configure repository defaults")
        .cycle("R", "pull.rebase", &["true", "false"])
        .variable("P", "remote.pushDefault", VariableInput::Remote)
        .variable("b", "porcelain.baseBranch", VariableInput::Free)
        .section("Configure branch creation")
        .cycle("as", "branch.autoSetupMerge", &["always", "true", "false"])
        .cycle("ar", "branch.autoSetupRebase", &["always", "local", "remote", "never"])
        .build()
}

fn cherry_pick() -> PopupSpec {
    PopupSpec::builder(PopupKind::CherryPick, "Cherry Pick")
        .option("-m", "Replay merge relative to parent", "--mainline=")
        .choice("=s", "Strategy", "--strategy=", &["resolve", "recursive", "octopus", "ours", "subtree"])
        .switch("-F", "Attempt fast-forward", "--ff")
        .switch("-x", "Reference cherry in commit message", "-x")
        .switch("-e", "Edit commit messages", "--edit")
        .switch("-s", "Add Signed-off-by lines", "--signoff")
        .option("-S", "Sign using gpg", "--gpg-sign=")
        .group("Apply here")
        .run(
            "A",
            "Pick",
            git(["cherry-pick"]).operand(choose("Cherry-pick", Candidates::Commits)),
        )
        .run(
            "a",
            "Apply",
            git(["cherry-pick", "--no-commit"]).operand(choose("Apply changes from", Candidates::Commits)),
        )
        .run(
            "h",
            "Harvest",
            git(["cherry-pick"]).operand(choose("Harvest from branch", Candidates::Branches)),
        )
        .build()
}

fn commit() -> PopupSpec {
    PopupSpec::builder(PopupKind::Commit, "Commit")
        .switch("-a", "Stage all modified and deleted files", "--all")
        .switch("-e", "Allow empty commit", "--allow-empty")
        .switch("-v", "Show diff of changes to be committed", "--verbose")
        .switch("-h", "Disable hooks", "--no-verify")
        .switch("-R", "Claim authorship and reset author date", "--reset-author")
        .option("-A", "Override the author", "--author=")
        .switch("-s", "Add Signed-off-by line", "--signoff")
        .option("-S", "Sign using gpg", "--gpg-sign=")
        .option("-C", "Reuse commit message", "--reuse-message=")
        .group("Create")
        .run("c", "Commit", git(["commit"]).operand(flagged("Commit message", "--message")))
        .group("Edit HEAD")
        .run("e", "Extend", git(["commit", "--amend", "--no-edit"]))
        .run(
            "w",
            "Reword",
            git(["commit", "--amend", "--only"]).operand(flagged("New message", "--message")),
        )
        .run(
            "a",
            "Amend",
            git(["commit", "--amend"]).operand(flagged("Commit message", "--message")),
        )
        .group("Edit")
        .run(
            "f",
            "Fixup",
            git(["commit"]).operand(choose_as("Fixup commit", Candidates::Commits, "--fixup={}")),
        )
        .run(
            "s",
            "Squash",
            git(["commit"]).operand(choose_as("Squash commit", Candidates::Commits, "--squash={}")),
        )
        .build()
}

fn diff() -> PopupSpec {
    PopupSpec::builder(PopupKind::Diff, "Diff")
        .group("Diff")
        .run("d", "this", git(["diff", "HEAD"]).view())
        .run("r", "range", git(["diff"]).operand(text("Diff for range")).view())
        .run("p", "paths", git(["diff", "--"]).operand(text("Diff paths")).view())
        .run("u", "unstaged", git(["diff"]).view())
        .run("s", "staged", git(["diff", "--cached"]).view())
        .run("w", "worktree", git(["diff", "HEAD", "--"]).view())
        .group("Show")
        .run(
            "c",
            "Commit",
            git(["show"]).operand(choose("Show commit", Candidates::Commits)).view(),
        )
        .run(
            "t",
            "Stash",
            git(["stash", "show", "-p"]).operand(choose("Show stash", Candidates::Stashes)).view(),
        )
        .build()
}

fn fetch() -> PopupSpec {
    PopupSpec::builder(PopupKind::Fetch, "Fetch")
        .switch("-p", "Prune deleted branches", "--prune")
        .switch("-t", "Fetch all tags", "--tags")
        .switch("-F", "force", "--force")
        .group("Fetch from")
        .run(
            "p",
            "pushRemote, setting that",
            git(["fetch"]).operand(Operand::PushRemote(RefForm::Remote)),
        )
        .run(
            "u",
            "@{upstream}, setting it",
            git(["fetch"]).operand(Operand::Upstream(RefForm::Remote)),
        )
        .run(
            "e",
            "elsewhere",
            git(["fetch"]).operand(choose("Fetch remote", Candidates::Remotes)),
        )
        .run("a", "all remotes", git(["fetch", "--all"]))
        .group("Fetch")
        .run(
            "o",
            "another branch",
            git(["fetch"]).operand(Operand::RemoteBranch {
                prompt: "Fetch branch".into(),
            }),
        )
        .run(
            "r",
            "explicit refspec",
            git(["fetch"])
                .operand(choose("Fetch from remote", Candidates::Remotes))
                .operand(text("Refspec")),
        )
        .run("m", "submodules", git(["fetch", "--recurse-submodules"]))
        .group("Configure")
        .action("C", "Set variables...", ActionKind::Popup(PopupKind::BranchConfig))
        .build()
}

fn help() -> PopupSpec {
    let popups = [
        ("A", "Cherry Pick", PopupKind::CherryPick),
        ("b", "Branch", PopupKind::Branch),
        ("B", "Bisect", PopupKind::Bisect),
        ("c", "Commit", PopupKind::Commit),
        ("d", "Diff", PopupKind::Diff),
        ("f", "Fetch", PopupKind::Fetch),
        ("i", "Ignore", PopupKind::Ignore),
    ];
    let more = [
        ("l", "Log", PopupKind::Log),
        ("M", "Remote", PopupKind::Remote),
        ("m", "Merge", PopupKind::Merge),
        ("P", "Push", PopupKind::Push),
        ("p", "Pull", PopupKind::Pull),
        ("r", "Rebase", PopupKind::Rebase),
        ("t", "Tag", PopupKind::Tag),
        ("v", "Revert", PopupKind::Revert),
        ("w", "Worktree", PopupKind::Worktree),
        ("X", "Reset", PopupKind::Reset),
        ("Z", "Stash", PopupKind::Stash),
    ];

    let mut builder = PopupSpec::builder(PopupKind::Help, "Help")
        .group("Commands")
        .action("$", "History", ActionKind::Host(HostAction::History));
    for (key, description, kind) in popups {
        builder = builder.action(key, description, ActionKind::Popup(kind));
    }
    builder = builder.run("I", "Init", git(["init"]).without_arguments());
    for (key, description, kind) in more {
        builder = builder.action(key, description, ActionKind::Popup(kind));
    }

    let host = |action| ActionKind::Host(action);
    builder
        .group("Applying changes")
        .action("<c-s>", "Stage all", host(HostAction::StageAll))
        .action("K", "Untrack", host(HostAction::Untrack))
        .action("s", "Stage", host(HostAction::Stage))
        .action("S", "Stage-Unstaged", host(HostAction::StageUnstaged))
        .action("u", "Unstage", host(HostAction::Unstage))
        .action("U", "Unstage-Staged", host(HostAction::UnstageStaged))
        .action("x", "Discard", host(HostAction::Discard))
        .group("Essential commands")
        .action("<c-r>", "Refresh", host(HostAction::Refresh))
        .action("<cr>", "Go to file", host(HostAction::GoToFile))
        .action("<tab>", "Toggle", host(HostAction::Toggle))
        .build()
}

fn ignore() -> PopupSpec {
    PopupSpec::builder(PopupKind::Ignore, "Ignore")
        .group("Gitignore")
        .action("t", "shared at top-level", ActionKind::Ignore(IgnoreScope::TopLevel))
        .action("s", "shared in sub-directory", ActionKind::Ignore(IgnoreScope::SubDirectory))
        .action("p", "privately for this repository", ActionKind::Ignore(IgnoreScope::Private))
        .build()
}

fn log() -> PopupSpec {
    let log = || git(["log", "--oneline", "--decorate"]);
    PopupSpec::builder(PopupKind::Log, "Log")
        .section("Commit Limiting")
        .option_with_default("-n", "Limit number of commits", "--max-count=", "256")
        .option("-A", "Limit to author", "--author=")
        .option("-F", "Search messages", "--grep=")
        .exclusive("-G", "Search changes", "-G", "pickaxe")
        .exclusive("-S", "Search occurrences", "-S", "pickaxe")
        .option("-L", "Trace line evolution", "-L")
        .option("-s", "Limit to commits since", "--since=")
        .option("-u", "Limit to commits until", "--until=")
        .switch("=m", "Omit merges", "--no-merges")
        .switch("=p", "First parent", "--first-parent")
        .switch("-i", "Invert search messages", "--invert-grep")
        .section("History Simplification")
        .switch("-D", "Simplify by decoration", "--simplify-by-decoration")
        .option("--", "Limit to files", "--")
        .switch("-f", "Follow renames when showing single-file log", "--follow")
        .section("Commit Ordering")
        .switch("-r", "Reverse order", "--reverse")
        .choice("-o", "Order commits by", "--{}-order", &["topo", "author-date", "date"])
        .switch("=R", "List reflog", "--reflog")
        .group("Log")
        .run("l", "current", log().view())
        .run("o", "other", log().operand(choose("Log rev", Candidates::Branches)).view())
        .run("h", "HEAD", log().operand(lit("HEAD")).view())
        .run("L", "local branches", log().operand(lit("--branches")).view())
        .run("b", "all branches", log().operand(lit("--branches")).operand(lit("--remotes")).view())
        .run("a", "all references", log().operand(lit("--all")).view())
        .group("Reflog")
        .run("r", "current", git(["reflog"]).without_arguments().view())
        .run("H", "HEAD", git(["reflog", "HEAD"]).without_arguments().view())
        .build()
}

fn margin() -> PopupSpec {
    PopupSpec::builder(PopupKind::Margin, "Margin")
        .choice("-o", "Order commits by", "--{}-order", &["topo", "author-date", "date"])
        .switch("-d", "Show refnames", "--decorate")
        .group("Refresh")
        .action("g", "buffer", ActionKind::Host(HostAction::Refresh))
        .group("Margin")
        .action("L", "toggle visibility", ActionKind::Host(HostAction::ToggleMargin))
        .action("l", "cycle style", ActionKind::Host(HostAction::CycleMarginStyle))
        .action("d", "toggle details", ActionKind::Host(HostAction::ToggleMarginDetails))
        .action("x", "toggle shortstat", ActionKind::Host(HostAction::ToggleShortstat))
        .build()
}

fn merge() -> PopupSpec {
    let merge = |args: &[&str], prompt: &str| {
        RunSpec::new(args.iter().copied()).operand(choose(prompt, Candidates::Branches))
    };
    PopupSpec::builder(PopupKind::Merge, "Merge")
        .switch("-f", "Fast-forward only", "--ff-only")
        .switch("-n", "No fast-forward", "--no-ff")
        .option("-s", "Strategy", "--strategy=")
        .option("-X", "Strategy Option", "--strategy-option=")
        .switch("-b", "Ignore changes in amount of whitespace", "-Xignore-space-change")
        .switch("-w", "Ignore whitespace when comparing lines", "-Xignore-all-space")
        .choice("-A", "Diff algorithm", "-Xdiff-algorithm=", &["default", "minimal", "patience", "histogram"])
        .option("-S", "Sign using gpg", "--gpg-sign=")
        .group("Actions")
        .run("m", "Merge", merge(&["merge", "--no-edit"], "Merge"))
        .run(
            "e",
            "Merge and edit message",
            merge(&["merge"], "Merge").operand(flagged("Merge message", "--message")),
        )
        .run("n", "Merge but don't commit", merge(&["merge", "--no-commit"], "Merge"))
        .run(
            "p",
            "Preview merge",
            git(["diff"])
                .operand(choose_as("Preview merge of", Candidates::Branches, "HEAD...{}"))
                .without_arguments()
                .view(),
        )
        .run("s", "Squash merge", merge(&["merge", "--squash"], "Squash"))
        .build()
}

fn pull() -> PopupSpec {
    PopupSpec::builder(PopupKind::Pull, "Pull")
        .section("Variables")
        .variable("r", "branch.{branch}.rebase", pull_rebase())
        .section("Arguments")
        .switch("-f", "Fast-forward only", "--ff-only")
        .switch("-r", "Rebase local commits", "--rebase")
        .switch("-a", "Autostash", "--autostash")
        .switch("-t", "Fetch tags", "--tags")
        .group("Pull into {branch} from")
        .run(
            "p",
            "pushRemote, setting that",
            git(["pull"]).operand(Operand::PushRemote(RefForm::Pair)),
        )
        .run(
            "u",
            "@{upstream}, creating it",
            git(["pull"]).operand(Operand::Upstream(RefForm::Pair)),
        )
        .run(
            "e",
            "elsewhere",
            git(["pull"]).operand(Operand::RemoteBranch {
                prompt: "Pull from".into(),
            }),
        )
        .group("Configure")
        .action("C", "Set variables...", ActionKind::Popup(PopupKind::BranchConfig))
        .build()
}

fn push() -> PopupSpec {
    PopupSpec::builder(PopupKind::Push, "Push")
        .switch("-f", "Force with lease", "--force-with-lease")
        .switch("-F", "Force", "--force")
        .switch("-h", "Disable hooks", "--no-verify")
        .switch("-d", "Dry run", "--dry-run")
        .switch("-u", "Set the upstream before pushing", "--set-upstream")
        .group("Push {branch} to")
        .run(
            "p",
            "pushRemote, setting that",
            git(["push"])
                .operand(Operand::PushRemote(RefForm::Refspec))
                .guard(Guard::PushDivergence),
        )
        .run(
            "u",
            "@{upstream}, creating it",
            git(["push"])
                .operand(Operand::Upstream(RefForm::Refspec))
                .guard(Guard::PushDivergence),
        )
        .run(
            "e",
            "elsewhere",
            git(["push"])
                .operand(choose("Push to remote", Candidates::Remotes))
                .operand(Operand::CurrentBranch)
                .guard(Guard::PushDivergence),
        )
        .group("Push")
        .run(
            "o",
            "another branch",
            git(["push"])
                .operand(choose("Push to remote", Candidates::Remotes))
                .operand(choose("Push branch", Candidates::LocalBranches)),
        )
        .run(
            "r",
            "explicit refspec",
            git(["push"])
                .operand(choose("Push to remote", Candidates::Remotes))
                .operand(text("Refspec")),
        )
        .run(
            "m",
            "matching branches",
            git(["push"])
                .operand(choose("Push matching branches to", Candidates::Remotes))
                .operand(lit(":")),
        )
        .run(
            "T",
            "a tag",
            git(["push"])
                .operand(choose("Push to remote", Candidates::Remotes))
                .operand(choose("Push tag", Candidates::Tags)),
        )
        .run(
            "t",
            "all tags",
            git(["push", "--tags"]).operand(choose("Push tags to", Candidates::Remotes)),
        )
        .group("Configure")
        .action("C", "Set variables...", ActionKind::Popup(PopupKind::BranchConfig))
        .build()
}

fn rebase() -> PopupSpec {
    let edit_first = |command: &str, prompt: &str| {
        git(["rebase", "--interactive"])
            .env("GIT_SEQUENCE_EDITOR", &first_todo(command))
            .operand(choose_as(prompt, Candidates::Commits, "{}^"))
    };
    PopupSpec::builder(PopupKind::Rebase, "Rebase")
        .switch("-k", "Keep empty commits", "--keep-empty")
        .choice("-r", "Rebase merges", "--rebase-merges=", &["no-rebase-cousins", "rebase-cousins"])
        .switch("-u", "Update branches", "--update-refs")
        .switch("-d", "Use author date as committer date", "--committer-date-is-author-date")
        .switch("-t", "Use current time as author date", "--ignore-date")
        .switch("-a", "Autosquash", "--autosquash")
        .switch("-A", "Autostash", "--autostash")
        .switch("-i", "Interactive", "--interactive")
        .switch("-h", "Disable hooks", "--no-verify")
        .option("-S", "Sign using gpg", "--gpg-sign=")
        .group("Rebase {branch} onto")
        .run(
            "p",
            "pushRemote, setting that",
            git(["rebase"]).operand(Operand::PushRemote(RefForm::Ref)),
        )
        .run(
            "u",
            "@{upstream}, creating it",
            git(["rebase"]).operand(Operand::Upstream(RefForm::Ref)),
        )
        .run(
            "e",
            "elsewhere",
            git(["rebase"]).operand(choose("Rebase onto", Candidates::Branches)),
        )
        .group("Rebase")
        .run(
            "i",
            "interactively",
            git(["rebase", "--interactive"])
                .operand(choose_as("Rebase from", Candidates::Commits, "{}^")),
        )
        .run(
            "s",
            "a subset",
            git(["rebase", "--onto"])
                .operand(choose("Rebase subset onto", Candidates::Branches))
                .operand(choose_as("Starting at", Candidates::Commits, "{}^")),
        )
        .run("m", "to modify a commit", edit_first("edit", "Modify commit"))
        .run("w", "to reword a commit", edit_first("reword", "Reword commit"))
        .run("d", "to remove a commit", edit_first("drop", "Remove commit"))
        .run(
            "f",
            "to autosquash",
            git(["rebase", "--interactive", "--autosquash"])
                .env("GIT_SEQUENCE_EDITOR", "true")
                .operand(choose("Autosquash onto", Candidates::Branches)),
        )
        .build()
}

fn remote_variables(builder: PopupBuilder, heading: &str) -> PopupBuilder {
    builder
        .section(heading)
        .variable("u", "remote.{remote}.url", VariableInput::Free)
        .variable("U", "remote.{remote}.fetch", VariableInput::Free)
        .variable("s", "remote.{remote}.pushurl", VariableInput::Free)
        .variable("S", "remote.{remote}.push", VariableInput::Free)
        .cycle("O", "remote.{remote}.tagOpt", &["--no-tags", "--tags"])
}

fn remote() -> PopupSpec {
    let pick = |prompt: &str| choose(prompt, Candidates::Remotes);
    remote_variables(PopupSpec::builder(PopupKind::Remote, "Remote"), "Variables")
        .section("Arguments")
        .switch("-f", "Fetch after add", "-f")
        .group("Actions")
        .run(
            "a",
            "Add",
            git(["remote", "add"])
                .operand(text("Add remote"))
                .operand(Operand::RemoteUrl { name_operand: 0 })
                .message("Added remote {0}"),
        )
        .run(
            "r",
            "Rename",
            git(["remote", "rename"])
                .operand(pick("Rename remote"))
                .operand(text("Rename to"))
                .without_arguments()
                .message("Renamed '{0}' -> '{1}'"),
        )
        .run(
            "x",
            "Remove",
            git(["remote", "remove"])
                .operand(pick("Remove remote"))
                .without_arguments()
                .message("Removed remote '{0}'"),
        )
        .action(
            "C",
            "Configure...",
            ActionKind::ScopedPopup {
                popup: PopupKind::RemoteConfig,
                source: ScopeSource::Remote,
            },
        )
        .run(
            "p",
            "Prune stale branches",
            git(["remote", "prune"])
                .operand(pick("Prune stale branches of remote"))
                .without_arguments()
                .message("Pruned remote {0}"),
        )
        .run(
            "b",
            "Update default branch",
            git(["remote", "set-head"])
                .operand(pick("Update default branch of remote"))
                .operand(lit("--auto"))
                .without_arguments()
                .message("Updated default branch of {0}"),
        )
        .run(
            "z",
            "Unshallow remote",
            git(["fetch", "--unshallow"])
                .operand(pick("Unshallow remote"))
                .without_arguments(),
        )
        .build()
}

fn remote_config() -> PopupSpec {
    remote_variables(
        PopupSpec::builder(PopupKind::RemoteConfig, "Configure remote"),
        "Configure remote",
    )
    .build()
}

fn reset() -> PopupSpec {
    let reset = |mode: &str| git(["reset", mode]).operand(choose("Reset to", Candidates::Commits));
    PopupSpec::builder(PopupKind::Reset, "Reset")
        .group("Reset")
        .run(
            "f",
            "file",
            git(["checkout"])
                .operand(choose("Checkout from revision", Candidates::Branches))
                .operand(lit("--"))
                .operand(text("File to reset")),
        )
        .run(
            "b",
            "branch",
            git(["branch", "--force"])
                .operand(choose("Reset branch", Candidates::LocalBranches))
                .operand(choose("Reset to", Candidates::Commits)),
        )
        .group("Reset this")
        .run("m", "mixed    (HEAD and index)", reset("--mixed"))
        .run("s", "soft     (HEAD only)", reset("--soft"))
        .run(
            "h",
            "hard     (HEAD, index and files)",
            reset("--hard").confirm("Hard reset to {0}? Uncommitted changes will be lost"),
        )
        .run("k", "keep     (HEAD and index, keeping uncommitted)", reset("--keep"))
        .run(
            "i",
            "index    (only)",
            git(["reset"])
                .operand(choose("Reset index to", Candidates::Commits))
                .operand(lit("--"))
                .operand(lit(".")),
        )
        .run(
            "w",
            "worktree (only)",
            git(["checkout"])
                .operand(choose("Reset worktree to", Candidates::Commits))
                .operand(lit("--"))
                .operand(lit("."))
                .confirm("Reset worktree to {0}? Uncommitted changes will be lost"),
        )
        .build()
}

fn revert() -> PopupSpec {
    PopupSpec::builder(PopupKind::Revert, "Revert")
        .option("=m", "Replay merge relative to parent", "--mainline=")
        .switch("-e", "Edit commit messages", "--edit")
        .switch("-E", "Don't edit commit messages", "--no-edit")
        .group("Revert")
        .run(
            "v",
            "Commit(s)",
            git(["revert"]).operand(choose("Revert commit", Candidates::Commits)),
        )
        .run(
            "V",
            "Changes",
            git(["revert", "--no-commit"]).operand(choose("Revert changes", Candidates::Commits)),
        )
        .build()
}

fn stash() -> PopupSpec {
    let pick = |prompt: &str| choose(prompt, Candidates::Stashes);
    PopupSpec::builder(PopupKind::Stash, "Stash")
        .switch("-u", "Also save untracked files", "--include-untracked")
        .switch("-a", "Also save untracked and ignored files", "--all")
        .group("Stash")
        .run("z", "both", git(["stash", "push"]))
        .run("i", "index", git(["stash", "push", "--staged"]).without_arguments())
        .run("x", "keeping index", git(["stash", "push", "--keep-index"]))
        .run(
            "P",
            "push",
            git(["stash", "push"]).operand(flagged("Stash message", "--message")),
        )
        .group("Use")
        .run("p", "pop", git(["stash", "pop"]).operand(pick("Pop stash")).without_arguments())
        .run("a", "apply", git(["stash", "apply"]).operand(pick("Apply stash")).without_arguments())
        .run(
            "d",
            "drop",
            git(["stash", "drop"])
                .operand(pick("Drop stash"))
                .confirm("Drop {0}?")
                .without_arguments(),
        )
        .group("Inspect")
        .run("l", "List", git(["stash", "list"]).without_arguments().view())
        .run(
            "v",
            "Show",
            git(["stash", "show", "-p"])
                .operand(pick("Show stash"))
                .without_arguments()
                .view(),
        )
        .group("Transform")
        .run(
            "b",
            "Branch",
            git(["stash", "branch"])
                .operand(branch_name("Branch name"))
                .operand(pick("Branch from stash"))
                .without_arguments(),
        )
        .build()
}

fn tag() -> PopupSpec {
    PopupSpec::builder(PopupKind::Tag, "Tag")
        .switch("-f", "Force", "--force")
        .switch("-a", "Annotate", "--annotate")
        .switch("-s", "Sign", "--sign")
        .option("-u", "Sign as", "--local-user=")
        .group("Create")
        .run(
            "t",
            "tag",
            git(["tag"])
                .operand(text("Tag name"))
                .operand(choose("Place tag on", Candidates::Branches)),
        )
        .run(
            "r",
            "release",
            git(["tag", "--annotate"])
                .operand(text("Release tag"))
                .operand(flagged("Release message", "--message")),
        )
        .group("Do")
        .run(
            "x",
            "delete",
            git(["tag", "--delete"])
                .operand(choose("Delete tag", Candidates::Tags))
                .confirm("Delete tag {0}?")
                .without_arguments(),
        )
        .run(
            "p",
            "prune",
            git(["fetch", "--prune", "--prune-tags"])
                .operand(choose("Prune tags against remote", Candidates::Remotes))
                .without_arguments(),
        )
        .build()
}

fn worktree() -> PopupSpec {
    let pick = |prompt: &str| choose(prompt, Candidates::Worktrees);
    PopupSpec::builder(PopupKind::Worktree, "Worktree")
        .group("Worktree")
        .run(
            "w",
            "Checkout",
            git(["worktree", "add"])
                .operand(text("Path for worktree"))
                .operand(choose("Checkout", Candidates::Branches)),
        )
        .run(
            "W",
            "Create",
            git(["worktree", "add", "-b"])
                .operand(branch_name("Name for new branch"))
                .operand(text("Path for worktree"))
                .operand(choose("Create branch starting at", Candidates::Branches)),
        )
        .group("Do")
        .run(
            "m",
            "Move",
            git(["worktree", "move"])
                .operand(pick("Move worktree"))
                .operand(text("Move to")),
        )
        .run(
            "D",
            "Delete",
            git(["worktree", "remove"])
                .operand(pick("Remove worktree"))
                .confirm("Remove worktree at {0}?"),
        )
        .build()
}
