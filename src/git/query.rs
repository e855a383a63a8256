//! Read-only repository queries, all through the [`GitRunner`] seam.

use chrono::{DateTime, Utc};

use super::commands::{GitRunner, GitRunnerExt};
use crate::error::Result;

const FIELD_SEP: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// `stash@{n}`
    pub name: String,
    pub time: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub time: Option<DateTime<Utc>>,
    pub subject: String,
}

fn timestamp(field: &str) -> Option<DateTime<Utc>> {
    field
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Thin typed wrapper over a runner for repository queries.
pub struct Query<'a, R: ?Sized> {
    git: &'a R,
}

impl<'a, R: GitRunner + ?Sized> Query<'a, R> {
    pub fn new(git: &'a R) -> Self {
        Self { git }
    }

    /// Whether HEAD points at a commit. False in a freshly initialised repository.
    pub fn has_head(&self) -> Result<bool> {
        Ok(self
            .git
            .query(["rev-parse", "--verify", "--quiet", "HEAD"])?
            .is_some())
    }

    /// Checked out branch; `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self
            .git
            .query(["symbolic-ref", "--quiet", "--short", "HEAD"])?
            .filter(|b| !b.is_empty()))
    }

    pub fn head_subject(&self) -> Result<Option<String>> {
        self.git.query(["log", "-1", "--format=%s"])
    }

    pub fn head_short(&self) -> Result<Option<String>> {
        self.git.query(["rev-parse", "--short", "HEAD"])
    }

    /// `@{upstream}` or `@{push}` of the current branch, abbreviated.
    pub fn tracking(&self, which: &str) -> Result<Option<String>> {
        Ok(self
            .git
            .query([
                "rev-parse".to_string(),
                "--abbrev-ref".to_string(),
                "--symbolic-full-name".to_string(),
                format!("@{{{which}}}"),
            ])?
            .filter(|r| !r.is_empty()))
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        self.refs("refs/heads/")
    }

    pub fn remote_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .refs("refs/remotes/")?
            .into_iter()
            .filter(|r| !r.ends_with("/HEAD"))
            .collect())
    }

    /// Local branches followed by remote-tracking branches.
    pub fn branches(&self) -> Result<Vec<String>> {
        let mut all = self.local_branches()?;
        all.extend(self.remote_branches()?);
        Ok(all)
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        self.refs("refs/tags/")
    }

    fn refs(&self, prefix: &str) -> Result<Vec<String>> {
        let output = self.git.git(["for-each-ref", "--format=%(refname)", prefix])?;
        Ok(output
            .lines()
            .filter_map(|r| r.strip_prefix(prefix))
            .map(str::to_string)
            .collect())
    }

    pub fn remotes(&self) -> Result<Vec<String>> {
        Ok(self
            .git
            .git(["remote"])?
            .lines()
            .map(str::to_string)
            .collect())
    }

    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        self.git.query(["remote", "get-url", remote])
    }

    pub fn stashes(&self) -> Result<Vec<StashEntry>> {
        let output = self
            .git
            .git(["stash", "list", "--format=%gd%x1f%ct%x1f%gs"])?;
        Ok(output
            .lines()
            .filter_map(|line| {
                let mut fields = line.splitn(3, FIELD_SEP);
                Some(StashEntry {
                    name: fields.next()?.to_string(),
                    time: timestamp(fields.next()?),
                    message: fields.next().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    /// The last `limit` commits reachable from HEAD. Empty without commits.
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<CommitSummary>> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }
        let output = self.git.git([
            "log".to_string(),
            format!("-n{limit}"),
            "--format=%h%x1f%ct%x1f%s".to_string(),
        ])?;
        Ok(output
            .lines()
            .filter_map(|line| {
                let mut fields = line.splitn(3, FIELD_SEP);
                Some(CommitSummary {
                    hash: fields.next()?.to_string(),
                    time: timestamp(fields.next()?),
                    subject: fields.next().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    /// Paths of all worktrees, main worktree first.
    pub fn worktrees(&self) -> Result<Vec<String>> {
        let output = self.git.git(["worktree", "list", "--porcelain"])?;
        Ok(output
            .lines()
            .filter_map(|l| l.strip_prefix("worktree "))
            .map(str::to_string)
            .collect())
    }

    /// NUL-separated so paths arrive unquoted.
    pub fn untracked_files(&self) -> Result<Vec<String>> {
        Ok(self
            .git
            .git(["ls-files", "-z", "--others", "--exclude-standard"])?
            .stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// True when `ancestor` is reachable from `descendant`.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(self
            .git
            .query(["merge-base", "--is-ancestor", ancestor, descendant])?
            .is_some())
    }

    pub fn ref_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .git
            .query(["rev-parse", "--verify", "--quiet", name])?
            .is_some())
    }

    /// Root of the working tree. Fails outside a repository.
    pub fn toplevel(&self) -> Result<String> {
        let output = self.git.git(["rev-parse", "--show-toplevel"])?;
        Ok(output.stdout.trim().to_string())
    }

    pub fn git_dir(&self) -> Result<String> {
        let output = self.git.git(["rev-parse", "--absolute-git-dir"])?;
        Ok(output.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGit;

    #[test]
    fn remote_branches_skip_symbolic_head() {
        let git = FakeGit::new();
        git.respond_ok(
            ["for-each-ref", "--format=%(refname)", "refs/remotes/"],
            "refs/remotes/origin/HEAD\nrefs/remotes/origin/main\nrefs/remotes/fork/topic\n",
        );
        assert_eq!(
            Query::new(&git).remote_branches().unwrap(),
            vec!["origin/main", "fork/topic"]
        );
    }

    #[test]
    fn stash_list_is_split_into_fields() {
        let git = FakeGit::new();
        git.respond_ok(
            ["stash", "list", "--format=%gd%x1f%ct%x1f%gs"],
            "stash@{0}\u{1f}1700000000\u{1f}WIP on main: 1234567 init\n",
        );
        let stashes = Query::new(&git).stashes().unwrap();
        assert_eq!(stashes.len(), 1);
        assert_eq!(stashes[0].name, "stash@{0}");
        assert_eq!(stashes[0].message, "WIP on main: 1234567 init");
        assert_eq!(
            stashes[0].time.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn recent_commits_empty_without_head() {
        let git = FakeGit::new();
        git.respond_exit(["rev-parse", "--verify", "--quiet", "HEAD"], 1, "");
        assert!(Query::new(&git).recent_commits(10).unwrap().is_empty());
        assert!(git.calls_to("log").is_empty());
    }

    #[test]
    fn detached_head_has_no_branch() {
        let git = FakeGit::new();
        git.respond_exit(["symbolic-ref", "--quiet", "--short", "HEAD"], 1, "");
        assert_eq!(Query::new(&git).current_branch().unwrap(), None);
    }

    #[test]
    fn tracking_refs() {
        let git = FakeGit::new();
        git.respond_ok(
            [
                "rev-parse",
                "--abbrev-ref",
                "--symbolic-full-name",
                "@{upstream}",
            ],
            "origin/main\n",
        );
        git.respond_exit(
            ["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{push}"],
            128,
            "fatal: no push destination",
        );
        let query = Query::new(&git);
        assert_eq!(query.tracking("upstream").unwrap().as_deref(), Some("origin/main"));
        assert_eq!(query.tracking("push").unwrap(), None);
    }
}
