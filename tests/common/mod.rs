//! Scratch repositories driven through the real git binary.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use porcelain::Interaction;
use tempfile::TempDir;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Run git in `dir` with a fixed identity and return trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

pub struct TestRepo {
    // Keeps the directory alive.
    _root: TempDir,
    pub path: PathBuf,
    pub base: PathBuf,
}

impl TestRepo {
    /// A repository on `master` with one commit of `README`.
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().to_path_buf();
        let path = base.join("work");
        fs::create_dir_all(&path).unwrap();
        git(&path, &["init", "-q", "-b", "master"]);
        let repo = Self {
            _root: root,
            path,
            base,
        };
        repo.write("README", "readme\n");
        repo.git(&["add", "README"]);
        repo.git(&["commit", "-q", "-m", "Initial commit"]);
        repo
    }

    pub fn git(&self, args: &[&str]) -> String {
        git(&self.path, args)
    }

    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.path.join(name), contents).unwrap();
    }

    pub fn commit(&self, name: &str, contents: &str, message: &str) {
        self.write(name, contents);
        self.git(&["add", name]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Create a bare `origin` next to the work tree and push master to it.
    pub fn with_origin(&self) -> PathBuf {
        let remote = self.base.join("origin.git");
        fs::create_dir_all(&remote).unwrap();
        git(&remote, &["init", "-q", "--bare", "-b", "master"]);
        self.git(&["remote", "add", "origin", remote.to_str().unwrap()]);
        self.git(&["push", "-q", "-u", "origin", "master"]);
        remote
    }

    pub fn config(&self, key: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["config", "--get", key])
            .current_dir(&self.path)
            .output()
            .unwrap();
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

/// Answers prompts from a script and records what was asked.
#[derive(Default)]
pub struct Answers {
    confirms: VecDeque<bool>,
    choices: VecDeque<String>,
    pub asked: Vec<String>,
}

impl Answers {
    pub fn confirming(mut self, yes: bool) -> Self {
        self.confirms.push_back(yes);
        self
    }

    pub fn choosing(mut self, choice: &str) -> Self {
        self.choices.push_back(choice.to_string());
        self
    }
}

impl Interaction for Answers {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.asked.push(prompt.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn input(&mut self, prompt: &str, _default: Option<&str>) -> Option<String> {
        self.asked.push(prompt.to_string());
        None
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<String> {
        self.asked.push(prompt.to_string());
        let choice = self.choices.pop_front()?;
        candidates.contains(&choice).then_some(choice)
    }
}
