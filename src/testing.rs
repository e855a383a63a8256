//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::git::commands::{GitCommand, GitOutput, GitRunner};
use crate::git::config::ConfigStore;
use crate::interaction::Interaction;

enum Reply {
    Output(GitOutput),
    Cancel,
}

/// Scripted git: replies are registered per argument list, every call is
/// recorded. Unregistered commands succeed with empty output.
#[derive(Default)]
pub struct FakeGit {
    replies: RefCell<HashMap<Vec<String>, VecDeque<Reply>>>,
    calls: RefCell<Vec<GitCommand>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<I, S>(args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().map(Into::into).collect()
    }

    /// Queue a reply. The last queued reply for a command is reused forever.
    pub fn respond<I, S>(&self, args: I, output: GitOutput)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .borrow_mut()
            .entry(Self::key(args))
            .or_default()
            .push_back(Reply::Output(output));
    }

    /// Drop whatever was queued for the command and reply with `output` from now on.
    pub fn replace<I, S>(&self, args: I, output: GitOutput)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut replies = self.replies.borrow_mut();
        let queue = replies.entry(Self::key(args)).or_default();
        queue.clear();
        queue.push_back(Reply::Output(output));
    }

    pub fn respond_ok<I, S>(&self, args: I, stdout: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.respond(
            args,
            GitOutput {
                stdout: stdout.to_string(),
                ..Default::default()
            },
        );
    }

    pub fn respond_exit<I, S>(&self, args: I, exit_code: i32, stderr: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.respond(
            args,
            GitOutput {
                stderr: stderr.to_string(),
                exit_code,
                ..Default::default()
            },
        );
    }

    /// The command is cancelled by the host before completing.
    pub fn cancel<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .borrow_mut()
            .entry(Self::key(args))
            .or_default()
            .push_back(Reply::Cancel);
    }

    pub fn calls(&self) -> Vec<GitCommand> {
        self.calls.borrow().clone()
    }

    /// Argument lists of every recorded call, joined with spaces.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(GitCommand::display).collect()
    }

    pub fn called_with(&self, line: &str) -> bool {
        self.call_lines().iter().any(|l| l == line)
    }

    /// Calls that start with the given subcommand.
    pub fn calls_to(&self, subcommand: &str) -> Vec<GitCommand> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .cloned()
            .collect()
    }
}

impl GitRunner for FakeGit {
    fn run(&self, command: &GitCommand) -> Result<GitOutput> {
        self.calls.borrow_mut().push(command.clone());
        let mut replies = self.replies.borrow_mut();
        let Some(queue) = replies.get_mut(&command.args) else {
            return Ok(GitOutput::default());
        };
        let popped = if queue.len() > 1 {
            queue.pop_front()
        } else {
            None
        };
        match popped.as_ref().or_else(|| queue.front()) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Cancel) => Err(Error::Cancelled),
            None => Ok(GitOutput::default()),
        }
    }
}

/// Repository configuration held in memory.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<const N: usize>(entries: [(&str, &str); N]) -> Self {
        let config = Self::new();
        for (key, value) in entries {
            config
                .values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
        }
        config
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Replays queued answers and records every prompt it was shown.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    pub confirms: VecDeque<bool>,
    pub inputs: VecDeque<Option<String>>,
    pub choices: VecDeque<Option<String>>,
    pub prompts: Vec<String>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }

    pub fn typing(mut self, text: &str) -> Self {
        self.inputs.push_back(Some(text.to_string()));
        self
    }

    pub fn choosing(mut self, choice: &str) -> Self {
        self.choices.push_back(Some(choice.to_string()));
        self
    }
}

impl Interaction for ScriptedInteraction {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn input(&mut self, prompt: &str, _default: Option<&str>) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.inputs.pop_front().flatten()
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<String> {
        self.prompts.push(prompt.to_string());
        let choice = self.choices.pop_front().flatten()?;
        candidates.contains(&choice).then_some(choice)
    }
}
