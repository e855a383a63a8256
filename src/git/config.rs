use crate::error::Result;
use crate::git::commands::{GitCommand, GitRunner, GitRunnerExt};

/// Persistent repository configuration.
pub trait ConfigStore {
    /// `None` when the key is not set.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn unset(&self, key: &str) -> Result<()>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn unset(&self, key: &str) -> Result<()> {
        (**self).unset(key)
    }
}

/// `git config` exits with 5 when unsetting a key that is not present.
const EXIT_KEY_NOT_SET: i32 = 5;

/// Repository configuration read and written through `git config`.
pub struct GitConfig<R> {
    runner: R,
}

impl<R: GitRunner> GitConfig<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: GitRunner> ConfigStore for GitConfig<R> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.runner.query(["config", "--get", key])
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        tracing::info!(key, value, "config set");
        self.runner.git(["config", key, value])?;
        Ok(())
    }

    fn unset(&self, key: &str) -> Result<()> {
        tracing::info!(key, "config unset");
        let command = GitCommand::new(["config", "--unset", key]);
        let output = self.runner.run(&command)?;
        if output.success() || output.exit_code == EXIT_KEY_NOT_SET {
            Ok(())
        } else {
            self.runner.run_checked(&command).map(|_| ())
        }
    }
}
