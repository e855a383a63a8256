use anyhow::{Context, Result};
use git2::Repository;
use std::path::{Path, PathBuf};

/// Location of the repository the host operates on.
pub struct RepoLocation {
    workdir: PathBuf,
    git_dir: PathBuf,
}

impl RepoLocation {
    /// Find the enclosing repository of `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo =
            Repository::discover(path).context("Not a git repository (or any parent directory)")?;
        let workdir = repo
            .workdir()
            .context("Bare repositories are not supported")?
            .to_path_buf();
        Ok(Self {
            workdir,
            git_dir: repo.path().to_path_buf(),
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let location = RepoLocation::discover(&nested).unwrap();
        assert_eq!(
            location.workdir().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert!(location.git_dir().ends_with(".git"));
    }

    #[test]
    fn outside_a_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        if Repository::discover(dir.path()).is_ok() {
            return;
        }
        assert!(RepoLocation::discover(dir.path()).is_err());
    }
}
