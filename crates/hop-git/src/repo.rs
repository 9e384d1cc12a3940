use std::path::{Path, PathBuf};

use crate::command::GitCli;
use crate::error::GitError;

/// Branches too common to be worth showing in a title.
const QUIET_BRANCHES: &[&str] = &["main", "master"];

pub fn repo_root(git: &GitCli, cwd: &Path) -> Result<PathBuf, GitError> {
    if !cwd.is_dir() {
        return Err(GitError::NotARepository {
            path: cwd.to_path_buf(),
        });
    }
    let root = match git.run(cwd, ["rev-parse", "--show-toplevel"]) {
        Ok(root) => root,
        Err(GitError::CommandFailed { .. }) => String::new(),
        Err(err) => return Err(err),
    };
    if root.is_empty() {
        return Err(GitError::NotARepository {
            path: cwd.to_path_buf(),
        });
    }
    Ok(PathBuf::from(root))
}

/// Current branch name, or `detached@<short sha>` for a detached HEAD.
pub fn branch_label(git: &GitCli, cwd: &Path) -> Result<String, GitError> {
    let branch = git.run(cwd, ["rev-parse", "--abbrev-ref", "HEAD"])?;
    if branch != "HEAD" {
        return Ok(branch);
    }
    match git.run(cwd, ["rev-parse", "--short", "HEAD"]) {
        Ok(sha) if !sha.is_empty() => Ok(format!("detached@{sha}")),
        _ => Ok("detached".to_string()),
    }
}

/// Project and branch shown in a notification title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoLabel {
    pub project: Option<String>,
    /// Omitted for `main` and `master`.
    pub branch: Option<String>,
}

impl RepoLabel {
    /// Best effort: git failures only drop the parts they would have filled.
    pub fn detect(git: &GitCli, cwd: &Path) -> Self {
        if cwd.as_os_str().is_empty() {
            return Self::default();
        }
        let root = repo_root(git, cwd).ok();
        let project = basename(root.as_deref().unwrap_or(cwd));
        let branch = root
            .as_ref()
            .and_then(|_| branch_label(git, cwd).ok())
            .filter(|branch| !branch.is_empty() && !QUIET_BRANCHES.contains(&branch.as_str()));
        Self { project, branch }
    }

    /// `project@branch`, `project`, or nothing.
    pub fn suffix(&self) -> Option<String> {
        match (&self.project, &self.branch) {
            (Some(project), Some(branch)) => Some(format!("{project}@{branch}")),
            (Some(project), None) => Some(project.clone()),
            (None, _) => None,
        }
    }
}

fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
