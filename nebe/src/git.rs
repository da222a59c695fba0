//! [`Git`] implementation running the `git` executable.

use async_trait::async_trait;
use nebe_core::contract::{BoxError, Git};
use nebe_core::git_status::GitStatus;
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
#[error("git {args} failed ({status}): {stderr}")]
pub struct GitError {
    pub args: String,
    pub status: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    /// Runs `git` (optionally with `-C repo`) and returns its stdout.
    async fn run(&self, repo: Option<&Path>, args: &[&str]) -> Result<String, BoxError> {
        let mut command = Command::new("git");
        if let Some(repo) = repo {
            command.arg("-C").arg(repo);
        }
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        tracing::debug!(repo = ?repo, args = ?args, "Running git");
        let output = command.output().await?;
        if !output.status.success() {
            return Err(Box::new(GitError {
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Git for GitCli {
    async fn clone_repo(
        &self,
        origin: &str,
        dest: &Path,
        depth: Option<u32>,
    ) -> Result<(), BoxError> {
        let dest = dest.to_string_lossy().into_owned();
        let depth = depth.map(|d| d.to_string());
        let mut args = vec!["clone"];
        if let Some(depth) = depth.as_deref() {
            args.extend(["--depth", depth]);
        }
        args.extend([origin, dest.as_str()]);
        self.run(None, &args).await?;
        Ok(())
    }

    async fn fetch(&self, repo: &Path) -> Result<(), BoxError> {
        self.run(Some(repo), &["fetch"]).await?;
        Ok(())
    }

    async fn pull(&self, repo: &Path) -> Result<(), BoxError> {
        self.run(Some(repo), &["pull"]).await?;
        Ok(())
    }

    async fn status(&self, repo: &Path) -> Result<GitStatus, BoxError> {
        let output = self
            .run(Some(repo), &["status", "--porcelain=v1", "--branch"])
            .await?;
        Ok(GitStatus::parse_porcelain(&output))
    }

    async fn add_all(&self, repo: &Path) -> Result<(), BoxError> {
        self.run(Some(repo), &["add", "-A"]).await?;
        Ok(())
    }

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), BoxError> {
        self.run(Some(repo), &["commit", "-m", message]).await?;
        Ok(())
    }

    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), BoxError> {
        self.run(Some(repo), &["push", remote, branch]).await?;
        Ok(())
    }

    async fn local_config(&self, repo: &Path, key: &str) -> Result<Option<String>, BoxError> {
        let mut command = Command::new("git");
        command
            .arg("-C")
            .arg(repo)
            .args(["config", "--local", "--get", key]);
        let output = command.output().await?;
        // Exit code 1 means the key is not set.
        match output.status.code() {
            Some(0) => {
                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Ok((!value.is_empty()).then_some(value))
            }
            Some(1) => Ok(None),
            _ => Err(Box::new(GitError {
                args: format!("config --local --get {key}"),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })),
        }
    }

    async fn set_local_config(&self, repo: &Path, key: &str, value: &str) -> Result<(), BoxError> {
        self.run(Some(repo), &["config", "--local", key, value]).await?;
        Ok(())
    }
}
