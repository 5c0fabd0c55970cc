use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::issue::{Issue, ProviderKind, matcher_for};
use crate::process::{ProcessConfig, spawn_and_collect};

pub trait IssueProvider: Sync {
    fn kind(&self) -> ProviderKind;

    /// Run the tool against `path` and return its raw standard output.
    fn run(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Run the tool and parse whatever issues its output contains.
    fn issues(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<Issue>>> + Send {
        async move {
            let raw = self.run(path).await?;
            Ok(matcher_for(self.kind()).matches(&raw).collect())
        }
    }
}

/// An external analysis tool invoked once per file.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    kind: ProviderKind,
    command: String,
    working_dir: PathBuf,
    timeout: Option<Duration>,
    fail_on_stderr: bool,
    shutdown: Option<watch::Receiver<bool>>,
}

impl CommandProvider {
    pub fn new(
        kind: ProviderKind,
        command: String,
        working_dir: PathBuf,
        timeout: Option<Duration>,
        fail_on_stderr: bool,
    ) -> Self {
        Self {
            kind,
            command,
            working_dir,
            timeout,
            fail_on_stderr,
            shutdown: None,
        }
    }

    /// Stop a running tool as soon as `shutdown` turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Arguments for a given file.
    pub fn build_args(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy().to_string();
        match self.kind {
            ProviderKind::Style => vec![path],
            ProviderKind::Lint => vec!["--output-format=text".to_string(), path],
        }
    }
}

impl IssueProvider for CommandProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn run(&self, path: &Path) -> Result<String> {
        let config = ProcessConfig {
            command: self.command.clone(),
            args: self.build_args(path),
            working_dir: self.working_dir.clone(),
            timeout: self.timeout,
            log_prefix: self.command.clone(),
            shutdown: self.shutdown.clone(),
        };

        let output = spawn_and_collect(config).await?;

        if let Some(sig) = output.signal {
            return Err(Error::ProviderFailure {
                provider: self.command.clone(),
                path: path.to_path_buf(),
                detail: format!("killed by signal {sig}"),
            });
        }

        // Linters exit non-zero when they find issues; only stderr signals failure
        let stderr = output.stderr();
        if !stderr.is_empty() {
            if self.fail_on_stderr {
                return Err(Error::ProviderFailure {
                    provider: self.command.clone(),
                    path: path.to_path_buf(),
                    detail: stderr,
                });
            }
            warn!(
                provider = %self.command,
                path = %path.display(),
                stderr = %stderr,
                "provider wrote to stderr"
            );
        }

        Ok(output.stdout())
    }
}

/// The fixed provider set, in priority order: style checker, then linter.
pub fn default_providers(
    config: &Config,
    working_dir: &Path,
    shutdown: &watch::Receiver<bool>,
) -> Vec<CommandProvider> {
    [
        (ProviderKind::Style, &config.style_command),
        (ProviderKind::Lint, &config.lint_command),
    ]
    .into_iter()
    .map(|(kind, command)| {
        CommandProvider::new(
            kind,
            command.clone(),
            working_dir.to_path_buf(),
            config.tool_timeout,
            config.fail_on_stderr,
        )
        .with_shutdown(shutdown.clone())
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::{ConfigFile, merge};
    use clap::Parser;

    fn provider(kind: ProviderKind) -> CommandProvider {
        CommandProvider::new(kind, "tool".to_string(), PathBuf::from("/repo"), None, true)
    }

    #[test]
    fn test_style_args() {
        let args = provider(ProviderKind::Style).build_args(Path::new("/repo/a.py"));
        assert_eq!(args, vec!["/repo/a.py"]);
    }

    #[test]
    fn test_lint_args() {
        let args = provider(ProviderKind::Lint).build_args(Path::new("/repo/a.py"));
        assert_eq!(args, vec!["--output-format=text", "/repo/a.py"]);
    }

    #[test]
    fn test_default_providers_order() {
        let config = merge(
            ConfigFile {
                style_command: Some("pycodestyle".to_string()),
                ..Default::default()
            },
            &Cli::parse_from(["lintblame"]),
        );
        let (_tx, rx) = watch::channel(false);
        let providers = default_providers(&config, Path::new("/repo"), &rx);
        let kinds: Vec<ProviderKind> = providers.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec![ProviderKind::Style, ProviderKind::Lint]);
        assert_eq!(providers[0].command, "pycodestyle");
        assert_eq!(providers[1].command, "pylint");
        assert!(providers.iter().all(|p| p.shutdown.is_some()));
    }
}
