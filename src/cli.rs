use std::path::PathBuf;

use clap::Parser;

/// Live lint report annotated with git blame.
#[derive(Parser, Debug, Clone)]
#[command(name = "lintblame", version, about)]
pub struct Cli {
    /// File or directory to lint (defaults to files changed on the branch)
    pub target: Option<PathBuf>,

    /// Lint files changed in the working tree and on the current branch
    #[arg(short, long)]
    pub branch: bool,

    /// Base branch to diff against in branch mode (default: master)
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Path to config file (default: <repo>/.lintblame.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run a single pass then exit
    #[arg(long)]
    pub once: bool,

    /// Disable colors and screen clearing
    #[arg(long)]
    pub no_color: bool,
}
