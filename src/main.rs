use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lintblame::analysis::Analyzer;
use lintblame::app::App;
use lintblame::blame::GitBlame;
use lintblame::cli::Cli;
use lintblame::config::Config;
use lintblame::error::{Error, Result};
use lintblame::fileset::{FileSetResolver, Mode};
use lintblame::git::Git;
use lintblame::identity::OperatorIdentity;
use lintblame::provider::default_providers;
use lintblame::report::Reporter;
use lintblame::watch::Watcher;

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("LINTBLAME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli).await {
        if !matches!(e, Error::Interrupted) {
            eprintln!("error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mode = Mode::from_args(cli.target.as_deref(), cli.branch, &cwd)?;

    let git = Git::discover(&cwd)?;
    let config = Config::load(&cli, git.root())?;
    info!(?config, ?mode, root = %git.root().display(), "starting");

    let resolver = FileSetResolver::new(
        mode,
        git.clone(),
        config.suffix.clone(),
        config.base_branch.clone(),
    )?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let analyzer = Analyzer::new(
        default_providers(&config, git.root(), &shutdown_rx),
        GitBlame::new(git.clone()),
    );

    let mut app = App::new(
        Watcher::new(resolver),
        analyzer,
        Reporter::new(config.color),
        OperatorIdentity::new(config.identity_file.clone()),
        std::io::stdout(),
        config.poll_interval,
        config.once,
    );

    tokio::spawn(async move {
        wait_for_termination().await;
        info!("termination signal received");
        let _ = shutdown_tx.send(true);
    });

    let interrupted = shutdown_rx.clone();
    match app.run_loop(Some(shutdown_rx)).await {
        // A tool stopped mid-run may surface as its own error
        Err(_) if *interrupted.borrow() => Err(Error::Interrupted),
        other => other,
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => warn!(error = %e, "unable to listen for SIGTERM"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for SIGINT");
        std::future::pending::<()>().await;
    }
}
