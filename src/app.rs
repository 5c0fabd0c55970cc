use std::io::Write;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::analysis::Analyzer;
use crate::blame::BlameProvider;
use crate::error::{Error, Result};
use crate::fileset::WorkingSetSource;
use crate::identity::OperatorIdentity;
use crate::provider::IssueProvider;
use crate::report::Reporter;
use crate::watch::{Tick, Watcher};

/// The watch loop: owns the working set and drives analysis and rendering.
pub struct App<S, P, B, W> {
    watcher: Watcher<S>,
    analyzer: Analyzer<P, B>,
    reporter: Reporter,
    identity: OperatorIdentity,
    out: W,
    poll_interval: Duration,
    once: bool,
    runs: u64,
}

impl<S, P, B, W> App<S, P, B, W>
where
    S: WorkingSetSource,
    P: IssueProvider,
    B: BlameProvider,
    W: Write,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        watcher: Watcher<S>,
        analyzer: Analyzer<P, B>,
        reporter: Reporter,
        identity: OperatorIdentity,
        out: W,
        poll_interval: Duration,
        once: bool,
    ) -> Self {
        Self {
            watcher,
            analyzer,
            reporter,
            identity,
            out,
            poll_interval,
            once,
            runs: 0,
        }
    }

    /// Number of full runs completed so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn watcher(&self) -> &Watcher<S> {
        &self.watcher
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Tick until shutdown (or once, in single-pass mode).
    ///
    /// Returns `Error::Interrupted` when stopped through `shutdown`.
    pub async fn run_loop(&mut self, mut shutdown: Option<watch::Receiver<bool>>) -> Result<()> {
        loop {
            if shutdown_requested(shutdown.as_ref()) {
                info!("shutdown requested, exiting loop");
                return Err(Error::Interrupted);
            }

            self.tick().await?;

            if self.once {
                return Ok(());
            }

            if wait_for_poll_or_shutdown(self.poll_interval, &mut shutdown).await {
                info!("shutdown requested, exiting loop");
                return Err(Error::Interrupted);
            }
        }
    }

    /// One tick: detect changes and, when needed, run and render.
    ///
    /// Returns whether a run happened.
    pub async fn tick(&mut self) -> Result<bool> {
        let files = match self.watcher.poll()? {
            Tick::Run(files) => files,
            Tick::Idle => {
                debug!("no changes");
                return Ok(false);
            }
        };

        if self.runs > 0 {
            writeln!(self.out, "Refreshing...")?;
            self.out.flush()?;
        }

        let report = self.analyzer.run(&files).await?;
        let operator = self.identity.current_operator();
        self.reporter.render(&mut self.out, &report, operator)?;

        self.watcher.complete_run();
        self.runs += 1;
        Ok(true)
    }
}

fn shutdown_requested(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.is_some_and(|rx| *rx.borrow())
}

async fn wait_for_poll_or_shutdown(
    poll_duration: Duration,
    shutdown: &mut Option<watch::Receiver<bool>>,
) -> bool {
    if let Some(rx) = shutdown {
        tokio::select! {
            _ = tokio::time::sleep(poll_duration) => false,
            changed = rx.changed() => match changed {
                Ok(()) => *rx.borrow(),
                Err(_) => {
                    // Sender gone: nobody can request shutdown anymore
                    tokio::time::sleep(poll_duration).await;
                    false
                }
            }
        }
    } else {
        tokio::time::sleep(poll_duration).await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::blame::Blame;
    use crate::issue::ProviderKind;

    struct FixedSource(BTreeSet<PathBuf>);

    impl WorkingSetSource for FixedSource {
        fn resolve(&self) -> Result<BTreeSet<PathBuf>> {
            Ok(self.0.clone())
        }
    }

    struct CannedProvider(&'static str);

    impl IssueProvider for CannedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Style
        }

        async fn run(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct CountingBlame {
        calls: Mutex<u32>,
    }

    impl BlameProvider for CountingBlame {
        fn blame(&self, path: &Path) -> Result<Blame> {
            *self.calls.lock().unwrap() += 1;
            Ok(Blame::parse(
                path,
                "abc (Alice 2024-01-01 1) a\nabc (Bob 2024-01-01 2) b\n",
            ))
        }
    }

    fn app(
        files: &[&str],
        provider_output: &'static str,
        operator: Option<&str>,
        once: bool,
    ) -> App<FixedSource, CannedProvider, CountingBlame, Vec<u8>> {
        let source = FixedSource(files.iter().map(PathBuf::from).collect());
        App::new(
            Watcher::new(source),
            Analyzer::new(vec![CannedProvider(provider_output)], CountingBlame::default()),
            Reporter::new(false),
            OperatorIdentity::fixed(operator),
            Vec::new(),
            Duration::from_millis(10),
            once,
        )
    }

    fn output(app: &App<FixedSource, CannedProvider, CountingBlame, Vec<u8>>) -> String {
        String::from_utf8(app.output().clone()).unwrap()
    }

    #[tokio::test]
    async fn test_first_tick_runs_then_idles() {
        let mut app = app(&["/nonexistent/a.py"], "", None, false);
        assert!(app.tick().await.unwrap());
        let after_first = output(&app);
        assert!(after_first.contains("All clean!"));

        assert!(!app.tick().await.unwrap());
        assert!(!app.tick().await.unwrap());
        assert_eq!(output(&app), after_first);
        assert_eq!(app.runs(), 1);
    }

    #[tokio::test]
    async fn test_once_runs_single_pass() {
        let mut app = app(
            &["/nonexistent/a.py"],
            "a.py:2:1: W291 trailing whitespace\n",
            Some("Bob"),
            true,
        );
        app.run_loop(None).await.unwrap();
        assert_eq!(app.runs(), 1);
        let out = output(&app);
        assert!(out.contains("2:1 [W291] trailing whitespace [Bob]*"));
        assert!(!out.contains("Refreshing..."));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_loop() {
        let mut app = app(&[], "", None, false);
        let (tx, rx) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
            tx
        });
        let err = app.run_loop(Some(rx)).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(app.runs(), 1);
        drop(stopper.await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_working_set_still_renders() {
        let mut app = app(&[], "", None, true);
        app.run_loop(None).await.unwrap();
        assert!(output(&app).contains("Finished linting 0 file(s)"));
    }
}
