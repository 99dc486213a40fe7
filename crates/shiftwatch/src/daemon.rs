//! Single runs and the interval loop around them.

use std::time::Duration;

use miette::Result;
use rand::Rng;
use shiftwatch_core::{RunOptions, RunOutcome, Runner};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::Settings;
use crate::trigger::Trigger;

/// Longest randomized delay before a run starts.
const MAX_FUZZ_DELAY_SECS: u64 = 30;

/// One in this many triggers actually runs when fuzzing.
const FUZZ_RUN_ONE_IN: u32 = 3;

/// Randomized start: `None` to skip this trigger, or the delay before running.
fn fuzz() -> Option<Duration> {
    let mut rng = rand::thread_rng();
    if rng.gen_range(0..FUZZ_RUN_ONE_IN) != 0 {
        return None;
    }
    Some(Duration::from_secs(rng.gen_range(0..=MAX_FUZZ_DELAY_SECS)))
}

/// Handle one trigger.
pub async fn run_once(runner: &Runner, settings: &Settings, trigger: Trigger) -> Result<()> {
    if !trigger.no_fuzz {
        match fuzz() {
            Some(delay) => {
                info!(delay_secs = delay.as_secs(), "fuzz: delaying run");
                tokio::time::sleep(delay).await;
            }
            None => {
                info!("fuzz: skipping run");
                return Ok(());
            }
        }
    }

    let options = RunOptions {
        debug: trigger.debug,
        session_key: settings.session_key(trigger.debug_file),
    };

    match runner.run(&options).await {
        Ok(RunOutcome::Completed(report)) => {
            info!(
                restored = report.restored,
                jobs = report.jobs,
                pruned = report.pruned,
                new_shifts = report.new_shifts.len(),
                saved = report.saved,
                "run complete"
            );
            Ok(())
        }
        Ok(RunOutcome::Failed(e)) => {
            warn!(error = %e, "run failed; subscribers notified");
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e.report())),
    }
}

/// Run on a fixed interval until Ctrl-C.
///
/// Shutdown is only observed between runs.
pub async fn run(runner: &Runner, settings: &Settings, interval: u64, no_fuzz: bool) -> Result<()> {
    info!(interval_secs = interval, no_fuzz, "starting daemon");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Handle shutdown signals
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let trigger = Trigger {
        no_fuzz,
        ..Trigger::default()
    };
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = run_once(runner, settings, trigger).await {
                    error!(error = %e, "run failed");
                }
            }
        }
    }

    info!("daemon shut down gracefully");
    Ok(())
}
