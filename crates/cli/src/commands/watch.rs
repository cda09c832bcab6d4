//! Reachability watch command.

use std::time::Duration;

use cartsync_client::{
    CartConfig, HttpProbe, Reachability, ReachabilityMonitor, ReachabilityState, SystemClock,
};
use tracing::{info, warn};

use crate::CliError;

/// Poll the backend and log every reachability change.
///
/// Runs until Ctrl+C, or for `seconds` if given.
///
/// # Errors
///
/// Returns error if configuration is missing or the probe cannot be built.
pub async fn run(seconds: Option<u64>) -> Result<(), CliError> {
    let config = CartConfig::from_env()?;
    let probe = HttpProbe::from_config(&config).map_err(|e| CliError::Probe(e.to_string()))?;

    info!(url = %config.base_url, "Watching backend reachability");
    let handle = ReachabilityMonitor::start(probe, SystemClock, config.reachability_interval);
    let mut rx = handle.subscribe();

    let deadline = async {
        match seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            () = &mut deadline => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    warn!("Reachability monitor exited early");
                    break;
                }
                log_status(&rx.borrow_and_update());
            }
        }
    }

    let last = handle.current();
    handle.stop().await;
    info!(state = ?last.state, "Done");
    Ok(())
}

fn log_status(status: &Reachability) {
    let at = status
        .changed_at
        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
    match status.state {
        ReachabilityState::Online => info!("{at}  backend online"),
        ReachabilityState::Offline => warn!("{at}  backend offline"),
        ReachabilityState::Unknown => info!("{at}  backend status unknown"),
    }
}
