use log::error;

use crate::config::Service;
use crate::probe::{PingResult, Prober};

/// Probes every configured service concurrently and collects exactly one
/// result per service, in configured order.
///
/// Each probe runs in its own task; a probe that fails (or panics) only
/// degrades its own entry to a timed-out result and never aborts the batch.
pub async fn check_fleet(prober: &Prober, services: &[Service]) -> Vec<PingResult> {
    let mut handles = Vec::with_capacity(services.len());
    for service in services {
        let prober = prober.clone();
        let service = service.clone();
        handles.push(tokio::spawn(async move { prober.ping(&service).await }));
    }

    // Awaiting in spawn order keeps the report deterministic even though the
    // probes themselves race
    let mut results = Vec::with_capacity(services.len());
    for (handle, service) in handles.into_iter().zip(services) {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!("Probe task for {} failed: {e}", service.name);
                results.push(PingResult::timed_out(service.name.clone()));
            }
        }
    }
    results
}
