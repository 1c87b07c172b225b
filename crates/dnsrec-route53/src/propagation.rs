//! Propagation wait
//!
//! After a change batch is accepted Route 53 reports it as PENDING until all
//! authoritative servers serve it, then INSYNC. Waiting is best-effort: the
//! wait is bounded, and running out of time is reported, never failed.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dnsrec_core::config::PropagationConfig;
use dnsrec_core::{AdapterEvent, Error, EventSink, Result, cancel};

use crate::api::{ChangeInfo, ChangeStatus, Route53Api, lookup_error};

/// Outcome of a propagation wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The change reached INSYNC
    Confirmed { waited: Duration },
    /// The wait ended first
    Unconfirmed { waited: Duration },
}

impl Propagation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Propagation::Confirmed { .. })
    }
}

/// Poll `change` until INSYNC or until the configured maximum wait elapses
///
/// Only cancellation is an error. A failing status poll ends the wait as
/// unconfirmed.
pub async fn wait_for_change(
    client: &dyn Route53Api,
    cancel: &CancellationToken,
    config: &PropagationConfig,
    events: &EventSink,
    change: &ChangeInfo,
) -> Result<Propagation> {
    let started = Instant::now();
    let deadline = started + config.max_wait();
    let mut status = change.status;

    let outcome = loop {
        if status == ChangeStatus::InSync {
            break Propagation::Confirmed {
                waited: started.elapsed(),
            };
        }

        let now = Instant::now();
        if now >= deadline {
            break Propagation::Unconfirmed {
                waited: started.elapsed(),
            };
        }
        cancel::sleep(cancel, config.poll_interval().min(deadline - now)).await?;

        let polled = cancel::cancellable(cancel, async {
            client.get_change(&change.id).await.map_err(lookup_error)
        })
        .await;

        match polled {
            Ok(info) => {
                debug!(change_id = %change.id, status = ?info.status, "polled change status");
                status = info.status;
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                warn!(change_id = %change.id, error = %err, "change status poll failed");
                break Propagation::Unconfirmed {
                    waited: started.elapsed(),
                };
            }
        }
    };

    match outcome {
        Propagation::Confirmed { waited } => {
            debug!(change_id = %change.id, waited_ms = waited.as_millis() as u64, "change in sync");
            events.emit(AdapterEvent::PropagationConfirmed {
                change_id: change.id.clone(),
                waited,
            });
        }
        Propagation::Unconfirmed { waited } => {
            warn!(
                change_id = %change.id,
                waited_ms = waited.as_millis() as u64,
                "propagation not confirmed, continuing"
            );
            events.emit(AdapterEvent::PropagationUnconfirmed {
                change_id: change.id.clone(),
                waited,
            });
        }
    }
    Ok(outcome)
}
