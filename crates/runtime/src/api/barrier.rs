//! Presentation barrier between the phases of a move.
//!
//! After each completed phase the session worker awaits
//! [`SettleBarrier::settled`] before running the next one. A renderer uses
//! this to finish its animation first; headless runs use
//! [`ImmediateBarrier`]. Input that arrives while a barrier is pending is
//! ignored by the battle.
use async_trait::async_trait;
use match_core::PhaseReport;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

#[async_trait]
pub trait SettleBarrier: Send + Sync {
    /// Resolves once the presentation has caught up with `report`.
    async fn settled(&self, report: &PhaseReport);
}

/// Never waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateBarrier;

#[async_trait]
impl SettleBarrier for ImmediateBarrier {
    async fn settled(&self, _report: &PhaseReport) {}
}

/// A phase waiting to be acknowledged.
///
/// Dropping it without calling [`SettleAck::ack`] also releases the worker.
#[derive(Debug)]
pub struct SettleAck {
    report: PhaseReport,
    done: oneshot::Sender<()>,
}

impl SettleAck {
    pub fn report(&self) -> &PhaseReport {
        &self.report
    }

    pub fn ack(self) {
        let _ = self.done.send(());
    }
}

/// Hands each phase to a listener and waits for its acknowledgement.
#[derive(Clone, Debug)]
pub struct AckBarrier {
    tx: mpsc::Sender<SettleAck>,
}

impl AckBarrier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SettleAck>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SettleBarrier for AckBarrier {
    async fn settled(&self, report: &PhaseReport) {
        let (done, wait) = oneshot::channel();
        let ack = SettleAck {
            report: *report,
            done,
        };
        if self.tx.send(ack).await.is_err() {
            warn!(phase = %report.phase, "settle listener gone, continuing");
            return;
        }
        if wait.await.is_err() {
            tracing::debug!(phase = %report.phase, "settle ack dropped");
        }
    }
}
