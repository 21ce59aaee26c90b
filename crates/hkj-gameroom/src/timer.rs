use super::command::Command;
use super::command::Tick;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Scheduled messages into the room mailbox.
///
/// Nothing sleeps while holding the room; a timer is a spawned task that
/// waits out its delay and then re-enters the serialized queue. Cancellation
/// is by invalidation: every schedule carries the current stamp, and the
/// room bumps the stamp whenever the state a timer referenced no longer
/// applies, so stale ticks are dropped on receipt.
#[derive(Debug)]
pub struct Timers {
    tx: UnboundedSender<Command>,
    stamp: u64,
}

impl Timers {
    pub fn new(tx: UnboundedSender<Command>) -> Self {
        Self { tx, stamp: 0 }
    }
    /// Invalidates every outstanding scheduled tick.
    pub fn invalidate(&mut self) {
        self.stamp += 1;
    }
    /// Whether a tick stamped at schedule time is still current.
    pub fn accepts(&self, stamp: u64) -> bool {
        self.stamp == stamp
    }
    /// Arranges for `tick` to enter the mailbox after `delay`.
    pub fn schedule(&self, delay: Duration, tick: Tick) {
        let tx = self.tx.clone();
        let stamp = self.stamp;
        log::debug!("[timer] scheduling {:?} in {:?}", tick, delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Command::Tick { stamp, tick });
        });
    }
}
