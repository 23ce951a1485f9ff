//! Periodic sweep over the entry store.
//!
//! Runs as a `tokio::spawn`ed task emitting `DueNotification`s through an mpsc
//! channel. The Telegram layer receives them and sends the messages.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::matcher::{match_entry, DueNotification, MatchPolicy};
use crate::core::error::AppResult;
use crate::storage::EntryStore;

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub due: usize,
    pub delivered: usize,
    pub failures: usize,
}

/// Evaluate every stored entry without touching delivery markers.
///
/// Rows that fail to decode are logged and counted in `failures`.
pub fn collect_due(store: &EntryStore, policy: MatchPolicy, now: NaiveDateTime) -> AppResult<(Vec<DueNotification>, SweepReport)> {
    let mut report = SweepReport::default();
    let mut due = Vec::new();

    for scanned in store.scan()? {
        report.scanned += 1;
        match scanned {
            Ok(entry) => {
                if let Some(notification) = match_entry(&entry, policy, now) {
                    due.push(notification);
                }
            }
            Err(e) => {
                log::warn!("Sweep skipped entry: {}", e);
                report.failures += 1;
            }
        }
    }

    report.due = due.len();
    Ok((due, report))
}

/// Run one sweep: mark each due entry delivered, then hand it to `tx`.
///
/// The marker is written first, so an entry is emitted at most once even
/// if the process dies between the two steps. If the hand-off fails the
/// marker is cleared again and the entry is retried on the next sweep.
pub fn run_sweep(
    store: &EntryStore,
    policy: MatchPolicy,
    now: NaiveDateTime,
    tx: &mpsc::UnboundedSender<DueNotification>,
) -> AppResult<SweepReport> {
    let (due, mut report) = collect_due(store, policy, now)?;

    for notification in due {
        let id = notification.entry.id;
        match store.mark_delivered(id, now) {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("Entry {} was delivered or deleted concurrently", id);
                continue;
            }
            Err(e) => {
                log::error!("Failed to mark entry {} delivered: {}", id, e);
                report.failures += 1;
                continue;
            }
        }

        if tx.send(notification).is_err() {
            log::warn!("Notification channel closed, stopping sweep");
            release(store, id);
            report.failures += 1;
            break;
        }
        report.delivered += 1;
    }

    if report.due > 0 || report.failures > 0 {
        log::info!(
            "Sweep: {} scanned, {} due, {} delivered, {} failed",
            report.scanned,
            report.due,
            report.delivered,
            report.failures
        );
    }

    Ok(report)
}

/// Clear the delivery marker of an entry that was not handed off.
fn release(store: &EntryStore, id: i64) {
    if let Err(e) = store.clear_delivered(id) {
        log::error!("Failed to clear delivery marker of entry {}: {}", id, e);
    }
}

/// Start the sweep background task.
///
/// Returns a receiver for `DueNotification`s that should be consumed by the
/// Telegram notification dispatcher.
pub fn start_scheduler(
    store: EntryStore,
    policy: MatchPolicy,
    every: Duration,
) -> mpsc::UnboundedReceiver<DueNotification> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Sweep scheduler started (interval: {}s, birthday policy: {})",
            every.as_secs(),
            policy
        );

        loop {
            ticker.tick().await;

            let now = chrono::Local::now().naive_local();
            if let Err(e) = run_sweep(&store, policy, now, &tx) {
                log::error!("Sweep failed: {}", e);
            }

            if tx.is_closed() {
                log::warn!("Notification receiver dropped, scheduler exiting");
                break;
            }
        }
    });

    rx
}
