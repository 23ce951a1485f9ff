//! Due-entry matching and the periodic sweep.

pub mod matcher;
pub mod sweep;

pub use matcher::{days_until, match_entry, DueNotification, MatchPolicy};
pub use sweep::{collect_due, run_sweep, start_scheduler, SweepReport};
