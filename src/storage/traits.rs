use std::collections::HashSet;

use chrono::NaiveDate;

use crate::errors::DigestResult;

/// Minimal metadata persisted for a surfaced item.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub canonical_url: String,
    pub title: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerStats {
    pub total_articles_sent: i64,
    pub successful_runs: i64,
    pub failed_runs: i64,
}

/// Durable dedup store and run history.
///
/// All mutating operations are single transactions; the store assumes one
/// writer per process invocation.
#[cfg_attr(test, mockall::automock)]
pub trait Ledger: Send + Sync {
    /// True iff a record with this canonical URL exists.
    fn contains(&self, canonical_url: &str) -> DigestResult<bool>;

    /// Full set of recorded canonical URLs, fetched once per run to seed
    /// the selector's filter.
    fn snapshot_all(&self) -> DigestResult<HashSet<String>>;

    /// Idempotent bulk insert; re-inserting a present URL is a silent no-op.
    fn record_batch(&self, items: &[SentRecord]) -> DigestResult<()>;

    /// True iff at least one run for `date` recorded status `success`.
    fn already_ran_successfully(&self, date: NaiveDate) -> DigestResult<bool>;

    fn record_success(&self, date: NaiveDate, item_count: usize) -> DigestResult<()>;

    fn record_failure(&self, date: NaiveDate, message: &str) -> DigestResult<()>;

    /// Timestamp of the most recent successful run, if any.
    fn last_successful_run(&self) -> DigestResult<Option<String>>;

    /// Delete sent records older than the retention horizon. Run history is
    /// never pruned. Returns the number of rows deleted.
    fn prune(&self, retention_days: u32) -> DigestResult<usize>;

    fn stats(&self) -> DigestResult<LedgerStats>;
}
