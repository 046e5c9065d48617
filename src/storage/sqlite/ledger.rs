use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::info;

use crate::errors::DigestResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::{Ledger, LedgerStats, SentRecord};

pub struct SqliteLedger {
    storage: SqliteStorage,
}

impl SqliteLedger {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl Ledger for SqliteLedger {
    fn contains(&self, canonical_url: &str) -> DigestResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT EXISTS(SELECT 1 FROM sent_articles WHERE canonical_url = ?1)")?;
        let exists: bool = stmt.query_row([canonical_url], |row| row.get(0))?;
        Ok(exists)
    }

    fn snapshot_all(&self) -> DigestResult<HashSet<String>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT canonical_url FROM sent_articles")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    fn record_batch(&self, items: &[SentRecord]) -> DigestResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let conn = self.storage.connection()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO sent_articles (canonical_url, title, source_name) \
                 VALUES (?1, ?2, ?3)",
            )?;
            for item in items {
                if item.canonical_url.is_empty() {
                    continue;
                }
                stmt.execute((&item.canonical_url, &item.title, &item.source_name))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn already_ran_successfully(&self, date: NaiveDate) -> DigestResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM run_history WHERE run_date = ?1 AND status = 'success')",
        )?;
        let exists: bool = stmt.query_row([date.to_string()], |row| row.get(0))?;
        Ok(exists)
    }

    fn record_success(&self, date: NaiveDate, item_count: usize) -> DigestResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO run_history (run_date, articles_count, status) VALUES (?1, ?2, 'success')",
            (date.to_string(), item_count as i64),
        )?;
        info!(date = %date, items = item_count, "recorded successful run");
        Ok(())
    }

    fn record_failure(&self, date: NaiveDate, message: &str) -> DigestResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO run_history (run_date, status, error_message) VALUES (?1, 'failed', ?2)",
            (date.to_string(), message),
        )?;
        Ok(())
    }

    fn last_successful_run(&self) -> DigestResult<Option<String>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT run_timestamp FROM run_history WHERE status = 'success' \
             ORDER BY run_timestamp DESC LIMIT 1",
        )?;
        let result = stmt.query_row([], |row| row.get::<_, String>(0));
        match result {
            Ok(ts) => Ok(Some(ts)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn prune(&self, retention_days: u32) -> DigestResult<usize> {
        let conn = self.storage.connection()?;
        let deleted = conn.execute(
            "DELETE FROM sent_articles WHERE sent_at < datetime('now', ?1)",
            [format!("-{} days", retention_days)],
        )?;
        if deleted > 0 {
            info!(deleted, "pruned old sent-article records");
        }
        Ok(deleted)
    }

    fn stats(&self) -> DigestResult<LedgerStats> {
        let conn = self.storage.connection()?;
        let total_articles_sent: i64 =
            conn.query_row("SELECT COUNT(*) FROM sent_articles", [], |row| row.get(0))?;
        let successful_runs: i64 = conn.query_row(
            "SELECT COUNT(*) FROM run_history WHERE status = 'success'",
            [],
            |row| row.get(0),
        )?;
        let failed_runs: i64 = conn.query_row(
            "SELECT COUNT(*) FROM run_history WHERE status = 'failed'",
            [],
            |row| row.get(0),
        )?;

        Ok(LedgerStats {
            total_articles_sent,
            successful_runs,
            failed_runs,
        })
    }
}
