pub mod sqlite;
pub mod traits;
pub mod ttl_cache;

pub use sqlite::{SqliteLedger, SqliteStorage};
pub use traits::{Ledger, LedgerStats, SentRecord};
pub use ttl_cache::TtlCache;
