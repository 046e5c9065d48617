mod connection;
mod ledger;

pub use connection::SqliteStorage;
pub use ledger::SqliteLedger;
