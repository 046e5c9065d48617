use std::time::Duration;

use reqwest::blocking::Client;

/// Timeout for primary fetches (feeds, APIs, scrape targets).
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Short timeout for best-effort fetches like the og:image page load.
pub const BEST_EFFORT_TIMEOUT: Duration = Duration::from_secs(5);

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; digester-bot/0.1)";

/// Build a blocking client with the shared user agent and the given timeout.
pub fn client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub fn primary_client() -> Client {
    client(PRIMARY_TIMEOUT)
}

pub fn best_effort_client() -> Client {
    client(BEST_EFFORT_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_build() {
        // Builder settings must not panic
        let _ = primary_client();
        let _ = best_effort_client();
    }
}
