use std::time::Duration;

use tracing::{debug, info, warn};

static PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawns the self-ping loop that keeps the hosting platform from idling
/// the service out. Runs until the process exits and never touches the
/// request path.
pub fn spawn(url: String, interval_secs: u64) {
    info!("Keep-alive ping every {}s to {}", interval_secs, url);
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // the first tick completes immediately, the first ping should not
        interval.tick().await;
        loop {
            interval.tick().await;
            match client.get(&url).timeout(PING_TIMEOUT).send().await {
                Ok(resp) => debug!("Keep-alive ping answered {}", resp.status()),
                Err(e) => warn!("Keep-alive ping failed: {}", e),
            }
        }
    });
}
