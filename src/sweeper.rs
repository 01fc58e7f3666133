//! Liveness sweeper
//!
//! Walks the neighbor table on a fixed cadence and evicts every peer that
//! has gone quiet for longer than the liveness timeout. Purely a consumer of
//! the table; nothing else depends on its timing beyond eventual consistency
//! of the neighbor view.
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

use crate::clock;
use crate::error::Result;
use crate::neighbors::NeighborTable;

pub struct LivenessSweeper {
    table: NeighborTable,
    period: Duration,
    timeout: Duration,
}

impl LivenessSweeper {
    pub fn new(table: NeighborTable, period: Duration, timeout: Duration) -> Self {
        Self {
            table,
            period,
            timeout,
        }
    }

    /// Sweep until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let timeout_micros = i64::try_from(self.timeout.as_micros()).unwrap_or(i64::MAX);
        let mut ticker = interval(self.period);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("sweeper loop stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let horizon = clock::unix_micros() - timeout_micros;
                    for peer_id in self.table.sweep(horizon) {
                        info!(%peer_id, reason = "timeout", "evicted stale neighbor");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_sweeper_evicts_only_stale_entries() {
        let table = NeighborTable::new(9);
        let now = clock::unix_micros();
        let stale: crate::peer_id::PeerId = "00000bad".parse().unwrap();
        let fresh: crate::peer_id::PeerId = "00000ace".parse().unwrap();

        table.upsert(stale.clone(), 0, now - 2_000_000, "127.0.0.1:1".parse().unwrap());
        table.upsert(fresh.clone(), 0, now, "127.0.0.1:2".parse().unwrap());

        let sweeper = LivenessSweeper::new(
            table.clone(),
            Duration::from_millis(10),
            Duration::from_millis(500),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(sweeper.run(shutdown_rx));

        timeout(Duration::from_secs(2), async {
            while table.get(&stale).is_some() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stale entry should be evicted");
        assert!(table.get(&fresh).is_some(), "fresh entry must survive");

        shutdown_tx.send(true).unwrap();
        let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
