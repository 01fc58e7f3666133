//! Neighbor table
//!
//! The sole piece of shared mutable state in the daemon: one entry per peer
//! this node currently considers live, keyed by peer id. Every loop mutates
//! it (the listener refreshes liveness, exchange tasks record offsets or
//! evict unreachable peers, the sweeper drops stale entries), so all access
//! goes through a single lock around the whole map.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::peer_id::PeerId;

/// State tracked for one discovered peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborEntry {
    /// Estimated clock offset of the peer in microseconds
    /// (peer clock − local clock). Not RTT-compensated.
    pub delay: i64,

    /// Unix microseconds of the most recent exchange or confirmed-live beacon.
    pub last_seen: i64,

    /// Beacons received since the last full clock exchange.
    pub refresh_count: u8,

    /// Advertised clock-exchange endpoint for future exchanges.
    pub address: SocketAddr,
}

/// What to do with a beacon that was just received from a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeaconDisposition {
    /// Unknown peer, or its refresh window is exhausted: run a full exchange.
    Resync,

    /// Known peer inside the window: liveness was refreshed in place.
    Refreshed,
}

/// Concurrent map of peer id → neighbor state.
///
/// Cloning is cheap and shares the underlying map. All mutating operations
/// are atomic with respect to each other; `last_seen` never regresses for a
/// given entry.
#[derive(Clone, Debug)]
pub struct NeighborTable {
    inner: Arc<RwLock<HashMap<PeerId, NeighborEntry>>>,
    refresh_limit: u8,
}

impl NeighborTable {
    /// `refresh_limit` is the highest refresh count an entry may carry; a
    /// beacon that would push past it triggers a resync instead.
    pub fn new(refresh_limit: u8) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            refresh_limit,
        }
    }

    /// Record the outcome of a successful clock exchange.
    ///
    /// Replaces any existing entry. A re-measured peer starts a fresh refresh
    /// window at 0; a first contact is marked with 1.
    pub fn upsert(&self, peer_id: PeerId, delay: i64, last_seen: i64, address: SocketAddr) {
        let mut map = self.inner.write();
        match map.entry(peer_id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.delay = delay;
                entry.last_seen = entry.last_seen.max(last_seen);
                entry.refresh_count = 0;
                entry.address = address;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(NeighborEntry {
                    delay,
                    last_seen,
                    refresh_count: 1,
                    address,
                });
            }
        }
    }

    /// Cheap liveness refresh: bump `last_seen` and the refresh count
    /// (saturating at the limit). Returns false if the peer is unknown;
    /// callers must not assume success.
    pub fn touch(&self, peer_id: &PeerId, last_seen: i64) -> bool {
        let mut map = self.inner.write();
        match map.get_mut(peer_id) {
            Some(entry) => {
                entry.refresh_count = entry
                    .refresh_count
                    .saturating_add(1)
                    .min(self.refresh_limit);
                entry.last_seen = entry.last_seen.max(last_seen);
                true
            }
            None => false,
        }
    }

    /// Decide, atomically, how to handle a beacon from `peer_id`: refresh the
    /// entry in place while its refresh window lasts, otherwise ask the
    /// caller for a full exchange.
    pub fn observe_beacon(&self, peer_id: &PeerId, last_seen: i64) -> BeaconDisposition {
        let mut map = self.inner.write();
        match map.get_mut(peer_id) {
            Some(entry) if entry.refresh_count < self.refresh_limit => {
                entry.refresh_count += 1;
                entry.last_seen = entry.last_seen.max(last_seen);
                BeaconDisposition::Refreshed
            }
            _ => BeaconDisposition::Resync,
        }
    }

    /// Remove a peer. Idempotent: racing evictions of the same peer are fine.
    pub fn remove(&self, peer_id: &PeerId) -> Option<NeighborEntry> {
        self.inner.write().remove(peer_id)
    }

    /// Drop every entry last seen before `min_last_seen`; returns the evicted
    /// peer ids for logging.
    pub fn sweep(&self, min_last_seen: i64) -> Vec<PeerId> {
        let mut map = self.inner.write();
        let stale: Vec<PeerId> = map
            .iter()
            .filter(|(_, entry)| entry.last_seen < min_last_seen)
            .map(|(peer_id, _)| peer_id.clone())
            .collect();
        for peer_id in &stale {
            map.remove(peer_id);
        }
        stale
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<NeighborEntry> {
        self.inner.read().get(peer_id).cloned()
    }

    /// Point-in-time copy for iteration without holding the table lock.
    pub fn snapshot(&self) -> HashMap<PeerId, NeighborEntry> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(raw: &str) -> PeerId {
        raw.parse().unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_first_contact_starts_window_at_one() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 500, 1_000, addr(9000));

        let entry = table.get(&peer("deadbeef")).unwrap();
        assert_eq!(entry.refresh_count, 1);
        assert_eq!(entry.delay, 500);
        assert_eq!(entry.last_seen, 1_000);
        assert_eq!(entry.address, addr(9000));
    }

    #[test]
    fn test_resync_resets_window_and_replaces_measurement() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 500, 1_000, addr(9000));
        table.touch(&peer("deadbeef"), 2_000);

        table.upsert(peer("deadbeef"), -250, 3_000, addr(9001));
        let entry = table.get(&peer("deadbeef")).unwrap();
        assert_eq!(entry.refresh_count, 0);
        assert_eq!(entry.delay, -250);
        assert_eq!(entry.last_seen, 3_000);
        assert_eq!(entry.address, addr(9001));
        assert_eq!(table.len(), 1, "upsert must never duplicate a key");
    }

    #[test]
    fn test_touch_unknown_peer_is_a_noop() {
        let table = NeighborTable::new(9);
        assert!(!table.touch(&peer("deadbeef"), 1_000));
        assert!(table.is_empty());
    }

    #[test]
    fn test_touch_saturates_at_limit() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 0, 1_000, addr(9000));
        for ts in 0..20 {
            table.touch(&peer("deadbeef"), 1_000 + ts);
        }
        assert_eq!(table.get(&peer("deadbeef")).unwrap().refresh_count, 9);
    }

    #[test]
    fn test_last_seen_never_regresses() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 0, 5_000, addr(9000));

        table.touch(&peer("deadbeef"), 4_000);
        assert_eq!(table.get(&peer("deadbeef")).unwrap().last_seen, 5_000);

        table.upsert(peer("deadbeef"), 0, 3_000, addr(9000));
        assert_eq!(table.get(&peer("deadbeef")).unwrap().last_seen, 5_000);

        table.touch(&peer("deadbeef"), 6_000);
        assert_eq!(table.get(&peer("deadbeef")).unwrap().last_seen, 6_000);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 0, 1_000, addr(9000));

        assert!(table.remove(&peer("deadbeef")).is_some());
        assert!(table.remove(&peer("deadbeef")).is_none());
        assert!(table.remove(&peer("0badcafe")).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_resync_cadence_wraps_after_window_exhausted() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 0, 0, addr(9000));
        // Resync just happened; window restarts at 0.
        table.upsert(peer("deadbeef"), 0, 0, addr(9000));
        assert_eq!(table.get(&peer("deadbeef")).unwrap().refresh_count, 0);

        // Nine beacons refresh in place, counting 1..=9.
        for i in 1..=9 {
            assert_eq!(
                table.observe_beacon(&peer("deadbeef"), i),
                BeaconDisposition::Refreshed
            );
            assert_eq!(table.get(&peer("deadbeef")).unwrap().refresh_count, i as u8);
        }

        // The tenth must force a full exchange, not saturate silently.
        assert_eq!(
            table.observe_beacon(&peer("deadbeef"), 10),
            BeaconDisposition::Resync
        );
    }

    #[test]
    fn test_unknown_peer_beacon_requests_resync() {
        let table = NeighborTable::new(9);
        assert_eq!(
            table.observe_beacon(&peer("deadbeef"), 1_000),
            BeaconDisposition::Resync
        );
        assert!(table.is_empty(), "deciding must not create an entry");
    }

    #[test]
    fn test_sweep_horizon_boundaries() {
        let table = NeighborTable::new(9);
        let now = 1_000_000;
        let timeout = 10_000;

        table.upsert(peer("00000001"), 0, now - timeout - 1, addr(9001));
        table.upsert(peer("00000002"), 0, now - timeout + 1, addr(9002));
        table.upsert(peer("00000003"), 0, now, addr(9003));

        let evicted = table.sweep(now - timeout);
        assert_eq!(evicted, vec![peer("00000001")]);
        assert!(table.get(&peer("00000001")).is_none());
        assert!(table.get(&peer("00000002")).is_some());
        assert!(table.get(&peer("00000003")).is_some());

        // Nothing left to evict: sweep again, same horizon.
        assert!(table.sweep(now - timeout).is_empty());
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let table = NeighborTable::new(9);
        table.upsert(peer("deadbeef"), 0, 1_000, addr(9000));

        let snapshot = table.snapshot();
        table.remove(&peer("deadbeef"));

        assert_eq!(snapshot.len(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_concurrent_mutation_keeps_invariants() {
        use rand::Rng;
        use std::thread;

        let table = NeighborTable::new(9);
        let ids: Vec<PeerId> = (0..8).map(|i| peer(&format!("{:08x}", i))).collect();

        let mut handles = Vec::new();
        for worker in 0..8i64 {
            let table = table.clone();
            let ids = ids.clone();
            handles.push(thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for round in 0..500i64 {
                    let id = &ids[rng.gen_range(0..ids.len())];
                    match rng.gen_range(0..4) {
                        0 => table.upsert(id.clone(), worker, round, addr(9000)),
                        1 => {
                            table.touch(id, round);
                        }
                        2 => {
                            table.remove(id);
                        }
                        _ => {
                            table.sweep(round - 100);
                        }
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for entry in table.snapshot().values() {
            assert!(entry.refresh_count <= 9);
        }
    }
}
