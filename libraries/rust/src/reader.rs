use std::{
    ops::Deref,
    sync::{Arc, RwLock},
};

use solana_sdk::pubkey::Pubkey;

use crate::{common::ChainClient, error::LutManagerResult, LookupTableSnapshot};

/// Fetches lookup table snapshots and remembers the last one loaded.
///
/// The memo holds a single snapshot keyed by its table address; it is not a
/// general cache. Every fetch selects its table, and a response is only
/// applied if no newer fetch was started in the meantime, so a slow read for
/// a table the user has moved away from cannot overwrite the current one.
pub struct SnapshotFetcher<A> {
    rpc: A,
    state: Arc<RwLock<FetcherState>>,
}

#[derive(Debug, Default)]
struct FetcherState {
    selected: Option<Pubkey>,
    /// Bumped by every fetch and clear
    generation: u64,
    loaded: Option<LookupTableSnapshot>,
}

impl<A: Clone> Clone for SnapshotFetcher<A> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            state: self.state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Read from the chain and now current
    Loaded(LookupTableSnapshot),
    /// Served from the memo without a network read
    Cached(LookupTableSnapshot),
    /// A newer fetch started before this one finished; nothing was applied
    Superseded,
}

impl FetchOutcome {
    pub fn into_snapshot(self) -> Option<LookupTableSnapshot> {
        match self {
            FetchOutcome::Loaded(snapshot) | FetchOutcome::Cached(snapshot) => Some(snapshot),
            FetchOutcome::Superseded => None,
        }
    }
}

impl<A> SnapshotFetcher<A> {
    pub fn new(rpc: A) -> Self {
        Self {
            rpc,
            state: Arc::new(RwLock::new(FetcherState::default())),
        }
    }

    /// The table most recently asked for
    pub fn selected(&self) -> Option<Pubkey> {
        self.state.read().unwrap().selected
    }

    /// The loaded snapshot, if it belongs to the selected table
    pub fn current(&self) -> Option<LookupTableSnapshot> {
        let state = self.state.read().unwrap();
        state
            .loaded
            .as_ref()
            .filter(|snapshot| Some(snapshot.key) == state.selected)
            .cloned()
    }

    /// Forget the selection and the memo. Responses still in flight are dropped.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap();
        state.selected = None;
        state.loaded = None;
        state.generation += 1;
    }

    /// Drop the memo if it holds `table`, so the next fetch reads the chain.
    pub fn invalidate(&self, table: &Pubkey) {
        let mut state = self.state.write().unwrap();
        if state.loaded.as_ref().map(|snapshot| &snapshot.key) == Some(table) {
            state.loaded = None;
        }
    }

    fn begin(&self, table: &Pubkey) -> u64 {
        let mut state = self.state.write().unwrap();
        state.selected = Some(*table);
        state.generation += 1;
        state.generation
    }
}

impl<A: Deref<Target = X>, X: ChainClient + ?Sized> SnapshotFetcher<A> {
    /// Fetch the snapshot of `table`, skipping the read if it is already loaded.
    pub async fn fetch(&self, table: &Pubkey) -> LutManagerResult<FetchOutcome> {
        {
            let mut state = self.state.write().unwrap();
            if let Some(snapshot) = state.loaded.as_ref().filter(|s| &s.key == table) {
                let snapshot = snapshot.clone();
                state.selected = Some(*table);
                state.generation += 1;
                return Ok(FetchOutcome::Cached(snapshot));
            }
        }
        self.read(table).await
    }

    /// Fetch the snapshot of `table` from the chain even if it is loaded.
    pub async fn refresh(&self, table: &Pubkey) -> LutManagerResult<FetchOutcome> {
        self.read(table).await
    }

    /// Fetch `table` for a one-off display. If a newer fetch supersedes this
    /// one, the table is read again without touching the selection or memo.
    pub async fn load(&self, table: &Pubkey) -> LutManagerResult<LookupTableSnapshot> {
        if let Some(snapshot) = self.fetch(table).await?.into_snapshot() {
            return Ok(snapshot);
        }
        tracing::debug!(%table, "fetch superseded, reading lookup table directly");
        self.rpc
            .get_lookup_table(table)
            .await
            .map_err(|e| e.into_lookup_error(*table))
    }

    async fn read(&self, table: &Pubkey) -> LutManagerResult<FetchOutcome> {
        let ticket = self.begin(table);
        tracing::debug!(%table, "fetching lookup table");
        let result = self.rpc.get_lookup_table(table).await;

        let mut state = self.state.write().unwrap();
        if state.generation != ticket {
            tracing::debug!(%table, "dropping superseded lookup table response");
            return Ok(FetchOutcome::Superseded);
        }
        match result {
            Ok(snapshot) => {
                tracing::debug!(%table, addresses = snapshot.len(), "loaded lookup table");
                state.loaded = Some(snapshot.clone());
                Ok(FetchOutcome::Loaded(snapshot))
            }
            Err(e) => {
                let err = e.into_lookup_error(*table);
                if err.kind() == crate::ErrorKind::NotFound {
                    state.loaded = None;
                } else {
                    // Keep the last good snapshot around
                    tracing::warn!(%table, "failed to fetch lookup table: {err}");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, test_data::addresses, test_utils::MockChain};

    #[tokio::test]
    async fn repeated_fetch_uses_memo() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], addr[1..4].to_vec());
        let fetcher = SnapshotFetcher::new(chain.clone());

        let first = fetcher.fetch(&addr[0]).await.unwrap();
        assert!(matches!(first, FetchOutcome::Loaded(_)));
        let second = fetcher.fetch(&addr[0]).await.unwrap();
        assert!(matches!(second, FetchOutcome::Cached(_)));
        assert_eq!(chain.reads(), 1);
        assert_eq!(second.into_snapshot().unwrap().addresses, addr[1..4].to_vec());
    }

    #[tokio::test]
    async fn different_or_cleared_address_reads_again() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        chain.insert_table(addr[1], vec![addr[6]]);
        let fetcher = SnapshotFetcher::new(chain.clone());

        fetcher.fetch(&addr[0]).await.unwrap();
        fetcher.fetch(&addr[1]).await.unwrap();
        assert_eq!(chain.reads(), 2);
        assert_eq!(fetcher.current().unwrap().key, addr[1]);

        fetcher.clear();
        assert!(fetcher.current().is_none());
        fetcher.fetch(&addr[1]).await.unwrap();
        assert_eq!(chain.reads(), 3);
    }

    #[tokio::test]
    async fn refresh_bypasses_memo() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        let fetcher = SnapshotFetcher::new(chain.clone());
        fetcher.fetch(&addr[0]).await.unwrap();

        chain.insert_table(addr[0], vec![addr[5], addr[6]]);
        let outcome = fetcher.refresh(&addr[0]).await.unwrap();
        assert_eq!(outcome.into_snapshot().unwrap().len(), 2);
        assert_eq!(chain.reads(), 2);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let addr = addresses();
        let chain = MockChain::new();
        let fetcher = SnapshotFetcher::new(chain.clone());
        let err = fetcher.fetch(&addr[0]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(fetcher.current().is_none());
    }

    #[tokio::test]
    async fn transport_failure_keeps_last_snapshot() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        let fetcher = SnapshotFetcher::new(chain.clone());
        fetcher.fetch(&addr[0]).await.unwrap();

        chain.fail_reads(Some("connection refused"));
        let err = fetcher.refresh(&addr[0]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(fetcher.current().unwrap().addresses, vec![addr[5]]);
    }

    #[tokio::test]
    async fn slow_response_for_previous_table_is_dropped() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        chain.insert_table(addr[1], vec![addr[6]]);
        let gate = chain.hold_reads(addr[0]);
        let fetcher = SnapshotFetcher::new(chain.clone());

        let (slow, fast) = tokio::join!(fetcher.fetch(&addr[0]), async {
            // let the read of the first table start before moving on
            while chain.reads() == 0 {
                tokio::task::yield_now().await;
            }
            let outcome = fetcher.fetch(&addr[1]).await;
            gate.notify_one();
            outcome
        });

        assert_eq!(slow.unwrap(), FetchOutcome::Superseded);
        assert!(matches!(fast.unwrap(), FetchOutcome::Loaded(_)));
        assert_eq!(fetcher.selected(), Some(addr[1]));
        assert_eq!(fetcher.current().unwrap().addresses, vec![addr[6]]);
    }

    #[tokio::test]
    async fn invalidate_forces_the_next_fetch_to_read() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        chain.insert_table(addr[1], vec![addr[6]]);
        let fetcher = SnapshotFetcher::new(chain.clone());
        fetcher.fetch(&addr[0]).await.unwrap();

        // another table's key leaves the memo alone
        fetcher.invalidate(&addr[1]);
        assert!(matches!(
            fetcher.fetch(&addr[0]).await.unwrap(),
            FetchOutcome::Cached(_)
        ));

        fetcher.invalidate(&addr[0]);
        assert!(fetcher.current().is_none());
        chain.insert_table(addr[0], vec![addr[5], addr[6]]);
        let outcome = fetcher.fetch(&addr[0]).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Loaded(_)));
        assert_eq!(outcome.into_snapshot().unwrap().len(), 2);
        assert_eq!(chain.reads(), 2);
    }

    #[tokio::test]
    async fn load_survives_being_superseded() {
        let addr = addresses();
        let chain = MockChain::new();
        chain.insert_table(addr[0], vec![addr[5]]);
        chain.insert_table(addr[1], vec![addr[6]]);
        chain.hold_reads(addr[0]);
        let fetcher = SnapshotFetcher::new(chain.clone());

        let (slow, fast) = tokio::join!(fetcher.load(&addr[0]), async {
            while chain.reads() == 0 {
                tokio::task::yield_now().await;
            }
            let outcome = fetcher.fetch(&addr[1]).await;
            chain.release_reads(&addr[0]);
            outcome
        });

        // the existing table is still reported, not treated as missing
        assert_eq!(slow.unwrap().addresses, vec![addr[5]]);
        assert!(matches!(fast.unwrap(), FetchOutcome::Loaded(_)));
        // the newer selection is untouched
        assert_eq!(fetcher.selected(), Some(addr[1]));
        assert_eq!(fetcher.current().unwrap().addresses, vec![addr[6]]);
    }

    #[tokio::test]
    async fn load_reports_missing_table() {
        let addr = addresses();
        let fetcher = SnapshotFetcher::new(MockChain::new());
        let err = fetcher.load(&addr[0]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
