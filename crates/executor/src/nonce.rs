use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use swapflow_types::{Address, CapabilityError};
use tokio::sync::Mutex;
use tracing::debug;

/// Source of the chain's pending transaction count, used to seed an account
#[async_trait]
pub trait PendingNonceSource: Send + Sync {
    async fn pending_nonce(&self, account: Address) -> Result<u64, CapabilityError>;
}

/// Per-account nonce allocator.
///
/// Allocation for one account is a critical section: concurrent attempts for the same
/// account queue on that account's lock, while different accounts never contend.
/// Accounts are seeded lazily from the chain and stay tracked until [`evict`]ed.
///
/// [`evict`]: NonceRegistry::evict
pub struct NonceRegistry<P> {
    source: P,
    accounts: Mutex<HashMap<Address, Arc<Mutex<Option<u64>>>>>,
}

impl<P: PendingNonceSource> NonceRegistry<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, account: Address) -> Arc<Mutex<Option<u64>>> {
        let mut accounts = self.accounts.lock().await;
        accounts
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    pub async fn allocate(&self, account: Address) -> Result<u64, CapabilityError> {
        let slot = self.slot(account).await;
        let mut next = slot.lock().await;

        let nonce = match *next {
            Some(nonce) => nonce,
            None => {
                let pending = self.source.pending_nonce(account).await?;
                debug!(account = %account, pending, "Seeded nonce from chain");
                pending
            }
        };

        *next = Some(nonce + 1);
        Ok(nonce)
    }

    /// Give back an unused nonce. Only the most recently issued nonce can be returned;
    /// anything older already has successors in flight and would leave a gap either way.
    pub async fn release(&self, account: Address, nonce: u64) -> bool {
        let slot = self.slot(account).await;
        let mut next = slot.lock().await;

        if *next == Some(nonce + 1) {
            *next = Some(nonce);
            true
        } else {
            false
        }
    }

    /// Forget local state for `account`; the next allocation re-reads the chain
    pub async fn evict(&self, account: Address) -> bool {
        self.accounts.lock().await.remove(&account).is_some()
    }

    pub async fn tracked_accounts(&self) -> usize {
        self.accounts.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ChainState {
        pending: u64,
        queries: AtomicU64,
    }

    #[async_trait]
    impl PendingNonceSource for ChainState {
        async fn pending_nonce(&self, _account: Address) -> Result<u64, CapabilityError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.pending)
        }
    }

    fn registry(pending: u64) -> NonceRegistry<ChainState> {
        NonceRegistry::new(ChainState {
            pending,
            queries: AtomicU64::new(0),
        })
    }

    #[tokio::test]
    async fn test_allocates_sequentially_from_chain_seed() {
        let registry = registry(7);
        let account = Address::repeat_byte(1);

        assert_eq!(registry.allocate(account).await.unwrap(), 7);
        assert_eq!(registry.allocate(account).await.unwrap(), 8);
        assert_eq!(registry.allocate(account).await.unwrap(), 9);
        assert_eq!(registry.source.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accounts_are_independent() {
        let registry = registry(0);
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);

        assert_eq!(registry.allocate(alice).await.unwrap(), 0);
        assert_eq!(registry.allocate(alice).await.unwrap(), 1);
        assert_eq!(registry.allocate(bob).await.unwrap(), 0);
        assert_eq!(registry.tracked_accounts().await, 2);
    }

    #[tokio::test]
    async fn test_release_only_rewinds_latest() {
        let registry = registry(0);
        let account = Address::repeat_byte(1);

        let first = registry.allocate(account).await.unwrap();
        let second = registry.allocate(account).await.unwrap();

        assert!(!registry.release(account, first).await);
        assert!(registry.release(account, second).await);
        assert_eq!(registry.allocate(account).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_evict_reseeds_from_chain() {
        let registry = registry(3);
        let account = Address::repeat_byte(1);

        registry.allocate(account).await.unwrap();
        registry.allocate(account).await.unwrap();
        assert!(registry.evict(account).await);
        assert!(!registry.evict(account).await);

        assert_eq!(registry.allocate(account).await.unwrap(), 3);
        assert_eq!(registry.source.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_never_repeat() {
        let registry = Arc::new(registry(100));
        let account = Address::repeat_byte(9);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.allocate(account).await.unwrap() })
            })
            .collect();

        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap());
        }
        nonces.sort_unstable();

        assert_eq!(nonces, (100..132).collect::<Vec<_>>());
    }
}
