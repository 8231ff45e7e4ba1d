//! Host service around the ledger core.
//!
//! `LedgerNode` owns the persistence backend and serializes every
//! load -> mutate -> save cycle per identity, so `mine` and `submit` are
//! atomic with respect to one ledger's chain and pending pool. Peer ledgers
//! are read without taking their locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::blockchain::{Block, Ledger, LedgerSnapshot};
use crate::consensus::{self, StoreLookup};
use crate::error::LedgerError;
use crate::guard::{load_or_create, Identity};
use crate::persistence::{InMemoryPersistence, Persistence};
use crate::pow::ProofOfWork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Ng,
}

/// Outcome of a mining attempt as shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineReceipt {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

pub struct LedgerNode {
    persistence: Arc<dyn Persistence>,
    pow: ProofOfWork,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LedgerNode {
    pub fn new(persistence: Arc<dyn Persistence>, pow: ProofOfWork) -> Self {
        Self {
            persistence,
            pow,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Node backed by [`InMemoryPersistence`] at the default difficulty.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPersistence::new()), ProofOfWork::default())
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    fn lock_for(&self, identity: &Identity) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(identity.as_str().to_string())
            .or_default()
            .clone()
    }

    /// Drop the identity's lock entry once no other caller holds or waits
    /// on it.
    fn release_lock(&self, identity: &Identity, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        // One reference is ours, one is the map's.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(identity.as_str());
        }
    }

    /// Run `f` on the caller's ledger while holding its lock. The ledger is
    /// saved afterwards when `f` reports a change.
    fn with_ledger<T, F>(&self, identity: &Identity, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Ledger) -> (T, bool),
    {
        let lock = self.lock_for(identity);
        let result = {
            let _guard = lock.lock();
            load_or_create(self.persistence.as_ref(), identity).and_then(|mut ledger| {
                let (value, changed) = f(&mut ledger);
                if changed {
                    self.persistence.save_ledger(&ledger)?;
                }
                Ok(value)
            })
        };
        self.release_lock(identity, lock);
        result
    }

    /// Check `proof` against the tip and, if it holds, mint the reward and
    /// seal the pending pool into a new block.
    ///
    /// Stale or failing proofs are reported through the receipt; only
    /// storage failures become errors.
    pub fn mine(&self, identity: &Identity, last_proof: &str, proof: &str) -> Result<MineReceipt, LedgerError> {
        let pow = self.pow;
        self.with_ledger(identity, |ledger| match ledger.mine(&pow, last_proof, proof) {
            Ok(block) => (
                MineReceipt {
                    status: Status::Ok,
                    message: "You mined 1 coin.".to_string(),
                    block: Some(block.clone()),
                },
                true,
            ),
            Err(LedgerError::StaleProof { .. }) => (
                MineReceipt {
                    status: Status::Ng,
                    message: "Last proof does not match.".to_string(),
                    block: None,
                },
                false,
            ),
            Err(e) => (
                MineReceipt {
                    status: Status::Ng,
                    message: if e == LedgerError::InvalidProof {
                        "Challenge failed.".to_string()
                    } else {
                        e.to_string()
                    },
                    block: None,
                },
                false,
            ),
        })
    }

    /// Queue a transfer from the caller and return the index of the block
    /// it will land in.
    pub fn submit_transaction(&self, identity: &Identity, recipient: &str, amount: i64) -> Result<u64, LedgerError> {
        self.with_ledger(identity, |ledger| {
            let index = ledger.submit(identity.as_str(), recipient, amount);
            (index, true)
        })
    }

    /// Returns whether the peer was new to this ledger.
    pub fn add_peer(&self, identity: &Identity, peer: &str) -> Result<bool, LedgerError> {
        let added = self.with_ledger(identity, |ledger| {
            let added = ledger.add_peer(peer);
            (added, added)
        })?;
        if added {
            info!("Ledger {} added peer {}", identity, peer);
        }
        Ok(added)
    }

    /// Adopt the longest valid chain among the caller's peers.
    pub fn resolve(&self, identity: &Identity) -> Result<bool, LedgerError> {
        let pow = self.pow;
        let lookup = StoreLookup(self.persistence.as_ref());
        self.with_ledger(identity, |ledger| {
            let replaced = consensus::resolve(ledger, &pow, &lookup);
            (replaced, replaced)
        })
    }

    pub fn snapshot(&self, identity: &Identity) -> Result<LedgerSnapshot, LedgerError> {
        self.with_ledger(identity, |ledger| (ledger.snapshot(), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn test_snapshot_creates_ledger_lazily() {
        let node = LedgerNode::in_memory();
        let snapshot = node.snapshot(&id("A")).unwrap();
        assert_eq!(snapshot.chain.len(), 1);
        assert_eq!(snapshot.balance, 0);
        assert!(node.persistence().load_ledger("A").unwrap().is_some());
    }

    #[test]
    fn test_mine_receipts() {
        let node = LedgerNode::in_memory();
        let a = id("A");

        let stale = node.mine(&a, "nope", "76234").unwrap();
        assert_eq!(stale.status, Status::Ng);
        assert_eq!(stale.message, "Last proof does not match.");

        let failed = node.mine(&a, "A", "0").unwrap();
        assert_eq!(failed.status, Status::Ng);
        assert_eq!(failed.message, "Challenge failed.");

        let mined = node.mine(&a, "A", "76234").unwrap();
        assert_eq!(mined.status, Status::Ok);
        assert_eq!(mined.message, "You mined 1 coin.");
        assert_eq!(mined.block.unwrap().index, 2);

        assert_eq!(node.snapshot(&a).unwrap().balance, 1);
    }

    #[test]
    fn test_submit_is_persisted() {
        let node = LedgerNode::in_memory();
        let a = id("A");
        assert_eq!(node.submit_transaction(&a, "B", 10).unwrap(), 2);

        let stored = node.persistence().load_ledger("A").unwrap().unwrap();
        assert_eq!(stored.pending().len(), 1);
        assert_eq!(stored.pending()[0].sender, "A");
    }

    #[test]
    fn test_add_peer_twice() {
        let node = LedgerNode::in_memory();
        let a = id("A");
        assert!(node.add_peer(&a, "B").unwrap());
        assert!(!node.add_peer(&a, "B").unwrap());
        assert_eq!(node.snapshot(&a).unwrap().peers, vec!["B".to_string()]);
    }

    #[test]
    fn test_resolve_adopts_peer_chain() {
        let node = LedgerNode::in_memory();
        let (a, b) = (id("A"), id("B"));

        node.snapshot(&b).unwrap();
        let b_proof = ProofOfWork::default().search("B").unwrap();
        assert_eq!(node.mine(&b, "B", &b_proof).unwrap().status, Status::Ok);

        node.add_peer(&a, "B").unwrap();
        node.add_peer(&a, "ghost").unwrap();
        assert!(node.resolve(&a).unwrap());

        let snapshot = node.snapshot(&a).unwrap();
        assert_eq!(snapshot.chain.len(), 2);
        assert_eq!(snapshot.chain[1].block.proof, b_proof);
        // The reward in the adopted chain belongs to B.
        assert_eq!(snapshot.balance, 0);

        assert!(!node.resolve(&a).unwrap());
    }

    #[test]
    fn test_concurrent_submits_are_serialized() {
        let node = Arc::new(LedgerNode::in_memory());
        let a = id("A");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let node = node.clone();
                let a = a.clone();
                std::thread::spawn(move || node.submit_transaction(&a, "B", i).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(node.snapshot(&a).unwrap().pending.len(), 8);
        assert!(node.locks.lock().is_empty());
    }

    #[test]
    fn test_idle_locks_are_released() {
        let node = LedgerNode::in_memory();
        for i in 0..16 {
            node.snapshot(&id(&format!("user{}", i))).unwrap();
        }
        node.submit_transaction(&id("A"), "B", 1).unwrap();
        node.mine(&id("A"), "stale", "1").unwrap();
        assert!(node.locks.lock().is_empty());
    }
}
