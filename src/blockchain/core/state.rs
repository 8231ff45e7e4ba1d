//! Derived views over a ledger: balances and display snapshots.
//!
//! Nothing here is stored. Balances are recomputed from the full history on
//! every call so they can never go stale after mining or a chain swap.

use serde::{Deserialize, Serialize};

use crate::blockchain::core::chain::{Block, Ledger};
use crate::crypto::Fingerprint;
use crate::transaction::Transaction;

/// Coins received minus coins sent by `identity` over the given history.
pub fn balance_of<'a, I>(transactions: I, identity: &str) -> i128
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions.into_iter().fold(0i128, |mut acc, tx| {
        if tx.recipient == identity {
            acc += i128::from(tx.amount);
        }
        if tx.sender == identity {
            acc -= i128::from(tx.amount);
        }
        acc
    })
}

impl Ledger {
    /// Every transaction in the chain followed by the pending pool.
    pub fn history(&self) -> impl Iterator<Item = &Transaction> {
        self.chain()
            .iter()
            .flat_map(|block| block.transactions.iter())
            .chain(self.pending().iter())
    }

    /// Balance of any identity as seen by this ledger, pending included.
    pub fn balance(&self, identity: &str) -> i128 {
        balance_of(self.history(), identity)
    }

    /// Balance of the ledger's own identity.
    pub fn own_balance(&self) -> i128 {
        self.balance(self.identity())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            identity: self.identity().to_string(),
            chain: self.chain().iter().map(BlockView::from).collect(),
            pending: self.pending().to_vec(),
            peers: self.peers().to_vec(),
            balance: self.own_balance(),
        }
    }
}

/// A block as displayed, with its fingerprint alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: Block,
    pub fingerprint: Fingerprint,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        BlockView {
            block: block.clone(),
            fingerprint: block.fingerprint(),
        }
    }
}

/// Read-only view of a ledger for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub identity: String,
    pub chain: Vec<BlockView>,
    pub pending: Vec<Transaction>,
    pub peers: Vec<String>,
    pub balance: i128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::ProofOfWork;

    #[test]
    fn test_balance_starts_at_zero() {
        let ledger = Ledger::new("A");
        assert_eq!(ledger.own_balance(), 0);
        assert_eq!(ledger.balance("B"), 0);
    }

    #[test]
    fn test_pending_counts_towards_balance() {
        let mut ledger = Ledger::new("A");
        ledger.submit("A", "B", 10);
        assert_eq!(ledger.own_balance(), -10);
        assert_eq!(ledger.balance("B"), 10);
    }

    #[test]
    fn test_reward_is_credited_after_mining() {
        let mut ledger = Ledger::new("A");
        ledger.mine(&ProofOfWork::default(), "A", "76234").unwrap();
        assert_eq!(ledger.own_balance(), 1);
        assert_eq!(ledger.balance("0"), -1);
    }

    #[test]
    fn test_self_transfer_nets_zero() {
        let txs = vec![Transaction::new("A", "A", 7)];
        assert_eq!(balance_of(&txs, "A"), 0);
    }

    #[test]
    fn test_negative_amount_moves_coins_back() {
        let mut ledger = Ledger::new("A");
        ledger.submit("A", "B", -5);
        assert_eq!(ledger.own_balance(), 5);
        assert_eq!(ledger.balance("B"), -5);
    }

    #[test]
    fn test_snapshot_lists_fingerprints() {
        let mut ledger = Ledger::new("A");
        ledger.add_peer("B");
        ledger.submit("A", "B", 2);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.identity, "A");
        assert_eq!(snapshot.chain.len(), 1);
        assert_eq!(snapshot.chain[0].fingerprint, ledger.last_block().fingerprint());
        assert_eq!(snapshot.pending.len(), 1);
        assert_eq!(snapshot.peers, vec!["B".to_string()]);
        assert_eq!(snapshot.balance, -2);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["chain"][0]["index"], 1);
        assert_eq!(json["chain"][0]["previous_hash"], "1");
        assert!(json["chain"][0]["fingerprint"].is_string());
    }
}
