use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::{fingerprint, Fingerprint};
use crate::error::LedgerError;
use crate::pow::ProofOfWork;
use crate::transaction::Transaction;

/// `previous_hash` of every genesis block. Not a real fingerprint.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub proof: String,
    pub previous_hash: Fingerprint,
}

impl Block {
    /// The timestamp is truncated to microseconds, the precision the
    /// canonical encoding keeps.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Block {
            index,
            timestamp: Utc::now().trunc_subsecs(6),
            transactions,
            proof: proof.into(),
            previous_hash: previous_hash.into(),
        }
    }

    pub fn genesis(proof: impl Into<String>) -> Self {
        Block::new(1, Vec::new(), proof, GENESIS_PREVIOUS_HASH)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self)
    }
}

/// Genesis proof for an identity: the text before the first `@`.
pub fn genesis_proof_for(identity: &str) -> &str {
    identity.split('@').next().unwrap_or(identity)
}

/// One identity's chain, pending pool and known peers.
///
/// The chain is never empty and `chain[i].index == i + 1` always holds.
/// Peers keep the order they were added in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    identity: String,
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: Vec<String>,
}

impl Ledger {
    /// Fresh ledger holding only the genesis block for `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        let genesis = Block::genesis(genesis_proof_for(&identity));
        Self::with_genesis(identity, genesis)
    }

    pub fn with_genesis(identity: impl Into<String>, genesis: Block) -> Self {
        Ledger {
            identity: identity.into(),
            chain: vec![genesis],
            pending: Vec::new(),
            peers: Vec::new(),
        }
    }

    /// Rebuild a ledger from stored parts.
    ///
    /// Refuses an empty chain or one whose indices do not run 1, 2, 3, ...
    /// Repeated peers are dropped, keeping the first occurrence.
    pub fn from_parts(
        identity: impl Into<String>,
        chain: Vec<Block>,
        pending: Vec<Transaction>,
        peers: Vec<String>,
    ) -> Result<Self, LedgerError> {
        check_indices(&chain)?;
        let mut ledger = Ledger {
            identity: identity.into(),
            chain,
            pending,
            peers: Vec::with_capacity(peers.len()),
        };
        for peer in peers {
            ledger.add_peer(peer);
        }
        Ok(ledger)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn has_peer(&self, peer: &str) -> bool {
        self.peers.iter().any(|p| p == peer)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false; a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Index the next mined block will carry.
    pub fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }

    pub fn last_block(&self) -> &Block {
        // The constructors never produce an empty chain.
        &self.chain[self.chain.len() - 1]
    }

    /// Queue a transfer for the next block and return that block's index.
    ///
    /// No balance check is made.
    pub fn submit(&mut self, sender: impl Into<String>, recipient: impl Into<String>, amount: i64) -> u64 {
        let tx = Transaction::new(sender, recipient, amount);
        debug!(
            "Queued transaction {} -> {} ({}) on ledger {}",
            tx.sender, tx.recipient, tx.amount, self.identity
        );
        self.pending.push(tx);
        self.next_index()
    }

    /// Verify `proof` against the current tip, credit the reward and seal
    /// every pending transaction into a new block.
    ///
    /// Nothing is modified when an error is returned.
    pub fn mine(&mut self, pow: &ProofOfWork, last_proof: &str, proof: &str) -> Result<&Block, LedgerError> {
        let tip = self.last_block();
        if last_proof != tip.proof {
            return Err(LedgerError::StaleProof {
                expected: tip.proof.clone(),
                supplied: last_proof.to_string(),
            });
        }
        if !pow.valid(last_proof, proof) {
            return Err(LedgerError::InvalidProof);
        }

        let previous_hash = tip.fingerprint();
        let index = self.next_index();

        self.pending.push(Transaction::reward(self.identity.clone()));
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(index, transactions, proof, previous_hash);

        info!(
            "Ledger {} mined block {} with {} transactions",
            self.identity,
            block.index,
            block.transactions.len()
        );
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Returns false when the peer was already known.
    pub fn add_peer(&mut self, peer: impl Into<String>) -> bool {
        let peer = peer.into();
        if self.has_peer(&peer) {
            return false;
        }
        self.peers.push(peer);
        true
    }

    /// Swap in a chain chosen by consensus. Pending transactions stay put.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) -> Result<(), LedgerError> {
        check_indices(&chain)?;
        self.chain = chain;
        Ok(())
    }
}

/// Chains held by a ledger are non-empty and numbered from 1 without gaps.
fn check_indices(chain: &[Block]) -> Result<(), LedgerError> {
    if chain.is_empty() {
        return Err(LedgerError::EmptyChain);
    }
    for (position, block) in chain.iter().enumerate() {
        let expected = position as u64 + 1;
        if block.index != expected {
            return Err(LedgerError::BlockIndexMismatch {
                expected,
                found: block.index,
            });
        }
    }
    Ok(())
}
