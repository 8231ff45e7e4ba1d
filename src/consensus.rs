//! Longest-valid-chain consensus among locally known replicas
//!
//! Peers are never contacted over a wire; their ledgers are looked up through
//! a [`PeerLookup`], usually the same store that holds the local ledger.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::blockchain::{is_valid_chain, Block, Ledger};
use crate::persistence::Persistence;
use crate::pow::ProofOfWork;

/// Source of peer ledgers. `None` means the peer is unknown or unreachable,
/// which consensus treats as a skip.
pub trait PeerLookup {
    fn lookup_peer(&self, peer: &str) -> Option<Ledger>;
}

impl PeerLookup for HashMap<String, Ledger> {
    fn lookup_peer(&self, peer: &str) -> Option<Ledger> {
        self.get(peer).cloned()
    }
}

/// Reads peer ledgers straight from a persistence backend. Unreadable
/// records count as unknown peers.
pub struct StoreLookup<'a, P: Persistence + ?Sized>(pub &'a P);

impl<P: Persistence + ?Sized> PeerLookup for StoreLookup<'_, P> {
    fn lookup_peer(&self, peer: &str) -> Option<Ledger> {
        match self.0.load_ledger(peer) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("Failed to load peer ledger {}: {}", peer, e);
                None
            }
        }
    }
}

/// Pick the chain `local` should adopt, if any.
///
/// Only a chain strictly longer than every chain seen so far (starting with
/// the local one) and valid end to end is taken, so ties never replace and
/// the first peer to reach a new maximum wins over later equal ones. Peers
/// are scanned in the order they were added.
pub fn select_longest_chain<P>(local: &Ledger, pow: &ProofOfWork, peers: &P) -> Option<(String, Vec<Block>)>
where
    P: PeerLookup + ?Sized,
{
    let mut best_length = local.len();
    let mut best: Option<(String, Vec<Block>)> = None;

    for peer_id in local.peers() {
        let Some(peer) = peers.lookup_peer(peer_id) else {
            debug!("Peer {} of {} is unknown, skipping", peer_id, local.identity());
            continue;
        };

        let length = peer.len();
        if length <= best_length {
            debug!(
                "Peer {} chain length {} does not beat {}",
                peer_id, length, best_length
            );
            continue;
        }
        if !is_valid_chain(peer.chain(), pow) {
            debug!("Peer {} offered an invalid chain of length {}", peer_id, length);
            continue;
        }

        best_length = length;
        best = Some((peer_id.clone(), peer.chain().to_vec()));
    }

    best
}

/// Replace the local chain with the longest valid peer chain.
///
/// Returns whether a replacement happened.
pub fn resolve<P>(local: &mut Ledger, pow: &ProofOfWork, peers: &P) -> bool
where
    P: PeerLookup + ?Sized,
{
    let Some((peer_id, chain)) = select_longest_chain(local, pow, peers) else {
        return false;
    };

    let previous_length = local.len();
    let new_length = chain.len();
    match local.replace_chain(chain) {
        Ok(()) => {
            info!(
                "Ledger {} adopted chain from {} ({} -> {} blocks)",
                local.identity(),
                peer_id,
                previous_length,
                new_length
            );
            true
        }
        Err(_) => false,
    }
}
