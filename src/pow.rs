//! Proof-of-work predicate over `(last_proof, proof)` pairs

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::sha256_hex;

pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Largest difficulty that still fits the 64 hex characters of a digest.
pub const MAX_DIFFICULTY: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    difficulty: u32,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    /// Difficulty is clamped to `1..=MAX_DIFFICULTY`.
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty: difficulty.clamp(1, MAX_DIFFICULTY),
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Hex digest of the pair's canonical encoding, if it has one.
    pub fn digest(last_proof: &str, proof: &str) -> Option<String> {
        codec::encode_proof_pair(last_proof, proof).map(|bytes| sha256_hex(&bytes))
    }

    /// True iff the digest starts with `difficulty` `'0'` characters.
    pub fn valid(&self, last_proof: &str, proof: &str) -> bool {
        match Self::digest(last_proof, proof) {
            Some(digest) => digest
                .bytes()
                .take(self.difficulty as usize)
                .all(|c| c == b'0'),
            None => false,
        }
    }

    /// Client-side search: the smallest non-negative integer, rendered in
    /// decimal, that satisfies the predicate against `last_proof`.
    ///
    /// The ledger never calls this; it only verifies proofs handed to it.
    pub fn search(&self, last_proof: &str) -> Option<String> {
        self.search_from(last_proof, 0, u64::MAX)
    }

    /// Like [`search`](Self::search) but bounded to `start..end`.
    pub fn search_from(&self, last_proof: &str, start: u64, end: u64) -> Option<String> {
        (start..end)
            .map(|candidate| candidate.to_string())
            .find(|candidate| self.valid(last_proof, candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_pairs() {
        let pow = ProofOfWork::default();
        assert!(pow.valid("A", "76234"));
        assert!(pow.valid("76234", "160729"));
        assert!(pow.valid("alice", "94371"));
        assert_eq!(
            ProofOfWork::digest("A", "76234").unwrap(),
            "000083cf844b05d7f21a8fa5e478b73376a650a662bf1d03dd1f37b8660ac328"
        );
    }

    #[test]
    fn test_known_invalid_pairs() {
        let pow = ProofOfWork::default();
        assert!(!pow.valid("A", "0"));
        assert!(!pow.valid("A", "1"));
        // Order matters: the pair is not symmetric.
        assert!(!pow.valid("76234", "A"));
    }

    #[test]
    fn test_unencodable_pair_is_invalid() {
        let pow = ProofOfWork::new(1);
        assert!(!pow.valid("A", "7\06234"));
    }

    #[test]
    fn test_difficulty_is_clamped() {
        assert_eq!(ProofOfWork::new(0).difficulty(), 1);
        assert_eq!(ProofOfWork::new(500).difficulty(), MAX_DIFFICULTY);
    }

    #[test]
    fn test_search_finds_smallest_proof() {
        let pow = ProofOfWork::default();
        assert_eq!(pow.search("A").as_deref(), Some("76234"));
        assert_eq!(pow.search_from("A", 0, 1000), None);
    }

    #[test]
    fn test_lower_difficulty_accepts_more() {
        let easy = ProofOfWork::new(2);
        let proof = easy.search("seed").unwrap();
        assert!(easy.valid("seed", &proof));
        assert!(ProofOfWork::new(1).valid("seed", &proof));
    }
}
