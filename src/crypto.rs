//! Block fingerprints (SHA-256, lowercase hex)

use sha2::{Digest, Sha256};

use crate::blockchain::Block;
use crate::codec;

/// 64 lowercase hex characters.
pub type Fingerprint = String;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Digest of the block's canonical encoding.
pub fn fingerprint(block: &Block) -> Fingerprint {
    sha256_hex(&codec::encode_block(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use chrono::{TimeZone, Utc};

    fn block() -> Block {
        Block {
            index: 3,
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            transactions: vec![Transaction::new("alice", "bob", 5)],
            proof: "94371".to_string(),
            previous_hash: "1".to_string(),
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = block();
        let b = block();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn test_fingerprint_survives_json_round_trip() {
        let original = block();
        let stored = serde_json::to_string(&original).unwrap();
        let restored: Block = serde_json::from_str(&stored).unwrap();
        assert_eq!(fingerprint(&original), fingerprint(&restored));
    }

    #[test]
    fn test_fingerprint_changes_with_each_field() {
        let base = fingerprint(&block());

        let mut b = block();
        b.transactions[0].amount = 6;
        assert_ne!(fingerprint(&b), base);

        let mut b = block();
        b.transactions[0].sender = "mallory".to_string();
        assert_ne!(fingerprint(&b), base);

        let mut b = block();
        b.proof = "94372".to_string();
        assert_ne!(fingerprint(&b), base);

        let mut b = block();
        b.previous_hash = "2".to_string();
        assert_ne!(fingerprint(&b), base);

        let mut b = block();
        b.index = 4;
        assert_ne!(fingerprint(&b), base);
    }
}
