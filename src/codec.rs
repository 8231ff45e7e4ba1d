//! Canonical encodings hashed by every replica.
//!
//! These are free functions rather than methods on [`Block`] so that the way
//! a block is stored never decides how it is hashed. Any change to the byte
//! layout below changes every fingerprint and every proof-of-work check, and
//! therefore splits replicas that disagree on it.
//!
//! Block layout (compact JSON, fixed key order, no whitespace):
//!
//! ```text
//! {"index":<u64>,"timestamp":"<YYYY-MM-DD HH:MM:SS.ffffff>","transactions":[{"sender":<str>,"recipient":<str>,"amount":<u64>},...],"proof":<str>,"previous_hash":<str>}
//! ```
//!
//! Proof-pair layout: `last_proof` UTF-8 bytes, one `0x00` byte, `proof`
//! UTF-8 bytes. Proofs containing `0x00` have no encoding.

use chrono::{DateTime, Utc};

use crate::blockchain::Block;
use crate::transaction::Transaction;

/// Timestamps are always rendered in UTC with microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub const PROOF_SEPARATOR: u8 = 0x00;

pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn push_json_str(out: &mut String, value: &str) {
    // Value's Display is infallible and escapes the same way on every platform.
    out.push_str(&serde_json::Value::String(value.to_owned()).to_string());
}

fn push_transaction(out: &mut String, tx: &Transaction) {
    out.push_str("{\"sender\":");
    push_json_str(out, &tx.sender);
    out.push_str(",\"recipient\":");
    push_json_str(out, &tx.recipient);
    out.push_str(",\"amount\":");
    out.push_str(&tx.amount.to_string());
    out.push('}');
}

/// Canonical text of a block; `encode_block` is its UTF-8 bytes.
pub fn canonical_block(block: &Block) -> String {
    let mut out = String::with_capacity(128 + block.transactions.len() * 64);
    out.push_str("{\"index\":");
    out.push_str(&block.index.to_string());
    out.push_str(",\"timestamp\":");
    push_json_str(&mut out, &canonical_timestamp(&block.timestamp));
    out.push_str(",\"transactions\":[");
    for (i, tx) in block.transactions.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_transaction(&mut out, tx);
    }
    out.push_str("],\"proof\":");
    push_json_str(&mut out, &block.proof);
    out.push_str(",\"previous_hash\":");
    push_json_str(&mut out, &block.previous_hash);
    out.push('}');
    out
}

pub fn encode_block(block: &Block) -> Vec<u8> {
    canonical_block(block).into_bytes()
}

/// Returns `None` when either proof contains the separator byte.
pub fn encode_proof_pair(last_proof: &str, proof: &str) -> Option<Vec<u8>> {
    if last_proof.as_bytes().contains(&PROOF_SEPARATOR) || proof.as_bytes().contains(&PROOF_SEPARATOR) {
        return None;
    }
    let mut bytes = Vec::with_capacity(last_proof.len() + proof.len() + 1);
    bytes.extend_from_slice(last_proof.as_bytes());
    bytes.push(PROOF_SEPARATOR);
    bytes.extend_from_slice(proof.as_bytes());
    Some(bytes)
}
