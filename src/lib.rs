//! ProofLedger - a per-identity proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the `Ledger`, derived balances and chain validation
//! - [`transaction`] - Transaction records and the reserved system sender
//!
//! ## Hashing & Proof-of-Work
//! - [`codec`] - Canonical byte encodings shared by all replicas
//! - [`crypto`] - SHA-256 block fingerprints
//! - [`pow`] - Proof-of-work predicate
//!
//! ## Consensus
//! - [`consensus`] - Longest-valid-chain resolution across peer ledgers
//!
//! ## Host Integration
//! - [`persistence`] - Database layer (SQLite) and in-memory store
//! - [`guard`] - Caller identity guard with lazy ledger creation
//! - [`node`] - Per-identity serialized service over the core
//! - [`api`] - HTTP request layer (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Hashing & Proof-of-Work
// ============================================================================
pub mod codec;
pub mod crypto;
pub mod pow;

// ============================================================================
// Consensus
// ============================================================================
pub mod consensus;

// ============================================================================
// Host Integration
// ============================================================================
pub mod guard;
pub mod node;
pub mod persistence;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
