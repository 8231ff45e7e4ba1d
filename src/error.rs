//! Error types for ProofLedger

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller mined against a tip that is no longer the last block.
    StaleProof { expected: String, supplied: String },
    InvalidProof,
    HashLinkage { index: u64 },
    BlockIndexMismatch { expected: u64, found: u64 },
    EmptyChain,
    MissingIdentity,
    DatabaseError(String),
    SerializationError(String),
    IoError(String),
    ConfigError(String),
}

impl LedgerError {
    /// Stale and invalid proofs are expected outcomes of a mining race; the
    /// caller re-reads the tip and retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LedgerError::StaleProof { .. } | LedgerError::InvalidProof
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::StaleProof { expected, supplied } => write!(
                f,
                "Stale proof: chain tip proof is {}, but {} was supplied",
                expected, supplied
            ),
            LedgerError::InvalidProof => write!(f, "Invalid proof of work"),
            LedgerError::HashLinkage { index } => {
                write!(f, "Block {} does not link to the fingerprint of its predecessor", index)
            }
            LedgerError::BlockIndexMismatch { expected, found } => {
                write!(f, "Invalid block index. Expected {}, but got {}", expected, found)
            }
            LedgerError::EmptyChain => write!(f, "Chain contains no blocks"),
            LedgerError::MissingIdentity => write!(f, "No caller identity supplied"),
            LedgerError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            LedgerError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            LedgerError::IoError(msg) => write!(f, "IO error: {}", msg),
            LedgerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError(err.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::DatabaseError(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(LedgerError::InvalidProof.is_recoverable());
        assert!(LedgerError::StaleProof {
            expected: "1".to_string(),
            supplied: "2".to_string()
        }
        .is_recoverable());
        assert!(!LedgerError::EmptyChain.is_recoverable());
        assert!(!LedgerError::DatabaseError("locked".to_string()).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            LedgerError::BlockIndexMismatch { expected: 2, found: 5 }.to_string(),
            "Invalid block index. Expected 2, but got 5"
        );
        assert_eq!(LedgerError::EmptyChain.to_string(), "Chain contains no blocks");
    }
}
