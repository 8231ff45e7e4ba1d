//! Identity guard placed in front of every ledger operation.
//!
//! The identity itself comes from an external provider; the guard only
//! insists that one is present and makes sure a ledger exists for it.

use std::fmt;

use tracing::info;

use crate::blockchain::Ledger;
use crate::error::LedgerError;
use crate::persistence::Persistence;

/// A non-empty caller identity, treated as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LedgerError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LedgerError::MissingIdentity);
        }
        Ok(Identity(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deny callers without an identity.
pub fn require_identity(raw: Option<&str>) -> Result<Identity, LedgerError> {
    raw.ok_or(LedgerError::MissingIdentity).and_then(Identity::new)
}

/// Load the caller's ledger, creating and saving a genesis-only one on first
/// access.
pub fn load_or_create<P>(persistence: &P, identity: &Identity) -> Result<Ledger, LedgerError>
where
    P: Persistence + ?Sized,
{
    if let Some(ledger) = persistence.load_ledger(identity.as_str())? {
        return Ok(ledger);
    }
    let ledger = Ledger::new(identity.as_str());
    persistence.save_ledger(&ledger)?;
    info!("Created ledger for {} with genesis proof {:?}", identity, ledger.last_block().proof);
    Ok(ledger)
}
