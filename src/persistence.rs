//! Database persistence layer for ProofLedger

use crate::blockchain::{Block, Ledger};
use crate::error::LedgerError;
use crate::transaction::Transaction;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Mutex;

/// Abstraction for persistence backends. One record per identity, saved
/// and loaded whole.
pub trait Persistence: Send + Sync {
    fn load_ledger(&self, identity: &str) -> Result<Option<Ledger>, LedgerError>;
    fn save_ledger(&self, ledger: &Ledger) -> Result<(), LedgerError>;
    fn list_identities(&self) -> Result<Vec<String>, LedgerError>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS ledgers (
                identity TEXT PRIMARY KEY,
                chain TEXT NOT NULL,
                pending TEXT NOT NULL,
                peers TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| LedgerError::DatabaseError(format!("Failed to create ledgers table: {}", e)))?;

        Ok(Database { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::open(":memory:")
    }

    pub fn save_ledger(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let chain_json = serde_json::to_string(ledger.chain()).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to serialize chain: {}", e))
        })?;
        let pending_json = serde_json::to_string(ledger.pending()).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to serialize pending transactions: {}", e))
        })?;
        let peers_json = serde_json::to_string(ledger.peers()).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to serialize peers: {}", e))
        })?;

        let conn_guard = self.conn.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        let tx = conn_guard.unchecked_transaction().map_err(|e| {
            LedgerError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute(
            "INSERT OR REPLACE INTO ledgers (identity, chain, pending, peers)
             VALUES (?1, ?2, ?3, ?4)",
            params![ledger.identity(), chain_json, pending_json, peers_json],
        )
        .map_err(|e| LedgerError::DatabaseError(format!("Failed to save ledger: {}", e)))?;

        tx.commit().map_err(|e| {
            LedgerError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    pub fn load_ledger(&self, identity: &str) -> Result<Option<Ledger>, LedgerError> {
        let conn_guard = self.conn.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        let row = conn_guard
            .query_row(
                "SELECT chain, pending, peers FROM ledgers WHERE identity = ?1",
                params![identity],
                |row| {
                    let chain: String = row.get(0)?;
                    let pending: String = row.get(1)?;
                    let peers: String = row.get(2)?;
                    Ok((chain, pending, peers))
                },
            )
            .optional()
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to query ledger: {}", e)))?;

        let Some((chain_json, pending_json, peers_json)) = row else {
            return Ok(None);
        };

        let chain: Vec<Block> = serde_json::from_str(&chain_json).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to deserialize chain: {}", e))
        })?;
        let pending: Vec<Transaction> = serde_json::from_str(&pending_json).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to deserialize pending transactions: {}", e))
        })?;
        let peers: Vec<String> = serde_json::from_str(&peers_json).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to deserialize peers: {}", e))
        })?;

        Ledger::from_parts(identity, chain, pending, peers).map(Some)
    }

    pub fn list_identities(&self) -> Result<Vec<String>, LedgerError> {
        let conn_guard = self.conn.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        let mut stmt = conn_guard
            .prepare("SELECT identity FROM ledgers ORDER BY identity ASC")
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to query identities: {}", e)))?;

        let mut identities = Vec::new();
        for row in rows {
            identities.push(
                row.map_err(|e| LedgerError::DatabaseError(format!("Failed to read row: {}", e)))?,
            );
        }
        Ok(identities)
    }
}

// Implement the Persistence trait for the rusqlite-backed Database
impl Persistence for Database {
    fn load_ledger(&self, identity: &str) -> Result<Option<Ledger>, LedgerError> {
        Database::load_ledger(self, identity)
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        Database::save_ledger(self, ledger)
    }

    fn list_identities(&self) -> Result<Vec<String>, LedgerError> {
        Database::list_identities(self)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub ledgers: std::sync::Arc<std::sync::Mutex<HashMap<String, Ledger>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn load_ledger(&self, identity: &str) -> Result<Option<Ledger>, LedgerError> {
        let ledgers = self.ledgers.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        Ok(ledgers.get(identity).cloned())
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let mut ledgers = self.ledgers.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        ledgers.insert(ledger.identity().to_string(), ledger.clone());
        Ok(())
    }

    fn list_identities(&self) -> Result<Vec<String>, LedgerError> {
        let ledgers = self.ledgers.lock().map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))?;
        let mut identities: Vec<String> = ledgers.keys().cloned().collect();
        identities.sort();
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::ProofOfWork;

    fn mined_ledger() -> Ledger {
        let mut ledger = Ledger::new("A");
        ledger.submit("A", "B", 10);
        ledger.mine(&ProofOfWork::default(), "A", "76234").unwrap();
        ledger.submit("A", "C", 2);
        ledger.add_peer("B");
        ledger
    }

    #[test]
    fn test_database_open() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.conn.lock().unwrap().is_autocommit());
        assert!(db.list_identities().unwrap().is_empty());
    }

    #[test]
    fn test_missing_ledger_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_ledger("nobody").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_ledger() {
        let db = Database::open_in_memory().unwrap();
        let ledger = mined_ledger();
        db.save_ledger(&ledger).unwrap();

        let loaded = db.load_ledger("A").unwrap().unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.last_block().fingerprint(), ledger.last_block().fingerprint());
        assert_eq!(db.list_identities().unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let db = Database::open_in_memory().unwrap();
        let mut ledger = Ledger::new("A");
        db.save_ledger(&ledger).unwrap();
        ledger.add_peer("Z");
        ledger.add_peer("B");
        db.save_ledger(&ledger).unwrap();

        let loaded = db.load_ledger("A").unwrap().unwrap();
        assert_eq!(loaded.peers(), ["Z", "B"]);
        assert_eq!(db.list_identities().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_chain_record_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO ledgers (identity, chain, pending, peers) VALUES ('X', '[]', '[]', '[]')",
                [],
            )
            .unwrap();
        assert_eq!(db.load_ledger("X").unwrap_err(), LedgerError::EmptyChain);
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemoryPersistence::new();
        let ledger = mined_ledger();
        store.save_ledger(&ledger).unwrap();
        assert_eq!(store.load_ledger("A").unwrap(), Some(ledger));
        assert!(store.load_ledger("B").unwrap().is_none());
        assert_eq!(store.list_identities().unwrap(), vec!["A".to_string()]);
    }
}
