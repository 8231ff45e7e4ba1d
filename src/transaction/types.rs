use serde::{Deserialize, Serialize};

/// Sender used for coins minted by the ledger itself. Never a real account.
pub const SYSTEM_SENDER: &str = "0";

/// Amount credited to the miner of each block.
pub const MINING_REWARD: i64 = 1;

/// A transfer of `amount` coins between two opaque identifiers.
///
/// Transactions carry no signature and no balance check is made when they
/// are submitted, so a sender's balance may go negative. Amounts are signed;
/// a negative amount moves coins from the recipient to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// The coin minted for whoever found the proof of a new block.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Self::new(SYSTEM_SENDER, recipient, MINING_REWARD)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    pub fn involves(&self, identity: &str) -> bool {
        self.sender == identity || self.recipient == identity
    }
}
