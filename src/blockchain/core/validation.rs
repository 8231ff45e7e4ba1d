use tracing::debug;

use crate::blockchain::core::chain::Block;
use crate::error::LedgerError;
use crate::pow::ProofOfWork;

/// Walk `chain` from its second block, checking contiguous indices,
/// fingerprint linkage and proof-of-work continuity. Stops at the first
/// failure.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), LedgerError> {
    let first = chain.first().ok_or(LedgerError::EmptyChain)?;
    if first.index != 1 {
        return Err(LedgerError::BlockIndexMismatch {
            expected: 1,
            found: first.index,
        });
    }

    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);

        if block.index != previous.index + 1 {
            return Err(LedgerError::BlockIndexMismatch {
                expected: previous.index + 1,
                found: block.index,
            });
        }
        if block.previous_hash != previous.fingerprint() {
            return Err(LedgerError::HashLinkage { index: block.index });
        }
        if !pow.valid(&previous.proof, &block.proof) {
            return Err(LedgerError::InvalidProof);
        }
    }
    Ok(())
}

/// Boolean form of [`validate_chain`]; a rejected chain is a normal outcome.
pub fn is_valid_chain(chain: &[Block], pow: &ProofOfWork) -> bool {
    match validate_chain(chain, pow) {
        Ok(()) => true,
        Err(e) => {
            debug!("Rejected chain of length {}: {}", chain.len(), e);
            false
        }
    }
}
