use crate::since::EpochNumberWithFraction;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("malformed since value {0:#x}")]
    MalformedSince(u64),
    #[error("cell can not be unlocked before epoch {earliest}, current epoch is {current}")]
    NotYetMature {
        earliest: EpochNumberWithFraction,
        current: EpochNumberWithFraction,
    },
    #[error("deposit not found: {0}")]
    DepositNotFound(String),
    #[error("withdraw transaction has {candidates} matching deposit inputs, expected exactly one")]
    AmbiguousDepositReference { candidates: usize },
    #[error("insufficient funds: need {required} shannons, {available} available")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("signer rejected the transaction: {0}")]
    SignerRejected(String),
    #[error("expected {expected} signatures, got {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },
    #[error("cell related to unlockable amount not found")]
    CellNotFound,
    #[error("unexpected lifecycle stage: {0}")]
    UnexpectedStage(&'static str),
    #[error("malformed cell data: {0}")]
    MalformedCellData(String),
    #[error("deposit of {amount} shannons is below the minimum of {minimum}")]
    DepositTooSmall { amount: u64, minimum: u64 },
    #[error("no fee address given")]
    NoFeeAddress,
    #[error("capacity overflow")]
    Overflow,
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}

pub type Result<T, E = DaoError> = std::result::Result<T, E>;
