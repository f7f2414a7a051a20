use alloy_primitives::Address;
use thiserror::Error;
use vault_core::{Amount, AuthError};

/// Reason a transaction was reverted. A revert never leaves partial state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Revert {
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("invalid nonce: ledger is at {expected}, request carries {provided}")]
    InvalidNonce { expected: u64, provided: u64 },

    #[error("allowance of {spender} is {allowance}, requested {requested}")]
    InsufficientAllowance {
        spender: Address,
        allowance: Amount,
        requested: Amount,
    },

    #[error("ledger holds {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    #[error("signature was produced by {recovered}, not by caller {expected}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },

    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] AuthError),

    #[error("{call} is not payable")]
    NonPayable { call: &'static str },

    #[error("account {account} holds {available}, transaction needs {required}")]
    InsufficientFunds {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("ledger already deployed")]
    AlreadyDeployed,

    #[error("ledger not deployed")]
    NotDeployed,

    #[error("arithmetic overflow")]
    Overflow,
}
