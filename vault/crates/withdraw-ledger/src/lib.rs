//! Withdraw ledger primitives.
//!
//! [`ledger::WithdrawLedger`] is the contract state machine: an owner, a
//! native balance, a replay nonce and a table of spender allowances.
//! [`host::Environment`] is the execution environment around it. It owns
//! externally held balances, moves transaction value in and out of the ledger
//! and applies every transaction all-or-nothing.

pub mod host;
pub mod ledger;
pub mod root;

mod error;

pub use error::Revert;
pub use host::{Call, Environment, Receipt, Transaction, WorldState};
pub use ledger::{LedgerEvent, Nonce, WithdrawLedger};
pub use root::state_root;
