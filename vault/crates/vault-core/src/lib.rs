//! Core primitives for the withdraw vault.
//!
//! The building blocks shared by the ledger and the command line tool:
//!
//! * [`authorization`] — the off-chain withdraw authorization: digest
//!   computation, EIP-191 signing and signer recovery from `(v, r, s)`.
//! * [`units`] — parsing and formatting of native-currency amounts.
//!
//! Addresses and amounts are the `alloy-primitives` types so that digests and
//! signatures line up byte for byte with what Ethereum tooling produces.

pub mod authorization;
pub mod units;

mod error;

pub use alloy_primitives::{Address, B256, U256};
pub use error::AuthError;

/// Native-currency amount in base units.
pub type Amount = U256;
