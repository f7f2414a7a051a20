use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use vault_core::authorization::{SignatureParts, WithdrawRequest};
use vault_core::Amount;

use crate::error::Revert;

pub type Nonce = u64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deployed {
        owner: Address,
        value: Amount,
    },
    SpenderAdded {
        spender: Address,
        amount: Amount,
    },
    Deposited {
        from: Address,
        amount: Amount,
    },
    Withdrawn {
        spender: Address,
        amount: Amount,
        nonce: Nonce,
    },
}

/// Contract state of the withdraw vault.
///
/// Every mutating entry point validates completely before it touches a
/// field, so an `Err` return leaves the ledger as it was.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawLedger {
    owner: Address,
    balance: Amount,
    nonce: Nonce,
    allowances: BTreeMap<Address, Amount>,
}

impl WithdrawLedger {
    /// Construct a ledger owned by `owner`, pre-funded with `value`.
    pub fn deploy(owner: Address, value: Amount) -> (Self, LedgerEvent) {
        tracing::debug!(%owner, %value, "ledger deployed");
        let ledger = Self {
            owner,
            balance: value,
            nonce: 0,
            allowances: BTreeMap::new(),
        };
        (ledger, LedgerEvent::Deployed { owner, value })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn allowance(&self, spender: &Address) -> Amount {
        self.allowances.get(spender).copied().unwrap_or_default()
    }

    pub fn allowances(&self) -> &BTreeMap<Address, Amount> {
        &self.allowances
    }

    fn only_owner(&self, caller: Address) -> Result<(), Revert> {
        if caller != self.owner {
            return Err(Revert::NotOwner { caller });
        }
        Ok(())
    }

    /// Set the allowance of `spender` to `amount`. Owner only.
    pub fn add_spender(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<LedgerEvent, Revert> {
        self.only_owner(caller)?;
        self.allowances.insert(spender, amount);
        tracing::debug!(%spender, %amount, "allowance set");
        Ok(LedgerEvent::SpenderAdded { spender, amount })
    }

    /// Credit `value` sent by the owner to the ledger balance.
    pub fn deposit(&mut self, caller: Address, value: Amount) -> Result<LedgerEvent, Revert> {
        self.only_owner(caller)?;
        self.balance = self.balance.checked_add(value).ok_or(Revert::Overflow)?;
        tracing::debug!(%value, balance = %self.balance, "deposit credited");
        Ok(LedgerEvent::Deposited {
            from: caller,
            amount: value,
        })
    }

    /// Release `amount` to `caller` if `signature` authorises exactly
    /// `(caller, amount, nonce)` and `nonce` is the current ledger nonce.
    ///
    /// The caller is responsible for crediting the released amount to the
    /// spender's account.
    pub fn withdraw(
        &mut self,
        caller: Address,
        amount: Amount,
        nonce: Nonce,
        signature: &SignatureParts,
    ) -> Result<LedgerEvent, Revert> {
        let request = WithdrawRequest::new(caller, amount, nonce);
        let recovered = signature.recover(&request)?;
        if recovered != caller {
            return Err(Revert::SignerMismatch {
                expected: caller,
                recovered,
            });
        }
        if nonce != self.nonce {
            return Err(Revert::InvalidNonce {
                expected: self.nonce,
                provided: nonce,
            });
        }
        let allowance = self.allowance(&caller);
        if amount > allowance {
            return Err(Revert::InsufficientAllowance {
                spender: caller,
                allowance,
                requested: amount,
            });
        }
        if amount > self.balance {
            return Err(Revert::InsufficientBalance {
                available: self.balance,
                requested: amount,
            });
        }
        let next_nonce = self.nonce.checked_add(1).ok_or(Revert::Overflow)?;

        self.allowances.insert(caller, allowance - amount);
        self.balance -= amount;
        self.nonce = next_nonce;
        tracing::debug!(spender = %caller, %amount, nonce, "withdrawal released");
        Ok(LedgerEvent::Withdrawn {
            spender: caller,
            amount,
            nonce,
        })
    }
}
