use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use vault_core::authorization::SignatureParts;
use vault_core::Amount;

use crate::error::Revert;
use crate::ledger::{LedgerEvent, Nonce, WithdrawLedger};

/// Entry point invoked by a transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Call {
    Deploy,
    AddSpender {
        spender: Address,
        amount: Amount,
    },
    Deposit,
    Withdraw {
        amount: Amount,
        nonce: Nonce,
        signature: SignatureParts,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Deploy => "deploy",
            Call::AddSpender { .. } => "addSpender",
            Call::Deposit => "deposit",
            Call::Withdraw { .. } => "withdraw",
        }
    }

    fn payable(&self) -> bool {
        matches!(self, Call::Deploy | Call::Deposit)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    pub value: Amount,
    pub call: Call,
}

impl Transaction {
    pub fn new(from: Address, call: Call) -> Self {
        Self {
            from,
            value: Amount::ZERO,
            call,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub sequence: u64,
    pub from: Address,
    pub call: String,
    pub value: Amount,
    pub events: Vec<LedgerEvent>,
}

/// Balances of externally owned accounts plus the deployed ledger, if any.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldState {
    pub accounts: BTreeMap<Address, Amount>,
    pub ledger: Option<WithdrawLedger>,
}

impl WorldState {
    fn credit(&mut self, account: Address, amount: Amount) -> Result<(), Revert> {
        let balance = self.accounts.entry(account).or_default();
        *balance = balance.checked_add(amount).ok_or(Revert::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: Amount) -> Result<(), Revert> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.accounts.get(&account).copied().unwrap_or_default();
        if available < amount {
            return Err(Revert::InsufficientFunds {
                account,
                available,
                required: amount,
            });
        }
        self.accounts.insert(account, available - amount);
        Ok(())
    }

    fn ledger_mut(&mut self) -> Result<&mut WithdrawLedger, Revert> {
        self.ledger.as_mut().ok_or(Revert::NotDeployed)
    }

    fn apply(&mut self, tx: &Transaction) -> Result<LedgerEvent, Revert> {
        if !tx.call.payable() && !tx.value.is_zero() {
            return Err(Revert::NonPayable {
                call: tx.call.name(),
            });
        }
        self.debit(tx.from, tx.value)?;

        match &tx.call {
            Call::Deploy => {
                if self.ledger.is_some() {
                    return Err(Revert::AlreadyDeployed);
                }
                let (ledger, event) = WithdrawLedger::deploy(tx.from, tx.value);
                self.ledger = Some(ledger);
                Ok(event)
            }
            Call::AddSpender { spender, amount } => {
                self.ledger_mut()?.add_spender(tx.from, *spender, *amount)
            }
            Call::Deposit => self.ledger_mut()?.deposit(tx.from, tx.value),
            Call::Withdraw {
                amount,
                nonce,
                signature,
            } => {
                let event = self
                    .ledger_mut()?
                    .withdraw(tx.from, *amount, *nonce, signature)?;
                self.credit(tx.from, *amount)?;
                Ok(event)
            }
        }
    }
}

/// Serial, all-or-nothing execution environment for the withdraw ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    state: WorldState,
    receipts: Vec<Receipt>,
}

impl Environment {
    /// Environment whose externally owned accounts start with `allocations`.
    /// Repeated addresses accumulate; a sum past `U256::MAX` is an overflow.
    pub fn genesis(
        allocations: impl IntoIterator<Item = (Address, Amount)>,
    ) -> Result<Self, Revert> {
        let mut state = WorldState::default();
        for (address, amount) in allocations {
            state.credit(address, amount)?;
        }
        Ok(Self {
            state,
            receipts: Vec::new(),
        })
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn account_balance(&self, account: &Address) -> Amount {
        self.state.accounts.get(account).copied().unwrap_or_default()
    }

    pub fn ledger(&self) -> Result<&WithdrawLedger, Revert> {
        self.state.ledger.as_ref().ok_or(Revert::NotDeployed)
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Native value held by accounts and ledger together.
    pub fn total_value(&self) -> Amount {
        let held = self
            .state
            .ledger
            .as_ref()
            .map(WithdrawLedger::balance)
            .unwrap_or_default();
        self.state
            .accounts
            .values()
            .fold(held, |acc, balance| acc.saturating_add(*balance))
    }

    /// Deploy the ledger from `from`, funding it with `value`.
    pub fn deploy(&mut self, from: Address, value: Amount) -> Result<Receipt, Revert> {
        self.execute(Transaction::new(from, Call::Deploy).with_value(value))
    }

    /// Apply `tx` to a working copy of the world state and commit it only if
    /// every step succeeds.
    pub fn execute(&mut self, tx: Transaction) -> Result<Receipt, Revert> {
        let mut next = self.state.clone();
        let event = match next.apply(&tx) {
            Ok(event) => event,
            Err(revert) => {
                tracing::warn!(from = %tx.from, call = tx.call.name(), %revert, "transaction reverted");
                return Err(revert);
            }
        };
        self.state = next;

        let receipt = Receipt {
            sequence: self.receipts.len() as u64,
            from: tx.from,
            call: tx.call.name().to_string(),
            value: tx.value,
            events: vec![event],
        };
        tracing::info!(sequence = receipt.sequence, call = %receipt.call, from = %tx.from, "transaction applied");
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }
}
