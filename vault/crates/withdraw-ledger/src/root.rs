use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::host::{Environment, Receipt};
use crate::ledger::LedgerEvent;

/// SHA-256 binary Merkle root over every account, the ledger header, each
/// allowance and each receipt. Accounts and allowances are ordered by
/// address, receipts by sequence, so equal environments hash equally.
pub fn state_root(env: &Environment) -> B256 {
    let state = env.state();
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (account, balance) in &state.accounts {
        let mut hasher = Sha256::new();
        hasher.update(b"acct");
        hasher.update(account.as_slice());
        hasher.update(balance.to_be_bytes::<32>());
        leaves.push(hasher.finalize().into());
    }
    if let Some(ledger) = &state.ledger {
        let mut hasher = Sha256::new();
        hasher.update(b"ledger");
        hasher.update(ledger.owner().as_slice());
        hasher.update(ledger.balance().to_be_bytes::<32>());
        hasher.update(ledger.nonce().to_be_bytes());
        leaves.push(hasher.finalize().into());

        for (spender, amount) in ledger.allowances() {
            let mut hasher = Sha256::new();
            hasher.update(b"allowance");
            hasher.update(spender.as_slice());
            hasher.update(amount.to_be_bytes::<32>());
            leaves.push(hasher.finalize().into());
        }
    }
    leaves.extend(env.receipts().iter().map(receipt_leaf));
    B256::from(build_merkle(leaves))
}

fn receipt_leaf(receipt: &Receipt) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"receipt");
    hasher.update(receipt.sequence.to_be_bytes());
    hasher.update(receipt.from.as_slice());
    hasher.update((receipt.call.len() as u64).to_be_bytes());
    hasher.update(receipt.call.as_bytes());
    hasher.update(receipt.value.to_be_bytes::<32>());
    hasher.update((receipt.events.len() as u64).to_be_bytes());
    for event in &receipt.events {
        match event {
            LedgerEvent::Deployed { owner, value } => {
                hasher.update(b"deployed");
                hasher.update(owner.as_slice());
                hasher.update(value.to_be_bytes::<32>());
            }
            LedgerEvent::SpenderAdded { spender, amount } => {
                hasher.update(b"spender_added");
                hasher.update(spender.as_slice());
                hasher.update(amount.to_be_bytes::<32>());
            }
            LedgerEvent::Deposited { from, amount } => {
                hasher.update(b"deposited");
                hasher.update(from.as_slice());
                hasher.update(amount.to_be_bytes::<32>());
            }
            LedgerEvent::Withdrawn {
                spender,
                amount,
                nonce,
            } => {
                hasher.update(b"withdrawn");
                hasher.update(spender.as_slice());
                hasher.update(amount.to_be_bytes::<32>());
                hasher.update(nonce.to_be_bytes());
            }
        }
    }
    hasher.finalize().into()
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"vault-state-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len().div_ceil(2));
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
