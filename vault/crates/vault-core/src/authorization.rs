use alloy_primitives::{eip191_hash_message, keccak256, Address, Signature, B256, U256};
use alloy_signer::{Signer, SignerSync};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::Amount;

/// The tuple a spender signs off-chain to authorise one withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub spender: Address,
    pub amount: Amount,
    pub nonce: u64,
}

impl WithdrawRequest {
    pub fn new(spender: Address, amount: Amount, nonce: u64) -> Self {
        Self {
            spender,
            amount,
            nonce,
        }
    }

    /// `keccak256(abi.encode(address, uint256, uint256))` over the request.
    pub fn digest(&self) -> B256 {
        let encoded = (self.spender, self.amount, U256::from(self.nonce)).abi_encode();
        keccak256(encoded)
    }

    /// Hash that is actually signed: the digest wrapped in the EIP-191
    /// personal message envelope.
    pub fn signing_hash(&self) -> B256 {
        eip191_hash_message(self.digest())
    }
}

/// Recoverable secp256k1 signature split into its `(v, r, s)` components.
///
/// `v` is carried the way wallets emit it (27/28); 0/1 is accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl SignatureParts {
    pub fn split(signature: &Signature) -> Self {
        Self {
            v: 27 + u8::from(signature.v()),
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        }
    }

    /// Y-parity encoded by `v`.
    pub fn parity(&self) -> Result<bool, AuthError> {
        match self.v {
            0 | 27 => Ok(false),
            1 | 28 => Ok(true),
            other => Err(AuthError::InvalidRecoveryId(other)),
        }
    }

    pub fn to_signature(&self) -> Result<Signature, AuthError> {
        Ok(Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.parity()?,
        ))
    }

    /// Recover the address that signed `request`.
    pub fn recover(&self, request: &WithdrawRequest) -> Result<Address, AuthError> {
        self.to_signature()?
            .recover_address_from_prehash(&request.signing_hash())
            .map_err(|err| AuthError::Unrecoverable(err.to_string()))
    }
}

/// Produce the off-chain authorisation for `signer` to withdraw `amount` at
/// ledger nonce `nonce`.
pub fn sign_withdraw<S>(signer: &S, amount: Amount, nonce: u64) -> Result<SignatureParts, AuthError>
where
    S: Signer + SignerSync,
{
    let request = WithdrawRequest::new(signer.address(), amount, nonce);
    let signature = signer
        .sign_message_sync(request.digest().as_slice())
        .map_err(|err| AuthError::Signing(err.to_string()))?;
    Ok(SignatureParts::split(&signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_signer_local::PrivateKeySigner;

    fn signer(byte: u8) -> PrivateKeySigner {
        PrivateKeySigner::from_slice(&[byte; 32]).unwrap()
    }

    #[test]
    fn digest_hashes_three_abi_words() {
        let spender = Address::repeat_byte(0xab);
        let request = WithdrawRequest::new(spender, U256::from(10u64), 7);

        let mut expected = [0u8; 96];
        expected[12..32].copy_from_slice(spender.as_slice());
        expected[63] = 10;
        expected[95] = 7;
        assert_eq!(request.digest(), keccak256(expected));
    }

    #[test]
    fn signed_request_recovers_signer() {
        let acc1 = signer(0x11);
        let amount = U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64));
        let parts = sign_withdraw(&acc1, amount, 0).unwrap();
        assert!(parts.v == 27 || parts.v == 28);

        let request = WithdrawRequest::new(acc1.address(), amount, 0);
        assert_eq!(parts.recover(&request).unwrap(), acc1.address());
    }

    #[test]
    fn zero_based_recovery_id_is_accepted() {
        let acc1 = signer(0x22);
        let mut parts = sign_withdraw(&acc1, U256::from(5u64), 3).unwrap();
        parts.v -= 27;
        let request = WithdrawRequest::new(acc1.address(), U256::from(5u64), 3);
        assert_eq!(parts.recover(&request).unwrap(), acc1.address());
    }

    #[test]
    fn different_nonce_recovers_someone_else() {
        let acc1 = signer(0x33);
        let parts = sign_withdraw(&acc1, U256::from(5u64), 0).unwrap();
        let replayed = WithdrawRequest::new(acc1.address(), U256::from(5u64), 1);
        assert_ne!(parts.recover(&replayed).unwrap(), acc1.address());
    }

    #[test]
    fn rejects_unknown_recovery_id() {
        let acc1 = signer(0x44);
        let mut parts = sign_withdraw(&acc1, U256::from(1u64), 0).unwrap();
        parts.v = 29;
        let request = WithdrawRequest::new(acc1.address(), U256::from(1u64), 0);
        assert_eq!(
            parts.recover(&request).unwrap_err(),
            AuthError::InvalidRecoveryId(29)
        );
    }

    #[test]
    fn zero_scalars_are_unrecoverable() {
        let parts = SignatureParts {
            v: 27,
            r: B256::ZERO,
            s: B256::ZERO,
        };
        let request = WithdrawRequest::new(Address::ZERO, U256::ZERO, 0);
        assert!(matches!(
            parts.recover(&request),
            Err(AuthError::Unrecoverable(_))
        ));
    }

    // Key 0x11..11, 10 ether, nonce 0; (v, r, s) as produced by
    // `signMessage(arrayify(keccak256(abi.encode(address, amount, nonce))))`.
    #[test]
    fn matches_wallet_personal_sign_vector() {
        let acc1 = signer(0x11);
        assert_eq!(
            acc1.address(),
            "0x19e7e376e7c213b7e7e7e46cc70a5dd086daff2a"
                .parse::<Address>()
                .unwrap()
        );

        let amount = U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64));
        let request = WithdrawRequest::new(acc1.address(), amount, 0);
        assert_eq!(
            request.digest(),
            "0x522f772dc9681fefd34bb8a7b14a70a82e2f1014fbaeb907f820e687721b0fc1"
                .parse::<B256>()
                .unwrap()
        );

        let expected = SignatureParts {
            v: 27,
            r: "0x63b69f30f12fb65a24bc39602178b798b6c557974e254efcf84fbf5d963f8c6a"
                .parse()
                .unwrap(),
            s: "0x4b224dfd83ace3c7b8685070ade76bdeb663f8cd0b5fb5a2bcf3289dabbdb5a5"
                .parse()
                .unwrap(),
        };
        assert_eq!(sign_withdraw(&acc1, amount, 0).unwrap(), expected);
        assert_eq!(expected.recover(&request).unwrap(), acc1.address());
    }

    #[test]
    fn signature_parts_serialize_as_hex() {
        let parts = SignatureParts {
            v: 28,
            r: B256::repeat_byte(1),
            s: B256::repeat_byte(2),
        };
        let json = serde_json::to_value(parts).unwrap();
        assert_eq!(json["v"], 28);
        assert_eq!(json["r"], format!("0x{}", "01".repeat(32)));
    }
}
