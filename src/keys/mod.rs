use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_signer_local::PrivateKeySigner;
use rand::{rngs::OsRng, RngCore};

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("secret key must be 32 bytes (64 hex chars), got {0} bytes")]
    Length(usize),
    #[error("secret key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("secret key is not a valid secp256k1 scalar")]
    Scalar,
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fresh random secp256k1 key.
pub fn generate() -> PrivateKeySigner {
    loop {
        let mut sk_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut sk_bytes);
        // zero or >= group order; astronomically rare
        if let Ok(signer) = PrivateKeySigner::from_slice(&sk_bytes) {
            return signer;
        }
    }
}

/// Parse a 32-byte secret key given as hex, with or without `0x`.
pub fn parse_secret_hex(sk_hex: &str) -> Result<PrivateKeySigner, KeyError> {
    let trimmed = sk_hex.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
    if bytes.len() != 32 {
        return Err(KeyError::Length(bytes.len()));
    }
    PrivateKeySigner::from_slice(&bytes).map_err(|_| KeyError::Scalar)
}

pub fn read_secret_file(path: &Path) -> Result<PrivateKeySigner, KeyError> {
    let contents = fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_secret_hex(&contents)
}

/// Write `sk.hex` and `address.txt` into `out_dir`.
pub fn write_keypair(out_dir: &Path, signer: &PrivateKeySigner) -> Result<(), KeyError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| KeyError::Io { path, source }
    };
    fs::create_dir_all(out_dir).map_err(io(out_dir))?;
    let sk_path = out_dir.join("sk.hex");
    fs::write(&sk_path, hex::encode(signer.to_bytes())).map_err(io(&sk_path))?;
    let addr_path = out_dir.join("address.txt");
    fs::write(&addr_path, signer.address().to_checksum(None)).map_err(io(&addr_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_written_by_keygen_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let signer = generate();
        write_keypair(dir.path(), &signer).unwrap();

        let restored = read_secret_file(&dir.path().join("sk.hex")).unwrap();
        assert_eq!(restored.address(), signer.address());
        let address = fs::read_to_string(dir.path().join("address.txt")).unwrap();
        assert_eq!(address.parse::<alloy_primitives::Address>().unwrap(), signer.address());
    }

    #[test]
    fn secret_hex_accepts_prefix() {
        let hex = format!("0x{}", "11".repeat(32));
        let signer = parse_secret_hex(&hex).unwrap();
        assert_eq!(
            signer.address(),
            PrivateKeySigner::from_slice(&[0x11; 32]).unwrap().address()
        );
    }

    #[test]
    fn secret_hex_rejects_bad_input() {
        assert!(matches!(parse_secret_hex("abcd"), Err(KeyError::Length(2))));
        assert!(matches!(parse_secret_hex("zz"), Err(KeyError::Hex(_))));
        assert!(matches!(
            parse_secret_hex(&"00".repeat(32)),
            Err(KeyError::Scalar)
        ));
    }
}
