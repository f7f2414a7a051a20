//! JSON persistence of the host environment.
//!
//! The file records the SHA-256 state root next to the environment; loading
//! recomputes it and refuses files whose contents no longer match. The root
//! covers balances, the ledger, allowances and the receipt log.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use withdraw_ledger::{state_root, Environment};

pub const STATE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct StateFile {
    version: u8,
    state_root: B256,
    environment: Environment,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file {} not found, run `vault init` first", .0.display())]
    Missing(PathBuf),
    #[error("state file {} already exists (pass --force to overwrite)", .0.display())]
    Exists(PathBuf),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed state file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported state file version {0}")]
    Version(u8),
    #[error("state root mismatch: file records {recorded}, contents hash to {computed}")]
    RootMismatch { recorded: B256, computed: B256 },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn load(path: &Path) -> Result<Environment, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::Missing(path.to_path_buf()))
        }
        Err(err) => return Err(io_err(path)(err)),
    };
    let file: StateFile = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if file.version != STATE_VERSION {
        return Err(StoreError::Version(file.version));
    }
    let computed = state_root(&file.environment);
    if computed != file.state_root {
        return Err(StoreError::RootMismatch {
            recorded: file.state_root,
            computed,
        });
    }
    tracing::debug!(path = %path.display(), root = %computed, "state loaded");
    Ok(file.environment)
}

/// Write `env` to `path` through a sibling temp file and return the recorded
/// state root.
pub fn save(path: &Path, env: &Environment) -> Result<B256, StoreError> {
    let root = state_root(env);
    let file = StateFile {
        version: STATE_VERSION,
        state_root: root,
        environment: env.clone(),
    };
    let json = serde_json::to_vec_pretty(&file).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))?;
    tracing::debug!(path = %path.display(), %root, "state saved");
    Ok(root)
}

/// Write a fresh environment, refusing to clobber an existing file unless
/// `force` is set.
pub fn create(path: &Path, env: &Environment, force: bool) -> Result<B256, StoreError> {
    if path.exists() && !force {
        return Err(StoreError::Exists(path.to_path_buf()));
    }
    save(path, env)
}
