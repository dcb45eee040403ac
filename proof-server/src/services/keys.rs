//! Verification key loading

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use sentinel_core::{KeyError, PublicInputLayout, SnarkjsVerificationKey, VerificationKey};

#[derive(Error, Debug)]
pub enum LoadKeyError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("verification key is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid verification key: {0}")]
    Key(#[from] KeyError),
}

/// Reads a snarkjs `verification_key.json` and checks it against `layout`.
///
/// The returned key is in verifier coordinate order.
pub async fn load_verification_key(
    path: &Path,
    layout: &PublicInputLayout,
) -> Result<VerificationKey, LoadKeyError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadKeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = parse_verification_key(&bytes, layout)?;

    info!(
        path = %path.display(),
        n_public = key.n_public(),
        key_hash = %key.key_hash(),
        "Verification key loaded"
    );
    Ok(key)
}

pub fn parse_verification_key(
    json: &[u8],
    layout: &PublicInputLayout,
) -> Result<VerificationKey, LoadKeyError> {
    let raw: SnarkjsVerificationKey = serde_json::from_slice(json)?;
    let key = VerificationKey::from_snarkjs(&raw)?;
    layout.validate_for(key.n_public())?;
    Ok(key)
}
