//! JSON adapter: Implementation of ArtifactSource over a model directory.
//!
//! Expected layout:
//!
//! ```text
//! models/
//!   emra_model.json        fitted imputer, scaler and logistic parameters
//!   emra_metadata.json     canonical feature order
//!   reference_scores.json  validation-cohort probabilities (JSON array)
//!   manifest.json          optional: SHA-256 of each file above
//! ```
//!
//! # Integrity
//!
//! All three files are read once, when the store is opened. If a manifest is
//! present every artifact's digest must match it; with `require_manifest` a
//! missing manifest is an error. Parsing happens from the bytes that were
//! hashed, so a file swapped after opening is never observed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{ModelArtifact, ModelMetadata};
use crate::ports::ArtifactSource;

pub const MODEL_FILE: &str = "emra_model.json";
pub const METADATA_FILE: &str = "emra_metadata.json";
pub const REFERENCE_FILE: &str = "reference_scores.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const ARTIFACT_FILES: [&str; 3] = [MODEL_FILE, METADATA_FILE, REFERENCE_FILE];

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {file}: {source}")]
    Malformed {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("{MANIFEST_FILE} required but not found in {0:?}")]
    ManifestRequired(PathBuf),
}

impl From<std::convert::Infallible> for ArtifactError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Digest manifest binding the artifact files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Build a manifest for the artifact files currently in `dir`.
    ///
    /// # Errors
    /// Returns `Read` if any artifact file cannot be read.
    pub fn for_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in ARTIFACT_FILES {
            let bytes = read_file(&dir.join(name))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self { version: 1, files })
    }

    fn verify(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let expected = self.files.get(name).ok_or_else(|| {
            ArtifactError::Integrity(format!("{MANIFEST_FILE} does not bind {name}"))
        })?;
        let actual = sha256_hex(bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ArtifactError::Integrity(format!(
                "hash mismatch for {name}"
            )));
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: DeserializeOwned>(file: &'static str, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Malformed { file, source })
}

/// Filesystem artifact store reading JSON exports.
#[derive(Debug, Clone)]
pub struct JsonArtifactStore {
    dir: PathBuf,
    model: Vec<u8>,
    metadata: Vec<u8>,
    reference: Vec<u8>,
    verified: bool,
}

impl JsonArtifactStore {
    /// Read and (if a manifest exists) verify all artifacts in `dir`.
    ///
    /// # Errors
    /// Returns error if a file is unreadable, a digest mismatches, or
    /// `require_manifest` is set and no manifest exists.
    pub fn open(dir: impl AsRef<Path>, require_manifest: bool) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref().to_path_buf();
        let manifest_path = dir.join(MANIFEST_FILE);

        let manifest: Option<ArtifactManifest> = if manifest_path.exists() {
            let manifest: ArtifactManifest = parse(MANIFEST_FILE, &read_file(&manifest_path)?)?;
            if manifest.version != 1 {
                return Err(ArtifactError::Integrity(format!(
                    "unsupported manifest version {}",
                    manifest.version
                )));
            }
            Some(manifest)
        } else if require_manifest {
            tracing::error!("No {MANIFEST_FILE} in {:?}", dir);
            return Err(ArtifactError::ManifestRequired(dir));
        } else {
            tracing::warn!(
                "Loading artifacts from {:?} without {MANIFEST_FILE}; digests not checked",
                dir
            );
            None
        };

        let model = read_file(&dir.join(MODEL_FILE))?;
        let metadata = read_file(&dir.join(METADATA_FILE))?;
        let reference = read_file(&dir.join(REFERENCE_FILE))?;

        if let Some(manifest) = &manifest {
            manifest.verify(MODEL_FILE, &model)?;
            manifest.verify(METADATA_FILE, &metadata)?;
            manifest.verify(REFERENCE_FILE, &reference)?;
            tracing::info!("Artifact digests verified against {MANIFEST_FILE}");
        }

        Ok(Self {
            dir,
            model,
            metadata,
            reference,
            verified: manifest.is_some(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the artifacts were checked against a manifest.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }
}

impl ArtifactSource for JsonArtifactStore {
    type Error = ArtifactError;

    fn load_model(&self) -> Result<ModelArtifact, Self::Error> {
        parse(MODEL_FILE, &self.model)
    }

    fn load_metadata(&self) -> Result<ModelMetadata, Self::Error> {
        parse(METADATA_FILE, &self.metadata)
    }

    fn load_reference_scores(&self) -> Result<Vec<f64>, Self::Error> {
        parse(REFERENCE_FILE, &self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODEL_JSON: &str = r#"{
        "feature_names": ["LBXGLU", "LBXGH"],
        "imputer_fill": [95.0, 5.5],
        "scaler_mean": [100.0, 5.5],
        "scaler_scale": [10.0, 0.5],
        "coefficients": [0.8, 1.2],
        "intercept": -1.0
    }"#;
    const METADATA_JSON: &str = r#"{"feature_names": ["LBXGLU", "LBXGH"], "n_reference": 3}"#;
    const REFERENCE_JSON: &str = "[0.3, 0.1, 0.2]";

    fn write_artifacts() -> TempDir {
        let dir = TempDir::new().expect("Temp dir");
        std::fs::write(dir.path().join(MODEL_FILE), MODEL_JSON).unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), METADATA_JSON).unwrap();
        std::fs::write(dir.path().join(REFERENCE_FILE), REFERENCE_JSON).unwrap();
        dir
    }

    fn write_manifest(dir: &Path) {
        let manifest = ArtifactManifest::for_dir(dir).unwrap();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_without_manifest() {
        let dir = write_artifacts();
        let store = JsonArtifactStore::open(dir.path(), false).expect("Should open");
        assert!(!store.is_verified());

        let model = store.load_model().unwrap();
        assert_eq!(model.feature_names, vec!["LBXGLU", "LBXGH"]);
        assert_eq!(store.load_metadata().unwrap().n_reference, Some(3));
        assert_eq!(store.load_reference_scores().unwrap(), vec![0.3, 0.1, 0.2]);
    }

    #[test]
    fn test_manifest_required() {
        let dir = write_artifacts();
        let err = JsonArtifactStore::open(dir.path(), true).unwrap_err();
        assert!(matches!(err, ArtifactError::ManifestRequired(_)));
    }

    #[test]
    fn test_manifest_verifies() {
        let dir = write_artifacts();
        write_manifest(dir.path());
        let store = JsonArtifactStore::open(dir.path(), true).expect("Digests match");
        assert!(store.is_verified());
    }

    #[test]
    fn test_tampered_artifact_is_rejected() {
        let dir = write_artifacts();
        write_manifest(dir.path());
        std::fs::write(dir.path().join(REFERENCE_FILE), "[0.9, 0.9, 0.9]").unwrap();

        let err = JsonArtifactStore::open(dir.path(), false).unwrap_err();
        assert!(matches!(err, ArtifactError::Integrity(ref m) if m.contains(REFERENCE_FILE)));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = write_artifacts();
        std::fs::remove_file(dir.path().join(METADATA_FILE)).unwrap();
        let err = JsonArtifactStore::open(dir.path(), false).unwrap_err();
        assert!(matches!(err, ArtifactError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = write_artifacts();
        std::fs::write(dir.path().join(MODEL_FILE), "{\"feature_names\": 3}").unwrap();
        let store = JsonArtifactStore::open(dir.path(), false).expect("Bytes readable");
        let err = store.load_model().unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed { file: MODEL_FILE, .. }));
    }
}
