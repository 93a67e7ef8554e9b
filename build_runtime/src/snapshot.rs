//! Checkpoint layer: verified state checkpoints on disk.
//!
//! A checkpoint carries the full state JSON, a SHA-256 digest of that JSON,
//! the canonical build hash and the digest of the ruleset it was taken
//! under. No timestamps in checkpoint content.
//! A checkpoint that fails any check is never restored; the caller
//! falls back to a full replay.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use build_engine::domain::BuildState;
use build_engine::hashing::{canonical_hash, sha256_hex};
use build_engine::RULES_VERSION;

use crate::error::SnapshotError;
use crate::snapshot_codec::{encode_state, restore_state};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    /// Journal sequence at which this checkpoint was taken.
    pub sequence: u64,
    pub state_json: String,
    /// SHA-256 of `state_json`.
    pub digest: String,
    /// Canonical hash of the build.
    pub state_hash: String,
    pub rules_version: u32,
    pub ruleset_digest: String,
}

impl Checkpoint {
    pub fn capture(
        sequence: u64,
        state: &BuildState,
        ruleset_digest: &str,
    ) -> Result<Self, SnapshotError> {
        let state_json = encode_state(state)?;
        Ok(Self {
            sequence,
            digest: sha256_hex(state_json.as_bytes()),
            state_json,
            state_hash: canonical_hash(state),
            rules_version: RULES_VERSION,
            ruleset_digest: ruleset_digest.to_string(),
        })
    }

    /// Digest matches the content.
    pub fn verify_digest(&self) -> bool {
        sha256_hex(self.state_json.as_bytes()) == self.digest
    }

    /// Verify against the expected ruleset, decode and re-check invariants.
    pub fn restore(&self, ruleset_digest: &str) -> Result<BuildState, SnapshotError> {
        if self.rules_version != RULES_VERSION {
            return Err(SnapshotError::RulesVersion {
                found: self.rules_version,
                expected: RULES_VERSION,
            });
        }
        if self.ruleset_digest != ruleset_digest {
            return Err(SnapshotError::RulesetMismatch {
                sequence: self.sequence,
            });
        }
        if !self.verify_digest() {
            return Err(SnapshotError::DigestMismatch {
                sequence: self.sequence,
            });
        }
        let state = restore_state(&self.state_json)?;
        if canonical_hash(&state) != self.state_hash {
            return Err(SnapshotError::DigestMismatch {
                sequence: self.sequence,
            });
        }
        Ok(state)
    }
}

fn checkpoint_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("checkpoint_{:06}.json", sequence))
}

pub fn save_checkpoint(
    dir: &Path,
    sequence: u64,
    state: &BuildState,
    ruleset_digest: &str,
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;
    let checkpoint = Checkpoint::capture(sequence, state, ruleset_digest)?;
    let content = serde_json::to_string(&checkpoint).map_err(SnapshotError::Serialization)?;
    let path = checkpoint_path(dir, sequence);
    let file = File::create(&path)?;
    {
        let mut writer = BufWriter::new(&file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
    }
    file.sync_all()?;
    Ok(path)
}

/// Load the checkpoint at *sequence*, `None` if there is none.
pub fn load_checkpoint(dir: &Path, sequence: u64) -> Result<Option<Checkpoint>, SnapshotError> {
    let path = checkpoint_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let checkpoint = serde_json::from_str(&content).map_err(SnapshotError::Deserialization)?;
    Ok(Some(checkpoint))
}

/// Load the highest-sequence checkpoint in *dir*.
pub fn load_latest_checkpoint(dir: &Path) -> Result<Option<Checkpoint>, SnapshotError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let sequence = name
            .to_str()
            .and_then(|n| n.strip_prefix("checkpoint_"))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(seq) = sequence {
            best = Some(best.map_or(seq, |b| b.max(seq)));
        }
    }

    match best {
        Some(seq) => load_checkpoint(dir, seq),
        None => Ok(None),
    }
}
