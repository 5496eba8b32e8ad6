//! Model update records and the model hash log.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Model update as stored by the model contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUpdate {
    /// Content hash of the model.
    pub hash: String,
    /// Submission timestamp as given by the client.
    pub timestamp: String,
    /// Node that produced the model.
    pub node_id: String,
}

/// Hex-encoded SHA-256 of a string.
#[must_use]
pub fn content_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// One `nodeId,timestamp,modelHash` line of the hash log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHashEntry {
    /// Producing node.
    pub node_id: String,
    /// Timestamp written by the trainer.
    pub timestamp: String,
    /// Model hash.
    pub model_hash: String,
}

impl ModelHashEntry {
    /// Parses one log line.
    ///
    /// # Errors
    /// Returns [`LedgerError::HashLog`] unless the line has three non-empty fields.
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.trim().split(',').map(str::trim);
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(node_id), Some(timestamp), Some(model_hash), None)
                if !node_id.is_empty() && !timestamp.is_empty() && !model_hash.is_empty() =>
            {
                Ok(Self {
                    node_id: node_id.to_string(),
                    timestamp: timestamp.to_string(),
                    model_hash: model_hash.to_string(),
                })
            }
            _ => Err(LedgerError::hash_log(format!("invalid log format: \"{}\"", line.trim()))),
        }
    }

    /// Reads the last entry of a hash log.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is empty, or its last
    /// line is malformed.
    pub async fn read_last(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let last = content
            .trim()
            .lines()
            .last()
            .filter(|line| !line.trim().is_empty())
            .ok_or_else(|| {
                LedgerError::hash_log(format!("no entries found in {}", path.display()))
            })?;
        Self::parse(last)
    }
}
