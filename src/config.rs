//! Pipeline configuration. Every section has defaults, so a partial JSON file is enough.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where raw records come from
    pub source: SourceConfig,
    /// Field names used to address records
    pub fields: FieldKeys,
    /// Domain/action filtering and day cutoff
    pub stream: StreamConfig,
    /// History windowing
    pub sequence: SequenceConfig,
    /// Reserved token literals
    pub vocab: VocabConfig,
    /// Batch assembly
    pub collate: CollateConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON-lines file of raw events
    pub path: PathBuf,
    /// Stop after this many filtered rows; 0 is unlimited
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldKeys {
    pub user: String,
    pub action: String,
    pub product: String,
    pub domain: String,
    pub date: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Injected into records that carry no domain
    pub domain_value: Option<String>,
    /// Allow-list of domains; `None` keeps every domain
    pub domains: Option<BTreeSet<String>>,
    pub exclude_actions: BTreeSet<String>,
    /// Stop once more than this many distinct days were seen; `None` disables the cutoff
    pub max_days: Option<usize>,
    /// Project emitted records down to these fields
    pub keep_fields: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Capacity of each per-entity history buffer
    pub max_history: usize,
    pub include_product: bool,
    /// The first event of an entity only seeds its history
    pub drop_until_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    pub pad_token: String,
    pub unk_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollateConfig {
    pub batch_size: usize,
    /// Unseen tokens (history and targets) mint new ids
    pub grow_vocabs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/events.jsonl"),
            limit: None,
        }
    }
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            user: "user_id".to_string(),
            action: "action_type".to_string(),
            product: "product_id".to_string(),
            domain: "domain".to_string(),
            date: "date".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            domain_value: None,
            domains: None,
            exclude_actions: ["VIEW", "view"].iter().map(|s| s.to_string()).collect(),
            max_days: Some(100),
            keep_fields: None,
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            include_product: true,
            drop_until_history: true,
        }
    }
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            pad_token: "<pad>".to_string(),
            unk_token: "<unk>".to_string(),
        }
    }
}

impl Default for CollateConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            grow_vocabs: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file if present; otherwise return defaults. A malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence.max_history == 0 {
            return Err(PipelineError::InvalidHistoryLength(0));
        }
        if self.collate.batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize);
        }
        if self.vocab.pad_token == self.vocab.unk_token {
            return Err(PipelineError::Config(
                "pad and unk tokens must differ".to_string(),
            ));
        }
        Ok(())
    }
}
