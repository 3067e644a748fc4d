//! Core types for the string engine (JSON contracts + internal models).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// One process request line from stdin. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
  #[serde(default = "default_source_lang")]
  pub source_lang: String,
  #[serde(default)]
  pub target_lang: Option<String>,
  pub entries: Vec<InboundEntry>,
  #[serde(default)]
  pub config: Config,
}

fn default_source_lang() -> String {
  "EN".to_string()
}

/// One raw row from the caller's sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEntry {
  pub id: String,
  pub source: String,
  #[serde(default)]
  pub target: Option<String>,
  /// Seed count for sheets that were already deduplicated once.
  #[serde(default)]
  pub occurrences: Option<u32>,
}

// ---------------------------------------------------------------------------
// Internal model types
// ---------------------------------------------------------------------------

/// One localizable string. Immutable value record: transformations build a
/// new Entry rather than mutating in place, because duplicate groups and
/// clusters keep the pre-transformation shape. Set operations key on `id`,
/// never on structural equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub id: String,
  pub source: String,
  #[serde(default)]
  pub target: Option<String>,
  #[serde(default = "default_source_lang")]
  pub source_lang: String,
  #[serde(default)]
  pub target_lang: Option<String>,
  #[serde(default = "default_occurrences")]
  pub occurrences: u32,
}

fn default_occurrences() -> u32 {
  1
}

impl Entry {
  /// Trimmed target text, with a missing target reading as "".
  pub fn target_trimmed(&self) -> &str {
    self.target.as_deref().unwrap_or("").trim()
  }

  pub fn has_target(&self) -> bool {
    !self.target_trimmed().is_empty()
  }
}

/// An ordered sequence of entries plus shared language metadata. The order
/// is the review order presented to the user; every stage either preserves
/// it or replaces it with an explicitly computed one.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
  pub entries: Vec<Entry>,
  pub source_lang: String,
  pub target_lang: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ProcessingResult>,
}

impl Dataset {
  pub fn new(entries: Vec<Entry>, source_lang: String, target_lang: Option<String>) -> Self {
    Self {
      entries,
      source_lang,
      target_lang,
      result: None,
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Percentage of entries carrying a non-blank target.
  pub fn completion_rate(&self) -> f64 {
    if self.entries.is_empty() {
      return 0.0;
    }
    let completed = self.entries.iter().filter(|e| e.has_target()).count();
    completed as f64 / self.entries.len() as f64 * 100.0
  }

  /// Preview of entries sharing source text, without running the pipeline.
  /// No kept entry is chosen; that is the deduplicator's job.
  pub fn duplicate_source_groups(&self) -> Vec<DuplicateGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Entry>> = HashMap::new();
    for entry in &self.entries {
      let key = entry.source.clone();
      if !groups.contains_key(&key) {
        order.push(key.clone());
      }
      groups.entry(key).or_default().push(entry.clone());
    }
    order
      .into_iter()
      .filter_map(|source| {
        let members = groups.remove(&source)?;
        if members.len() > 1 {
          let fingerprint = crate::fingerprint::source_fingerprint(&source);
          Some(DuplicateGroup {
            fingerprint,
            source,
            members,
            kept: None,
          })
        } else {
          None
        }
      })
      .collect()
  }
}

/// Entries that collapsed into one kept entry during deduplication.
/// Run-scoped; read-only downstream.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
  /// Stable blake3 fingerprint of the dedup key.
  pub fingerprint: String,
  pub source: String,
  pub members: Vec<Entry>,
  pub kept: Option<Entry>,
}

impl DuplicateGroup {
  pub fn count(&self) -> usize {
    self.members.len()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
  Substring,
  Semantic,
}

/// An ordered group of entries judged related. Entries are referenced by
/// value snapshots; membership bookkeeping uses entry ids.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationCluster {
  /// Unique within the run: substring ids count from 0, semantic from 1000.
  pub id: u32,
  pub kind: ClusterKind,
  /// 0.0–1.0; exactly 1.0 for substring clusters.
  pub score: f64,
  pub members: Vec<Entry>,
}

impl CorrelationCluster {
  pub fn size(&self) -> usize {
    self.members.len()
  }
}

/// Statistics from one pipeline run. Assembled once by the orchestrator
/// after both stages have returned; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
  /// Stable id derived from the input content fingerprint.
  pub run_id: String,
  pub started_at: String,
  pub original_count: usize,
  pub final_count: usize,
  pub duplicates_removed: usize,
  pub clusters_found: usize,
  pub elapsed_secs: f64,
  pub duplicate_groups: Vec<DuplicateGroup>,
  pub clusters: Vec<CorrelationCluster>,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroupSummary {
  pub fingerprint: String,
  pub source: String,
  pub count: usize,
  pub kept_id: Option<String>,
  pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
  pub id: u32,
  pub kind: ClusterKind,
  pub size: usize,
  pub score: f64,
  pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
  pub original_count: usize,
  pub final_count: usize,
  pub duplicates_removed: usize,
  pub clusters_found: usize,
  pub elapsed_secs: f64,
  pub started_at: String,
  pub duplicate_groups: Vec<DuplicateGroupSummary>,
  pub clusters: Vec<ClusterSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
  pub run_id: String,
  pub source_lang: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target_lang: Option<String>,
  pub entries: Vec<Entry>,
  pub stats: StatsOutput,
}

impl ProcessResponse {
  /// Flatten a processed dataset into the wire shape. The dataset must have
  /// passed through the orchestrator; a missing result yields zeroed stats.
  pub fn from_dataset(dataset: &Dataset) -> Self {
    let (run_id, stats) = match &dataset.result {
      Some(result) => (
        result.run_id.clone(),
        StatsOutput {
          original_count: result.original_count,
          final_count: result.final_count,
          duplicates_removed: result.duplicates_removed,
          clusters_found: result.clusters_found,
          elapsed_secs: result.elapsed_secs,
          started_at: result.started_at.clone(),
          duplicate_groups: result
            .duplicate_groups
            .iter()
            .map(|g| DuplicateGroupSummary {
              fingerprint: g.fingerprint.clone(),
              source: g.source.clone(),
              count: g.count(),
              kept_id: g.kept.as_ref().map(|e| e.id.clone()),
              member_ids: g.members.iter().map(|e| e.id.clone()).collect(),
            })
            .collect(),
          clusters: result
            .clusters
            .iter()
            .map(|c| ClusterSummary {
              id: c.id,
              kind: c.kind,
              size: c.size(),
              score: c.score,
              member_ids: c.members.iter().map(|e| e.id.clone()).collect(),
            })
            .collect(),
        },
      ),
      None => (
        String::new(),
        StatsOutput {
          original_count: dataset.len(),
          final_count: dataset.len(),
          duplicates_removed: 0,
          clusters_found: 0,
          elapsed_secs: 0.0,
          started_at: String::new(),
          duplicate_groups: Vec::new(),
          clusters: Vec::new(),
        },
      ),
    };

    Self {
      run_id,
      source_lang: dataset.source_lang.clone(),
      target_lang: dataset.target_lang.clone(),
      entries: dataset.entries.clone(),
      stats,
    }
  }
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input lines.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
