//! Pipeline configuration with the production defaults.

use serde::{Deserialize, Serialize};

/// How duplicate entries are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
  /// Group by (trimmed source, trimmed target); keep the first member with
  /// an accumulated occurrence count. The production default.
  KeepFirstWithOccurrences,
  /// Group by source text only; keep the first member verbatim.
  KeepFirst,
  /// Group by source text only; keep the member with the best target
  /// (non-blank, then longest).
  KeepBest,
}

/// How the reviewed order is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrategy {
  /// Case-insensitive source order. No clusters.
  Alphabetical,
  /// Descending occurrences, then case-insensitive source. No clusters.
  Occurrences,
  /// Cluster by case-insensitive proper substring containment.
  Substring,
  /// Cluster by TF-IDF cosine similarity above a threshold.
  Semantic,
  /// Substring pass first, semantic pass over the leftovers. The production
  /// default: exact containment beats fuzzier lexical similarity, and the
  /// vector work is skipped for strings containment already explains.
  Hybrid,
}

/// Tunable parameters for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub remove_duplicates: bool,
  pub dedup_strategy: DedupStrategy,
  pub sort_by_correlation: bool,
  pub correlation_strategy: CorrelationStrategy,
  /// Minimum similarity to the cluster seed for semantic membership (0..1).
  pub similarity_threshold: f64,
  /// Hard cap on members per cluster, both passes.
  pub max_cluster_size: usize,
  /// Shortest trimmed text allowed to seed a substring cluster.
  pub min_substring_length: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      remove_duplicates: true,
      dedup_strategy: DedupStrategy::KeepFirstWithOccurrences,
      sort_by_correlation: true,
      correlation_strategy: CorrelationStrategy::Hybrid,
      similarity_threshold: 0.7,
      max_cluster_size: 15,
      min_substring_length: 5,
    }
  }
}
