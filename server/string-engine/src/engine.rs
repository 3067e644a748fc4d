//! Processing orchestrator: dedup, then correlation, then statistics.

use std::time::Instant;

use chrono::Utc;

use crate::config::Config;
use crate::correlate;
use crate::dedup;
use crate::error::EngineError;
use crate::fingerprint;
use crate::types::{Dataset, ProcessingResult};

/// The string processing pipeline. Stateless between calls: each `process`
/// run operates on its own dataset and the engine's config only, so
/// independent runs need no coordination.
pub struct Engine {
  config: Config,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Run the pipeline over a dataset.
  ///
  /// Stage order is fixed — deduplicate, then correlate — because
  /// correlation quality depends on already-merged occurrence counts.
  /// An empty dataset fails fast before any stage; stage errors surface
  /// unchanged and no partial dataset is ever returned.
  pub fn process(&self, dataset: Dataset) -> Result<Dataset, EngineError> {
    if dataset.is_empty() {
      return Err(EngineError::validation("entries", "dataset is empty"));
    }

    let started = Instant::now();
    let started_at = Utc::now().to_rfc3339();
    let original_count = dataset.len();
    let run_id = fingerprint::run_id(dataset.entries.iter().map(|e| e.source.as_str()));

    tracing::info!(
      run_id = %run_id,
      entries = original_count,
      "processing pipeline started"
    );

    let (entries, duplicate_groups) = if self.config.remove_duplicates {
      dedup::deduplicate(&dataset.entries, self.config.dedup_strategy)
    } else {
      (dataset.entries.clone(), Vec::new())
    };
    let duplicates_removed = original_count - entries.len();

    let (entries, clusters) = if self.config.sort_by_correlation {
      correlate::correlate(&entries, &self.config)
    } else {
      (entries, Vec::new())
    };

    let result = ProcessingResult {
      run_id: run_id.clone(),
      started_at,
      original_count,
      final_count: entries.len(),
      duplicates_removed,
      clusters_found: clusters.len(),
      elapsed_secs: started.elapsed().as_secs_f64(),
      duplicate_groups,
      clusters,
    };

    tracing::info!(
      run_id = %run_id,
      original = result.original_count,
      unique = result.final_count,
      duplicates_removed = result.duplicates_removed,
      clusters = result.clusters_found,
      elapsed_secs = result.elapsed_secs,
      "processing pipeline complete"
    );

    Ok(Dataset {
      entries,
      source_lang: dataset.source_lang,
      target_lang: dataset.target_lang,
      result: Some(result),
    })
  }
}
