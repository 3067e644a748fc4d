//! CSV adapters: map sheet rows to entries and back.
//!
//! The writer reproduces the dataset's post-pipeline order exactly — review
//! order is a user-facing guarantee.

use std::io::{Read, Write};

use crate::error::EngineError;
use crate::types::{Dataset, Entry};

/// Column names binding a sheet to the entry model. Defaults mirror the
/// sheets this tool is fed ("strId" / "EN" / "Occurrences"); a missing
/// target column is auto-detected as the first unclaimed header.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
  pub id: String,
  pub source: String,
  pub target: Option<String>,
  pub occurrences: String,
}

impl Default for ColumnSpec {
  fn default() -> Self {
    Self {
      id: "strId".to_string(),
      source: "EN".to_string(),
      target: None,
      occurrences: "Occurrences".to_string(),
    }
  }
}

/// Read a dataset from CSV. Rows missing an identifier or source text are
/// skipped; an occurrences column, when present, seeds the counts.
pub fn read_dataset<R: Read>(reader: R, spec: &ColumnSpec) -> Result<Dataset, EngineError> {
  let mut csv_reader = csv::Reader::from_reader(reader);
  let headers = csv_reader.headers()?.clone();

  let find = |name: &str| headers.iter().position(|h| h == name);

  let id_idx = find(&spec.id).ok_or_else(|| {
    EngineError::validation("columns", &format!("missing id column '{}'", spec.id))
  })?;
  let source_idx = find(&spec.source).ok_or_else(|| {
    EngineError::validation("columns", &format!("missing source column '{}'", spec.source))
  })?;
  let occurrences_idx = find(&spec.occurrences);

  // Explicit target column, or the first header not claimed by anything else.
  let (target_idx, target_lang) = match &spec.target {
    Some(name) => {
      let idx = find(name).ok_or_else(|| {
        EngineError::validation("columns", &format!("missing target column '{name}'"))
      })?;
      (Some(idx), Some(name.clone()))
    }
    None => {
      let detected = headers
        .iter()
        .enumerate()
        .find(|(i, _)| *i != id_idx && *i != source_idx && Some(*i) != occurrences_idx)
        .map(|(i, h)| (i, h.to_string()));
      match detected {
        Some((idx, name)) => (Some(idx), Some(name)),
        None => (None, None),
      }
    }
  };

  let mut entries: Vec<Entry> = Vec::new();
  for record in csv_reader.records() {
    let record = record?;
    let id = record.get(id_idx).unwrap_or("").trim();
    let source = record.get(source_idx).unwrap_or("");
    if id.is_empty() || source.trim().is_empty() {
      continue;
    }

    let target = target_idx
      .and_then(|i| record.get(i))
      .map(str::to_string)
      .filter(|t| !t.is_empty());

    let occurrences = occurrences_idx
      .and_then(|i| record.get(i))
      .and_then(|v| v.trim().parse::<u32>().ok())
      .filter(|&v| v >= 1)
      .unwrap_or(1);

    entries.push(Entry {
      id: id.to_string(),
      source: source.to_string(),
      target,
      source_lang: spec.source.clone(),
      target_lang: target_lang.clone(),
      occurrences,
    });
  }

  tracing::debug!(entries = entries.len(), "dataset loaded from csv");

  Ok(Dataset::new(entries, spec.source.clone(), target_lang))
}

/// Write a dataset back to CSV in its exact entry order, with occurrence
/// counts in a dedicated column.
pub fn write_dataset<W: Write>(
  writer: W,
  dataset: &Dataset,
  spec: &ColumnSpec,
) -> Result<(), EngineError> {
  let mut csv_writer = csv::Writer::from_writer(writer);

  let mut header: Vec<&str> = vec![spec.id.as_str(), dataset.source_lang.as_str()];
  if let Some(target_lang) = &dataset.target_lang {
    header.push(target_lang.as_str());
  }
  header.push(spec.occurrences.as_str());
  csv_writer.write_record(&header)?;

  for entry in &dataset.entries {
    let occurrences = entry.occurrences.to_string();
    let mut row: Vec<&str> = vec![entry.id.as_str(), entry.source.as_str()];
    if dataset.target_lang.is_some() {
      row.push(entry.target.as_deref().unwrap_or(""));
    }
    row.push(occurrences.as_str());
    csv_writer.write_record(&row)?;
  }

  csv_writer.flush()?;
  Ok(())
}
