//! Binary entrypoint: read JSON lines from stdin, write JSON lines to stdout.
//!
//! Each input line is a ProcessRequest (entries + config). Output lines are
//! either a ProcessResponse (the reordered dataset plus statistics) or an
//! ErrorOutput (when parsing or validation fails). Diagnostics go to stderr
//! via tracing so stdout stays protocol-clean.

use std::io::{self, BufRead, Write};

use string_engine::types::{Dataset, Entry, ErrorOutput, ProcessResponse};
use string_engine::{Engine, EngineError, ProcessRequest};

fn dataset_from_request(request: &ProcessRequest) -> Dataset {
  let entries = request
    .entries
    .iter()
    .map(|raw| Entry {
      id: raw.id.clone(),
      source: raw.source.clone(),
      target: raw.target.clone(),
      source_lang: request.source_lang.clone(),
      target_lang: request.target_lang.clone(),
      occurrences: raw.occurrences.unwrap_or(1).max(1),
    })
    .collect();
  Dataset::new(entries, request.source_lang.clone(), request.target_lang.clone())
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "string-engine: read error: {}", e);
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    // Parse the request.
    let request: ProcessRequest = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    // Run the pipeline.
    let engine = Engine::new(request.config.clone());
    match engine.process(dataset_from_request(&request)) {
      Ok(processed) => {
        let response = ProcessResponse::from_dataset(&processed);
        let _ = serde_json::to_writer(&mut out, &response);
        let _ = writeln!(out);
      }
      Err(e) => {
        let err = match &e {
          EngineError::Validation { field, reason } => {
            ErrorOutput::new(reason.clone()).with_field(field.clone())
          }
          _ => ErrorOutput::new(e.to_string()),
        };
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
      }
    }
  }

  let _ = out.flush();
}
