//! Stable fingerprint computation for dedup keys and run identifiers.

/// Fingerprint a (source, target) dedup key. Uses blake3 for a fast,
/// deterministic hash; first 16 bytes (32 hex chars) keep the ID compact.
pub fn pair_fingerprint(source: &str, target: &str) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(source.as_bytes());
  hasher.update(b"|");
  hasher.update(target.as_bytes());
  let hex = hasher.finalize().to_hex();
  hex[..32].to_string()
}

/// Fingerprint a source-only dedup key.
pub fn source_fingerprint(source: &str) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(source.as_bytes());
  let hex = hasher.finalize().to_hex();
  hex[..32].to_string()
}

/// Fingerprint an ordered text list. Callers that cache expensive similarity
/// results should key the cache on this, not on anything inside the engine.
pub fn content_fingerprint<'a, I>(texts: I) -> String
where
  I: IntoIterator<Item = &'a str>,
{
  let mut hasher = blake3::Hasher::new();
  for text in texts {
    hasher.update(text.as_bytes());
    hasher.update(b"\n");
  }
  let hex = hasher.finalize().to_hex();
  hex[..32].to_string()
}

/// Stable run id for a dataset: same entries in the same order, same id.
pub fn run_id<'a, I>(texts: I) -> String
where
  I: IntoIterator<Item = &'a str>,
{
  format!("run-{}", &content_fingerprint(texts)[..16])
}
