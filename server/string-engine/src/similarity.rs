//! Lexical similarity: TF-IDF over unigrams + bigrams, cosine distance.
//!
//! The vector space is scoped to a single call — nothing is fitted once and
//! reused across corpora. Vectorization never fails outward: a degenerate
//! corpus falls back to the identity matrix so callers always receive a
//! usable (if conservative) result.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Reserved token for texts too short to vectorize meaningfully.
const EMPTY_TOKEN: &str = "empty_text";

/// Vocabulary cap, highest document frequency wins.
const MAX_VOCABULARY: usize = 5000;

/// Common English function words, dropped before weighting.
const STOPWORDS: &[&str] = &[
  "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could",
  "did", "do", "does", "for", "from", "had", "has", "have", "if", "in",
  "is", "it", "its", "no", "not", "of", "on", "or", "so", "than", "that",
  "the", "their", "then", "this", "to", "too", "was", "were", "will",
  "with", "would",
];

static COLOR_TAG: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"(?i)<color="[^"]*">(.*?)</color>"#).expect("valid regex"));
static ANGLE_TAG: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"</?[a-zA-Z][^<>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip inline markup to its inner text and collapse whitespace runs, so
/// formatting differences do not depress similarity scores.
pub fn clean_text(text: &str) -> String {
  let text = COLOR_TAG.replace_all(text, "$1");
  let text = ANGLE_TAG.replace_all(&text, "");
  let text = WHITESPACE.replace_all(&text, " ");
  text.trim().to_string()
}

fn tokens(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
    .map(str::to_string)
    .collect()
}

/// Unigrams + bigrams of the cleaned text. Texts shorter than 2 chars map to
/// the reserved empty token so the vectorizer does not degenerate on them.
fn term_list(text: &str) -> Vec<String> {
  let cleaned = clean_text(text);
  if cleaned.chars().count() < 2 {
    return vec![EMPTY_TOKEN.to_string()];
  }
  let unigrams = tokens(&cleaned);
  let mut terms = unigrams.clone();
  terms.extend(unigrams.windows(2).map(|w| format!("{} {}", w[0], w[1])));
  terms
}

/// L2-normalized TF-IDF vectors, sparse and sorted by term index.
/// Returns `None` when the corpus yields no vocabulary at all.
fn vectorize(docs: &[Vec<String>]) -> Option<Vec<Vec<(u32, f64)>>> {
  // Document frequency, in first-seen term order.
  let mut order: Vec<String> = Vec::new();
  let mut df: HashMap<String, usize> = HashMap::new();
  for doc in docs {
    let unique: HashSet<&String> = doc.iter().collect();
    for term in unique {
      if !df.contains_key(term.as_str()) {
        order.push(term.clone());
      }
      *df.entry(term.clone()).or_insert(0) += 1;
    }
  }
  if order.is_empty() {
    return None;
  }

  // Cap the vocabulary: highest document frequency first, ties by first
  // appearance, so the selection is deterministic.
  if order.len() > MAX_VOCABULARY {
    let mut indexed: Vec<(usize, String)> = order.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| df[&b.1].cmp(&df[&a.1]).then(a.0.cmp(&b.0)));
    indexed.truncate(MAX_VOCABULARY);
    indexed.sort_by_key(|(first_seen, _)| *first_seen);
    order = indexed.into_iter().map(|(_, term)| term).collect();
  }

  let index: HashMap<&str, u32> = order
    .iter()
    .enumerate()
    .map(|(i, term)| (term.as_str(), i as u32))
    .collect();

  // Smoothed IDF, as the reference vectorizer computes it.
  let n = docs.len() as f64;
  let idf: Vec<f64> = order
    .iter()
    .map(|term| ((1.0 + n) / (1.0 + df[term] as f64)).ln() + 1.0)
    .collect();

  let vectors = docs
    .iter()
    .map(|doc| {
      let mut tf: HashMap<u32, f64> = HashMap::new();
      for term in doc {
        if let Some(&i) = index.get(term.as_str()) {
          *tf.entry(i).or_insert(0.0) += 1.0;
        }
      }
      let mut weights: Vec<(u32, f64)> = tf
        .into_iter()
        .map(|(i, count)| (i, count * idf[i as usize]))
        .collect();
      weights.sort_by_key(|(i, _)| *i);

      let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
      if norm > 0.0 {
        for (_, w) in &mut weights {
          *w /= norm;
        }
      }
      weights
    })
    .collect();

  Some(vectors)
}

/// Dot product of two sorted sparse vectors. Inputs are L2-normalized, so
/// this is their cosine similarity; zero vectors score 0.0 against anything.
fn sparse_dot(a: &[(u32, f64)], b: &[(u32, f64)]) -> f64 {
  let (mut i, mut j) = (0, 0);
  let mut dot = 0.0;
  while i < a.len() && j < b.len() {
    match a[i].0.cmp(&b[j].0) {
      std::cmp::Ordering::Less => i += 1,
      std::cmp::Ordering::Greater => j += 1,
      std::cmp::Ordering::Equal => {
        dot += a[i].1 * b[j].1;
        i += 1;
        j += 1;
      }
    }
  }
  dot
}

fn identity_matrix(n: usize) -> Vec<Vec<f64>> {
  let mut matrix = vec![vec![0.0; n]; n];
  for (i, row) in matrix.iter_mut().enumerate() {
    row[i] = 1.0;
  }
  matrix
}

/// Pairwise similarity matrix for the given texts: square, symmetric,
/// unit diagonal, entries in [0, 1]. Never fails.
pub fn similarity_matrix(texts: &[String]) -> Vec<Vec<f64>> {
  let n = texts.len();
  if n == 0 {
    return Vec::new();
  }

  let docs: Vec<Vec<String>> = texts.iter().map(|t| term_list(t)).collect();
  let vectors = match vectorize(&docs) {
    Some(v) => v,
    None => {
      tracing::debug!(texts = n, "degenerate corpus, falling back to identity matrix");
      return identity_matrix(n);
    }
  };

  let mut matrix = identity_matrix(n);
  for i in 0..n {
    for j in (i + 1)..n {
      let sim = sparse_dot(&vectors[i], &vectors[j]).clamp(0.0, 1.0);
      matrix[i][j] = sim;
      matrix[j][i] = sim;
    }
  }
  matrix
}

/// Similarity between two texts, defined via the two-element matrix call
/// for consistency with batch scoring.
pub fn pairwise_similarity(a: &str, b: &str) -> f64 {
  let matrix = similarity_matrix(&[a.to_string(), b.to_string()]);
  matrix[0][1]
}
