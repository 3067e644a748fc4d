//! Correlation strategies: reorder entries so related strings sit together
//! for consistency review, emitting cluster metadata alongside the order.
//!
//! Cluster membership is exclusive and greedy — once an entry is consumed by
//! a cluster it cannot join another, even a better-scoring one found later.
//! "First cluster wins" is the committed behavior, not an accident.

use std::collections::HashSet;

use crate::config::{Config, CorrelationStrategy};
use crate::similarity;
use crate::types::{ClusterKind, CorrelationCluster, Entry};

/// Substring cluster ids count from 0; semantic ids start here so the two
/// families never collide when both passes run.
const SEMANTIC_ID_BASE: u32 = 1000;

/// Reorder entries per the configured strategy. Identity passthrough on
/// 0 or 1 entries.
pub fn correlate(entries: &[Entry], config: &Config) -> (Vec<Entry>, Vec<CorrelationCluster>) {
  if entries.len() <= 1 {
    return (entries.to_vec(), Vec::new());
  }

  let (ordered, clusters) = match config.correlation_strategy {
    CorrelationStrategy::Alphabetical => (alphabetized(entries), Vec::new()),
    CorrelationStrategy::Occurrences => (by_occurrences(entries), Vec::new()),
    CorrelationStrategy::Substring => substring_sort(entries, config),
    CorrelationStrategy::Semantic => semantic_sort(entries, config),
    CorrelationStrategy::Hybrid => hybrid_sort(entries, config),
  };

  tracing::info!(
    strategy = ?config.correlation_strategy,
    entries = entries.len(),
    clusters = clusters.len(),
    "correlation sorting complete"
  );

  (ordered, clusters)
}

fn source_key(entry: &Entry) -> String {
  entry.source.to_lowercase()
}

fn text_len(entry: &Entry) -> usize {
  entry.source.chars().count()
}

fn alphabetize(entries: &mut [Entry]) {
  entries.sort_by(|a, b| source_key(a).cmp(&source_key(b)));
}

fn alphabetized(entries: &[Entry]) -> Vec<Entry> {
  let mut sorted = entries.to_vec();
  alphabetize(&mut sorted);
  sorted
}

fn by_occurrences(entries: &[Entry]) -> Vec<Entry> {
  let mut sorted = entries.to_vec();
  sorted.sort_by(|a, b| {
    b.occurrences
      .cmp(&a.occurrences)
      .then_with(|| source_key(a).cmp(&source_key(b)))
  });
  sorted
}

/// Substring pass: shortest texts seed clusters of longer texts that contain
/// them (case-insensitive, equal text excluded). Returns the clusters and
/// the ids they consumed.
fn substring_clusters(
  entries: &[Entry],
  config: &Config,
) -> (Vec<CorrelationCluster>, HashSet<String>) {
  let mut by_length: Vec<&Entry> = entries.iter().collect();
  by_length.sort_by_key(|e| text_len(e));

  let mut clusters: Vec<CorrelationCluster> = Vec::new();
  let mut used: HashSet<String> = HashSet::new();
  let mut next_id = 0u32;

  for (i, seed) in by_length.iter().enumerate() {
    if used.contains(&seed.id) {
      continue;
    }

    let seed_text = seed.source.trim().to_lowercase();
    if seed_text.chars().count() < config.min_substring_length {
      continue;
    }

    let mut members: Vec<Entry> = vec![(*seed).clone()];
    for candidate in &by_length[i + 1..] {
      if members.len() >= config.max_cluster_size {
        break;
      }
      if used.contains(&candidate.id) {
        continue;
      }
      let candidate_text = candidate.source.trim().to_lowercase();
      if candidate_text.contains(&seed_text) && candidate_text != seed_text {
        members.push((*candidate).clone());
      }
    }

    if members.len() > 1 {
      for member in &members {
        used.insert(member.id.clone());
      }
      clusters.push(CorrelationCluster {
        id: next_id,
        kind: ClusterKind::Substring,
        score: 1.0,
        members,
      });
      next_id += 1;
    }
  }

  (clusters, used)
}

fn substring_sort(entries: &[Entry], config: &Config) -> (Vec<Entry>, Vec<CorrelationCluster>) {
  let (clusters, used) = substring_clusters(entries, config);

  let mut ordered: Vec<Entry> = Vec::with_capacity(entries.len());
  for cluster in &clusters {
    let mut members = cluster.members.clone();
    members.sort_by_key(text_len);
    ordered.extend(members);
  }

  let mut unclustered: Vec<Entry> = entries
    .iter()
    .filter(|e| !used.contains(&e.id))
    .cloned()
    .collect();
  unclustered.sort_by(|a, b| {
    text_len(a)
      .cmp(&text_len(b))
      .then_with(|| a.source.cmp(&b.source))
  });
  ordered.extend(unclustered);

  (ordered, clusters)
}

/// Semantic pass: greedy scan in input order; each unused entry seeds a
/// cluster and absorbs later unused entries whose similarity to the seed
/// beats the threshold. Scores are the mean over all distinct member pairs,
/// read from the full matrix at the members' original indices.
fn semantic_clusters(entries: &[Entry], config: &Config) -> Vec<CorrelationCluster> {
  if entries.len() <= 1 {
    return Vec::new();
  }

  let texts: Vec<String> = entries.iter().map(|e| e.source.clone()).collect();
  let matrix = similarity::similarity_matrix(&texts);

  let mut clusters: Vec<CorrelationCluster> = Vec::new();
  let mut used: HashSet<usize> = HashSet::new();
  let mut next_id = SEMANTIC_ID_BASE;

  for i in 0..entries.len() {
    if used.contains(&i) {
      continue;
    }
    used.insert(i);

    let mut member_indices: Vec<usize> = vec![i];
    for j in (i + 1)..entries.len() {
      if member_indices.len() >= config.max_cluster_size {
        break;
      }
      if used.contains(&j) {
        continue;
      }
      if matrix[i][j] > config.similarity_threshold {
        member_indices.push(j);
        used.insert(j);
      }
    }

    if member_indices.len() > 1 {
      let mut pair_sum = 0.0;
      let mut pair_count = 0usize;
      for x in 0..member_indices.len() {
        for y in (x + 1)..member_indices.len() {
          pair_sum += matrix[member_indices[x]][member_indices[y]];
          pair_count += 1;
        }
      }
      clusters.push(CorrelationCluster {
        id: next_id,
        kind: ClusterKind::Semantic,
        score: pair_sum / pair_count as f64,
        members: member_indices.iter().map(|&ix| entries[ix].clone()).collect(),
      });
      next_id += 1;
    }
  }

  clusters
}

fn semantic_sort(entries: &[Entry], config: &Config) -> (Vec<Entry>, Vec<CorrelationCluster>) {
  let clusters = semantic_clusters(entries, config);

  let mut by_size: Vec<&CorrelationCluster> = clusters.iter().collect();
  by_size.sort_by(|a, b| b.size().cmp(&a.size()));

  let mut ordered: Vec<Entry> = Vec::with_capacity(entries.len());
  let mut clustered: HashSet<String> = HashSet::new();
  for cluster in by_size {
    let mut members = cluster.members.clone();
    alphabetize(&mut members);
    clustered.extend(members.iter().map(|e| e.id.clone()));
    ordered.extend(members);
  }

  let mut unclustered: Vec<Entry> = entries
    .iter()
    .filter(|e| !clustered.contains(&e.id))
    .cloned()
    .collect();
  alphabetize(&mut unclustered);
  ordered.extend(unclustered);

  (ordered, clusters)
}

/// Hybrid: substring pass over the full set, semantic pass over only what it
/// left behind. Exact containment beats fuzzier lexical similarity, and the
/// vector work is skipped for strings containment already explains.
fn hybrid_sort(entries: &[Entry], config: &Config) -> (Vec<Entry>, Vec<CorrelationCluster>) {
  let (mut clusters, used) = substring_clusters(entries, config);

  let remaining: Vec<Entry> = entries
    .iter()
    .filter(|e| !used.contains(&e.id))
    .cloned()
    .collect();
  clusters.extend(semantic_clusters(&remaining, config));

  // Substring clusters before semantic, biggest first within each family.
  let kind_rank = |c: &CorrelationCluster| match c.kind {
    ClusterKind::Substring => 0u8,
    ClusterKind::Semantic => 1,
  };
  let mut display: Vec<&CorrelationCluster> = clusters.iter().collect();
  display.sort_by(|a, b| {
    kind_rank(a)
      .cmp(&kind_rank(b))
      .then_with(|| b.size().cmp(&a.size()))
  });

  let mut ordered: Vec<Entry> = Vec::with_capacity(entries.len());
  let mut clustered: HashSet<String> = HashSet::new();
  for cluster in display {
    let mut members = cluster.members.clone();
    match cluster.kind {
      ClusterKind::Substring => members.sort_by_key(text_len),
      ClusterKind::Semantic => alphabetize(&mut members),
    }
    clustered.extend(members.iter().map(|e| e.id.clone()));
    ordered.extend(members);
  }

  let mut unclaimed: Vec<Entry> = entries
    .iter()
    .filter(|e| !clustered.contains(&e.id))
    .cloned()
    .collect();
  alphabetize(&mut unclaimed);
  ordered.extend(unclaimed);

  (ordered, clusters)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: &str, source: &str) -> Entry {
    Entry {
      id: id.to_string(),
      source: source.to_string(),
      target: None,
      source_lang: "EN".to_string(),
      target_lang: None,
      occurrences: 1,
    }
  }

  fn with_occurrences(id: &str, source: &str, occurrences: u32) -> Entry {
    Entry {
      occurrences,
      ..entry(id, source)
    }
  }

  fn ids(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
  }

  fn config_with(strategy: CorrelationStrategy) -> Config {
    Config {
      correlation_strategy: strategy,
      ..Config::default()
    }
  }

  #[test]
  fn zero_and_one_entries_pass_through() {
    let config = config_with(CorrelationStrategy::Hybrid);
    let (ordered, clusters) = correlate(&[], &config);
    assert!(ordered.is_empty());
    assert!(clusters.is_empty());

    let one = vec![entry("1", "Attack")];
    let (ordered, clusters) = correlate(&one, &config);
    assert_eq!(ids(&ordered), vec!["1"]);
    assert!(clusters.is_empty());
  }

  #[test]
  fn alphabetical_is_case_insensitive() {
    let entries = vec![entry("1", "banana"), entry("2", "Apple")];
    let config = config_with(CorrelationStrategy::Alphabetical);
    let (ordered, clusters) = correlate(&entries, &config);
    assert_eq!(ids(&ordered), vec!["2", "1"]);
    assert!(clusters.is_empty());
  }

  #[test]
  fn occurrence_sort_is_descending_then_alphabetical() {
    let entries = vec![
      with_occurrences("1", "Mana", 2),
      with_occurrences("2", "attack", 5),
      with_occurrences("3", "Defense", 2),
    ];
    let config = config_with(CorrelationStrategy::Occurrences);
    let (ordered, _) = correlate(&entries, &config);
    assert_eq!(ids(&ordered), vec!["2", "3", "1"]);
  }

  #[test]
  fn substring_clusters_shortest_seed_and_its_containers() {
    let entries = vec![
      entry("1", "Heal"),
      entry("2", "Heal Ally"),
      entry("3", "Heal Ally Fully"),
      entry("4", "Defense"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Substring,
      min_substring_length: 4,
      ..Config::default()
    };
    let (ordered, clusters) = correlate(&entries, &config);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].id, 0);
    assert_eq!(clusters[0].kind, ClusterKind::Substring);
    assert_eq!(clusters[0].size(), 3);
    assert!((clusters[0].score - 1.0).abs() < f64::EPSILON);

    // Every non-seed member contains the seed's trimmed text.
    let seed = clusters[0].members[0].source.trim().to_lowercase();
    for member in &clusters[0].members[1..] {
      assert!(member.source.trim().to_lowercase().contains(&seed));
    }

    // Cluster first (ascending length), unclustered after.
    assert_eq!(ids(&ordered), vec!["1", "2", "3", "4"]);
  }

  #[test]
  fn substring_seed_below_min_length_is_skipped() {
    let entries = vec![entry("1", "Heal"), entry("2", "Heal Ally")];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Substring,
      min_substring_length: 5,
      ..Config::default()
    };
    let (_, clusters) = correlate(&entries, &config);
    assert!(clusters.is_empty());
  }

  #[test]
  fn equal_text_is_not_a_proper_substring() {
    let entries = vec![entry("1", "Reload"), entry("2", "reload")];
    let config = config_with(CorrelationStrategy::Substring);
    let (_, clusters) = correlate(&entries, &config);
    assert!(clusters.is_empty());
  }

  #[test]
  fn substring_cluster_respects_max_size() {
    let entries = vec![
      entry("1", "skill"),
      entry("2", "skill a"),
      entry("3", "skill b"),
      entry("4", "skill c"),
      entry("5", "skill d"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Substring,
      max_cluster_size: 3,
      ..Config::default()
    };
    let (_, clusters) = correlate(&entries, &config);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].size(), 3);
  }

  #[test]
  fn semantic_high_threshold_yields_pure_alphabetical_order() {
    let entries = vec![
      entry("1", "Cherry"),
      entry("2", "Apple"),
      entry("3", "Durian"),
      entry("4", "Banana"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Semantic,
      similarity_threshold: 0.99,
      ..Config::default()
    };
    let (ordered, clusters) = correlate(&entries, &config);
    assert!(clusters.is_empty());
    assert_eq!(ids(&ordered), vec!["2", "4", "1", "3"]);
  }

  #[test]
  fn semantic_cluster_score_is_mean_pairwise_similarity() {
    let entries = vec![
      entry("1", "restore mana points quickly"),
      entry("2", "open inventory screen"),
      entry("3", "restore mana points slowly"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Semantic,
      similarity_threshold: 0.5,
      ..Config::default()
    };
    let (ordered, clusters) = correlate(&entries, &config);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].id, SEMANTIC_ID_BASE);
    assert_eq!(clusters[0].kind, ClusterKind::Semantic);
    assert_eq!(clusters[0].size(), 2);

    // Two members, so the mean pairwise score is the matrix entry for the
    // pair, computed over the same three-text corpus.
    let texts: Vec<String> = entries.iter().map(|e| e.source.clone()).collect();
    let matrix = similarity::similarity_matrix(&texts);
    assert!((clusters[0].score - matrix[0][2]).abs() < 1e-9);
    assert!(clusters[0].score > config.similarity_threshold);

    // Cluster alphabetized, unclustered appended alphabetized.
    assert_eq!(ids(&ordered), vec!["1", "3", "2"]);
  }

  #[test]
  fn hybrid_orders_substring_clusters_before_semantic() {
    let entries = vec![
      entry("1", "Zebra"),
      entry("2", "restore mana points quickly"),
      entry("3", "Heal Ally Fully"),
      entry("4", "Heal"),
      entry("5", "restore mana points slowly"),
      entry("6", "Heal Ally"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Hybrid,
      similarity_threshold: 0.5,
      min_substring_length: 4,
      ..Config::default()
    };
    let (ordered, clusters) = correlate(&entries, &config);

    assert_eq!(clusters.len(), 2);
    let substring = clusters.iter().find(|c| c.kind == ClusterKind::Substring).unwrap();
    let semantic = clusters.iter().find(|c| c.kind == ClusterKind::Semantic).unwrap();
    assert_eq!(substring.id, 0);
    assert_eq!(semantic.id, SEMANTIC_ID_BASE);
    assert_eq!(substring.size(), 3);
    assert_eq!(semantic.size(), 2);

    // Substring cluster by ascending length, semantic alphabetized,
    // unclaimed entries last.
    assert_eq!(ids(&ordered), vec!["4", "6", "3", "2", "5", "1"]);
  }

  #[test]
  fn no_entry_appears_in_two_clusters() {
    let entries = vec![
      entry("1", "Heal"),
      entry("2", "Heal Ally"),
      entry("3", "Heal Ally Fully"),
      entry("4", "restore mana points quickly"),
      entry("5", "restore mana points slowly"),
      entry("6", "Defense"),
    ];
    let config = Config {
      correlation_strategy: CorrelationStrategy::Hybrid,
      similarity_threshold: 0.5,
      min_substring_length: 4,
      ..Config::default()
    };
    let (ordered, clusters) = correlate(&entries, &config);

    let mut seen: HashSet<&str> = HashSet::new();
    for cluster in &clusters {
      for member in &cluster.members {
        assert!(seen.insert(member.id.as_str()), "entry {} in two clusters", member.id);
      }
    }
    // The order is a permutation of the input.
    assert_eq!(ordered.len(), entries.len());
    let mut sorted_ids = ids(&ordered);
    sorted_ids.sort_unstable();
    assert_eq!(sorted_ids, vec!["1", "2", "3", "4", "5", "6"]);
  }
}
