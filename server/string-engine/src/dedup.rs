//! Deduplication strategies: collapse entries sharing a key into one kept
//! entry, recording the collapsed groups for review.

use std::collections::HashMap;

use crate::config::DedupStrategy;
use crate::fingerprint;
use crate::types::{DuplicateGroup, Entry};

/// Collapse duplicates per the chosen strategy.
///
/// Returns the kept entries and a DuplicateGroup per collapsed group (only
/// groups with more than one member are recorded). An input without
/// duplicates round-trips: same entries out, no groups.
pub fn deduplicate(entries: &[Entry], strategy: DedupStrategy) -> (Vec<Entry>, Vec<DuplicateGroup>) {
  let (unique, groups) = match strategy {
    DedupStrategy::KeepFirstWithOccurrences => keep_first_with_occurrences(entries),
    DedupStrategy::KeepFirst => keep_first(entries),
    DedupStrategy::KeepBest => keep_best(entries),
  };

  tracing::info!(
    original = entries.len(),
    unique = unique.len(),
    removed = entries.len() - unique.len(),
    groups = groups.len(),
    "deduplication complete"
  );

  (unique, groups)
}

/// Group entries by a fingerprint key, preserving first-seen group order.
/// Hash maps do not guarantee iteration order, so the order is carried in an
/// explicit key list.
fn group_in_order<F>(entries: &[Entry], key: F) -> (Vec<String>, HashMap<String, Vec<Entry>>)
where
  F: Fn(&Entry) -> String,
{
  let mut order: Vec<String> = Vec::new();
  let mut groups: HashMap<String, Vec<Entry>> = HashMap::new();
  for entry in entries {
    let k = key(entry);
    if !groups.contains_key(&k) {
      order.push(k.clone());
    }
    groups.entry(k).or_default().push(entry.clone());
  }
  (order, groups)
}

/// Primary strategy: key on (trimmed source, trimmed target), a blank or
/// missing target reading as "". One new entry per group carries the first
/// member's fields with the group's accumulated occurrence count, so
/// re-running the pass on its own output changes nothing.
fn keep_first_with_occurrences(entries: &[Entry]) -> (Vec<Entry>, Vec<DuplicateGroup>) {
  let (order, mut groups) = group_in_order(entries, |e| {
    fingerprint::pair_fingerprint(e.source.trim(), e.target_trimmed())
  });

  let mut unique: Vec<Entry> = Vec::with_capacity(order.len());
  let mut duplicate_groups: Vec<DuplicateGroup> = Vec::new();

  for key in order {
    let members = match groups.remove(&key) {
      Some(m) => m,
      None => continue,
    };
    let occurrences: u32 = members.iter().map(|e| e.occurrences).sum();
    let kept = Entry {
      occurrences,
      ..members[0].clone()
    };

    if members.len() > 1 {
      duplicate_groups.push(DuplicateGroup {
        fingerprint: key,
        source: members[0].source.trim().to_string(),
        members,
        kept: Some(kept.clone()),
      });
    }
    unique.push(kept);
  }

  // Descending occurrences; the sort is stable, so ties keep first-seen order.
  unique.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

  (unique, duplicate_groups)
}

/// Key on source text only; the first member survives verbatim.
fn keep_first(entries: &[Entry]) -> (Vec<Entry>, Vec<DuplicateGroup>) {
  let (order, mut groups) = group_in_order(entries, |e| fingerprint::source_fingerprint(&e.source));

  let mut unique: Vec<Entry> = Vec::with_capacity(order.len());
  let mut duplicate_groups: Vec<DuplicateGroup> = Vec::new();

  for key in order {
    let members = match groups.remove(&key) {
      Some(m) => m,
      None => continue,
    };
    let kept = members[0].clone();
    if members.len() > 1 {
      duplicate_groups.push(DuplicateGroup {
        fingerprint: key,
        source: kept.source.clone(),
        members,
        kept: Some(kept.clone()),
      });
    }
    unique.push(kept);
  }

  (unique, duplicate_groups)
}

/// Key on source text only; survival goes to the best target: non-blank
/// beats blank, then longest trimmed text. First of equals wins, so the
/// choice is deterministic.
fn keep_best(entries: &[Entry]) -> (Vec<Entry>, Vec<DuplicateGroup>) {
  let (order, mut groups) = group_in_order(entries, |e| fingerprint::source_fingerprint(&e.source));

  let mut unique: Vec<Entry> = Vec::with_capacity(order.len());
  let mut duplicate_groups: Vec<DuplicateGroup> = Vec::new();

  for key in order {
    let members = match groups.remove(&key) {
      Some(m) => m,
      None => continue,
    };
    let kept = best_of(&members).clone();
    if members.len() > 1 {
      duplicate_groups.push(DuplicateGroup {
        fingerprint: key,
        source: kept.source.clone(),
        members,
        kept: Some(kept.clone()),
      });
    }
    unique.push(kept);
  }

  (unique, duplicate_groups)
}

fn best_of(members: &[Entry]) -> &Entry {
  let quality = |e: &Entry| (e.has_target(), e.target_trimmed().chars().count());
  let mut best = &members[0];
  for candidate in &members[1..] {
    if quality(candidate) > quality(best) {
      best = candidate;
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: &str, source: &str, target: Option<&str>) -> Entry {
    Entry {
      id: id.to_string(),
      source: source.to_string(),
      target: target.map(str::to_string),
      source_lang: "EN".to_string(),
      target_lang: target.map(|_| "DE".to_string()),
      occurrences: 1,
    }
  }

  #[test]
  fn occurrences_sum_to_input_length() {
    let entries = vec![
      entry("1", "Attack", Some("Angriff")),
      entry("2", "Attack", Some("Angriff")),
      entry("3", "Defense", None),
      entry("4", "Attack", Some("Angriff")),
      entry("5", "Defense", None),
    ];
    let (unique, groups) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);

    let total: u32 = unique.iter().map(|e| e.occurrences).sum();
    assert_eq!(total as usize, entries.len());
    assert_eq!(unique.len(), 2);
    assert_eq!(groups.len(), 2);
    // Highest occurrence count first.
    assert_eq!(unique[0].source, "Attack");
    assert_eq!(unique[0].occurrences, 3);
  }

  #[test]
  fn same_source_different_target_stays_distinct() {
    let entries = vec![
      entry("1", "Attack Power", None),
      entry("2", "Attack Power", Some("X")),
      entry("3", "Defense", None),
    ];
    let (unique, groups) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);
    assert_eq!(unique.len(), 3);
    assert!(groups.is_empty());
  }

  #[test]
  fn blank_target_groups_with_missing_target() {
    let entries = vec![
      entry("1", "Attack", Some("   ")),
      entry("2", "Attack", None),
    ];
    let (unique, groups) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].id, "1");
    assert_eq!(unique[0].occurrences, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 2);
  }

  #[test]
  fn rerun_on_own_output_is_a_no_op() {
    let entries = vec![
      entry("1", "Attack", None),
      entry("2", "Attack", None),
      entry("3", "Defense", None),
      entry("4", "Defense", None),
      entry("5", "Defense", None),
    ];
    let (first, _) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);
    let (second, groups) = deduplicate(&first, DedupStrategy::KeepFirstWithOccurrences);

    assert_eq!(second, first, "second pass must not change entries");
    assert!(groups.is_empty());
  }

  #[test]
  fn seeded_occurrence_counts_accumulate() {
    let mut a = entry("1", "Attack", None);
    a.occurrences = 4;
    let entries = vec![a, entry("2", "Attack", None)];
    let (unique, _) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].occurrences, 5);
  }

  #[test]
  fn descending_order_with_stable_ties() {
    let entries = vec![
      entry("1", "Mana", None),
      entry("2", "Attack", None),
      entry("3", "Attack", None),
      entry("4", "Stamina", None),
    ];
    let (unique, _) = deduplicate(&entries, DedupStrategy::KeepFirstWithOccurrences);
    assert_eq!(unique[0].source, "Attack");
    // Singletons keep first-seen order between themselves.
    assert_eq!(unique[1].source, "Mana");
    assert_eq!(unique[2].source, "Stamina");
  }

  #[test]
  fn keep_first_ignores_target_and_keeps_verbatim() {
    let entries = vec![
      entry("1", "Attack", None),
      entry("2", "Attack", Some("Angriff")),
    ];
    let (unique, groups) = deduplicate(&entries, DedupStrategy::KeepFirst);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].id, "1");
    assert_eq!(unique[0].occurrences, 1, "no occurrence rewrite");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kept.as_ref().unwrap().id, "1");
  }

  #[test]
  fn keep_best_prefers_non_blank_then_longest_target() {
    let entries = vec![
      entry("1", "Attack", None),
      entry("2", "Attack", Some("kurz")),
      entry("3", "Attack", Some("deutlich länger")),
      entry("4", "Attack", Some("")),
    ];
    let (unique, groups) = deduplicate(&entries, DedupStrategy::KeepBest);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].id, "3");
    assert_eq!(groups[0].members.len(), 4);
  }

  #[test]
  fn keep_best_tie_goes_to_first_member() {
    let entries = vec![
      entry("1", "Attack", Some("abcd")),
      entry("2", "Attack", Some("wxyz")),
    ];
    let (unique, _) = deduplicate(&entries, DedupStrategy::KeepBest);
    assert_eq!(unique[0].id, "1");
  }

  #[test]
  fn no_duplicates_yields_no_groups() {
    let entries = vec![entry("1", "Attack", None), entry("2", "Defense", None)];
    for strategy in [
      DedupStrategy::KeepFirstWithOccurrences,
      DedupStrategy::KeepFirst,
      DedupStrategy::KeepBest,
    ] {
      let (unique, groups) = deduplicate(&entries, strategy);
      assert_eq!(unique.len(), entries.len());
      assert!(groups.is_empty());
    }
  }
}
