//! sheet-process: run the stringZ pipeline over a CSV export
//!
//! Usage:
//!   sheet-process <in.csv> <out.csv> [options]
//!
//! Options:
//!   --strategy <name>     correlation strategy (alphabetical, occurrences,
//!                         substring, semantic, hybrid; default hybrid)
//!   --dedup <name>        dedup strategy (keep_first_with_occurrences,
//!                         keep_first, keep_best)
//!   --no-dedup            skip the deduplication stage
//!   --no-correlate        skip the correlation stage
//!   --threshold <f>       semantic similarity threshold (default 0.7)
//!   --min-substring <n>   minimum substring seed length (default 5)
//!   --max-cluster <n>     cluster size cap (default 15)
//!   --id-col <name>       id column (default strId)
//!   --source-col <name>   source text column (default EN)
//!   --target-col <name>   target text column (default: auto-detect)
//!
//! Reads the sheet, deduplicates and reorders it for consistency review,
//! writes the result in review order, and prints a stats summary to stderr.

use std::env;
use std::fs::File;
use std::process;

use string_engine::io::{read_dataset, write_dataset, ColumnSpec};
use string_engine::{Config, CorrelationStrategy, DedupStrategy, Engine};

fn usage() -> ! {
    eprintln!("Usage: sheet-process <in.csv> <out.csv> [options]");
    eprintln!("  --strategy <name>     alphabetical|occurrences|substring|semantic|hybrid");
    eprintln!("  --dedup <name>        keep_first_with_occurrences|keep_first|keep_best");
    eprintln!("  --no-dedup            skip deduplication");
    eprintln!("  --no-correlate        skip correlation sorting");
    eprintln!("  --threshold <f>       semantic similarity threshold");
    eprintln!("  --min-substring <n>   minimum substring seed length");
    eprintln!("  --max-cluster <n>     cluster size cap");
    eprintln!("  --id-col / --source-col / --target-col <name>");
    process::exit(2);
}

fn correlation_strategy(name: &str) -> CorrelationStrategy {
    match name {
        "alphabetical" => CorrelationStrategy::Alphabetical,
        "occurrences" => CorrelationStrategy::Occurrences,
        "substring" => CorrelationStrategy::Substring,
        "semantic" => CorrelationStrategy::Semantic,
        "hybrid" => CorrelationStrategy::Hybrid,
        other => {
            eprintln!("sheet-process: unknown correlation strategy '{}'", other);
            process::exit(2);
        }
    }
}

fn dedup_strategy(name: &str) -> DedupStrategy {
    match name {
        "keep_first_with_occurrences" => DedupStrategy::KeepFirstWithOccurrences,
        "keep_first" => DedupStrategy::KeepFirst,
        "keep_best" => DedupStrategy::KeepBest,
        other => {
            eprintln!("sheet-process: unknown dedup strategy '{}'", other);
            process::exit(2);
        }
    }
}

fn option_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("sheet-process: {} requires a value", flag);
            process::exit(2);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut files: Vec<String> = Vec::new();
    let mut config = Config::default();
    let mut spec = ColumnSpec::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--strategy" => {
                config.correlation_strategy =
                    correlation_strategy(&option_value(&args, &mut i, "--strategy"))
            }
            "--dedup" => config.dedup_strategy = dedup_strategy(&option_value(&args, &mut i, "--dedup")),
            "--no-dedup" => config.remove_duplicates = false,
            "--no-correlate" => config.sort_by_correlation = false,
            "--threshold" => {
                config.similarity_threshold = option_value(&args, &mut i, "--threshold")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("sheet-process: --threshold expects a number");
                        process::exit(2);
                    })
            }
            "--min-substring" => {
                config.min_substring_length = option_value(&args, &mut i, "--min-substring")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("sheet-process: --min-substring expects an integer");
                        process::exit(2);
                    })
            }
            "--max-cluster" => {
                config.max_cluster_size = option_value(&args, &mut i, "--max-cluster")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("sheet-process: --max-cluster expects an integer");
                        process::exit(2);
                    })
            }
            "--id-col" => spec.id = option_value(&args, &mut i, "--id-col"),
            "--source-col" => spec.source = option_value(&args, &mut i, "--source-col"),
            "--target-col" => spec.target = Some(option_value(&args, &mut i, "--target-col")),
            flag if flag.starts_with('-') => {
                eprintln!("sheet-process: unknown option '{}'", flag);
                usage();
            }
            positional => files.push(positional.to_string()),
        }
        i += 1;
    }

    if files.len() != 2 {
        usage();
    }

    let input = File::open(&files[0]).unwrap_or_else(|e| {
        eprintln!("sheet-process: cannot read {}: {}", files[0], e);
        process::exit(2);
    });
    let dataset = read_dataset(input, &spec).unwrap_or_else(|e| {
        eprintln!("sheet-process: {}: {}", files[0], e);
        process::exit(2);
    });

    let engine = Engine::new(config);
    let processed = match engine.process(dataset) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("sheet-process: {}", e);
            process::exit(1);
        }
    };

    let output = File::create(&files[1]).unwrap_or_else(|e| {
        eprintln!("sheet-process: cannot write {}: {}", files[1], e);
        process::exit(2);
    });
    if let Err(e) = write_dataset(output, &processed, &spec) {
        eprintln!("sheet-process: {}: {}", files[1], e);
        process::exit(1);
    }

    if let Some(result) = &processed.result {
        eprintln!(
            "sheet-process: {} -> {} entries ({} duplicates removed, {} clusters) in {:.2}s",
            result.original_count,
            result.final_count,
            result.duplicates_removed,
            result.clusters_found,
            result.elapsed_secs
        );
    }
}
