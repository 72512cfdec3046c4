use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use seqren_core::{DestinationPathGenerator, Error, FormatSpec, GenerateOptions};
use tempfile::TempDir;

fn options(dest_dir: &str) -> GenerateOptions {
    GenerateOptions {
        check_existing: false,
        dest_dir: Some(PathBuf::from(dest_dir)),
        case_insensitive: false,
        ..GenerateOptions::default()
    }
}

#[test]
fn test_sequence_follows_source_order() {
    let temp_dir = TempDir::new().unwrap();
    let names = ["c.jpg", "a.jpg", "b.jpg"];
    let sources: Vec<PathBuf> = names.iter().map(|n| temp_dir.path().join(n)).collect();
    for source in &sources {
        fs::write(source, "x").unwrap();
    }

    let generator = DestinationPathGenerator::new(
        FormatSpec::parse("IMG_%03d"),
        GenerateOptions {
            start: 10,
            ..GenerateOptions::default()
        },
    )
    .unwrap();
    let generated = generator.generate(&sources).unwrap();

    assert_eq!(generated.pairs[&sources[0]], temp_dir.path().join("IMG_010.jpg"));
    assert_eq!(generated.pairs[&sources[1]], temp_dir.path().join("IMG_011.jpg"));
    assert_eq!(generated.pairs[&sources[2]], temp_dir.path().join("IMG_012.jpg"));
    assert_eq!(generated.next_counter, 13);
}

#[test]
fn test_without_unique_duplicates_are_kept() {
    let generator = DestinationPathGenerator::new(
        FormatSpec::parse("*"),
        GenerateOptions {
            unique: false,
            ..options("/out")
        },
    )
    .unwrap();
    let sources = vec![PathBuf::from("/a/f.txt"), PathBuf::from("/b/f.txt")];
    let generated = generator.generate(&sources).unwrap();
    assert_eq!(generated.pairs[&sources[0]], generated.pairs[&sources[1]]);
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let err = DestinationPathGenerator::new(FormatSpec::parse("static"), GenerateOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
}

#[test]
fn test_next_available_counter_skips_existing() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("shot.png");
    fs::write(&source, "x").unwrap();
    for n in 1..=3 {
        fs::write(temp_dir.path().join(format!("pic{n}.png")), "").unwrap();
    }

    let generator =
        DestinationPathGenerator::new(FormatSpec::parse("pic#"), GenerateOptions::default()).unwrap();
    assert_eq!(generator.find_next_avail_seq_count(&[source]).unwrap(), 4);
}

proptest! {
    #[test]
    fn prop_unique_destinations_are_distinct(names in prop::collection::vec("[a-c]{1,2}", 1..20)) {
        // Every source lands in one directory under its own name, so equal
        // names collide and need the decorator.
        let sources: Vec<PathBuf> = names
            .iter()
            .enumerate()
            .map(|(i, name)| PathBuf::from(format!("/src/{i}/{name}.txt")))
            .collect();
        let generator = DestinationPathGenerator::new(FormatSpec::parse("*"), options("/out")).unwrap();
        let generated = generator.generate(&sources).unwrap();

        let dests: HashSet<&PathBuf> = generated.pairs.values().collect();
        prop_assert_eq!(dests.len(), sources.len());
    }
}
