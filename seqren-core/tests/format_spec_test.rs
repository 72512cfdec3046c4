use proptest::prelude::*;
use seqren_core::FormatSpec;

#[test]
fn test_wildcards_copy_source_text() {
    let spec = FormatSpec::parse("??_*_##");
    assert_eq!(spec.format_name("holiday.jpg", 3, None).text, "ho_liday_03.jpg");
}

#[test]
fn test_extension_rules() {
    assert_eq!(FormatSpec::parse("n_#").format_name("a.txt", 1, None).text, "n_1.txt");
    assert_eq!(FormatSpec::parse("n_#.").format_name("a.txt", 1, None).text, "n_1");
    assert_eq!(FormatSpec::parse("n_#.bak").format_name("a.txt", 1, None).text, "n_1.bak");
    assert_eq!(FormatSpec::parse("n.#").format_name("a.txt", 4, None).text, "n.4");
}

#[test]
fn test_dup_decorator_goes_before_extension() {
    let spec = FormatSpec::parse("*");
    assert_eq!(spec.format_name("a.txt", 1, Some(2)).text, "a_(2).txt");
}

#[test]
fn test_question_mark_past_source_warns() {
    let out = FormatSpec::parse("???_#").format_name("ab.txt", 1, None);
    assert_eq!(out.text, "ab_1.txt");
    assert_eq!(out.warnings.len(), 1);
    assert!(!out.is_clean());
}

#[test]
fn test_parse_seq_count_examples() {
    let spec = FormatSpec::parse("IMG_####");
    assert_eq!(spec.parse_seq_count("IMG_0042.jpg"), Some(42));
    assert_eq!(spec.parse_seq_count("IMG_12345.jpg"), Some(12345));
    assert_eq!(spec.parse_seq_count("DSC_0042.jpg"), None);
    assert_eq!(FormatSpec::parse("*").parse_seq_count("a.txt"), None);
}

#[test]
fn test_validation() {
    assert!(FormatSpec::parse("photo").validate().is_err());
    assert!(FormatSpec::parse("photo.*").validate().is_ok());
    assert!(FormatSpec::parse("photo_%03d").validate().is_ok());
}

proptest! {
    #[test]
    fn prop_hash_counter_round_trips(seed in "[g-z_ ]{1,12}", width in 1usize..6, counter in 0u32..100_000) {
        let pattern = format!("*_{}", "#".repeat(width));
        let spec = FormatSpec::parse(&pattern);
        let name = spec.format_name(&format!("{seed}.txt"), counter, None).text;
        prop_assert_eq!(spec.parse_seq_count(&name), Some(counter));
    }

    #[test]
    fn prop_printf_counter_round_trips(
        seed in "[g-z_ ]{1,12}",
        conversion in prop::sample::select(vec!["%d", "%03d", "%x", "%04X", "%o"]),
        counter in 0u32..1_000_000,
    ) {
        let spec = FormatSpec::parse(&format!("*_{conversion}"));
        let name = spec.format_name(&format!("{seed}.dat"), counter, None).text;
        prop_assert_eq!(spec.parse_seq_count(&name), Some(counter));
    }

    #[test]
    fn prop_counter_in_extension_round_trips(seed in "[g-z]{1,8}", counter in 0u32..1000) {
        let spec = FormatSpec::parse("*.###");
        let name = spec.format_name(&format!("{seed}.raw"), counter, None).text;
        prop_assert_eq!(spec.parse_seq_count(&name), Some(counter));
    }
}
