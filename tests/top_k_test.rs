//! Top-k selection ordering and edge cases.

use topcolors::analysis::top_k;

fn keys<K: Clone, C>(ranked: &[(K, C)]) -> Vec<K> {
    ranked.iter().map(|(k, _)| k.clone()).collect()
}

#[test]
fn picks_three_highest_in_order() {
    let table = vec![
        ("#FFFFFF", 10),
        ("#000000", 7),
        ("#FF0000", 3),
        ("#00FF00", 1),
    ];
    assert_eq!(
        keys(&top_k(table, 3)),
        vec!["#FFFFFF", "#000000", "#FF0000"]
    );
}

#[test]
fn input_order_does_not_matter_without_ties() {
    let table = vec![
        ("#00FF00", 1),
        ("#FF0000", 3),
        ("#FFFFFF", 10),
        ("#000000", 7),
    ];
    assert_eq!(
        keys(&top_k(table, 3)),
        vec!["#FFFFFF", "#000000", "#FF0000"]
    );
}

#[test]
fn ties_go_to_first_seen() {
    let table = vec![("b", 2), ("a", 5), ("c", 2), ("d", 2)];
    assert_eq!(keys(&top_k(table, 3)), vec!["a", "b", "c"]);
}

#[test]
fn all_equal_counts_keep_input_order() {
    let table: Vec<_> = (0..20).map(|i| (i, 1u64)).collect();
    assert_eq!(keys(&top_k(table, 3)), vec![0, 1, 2]);
}

#[test]
fn fewer_entries_than_k() {
    let got = top_k(vec![("x", 4), ("y", 9)], 3);
    assert_eq!(got, vec![("y", 9), ("x", 4)]);
}

#[test]
fn empty_input() {
    let got: Vec<(&str, u32)> = top_k(Vec::new(), 3);
    assert!(got.is_empty());
}

#[test]
fn large_table_matches_full_sort() {
    // Counts are distinct, so the full sort is an unambiguous reference.
    let table: Vec<(u32, u64)> = (0..1000u32)
        .map(|i| (i, u64::from((i * 7919) % 1009)))
        .collect();

    let mut sorted = table.clone();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    assert_eq!(top_k(table, 5), sorted[..5].to_vec());
}
