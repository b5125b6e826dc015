use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

fn validate_tree<V>(t: &RadixMap<V>) {
    let root = &t.nodes[NodeId::ROOT];
    assert_eq!((root.start, root.end), (0, 0), "root must have an empty span");

    let mut stack: Vec<(NodeId, Vec<u8>)> = vec![(NodeId::ROOT, Vec::new())];
    let mut reachable = 0usize;
    let mut values = 0usize;

    while let Some((id, path)) = stack.pop() {
        reachable += 1;
        let node = &t.nodes[id];

        if id != NodeId::ROOT {
            assert!(node.end > node.start, "non-root node with empty span");
            assert!(
                node.value.is_some() || node.child_count() >= 2,
                "value-less node with {} children should have been merged",
                node.child_count()
            );
        }

        if node.value.is_some() {
            values += 1;
            assert_eq!(node.key().as_bytes(), path.as_slice(), "key must spell the path");
        }

        for child_id in node.children() {
            let child = &t.nodes[child_id];
            assert_eq!(child.start, node.end, "child must start where parent ends");
            assert_eq!(
                node.child(child.span()[0]),
                Some(child_id),
                "child must be keyed by its first byte"
            );
            let mut child_path = path.clone();
            child_path.extend_from_slice(child.span());
            stack.push((child_id, child_path));
        }
    }

    assert_eq!(values, t.len(), "len must count value nodes");
    assert_eq!(reachable, t.nodes.node_count(), "every live node must be reachable");
}

fn key_strategy() -> impl Strategy<Value = String> {
    // Small alphabet for frequent shared prefixes; 'é' exercises multi-byte edges.
    "[abcé]{0,6}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] String, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 25)]
    Get(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 5)]
    RemovePrefix(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 1)]
    Compact,
}

fn keys_strategy() -> impl Strategy<Value = BTreeMap<String, u32>> {
    prop::collection::btree_map(key_strategy(), any::<u32>(), 0..24)
}

fn char_prefixes(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .map(move |i| &s[..i])
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut t: RadixMap<u32> = RadixMap::new();
        let mut m: BTreeMap<String, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(&key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                    prop_assert_eq!(
                        t.contains_prefix(&key),
                        key.is_empty() || m.keys().any(|k| k.starts_with(key.as_str()))
                    );
                }
                Op::RemovePrefix(prefix) => {
                    let mut got = t.remove_prefix(&prefix);
                    got.sort();
                    let expected: Vec<(String, u32)> = m
                        .iter()
                        .filter(|(k, _)| k.starts_with(prefix.as_str()))
                        .map(|(k, v)| (k.clone(), *v))
                        .collect();
                    m.retain(|k, _| !k.starts_with(prefix.as_str()));
                    prop_assert_eq!(got, expected);
                }
                Op::Compact => {
                    t.compact();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let mut got: Vec<(String, u32)> = t.iter().map(|(k, v)| (k.to_owned(), *v)).collect();
        got.sort();
        let expected: Vec<(String, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_prefix_monotone(entries in keys_strategy(), query in key_strategy()) {
        let t: RadixMap<u32> = entries.iter().map(|(k, v)| (k, *v)).collect();

        for key in entries.keys() {
            for p in char_prefixes(key) {
                prop_assert!(t.contains_prefix(p));
            }
        }
        if t.contains_prefix(&query) {
            for p in char_prefixes(&query) {
                prop_assert!(t.contains_prefix(p));
            }
        }
    }

    #[test]
    fn prop_remove_reinsert(entries in keys_strategy(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!entries.is_empty());
        let mut t: RadixMap<u32> = entries.iter().map(|(k, v)| (k, *v)).collect();
        let (key, value) = entries.iter().nth(pick.index(entries.len())).unwrap();

        prop_assert_eq!(t.remove(key), Some(*value));
        prop_assert_eq!(t.len(), entries.len() - 1);
        validate_tree(&t);

        prop_assert_eq!(t.insert(key, *value), None);
        prop_assert_eq!(t.get(key), Some(value));
        prop_assert_eq!(t.len(), entries.len());
        validate_tree(&t);
    }

    #[test]
    fn prop_remove_prefix(entries in keys_strategy(), prefix in key_strategy()) {
        let mut t: RadixMap<u32> = entries.iter().map(|(k, v)| (k, *v)).collect();
        let before = t.len();
        let removed = t.remove_prefix(&prefix);

        prop_assert_eq!(t.len(), before - removed.len());
        prop_assert!(!t.keys().any(|k| k.starts_with(prefix.as_str())));
        for (k, v) in &removed {
            prop_assert!(k.starts_with(prefix.as_str()));
            prop_assert_eq!(entries.get(k), Some(v));
        }
        validate_tree(&t);
    }

    #[test]
    fn prop_find_all_keys_complete(entries in keys_strategy(), text in "[abcé ]{0,24}") {
        let t: RadixMap<u32> = entries.iter().map(|(k, v)| (k, *v)).collect();

        let mut expected = BTreeSet::new();
        if entries.contains_key("") {
            expected.insert((String::new(), 0, 0));
        }
        for key in entries.keys().filter(|k| !k.is_empty()) {
            for (i, _) in text.char_indices() {
                if text[i..].starts_with(key.as_str()) {
                    expected.insert((key.clone(), i, i + key.len()));
                }
            }
        }

        let all = t.find_all_keys(&text);
        let got: BTreeSet<_> = all.iter().map(|m| (m.key.to_owned(), m.start, m.end)).collect();
        prop_assert_eq!(got.len(), all.len(), "duplicate matches");
        prop_assert_eq!(&got, &expected);
        for m in &all {
            prop_assert_eq!(entries.get(m.key), Some(m.value));
        }

        // The longest search keeps exactly the longest match per start offset.
        let mut longest: BTreeMap<usize, (String, usize)> = BTreeMap::new();
        for (key, start, end) in expected.iter().filter(|(k, _, _)| !k.is_empty()) {
            let slot = longest.entry(*start).or_insert((key.clone(), *end));
            if *end > slot.1 {
                *slot = (key.clone(), *end);
            }
        }
        let found: Vec<_> = t
            .find_keys(&text)
            .iter()
            .filter(|m| !m.key.is_empty())
            .map(|m| (m.start, (m.key.to_owned(), m.end)))
            .collect();
        prop_assert_eq!(found, longest.into_iter().collect::<Vec<_>>());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 6] = ["a", "ab", "abc", "b", "ba", ""];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut t: RadixMap<usize> = RadixMap::new();
        let mut m: BTreeMap<&str, usize> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), m.insert(k, i));
        }

        validate_tree(&t);
        let mut got: Vec<(&str, usize)> = t.iter().map(|(k, v)| (k, *v)).collect();
        got.sort();
        let expected: Vec<(&str, usize)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let base: RadixMap<usize> = SMALL_SET.iter().enumerate().map(|(i, k)| (k, i)).collect();

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = base.clone();
        for k in perm {
            assert!(t.remove(k).is_some());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.nodes.node_count(), 1);
    });
}
