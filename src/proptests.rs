//! Property tests against a BTreeMap model, plus a structural walker
//! asserting the slot-array and block-ring invariants.
use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::{Builder, Trie, TrieError, VALUE_LIMIT};

#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Insert(KeyValue),
    Update(KeyDelta),
    Remove(Key),
    Get(Key),
}

/// NUL-free, non-empty keys; NUL bytes alias the terminal edge and empty
/// keys have their own pinned unit tests.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: i32,
}

#[derive(Debug, Clone)]
struct KeyDelta {
    key: Key,
    delta: i32,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            // Tiny alphabet for heavy prefix sharing and collisions
            prop::collection::vec(1u8..=4, 1..6).prop_map(Key),
            // Arbitrary non-NUL bytes
            prop::collection::vec(1u8..=255, 1..5).prop_map(Key),
            // Word-shaped keys
            "[a-e]{1,8}".prop_map(|s| Key(s.into_bytes())),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), 0..10_000i32)
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

impl Arbitrary for KeyDelta {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), -50..50i32)
            .prop_map(|(key, delta)| KeyDelta { key, delta })
            .boxed()
    }
}

fn execute(trie: &mut Trie, model: &mut BTreeMap<Vec<u8>, i32>, action: Action) {
    match action {
        Action::Insert(kv) => {
            let key = kv.key.0;
            assert_eq!(trie.insert(&key, kv.value), Ok(()));
            model.insert(key, kv.value);
        }
        Action::Update(kd) => {
            let key = kd.key.0;
            let next = match model.get(&key) {
                Some(&prior) => prior + kd.delta,
                None => kd.delta,
            };
            let result = trie.update(&key, kd.delta);
            if (0..VALUE_LIMIT).contains(&next) {
                assert_eq!(result, Ok(()), "update of {:?} by {}", key, kd.delta);
                model.insert(key, next);
            } else {
                assert_eq!(result, Err(TrieError::InvalidValue));
            }
        }
        Action::Remove(key) => {
            let key = key.0;
            let existed = model.remove(&key).is_some();
            let result = trie.remove(&key);
            if existed {
                assert_eq!(result, Ok(()), "remove of stored {:?}", key);
            } else {
                assert_eq!(result, Err(TrieError::NoPath), "remove of absent {:?}", key);
            }
        }
        Action::Get(key) => {
            let key = key.0;
            match model.get(&key) {
                Some(&v) => assert_eq!(trie.get(&key), Ok(v)),
                None => assert!(trie.get(&key).is_err(), "phantom value for {:?}", key),
            }
        }
    }
}

fn verify(trie: &Trie, model: &BTreeMap<Vec<u8>, i32>, ordered: bool) {
    for (key, &value) in model {
        assert_eq!(trie.get(key), Ok(value));
        let id = trie.jump(key, 0).unwrap();
        assert_eq!(trie.key(id).unwrap(), *key);
    }
    assert_eq!(trie.status().keys, model.len());

    let mut enumerated: Vec<Vec<u8>> = trie
        .predictive_search(b"")
        .map(|id| trie.key(id).unwrap())
        .collect();
    let expected: Vec<Vec<u8>> = model.keys().cloned().collect();
    if !ordered {
        enumerated.sort();
    }
    assert_eq!(enumerated, expected);

    for key in model.keys() {
        let matched: Vec<Vec<u8>> = trie
            .common_prefix_search(key)
            .map(|id| trie.key(id).unwrap())
            .collect();
        let expected: Vec<Vec<u8>> = model
            .keys()
            .filter(|k| key.starts_with(k))
            .cloned()
            .collect();
        assert_eq!(matched, expected, "prefixes of {:?}", key);
    }
}

/// Walks the whole structure and asserts the representation invariants:
/// parent-edge reconciliation, sibling-chain consistency, empty-ring
/// shape, and block-list classification.
fn check_structure(trie: &Trie) {
    let size = trie.size;
    let nodes = trie.nodes();
    let ninfos = trie.node_infos();
    let blocks = trie.blocks();
    let nblocks = (size >> 8) as usize;

    assert_eq!(size % 256, 0);
    assert!(size <= trie.capacity);

    // Children seen by scanning checks, per parent.
    let mut scanned: BTreeMap<i32, BTreeSet<u8>> = BTreeMap::new();
    for i in 1..size {
        let n = nodes[i as usize];
        if n.check < 0 {
            continue;
        }
        let parent = nodes[n.check as usize];
        assert!(parent.value < 0, "terminal {} has child {}", n.check, i);
        let label = parent.base() ^ i;
        assert!((0..256).contains(&label), "slot {} outside parent aperture", i);
        scanned.entry(n.check).or_default().insert(label as u8);
    }

    // Children claimed by each parent's sibling chain.
    for i in 0..size {
        let n = nodes[i as usize];
        if n.check < 0 || n.value >= 0 {
            continue;
        }
        let base = n.base();
        let mut chain = vec![];
        let mut c = ninfos[i as usize].child;
        if c == 0 {
            let cand = base; // base ^ 0
            if (0..size).contains(&cand) && nodes[cand as usize].check == i {
                chain.push(0u8);
                c = ninfos[cand as usize].sibling;
            }
        } else {
            chain.push(c);
            c = ninfos[(base ^ i32::from(c)) as usize].sibling;
        }
        while c != 0 {
            chain.push(c);
            assert!(chain.len() <= 256, "unterminated chain under {}", i);
            c = ninfos[(base ^ i32::from(c)) as usize].sibling;
        }
        if trie.is_ordered() {
            assert!(
                chain.windows(2).all(|w| w[0] < w[1]),
                "chain under {} out of order: {:?}",
                i,
                chain
            );
        }
        let claimed: BTreeSet<u8> = chain.iter().copied().collect();
        assert_eq!(claimed.len(), chain.len(), "duplicate label under {}", i);
        let seen = scanned.remove(&i).unwrap_or_default();
        assert_eq!(claimed, seen, "chain/check mismatch under {}", i);
        for &label in &claimed {
            assert_eq!(nodes[(base ^ i32::from(label)) as usize].check, i);
        }
    }
    assert!(
        scanned.is_empty(),
        "children of terminal or missing parents: {:?}",
        scanned
    );

    // Per-block empty rings. Block 0 runs one short of its charge: the
    // root slot is counted but never threaded.
    let mut ring_total = 0i32;
    for bi in 0..nblocks {
        let b = blocks[bi];
        let expected = if bi == 0 { b.num - 1 } else { b.num };
        assert!(expected >= 0, "block {} over-charged", bi);
        ring_total += expected;
        if expected == 0 {
            continue;
        }
        let mut e = b.ehead;
        let mut count = 0;
        loop {
            assert!(nodes[e as usize].check < 0, "occupied slot {} on ring", e);
            assert_eq!(e >> 8, bi as i32, "slot {} on foreign ring {}", e, bi);
            let next = -nodes[e as usize].check;
            assert_eq!(-nodes[next as usize].value, e, "broken ring link at {}", e);
            count += 1;
            assert!(count <= 256, "ring of block {} does not close", bi);
            e = next;
            if e == b.ehead {
                break;
            }
        }
        assert_eq!(count, expected, "ring length mismatch in block {}", bi);
    }
    let free = nodes[..size as usize].iter().filter(|n| n.check < 0).count();
    assert_eq!(free as i32, ring_total);

    // Every block except 0 sits on exactly one class list.
    let mut seen_blocks: BTreeMap<i32, &str> = BTreeMap::new();
    for (head, name) in [
        (trie.bhead_full, "full"),
        (trie.bhead_closed, "closed"),
        (trie.bhead_open, "open"),
    ] {
        if head == 0 {
            continue;
        }
        let mut bi = head;
        let mut steps = 0;
        loop {
            assert!(seen_blocks.insert(bi, name).is_none(), "block {} listed twice", bi);
            if name == "full" {
                assert_eq!(blocks[bi as usize].num, 0);
            } else {
                assert!(blocks[bi as usize].num > 0);
            }
            assert_eq!(blocks[blocks[bi as usize].next as usize].prev, bi);
            steps += 1;
            assert!(steps <= nblocks, "class list does not close");
            bi = blocks[bi as usize].next;
            if bi == head {
                break;
            }
        }
    }
    for bi in 1..nblocks as i32 {
        assert!(seen_blocks.contains_key(&bi), "block {} on no list", bi);
    }
    assert!(!seen_blocks.contains_key(&0), "block 0 must stay anchored");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn behaves_like_btreemap(actions in prop::collection::vec(any::<Action>(), 1..80)) {
        let mut trie = Trie::new();
        let mut model = BTreeMap::new();
        for action in actions {
            execute(&mut trie, &mut model, action);
        }
        verify(&trie, &model, true);
        check_structure(&trie);
    }

    #[test]
    fn unordered_mode_keeps_the_same_contents(
        actions in prop::collection::vec(any::<Action>(), 1..60)
    ) {
        let mut trie = Builder::new().ordered(false).build();
        let mut model = BTreeMap::new();
        for action in actions {
            execute(&mut trie, &mut model, action);
        }
        verify(&trie, &model, false);
        check_structure(&trie);
    }

    #[test]
    fn snapshots_survive_random_histories(
        actions in prop::collection::vec(any::<Action>(), 1..60)
    ) {
        let mut trie = Trie::new();
        let mut model = BTreeMap::new();
        for action in actions {
            execute(&mut trie, &mut model, action);
        }
        let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        prop_assert_eq!(&restored, &trie);
        verify(&restored, &model, true);
        check_structure(&restored);
    }
}
