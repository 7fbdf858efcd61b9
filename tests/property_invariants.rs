use std::collections::BTreeMap;

use proptest::collection::{btree_map, vec as pvec};
use proptest::prelude::*;

use sbson::{decode, encode, EncodeOptions, Value};

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u32>().prop_map(|v| Value::Int(v as i128)),
        "[a-z]{0,12}".prop_map(Value::String),
        pvec(any::<u8>(), 0..8).prop_map(Value::Binary),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            pvec(inner.clone(), 0..6).prop_map(Value::Array),
            btree_map("[a-z]{1,8}", inner, 0..6).prop_map(Value::Map),
        ]
    })
}

proptest! {
    #[test]
    fn round_trip_holds_for_arbitrary_non_negative_int_trees(v in arb_value()) {
        let bytes = encode(&v, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn encoding_is_deterministic_for_arbitrary_trees(v in arb_value()) {
        let a = encode(&v, &EncodeOptions::default()).unwrap();
        let b = encode(&v, &EncodeOptions::default()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn single_byte_mutation_never_panics(v in arb_value(), mutate_at in any::<usize>(), mutate_byte in any::<u8>()) {
        let mut bytes = encode(&v, &EncodeOptions::default()).unwrap();
        if !bytes.is_empty() {
            let idx = mutate_at % bytes.len();
            bytes[idx] = mutate_byte;
        }
        // The only assertion is that this does not panic or read out of
        // bounds; either a well-formed (possibly different) tree or an
        // error is an acceptable outcome.
        let _ = decode(&bytes);
    }
}

#[test]
fn ordered_map_lookup_and_iteration_agree_with_source() {
    let mut map = BTreeMap::new();
    for k in ["zeta", "alpha", "mid", "beta", "omega", "delta"] {
        map.insert(k.to_string(), Value::String(k.to_string()));
    }
    let bytes = encode(&Value::Map(map.clone()), &EncodeOptions { phf_threshold: 1000 }).unwrap();
    let view = sbson::view(&bytes).unwrap();
    let m = view.as_map().unwrap();

    let mut seen = BTreeMap::new();
    for entry in m.iter() {
        let (k, v) = entry.unwrap();
        seen.insert(k.to_string(), v.as_str().unwrap().to_string());
    }
    let expected: BTreeMap<String, String> = map
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect();
    assert_eq!(seen, expected);

    for k in map.keys() {
        assert!(m.lookup(k).unwrap().is_some());
    }
}
