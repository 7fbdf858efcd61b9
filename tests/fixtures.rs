//! Reconstructs the two cross-implementation fixture documents used by the
//! Python reference's test-vector generator: `sanity` (a small mixed-type
//! map) and `goto` (a large outer map wrapping nested arrays, big enough to
//! force the CHD path under a realistic threshold).

use std::collections::BTreeMap;

use sbson::{decode, encode, view, EncodeOptions, Value};

fn sanity_document() -> Value {
    let mut map = BTreeMap::new();
    map.insert("3".to_string(), Value::Binary(b"beep boop".to_vec()));
    map.insert(
        "BLARG".to_string(),
        Value::Array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Bool(true),
            Value::Bool(false),
            Value::Null,
        ]),
    );
    let mut florp = BTreeMap::new();
    florp.insert("X".to_string(), Value::Int(0xFF));
    map.insert("FLORP".to_string(), Value::Map(florp));
    map.insert(
        "help me i'm trapped in a format factory help me before they".to_string(),
        Value::String("...".to_string()),
    );
    Value::Map(map)
}

fn goto_document() -> Value {
    let mut items = BTreeMap::new();
    for i in 0..8_000 {
        let mut item = BTreeMap::new();
        item.insert(
            "something".to_string(),
            Value::Array((0..100).map(|_| Value::Int(100)).collect()),
        );
        items.insert(format!("item_{i:04}"), Value::Map(item));
    }
    let mut top = BTreeMap::new();
    top.insert("top".to_string(), Value::Map(items));
    Value::Map(top)
}

#[test]
fn sanity_round_trips_under_both_map_modes() {
    let doc = sanity_document();
    for threshold in [0u32, 10_000] {
        let bytes = encode(&doc, &EncodeOptions { phf_threshold: threshold }).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, doc);
    }
}

#[test]
fn goto_decodes_to_the_known_structure_and_supports_direct_lookup() {
    let doc = goto_document();
    let bytes = encode(&doc, &EncodeOptions::default()).unwrap();

    // A single "top" key at the default threshold of 10_000 stays on the
    // ordered path.
    assert_eq!(bytes[0], sbson::Tag::Map.as_u8());

    let v = view(&bytes).unwrap();
    let m = v.as_map().unwrap();
    assert_eq!(m.len(), 1);

    let top = m.lookup("top").unwrap().unwrap();
    let top_map = top.as_map().unwrap();
    assert_eq!(top_map.len(), 8_000);

    let inner = top_map.lookup("item_4321").unwrap().unwrap();
    let inner_map = inner.as_map().unwrap();
    let something = inner_map.lookup("something").unwrap().unwrap();
    let array = something.as_array().unwrap();
    assert_eq!(array.len(), 100);
    assert_eq!(array.at(0).unwrap().as_int().unwrap(), 100);

    assert!(top_map.lookup("item_9999").unwrap().is_none());
}

#[test]
fn goto_forced_onto_chd_path_still_resolves_every_key() {
    let doc = goto_document();
    // `phf_threshold=8000` matches the reference generator's "goto_phf"
    // vector and forces the 8000-entry "top" map onto the CHD path.
    let bytes = encode(&doc, &EncodeOptions { phf_threshold: 8_000 }).unwrap();

    let v = view(&bytes).unwrap();
    let m = v.as_map().unwrap();
    let top = m.lookup("top").unwrap().unwrap();

    let top_map = top.as_map().unwrap();
    assert!(matches!(top_map, sbson::MapView::Chd(_)));

    for i in [0usize, 1234, 7999] {
        let key = format!("item_{i:04}");
        assert!(top_map.lookup(&key).unwrap().is_some());
    }
    assert!(top_map.lookup("not-a-key").unwrap().is_none());
}
