use std::collections::BTreeMap;

use sbson::{decode, encode, view, EncodeOptions, Tag, Value};

#[test]
fn s1_three_key_map_with_high_threshold() {
    let mut map = BTreeMap::new();
    map.insert("A".to_string(), Value::Bool(true));
    map.insert("B".to_string(), Value::Bool(false));
    map.insert("C".to_string(), Value::Null);
    let bytes = encode(&Value::Map(map), &EncodeOptions { phf_threshold: 100 }).unwrap();

    assert_eq!(bytes[0], Tag::Map.as_u8());
    assert_eq!(bytes.len(), 38);

    let v = view(&bytes).unwrap();
    let m = v.as_map().unwrap();
    assert_eq!(m.lookup("A").unwrap().unwrap().as_bool().unwrap(), true);
    assert_eq!(m.lookup("B").unwrap().unwrap().as_bool().unwrap(), false);
    assert!(m.lookup("C").unwrap().unwrap().as_null().is_ok());
}

#[test]
fn s2_empty_map() {
    let bytes = encode(&Value::Map(BTreeMap::new()), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x03, 0, 0, 0, 0]);
}

#[test]
fn s3_mixed_array() {
    let v = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Bool(true)]);
    let bytes = encode(&v, &EncodeOptions::default()).unwrap();
    assert_eq!(bytes[0], Tag::Array.as_u8());
    assert_eq!(bytes.len(), 36);
    assert_eq!(decode(&bytes).unwrap(), v);
}

#[test]
fn s4_short_string() {
    let bytes = encode(&Value::String("hi".to_string()), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x02, b'h', b'i', 0x00]);
}

#[test]
fn s5_large_chd_map_resolves_every_key_and_rejects_absent() {
    let mut map = BTreeMap::new();
    for i in 0..20_000 {
        map.insert(format!("a{i}"), Value::Int(0));
    }
    let options = EncodeOptions { phf_threshold: 10_000 };
    let bytes = encode(&Value::Map(map.clone()), &options).unwrap();
    assert_eq!(bytes[0], Tag::MapPhfChd.as_u8());

    let v = view(&bytes).unwrap();
    let m = v.as_map().unwrap();
    assert_eq!(m.len(), 20_000);

    for k in map.keys() {
        assert!(m.lookup(k).unwrap().is_some(), "missing key {k}");
    }
    assert!(m.lookup("missing").unwrap().is_none());
}

#[test]
fn s6_binary_value() {
    let bytes = encode(&Value::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x05, 0xDE, 0xAD, 0xBE, 0xEF]);
}
