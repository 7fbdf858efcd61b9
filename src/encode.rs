//! Recursive encoder: turns a [`Value`](crate::value::Value) tree into an
//! SBSON byte buffer, children before parents so parent descriptors can
//! record already-known child sizes.

use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::chd;
use crate::error::EncodeError;
use crate::eytzinger;
use crate::tag::Tag;
use crate::value::Value;

/// Starting seed for the CHD builder's retry loop (spec policy, not wire
/// format).
pub const SEED_START: u32 = 0x500;

/// Upper bound on CHD seed retries before giving up.
pub const MAX_SEED_ATTEMPTS: u32 = 4096;

const KEY_REGION_LIMIT: usize = 16 * 1024 * 1024;
const MAX_KEY_OFFSET: u32 = (1 << 24) - 1;
const MAX_KEY_LEN: usize = 255;

/// Runtime knobs for encoding. Only one exists today: the key-count
/// threshold above which a map is encoded as a CHD perfect-hash map instead
/// of an ordered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub phf_threshold: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            phf_threshold: 10_000,
        }
    }
}

/// Encodes `value` into a standalone SBSON document.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    encode_value(value, options)
}

fn encode_value(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Null => Ok(alloc::vec![Tag::Null.as_u8()]),
        Value::Bool(true) => Ok(alloc::vec![Tag::True.as_u8()]),
        Value::Bool(false) => Ok(alloc::vec![Tag::False.as_u8()]),
        Value::Int(v) => Ok(encode_int(*v)),
        Value::String(s) => Ok(encode_string(s)),
        Value::Binary(b) => Ok(encode_binary(b)),
        Value::Array(items) => encode_array(items, options),
        Value::Map(map) => encode_map(map, options),
    }
}

fn encode_int(v: i128) -> Vec<u8> {
    const I64_MAX: i128 = i64::MAX as i128;
    const U32_MAX: i128 = u32::MAX as i128;

    let mut out = Vec::with_capacity(9);
    if v > I64_MAX {
        out.push(Tag::UInt64.as_u8());
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, v as u64);
        out.extend_from_slice(&buf);
    } else if v > U32_MAX {
        out.push(Tag::UInt32.as_u8());
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v as u32);
        out.extend_from_slice(&buf);
    } else if v < -U32_MAX {
        out.push(Tag::Int32.as_u8());
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, v as i32);
        out.extend_from_slice(&buf);
    } else {
        out.push(Tag::Int64.as_u8());
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, v as i64);
        out.extend_from_slice(&buf);
    }
    out
}

fn encode_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + s.len() + 1);
    out.push(Tag::String.as_u8());
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    out
}

fn encode_binary(b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + b.len());
    out.push(Tag::Binary.as_u8());
    out.extend_from_slice(b);
    out
}

fn encode_array(items: &[Value], options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let n = items.len();
    let mut out = Vec::new();
    out.push(Tag::Array.as_u8());
    let mut count_buf = [0u8; 4];
    LittleEndian::write_u32(&mut count_buf, n as u32);
    out.extend_from_slice(&count_buf);

    if n == 0 {
        return Ok(out);
    }

    let children: Vec<Vec<u8>> = items
        .iter()
        .map(|v| encode_value(v, options))
        .collect::<Result<_, _>>()?;

    let header_size = 1 + 4 + 4 * n;
    let mut offset = header_size as u32;
    for child in &children {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, offset);
        out.extend_from_slice(&buf);
        offset += child.len() as u32;
    }
    for child in &children {
        out.extend_from_slice(child);
    }
    Ok(out)
}

/// A single key/value pair staged for encoding, with its key already
/// validated and turned into bytes.
struct StagedEntry<'a> {
    key_bytes: &'a [u8],
    value: Vec<u8>,
}

fn validate_key(key: &str) -> Result<(), EncodeError> {
    if key.len() > MAX_KEY_LEN || key.as_bytes().contains(&0) {
        return Err(EncodeError::InvalidMapKey);
    }
    Ok(())
}

/// Lays out descriptors, keys, and values for a map given the order the
/// descriptors should be emitted in (`descriptor_order` is a list of
/// indices into `entries`). Returns the bytes of the descriptor+key+value
/// regions ready to append after the tag-specific header.
fn layout_map_body(
    entries: &[StagedEntry<'_>],
    descriptor_order: &[usize],
    header_size: usize,
) -> Result<Vec<u8>, EncodeError> {
    let n = entries.len();
    let mut key_offsets = alloc::vec![0u32; n];
    let mut key_lens = alloc::vec![0u32; n];
    let mut keys_region = Vec::new();
    let mut cursor = header_size;

    for &idx in descriptor_order {
        let key_bytes = entries[idx].key_bytes;
        let offset = cursor as u32;
        if offset as u64 > MAX_KEY_OFFSET as u64 {
            return Err(EncodeError::KeyRegionTooLarge);
        }
        key_offsets[idx] = offset;
        key_lens[idx] = key_bytes.len() as u32;
        keys_region.extend_from_slice(key_bytes);
        keys_region.push(0);
        cursor += key_bytes.len() + 1;
    }

    if keys_region.len() > KEY_REGION_LIMIT {
        return Err(EncodeError::KeyRegionTooLarge);
    }

    let values_start = cursor;
    let mut value_offsets = alloc::vec![0u32; n];
    let mut values_region = Vec::new();
    let mut voffset = values_start;
    for &idx in descriptor_order {
        value_offsets[idx] = voffset as u32;
        let v = &entries[idx].value;
        voffset += v.len();
        values_region.extend_from_slice(v);
    }

    let mut descriptors = Vec::with_capacity(8 * n);
    for &idx in descriptor_order {
        let key_desc = (key_lens[idx] << 24) | key_offsets[idx];
        let mut kd_buf = [0u8; 4];
        LittleEndian::write_u32(&mut kd_buf, key_desc);
        descriptors.extend_from_slice(&kd_buf);

        let mut vo_buf = [0u8; 4];
        LittleEndian::write_u32(&mut vo_buf, value_offsets[idx]);
        descriptors.extend_from_slice(&vo_buf);
    }

    let mut body = Vec::with_capacity(descriptors.len() + keys_region.len() + values_region.len());
    body.extend_from_slice(&descriptors);
    body.extend_from_slice(&keys_region);
    body.extend_from_slice(&values_region);
    Ok(body)
}

fn encode_map(
    map: &alloc::collections::BTreeMap<alloc::string::String, Value>,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let n = map.len();
    if (n as u32) >= options.phf_threshold {
        encode_map_chd(map, options)
    } else {
        encode_map_ordered(map, options)
    }
}

fn encode_map_ordered(
    map: &alloc::collections::BTreeMap<alloc::string::String, Value>,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let n = map.len();
    let mut out = Vec::new();
    out.push(Tag::Map.as_u8());
    let mut count_buf = [0u8; 4];
    LittleEndian::write_u32(&mut count_buf, n as u32);
    out.extend_from_slice(&count_buf);

    if n == 0 {
        return Ok(out);
    }

    // BTreeMap already yields keys in lexicographic byte order.
    let mut entries = Vec::with_capacity(n);
    for (k, v) in map.iter() {
        validate_key(k)?;
        entries.push(StagedEntry {
            key_bytes: k.as_bytes(),
            value: encode_value(v, options)?,
        });
    }

    let perm = eytzinger::order(n);
    let header_size = 1 + 4 + 8 * n;
    let body = layout_map_body(&entries, &perm, header_size)?;
    out.extend_from_slice(&body);
    Ok(out)
}

fn encode_map_chd(
    map: &alloc::collections::BTreeMap<alloc::string::String, Value>,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let n = map.len();
    let mut entries = Vec::with_capacity(n);
    for (k, v) in map.iter() {
        validate_key(k)?;
        entries.push(StagedEntry {
            key_bytes: k.as_bytes(),
            value: encode_value(v, options)?,
        });
    }

    let key_slices: Vec<&[u8]> = entries.iter().map(|e| e.key_bytes).collect();
    let state = chd::build_with_retry(&key_slices, SEED_START, MAX_SEED_ATTEMPTS)
        .ok_or(EncodeError::PhfBuildExhausted)?;

    // descriptor_order[slot] = original entry index occupying that slot.
    let descriptor_order: Vec<usize> = state.slot_to_key.iter().map(|&k| k as usize).collect();

    let mut out = Vec::new();
    out.push(Tag::MapPhfChd.as_u8());
    let mut count_buf = [0u8; 4];
    LittleEndian::write_u32(&mut count_buf, n as u32);
    out.extend_from_slice(&count_buf);
    let mut seed_buf = [0u8; 4];
    LittleEndian::write_u32(&mut seed_buf, state.seed);
    out.extend_from_slice(&seed_buf);

    for &(d1, d2) in &state.displacements {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, d1);
        out.extend_from_slice(&b);
        LittleEndian::write_u32(&mut b, d2);
        out.extend_from_slice(&b);
    }

    let header_size = 1 + 4 + 4 + 8 * state.bucket_count + 8 * n;
    let body = layout_map_body(&entries, &descriptor_order, header_size)?;
    out.extend_from_slice(&body);
    Ok(out)
}
