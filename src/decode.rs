//! Zero-copy navigation over an SBSON buffer, plus a materializing decode
//! that rebuilds the full [`Value`](crate::value::Value) tree.
//!
//! Every accessor is bounds-checked: a malformed or adversarially mutated
//! buffer yields a [`DecodeError`], never an out-of-range read or panic.

use core::cmp::Ordering;
use core::convert::TryFrom;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::chd;
use crate::error::DecodeError;
use crate::tag::Tag;
use crate::value::Value;

fn get(buf: &[u8], start: usize, len: usize) -> Result<&[u8], DecodeError> {
    let end = start.checked_add(len).ok_or(DecodeError::TruncatedElement)?;
    buf.get(start..end).ok_or(DecodeError::TruncatedElement)
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32, DecodeError> {
    Ok(LittleEndian::read_u32(get(buf, at, 4)?))
}

fn read_u64(buf: &[u8], at: usize) -> Result<u64, DecodeError> {
    Ok(LittleEndian::read_u64(get(buf, at, 8)?))
}

/// A parsed element: either a scalar, or a navigator over an array/map's
/// children.
#[derive(Debug, Clone)]
pub enum TypedView<'a> {
    Null,
    Bool(bool),
    Int(i128),
    String(&'a str),
    Binary(&'a [u8]),
    Array(ArrayView<'a>),
    Map(MapView<'a>),
}

impl<'a> TypedView<'a> {
    pub fn as_bool(&self) -> Result<bool, DecodeError> {
        match self {
            TypedView::Bool(b) => Ok(*b),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_int(&self) -> Result<i128, DecodeError> {
        match self {
            TypedView::Int(v) => Ok(*v),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_str(&self) -> Result<&'a str, DecodeError> {
        match self {
            TypedView::String(s) => Ok(*s),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_bytes(&self) -> Result<&'a [u8], DecodeError> {
        match self {
            TypedView::Binary(b) => Ok(*b),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_null(&self) -> Result<(), DecodeError> {
        match self {
            TypedView::Null => Ok(()),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_array(&self) -> Result<ArrayView<'a>, DecodeError> {
        match self {
            TypedView::Array(a) => Ok(*a),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    pub fn as_map(&self) -> Result<MapView<'a>, DecodeError> {
        match self {
            TypedView::Map(m) => Ok(*m),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    /// Rebuilds the full owned [`Value`] tree rooted at this view.
    pub fn materialize(&self) -> Result<Value, DecodeError> {
        match self {
            TypedView::Null => Ok(Value::Null),
            TypedView::Bool(b) => Ok(Value::Bool(*b)),
            TypedView::Int(v) => Ok(Value::Int(*v)),
            TypedView::String(s) => Ok(Value::String(String::from(*s))),
            TypedView::Binary(b) => Ok(Value::Binary(Vec::from(*b))),
            TypedView::Array(a) => {
                let mut items = Vec::with_capacity(a.len());
                for i in 0..a.len() {
                    items.push(a.at(i)?.materialize()?);
                }
                Ok(Value::Array(items))
            }
            TypedView::Map(m) => {
                let mut out = BTreeMap::new();
                for entry in m.iter() {
                    let (key, child) = entry?;
                    out.insert(String::from(key), child.materialize()?);
                }
                Ok(Value::Map(out))
            }
        }
    }
}

/// Parses the element occupying the whole of `buf` (i.e. `buf` is exactly
/// this element's byte range, `buf[0]` its tag).
pub fn view(buf: &[u8]) -> Result<TypedView<'_>, DecodeError> {
    if buf.is_empty() {
        return Err(DecodeError::TruncatedElement);
    }
    let tag = Tag::try_from(buf[0])?;
    match tag {
        Tag::Double => Err(DecodeError::ReservedType(buf[0])),
        Tag::Null => Ok(TypedView::Null),
        Tag::True => Ok(TypedView::Bool(true)),
        Tag::False => Ok(TypedView::Bool(false)),
        Tag::Int32 => Ok(TypedView::Int(read_u32(buf, 1)? as i128)),
        Tag::UInt32 => Ok(TypedView::Int(read_u32(buf, 1)? as i128)),
        Tag::Int64 => Ok(TypedView::Int(read_u64(buf, 1)? as i128)),
        Tag::UInt64 => Ok(TypedView::Int(read_u64(buf, 1)? as i128)),
        Tag::String => {
            if buf.len() < 2 || buf[buf.len() - 1] != 0 {
                return Err(DecodeError::TruncatedElement);
            }
            let s = core::str::from_utf8(&buf[1..buf.len() - 1])
                .map_err(|_| DecodeError::InvalidUtf8)?;
            Ok(TypedView::String(s))
        }
        Tag::Binary => Ok(TypedView::Binary(&buf[1..])),
        Tag::Array => {
            let count = read_u32(buf, 1)? as usize;
            Ok(TypedView::Array(ArrayView { buf, count }))
        }
        Tag::Map => {
            let count = read_u32(buf, 1)? as usize;
            Ok(TypedView::Map(MapView::Ordered(OrderedMapView {
                buf,
                count,
            })))
        }
        Tag::MapPhfChd => {
            let count = read_u32(buf, 1)? as usize;
            let seed = read_u32(buf, 5)?;
            let bucket_count = if count == 0 {
                0
            } else {
                (count + chd::LAMBDA - 1) / chd::LAMBDA
            };
            Ok(TypedView::Map(MapView::Chd(ChdMapView {
                buf,
                count,
                seed,
                bucket_count,
            })))
        }
    }
}

/// Decodes `buf` into a fully owned [`Value`] tree.
pub fn decode(buf: &[u8]) -> Result<Value, DecodeError> {
    view(buf)?.materialize()
}

/// Navigator over an `ARRAY` element's children.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    buf: &'a [u8],
    count: usize,
}

impl<'a> ArrayView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn value_offset(&self, i: usize) -> Result<usize, DecodeError> {
        Ok(read_u32(self.buf, 5 + 4 * i)? as usize)
    }

    pub fn at(&self, i: usize) -> Result<TypedView<'a>, DecodeError> {
        if i >= self.count {
            return Err(DecodeError::TruncatedElement);
        }
        let start = self.value_offset(i)?;
        let end = if i + 1 < self.count {
            self.value_offset(i + 1)?
        } else {
            self.buf.len()
        };
        let len = end
            .checked_sub(start)
            .ok_or(DecodeError::TruncatedElement)?;
        view(get(self.buf, start, len)?)
    }

    pub fn iter(&self) -> ArrayIter<'a> {
        ArrayIter { view: *self, idx: 0 }
    }
}

pub struct ArrayIter<'a> {
    view: ArrayView<'a>,
    idx: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Result<TypedView<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.view.count {
            return None;
        }
        let item = self.view.at(self.idx);
        self.idx += 1;
        Some(item)
    }
}

/// Navigator over a `MAP` (ordered, Eytzinger-indexed) element.
#[derive(Debug, Clone, Copy)]
pub struct OrderedMapView<'a> {
    buf: &'a [u8],
    count: usize,
}

impl<'a> OrderedMapView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn descriptor(&self, tree_idx: usize) -> Result<(u32, u32), DecodeError> {
        let pos = 5 + 8 * tree_idx;
        let key_desc = read_u32(self.buf, pos)?;
        let value_offset = read_u32(self.buf, pos + 4)?;
        Ok((key_desc, value_offset))
    }

    fn key_bytes_at(&self, tree_idx: usize) -> Result<&'a [u8], DecodeError> {
        let (key_desc, _) = self.descriptor(tree_idx)?;
        let len = (key_desc >> 24) as usize;
        let offset = (key_desc & 0x00FF_FFFF) as usize;
        let bytes = get(self.buf, offset, len)?;
        let nul = get(self.buf, offset + len, 1)?;
        if nul[0] != 0 {
            return Err(DecodeError::UnterminatedKey);
        }
        Ok(bytes)
    }

    fn value_view_at(&self, tree_idx: usize) -> Result<TypedView<'a>, DecodeError> {
        let (_, value_offset) = self.descriptor(tree_idx)?;
        let start = value_offset as usize;
        let end = if tree_idx + 1 < self.count {
            self.descriptor(tree_idx + 1)?.1 as usize
        } else {
            self.buf.len()
        };
        let len = end
            .checked_sub(start)
            .ok_or(DecodeError::TruncatedElement)?;
        view(get(self.buf, start, len)?)
    }

    pub fn lookup(&self, key: &str) -> Result<Option<TypedView<'a>>, DecodeError> {
        let target = key.as_bytes();
        let mut k = 0usize;
        while k < self.count {
            let candidate = self.key_bytes_at(k)?;
            match candidate.cmp(target) {
                Ordering::Equal => return Ok(Some(self.value_view_at(k)?)),
                Ordering::Less => k = 2 * k + 1,
                Ordering::Greater => k = 2 * k + 2,
            }
        }
        Ok(None)
    }

    pub fn iter(&self) -> OrderedMapIter<'a> {
        OrderedMapIter { view: *self, idx: 0 }
    }
}

pub struct OrderedMapIter<'a> {
    view: OrderedMapView<'a>,
    idx: usize,
}

impl<'a> Iterator for OrderedMapIter<'a> {
    type Item = Result<(&'a str, TypedView<'a>), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.view.count {
            return None;
        }
        let idx = self.idx;
        self.idx += 1;
        Some((|| {
            let key_bytes = self.view.key_bytes_at(idx)?;
            let key = core::str::from_utf8(key_bytes).map_err(|_| DecodeError::InvalidUtf8)?;
            let value = self.view.value_view_at(idx)?;
            Ok((key, value))
        })())
    }
}

/// Navigator over a `MAP_PHF_CHD` (perfect-hash) element.
#[derive(Debug, Clone, Copy)]
pub struct ChdMapView<'a> {
    buf: &'a [u8],
    count: usize,
    seed: u32,
    bucket_count: usize,
}

impl<'a> ChdMapView<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn descriptors_start(&self) -> usize {
        1 + 4 + 4 + 8 * self.bucket_count
    }

    fn descriptor(&self, slot: usize) -> Result<(u32, u32), DecodeError> {
        let pos = self.descriptors_start() + 8 * slot;
        let key_desc = read_u32(self.buf, pos)?;
        let value_offset = read_u32(self.buf, pos + 4)?;
        Ok((key_desc, value_offset))
    }

    fn key_bytes_at(&self, slot: usize) -> Result<&'a [u8], DecodeError> {
        let (key_desc, _) = self.descriptor(slot)?;
        let len = (key_desc >> 24) as usize;
        let offset = (key_desc & 0x00FF_FFFF) as usize;
        let bytes = get(self.buf, offset, len)?;
        let nul = get(self.buf, offset + len, 1)?;
        if nul[0] != 0 {
            return Err(DecodeError::UnterminatedKey);
        }
        Ok(bytes)
    }

    fn value_view_at(&self, slot: usize) -> Result<TypedView<'a>, DecodeError> {
        let (_, value_offset) = self.descriptor(slot)?;
        let start = value_offset as usize;
        let end = if slot + 1 < self.count {
            self.descriptor(slot + 1)?.1 as usize
        } else {
            self.buf.len()
        };
        let len = end
            .checked_sub(start)
            .ok_or(DecodeError::TruncatedElement)?;
        view(get(self.buf, start, len)?)
    }

    fn bucket_displacement(&self, bucket: usize) -> Result<(u32, u32), DecodeError> {
        let pos = 1 + 4 + 4 + 8 * bucket;
        let d1 = read_u32(self.buf, pos)?;
        let d2 = read_u32(self.buf, pos + 4)?;
        Ok((d1, d2))
    }

    pub fn lookup(&self, key: &str) -> Result<Option<TypedView<'a>>, DecodeError> {
        if self.count == 0 {
            return Ok(None);
        }
        let target = key.as_bytes();
        let h = chd::hash_key(self.seed, target);

        let bucket = (h.g as usize) % self.bucket_count.max(1);
        let (d1, d2) = self.bucket_displacement(bucket)?;
        let slot = (chd::displace(h.f1, h.f2, d1, d2) as usize) % self.count;

        let candidate = self.key_bytes_at(slot)?;
        if candidate == target {
            Ok(Some(self.value_view_at(slot)?))
        } else {
            Ok(None)
        }
    }

    pub fn iter(&self) -> ChdMapIter<'a> {
        ChdMapIter { view: *self, idx: 0 }
    }
}

pub struct ChdMapIter<'a> {
    view: ChdMapView<'a>,
    idx: usize,
}

impl<'a> Iterator for ChdMapIter<'a> {
    type Item = Result<(&'a str, TypedView<'a>), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.view.count {
            return None;
        }
        let idx = self.idx;
        self.idx += 1;
        Some((|| {
            let key_bytes = self.view.key_bytes_at(idx)?;
            let key = core::str::from_utf8(key_bytes).map_err(|_| DecodeError::InvalidUtf8)?;
            let value = self.view.value_view_at(idx)?;
            Ok((key, value))
        })())
    }
}

/// Unified navigator over either map wire representation.
#[derive(Debug, Clone, Copy)]
pub enum MapView<'a> {
    Ordered(OrderedMapView<'a>),
    Chd(ChdMapView<'a>),
}

impl<'a> MapView<'a> {
    pub fn len(&self) -> usize {
        match self {
            MapView::Ordered(m) => m.len(),
            MapView::Chd(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, key: &str) -> Result<Option<TypedView<'a>>, DecodeError> {
        match self {
            MapView::Ordered(m) => m.lookup(key),
            MapView::Chd(m) => m.lookup(key),
        }
    }

    pub fn iter(&self) -> MapIter<'a> {
        match self {
            MapView::Ordered(m) => MapIter::Ordered(m.iter()),
            MapView::Chd(m) => MapIter::Chd(m.iter()),
        }
    }
}

pub enum MapIter<'a> {
    Ordered(OrderedMapIter<'a>),
    Chd(ChdMapIter<'a>),
}

impl<'a> Iterator for MapIter<'a> {
    type Item = Result<(&'a str, TypedView<'a>), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            MapIter::Ordered(it) => it.next(),
            MapIter::Chd(it) => it.next(),
        }
    }
}
