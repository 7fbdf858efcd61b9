#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

// Needed for Vec, BTreeMap, String.
extern crate alloc;

pub mod decode;
pub mod encode;
pub mod error;
pub mod tag;
pub mod value;

mod chd;
mod eytzinger;
mod siphash;

#[cfg(feature = "json")]
pub mod io;

pub use decode::{decode, view, ArrayView, ChdMapView, MapView, OrderedMapView, TypedView};
pub use encode::{encode, EncodeOptions};
pub use error::{DecodeError, EncodeError};
pub use tag::Tag;
pub use value::Value;
