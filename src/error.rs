// src/error.rs

/// Fatal encoder errors. No partial output is ever returned alongside one of
/// these: either `encode` succeeds with a complete buffer, or it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A `Value` variant has no wire encoding.
    UnsupportedType,

    /// A map key contains a NUL byte, or exceeds 255 bytes.
    InvalidMapKey,

    /// A map's key byte offset would exceed 2^24-1, or its key region
    /// would exceed 16 MiB.
    KeyRegionTooLarge,

    /// CHD failed to converge within the seed-retry budget.
    PhfBuildExhausted,
}

// Manual implementation of Display for no_std environments.
impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedType => write!(f, "value has no SBSON encoding"),
            Self::InvalidMapKey => write!(f, "map key contains a NUL byte or exceeds 255 bytes"),
            Self::KeyRegionTooLarge => write!(
                f,
                "map key region exceeds the 16 MiB limit or a key offset exceeds 2^24-1"
            ),
            Self::PhfBuildExhausted => {
                write!(f, "CHD perfect hash failed to converge within the seed budget")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Fatal decoder errors. These are scoped to the element being parsed; the
/// caller decides whether to abort the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A tag byte matched none of the twelve reserved values.
    UnknownTag(u8),

    /// The tag is reserved but not implemented (currently only `DOUBLE`).
    ReservedType(u8),

    /// A declared count, offset, or descriptor exceeds the available slice,
    /// or offset arithmetic overflowed.
    TruncatedElement,

    /// A stored key lacks a NUL byte at its declared position.
    UnterminatedKey,

    /// A key or string element is not valid UTF-8.
    InvalidUtf8,

    /// A typed accessor (`as_bool`, `as_str`, ...) was called against a
    /// `TypedView` of a different logical variant.
    TypeMismatch,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownTag(t) => write!(f, "unknown element tag 0x{:02x}", t),
            Self::ReservedType(t) => write!(f, "reserved, unimplemented element tag 0x{:02x}", t),
            Self::TruncatedElement => write!(f, "element declares data past the end of its slice"),
            Self::UnterminatedKey => write!(f, "stored map key is missing its trailing NUL"),
            Self::InvalidUtf8 => write!(f, "key or string bytes are not valid UTF-8"),
            Self::TypeMismatch => write!(f, "accessor does not match the element's logical type"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
