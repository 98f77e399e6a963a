//! WebSocket extension plumbing (RFC 6455 Section 9).
//!
//! Provides the tokenized form of a `Sec-WebSocket-Extensions` entry
//! ([`ExtensionOffer`]), the reserved-bit set carried by every frame header
//! ([`RsvBits`]) and the per-frame hook a transport calls to let an extension
//! claim its reserved bit ([`RsvExtension`]).
//!
//! # Example
//!
//! ```rust
//! use rsws_deflate::extensions::ExtensionOffer;
//!
//! let offers = ExtensionOffer::parse_header(
//!     "permessage-deflate; client_max_window_bits, x-foo",
//! ).unwrap();
//! assert_eq!(offers[0].name, "permessage-deflate");
//! assert!(offers[0].has_param("client_max_window_bits"));
//! ```

pub mod deflate;

use crate::error::{Error, Result};
use std::fmt;

/// Represents a single extension parameter.
///
/// Extension parameters follow the format: `name; param1=value1; param2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionParam {
    /// Parameter name (e.g., "client_max_window_bits").
    pub name: String,
    /// Optional parameter value. None for boolean parameters.
    pub value: Option<String>,
}

impl ExtensionParam {
    /// Create a new parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a boolean/flag parameter (no value).
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Parse a single parameter from a string (e.g., "param=value" or "param").
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.split_once('=') {
            Some((name, value)) => Self::new(name.trim(), value.trim().trim_matches('"')),
            None => Self::flag(s),
        }
    }

    /// Value with an empty string treated as absent.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

impl fmt::Display for ExtensionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One tokenized extension from a `Sec-WebSocket-Extensions` header: a name
/// plus its parameters in the order they were received.
///
/// For example: `permessage-deflate; client_max_window_bits=15`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionOffer {
    /// Extension name (e.g., "permessage-deflate").
    pub name: String,
    /// Extension parameters.
    pub params: Vec<ExtensionParam>,
}

impl ExtensionOffer {
    /// Create a new extension offer with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Create a new extension offer with parameters.
    pub fn with_params(name: impl Into<String>, params: Vec<ExtensionParam>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse a single extension offer from a string.
    ///
    /// Format: `extension-name; param1=value1; param2`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if the extension name is empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        let name = parts.next().unwrap_or_default().trim().to_string();

        if name.is_empty() {
            return Err(Error::InvalidExtension("Empty extension name".into()));
        }

        let params = parts.map(ExtensionParam::parse).collect();

        Ok(Self { name, params })
    }

    /// Parse every comma-separated offer of a header value, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if any extension offer in the header is invalid.
    pub fn parse_header(header: &str) -> Result<Vec<Self>> {
        header.split(',').map(|s| Self::parse(s.trim())).collect()
    }

    /// Append a parameter.
    pub fn push(&mut self, param: ExtensionParam) {
        self.params.push(param);
    }

    /// Get the first parameter with the given name.
    pub fn get_param(&self, name: &str) -> Option<&ExtensionParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check if a parameter is present.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

impl fmt::Display for ExtensionOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for param in &self.params {
            write!(f, "; {}", param)?;
        }
        Ok(())
    }
}

/// The three reserved bits of a frame header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RsvBits {
    /// RSV1, the per-message compressed bit under permessage-deflate.
    pub rsv1: bool,
    /// RSV2.
    pub rsv2: bool,
    /// RSV3.
    pub rsv3: bool,
}

impl RsvBits {
    /// No RSV bits set.
    pub const NONE: Self = Self::new(false, false, false);

    /// RSV1 only.
    pub const RSV1: Self = Self::new(true, false, false);

    /// Build from individual bits.
    #[must_use]
    pub const fn new(rsv1: bool, rsv2: bool, rsv3: bool) -> Self {
        Self { rsv1, rsv2, rsv3 }
    }

    /// Decode the 3-bit field (`0b100` is RSV1).
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::new(bits & 0b100 != 0, bits & 0b010 != 0, bits & 0b001 != 0)
    }

    /// Encode as the 3-bit field.
    #[must_use]
    pub const fn bits(self) -> u8 {
        (self.rsv1 as u8) << 2 | (self.rsv2 as u8) << 1 | self.rsv3 as u8
    }

    /// Same bits with RSV1 replaced.
    #[must_use]
    pub const fn with_rsv1(self, rsv1: bool) -> Self {
        Self::new(rsv1, self.rsv2, self.rsv3)
    }
}

impl fmt::Display for RsvBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.bits())
    }
}

/// Per-frame reserved-bit hook.
///
/// The transport calls `extend` for every data frame it reads or writes,
/// passing the frame's index within its message (0 for the first fragment)
/// and the current reserved bits, and uses the returned bits instead.
/// An error fails the connection.
pub trait RsvExtension {
    /// Transform the reserved bits of fragment `fseq`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bits violate the extension's framing rules.
    fn extend(&self, fseq: usize, rsv: RsvBits) -> Result<RsvBits>;
}

impl<F> RsvExtension for F
where
    F: Fn(usize, RsvBits) -> Result<RsvBits>,
{
    fn extend(&self, fseq: usize, rsv: RsvBits) -> Result<RsvBits> {
        self(fseq, rsv)
    }
}
