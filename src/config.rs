//! Configuration for the permessage-deflate codec pair.

use crate::error::{Error, Result};

/// Smallest LZ77 window exponent permessage-deflate allows.
pub const MIN_WINDOW_BITS: u8 = 8;
/// Largest LZ77 window exponent permessage-deflate allows.
pub const MAX_WINDOW_BITS: u8 = 15;

const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Settings for the compressor/decompressor pair used by
/// [`DeflateHelper`](crate::extensions::deflate::DeflateHelper).
///
/// The configuration is an explicit value handed to whoever builds codecs;
/// it should agree with the parameters negotiated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateConfig {
    /// Compression level, 0 (store) to 9 (best).
    ///
    /// Default: 6
    pub compression_level: u32,

    /// LZ77 window exponent the compressor may use.
    ///
    /// Default: 15
    pub max_window_bits: u8,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_window_bits: MAX_WINDOW_BITS,
        }
    }
}

impl DeflateConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `level` is above 9.
    pub fn compression_level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidExtension(format!(
                "compression_level must be 0-9, got {}",
                level
            )));
        }
        self.compression_level = level;
        Ok(self)
    }

    /// Set the compressor window size exponent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `bits` is outside 8-15.
    pub fn max_window_bits(mut self, bits: u8) -> Result<Self> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
            return Err(Error::InvalidExtension(format!(
                "max_window_bits must be {}-{}, got {}",
                MIN_WINDOW_BITS, MAX_WINDOW_BITS, bits
            )));
        }
        self.max_window_bits = bits;
        Ok(self)
    }
}
