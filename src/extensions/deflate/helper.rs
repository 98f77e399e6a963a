//! Whole-message and whole-frame shortcuts over [`Writer`] and [`Reader`].

use std::io::Read;

use crate::config::DeflateConfig;
use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::codec::{compressor_factory, decompressor_factory};
use super::{Reader, Writer, extend_read, extend_write};

/// Compresses and decompresses complete messages with the flate2 codec pair.
///
/// Every call starts from a fresh compression context, so the helper is only
/// correct when both no-context-takeover parameters were negotiated (see
/// [`Parameters::no_context_takeover`](super::Parameters::no_context_takeover)).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeflateHelper {
    config: DeflateConfig,
}

impl DeflateHelper {
    /// Create a helper using `config` for its compressors.
    pub fn new(config: DeflateConfig) -> Self {
        Self { config }
    }

    /// The codec configuration.
    pub fn config(&self) -> &DeflateConfig {
        &self.config
    }

    /// Compress `payload` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns any compressor or trailer error.
    pub fn compress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.compress_buffer(&mut buf, payload)?;
        Ok(buf)
    }

    /// Append the compressed form of `payload` to `buf`.
    ///
    /// # Errors
    ///
    /// Returns any compressor or trailer error.
    pub fn compress_buffer(&self, buf: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
        let mut writer = Writer::new(buf, compressor_factory(self.config));
        writer.write_all(payload)?;
        writer.flush()?;
        writer.close()
    }

    /// Decompress `payload` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `payload` is not valid raw deflate.
    pub fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.decompress_buffer(&mut buf, payload)?;
        Ok(buf)
    }

    /// Append the decompressed form of `payload` to `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `payload` is not valid raw deflate.
    pub fn decompress_buffer(&self, buf: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
        let mut reader = Reader::new(payload, decompressor_factory());
        reader.read_to_end(buf)?;
        reader.close()
    }

    /// Compressed copy of a complete data frame, RSV1 set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FragmentedMessage`] for a non-final frame,
    /// [`Error::ControlFrame`] for a control frame, and
    /// [`Error::CompressionBitSet`] if RSV1 is already set.
    pub fn compress_frame(&self, frame: &Frame) -> Result<Frame> {
        check_frame(frame)?;
        let mut out = frame.clone();
        out.set_payload(self.compress(frame.payload())?);
        out.rsv = extend_write(0, frame.rsv)?;
        Ok(out)
    }

    /// Decompressed copy of a complete data frame, RSV1 cleared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FragmentedMessage`] for a non-final frame,
    /// [`Error::ControlFrame`] for a control frame, or a decompression error.
    pub fn decompress_frame(&self, frame: &Frame) -> Result<Frame> {
        check_frame(frame)?;
        let mut out = frame.clone();
        out.set_payload(self.decompress(frame.payload())?);
        out.rsv = extend_read(0, frame.rsv)?;
        Ok(out)
    }
}

fn check_frame(frame: &Frame) -> Result<()> {
    if !frame.fin {
        return Err(Error::FragmentedMessage);
    }
    if frame.opcode.is_control() {
        return Err(Error::ControlFrame);
    }
    Ok(())
}
