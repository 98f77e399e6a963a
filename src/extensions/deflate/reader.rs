//! Decompressing side of the stream adapter.
//!
//! The sender stripped the sync-flush trailer and never finished the deflate
//! stream. [`SuffixedReader`] appends [`READ_SUFFIX`] (the trailer, then an
//! empty final stored block) once the real source runs dry, so an ordinary
//! raw-deflate [`Decompressor`] sees a properly terminated stream.

use std::io::{self, Read};

use log::trace;

use crate::error::Result;

use super::READ_SUFFIX;

/// A raw-deflate decompressor reading from a source of type `R`.
///
/// The `close` and `reset` capabilities are optional; the defaults report
/// them as unsupported.
pub trait Decompressor<R>: Read {
    /// Finish using the decompressor, if it needs to be told.
    ///
    /// Returns `None` when the decompressor has no notion of closing.
    fn close(&mut self) -> Option<io::Result<()>> {
        None
    }

    /// Start over reading from `source`, keeping allocated state.
    ///
    /// Decompressors that cannot reset in place hand the source back, and a
    /// new decompressor is built around it instead.
    fn reset(&mut self, source: R) -> std::result::Result<(), R> {
        Err(source)
    }
}

/// Builds a decompressor around a source.
pub type DecompressorFactory<'a, R> =
    Box<dyn FnMut(SuffixedReader<R>) -> Box<dyn Decompressor<SuffixedReader<R>> + 'a> + 'a>;

/// Reads a source to its end, then [`READ_SUFFIX`], then reports EOF.
#[derive(Debug)]
pub struct SuffixedReader<R> {
    source: R,
    source_done: bool,
    pos: usize,
}

impl<R: Read> SuffixedReader<R> {
    /// Wrap `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            source_done: false,
            pos: 0,
        }
    }

    /// Underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }
}

impl<R: Read> Read for SuffixedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.source_done {
            match self.source.read(buf)? {
                0 => self.source_done = true,
                n => return Ok(n),
            }
        }
        let rest = &READ_SUFFIX[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Decompresses a message payload received without its trailer.
pub struct Reader<'a, R> {
    factory: DecompressorFactory<'a, R>,
    decompressor: Box<dyn Decompressor<SuffixedReader<R>> + 'a>,
}

impl<'a, R: Read + 'a> Reader<'a, R> {
    /// Create a reader decompressing from `source`.
    ///
    /// `factory` is called now and again on every [`reset`](Self::reset) the
    /// decompressor cannot handle in place.
    pub fn new<F>(source: R, factory: F) -> Self
    where
        F: FnMut(SuffixedReader<R>) -> Box<dyn Decompressor<SuffixedReader<R>> + 'a> + 'a,
    {
        let mut factory: DecompressorFactory<'a, R> = Box::new(factory);
        let decompressor = factory(SuffixedReader::new(source));
        Self {
            factory,
            decompressor,
        }
    }

    /// Close the decompressor, if it supports closing.
    ///
    /// # Errors
    ///
    /// Returns the decompressor's close error.
    pub fn close(&mut self) -> Result<()> {
        match self.decompressor.close() {
            Some(result) => Ok(result?),
            None => Ok(()),
        }
    }

    /// Start over with a new source.
    pub fn reset(&mut self, source: R) {
        match self.decompressor.reset(SuffixedReader::new(source)) {
            Ok(()) => trace!("decompressor reset in place"),
            Err(source) => {
                trace!("decompressor rebuilt on reset");
                self.decompressor = (self.factory)(source);
            }
        }
    }
}

impl<'a, R: Read + 'a> Read for Reader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decompressor.read(buf)
    }
}
