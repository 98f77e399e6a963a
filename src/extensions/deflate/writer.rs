//! Compressing side of the stream adapter.
//!
//! A permessage-deflate sender compresses the message, sync-flushes, and
//! drops the `00 00 FF FF` the flush ends with (RFC 7692 Section 7.2.1).
//! [`Writer`] does this for any raw-deflate [`Compressor`]: compressor output
//! passes through a [`TailBuffer`] that always holds back the last four bytes,
//! and after every flush those bytes are checked against the trailer.

use std::io::{self, Write};

use log::{debug, trace};

use crate::error::{Error, Result};

use super::TAIL;

const TAIL_LEN: usize = TAIL.len();

/// A raw-deflate compressor writing into a sink of type `W`.
///
/// `flush` must perform a sync flush. The `close` and `reset` capabilities
/// are optional; the defaults report them as unsupported.
pub trait Compressor<W>: Write {
    /// Sink the compressor writes into.
    fn get_ref(&self) -> &W;

    /// Finish using the compressor, if it needs to be told.
    ///
    /// Returns `None` when the compressor has no notion of closing.
    fn close(&mut self) -> Option<io::Result<()>> {
        None
    }

    /// Start over writing into `sink`, keeping allocated state.
    ///
    /// Compressors that cannot reset in place hand the sink back, and a new
    /// compressor is built around it instead.
    fn reset(&mut self, sink: W) -> std::result::Result<(), W> {
        Err(sink)
    }
}

/// Builds a compressor around a sink.
pub type CompressorFactory<'a, W> =
    Box<dyn FnMut(TailBuffer<W>) -> Box<dyn Compressor<TailBuffer<W>> + 'a> + 'a>;

/// Forwards everything written to it except the last [`TAIL`]-length bytes.
#[derive(Debug)]
pub struct TailBuffer<W> {
    dest: W,
    buf: [u8; TAIL_LEN],
    len: usize,
}

impl<W: Write> TailBuffer<W> {
    /// Wrap `dest` with an empty hold-back buffer.
    pub fn new(dest: W) -> Self {
        Self {
            dest,
            buf: [0; TAIL_LEN],
            len: 0,
        }
    }

    /// Bytes currently held back.
    pub fn tail(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Destination writer.
    pub fn get_ref(&self) -> &W {
        &self.dest
    }

    /// Consume the buffer, dropping the held-back bytes.
    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W: Write> Write for TailBuffer<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let cap = self.buf.len();
        let total = self.len + data.len();
        if total <= cap {
            self.buf[self.len..total].copy_from_slice(data);
            self.len = total;
            return Ok(data.len());
        }

        // Release the oldest bytes: first from the held-back buffer, then
        // from the head of `data`.
        let release = total - cap;
        let from_held = release.min(self.len);
        let from_data = release - from_held;
        self.dest.write_all(&self.buf[..from_held])?;
        self.dest.write_all(&data[..from_data])?;

        let kept = self.len - from_held;
        self.buf.copy_within(from_held..self.len, 0);
        self.buf[kept..].copy_from_slice(&data[from_data..]);
        self.len = cap;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.dest.flush()
    }
}

/// Compresses data into a destination, leaving off the sync-flush trailer.
///
/// Once a write, flush or close fails, every later call returns the same
/// error until [`reset`](Self::reset).
pub struct Writer<'a, W> {
    factory: CompressorFactory<'a, W>,
    compressor: Box<dyn Compressor<TailBuffer<W>> + 'a>,
    err: Option<Error>,
}

impl<'a, W: Write + 'a> Writer<'a, W> {
    /// Create a writer compressing into `dest`.
    ///
    /// `factory` is called now and again on every [`reset`](Self::reset) the
    /// compressor cannot handle in place.
    pub fn new<F>(dest: W, factory: F) -> Self
    where
        F: FnMut(TailBuffer<W>) -> Box<dyn Compressor<TailBuffer<W>> + 'a> + 'a,
    {
        let mut factory: CompressorFactory<'a, W> = Box::new(factory);
        let compressor = factory(TailBuffer::new(dest));
        Self {
            factory,
            compressor,
            err: None,
        }
    }

    /// Feed `buf` into the compressor.
    ///
    /// # Errors
    ///
    /// Returns the compressor's error, or the one the writer is poisoned with.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check()?;
        match self.compressor.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.poison(e.into())),
        }
    }

    /// Feed all of `buf` into the compressor.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => {
                    let err = io::Error::from(io::ErrorKind::WriteZero);
                    return Err(self.poison(err.into()));
                }
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Sync-flush the compressor and verify the trailer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadCompressorTail`] if the flushed output does not end
    /// with `00 00 FF FF`, or the compressor's own error.
    pub fn flush(&mut self) -> Result<()> {
        self.check()?;
        if let Err(e) = self.compressor.flush() {
            return Err(self.poison(e.into()));
        }
        self.check_tail()
    }

    /// Close the compressor, if it supports closing, and verify the trailer.
    ///
    /// # Errors
    ///
    /// Same as [`flush`](Self::flush).
    pub fn close(&mut self) -> Result<()> {
        self.check()?;
        if let Some(Err(e)) = self.compressor.close() {
            return Err(self.poison(e.into()));
        }
        self.check_tail()
    }

    /// Start over with a new destination, clearing any error.
    ///
    /// Data not yet flushed is lost.
    pub fn reset(&mut self, dest: W) {
        self.err = None;
        match self.compressor.reset(TailBuffer::new(dest)) {
            Ok(()) => trace!("compressor reset in place"),
            Err(sink) => {
                trace!("compressor rebuilt on reset");
                self.compressor = (self.factory)(sink);
            }
        }
    }

    /// Error the writer is poisoned with, if any.
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Destination writer.
    pub fn get_ref(&self) -> &W {
        self.compressor.get_ref().get_ref()
    }

    fn check(&self) -> Result<()> {
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: Error) -> Error {
        self.err = Some(err.clone());
        err
    }

    fn check_tail(&mut self) -> Result<()> {
        let tail = self.compressor.get_ref().tail();
        if tail == &TAIL[..] {
            return Ok(());
        }
        debug!("compressor output ends with {tail:02x?}, not a sync flush");
        let err = Error::BadCompressorTail {
            expected: TAIL,
            actual: tail.to_vec(),
        };
        Err(self.poison(err))
    }
}

impl<'a, W: Write + 'a> Write for Writer<'a, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Writer::flush(self).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits whatever it was given verbatim, then a fixed flush tail.
    struct Passthrough<W> {
        sink: W,
        flush_tail: &'static [u8],
    }

    impl<W: Write> Write for Passthrough<W> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.sink.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.sink.write_all(self.flush_tail)?;
            self.sink.flush()
        }
    }

    impl<W: Write> Compressor<W> for Passthrough<W> {
        fn get_ref(&self) -> &W {
            &self.sink
        }

        fn close(&mut self) -> Option<io::Result<()>> {
            Some(Ok(()))
        }
    }

    type Sink = TailBuffer<Vec<u8>>;

    fn passthrough(
        flush_tail: &'static [u8],
    ) -> impl FnMut(Sink) -> Box<dyn Compressor<Sink>> {
        move |sink| -> Box<dyn Compressor<Sink>> { Box::new(Passthrough { sink, flush_tail }) }
    }

    /// Fails every write.
    struct Broken<W>(W);

    impl<W> Write for Broken<W> {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("broken"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<W> Compressor<W> for Broken<W> {
        fn get_ref(&self) -> &W {
            &self.0
        }
    }

    #[test]
    fn test_tail_buffer_shorter_than_trailer() {
        let mut tb = TailBuffer::new(Vec::new());
        tb.write_all(&[1, 2]).unwrap();
        assert!(tb.get_ref().is_empty());
        assert_eq!(tb.tail(), &[1, 2]);
        tb.write_all(&[3]).unwrap();
        assert!(tb.get_ref().is_empty());
        assert_eq!(tb.tail(), &[1, 2, 3]);
    }

    #[test]
    fn test_tail_buffer_exactly_trailer() {
        let mut tb = TailBuffer::new(Vec::new());
        tb.write_all(&TAIL).unwrap();
        assert!(tb.get_ref().is_empty());
        assert_eq!(tb.tail(), &TAIL);
    }

    #[test]
    fn test_tail_buffer_longer_than_trailer() {
        let mut tb = TailBuffer::new(Vec::new());
        tb.write_all(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(tb.get_ref(), &[1, 2]);
        assert_eq!(tb.tail(), &[3, 4, 5, 6]);
    }

    #[test]
    fn test_tail_buffer_spills_held_bytes() {
        let mut tb = TailBuffer::new(Vec::new());
        tb.write_all(&[1, 2, 3]).unwrap();
        tb.write_all(&[4, 5]).unwrap();
        assert_eq!(tb.get_ref(), &[1]);
        assert_eq!(tb.tail(), &[2, 3, 4, 5]);

        tb.write_all(&[6, 7, 8, 9, 10, 11]).unwrap();
        assert_eq!(tb.get_ref(), &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tb.tail(), &[8, 9, 10, 11]);
        assert_eq!(tb.into_inner(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_tail_buffer_byte_at_a_time() {
        let mut tb = TailBuffer::new(Vec::new());
        for b in 0..10u8 {
            tb.write_all(&[b]).unwrap();
        }
        assert_eq!(tb.get_ref(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(tb.tail(), &[6, 7, 8, 9]);
    }

    #[test]
    fn test_flush_strips_trailer() {
        let mut writer = Writer::new(Vec::new(), passthrough(&TAIL));
        writer.write_all(b"payload").unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref(), b"payload");
        writer.close().unwrap();
        assert_eq!(writer.get_ref(), b"payload");
    }

    #[test]
    fn test_flush_bad_tail_poisons() {
        let mut writer = Writer::new(Vec::new(), passthrough(&[0x03, 0x00]));
        writer.write_all(b"payload").unwrap();
        let err = writer.flush().unwrap_err();
        assert_eq!(
            err,
            Error::BadCompressorTail {
                expected: TAIL,
                actual: vec![b'a', b'd', 0x03, 0x00],
            }
        );
        assert_eq!(writer.err(), Some(&err));
        assert_eq!(writer.write(b"more").unwrap_err(), err);
        assert_eq!(writer.flush().unwrap_err(), err);
        assert_eq!(writer.close().unwrap_err(), err);
    }

    #[test]
    fn test_close_bad_tail() {
        let mut writer = Writer::new(Vec::new(), passthrough(&[]));
        writer.write_all(b"abc").unwrap();
        assert!(matches!(
            writer.close(),
            Err(Error::BadCompressorTail { .. })
        ));
    }

    #[test]
    fn test_reset_clears_poison_and_rebuilds() {
        let mut writer = Writer::new(Vec::new(), passthrough(&[0xff]));
        writer.write_all(b"x").unwrap();
        assert!(writer.flush().is_err());

        writer.reset(vec![9]);
        assert!(writer.err().is_none());
        assert_eq!(writer.get_ref(), &[9]);
        writer.write_all(b"abcd").unwrap();
        assert_eq!(writer.get_ref(), &[9]);
    }

    #[test]
    fn test_write_error_poisons() {
        let mut writer = Writer::new(Vec::new(), |sink| -> Box<dyn Compressor<Sink>> {
            Box::new(Broken(sink))
        });
        let err = writer.write(b"x").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(writer.flush().unwrap_err(), err);
    }

    #[test]
    fn test_io_write_impl() {
        let mut writer = Writer::new(Vec::new(), passthrough(&TAIL));
        io::Write::write_all(&mut writer, b"hello").unwrap();
        io::Write::flush(&mut writer).unwrap();
        assert_eq!(writer.get_ref(), b"hello");
    }
}
