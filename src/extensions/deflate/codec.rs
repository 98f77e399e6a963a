//! Raw-deflate compressor and decompressor backed by flate2.
//!
//! Both types support the optional close and in-place reset capabilities of
//! [`Compressor`] / [`Decompressor`].

use std::io::{self, Read, Write};

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::config::DeflateConfig;

use super::{Compressor, Decompressor, SuffixedReader, TailBuffer};

const CHUNK: usize = 32 * 1024;

// zlib refuses an 8-bit window for raw deflate and silently uses 9.
const ZLIB_MIN_WINDOW_BITS: u8 = 9;

fn to_io(err: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Raw-deflate compressor whose `flush` is a sync flush.
pub struct DeflateEncoder<W: Write> {
    sink: W,
    compress: Compress,
    buf: Vec<u8>,
    closed: bool,
}

impl<W: Write> DeflateEncoder<W> {
    /// Create an encoder writing into `sink`.
    pub fn new(sink: W, config: &DeflateConfig) -> Self {
        let bits = config.max_window_bits.max(ZLIB_MIN_WINDOW_BITS);
        Self {
            sink,
            compress: Compress::new_with_window_bits(
                Compression::new(config.compression_level),
                false,
                bits,
            ),
            buf: Vec::with_capacity(CHUNK),
            closed: false,
        }
    }

    fn run(&mut self, input: &[u8], flush: FlushCompress) -> io::Result<(usize, Status)> {
        self.buf.clear();
        let before = self.compress.total_in();
        let status = self
            .compress
            .compress_vec(input, &mut self.buf, flush)
            .map_err(to_io)?;
        self.sink.write_all(&self.buf)?;
        Ok(((self.compress.total_in() - before) as usize, status))
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write to a closed compressor",
            ));
        }
        let mut input = data;
        while !input.is_empty() {
            let (consumed, _) = self.run(input, FlushCompress::None)?;
            input = &input[consumed..];
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // A full output buffer may hide more pending output.
        loop {
            self.run(&[], FlushCompress::Sync)?;
            if self.buf.len() < self.buf.capacity() {
                break;
            }
        }
        self.sink.flush()
    }
}

impl<W: Write> Compressor<W> for DeflateEncoder<W> {
    fn get_ref(&self) -> &W {
        &self.sink
    }

    fn close(&mut self) -> Option<io::Result<()>> {
        if self.closed {
            return Some(Ok(()));
        }
        let result = self.flush();
        self.closed = true;
        Some(result)
    }

    fn reset(&mut self, sink: W) -> Result<(), W> {
        self.compress.reset();
        self.sink = sink;
        self.closed = false;
        Ok(())
    }
}

/// Raw-deflate decompressor.
///
/// Always decodes with a 15-bit window, which covers every smaller window
/// the peer may have compressed with.
pub struct DeflateDecoder<R: Read> {
    source: R,
    decompress: Decompress,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    done: bool,
}

impl<R: Read> DeflateDecoder<R> {
    /// Create a decoder reading from `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            decompress: Decompress::new(false),
            buf: vec![0; CHUNK].into_boxed_slice(),
            pos: 0,
            end: 0,
            done: false,
        }
    }
}

impl<R: Read> Read for DeflateDecoder<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.done || out.is_empty() {
            return Ok(0);
        }
        loop {
            let mut eof = false;
            if self.pos == self.end {
                self.end = self.source.read(&mut self.buf)?;
                self.pos = 0;
                eof = self.end == 0;
            }

            let flush = if eof {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };
            let (in_before, out_before) = (self.decompress.total_in(), self.decompress.total_out());
            let status = self
                .decompress
                .decompress(&self.buf[self.pos..self.end], out, flush)
                .map_err(to_io)?;
            let consumed = (self.decompress.total_in() - in_before) as usize;
            let produced = (self.decompress.total_out() - out_before) as usize;
            self.pos += consumed;

            if status == Status::StreamEnd {
                self.done = true;
                return Ok(produced);
            }
            if produced > 0 {
                return Ok(produced);
            }
            if eof {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "deflate stream ended without a final block",
                ));
            }
        }
    }
}

impl<R: Read> Decompressor<R> for DeflateDecoder<R> {
    fn close(&mut self) -> Option<io::Result<()>> {
        self.pos = 0;
        self.end = 0;
        self.done = true;
        Some(Ok(()))
    }

    fn reset(&mut self, source: R) -> Result<(), R> {
        self.decompress.reset(false);
        self.source = source;
        self.pos = 0;
        self.end = 0;
        self.done = false;
        Ok(())
    }
}

/// Factory for [`Writer`](super::Writer) building [`DeflateEncoder`]s.
pub fn compressor_factory<'a, W: Write + 'a>(
    config: DeflateConfig,
) -> impl FnMut(TailBuffer<W>) -> Box<dyn Compressor<TailBuffer<W>> + 'a> + 'a {
    move |sink| -> Box<dyn Compressor<TailBuffer<W>> + 'a> {
        Box::new(DeflateEncoder::new(sink, &config))
    }
}

/// Factory for [`Reader`](super::Reader) building [`DeflateDecoder`]s.
pub fn decompressor_factory<'a, R: Read + 'a>()
-> impl FnMut(SuffixedReader<R>) -> Box<dyn Decompressor<SuffixedReader<R>> + 'a> + 'a {
    |source| -> Box<dyn Decompressor<SuffixedReader<R>> + 'a> {
        Box::new(DeflateDecoder::new(source))
    }
}
