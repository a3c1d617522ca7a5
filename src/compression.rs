// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use flate2::{
    read::{DeflateDecoder, GzDecoder},
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use std::io::{Read, Write};

/// Compression type
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CompressionType {
    /// No compression, the stream is passed through
    #[default]
    None,

    /// Raw DEFLATE stream
    Deflate,

    /// GZip stream (DEFLATE with GZip header and CRC trailer)
    Gzip,
}

impl CompressionType {
    /// Returns the algorithm to compress with, or `None` for pass-through.
    #[must_use]
    pub fn algorithm(self) -> Option<Algorithm> {
        Algorithm::try_from(self).ok()
    }
}

impl From<CompressionType> for u8 {
    fn from(val: CompressionType) -> Self {
        match val {
            CompressionType::None => 0,
            CompressionType::Deflate => 1,
            CompressionType::Gzip => 2,
        }
    }
}

impl TryFrom<u8> for CompressionType {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Deflate),
            2 => Ok(Self::Gzip),
            _ => Err(crate::Error::UnsupportedOperation(
                "unknown compression algorithm",
            )),
        }
    }
}

impl std::str::FromStr for CompressionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "deflate" => Ok(Self::Deflate),
            "gzip" | "gz" => Ok(Self::Gzip),
            _ => Err(crate::Error::UnsupportedOperation(
                "unknown compression algorithm",
            )),
        }
    }
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::Deflate => "deflate",
                Self::Gzip => "gzip",
            }
        )
    }
}

/// Compression algorithm of the compression adapter
///
/// Unlike [`CompressionType`], this cannot express "no compression".
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// Raw DEFLATE stream
    Deflate,

    /// GZip stream
    Gzip,
}

impl From<Algorithm> for CompressionType {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::Deflate => Self::Deflate,
            Algorithm::Gzip => Self::Gzip,
        }
    }
}

impl TryFrom<CompressionType> for Algorithm {
    type Error = crate::Error;

    fn try_from(value: CompressionType) -> Result<Self, Self::Error> {
        match value {
            CompressionType::Deflate => Ok(Self::Deflate),
            CompressionType::Gzip => Ok(Self::Gzip),
            CompressionType::None => Err(crate::Error::UnsupportedOperation(
                "no compression algorithm selected",
            )),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&CompressionType::from(*self), f)
    }
}

impl Algorithm {
    /// Compression level is fixed to the fastest setting
    fn level() -> Compression {
        Compression::fast()
    }

    pub(crate) fn compressor<W: Write>(self, writer: W) -> Compressor<W> {
        match self {
            Self::Deflate => Compressor::Deflate(DeflateEncoder::new(writer, Self::level())),
            Self::Gzip => Compressor::Gzip(GzEncoder::new(writer, Self::level())),
        }
    }

    pub(crate) fn decompressor<R: Read>(self, reader: R) -> Decompressor<R> {
        match self {
            Self::Deflate => Decompressor::Deflate(DeflateDecoder::new(reader)),
            Self::Gzip => Decompressor::Gzip(GzDecoder::new(reader)),
        }
    }
}

/// Compressing filter over a writer
///
/// Dropping the filter without calling [`Compressor::finish`] still
/// flushes as much as possible, but swallows errors.
pub(crate) enum Compressor<W: Write> {
    Deflate(DeflateEncoder<W>),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Compressor<W> {
    /// Writes all pending compressed output and returns the underlying writer.
    pub(crate) fn finish(self) -> std::io::Result<W> {
        match self {
            Self::Deflate(e) => e.finish(),
            Self::Gzip(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Deflate(e) => e.write(buf),
            Self::Gzip(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Deflate(e) => e.flush(),
            Self::Gzip(e) => e.flush(),
        }
    }
}

/// Decompressing filter over a reader
pub(crate) enum Decompressor<R: Read> {
    Deflate(DeflateDecoder<R>),
    Gzip(GzDecoder<R>),
}

impl<R: Read> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Deflate(d) => d.read(buf),
            Self::Gzip(d) => d.read(buf),
        }
    }
}
