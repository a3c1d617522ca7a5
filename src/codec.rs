// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError, Decoder, Encode, Encoder, IdentityMap},
    version::Version,
    Config,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use varint_rs::{VarintReader, VarintWriter};
use xxhash_rust::xxh3::Xxh3;

/// Longest root type name that is accepted while reading
const MAX_TYPE_NAME_LEN: u64 = 64 * 1_024;

/// Hashes everything that is written through it
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Xxh3,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = Write::write(&mut self.inner, buf)?;

        if let Some(written) = buf.get(..n) {
            self.hasher.update(written);
        }

        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Hashes everything that is read through it
struct HashingReader<R: Read> {
    inner: R,
    hasher: Xxh3,
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = Read::read(&mut self.inner, buf)?;

        if let Some(read) = buf.get(..n) {
            self.hasher.update(read);
        }

        Ok(n)
    }
}

/// Object graph codec
///
/// Writes one object graph per call, framed as
///
/// [header; 4 bytes][root type name][graph][xxh3 checksum; 8 bytes]
///
/// The codec keeps scratch state between calls, so it needs exclusive
/// access: a [`crate::Storage`] keeps its codec behind a mutex.
pub struct GraphCodec {
    max_sequence_len: u64,
    objects: IdentityMap,
}

impl GraphCodec {
    /// Creates a new codec.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            max_sequence_len: config.max_sequence_len,
            objects: IdentityMap::default(),
        }
    }

    /// Serializes an object graph into a writer.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the graph cannot be encoded.
    pub fn serialize<T: Encode + ?Sized, W: Write>(
        &mut self,
        writer: &mut W,
        value: &T,
    ) -> crate::Result<()> {
        self.objects.clear();

        let mut writer = HashingWriter {
            inner: writer,
            hasher: Xxh3::new(),
        };

        Version::V1.write_header(&mut writer)?;

        let type_name = <T as Encode>::type_name();
        writer.write_u64_varint(type_name.len() as u64)?;
        writer.write_all(type_name.as_bytes())?;

        value.encode_into(&mut Encoder::new(&mut writer, &mut self.objects))?;

        let checksum = writer.hasher.digest();
        writer.inner.write_u64::<BigEndian>(checksum)?;

        log::trace!(
            "Serialized {type_name} ({} shared objects, checksum={checksum:#018x})",
            self.objects.len(),
        );

        self.objects.clear();

        Ok(())
    }

    /// Deserializes an object graph from a reader.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, the stream is malformed,
    /// or the stream does not hold a `T`.
    pub fn deserialize<T: Decode, R: Read>(&mut self, reader: &mut R) -> crate::Result<T> {
        let mut reader = HashingReader {
            inner: reader,
            hasher: Xxh3::new(),
        };

        let version = Version::read_header(&mut reader)?;

        let type_name = {
            let len = reader.read_u64_varint()?;

            if len > MAX_TYPE_NAME_LEN {
                return Err(DecodeError::LengthLimitExceeded(len).into());
            }

            let mut bytes = vec![0; len as usize];
            reader.read_exact(&mut bytes)?;
            String::from_utf8(bytes).map_err(DecodeError::from)?
        };

        let expected = <T as Decode>::type_name();

        if type_name != expected {
            return Err(crate::Error::TypeMismatch {
                expected: expected.into_owned(),
                found: type_name,
            });
        }

        let value = T::decode_from(&mut Decoder::new(&mut reader, self.max_sequence_len))?;

        let got = reader.hasher.digest();
        let checksum = reader.inner.read_u64::<BigEndian>()?;

        if got != checksum {
            return Err(crate::Error::ChecksumMismatch {
                expected: checksum,
                got,
            });
        }

        log::trace!("Deserialized {type_name} (format version {version})");

        Ok(value)
    }
}
