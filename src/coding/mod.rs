// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Trait-based object graph coding.
//!
//! Every persisted type implements [`Encode`] and [`Decode`]. Both traits are
//! handed an [`Encoder`]/[`Decoder`] instead of a bare writer/reader: these
//! implement [`Write`]/[`Read`] (so `byteorder` and `varint-rs` extension
//! traits work on them directly), and additionally carry the identity table
//! that lets shared pointers (`Rc`, `Arc`, `Weak`) be written once and
//! restored as shared allocations, including cycles.

mod primitives;
mod shared;

use std::{
    any::Any,
    borrow::Cow,
    io::{Read, Write},
};
use varint_rs::{VarintReader, VarintWriter};

/// Maps the address of a shared allocation to its object id
pub(crate) type IdentityMap = ahash::AHashMap<usize, u64>;

/// Initial capacity limit for decoded collections
///
/// The length prefix of a corrupted stream should not be able to
/// trigger a huge allocation up front.
pub(crate) const PREALLOCATION_LIMIT: usize = 4_096;

/// Error during serialization
#[derive(Debug)]
pub enum EncodeError {
    /// I/O error
    Io(std::io::Error),

    /// A `RefCell` in the graph was mutably borrowed while encoding
    Borrowed(&'static str),
}

/// Error during deserialization
#[derive(Debug)]
pub enum DecodeError {
    /// I/O error
    Io(std::io::Error),

    /// Invalid enum tag
    InvalidTag((&'static str, u8)),

    /// Invalid UTF-8 in a string
    Utf8(std::string::FromUtf8Error),

    /// Value does not fit into the requested type
    OutOfRange(&'static str),

    /// Length prefix is larger than the configured limit
    LengthLimitExceeded(u64),

    /// Back reference to an object id that was never defined
    InvalidReference(u64),

    /// Back reference to an object that is still being decoded,
    /// and whose type cannot hand out a placeholder
    UnresolvedReference(u64),

    /// Back reference to an object of a different type
    ReferenceTypeMismatch(u64),
}

impl From<std::io::Error> for EncodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}

/// Writing half of the object graph coding
///
/// Wraps the destination writer and tracks which shared allocations
/// were already written.
pub struct Encoder<'a, W: Write> {
    inner: W,
    objects: &'a mut IdentityMap,
}

impl<'a, W: Write> Encoder<'a, W> {
    pub(crate) fn new(inner: W, objects: &'a mut IdentityMap) -> Self {
        Self { inner, objects }
    }

    /// Registers a shared allocation by its address.
    ///
    /// Returns the object id if the allocation was already written,
    /// otherwise assigns the next id and returns `None`.
    pub(crate) fn register_object(&mut self, address: usize) -> Option<u64> {
        let next_id = self.objects.len() as u64;

        match self.objects.entry(address) {
            std::collections::hash_map::Entry::Occupied(entry) => Some(*entry.get()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(next_id);
                None
            }
        }
    }

    /// Writes a length prefix.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    pub fn write_len(&mut self, len: usize) -> Result<(), EncodeError> {
        self.write_u64_varint(len as u64)?;
        Ok(())
    }
}

impl<W: Write> Write for Encoder<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Write::write(&mut self.inner, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

enum Slot {
    Pending,
    Resolved(Box<dyn Any>),
}

/// Reading half of the object graph coding
///
/// Wraps the source reader and remembers every shared allocation
/// that was restored, so back references resolve to the same allocation.
pub struct Decoder<R: Read> {
    inner: R,
    objects: Vec<Slot>,
    max_sequence_len: u64,
}

impl<R: Read> Decoder<R> {
    pub(crate) fn new(inner: R, max_sequence_len: u64) -> Self {
        Self {
            inner,
            objects: Vec::new(),
            max_sequence_len,
        }
    }

    /// Reserves the next object id for an allocation that is about to be decoded
    pub(crate) fn reserve_object(&mut self) -> u64 {
        self.objects.push(Slot::Pending);
        self.objects.len() as u64 - 1
    }

    pub(crate) fn resolve_object<P: 'static>(&mut self, id: u64, pointer: P) {
        let slot = usize::try_from(id)
            .ok()
            .and_then(|idx| self.objects.get_mut(idx));

        if let Some(slot) = slot {
            *slot = Slot::Resolved(Box::new(pointer));
        }
    }

    pub(crate) fn lookup_object<P: Clone + 'static>(&self, id: u64) -> Result<P, DecodeError> {
        let slot = usize::try_from(id)
            .ok()
            .and_then(|idx| self.objects.get(idx))
            .ok_or(DecodeError::InvalidReference(id))?;

        match slot {
            Slot::Pending => Err(DecodeError::UnresolvedReference(id)),
            Slot::Resolved(pointer) => pointer
                .downcast_ref::<P>()
                .cloned()
                .ok_or(DecodeError::ReferenceTypeMismatch(id)),
        }
    }

    /// Reads a length prefix, checking it against the configured limit.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the length is too large.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_u64_varint()?;

        if len > self.max_sequence_len {
            return Err(DecodeError::LengthLimitExceeded(len));
        }

        usize::try_from(len).map_err(|_| DecodeError::LengthLimitExceeded(len))
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Read::read(&mut self.inner, buf)
    }
}

/// Trait to serialize stuff
///
/// Nested shared pointers are encoded recursively, so the depth of a graph
/// (e.g. the length of a linked list built from `Rc`s) is bounded by the
/// stack of the encoding thread. Wide graphs are not affected.
pub trait Encode {
    /// Name of the type that reads this value back, stored in the frame header.
    ///
    /// Borrowed and unsized forms report their owned counterpart,
    /// so `str` is stored as `String` and `[T]` as `Vec<T>`.
    #[must_use]
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Serializes into writer.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the graph cannot be encoded.
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError>;

    /// Serializes into vector.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the graph cannot be encoded.
    fn encode_into_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut objects = IdentityMap::default();
        let mut v = vec![];
        self.encode_into(&mut Encoder::new(&mut v, &mut objects))?;
        Ok(v)
    }
}

/// Trait to deserialize stuff
///
/// Like encoding, decoding recurses once per nested shared pointer,
/// see [`Encode`].
pub trait Decode: Sized {
    /// Name of the stored type this type accepts, see [`Encode::type_name`].
    #[must_use]
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Deserializes from reader.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the data is malformed.
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError>;

    /// Deserializes from a byte slice produced by [`Encode::encode_into_vec`].
    ///
    /// # Errors
    ///
    /// Will return `Err` if the data is malformed.
    fn decode_from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_from(&mut Decoder::new(bytes, u64::MAX))
    }

    /// Returns an empty value that can be shared before its contents are decoded.
    ///
    /// Types with interior mutability return `Some`, which allows a shared
    /// pointer to them to be referenced from inside its own contents (cycles).
    #[must_use]
    fn placeholder() -> Option<Self> {
        None
    }

    /// Moves the decoded contents into a placeholder created by [`Decode::placeholder`].
    fn fill_placeholder(&self, _value: Self) {}
}
