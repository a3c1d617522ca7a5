// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::{DecodeError, EncodeError};

/// Represents errors that can occur while storing or loading object graphs
#[derive(Debug)]
pub enum Error {
    /// I/O error of the underlying file or stream
    Io(std::io::Error),

    /// A required argument was empty
    InvalidArgument(&'static str),

    /// The requested operation is not available, e.g. compressing
    /// without a compression algorithm
    UnsupportedOperation(&'static str),

    /// The operation was cancelled before it started
    Cancelled,

    /// Encoding the object graph failed
    Encode(EncodeError),

    /// Decoding the object graph failed
    Decode(DecodeError),

    /// Invalid or unknown stream format version
    InvalidVersion(Option<u8>),

    /// The stream's checksum does not match its contents
    ChecksumMismatch {
        /// Checksum stored in the stream
        expected: u64,

        /// Checksum of the bytes that were actually read
        got: u64,
    },

    /// The stored root value is not of the requested type
    TypeMismatch {
        /// Type that was requested
        expected: String,

        /// Type that was stored
        found: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidArgument(name) => write!(f, "invalid argument: {name}"),
            Self::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Self::Cancelled => write!(f, "operation was cancelled"),
            Self::Encode(e) => write!(f, "encoding failed: {e:?}"),
            Self::Decode(e) => write!(f, "decoding failed: {e:?}"),
            Self::InvalidVersion(Some(v)) => write!(f, "unsupported format version {v}"),
            Self::InvalidVersion(None) => write!(f, "not an object graph stream"),
            Self::ChecksumMismatch { expected, got } => {
                write!(f, "checksum mismatch: expected {expected:#018x}, got {got:#018x}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: requested {expected}, stream holds {found}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

// NOTE: I/O failures inside the codec surface as plain I/O errors
impl From<EncodeError> for Error {
    fn from(value: EncodeError) -> Self {
        match value {
            EncodeError::Io(e) => Self::Io(e),
            e => Self::Encode(e),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        match value {
            DecodeError::Io(e) => Self::Io(e),
            e => Self::Decode(e),
        }
    }
}

/// Storage result
pub type Result<T> = std::result::Result<T, Error>;
