// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Persists in-memory object graphs to files or streams.
//!
//! A value and everything reachable from it is written in one go, and
//! read back as an equivalent graph. Shared pointers (`Rc`, `Arc`) keep
//! their sharing: an allocation that is referenced from several places is
//! written once and restored as a single allocation. Cycles are supported
//! as long as they pass through a `RefCell`, `Mutex` or `RwLock` pointee,
//! e.g. `Rc<RefCell<_>>` nodes with `Weak` back pointers.
//!
//! The stream can optionally be compressed with DEFLATE or GZip:
//!
//! [codec] -> [compression filter] -> [file or stream]
//!
//! Types opt in by implementing [`Encode`] and [`Decode`].
//!
//! ```
//! use simple_storage::{CompressionType, Storage};
//!
//! # fn main() -> simple_storage::Result<()> {
//! let storage = Storage::default();
//!
//! let mut buf = vec![];
//! storage.write_to(&vec![1_i64, 2, 3], &mut buf, CompressionType::Gzip)?;
//!
//! let numbers: Vec<i64> = storage.read_from(&mut &buf[..], CompressionType::Gzip)?;
//! assert_eq!(numbers, [1, 2, 3]);
//! # Ok(())
//! # }
//! ```
//!
//! All (de)serialization of one [`Storage`] goes through a single codec,
//! one call at a time. Clones of a [`Storage`] share that codec; create
//! separate storages to (de)serialize in parallel.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]
#![deny(clippy::unwrap_used, clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]

mod codec;
mod coding;
mod compression;
mod config;
mod error;
mod save;
mod storage;
mod task;
mod version;

pub use {
    codec::GraphCodec,
    coding::{Decode, DecodeError, Decoder, Encode, EncodeError, Encoder},
    compression::{Algorithm, CompressionType},
    config::Config,
    error::{Error, Result},
    save::Save,
    storage::Storage,
    task::{CancellationToken, Task},
};
