// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, Encode},
    codec::GraphCodec,
    compression::{Algorithm, CompressionType},
    task::{CancellationToken, Task},
    Config,
};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

fn check_path(path: &Path) -> crate::Result<()> {
    let is_blank = path
        .to_str()
        .map_or_else(|| path.as_os_str().is_empty(), |s| s.trim().is_empty());

    if is_blank {
        return Err(crate::Error::InvalidArgument("path"));
    }

    Ok(())
}

/// Stores and loads object graphs
///
/// Cloning is cheap: clones share the same codec.
#[derive(Clone)]
pub struct Storage(Arc<StorageInner>);

impl std::ops::Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Shared state behind a [`Storage`] handle
#[allow(clippy::module_name_repetitions)]
pub struct StorageInner {
    config: Config,

    /// Every (de)serialization goes through this codec, one at a time
    codec: Mutex<GraphCodec>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Storage {
    /// Creates a storage with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let codec = GraphCodec::new(&config);

        Self(Arc::new(StorageInner {
            config,
            codec: Mutex::new(codec),
        }))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    // NOTE: The codec resets its scratch state on every call,
    // so a panic during another call does not leave it unusable
    fn codec(&self) -> MutexGuard<'_, GraphCodec> {
        self.codec.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes an object graph into a stream.
    ///
    /// The stream is not closed or flushed beyond what the compression
    /// filter (if any) needs.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the graph cannot be encoded.
    pub fn write_to<T: Encode + ?Sized, W: Write>(
        &self,
        value: &T,
        destination: &mut W,
        compression: CompressionType,
    ) -> crate::Result<()> {
        if let Some(algorithm) = compression.algorithm() {
            return self.compress(value, destination, algorithm);
        }

        self.codec().serialize(destination, value)
    }

    /// Writes an object graph into a file, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the path is blank, an IO error occurs,
    /// or the graph cannot be encoded.
    pub fn write<T: Encode + ?Sized, P: AsRef<Path>>(
        &self,
        value: &T,
        path: P,
        compression: CompressionType,
    ) -> crate::Result<()> {
        let path = path.as_ref();
        check_path(path)?;

        log::debug!("Writing {} to {path:?} (compression={compression})", std::any::type_name::<T>());

        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(self.config.buffer_capacity, file);

        self.write_to(value, &mut writer, compression)?;

        writer.flush()?;

        if self.config.sync_on_write {
            writer.get_ref().sync_all()?;
        }

        Ok(())
    }

    /// Reads an object graph from a stream.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, the stream is malformed,
    /// or the stream does not hold a `T`.
    pub fn read_from<T: Decode, R: Read>(
        &self,
        source: &mut R,
        compression: CompressionType,
    ) -> crate::Result<T> {
        if let Some(algorithm) = compression.algorithm() {
            return self.decompress(source, algorithm);
        }

        self.codec().deserialize(source)
    }

    /// Reads an object graph from a file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the path is blank, an IO error occurs,
    /// the file is malformed, or the file does not hold a `T`.
    pub fn read<T: Decode, P: AsRef<Path>>(
        &self,
        path: P,
        compression: CompressionType,
    ) -> crate::Result<T> {
        let path = path.as_ref();
        check_path(path)?;

        log::debug!("Reading {} from {path:?} (compression={compression})", std::any::type_name::<T>());

        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(self.config.buffer_capacity, file);

        self.read_from(&mut reader, compression)
    }

    /// Writes an object graph through a compressing filter.
    ///
    /// Only the filter is finished, `destination` itself stays open,
    /// so more data can be written after the compressed graph.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the graph cannot be encoded.
    pub fn compress<T: Encode + ?Sized, W: Write>(
        &self,
        value: &T,
        destination: &mut W,
        algorithm: Algorithm,
    ) -> crate::Result<()> {
        let mut compressor = algorithm.compressor(destination);

        // NOTE: On error, dropping the compressor flushes what it can
        self.codec().serialize(&mut compressor, value)?;

        compressor.finish()?;

        log::trace!("Compressed {} with {algorithm}", std::any::type_name::<T>());

        Ok(())
    }

    /// Reads an object graph through a decompressing filter.
    ///
    /// The decompressing filter may read ahead, so the position of
    /// `source` afterwards is unspecified.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, the stream is malformed,
    /// or the stream does not hold a `T`.
    pub fn decompress<T: Decode, R: Read>(
        &self,
        source: &mut R,
        algorithm: Algorithm,
    ) -> crate::Result<T> {
        let mut decompressor = algorithm.decompressor(source);
        let value = self.codec().deserialize(&mut decompressor)?;

        log::trace!("Decompressed {} with {algorithm}", std::any::type_name::<T>());

        Ok(value)
    }

    /// Writes an object graph into a file on a worker thread.
    ///
    /// If `cancel` is already cancelled, the task fails with
    /// [`crate::Error::Cancelled`] without touching the file.
    pub fn write_async<T, P>(
        &self,
        value: T,
        path: P,
        compression: CompressionType,
        cancel: &CancellationToken,
    ) -> Task<()>
    where
        T: Encode + Send + 'static,
        P: Into<PathBuf>,
    {
        let path = path.into();

        if let Err(e) = check_path(&path) {
            return Task::ready(Err(e));
        }

        if cancel.is_cancelled() {
            log::debug!("Not writing to {path:?}, operation was cancelled");
            return Task::ready(Err(crate::Error::Cancelled));
        }

        let storage = self.clone();
        Task::spawn(move || storage.write(&value, &path, compression))
    }

    /// Writes an object graph into a stream on a worker thread.
    ///
    /// The stream is handed back once the graph is written.
    pub fn write_to_async<T, W>(
        &self,
        value: T,
        mut destination: W,
        compression: CompressionType,
        cancel: &CancellationToken,
    ) -> Task<W>
    where
        T: Encode + Send + 'static,
        W: Write + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Task::ready(Err(crate::Error::Cancelled));
        }

        let storage = self.clone();
        Task::spawn(move || {
            storage.write_to(&value, &mut destination, compression)?;
            Ok(destination)
        })
    }

    /// Reads an object graph from a file on a worker thread.
    ///
    /// If `cancel` is already cancelled, the task fails with
    /// [`crate::Error::Cancelled`] without opening the file.
    pub fn read_async<T, P>(
        &self,
        path: P,
        compression: CompressionType,
        cancel: &CancellationToken,
    ) -> Task<T>
    where
        T: Decode + Send + 'static,
        P: Into<PathBuf>,
    {
        let path = path.into();

        if let Err(e) = check_path(&path) {
            return Task::ready(Err(e));
        }

        if cancel.is_cancelled() {
            log::debug!("Not reading from {path:?}, operation was cancelled");
            return Task::ready(Err(crate::Error::Cancelled));
        }

        let storage = self.clone();
        Task::spawn(move || storage.read(&path, compression))
    }

    /// Reads an object graph from a stream on a worker thread.
    ///
    /// The stream is handed back together with the value.
    pub fn read_from_async<T, R>(
        &self,
        mut source: R,
        compression: CompressionType,
        cancel: &CancellationToken,
    ) -> Task<(T, R)>
    where
        T: Decode + Send + 'static,
        R: Read + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Task::ready(Err(crate::Error::Cancelled));
        }

        let storage = self.clone();
        Task::spawn(move || {
            let value = storage.read_from(&mut source, compression)?;
            Ok((value, source))
        })
    }
}
