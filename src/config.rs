// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Storage configuration
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Config {
    /// Capacity of the buffers wrapped around files opened by path
    pub(crate) buffer_capacity: usize,

    /// Whether written files are synced to disk before returning
    pub(crate) sync_on_write: bool,

    /// Largest length prefix accepted while decoding
    pub(crate) max_sequence_len: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: 64 * 1_024,
            sync_on_write: false,
            max_sequence_len: u32::MAX.into(),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the buffer capacity used for files opened by path.
    ///
    /// Default = 64 KiB
    #[must_use]
    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes;
        self
    }

    /// If enabled, files written by path are `fsync`ed before
    /// the write returns.
    ///
    /// Default = false
    #[must_use]
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Sets the largest collection or string length that is accepted
    /// while decoding.
    ///
    /// Guards against corrupted streams announcing absurd lengths.
    ///
    /// Default = 2^32 - 1
    #[must_use]
    pub fn max_sequence_len(mut self, len: u64) -> Self {
        self.max_sequence_len = len;
        self
    }
}
