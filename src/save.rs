// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{coding::Encode, CompressionType, Storage};
use std::path::Path;

/// Extension trait to write any encodable value to a file
///
/// ```no_run
/// use simple_storage::{CompressionType, Save, Storage};
///
/// # fn main() -> simple_storage::Result<()> {
/// let storage = Storage::default();
/// vec![1_u64, 2, 3].save(&storage, "numbers.data", CompressionType::Deflate)?;
/// # Ok(())
/// # }
/// ```
pub trait Save: Encode {
    /// Writes `self` to a file, see [`Storage::write`].
    ///
    /// # Errors
    ///
    /// Will return `Err` if the path is blank, an IO error occurs,
    /// or the graph cannot be encoded.
    fn save<P: AsRef<Path>>(
        &self,
        storage: &Storage,
        path: P,
        compression: CompressionType,
    ) -> crate::Result<()> {
        storage.write(self, path, compression)
    }
}

impl<T: Encode + ?Sized> Save for T {}
