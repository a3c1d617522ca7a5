// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use byteorder::WriteBytesExt;
use std::io::Read;

/// Object graph stream format version
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Version {
    /// Version for 0.x releases
    V1,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        match value {
            Version::V1 => 1,
        }
    }
}

impl TryFrom<u8> for Version {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            _ => Err(()),
        }
    }
}

const MAGIC_BYTES: [u8; 3] = [b'S', b'G', b'R'];

impl Version {
    pub(crate) const fn len() -> u8 {
        4
    }

    /// Parses a stream header, returning the version byte if the magic matches.
    pub(crate) fn parse_header(bytes: &[u8]) -> Option<u8> {
        let first_three = bytes.get(0..3)?;

        if first_three == MAGIC_BYTES {
            bytes.get(3).copied()
        } else {
            None
        }
    }

    pub(crate) fn read_header<R: Read>(reader: &mut R) -> crate::Result<Self> {
        let mut bytes = [0; MAGIC_BYTES.len() + 1];
        reader.read_exact(&mut bytes)?;

        let version = Self::parse_header(&bytes).ok_or(crate::Error::InvalidVersion(None))?;
        Self::try_from(version).map_err(|()| crate::Error::InvalidVersion(Some(version)))
    }

    pub(crate) fn write_header<W: std::io::Write>(self, writer: &mut W) -> std::io::Result<usize> {
        writer.write_all(&MAGIC_BYTES)?;
        writer.write_u8(u8::from(self))?;
        Ok(Self::len().into())
    }
}
