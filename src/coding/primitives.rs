// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{Decode, DecodeError, Decoder, Encode, EncodeError, Encoder, PREALLOCATION_LIMIT};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::{BuildHasher, Hash},
    io::{Read, Write},
};

macro_rules! impl_big_endian {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
                    writer.$write::<BigEndian>(*self)?;
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
                    Ok(reader.$read::<BigEndian>()?)
                }
            }
        )*
    };
}

impl_big_endian! {
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    u128 => write_u128, read_u128;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    i128 => write_i128, read_i128;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl Encode for u8 {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_u8(*self)?;
        Ok(())
    }
}

impl Decode for u8 {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(reader.read_u8()?)
    }
}

impl Encode for i8 {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_i8(*self)?;
        Ok(())
    }
}

impl Decode for i8 {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(reader.read_i8()?)
    }
}

// NOTE: Pointer-sized integers are always stored as 64-bit
impl Encode for usize {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_u64::<BigEndian>(*self as u64)?;
        Ok(())
    }
}

impl Decode for usize {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        let value = reader.read_u64::<BigEndian>()?;
        Self::try_from(value).map_err(|_| DecodeError::OutOfRange("usize"))
    }
}

impl Encode for isize {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_i64::<BigEndian>(*self as i64)?;
        Ok(())
    }
}

impl Decode for isize {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        let value = reader.read_i64::<BigEndian>()?;
        Self::try_from(value).map_err(|_| DecodeError::OutOfRange("isize"))
    }
}

impl Encode for bool {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_u8(u8::from(*self))?;
        Ok(())
    }
}

impl Decode for bool {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(DecodeError::InvalidTag(("bool", tag))),
        }
    }
}

impl Encode for char {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_u32::<BigEndian>(u32::from(*self))?;
        Ok(())
    }
}

impl Decode for char {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        let value = reader.read_u32::<BigEndian>()?;
        Self::from_u32(value).ok_or(DecodeError::OutOfRange("char"))
    }
}

impl Encode for () {
    fn encode_into<W: Write>(&self, _: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        Ok(())
    }
}

impl Decode for () {
    fn decode_from<R: Read>(_: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl Encode for str {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<String>())
    }

    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_len(self.len())?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl Encode for String {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        self.as_str().encode_into(writer)
    }
}

impl Decode for String {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        let len = reader.read_len()?;

        let mut bytes = Vec::with_capacity(len.min(PREALLOCATION_LIMIT));
        (&mut *reader).take(len as u64).read_to_end(&mut bytes)?;

        if bytes.len() != len {
            return Err(DecodeError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        Ok(Self::from_utf8(bytes)?)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn type_name() -> Cow<'static, str> {
        <T as Encode>::type_name()
    }

    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        (**self).encode_into(writer)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn type_name() -> Cow<'static, str> {
        <T as Encode>::type_name()
    }

    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        (**self).encode_into(writer)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn type_name() -> Cow<'static, str> {
        <T as Decode>::type_name()
    }

    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        T::decode_from(reader).map(Self::new)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        match self {
            None => writer.write_u8(0)?,
            Some(value) => {
                writer.write_u8(1)?;
                value.encode_into(writer)?;
            }
        }

        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => T::decode_from(reader).map(Some),
            tag => Err(DecodeError::InvalidTag(("Option", tag))),
        }
    }
}

fn encode_sequence<'a, W, T, I>(
    writer: &mut Encoder<'_, W>,
    len: usize,
    items: I,
) -> Result<(), EncodeError>
where
    W: Write,
    T: Encode + 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
{
    writer.write_len(len)?;

    for item in items {
        item.encode_into(writer)?;
    }

    Ok(())
}

fn decode_sequence<R, T, C>(
    reader: &mut Decoder<R>,
    with_capacity: impl FnOnce(usize) -> C,
    mut push: impl FnMut(&mut C, T),
) -> Result<C, DecodeError>
where
    R: Read,
    T: Decode,
{
    let len = reader.read_len()?;
    let mut collection = with_capacity(len.min(PREALLOCATION_LIMIT));

    for _ in 0..len {
        let item = T::decode_from(reader)?;
        push(&mut collection, item);
    }

    Ok(collection)
}

impl<T: Encode> Encode for [T] {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Vec<T>>())
    }

    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_sequence(writer, self.len(), self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        self.as_slice().encode_into(writer)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(reader, Self::with_capacity, Self::push)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_sequence(writer, self.len(), self)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(reader, Self::with_capacity, Self::push_back)
    }
}

// NOTE: Arrays have a fixed length, so no length prefix is written
impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        for item in self {
            item.encode_into(writer)?;
        }
        Ok(())
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode_from(reader)?);
        }
        items
            .try_into()
            .map_err(|_| DecodeError::OutOfRange("array"))
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_sequence(writer, self.len(), self)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(
            reader,
            |_| Self::new(),
            |set: &mut Self, item: T| {
                set.insert(item);
            },
        )
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_sequence(writer, self.len(), self)
    }
}

impl<T: Decode + Eq + Hash, S: BuildHasher + Default> Decode for HashSet<T, S> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(
            reader,
            |capacity| Self::with_capacity_and_hasher(capacity, S::default()),
            |set: &mut Self, item: T| {
                set.insert(item);
            },
        )
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_len(self.len())?;

        for (key, value) in self {
            key.encode_into(writer)?;
            value.encode_into(writer)?;
        }

        Ok(())
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(
            reader,
            |_| Self::new(),
            |map: &mut Self, (key, value): (K, V)| {
                map.insert(key, value);
            },
        )
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        writer.write_len(self.len())?;

        for (key, value) in self {
            key.encode_into(writer)?;
            value.encode_into(writer)?;
        }

        Ok(())
    }
}

impl<K: Decode + Eq + Hash, V: Decode, S: BuildHasher + Default> Decode for HashMap<K, V, S> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_sequence(
            reader,
            |capacity| Self::with_capacity_and_hasher(capacity, S::default()),
            |map: &mut Self, (key, value): (K, V)| {
                map.insert(key, value);
            },
        )
    }
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
                let ($($name,)+) = self;
                $($name.encode_into(writer)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
                Ok(($($name::decode_from(reader)?,)+))
            }
        }
    };
}

impl_tuple!(A);
impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn coding_integers_are_big_endian() -> Result<(), EncodeError> {
        assert_eq!(0x0102_u16.encode_into_vec()?, [1, 2]);
        assert_eq!((-1_i32).encode_into_vec()?, [0xFF; 4]);
        assert_eq!(7_usize.encode_into_vec()?, [0, 0, 0, 0, 0, 0, 0, 7]);
        Ok(())
    }

    #[test]
    fn coding_string_is_length_prefixed() -> Result<(), EncodeError> {
        assert_eq!("abc".encode_into_vec()?, [3, b'a', b'b', b'c']);
        assert_eq!(String::new().encode_into_vec()?, [0]);
        Ok(())
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn coding_collections() {
        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), vec![Some(1_i64), None]);
        map.insert("b".to_owned(), vec![]);

        let value = (map, VecDeque::from([1.5_f64, -0.25]), ['x', 'y'], true);
        let bytes = value.encode_into_vec().expect("should encode");

        let decoded =
            <(BTreeMap<String, Vec<Option<i64>>>, VecDeque<f64>, [char; 2], bool)>::decode_from_slice(
                &bytes,
            )
            .expect("should decode");

        assert_eq!(value, decoded);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn coding_hash_collections() {
        let map: HashMap<u32, String> = (0..100).map(|x| (x, x.to_string())).collect();
        let set: HashSet<i16> = (-50..50).collect();

        let bytes = (&map, &set).encode_into_vec().expect("should encode");
        let decoded = <(HashMap<u32, String>, HashSet<i16>)>::decode_from_slice(&bytes)
            .expect("should decode");

        assert_eq!((map, set), decoded);
    }

    #[test]
    fn coding_invalid_bool_tag() {
        assert!(matches!(
            bool::decode_from_slice(&[2]),
            Err(DecodeError::InvalidTag(("bool", 2)))
        ));
    }

    #[test]
    fn coding_invalid_utf8() {
        assert!(matches!(
            String::decode_from_slice(&[2, 0xC3, 0x28]),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn coding_truncated_string() {
        assert!(matches!(
            String::decode_from_slice(&[5, b'a']),
            Err(DecodeError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn coding_length_limit() {
        let mut decoder = Decoder::new(&[200_u8, 1][..], 100);
        assert!(matches!(
            Vec::<u8>::decode_from(&mut decoder),
            Err(DecodeError::LengthLimitExceeded(200))
        ));
    }
}
