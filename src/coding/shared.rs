// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{Decode, DecodeError, Decoder, Encode, EncodeError, Encoder};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::{
    cell::{Cell, RefCell},
    io::{Read, Write},
    ops::Deref,
    rc::Rc,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use varint_rs::{VarintReader, VarintWriter};

/// Dead weak pointer
const NULL: u8 = 0;

/// First occurrence of an allocation, its contents follow
const NEW_OBJECT: u8 = 1;

/// Later occurrence of an allocation, followed by its object id
const BACK_REFERENCE: u8 = 2;

fn encode_shared<W: Write, T: Encode + ?Sized>(
    writer: &mut Encoder<'_, W>,
    pointer: *const T,
    value: &T,
) -> Result<(), EncodeError> {
    // NOTE: Only the address is used as identity, the metadata of fat pointers is dropped
    let address = pointer.cast::<()>() as usize;

    if let Some(id) = writer.register_object(address) {
        writer.write_u8(BACK_REFERENCE)?;
        writer.write_u64_varint(id)?;
    } else {
        writer.write_u8(NEW_OBJECT)?;
        value.encode_into(writer)?;
    }

    Ok(())
}

fn decode_new<R, T, P>(reader: &mut Decoder<R>, wrap: fn(T) -> P) -> Result<P, DecodeError>
where
    R: Read,
    T: Decode,
    P: Deref<Target = T> + Clone + 'static,
{
    let id = reader.reserve_object();

    // The allocation has to be registered before its contents are decoded,
    // so that references back to it from inside its contents can resolve
    if let Some(placeholder) = T::placeholder() {
        let pointer = wrap(placeholder);
        reader.resolve_object(id, pointer.clone());

        let value = T::decode_from(reader)?;
        pointer.fill_placeholder(value);

        Ok(pointer)
    } else {
        let pointer = wrap(T::decode_from(reader)?);
        reader.resolve_object(id, pointer.clone());
        Ok(pointer)
    }
}

fn decode_shared<R, T, P>(
    reader: &mut Decoder<R>,
    wrap: fn(T) -> P,
) -> Result<Option<P>, DecodeError>
where
    R: Read,
    T: Decode,
    P: Deref<Target = T> + Clone + 'static,
{
    match reader.read_u8()? {
        NULL => Ok(None),
        NEW_OBJECT => decode_new(reader, wrap).map(Some),
        BACK_REFERENCE => {
            let id = reader.read_u64_varint()?;
            reader.lookup_object(id).map(Some)
        }
        tag => Err(DecodeError::InvalidTag(("SharedPointer", tag))),
    }
}

impl<T: Encode + ?Sized> Encode for Rc<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_shared(writer, Self::as_ptr(self), self)
    }
}

impl<T: Decode + 'static> Decode for Rc<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_shared(reader, Self::new)?.ok_or(DecodeError::InvalidTag(("Rc", NULL)))
    }
}

impl<T: Encode> Encode for std::rc::Weak<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        match self.upgrade() {
            Some(pointer) => pointer.encode_into(writer),
            None => {
                writer.write_u8(NULL)?;
                Ok(())
            }
        }
    }
}

impl<T: Decode + 'static> Decode for std::rc::Weak<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(decode_shared(reader, Rc::new)?
            .map(|pointer| Rc::downgrade(&pointer))
            .unwrap_or_default())
    }
}

impl<T: Encode + ?Sized> Encode for Arc<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        encode_shared(writer, Self::as_ptr(self), self)
    }
}

impl<T: Decode + 'static> Decode for Arc<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        decode_shared(reader, Self::new)?.ok_or(DecodeError::InvalidTag(("Arc", NULL)))
    }
}

impl<T: Encode> Encode for std::sync::Weak<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        match self.upgrade() {
            Some(pointer) => pointer.encode_into(writer),
            None => {
                writer.write_u8(NULL)?;
                Ok(())
            }
        }
    }
}

impl<T: Decode + 'static> Decode for std::sync::Weak<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(decode_shared(reader, Arc::new)?
            .map(|pointer| Arc::downgrade(&pointer))
            .unwrap_or_default())
    }
}

impl<T: Encode + Copy> Encode for Cell<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        self.get().encode_into(writer)
    }
}

impl<T: Decode> Decode for Cell<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        T::decode_from(reader).map(Self::new)
    }
}

impl<T: Encode> Encode for RefCell<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        let value = self
            .try_borrow()
            .map_err(|_| EncodeError::Borrowed(std::any::type_name::<T>()))?;

        value.encode_into(writer)
    }
}

impl<T: Decode + Default> Decode for RefCell<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        T::decode_from(reader).map(Self::new)
    }

    fn placeholder() -> Option<Self> {
        Some(Self::default())
    }

    fn fill_placeholder(&self, value: Self) {
        self.replace(value.into_inner());
    }
}

// NOTE: Poisoned locks are read through, the data itself is still intact
impl<T: Encode> Encode for Mutex<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        let value = self.lock().unwrap_or_else(PoisonError::into_inner);
        value.encode_into(writer)
    }
}

impl<T: Decode + Default> Decode for Mutex<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        T::decode_from(reader).map(Self::new)
    }

    fn placeholder() -> Option<Self> {
        Some(Self::default())
    }

    fn fill_placeholder(&self, value: Self) {
        *self.lock().unwrap_or_else(PoisonError::into_inner) =
            value.into_inner().unwrap_or_else(PoisonError::into_inner);
    }
}

impl<T: Encode> Encode for RwLock<T> {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        let value = self.read().unwrap_or_else(PoisonError::into_inner);
        value.encode_into(writer)
    }
}

impl<T: Decode + Default> Decode for RwLock<T> {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        T::decode_from(reader).map(Self::new)
    }

    fn placeholder() -> Option<Self> {
        Some(Self::default())
    }

    fn fill_placeholder(&self, value: Self) {
        *self.write().unwrap_or_else(PoisonError::into_inner) =
            value.into_inner().unwrap_or_else(PoisonError::into_inner);
    }
}
