//! Wire primitives: fixed-size little-endian scalars, length-prefixed UTF-8 strings and
//! length-prefixed lists. Little-endian throughout, no padding.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unexpected end of payload")]
    UnexpectedEof,
    #[error("string was not valid utf-8")]
    InvalidUtf8,
    #[error("unknown enum discriminant {0}")]
    InvalidEnum(i64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<WireError> for crate::response::ResponseCode {
    fn from(_: WireError) -> crate::response::ResponseCode {
        crate::response::ResponseCode::INVALID_PARAMETERS
    }
}

fn map_eof(err: io::Error) -> WireError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        WireError::UnexpectedEof
    } else {
        WireError::Io(err)
    }
}

/// A value that can be written to and read from the wire, field by field, in the codec's
/// fixed byte layout. `write` takes `&mut self` so that list-typed implementors can clear
/// themselves immediately after being flushed to the wire (see `Vec<T>` below), matching the
/// "serialize clears the list" contract.
pub trait WireCodec: Sized {
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError>;
    fn read(r: &mut dyn Read) -> Result<Self, WireError>;
}

macro_rules! impl_scalar_codec {
    ($ty:ty, $read:ident, $write:ident) => {
        impl WireCodec for $ty {
            #[inline]
            fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
                w.$write::<LittleEndian>(*self).map_err(WireError::from)
            }

            #[inline]
            fn read(r: &mut dyn Read) -> Result<Self, WireError> {
                r.$read::<LittleEndian>().map_err(map_eof)
            }
        }
    };
}

impl_scalar_codec!(u16, read_u16, write_u16);
impl_scalar_codec!(i16, read_i16, write_i16);
impl_scalar_codec!(u32, read_u32, write_u32);
impl_scalar_codec!(i32, read_i32, write_i32);
impl_scalar_codec!(u64, read_u64, write_u64);
impl_scalar_codec!(i64, read_i64, write_i64);
impl_scalar_codec!(f32, read_f32, write_f32);
impl_scalar_codec!(f64, read_f64, write_f64);

impl WireCodec for u8 {
    #[inline]
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        w.write_u8(*self).map_err(WireError::from)
    }

    #[inline]
    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        r.read_u8().map_err(map_eof)
    }
}

impl WireCodec for i8 {
    #[inline]
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        w.write_i8(*self).map_err(WireError::from)
    }

    #[inline]
    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        r.read_i8().map_err(map_eof)
    }
}

impl WireCodec for bool {
    #[inline]
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        w.write_u8(if *self { 1 } else { 0 }).map_err(WireError::from)
    }

    #[inline]
    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        Ok(r.read_u8().map_err(map_eof)? != 0)
    }
}

impl WireCodec for String {
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        let bytes = self.as_bytes();
        let len: u16 = bytes
            .len()
            .try_into()
            .map_err(|_| WireError::Io(io::Error::new(io::ErrorKind::InvalidInput, "string too long")))?;
        w.write_u16::<LittleEndian>(len)?;
        w.write_all(bytes)?;
        Ok(())
    }

    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        let len = r.read_u16::<LittleEndian>().map_err(map_eof)? as usize;
        let mut buf = vec![0u8; len];
        r.read_exact(&mut buf).map_err(map_eof)?;
        String::from_utf8(buf).map_err(|_| WireError::InvalidUtf8)
    }
}

/// A `u64` millisecond timestamp, relative to a configurable epoch. The offset is applied by
/// callers (see `arke_support::time`); the wire representation is the raw `u64`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Timestamp(pub u64);

impl WireCodec for Timestamp {
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        w.write_u64::<LittleEndian>(self.0).map_err(WireError::from)
    }

    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        Ok(Timestamp(r.read_u64::<LittleEndian>().map_err(map_eof)?))
    }
}

/// Lists serialize as a `u16` element count followed by that many elements, and are cleared
/// from the handler instance immediately after being written (open question resolved:
/// deserialization overwrites with a fresh container per call).
impl<T: WireCodec> WireCodec for Vec<T> {
    fn write(&mut self, w: &mut dyn Write) -> Result<(), WireError> {
        let len: u16 = self
            .len()
            .try_into()
            .map_err(|_| WireError::Io(io::Error::new(io::ErrorKind::InvalidInput, "list too long")))?;
        w.write_u16::<LittleEndian>(len)?;
        for item in self.iter_mut() {
            item.write(w)?;
        }
        self.clear();
        Ok(())
    }

    fn read(r: &mut dyn Read) -> Result<Self, WireError> {
        let len = r.read_u16::<LittleEndian>().map_err(map_eof)? as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(T::read(r)?);
        }
        Ok(out)
    }
}
