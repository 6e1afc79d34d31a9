use crate::io_utils;
use crate::serde::TypeTagInt;
use crate::FrameError;
use anyhow::Result;
use derive_more::Deref;
use std::io::Read;
use std::mem;

/// The field id as written on the wire.
///
/// [`FieldId::FRAME_END`] is reserved. It terminates a frame and can never be used by a field.
#[derive(Deref, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct FieldId(u32);
impl FieldId {
    pub const FRAME_END: u32 = u32::MAX;

    pub fn new_checked(id: u32) -> Result<Self, FrameError> {
        if id == Self::FRAME_END {
            return Err(FrameError::ReservedFieldId(id));
        }
        Ok(Self(id))
    }
    pub fn frame_end() -> Self {
        Self(Self::FRAME_END)
    }
    pub fn is_frame_end(&self) -> bool {
        self.0 == Self::FRAME_END
    }
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self)> {
        let buf = io_utils::read_exact_arr::<{ mem::size_of::<u32>() }>(r)?;
        Ok((buf.len(), Self(u32::from_le_bytes(buf))))
    }
}

/// `field_id` followed by `type_tag`.
pub const FIELD_HEADER_LEN: usize = mem::size_of::<FieldId>() + mem::size_of::<TypeTagInt>();

/// `elem_tag` followed by `elem_count`.
pub const ARRAY_HEADER_LEN: usize = mem::size_of::<TypeTagInt>() + mem::size_of::<ElemCount>();

/// The length prefix of a string payload. Negative one denotes null.
#[derive(Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct StrLen(i32);
impl StrLen {
    pub const NULL: Self = Self(-1);

    pub fn from_str_body(s: &str, max_len: usize) -> Result<Self, FrameError> {
        let len = s.len();
        if len > max_len {
            return Err(FrameError::LengthLimit { len, max: max_len });
        }
        i32::try_from(len)
            .map(Self)
            .map_err(|_| FrameError::LengthLimit {
                len,
                max: i32::MAX as usize,
            })
    }

    /// `None` for a null string.
    pub fn body_len(&self, max_len: usize) -> Result<Option<usize>, FrameError> {
        match self.0 {
            -1 => Ok(None),
            len if len < 0 => Err(FrameError::InvalidLength(i64::from(len))),
            len => {
                let len = len as usize;
                if len > max_len {
                    return Err(FrameError::LengthLimit { len, max: max_len });
                }
                Ok(Some(len))
            }
        }
    }

    pub fn deser(r: &mut impl Read) -> Result<(usize, Self)> {
        let buf = io_utils::read_exact_arr::<{ mem::size_of::<i32>() }>(r)?;
        Ok((buf.len(), Self(i32::from_le_bytes(buf))))
    }
}

/// The element count of an array payload.
#[derive(Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ElemCount(u32);
impl ElemCount {
    pub fn from_len(len: usize, max_len: usize) -> Result<Self, FrameError> {
        if len > max_len {
            return Err(FrameError::LengthLimit { len, max: max_len });
        }
        u32::try_from(len)
            .map(Self)
            .map_err(|_| FrameError::LengthLimit {
                len,
                max: u32::MAX as usize,
            })
    }

    pub fn checked_len(&self, max_len: usize) -> Result<usize, FrameError> {
        let len = self.0 as usize;
        if len > max_len {
            return Err(FrameError::LengthLimit { len, max: max_len });
        }
        Ok(len)
    }

    pub fn deser(r: &mut impl Read) -> Result<(usize, Self)> {
        let buf = io_utils::read_exact_arr::<{ mem::size_of::<u32>() }>(r)?;
        Ok((buf.len(), Self(u32::from_le_bytes(buf))))
    }
}
