use crate::io_utils;
use crate::serde::{ArrayValue, Number, Value};
use crate::FrameError;
use anyhow::Result;
use derive_more::{Deref, From};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::Read;
use std::mem;


#[derive(From, Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct TypeTagInt(u8);
impl From<TypeTag> for TypeTagInt {
    fn from(tag: TypeTag) -> Self {
        Self(tag as u8)
    }
}
impl TypeTagInt {
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self)> {
        let buf = io_utils::read_exact_arr::<{ mem::size_of::<u8>() }>(r)?;
        Ok((buf.len(), Self(u8::from_le_bytes(buf))))
    }
}

/// The wire representation of a value.
///
/// Discriminants are written to the stream and must never be renumbered.
#[repr(u8)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive, Debug)]
pub enum TypeTag {
    Null = 0,
    Boolean = 1,
    Byte = 2,
    Short = 3,
    Char = 4,
    Int = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    String = 9,
    Array = 10,
    Object = 11,
}

impl TypeTag {
    pub const ALL: [TypeTag; 12] = [
        TypeTag::Null,
        TypeTag::Boolean,
        TypeTag::Byte,
        TypeTag::Short,
        TypeTag::Char,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::String,
        TypeTag::Array,
        TypeTag::Object,
    ];

    /// The payload width of tags whose payload length is known statically.
    /// `Null` has an empty payload. Variable-size tags return `None`.
    pub fn payload_width(self) -> Option<usize> {
        match self {
            TypeTag::Null => Some(0),
            TypeTag::Boolean | TypeTag::Byte => Some(1),
            TypeTag::Short => Some(mem::size_of::<i16>()),
            TypeTag::Char => Some(mem::size_of::<u32>()),
            TypeTag::Int => Some(mem::size_of::<i32>()),
            TypeTag::Long => Some(mem::size_of::<i64>()),
            TypeTag::Float => Some(mem::size_of::<f32>()),
            TypeTag::Double => Some(mem::size_of::<f64>()),
            TypeTag::String | TypeTag::Array | TypeTag::Object => None,
        }
    }

    /// `Boolean` and the numeric tags.
    pub fn is_fixed_size(self) -> bool {
        self != TypeTag::Null && self.payload_width().is_some()
    }

    pub fn is_variable_size(self) -> bool {
        self.payload_width().is_none()
    }

    pub fn is_number(self) -> bool {
        self.is_fixed_size() && self != TypeTag::Boolean
    }

    /// Whether arrays may hold elements of this tag.
    pub fn is_array_element(self) -> bool {
        self.is_fixed_size() || self == TypeTag::String
    }
}

impl TryFrom<TypeTagInt> for TypeTag {
    type Error = FrameError;
    fn try_from(int: TypeTagInt) -> Result<Self, FrameError> {
        TypeTag::from_u8(int.0).ok_or(FrameError::UnknownTypeTag(int.0))
    }
}

impl From<&Value> for TypeTag {
    fn from(val: &Value) -> Self {
        match val {
            Value::Null => TypeTag::Null,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Byte(_) => TypeTag::Byte,
            Value::Short(_) => TypeTag::Short,
            Value::Char(_) => TypeTag::Char,
            Value::Int(_) => TypeTag::Int,
            Value::Long(_) => TypeTag::Long,
            Value::Float(_) => TypeTag::Float,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
        }
    }
}

impl From<&Number> for TypeTag {
    fn from(num: &Number) -> Self {
        match num {
            Number::Byte(_) => TypeTag::Byte,
            Number::Short(_) => TypeTag::Short,
            Number::Int(_) => TypeTag::Int,
            Number::Long(_) => TypeTag::Long,
            Number::Float(_) => TypeTag::Float,
            Number::Double(_) => TypeTag::Double,
        }
    }
}

impl From<&ArrayValue> for TypeTag {
    /// The element tag.
    fn from(arr: &ArrayValue) -> Self {
        match arr {
            ArrayValue::Boolean(_) => TypeTag::Boolean,
            ArrayValue::Byte(_) => TypeTag::Byte,
            ArrayValue::Short(_) => TypeTag::Short,
            ArrayValue::Char(_) => TypeTag::Char,
            ArrayValue::Int(_) => TypeTag::Int,
            ArrayValue::Long(_) => TypeTag::Long,
            ArrayValue::Float(_) => TypeTag::Float,
            ArrayValue::Double(_) => TypeTag::Double,
            ArrayValue::String(_) => TypeTag::String,
        }
    }
}
