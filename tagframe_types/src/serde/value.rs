use crate::serde::TypeTag;
use derive_more::From;
use itertools::Itertools;
use std::fmt;


/// A decoded field value, produced without any knowledge of the original data shape.
#[derive(PartialEq, Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Array(ArrayValue),
    Object(GenericObject),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::from(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Byte(v) => Some(Number::Byte(*v)),
            Value::Short(v) => Some(Number::Short(*v)),
            Value::Int(v) => Some(Number::Int(*v)),
            Value::Long(v) => Some(Number::Long(*v)),
            Value::Float(v) => Some(Number::Float(*v)),
            Value::Double(v) => Some(Number::Double(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&GenericObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl From<Number> for Value {
    fn from(num: Number) -> Self {
        match num {
            Number::Byte(v) => Value::Byte(v),
            Number::Short(v) => Value::Short(v),
            Number::Int(v) => Value::Int(v),
            Number::Long(v) => Value::Long(v),
            Number::Float(v) => Value::Float(v),
            Number::Double(v) => Value::Double(v),
        }
    }
}

/// Any value under a numeric type tag other than `Char`.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::from(self)
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Byte(v) => f64::from(v),
            Number::Short(v) => f64::from(v),
            Number::Int(v) => f64::from(v),
            Number::Long(v) => v as f64,
            Number::Float(v) => f64::from(v),
            Number::Double(v) => v,
        }
    }

    /// `None` for floating point numbers.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Byte(v) => Some(i64::from(v)),
            Number::Short(v) => Some(i64::from(v)),
            Number::Int(v) => Some(i64::from(v)),
            Number::Long(v) => Some(v),
            Number::Float(_) | Number::Double(_) => None,
        }
    }
}

/// A homogeneous array. The variant carries the element type even when the array is empty.
#[derive(From, PartialEq, Clone, Debug)]
pub enum ArrayValue {
    Boolean(Vec<bool>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Char(Vec<char>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<Option<String>>),
}

impl ArrayValue {
    pub fn elem_type(&self) -> TypeTag {
        TypeTag::from(self)
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Boolean(v) => v.len(),
            ArrayValue::Byte(v) => v.len(),
            ArrayValue::Short(v) => v.len(),
            ArrayValue::Char(v) => v.len(),
            ArrayValue::Int(v) => v.len(),
            ArrayValue::Long(v) => v.len(),
            ArrayValue::Float(v) => v.len(),
            ArrayValue::Double(v) => v.len(),
            ArrayValue::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Field id to value, in stream order.
///
/// Field ids within one frame are non-decreasing but may repeat,
/// so this is an ordered list rather than a map.
#[derive(PartialEq, Clone, Default, Debug)]
pub struct GenericObject {
    fields: Vec<(u32, Value)>,
}

impl GenericObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field_id: u32, val: Value) {
        self.fields.push((field_id, val));
    }

    /// The first value under `field_id`.
    pub fn get(&self, field_id: u32) -> Option<&Value> {
        self.get_all(field_id).next()
    }

    pub fn get_all(&self, field_id: u32) -> impl Iterator<Item = &Value> {
        self.fields
            .iter()
            .filter(move |(id, _)| *id == field_id)
            .map(|(_, val)| val)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(id, val)| (*id, val))
    }

    pub fn field_ids(&self) -> Vec<u32> {
        self.fields.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A copy with every `Null` field removed, recursively.
    /// Dense and sparse encodings of the same object compare equal after this.
    pub fn without_nulls(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(_, val)| !val.is_null())
            .map(|(id, val)| match val {
                Value::Object(obj) => (*id, Value::Object(obj.without_nulls())),
                val => (*id, val.clone()),
            })
            .collect();
        Self { fields }
    }
}

impl FromIterator<(u32, Value)> for GenericObject {
    fn from_iter<I: IntoIterator<Item = (u32, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/* Display */

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}i8"),
            Value::Short(v) => write!(f, "{v}i16"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}i64"),
            Value::Float(v) => write!(f, "{v}f32"),
            Value::Double(v) => write!(f, "{v}f64"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Array(v) => write!(f, "{v}"),
            Value::Object(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.elem_type())?;
        match self {
            ArrayValue::Boolean(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Byte(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Short(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Char(v) => write!(f, "[{}]", v.iter().map(|c| format!("{c:?}")).format(", ")),
            ArrayValue::Int(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Long(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Float(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::Double(v) => write!(f, "[{}]", v.iter().format(", ")),
            ArrayValue::String(v) => write!(
                f,
                "[{}]",
                v.iter()
                    .map(|s| match s {
                        None => String::from("null"),
                        Some(s) => format!("{s:?}"),
                    })
                    .format(", ")
            ),
        }
    }
}

impl fmt::Display for GenericObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.fields
                .iter()
                .map(|(id, val)| format!("{id}: {val}"))
                .format(", ")
        )
    }
}
