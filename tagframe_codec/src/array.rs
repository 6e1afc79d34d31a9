use crate::decoder::Source;
use crate::encoder::Sink;
use anyhow::Result;
use std::io::{Read, Write};
use tagframe_types::serde::{ArrayValue, ElemCount, StrLen, TypeTag};
use tagframe_types::FrameError;

mod test;

/// Element counts come from the stream, so never trust them for more than this up front.
const PREALLOC_CAP: usize = 4096;

mod sealed {
    pub trait Sealed {}
}

/// A type that may be an element of an `Array` field.
///
/// Fixed-size elements are packed. `Option<String>` elements are each length-prefixed,
/// and `None` is the null length prefix.
pub trait ArrayElement: sealed::Sealed + Sized {
    const TAG: TypeTag;

    /// Rejects an element too long to write under `max_len`.
    #[doc(hidden)]
    fn check_len(&self, _max_len: usize) -> Result<()> {
        Ok(())
    }

    #[doc(hidden)]
    fn write_elem<W: Write>(&self, sink: &mut Sink<W>) -> Result<()>;

    #[doc(hidden)]
    fn read_elem<R: Read>(source: &mut Source<R>) -> Result<Self>;
}

macro_rules! impl_packed_element {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl ArrayElement for $ty {
            const TAG: TypeTag = $tag;

            fn write_elem<W: Write>(&self, sink: &mut Sink<W>) -> Result<()> {
                sink.put(&self.to_le_bytes())
            }

            fn read_elem<R: Read>(source: &mut Source<R>) -> Result<Self> {
                Ok(<$ty>::from_le_bytes(
                    source.take::<{ std::mem::size_of::<$ty>() }>()?,
                ))
            }
        }
    };
}

impl_packed_element!(i8, TypeTag::Byte);
impl_packed_element!(i16, TypeTag::Short);
impl_packed_element!(i32, TypeTag::Int);
impl_packed_element!(i64, TypeTag::Long);
impl_packed_element!(f32, TypeTag::Float);
impl_packed_element!(f64, TypeTag::Double);

impl sealed::Sealed for bool {}
impl ArrayElement for bool {
    const TAG: TypeTag = TypeTag::Boolean;

    fn write_elem<W: Write>(&self, sink: &mut Sink<W>) -> Result<()> {
        sink.put(&[u8::from(*self)])
    }

    fn read_elem<R: Read>(source: &mut Source<R>) -> Result<Self> {
        source.take_bool()
    }
}

impl sealed::Sealed for char {}
impl ArrayElement for char {
    const TAG: TypeTag = TypeTag::Char;

    fn write_elem<W: Write>(&self, sink: &mut Sink<W>) -> Result<()> {
        sink.put(&u32::from(*self).to_le_bytes())
    }

    fn read_elem<R: Read>(source: &mut Source<R>) -> Result<Self> {
        source.take_char()
    }
}

impl sealed::Sealed for Option<String> {}
impl ArrayElement for Option<String> {
    const TAG: TypeTag = TypeTag::String;

    fn check_len(&self, max_len: usize) -> Result<()> {
        if let Some(s) = self {
            StrLen::from_str_body(s, max_len)?;
        }
        Ok(())
    }

    fn write_elem<W: Write>(&self, sink: &mut Sink<W>) -> Result<()> {
        sink.put_str(self.as_deref())
    }

    fn read_elem<R: Read>(source: &mut Source<R>) -> Result<Self> {
        source.take_str()
    }
}

/// Writes the element tag, the count, and the elements. The field header is already written.
pub(crate) fn write_payload<T: ArrayElement, W: Write>(
    sink: &mut Sink<W>,
    elems: &[T],
) -> Result<()> {
    let count = ElemCount::from_len(elems.len(), sink.config().max_len)?;
    sink.put_tag(T::TAG)?;
    sink.put(&count.to_le_bytes())?;
    for elem in elems {
        elem.write_elem(sink)?;
    }
    Ok(())
}

fn read_header<R: Read>(source: &mut Source<R>) -> Result<(TypeTag, usize)> {
    let tag = source.take_tag()?;
    if !tag.is_array_element() {
        return Err(FrameError::InvalidElementType(tag).into());
    }
    let count = source.take_elem_count()?;
    Ok((tag, count))
}

fn read_elems<T: ArrayElement, R: Read>(source: &mut Source<R>, count: usize) -> Result<Vec<T>> {
    let mut elems = Vec::with_capacity(count.min(PREALLOC_CAP));
    for _ in 0..count {
        elems.push(T::read_elem(source)?);
    }
    Ok(elems)
}

/// Reads an array payload of whichever element type it declares.
pub(crate) fn read_payload<R: Read>(source: &mut Source<R>) -> Result<ArrayValue> {
    let (tag, count) = read_header(source)?;
    let arr = match tag {
        TypeTag::Boolean => ArrayValue::Boolean(read_elems(source, count)?),
        TypeTag::Byte => ArrayValue::Byte(read_elems(source, count)?),
        TypeTag::Short => ArrayValue::Short(read_elems(source, count)?),
        TypeTag::Char => ArrayValue::Char(read_elems(source, count)?),
        TypeTag::Int => ArrayValue::Int(read_elems(source, count)?),
        TypeTag::Long => ArrayValue::Long(read_elems(source, count)?),
        TypeTag::Float => ArrayValue::Float(read_elems(source, count)?),
        TypeTag::Double => ArrayValue::Double(read_elems(source, count)?),
        TypeTag::String => ArrayValue::String(read_elems(source, count)?),
        other => return Err(FrameError::InvalidElementType(other).into()),
    };
    Ok(arr)
}

/// Reads an array payload whose element tag must be `T::TAG`.
pub(crate) fn read_typed_payload<T: ArrayElement, R: Read>(
    source: &mut Source<R>,
    field_id: u32,
) -> Result<Vec<T>> {
    let (tag, count) = read_header(source)?;
    if tag != T::TAG {
        return Err(FrameError::TypeMismatch {
            field_id,
            expected: T::TAG,
            found: tag,
        }
        .into());
    }
    read_elems(source, count)
}

pub(crate) fn skip_payload<R: Read>(source: &mut Source<R>) -> Result<()> {
    let (tag, count) = read_header(source)?;
    match tag.payload_width() {
        Some(width) => {
            let len = width.checked_mul(count).ok_or(FrameError::LengthLimit {
                len: count,
                max: source.config().max_len,
            })?;
            source.discard(len)
        }
        None => {
            for _ in 0..count {
                if let Some(len) = source.take_str_len()? {
                    source.discard(len)?;
                }
            }
            Ok(())
        }
    }
}
