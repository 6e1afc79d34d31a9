use crate::array::{self, ArrayElement};
use crate::registry::{Record, RecordReader, Registry};
use anyhow::Result;
use derive_more::Deref;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use tagframe_types::config::CodecConfig;
use tagframe_types::io_utils;
use tagframe_types::serde::{
    ArrayValue, ElemCount, FieldId, GenericObject, Number, StrLen, TypeTag, TypeTagInt, Value,
};
use tagframe_types::FrameError;


#[derive(Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReadLen(usize);

/// The buffered byte source behind a top-level frame and every frame nested in it.
pub struct Source<R: Read> {
    r: BufReader<R>,
    r_len: usize,
    /// Depth of the innermost frame that is allowed to read.
    open_depth: usize,
    config: CodecConfig,
}

impl<R: Read> Source<R> {
    pub(crate) fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let buf = io_utils::read_exact_arr::<N>(&mut self.r)?;
        self.r_len += N;
        Ok(buf)
    }

    pub(crate) fn take_field_id(&mut self) -> Result<FieldId> {
        let (n, id) = FieldId::deser(&mut self.r)?;
        self.r_len += n;
        Ok(id)
    }

    pub(crate) fn take_tag(&mut self) -> Result<TypeTag> {
        let (n, int) = TypeTagInt::deser(&mut self.r)?;
        self.r_len += n;
        Ok(TypeTag::try_from(int)?)
    }

    /// The next type tag, left in the stream.
    pub(crate) fn peek_tag(&mut self) -> Result<TypeTag> {
        let int = *self.r.fill_buf()?.first().ok_or(FrameError::Truncated)?;
        Ok(TypeTag::try_from(TypeTagInt::from(int))?)
    }

    pub(crate) fn take_bool(&mut self) -> Result<bool> {
        match self.take::<1>()? {
            [0] => Ok(false),
            [1] => Ok(true),
            [b] => Err(FrameError::InvalidBoolean(b).into()),
        }
    }

    pub(crate) fn take_char(&mut self) -> Result<char> {
        let int = u32::from_le_bytes(self.take::<4>()?);
        char::from_u32(int).ok_or_else(|| FrameError::InvalidChar(int).into())
    }

    /// The body length of a string payload, after its prefix. `None` for a null string.
    pub(crate) fn take_str_len(&mut self) -> Result<Option<usize>> {
        let (n, len) = StrLen::deser(&mut self.r)?;
        self.r_len += n;
        Ok(len.body_len(self.config.max_len)?)
    }

    pub(crate) fn take_elem_count(&mut self) -> Result<usize> {
        let (n, count) = ElemCount::deser(&mut self.r)?;
        self.r_len += n;
        Ok(count.checked_len(self.config.max_len)?)
    }

    pub(crate) fn take_str(&mut self) -> Result<Option<String>> {
        match self.take_str_len()? {
            None => Ok(None),
            Some(len) => {
                let buf = io_utils::read_exact_vec(&mut self.r, len)?;
                self.r_len += len;
                let s = String::from_utf8(buf).map_err(|_| FrameError::InvalidUtf8)?;
                Ok(Some(s))
            }
        }
    }

    pub(crate) fn discard(&mut self, len: usize) -> Result<()> {
        io_utils::discard(&mut self.r, len)?;
        self.r_len += len;
        Ok(())
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

/// Owned or borrowed access to a [`Source`].
pub trait SourceMut {
    type R: Read;
    fn source(&self) -> &Source<Self::R>;
    fn source_mut(&mut self) -> &mut Source<Self::R>;
}
impl<R: Read> SourceMut for Source<R> {
    type R = R;
    fn source(&self) -> &Source<R> {
        self
    }
    fn source_mut(&mut self) -> &mut Source<R> {
        self
    }
}
impl<'p, R: Read> SourceMut for &'p mut Source<R> {
    type R = R;
    fn source(&self) -> &Source<R> {
        &**self
    }
    fn source_mut(&mut self) -> &mut Source<R> {
        &mut **self
    }
}

#[derive(Clone, Copy, Debug)]
struct FieldHeader {
    id: u32,
    tag: TypeTag,
}

struct ReadCursor {
    depth: usize,
    start_len: usize,
    last_id: Option<u32>,
    pending: Option<FieldHeader>,
    exhausted: bool,
}
impl ReadCursor {
    fn new(depth: usize, start_len: usize) -> Self {
        Self {
            depth,
            start_len,
            last_id: None,
            pending: None,
            exhausted: false,
        }
    }
}

/// Reads the fields of one frame, forward only.
///
/// ```text
/// BeforeField --has_next_field() == true--> FieldReady --read_*() / skip()--> BeforeField
/// FieldReady(Object) --start_object()--> nested frame, in its own BeforeField
/// BeforeField --has_next_field() == false--> FrameExhausted
/// ```
///
/// Use it through [`Decoder`] for the top-level frame and [`ObjectDecoder`] for nested frames.
pub struct FrameDecoder<S> {
    source: S,
    cursor: ReadCursor,
}

pub type Decoder<R> = FrameDecoder<Source<R>>;
pub type ObjectDecoder<'p, R> = FrameDecoder<&'p mut Source<R>>;

fn ensure_current<R: Read>(source: &Source<R>, depth: usize) -> Result<()> {
    if source.open_depth != depth {
        tracing::warn!(
            depth,
            open_depth = source.open_depth,
            "read rejected while a nested frame is open"
        );
        return Err(FrameError::ChildFrameOpen.into());
    }
    Ok(())
}

impl<S: SourceMut> FrameDecoder<S> {
    /// Peeks whether another field remains in this frame, without consuming it.
    ///
    /// Consumes the frame-end marker once it is reached.
    pub fn has_next_field(&mut self) -> Result<bool> {
        if self.cursor.pending.is_some() {
            return Ok(true);
        }
        if self.cursor.exhausted {
            return Ok(false);
        }

        let depth = self.cursor.depth;
        let source = self.source.source_mut();
        ensure_current(source, depth)?;

        let id = source.take_field_id()?;
        if id.is_frame_end() {
            self.cursor.exhausted = true;
            source.open_depth = depth.saturating_sub(1);
            tracing::trace!(depth, "reached frame end");
            return Ok(false);
        }
        let tag = source.take_tag()?;
        let id = *id;

        if let Some(prev) = self.cursor.last_id {
            if id < prev {
                return Err(FrameError::FieldOrder { prev, id }.into());
            }
        }
        self.cursor.last_id = Some(id);
        self.cursor.pending = Some(FieldHeader { id, tag });
        Ok(true)
    }

    /// Id of the pending field.
    pub fn field_id(&self) -> Result<u32> {
        self.cursor
            .pending
            .map(|header| header.id)
            .ok_or_else(|| FrameError::NoPendingField.into())
    }

    /// Type tag of the pending field.
    pub fn current_field_type(&self) -> Option<TypeTag> {
        self.cursor.pending.map(|header| header.tag)
    }

    pub fn bytes_read(&self) -> usize {
        self.source.source().r_len
    }

    /// The pending header, if its tag is one of `accepted`. It stays pending.
    fn pending_of(&mut self, accepted: &[TypeTag]) -> Result<FieldHeader> {
        if !self.has_next_field()? {
            return Err(FrameError::FrameExhausted.into());
        }
        let header = self.cursor.pending.ok_or(FrameError::NoPendingField)?;
        if !accepted.contains(&header.tag) {
            return Err(FrameError::TypeMismatch {
                field_id: header.id,
                expected: accepted[0],
                found: header.tag,
            }
            .into());
        }
        Ok(header)
    }

    /// Consumes the pending header if its tag is one of `accepted`.
    fn take_pending(&mut self, accepted: &[TypeTag]) -> Result<FieldHeader> {
        let header = self.pending_of(accepted)?;
        self.cursor.pending = None;
        Ok(header)
    }

    fn current_source(&mut self) -> Result<&mut Source<S::R>> {
        let source = self.source.source_mut();
        ensure_current(source, self.cursor.depth)?;
        Ok(source)
    }

    fn read_fixed<const N: usize>(&mut self, tag: TypeTag) -> Result<[u8; N]> {
        self.take_pending(&[tag])?;
        self.current_source()?.take::<N>()
    }

    pub fn read_null(&mut self) -> Result<()> {
        self.take_pending(&[TypeTag::Null])?;
        Ok(())
    }

    /// `None` for a `Null` field.
    pub fn read_boolean(&mut self) -> Result<Option<bool>> {
        let header = self.take_pending(&[TypeTag::Boolean, TypeTag::Null])?;
        match header.tag {
            TypeTag::Null => Ok(None),
            _ => self.current_source()?.take_bool().map(Some),
        }
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_fixed(TypeTag::Byte)?))
    }

    pub fn read_short(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_fixed(TypeTag::Short)?))
    }

    pub fn read_char(&mut self) -> Result<char> {
        self.take_pending(&[TypeTag::Char])?;
        self.current_source()?.take_char()
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_fixed(TypeTag::Int)?))
    }

    pub fn read_long(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_fixed(TypeTag::Long)?))
    }

    pub fn read_float(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_fixed(TypeTag::Float)?))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_fixed(TypeTag::Double)?))
    }

    /// Any numeric field other than `Char`.
    pub fn read_number(&mut self) -> Result<Number> {
        if !self.has_next_field()? {
            return Err(FrameError::FrameExhausted.into());
        }
        let header = self.cursor.pending.ok_or(FrameError::NoPendingField)?;
        let num = match header.tag {
            TypeTag::Byte => Number::Byte(self.read_byte()?),
            TypeTag::Short => Number::Short(self.read_short()?),
            TypeTag::Int => Number::Int(self.read_int()?),
            TypeTag::Long => Number::Long(self.read_long()?),
            TypeTag::Float => Number::Float(self.read_float()?),
            TypeTag::Double => Number::Double(self.read_double()?),
            found => {
                return Err(FrameError::NotANumber {
                    field_id: header.id,
                    found,
                }
                .into())
            }
        };
        Ok(num)
    }

    /// `None` for a `Null` field.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        let header = self.take_pending(&[TypeTag::String, TypeTag::Null])?;
        match header.tag {
            TypeTag::Null => Ok(None),
            _ => self.current_source()?.take_str(),
        }
    }

    /// An array of whatever element type the stream carries.
    pub fn read_array(&mut self) -> Result<ArrayValue> {
        self.take_pending(&[TypeTag::Array])?;
        array::read_payload(self.current_source()?)
    }

    /// An array whose element type must be `T`.
    ///
    /// On an element type mismatch the field stays pending, as with the scalar readers.
    pub fn read_array_of<T: ArrayElement>(&mut self) -> Result<Vec<T>> {
        let header = self.pending_of(&[TypeTag::Array])?;
        let elem = self.current_source()?.peek_tag()?;
        if elem != T::TAG && elem.is_array_element() {
            return Err(FrameError::TypeMismatch {
                field_id: header.id,
                expected: T::TAG,
                found: elem,
            }
            .into());
        }
        self.cursor.pending = None;
        array::read_typed_payload::<T, _>(self.current_source()?, header.id)
    }

    pub fn read_boolean_array(&mut self) -> Result<Vec<bool>> {
        self.read_array_of()
    }

    pub fn read_byte_array(&mut self) -> Result<Vec<i8>> {
        self.read_array_of()
    }

    pub fn read_short_array(&mut self) -> Result<Vec<i16>> {
        self.read_array_of()
    }

    pub fn read_char_array(&mut self) -> Result<Vec<char>> {
        self.read_array_of()
    }

    pub fn read_int_array(&mut self) -> Result<Vec<i32>> {
        self.read_array_of()
    }

    pub fn read_long_array(&mut self) -> Result<Vec<i64>> {
        self.read_array_of()
    }

    pub fn read_float_array(&mut self) -> Result<Vec<f32>> {
        self.read_array_of()
    }

    pub fn read_double_array(&mut self) -> Result<Vec<f64>> {
        self.read_array_of()
    }

    pub fn read_string_array(&mut self) -> Result<Vec<Option<String>>> {
        self.read_array_of()
    }

    /// Opens the pending `Object` field's frame.
    ///
    /// This frame cannot be read from until the returned decoder reaches its frame end.
    pub fn start_object(&mut self) -> Result<ObjectDecoder<'_, S::R>> {
        let header = self.take_pending(&[TypeTag::Object])?;
        let depth = self.cursor.depth + 1;

        let source = self.current_source()?;
        let max_depth = source.config.max_depth;
        if depth > max_depth {
            return Err(FrameError::DepthLimit(max_depth).into());
        }
        source.open_depth = depth;
        let start_len = source.r_len;
        tracing::trace!(field_id = header.id, depth, "opened nested frame");

        Ok(FrameDecoder {
            source,
            cursor: ReadCursor::new(depth, start_len),
        })
    }

    /// Discards the pending field's payload without interpreting it.
    /// Returns the number of payload bytes passed over.
    pub fn skip(&mut self) -> Result<usize> {
        let header = self.take_pending(&TypeTag::ALL)?;
        let depth = self.cursor.depth;
        skip_payload(self.current_source()?, header.tag, depth)
    }

    /// Reads the pending field, whatever its type.
    pub fn read_value(&mut self) -> Result<Value> {
        if !self.has_next_field()? {
            return Err(FrameError::FrameExhausted.into());
        }
        let header = self.cursor.pending.ok_or(FrameError::NoPendingField)?;
        let val = match header.tag {
            TypeTag::Null => {
                self.read_null()?;
                Value::Null
            }
            TypeTag::Boolean => self.read_boolean()?.map_or(Value::Null, Value::Boolean),
            TypeTag::Byte => Value::Byte(self.read_byte()?),
            TypeTag::Short => Value::Short(self.read_short()?),
            TypeTag::Char => Value::Char(self.read_char()?),
            TypeTag::Int => Value::Int(self.read_int()?),
            TypeTag::Long => Value::Long(self.read_long()?),
            TypeTag::Float => Value::Float(self.read_float()?),
            TypeTag::Double => Value::Double(self.read_double()?),
            TypeTag::String => self.read_string()?.map_or(Value::Null, Value::String),
            TypeTag::Array => Value::Array(self.read_array()?),
            TypeTag::Object => Value::Object(self.read_object()?),
        };
        Ok(val)
    }

    /// Reads the pending `Object` field using only the type tags in the stream.
    pub fn read_object(&mut self) -> Result<GenericObject> {
        let mut child = self.start_object()?;
        let obj = child.read_all()?;
        child.finish()?;
        Ok(obj)
    }

    /// Reads every remaining field of this frame.
    pub fn read_all(&mut self) -> Result<GenericObject> {
        let mut obj = GenericObject::new();
        while self.has_next_field()? {
            let field_id = self.field_id()?;
            let val = self.read_value()?;
            obj.push(field_id, val);
        }
        Ok(obj)
    }

    /// Reads the pending `Object` field as a `T`, laid out by its [`Record`] description.
    ///
    /// Accepts both dense and sparse encodings.
    pub fn read_record<T: Record>(&mut self, registry: &mut Registry) -> Result<T> {
        let class = registry.class_info::<T>()?;
        let mut child = self.start_object()?;

        let mut inp = RecordReader::new(&mut child, registry, class);
        let val = T::read_values(&mut inp)?;
        inp.end()?;

        child.finish()?;
        Ok(val)
    }
}

fn skip_payload<R: Read>(source: &mut Source<R>, tag: TypeTag, depth: usize) -> Result<usize> {
    let start_len = source.r_len;
    match tag {
        TypeTag::String => {
            if let Some(len) = source.take_str_len()? {
                source.discard(len)?;
            }
        }
        TypeTag::Array => array::skip_payload(source)?,
        TypeTag::Object => {
            let depth = depth + 1;
            if depth > source.config.max_depth {
                return Err(FrameError::DepthLimit(source.config.max_depth).into());
            }
            loop {
                if source.take_field_id()?.is_frame_end() {
                    break;
                }
                let tag = source.take_tag()?;
                skip_payload(source, tag, depth)?;
            }
        }
        fixed => {
            let width = fixed.payload_width().unwrap_or(0);
            source.discard(width)?;
        }
    }
    Ok(source.r_len - start_len)
}

impl<R: Read> FrameDecoder<Source<R>> {
    pub fn new(r: R) -> Self {
        Self::with_config(r, CodecConfig::default())
    }

    pub fn with_config(r: R, config: CodecConfig) -> Self {
        let source = Source {
            r: BufReader::with_capacity(config.buffer_capacity, r),
            r_len: 0,
            open_depth: 0,
            config,
        };
        Self {
            source,
            cursor: ReadCursor::new(0, 0),
        }
    }

    /// Verifies that the top-level frame has been read to its end and that nothing follows it.
    pub fn finish(mut self) -> Result<ReadLen> {
        if self.has_next_field()? {
            return Err(FrameError::UnreadFields.into());
        }
        let mut probe = [0u8; 1];
        loop {
            match self.source.r.read(&mut probe) {
                Ok(0) => break,
                Ok(_) => return Err(FrameError::TrailingBytes.into()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ReadLen(self.source.r_len))
    }
}

impl<'p, R: Read> FrameDecoder<&'p mut Source<R>> {
    /// Verifies that this nested frame has been read to its end.
    pub fn finish(mut self) -> Result<ReadLen> {
        if self.has_next_field()? {
            return Err(FrameError::UnreadFields.into());
        }
        let r_len = self.source.r_len - self.cursor.start_len;
        tracing::trace!(depth = self.cursor.depth, r_len, "closed nested frame");
        Ok(ReadLen(r_len))
    }
}
