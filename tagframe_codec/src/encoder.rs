use crate::array::{self, ArrayElement};
use crate::registry::{ObjectEncoding, Record, RecordWriter, Registry};
use anyhow::Result;
use derive_more::Deref;
use std::io::{BufWriter, Write};
use tagframe_types::config::CodecConfig;
use tagframe_types::serde::{
    ArrayValue, ElemCount, FieldId, GenericObject, StrLen, TypeTag, TypeTagInt, Value,
};
use tagframe_types::FrameError;


#[derive(Deref, Clone, Copy, PartialEq, Eq, Debug)]
pub struct WriteLen(usize);

/// The buffered byte sink behind a top-level frame and every frame nested in it.
///
/// Bytes reach the underlying writer only when the buffer fills up or the top-level frame is finished.
pub struct Sink<W: Write> {
    w: BufWriter<W>,
    w_len: usize,
    /// Depth of the innermost frame that is allowed to write.
    open_depth: usize,
    /// Set once a field was left half-written. Every later write fails.
    failed: bool,
    config: CodecConfig,
}

impl<W: Write> Sink<W> {
    pub(crate) fn put(&mut self, buf: &[u8]) -> Result<()> {
        if let Err(e) = self.w.write_all(buf) {
            self.failed = true;
            return Err(e.into());
        }
        self.w_len += buf.len();
        Ok(())
    }

    pub(crate) fn put_tag(&mut self, tag: TypeTag) -> Result<()> {
        self.put(&[*TypeTagInt::from(tag)])
    }

    /// A length-prefixed string, or the null length prefix.
    pub(crate) fn put_str(&mut self, s: Option<&str>) -> Result<()> {
        match s {
            None => self.put(&StrLen::NULL.to_le_bytes()),
            Some(s) => {
                let len = match StrLen::from_str_body(s, self.config.max_len) {
                    Ok(len) => len,
                    Err(e) => {
                        self.failed = true;
                        return Err(e.into());
                    }
                };
                self.put(&len.to_le_bytes())?;
                self.put(s.as_bytes())
            }
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

/// Owned or borrowed access to a [`Sink`].
pub trait SinkMut {
    type W: Write;
    fn sink(&self) -> &Sink<Self::W>;
    fn sink_mut(&mut self) -> &mut Sink<Self::W>;
}
impl<W: Write> SinkMut for Sink<W> {
    type W = W;
    fn sink(&self) -> &Sink<W> {
        self
    }
    fn sink_mut(&mut self) -> &mut Sink<W> {
        self
    }
}
impl<'p, W: Write> SinkMut for &'p mut Sink<W> {
    type W = W;
    fn sink(&self) -> &Sink<W> {
        &**self
    }
    fn sink_mut(&mut self) -> &mut Sink<W> {
        &mut **self
    }
}

struct FrameCursor {
    depth: usize,
    start_len: usize,
    last_id: Option<u32>,
}
impl FrameCursor {
    fn new(depth: usize, start_len: usize) -> Self {
        Self {
            depth,
            start_len,
            last_id: None,
        }
    }
}

/// Writes the fields of one frame.
///
/// Use it through [`Encoder`] for the top-level frame and [`ObjectEncoder`] for nested frames.
pub struct FrameEncoder<S> {
    sink: S,
    cursor: FrameCursor,
}

pub type Encoder<W> = FrameEncoder<Sink<W>>;
pub type ObjectEncoder<'p, W> = FrameEncoder<&'p mut Sink<W>>;

fn ensure_current<W: Write>(sink: &Sink<W>, depth: usize) -> Result<()> {
    if sink.failed {
        return Err(FrameError::SinkFailed.into());
    }
    if sink.open_depth != depth {
        tracing::warn!(
            depth,
            open_depth = sink.open_depth,
            "write rejected while a nested frame is open"
        );
        return Err(FrameError::ChildFrameOpen.into());
    }
    Ok(())
}

impl<S: SinkMut> FrameEncoder<S> {
    fn begin_field(&mut self, id: u32, tag: TypeTag) -> Result<&mut Sink<S::W>> {
        let sink = self.sink.sink_mut();
        ensure_current(sink, self.cursor.depth)?;
        let field_id = FieldId::new_checked(id)?;
        if let Some(prev) = self.cursor.last_id {
            if id < prev {
                return Err(FrameError::FieldOrder { prev, id }.into());
            }
        }
        self.cursor.last_id = Some(id);

        sink.put(&field_id.to_le_bytes())?;
        sink.put_tag(tag)?;
        Ok(sink)
    }

    fn end_frame(&mut self) -> Result<&mut Sink<S::W>> {
        let sink = self.sink.sink_mut();
        ensure_current(sink, self.cursor.depth)?;
        sink.put(&FieldId::frame_end().to_le_bytes())?;
        Ok(sink)
    }

    pub fn bytes_written(&self) -> usize {
        self.sink.sink().w_len
    }

    pub fn write_null(&mut self, id: u32) -> Result<()> {
        self.begin_field(id, TypeTag::Null)?;
        Ok(())
    }

    pub fn write_boolean(&mut self, id: u32, val: Option<bool>) -> Result<()> {
        match val {
            None => self.write_null(id),
            Some(b) => self.begin_field(id, TypeTag::Boolean)?.put(&[u8::from(b)]),
        }
    }

    pub fn write_byte(&mut self, id: u32, val: i8) -> Result<()> {
        self.begin_field(id, TypeTag::Byte)?.put(&val.to_le_bytes())
    }

    pub fn write_short(&mut self, id: u32, val: i16) -> Result<()> {
        self.begin_field(id, TypeTag::Short)?.put(&val.to_le_bytes())
    }

    pub fn write_char(&mut self, id: u32, val: char) -> Result<()> {
        self.begin_field(id, TypeTag::Char)?
            .put(&u32::from(val).to_le_bytes())
    }

    pub fn write_int(&mut self, id: u32, val: i32) -> Result<()> {
        self.begin_field(id, TypeTag::Int)?.put(&val.to_le_bytes())
    }

    pub fn write_long(&mut self, id: u32, val: i64) -> Result<()> {
        self.begin_field(id, TypeTag::Long)?.put(&val.to_le_bytes())
    }

    pub fn write_float(&mut self, id: u32, val: f32) -> Result<()> {
        self.begin_field(id, TypeTag::Float)?.put(&val.to_le_bytes())
    }

    pub fn write_double(&mut self, id: u32, val: f64) -> Result<()> {
        self.begin_field(id, TypeTag::Double)?.put(&val.to_le_bytes())
    }

    /// A `None` string is written as a `Null` field.
    pub fn write_string(&mut self, id: u32, val: Option<&str>) -> Result<()> {
        match val {
            None => self.write_null(id),
            Some(s) => {
                StrLen::from_str_body(s, self.sink.sink().config.max_len)?;
                self.begin_field(id, TypeTag::String)?.put_str(Some(s))
            }
        }
    }

    pub fn write_array<T: ArrayElement>(&mut self, id: u32, elems: &[T]) -> Result<()> {
        let max_len = self.sink.sink().config.max_len;
        ElemCount::from_len(elems.len(), max_len)?;
        for elem in elems {
            elem.check_len(max_len)?;
        }
        let sink = self.begin_field(id, TypeTag::Array)?;
        array::write_payload(sink, elems)
    }

    pub fn write_array_value(&mut self, id: u32, arr: &ArrayValue) -> Result<()> {
        match arr {
            ArrayValue::Boolean(v) => self.write_array(id, v),
            ArrayValue::Byte(v) => self.write_array(id, v),
            ArrayValue::Short(v) => self.write_array(id, v),
            ArrayValue::Char(v) => self.write_array(id, v),
            ArrayValue::Int(v) => self.write_array(id, v),
            ArrayValue::Long(v) => self.write_array(id, v),
            ArrayValue::Float(v) => self.write_array(id, v),
            ArrayValue::Double(v) => self.write_array(id, v),
            ArrayValue::String(v) => self.write_array(id, v),
        }
    }

    /// Opens a nested frame bound to field `id`.
    ///
    /// This frame cannot be written to until the returned encoder is finished.
    /// Dropping that encoder without finishing it leaves this frame unusable.
    pub fn start_object(&mut self, id: u32) -> Result<ObjectEncoder<'_, S::W>> {
        let depth = self.cursor.depth + 1;
        let max_depth = self.sink.sink().config.max_depth;
        if depth > max_depth {
            return Err(FrameError::DepthLimit(max_depth).into());
        }

        let sink = self.begin_field(id, TypeTag::Object)?;
        sink.open_depth = depth;
        let start_len = sink.w_len;
        tracing::trace!(field_id = id, depth, "opened nested frame");

        Ok(FrameEncoder {
            sink,
            cursor: FrameCursor::new(depth, start_len),
        })
    }

    /// Writes `val` as a nested frame laid out by its [`Record`] description.
    ///
    /// With [`ObjectEncoding::Sparse`], absent values are left out of the frame.
    /// With [`ObjectEncoding::Dense`], they are written as `Null` fields.
    pub fn write_object<T: Record>(
        &mut self,
        registry: &mut Registry,
        id: u32,
        val: &T,
        encoding: ObjectEncoding,
    ) -> Result<()> {
        let class = registry.class_info::<T>()?;
        let mut child = self.start_object(id)?;

        let mut out = RecordWriter::new(&mut child, registry, class, encoding);
        val.write_values(&mut out)?;
        out.end()?;

        child.finish()?;
        Ok(())
    }

    pub fn write_value(&mut self, id: u32, val: &Value) -> Result<()> {
        match val {
            Value::Null => self.write_null(id),
            Value::Boolean(v) => self.write_boolean(id, Some(*v)),
            Value::Byte(v) => self.write_byte(id, *v),
            Value::Short(v) => self.write_short(id, *v),
            Value::Char(v) => self.write_char(id, *v),
            Value::Int(v) => self.write_int(id, *v),
            Value::Long(v) => self.write_long(id, *v),
            Value::Float(v) => self.write_float(id, *v),
            Value::Double(v) => self.write_double(id, *v),
            Value::String(v) => self.write_string(id, Some(v.as_str())),
            Value::Array(v) => self.write_array_value(id, v),
            Value::Object(v) => self.write_generic(id, v),
        }
    }

    pub fn write_generic(&mut self, id: u32, obj: &GenericObject) -> Result<()> {
        let mut child = self.start_object(id)?;
        for (field_id, val) in obj.iter() {
            child.write_value(field_id, val)?;
        }
        child.finish()?;
        Ok(())
    }
}

impl<W: Write> FrameEncoder<Sink<W>> {
    pub fn new(w: W) -> Self {
        Self::with_config(w, CodecConfig::default())
    }

    pub fn with_config(w: W, config: CodecConfig) -> Self {
        let sink = Sink {
            w: BufWriter::with_capacity(config.buffer_capacity, w),
            w_len: 0,
            open_depth: 0,
            failed: false,
            config,
        };
        Self {
            sink,
            cursor: FrameCursor::new(0, 0),
        }
    }

    /// Terminates the top-level frame, flushes, and hands back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.end_frame()?;
        let Sink { w, w_len, .. } = self.sink;
        tracing::trace!(w_len, "finished top-level frame");
        w.into_inner()
            .map_err(|e| anyhow::Error::from(e.into_error()))
    }
}

impl<'p, W: Write> FrameEncoder<&'p mut Sink<W>> {
    /// Terminates this nested frame and returns the parent to service.
    pub fn finish(mut self) -> Result<WriteLen> {
        let depth = self.cursor.depth;
        let start_len = self.cursor.start_len;

        let sink = self.end_frame()?;
        sink.open_depth = depth - 1;
        let w_len = WriteLen(sink.w_len - start_len);
        tracing::trace!(depth, w_len = *w_len, "closed nested frame");

        Ok(w_len)
    }
}
