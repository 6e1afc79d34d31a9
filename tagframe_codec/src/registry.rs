use crate::array::ArrayElement;
use crate::decoder::{FrameDecoder, SourceMut};
use crate::encoder::{FrameEncoder, SinkMut};
use anyhow::Result;
use std::any::{self, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tagframe_types::serde::{FieldId, TypeTag, TypeTagInt};
use tagframe_types::FrameError;


pub const DEFAULT_FIELD_START_ID: u32 = 1;

/// Whether absent values of a record are written as `Null` fields or left out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectEncoding {
    Dense,
    Sparse,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldInfo {
    pub field_id: u32,
    pub name: String,
    pub type_tag: TypeTag,
    /// Only for `Array` fields.
    pub element_type: Option<TypeTag>,
    /// Only for `Object` fields.
    pub class_id: Option<u32>,
}

/// The layout of one record type: its fields, in ascending field id order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClassInfo {
    pub class_id: u32,
    pub name: String,
    pub fields: Vec<FieldInfo>,
}
impl ClassInfo {
    pub fn field(&self, field_id: u32) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }
}

/// A field type that has a single-field wire representation.
pub trait Scalar {
    const TAG: TypeTag;
}
macro_rules! impl_scalar {
    ($tag:expr, $($ty:ty),+) => {
        $(impl Scalar for $ty {
            const TAG: TypeTag = $tag;
        })+
    };
}
impl_scalar!(TypeTag::Boolean, bool, Option<bool>);
impl_scalar!(TypeTag::Byte, i8);
impl_scalar!(TypeTag::Short, i16);
impl_scalar!(TypeTag::Char, char);
impl_scalar!(TypeTag::Int, i32);
impl_scalar!(TypeTag::Long, i64);
impl_scalar!(TypeTag::Float, f32);
impl_scalar!(TypeTag::Double, f64);
impl_scalar!(TypeTag::String, String, Option<String>);

/// A type that can be written as, and read back from, an `Object` field.
///
/// `write_values` and `read_values` must visit the fields in the order `describe` declared them.
pub trait Record: Sized + 'static {
    fn class_name() -> &'static str {
        any::type_name::<Self>()
    }

    fn describe(shape: &mut ShapeBuilder<'_>) -> Result<()>;

    fn write_values<S: SinkMut>(&self, out: &mut RecordWriter<'_, '_, S>) -> Result<()>;

    fn read_values<S: SourceMut>(inp: &mut RecordReader<'_, '_, S>) -> Result<Self>;
}

/// Collects the fields of one class, assigning ascending field ids.
pub struct ShapeBuilder<'r> {
    registry: &'r mut Registry,
    next_id: u32,
    fields: Vec<FieldInfo>,
}

impl<'r> ShapeBuilder<'r> {
    fn push(
        &mut self,
        name: &str,
        type_tag: TypeTag,
        element_type: Option<TypeTag>,
        class_id: Option<u32>,
    ) -> Result<&mut Self> {
        let field_id = *FieldId::new_checked(self.next_id)?;
        self.next_id = field_id.saturating_add(1);
        self.fields.push(FieldInfo {
            field_id,
            name: name.to_owned(),
            type_tag,
            element_type,
            class_id,
        });
        Ok(self)
    }

    pub fn field<T: Scalar>(&mut self, name: &str) -> Result<&mut Self> {
        self.push(name, T::TAG, None, None)
    }

    pub fn array<T: ArrayElement>(&mut self, name: &str) -> Result<&mut Self> {
        self.push(name, TypeTag::Array, Some(T::TAG), None)
    }

    pub fn object<C: Record>(&mut self, name: &str) -> Result<&mut Self> {
        let class_id = self.registry.register::<C>()?;
        self.push(name, TypeTag::Object, None, Some(class_id))
    }
}

/// Describes record types on first use and remembers the result.
///
/// Class ids ascend from zero in the order classes are first introspected.
pub struct Registry {
    field_start_id: u32,
    next_class_id: u32,
    by_type: HashMap<TypeId, u32>,
    classes: BTreeMap<u32, Arc<ClassInfo>>,
    /// Classes parsed out of descriptor frames.
    described: BTreeMap<u32, Arc<ClassInfo>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            field_start_id: DEFAULT_FIELD_START_ID,
            next_class_id: 0,
            by_type: HashMap::new(),
            classes: BTreeMap::new(),
            described: BTreeMap::new(),
        }
    }

    /// Applies to classes introspected from now on.
    pub fn set_field_start_id(&mut self, id: u32) -> Result<()> {
        FieldId::new_checked(id)?;
        self.field_start_id = id;
        Ok(())
    }

    pub fn field_start_id(&self) -> u32 {
        self.field_start_id
    }

    /// The class id of `T`, describing it first if needed.
    ///
    /// The id is reserved before `T` is described, so a `T` that contains itself
    /// resolves to its own id.
    fn register<T: Record>(&mut self) -> Result<u32> {
        let type_id = TypeId::of::<T>();
        if let Some(class_id) = self.by_type.get(&type_id) {
            return Ok(*class_id);
        }

        let class_id = self.next_class_id;
        self.next_class_id += 1;
        self.by_type.insert(type_id, class_id);

        let next_id = self.field_start_id;
        let described = {
            let mut shape = ShapeBuilder {
                registry: &mut *self,
                next_id,
                fields: vec![],
            };
            T::describe(&mut shape).map(|()| shape.fields)
        };
        let fields = match described {
            Ok(fields) => fields,
            Err(e) => {
                // Forget this class and every class first registered while describing it.
                self.by_type.retain(|_, id| *id < class_id);
                self.classes.retain(|id, _| *id < class_id);
                self.next_class_id = class_id;
                return Err(e);
            }
        };

        let name = T::class_name().to_owned();
        tracing::debug!(class_id, name = %name, fields = fields.len(), "introspected class");
        self.classes.insert(
            class_id,
            Arc::new(ClassInfo {
                class_id,
                name,
                fields,
            }),
        );
        Ok(class_id)
    }

    pub fn class_info<T: Record>(&mut self) -> Result<Arc<ClassInfo>> {
        let class_id = self.register::<T>()?;
        self.classes
            .get(&class_id)
            .cloned()
            .ok_or_else(|| FrameError::UnknownClass(class_id).into())
    }

    /// An introspected class, or else one parsed by [`Registry::read_class`].
    pub fn class_by_id(&self, class_id: u32) -> Option<Arc<ClassInfo>> {
        self.classes
            .get(&class_id)
            .or_else(|| self.described.get(&class_id))
            .cloned()
    }

    pub fn described_by_id(&self, class_id: u32) -> Option<Arc<ClassInfo>> {
        self.described.get(&class_id).cloned()
    }

    /// `root` and every class reachable from it, breadth first in field order.
    fn reachable(&self, root: &Arc<ClassInfo>) -> Result<Vec<Arc<ClassInfo>>> {
        let mut seen = BTreeSet::from([root.class_id]);
        let mut out = vec![Arc::clone(root)];
        let mut i = 0;
        while i < out.len() {
            let nested = nested_ids(&out[i])
                .filter(|class_id| seen.insert(*class_id))
                .collect::<Vec<_>>();
            for class_id in nested {
                let class = self
                    .classes
                    .get(&class_id)
                    .ok_or(FrameError::UnknownClass(class_id))?;
                out.push(Arc::clone(class));
            }
            i += 1;
        }
        Ok(out)
    }

    /// Writes the descriptors of `T` and every class reachable from it into `enc`'s frame,
    /// as `Object` fields with id `meta_start_id`.
    ///
    /// `T` comes first, then the other classes in the order a breadth-first walk
    /// over the fields discovers them.
    pub fn write_class<T: Record, S: SinkMut>(
        &mut self,
        enc: &mut FrameEncoder<S>,
        meta_start_id: u32,
    ) -> Result<()> {
        let m = meta_ids(meta_start_id)?;
        let root = self.class_info::<T>()?;

        for class in self.reachable(&root)? {
            let mut class_enc = enc.start_object(m)?;
            class_enc.write_long(m, i64::from(class.class_id))?;
            class_enc.write_string(m + 1, Some(class.name.as_str()))?;
            for field in class.fields.iter() {
                let mut field_enc = class_enc.start_object(m + 2)?;
                field_enc.write_long(m, i64::from(field.field_id))?;
                field_enc.write_string(m + 1, Some(field.name.as_str()))?;
                field_enc.write_byte(m + 2, tag_byte(field.type_tag))?;
                if let Some(elem) = field.element_type {
                    field_enc.write_byte(m + 3, tag_byte(elem))?;
                }
                if let Some(class_id) = field.class_id {
                    field_enc.write_long(m + 4, i64::from(class_id))?;
                }
                field_enc.finish()?;
            }
            class_enc.finish()?;
        }
        Ok(())
    }

    /// Reads the descriptor frames written by one [`Registry::write_class`] call
    /// and returns the root class.
    ///
    /// Exactly the classes reachable from the root are consumed, so several descriptors
    /// may follow each other in one frame. Every parsed class is kept for [`Registry::class_by_id`].
    pub fn read_class<S: SourceMut>(
        &mut self,
        dec: &mut FrameDecoder<S>,
        meta_start_id: u32,
    ) -> Result<ClassInfo> {
        let m = meta_ids(meta_start_id)?;

        let root = self.read_one_class(dec, m)?;
        let mut seen = BTreeSet::from([root.class_id]);
        let mut pending = nested_ids(&root)
            .filter(|class_id| seen.insert(*class_id))
            .collect::<VecDeque<_>>();

        while let Some(expected) = pending.pop_front() {
            let class = self.read_one_class(dec, m)?;
            if class.class_id != expected {
                return Err(bad_descriptor(format!(
                    "expected class {expected}, found class {}",
                    class.class_id
                )));
            }
            pending.extend(nested_ids(&class).filter(|class_id| seen.insert(*class_id)));
        }
        Ok(root)
    }

    fn read_one_class<S: SourceMut>(
        &mut self,
        dec: &mut FrameDecoder<S>,
        m: u32,
    ) -> Result<ClassInfo> {
        let is_class_frame = dec.has_next_field()?
            && dec.field_id()? == m
            && dec.current_field_type() == Some(TypeTag::Object);
        if !is_class_frame {
            return Err(bad_descriptor("missing class descriptor frame"));
        }

        let mut class_dec = dec.start_object()?;
        let class = parse_class(&mut class_dec, m)?;
        class_dec.finish()?;

        tracing::debug!(
            class_id = class.class_id,
            name = %class.name,
            fields = class.fields.len(),
            "parsed class descriptor"
        );
        self.described
            .insert(class.class_id, Arc::new(class.clone()));
        Ok(class)
    }
}

fn nested_ids(class: &ClassInfo) -> impl Iterator<Item = u32> + '_ {
    class.fields.iter().filter_map(|f| f.class_id)
}

fn meta_ids(meta_start_id: u32) -> Result<u32> {
    match meta_start_id.checked_add(4) {
        Some(last) if last != FieldId::FRAME_END => Ok(meta_start_id),
        _ => Err(FrameError::ReservedFieldId(FieldId::FRAME_END).into()),
    }
}

fn tag_byte(tag: TypeTag) -> i8 {
    *TypeTagInt::from(tag) as i8
}

fn bad_descriptor(detail: impl Into<String>) -> anyhow::Error {
    FrameError::BadDescriptor(detail.into()).into()
}

fn expect_field<S: SourceMut>(dec: &mut FrameDecoder<S>, id: u32, what: &str) -> Result<()> {
    if !dec.has_next_field()? || dec.field_id()? != id {
        return Err(bad_descriptor(format!("missing {what}")));
    }
    Ok(())
}

fn has_field<S: SourceMut>(dec: &mut FrameDecoder<S>, id: u32) -> Result<bool> {
    Ok(dec.has_next_field()? && dec.field_id()? == id)
}

fn read_id<S: SourceMut>(dec: &mut FrameDecoder<S>, what: &str) -> Result<u32> {
    let long = dec.read_long()?;
    u32::try_from(long).map_err(|_| bad_descriptor(format!("{what} out of range: {long}")))
}

fn read_name<S: SourceMut>(dec: &mut FrameDecoder<S>, what: &str) -> Result<String> {
    dec.read_string()?
        .ok_or_else(|| bad_descriptor(format!("null {what}")))
}

fn read_tag<S: SourceMut>(dec: &mut FrameDecoder<S>) -> Result<TypeTag> {
    let byte = dec.read_byte()?;
    Ok(TypeTag::try_from(TypeTagInt::from(byte as u8))?)
}

fn parse_class<S: SourceMut>(dec: &mut FrameDecoder<S>, m: u32) -> Result<ClassInfo> {
    expect_field(dec, m, "class id")?;
    let class_id = read_id(dec, "class id")?;
    expect_field(dec, m + 1, "class name")?;
    let name = read_name(dec, "class name")?;

    let mut fields: Vec<FieldInfo> = vec![];
    while dec.has_next_field()? {
        if dec.field_id()? != m + 2 {
            return Err(bad_descriptor(format!(
                "unexpected field {} in class {name}",
                dec.field_id()?
            )));
        }
        let mut field_dec = dec.start_object()?;
        let field = parse_field(&mut field_dec, m)?;
        field_dec.finish()?;

        if let Some(prev) = fields.last() {
            if prev.field_id >= field.field_id {
                return Err(bad_descriptor(format!(
                    "field ids of class {name} do not ascend"
                )));
            }
        }
        fields.push(field);
    }

    Ok(ClassInfo {
        class_id,
        name,
        fields,
    })
}

fn parse_field<S: SourceMut>(dec: &mut FrameDecoder<S>, m: u32) -> Result<FieldInfo> {
    expect_field(dec, m, "field id")?;
    let field_id = read_id(dec, "field id")?;
    FieldId::new_checked(field_id)?;
    expect_field(dec, m + 1, "field name")?;
    let name = read_name(dec, "field name")?;
    expect_field(dec, m + 2, "field type")?;
    let type_tag = read_tag(dec)?;

    let element_type = match has_field(dec, m + 3)? {
        true => Some(read_tag(dec)?),
        false => None,
    };
    let class_id = match has_field(dec, m + 4)? {
        true => Some(read_id(dec, "nested class id")?),
        false => None,
    };

    match (type_tag, element_type, class_id) {
        (TypeTag::Array, Some(elem), None) if elem.is_array_element() => {}
        (TypeTag::Object, None, Some(_)) => {}
        (TypeTag::Array | TypeTag::Object | TypeTag::Null, _, _) | (_, Some(_), _) | (_, _, Some(_)) => {
            return Err(bad_descriptor(format!(
                "inconsistent descriptor for field {name}"
            )));
        }
        _ => {}
    }

    Ok(FieldInfo {
        field_id,
        name,
        type_tag,
        element_type,
        class_id,
    })
}

fn shape_mismatch(class: &ClassInfo, detail: String) -> anyhow::Error {
    FrameError::ShapeMismatch {
        class: class.name.clone(),
        detail,
    }
    .into()
}

/// Checks that the next described field has tag `tag`, then moves past it.
fn next_described<'c>(
    class: &'c ClassInfo,
    next: &mut usize,
    tag: TypeTag,
) -> Result<&'c FieldInfo> {
    let field = class.fields.get(*next).ok_or_else(|| {
        shape_mismatch(
            class,
            format!("more values than the {} described fields", class.fields.len()),
        )
    })?;
    if field.type_tag != tag {
        return Err(shape_mismatch(
            class,
            format!(
                "field {} is described as {:?}, visited as {tag:?}",
                field.name, field.type_tag
            ),
        ));
    }
    *next += 1;
    Ok(field)
}

fn check_element(class: &ClassInfo, field: &FieldInfo, elem: TypeTag) -> Result<()> {
    if field.element_type != Some(elem) {
        return Err(shape_mismatch(
            class,
            format!(
                "field {} is described with elements {:?}, visited with {elem:?}",
                field.name, field.element_type
            ),
        ));
    }
    Ok(())
}

fn check_class(class: &ClassInfo, field: &FieldInfo, class_id: u32) -> Result<()> {
    if field.class_id != Some(class_id) {
        return Err(shape_mismatch(
            class,
            format!(
                "field {} is described as class {:?}, visited as class {class_id}",
                field.name, field.class_id
            ),
        ));
    }
    Ok(())
}

/// Writes the values of one record, in described order, into its frame.
pub struct RecordWriter<'e, 'r, S> {
    enc: &'e mut FrameEncoder<S>,
    registry: &'r mut Registry,
    class: Arc<ClassInfo>,
    next: usize,
    encoding: ObjectEncoding,
}

impl<'e, 'r, S: SinkMut> RecordWriter<'e, 'r, S> {
    pub(crate) fn new(
        enc: &'e mut FrameEncoder<S>,
        registry: &'r mut Registry,
        class: Arc<ClassInfo>,
        encoding: ObjectEncoding,
    ) -> Self {
        Self {
            enc,
            registry,
            class,
            next: 0,
            encoding,
        }
    }

    fn next_id(&mut self, tag: TypeTag) -> Result<u32> {
        let field = next_described(&self.class, &mut self.next, tag)?;
        Ok(field.field_id)
    }

    fn absent(&mut self, field_id: u32) -> Result<()> {
        match self.encoding {
            ObjectEncoding::Dense => self.enc.write_null(field_id),
            ObjectEncoding::Sparse => Ok(()),
        }
    }

    pub fn boolean(&mut self, val: Option<bool>) -> Result<()> {
        let field_id = self.next_id(TypeTag::Boolean)?;
        match val {
            None => self.absent(field_id),
            some => self.enc.write_boolean(field_id, some),
        }
    }

    pub fn byte(&mut self, val: i8) -> Result<()> {
        let field_id = self.next_id(TypeTag::Byte)?;
        self.enc.write_byte(field_id, val)
    }

    pub fn short(&mut self, val: i16) -> Result<()> {
        let field_id = self.next_id(TypeTag::Short)?;
        self.enc.write_short(field_id, val)
    }

    pub fn char(&mut self, val: char) -> Result<()> {
        let field_id = self.next_id(TypeTag::Char)?;
        self.enc.write_char(field_id, val)
    }

    pub fn int(&mut self, val: i32) -> Result<()> {
        let field_id = self.next_id(TypeTag::Int)?;
        self.enc.write_int(field_id, val)
    }

    pub fn long(&mut self, val: i64) -> Result<()> {
        let field_id = self.next_id(TypeTag::Long)?;
        self.enc.write_long(field_id, val)
    }

    pub fn float(&mut self, val: f32) -> Result<()> {
        let field_id = self.next_id(TypeTag::Float)?;
        self.enc.write_float(field_id, val)
    }

    pub fn double(&mut self, val: f64) -> Result<()> {
        let field_id = self.next_id(TypeTag::Double)?;
        self.enc.write_double(field_id, val)
    }

    pub fn string(&mut self, val: Option<&str>) -> Result<()> {
        let field_id = self.next_id(TypeTag::String)?;
        match val {
            None => self.absent(field_id),
            some => self.enc.write_string(field_id, some),
        }
    }

    pub fn array<T: ArrayElement>(&mut self, val: Option<&[T]>) -> Result<()> {
        let field = next_described(&self.class, &mut self.next, TypeTag::Array)?;
        check_element(&self.class, field, T::TAG)?;
        let field_id = field.field_id;
        match val {
            None => self.absent(field_id),
            Some(elems) => self.enc.write_array(field_id, elems),
        }
    }

    pub fn object<C: Record>(&mut self, val: Option<&C>) -> Result<()> {
        let class_id = self.registry.register::<C>()?;
        let field = next_described(&self.class, &mut self.next, TypeTag::Object)?;
        check_class(&self.class, field, class_id)?;
        let field_id = field.field_id;
        match val {
            None => self.absent(field_id),
            Some(val) => self
                .enc
                .write_object(&mut *self.registry, field_id, val, self.encoding),
        }
    }

    /// Verifies that every described field was visited.
    pub fn end(self) -> Result<()> {
        if self.next != self.class.fields.len() {
            return Err(shape_mismatch(
                &self.class,
                format!(
                    "wrote {} of {} described fields",
                    self.next,
                    self.class.fields.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Reads the values of one record, in described order, out of its frame.
///
/// A described field is absent when the frame skips past its id or ends before it,
/// or when the field holds `Null`.
pub struct RecordReader<'d, 'r, S> {
    dec: &'d mut FrameDecoder<S>,
    registry: &'r mut Registry,
    class: Arc<ClassInfo>,
    next: usize,
}

impl<'d, 'r, S: SourceMut> RecordReader<'d, 'r, S> {
    pub(crate) fn new(
        dec: &'d mut FrameDecoder<S>,
        registry: &'r mut Registry,
        class: Arc<ClassInfo>,
    ) -> Self {
        Self {
            dec,
            registry,
            class,
            next: 0,
        }
    }

    /// Whether the given described field carries a non-null value. If so, the field is pending.
    fn present(&mut self, field_id: u32) -> Result<bool> {
        if !self.dec.has_next_field()? {
            return Ok(false);
        }
        let stream_id = self.dec.field_id()?;
        if stream_id > field_id {
            return Ok(false);
        }
        if stream_id < field_id {
            return Err(FrameError::UnexpectedField {
                class: self.class.name.clone(),
                field_id: stream_id,
            }
            .into());
        }
        if self.dec.current_field_type() == Some(TypeTag::Null) {
            self.dec.read_null()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// The id of the next described field, if it is present.
    fn next_present(&mut self, tag: TypeTag) -> Result<Option<u32>> {
        let field_id = next_described(&self.class, &mut self.next, tag)?.field_id;
        Ok(self.present(field_id)?.then_some(field_id))
    }

    fn missing(&self) -> anyhow::Error {
        let field = self
            .next
            .checked_sub(1)
            .and_then(|i| self.class.fields.get(i))
            .map(|f| f.name.clone())
            .unwrap_or_default();
        FrameError::MissingField {
            class: self.class.name.clone(),
            field,
        }
        .into()
    }

    fn required(&mut self, tag: TypeTag) -> Result<()> {
        match self.next_present(tag)? {
            Some(_) => Ok(()),
            None => Err(self.missing()),
        }
    }

    pub fn boolean(&mut self) -> Result<Option<bool>> {
        match self.next_present(TypeTag::Boolean)? {
            Some(_) => self.dec.read_boolean(),
            None => Ok(None),
        }
    }

    pub fn byte(&mut self) -> Result<i8> {
        self.required(TypeTag::Byte)?;
        self.dec.read_byte()
    }

    pub fn short(&mut self) -> Result<i16> {
        self.required(TypeTag::Short)?;
        self.dec.read_short()
    }

    pub fn char(&mut self) -> Result<char> {
        self.required(TypeTag::Char)?;
        self.dec.read_char()
    }

    pub fn int(&mut self) -> Result<i32> {
        self.required(TypeTag::Int)?;
        self.dec.read_int()
    }

    pub fn long(&mut self) -> Result<i64> {
        self.required(TypeTag::Long)?;
        self.dec.read_long()
    }

    pub fn float(&mut self) -> Result<f32> {
        self.required(TypeTag::Float)?;
        self.dec.read_float()
    }

    pub fn double(&mut self) -> Result<f64> {
        self.required(TypeTag::Double)?;
        self.dec.read_double()
    }

    pub fn string(&mut self) -> Result<Option<String>> {
        match self.next_present(TypeTag::String)? {
            Some(_) => self.dec.read_string(),
            None => Ok(None),
        }
    }

    pub fn array<T: ArrayElement>(&mut self) -> Result<Option<Vec<T>>> {
        let field = next_described(&self.class, &mut self.next, TypeTag::Array)?;
        check_element(&self.class, field, T::TAG)?;
        let field_id = field.field_id;
        match self.present(field_id)? {
            true => self.dec.read_array_of::<T>().map(Some),
            false => Ok(None),
        }
    }

    pub fn object<C: Record>(&mut self) -> Result<Option<C>> {
        let class_id = self.registry.register::<C>()?;
        let field = next_described(&self.class, &mut self.next, TypeTag::Object)?;
        check_class(&self.class, field, class_id)?;
        let field_id = field.field_id;
        match self.present(field_id)? {
            true => self.dec.read_record::<C>(&mut *self.registry).map(Some),
            false => Ok(None),
        }
    }

    /// Verifies that every described field was visited and that the frame holds nothing else.
    pub fn end(self) -> Result<()> {
        if self.next != self.class.fields.len() {
            return Err(shape_mismatch(
                &self.class,
                format!(
                    "read {} of {} described fields",
                    self.next,
                    self.class.fields.len()
                ),
            ));
        }
        if self.dec.has_next_field()? {
            return Err(FrameError::UnexpectedField {
                class: self.class.name.clone(),
                field_id: self.dec.field_id()?,
            }
            .into());
        }
        Ok(())
    }
}
