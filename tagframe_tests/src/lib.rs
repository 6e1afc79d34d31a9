//! Record types shared by the integration tests.

use anyhow::{anyhow, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tagframe_codec::{Record, RecordReader, RecordWriter, ShapeBuilder, SinkMut, SourceMut};

/// One field of every kind, and an optional child of its own type.
#[derive(PartialEq, Clone, Debug)]
pub struct Sample {
    pub flag: Option<bool>,
    pub byte: i8,
    pub short: i16,
    pub ch: char,
    pub int: i32,
    pub long: i64,
    pub float: f32,
    pub double: f64,
    pub name: Option<String>,
    pub ints: Option<Vec<i32>>,
    pub names: Vec<Option<String>>,
    pub child: Option<Box<Sample>>,
}

impl Record for Sample {
    fn class_name() -> &'static str {
        "Sample"
    }

    fn describe(shape: &mut ShapeBuilder<'_>) -> Result<()> {
        shape
            .field::<Option<bool>>("flag")?
            .field::<i8>("byte")?
            .field::<i16>("short")?
            .field::<char>("ch")?
            .field::<i32>("int")?
            .field::<i64>("long")?
            .field::<f32>("float")?
            .field::<f64>("double")?
            .field::<Option<String>>("name")?
            .array::<i32>("ints")?
            .array::<Option<String>>("names")?
            .object::<Sample>("child")?;
        Ok(())
    }

    fn write_values<S: SinkMut>(&self, out: &mut RecordWriter<'_, '_, S>) -> Result<()> {
        out.boolean(self.flag)?;
        out.byte(self.byte)?;
        out.short(self.short)?;
        out.char(self.ch)?;
        out.int(self.int)?;
        out.long(self.long)?;
        out.float(self.float)?;
        out.double(self.double)?;
        out.string(self.name.as_deref())?;
        out.array(self.ints.as_deref())?;
        out.array(Some(self.names.as_slice()))?;
        out.object(self.child.as_deref())
    }

    fn read_values<S: SourceMut>(inp: &mut RecordReader<'_, '_, S>) -> Result<Self> {
        Ok(Self {
            flag: inp.boolean()?,
            byte: inp.byte()?,
            short: inp.short()?,
            ch: inp.char()?,
            int: inp.int()?,
            long: inp.long()?,
            float: inp.float()?,
            double: inp.double()?,
            name: inp.string()?,
            ints: inp.array()?,
            names: inp.array()?.unwrap_or_default(),
            child: inp.object()?.map(Box::new),
        })
    }
}

impl Sample {
    /// Every nullable field is absent.
    pub fn sparse() -> Self {
        Self {
            flag: None,
            byte: 0,
            short: 0,
            ch: '\0',
            int: 0,
            long: 0,
            float: 0.0,
            double: 0.0,
            name: None,
            ints: None,
            names: vec![],
            child: None,
        }
    }

    pub fn extrema() -> Self {
        Self {
            flag: Some(true),
            byte: i8::MIN,
            short: i16::MAX,
            ch: char::MAX,
            int: i32::MIN,
            long: i64::MAX,
            float: f32::MAX,
            double: f64::MIN_POSITIVE,
            name: Some(String::new()),
            ints: Some(vec![i32::MIN, 0, i32::MAX]),
            names: vec![None, Some(String::new())],
            child: Some(Box::new(Self::sparse())),
        }
    }

    /// A chain of `depth` nested samples with random contents.
    pub fn random(rng: &mut impl Rng, depth: usize) -> Self {
        let child = match depth {
            0 => None,
            _ => Some(Box::new(Self::random(rng, depth - 1))),
        };
        Self {
            flag: rng.gen::<Option<bool>>(),
            byte: rng.gen(),
            short: rng.gen(),
            ch: rng.gen(),
            int: rng.gen(),
            long: rng.gen(),
            float: rng.gen(),
            double: rng.gen(),
            name: rng.gen_bool(0.8).then(|| random_string(rng)),
            ints: rng
                .gen_bool(0.5)
                .then(|| (0..rng.gen_range(0..20)).map(|_| rng.gen()).collect()),
            names: (0..rng.gen_range(0..5))
                .map(|_| rng.gen_bool(0.7).then(|| random_string(rng)))
                .collect(),
            child,
        }
    }
}

pub fn random_string(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(0..16);
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Record for Point {
    fn class_name() -> &'static str {
        "Point"
    }

    fn describe(shape: &mut ShapeBuilder<'_>) -> Result<()> {
        shape.field::<f64>("x")?.field::<f64>("y")?;
        Ok(())
    }

    fn write_values<S: SinkMut>(&self, out: &mut RecordWriter<'_, '_, S>) -> Result<()> {
        out.double(self.x)?;
        out.double(self.y)
    }

    fn read_values<S: SourceMut>(inp: &mut RecordReader<'_, '_, S>) -> Result<Self> {
        Ok(Self {
            x: inp.double()?,
            y: inp.double()?,
        })
    }
}

/// Holds a second record type, so descriptors span more than one class.
#[derive(PartialEq, Clone, Debug)]
pub struct Shape {
    pub label: String,
    pub origin: Point,
    pub extent: Option<Point>,
    pub tags: Vec<Option<String>>,
}

impl Record for Shape {
    fn class_name() -> &'static str {
        "Shape"
    }

    fn describe(shape: &mut ShapeBuilder<'_>) -> Result<()> {
        shape
            .field::<String>("label")?
            .object::<Point>("origin")?
            .object::<Point>("extent")?
            .array::<Option<String>>("tags")?;
        Ok(())
    }

    fn write_values<S: SinkMut>(&self, out: &mut RecordWriter<'_, '_, S>) -> Result<()> {
        out.string(Some(self.label.as_str()))?;
        out.object(Some(&self.origin))?;
        out.object(self.extent.as_ref())?;
        out.array(Some(self.tags.as_slice()))
    }

    fn read_values<S: SourceMut>(inp: &mut RecordReader<'_, '_, S>) -> Result<Self> {
        let label = inp.string()?.ok_or_else(|| anyhow!("Shape.label is required"))?;
        let origin = inp
            .object::<Point>()?
            .ok_or_else(|| anyhow!("Shape.origin is required"))?;
        Ok(Self {
            label,
            origin,
            extent: inp.object()?,
            tags: inp.array()?.unwrap_or_default(),
        })
    }
}
