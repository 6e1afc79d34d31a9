use super::frame_error;
use anyhow::Result;
use itertools::Itertools;
use tagframe_codec::{Decoder, Encoder};
use tagframe_types::serde::{GenericObject, Number, TypeTag, Value};
use tagframe_types::FrameError;

fn extrema() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Boolean(false),
        Value::Byte(i8::MIN),
        Value::Short(i16::MAX),
        Value::Char(char::MAX),
        Value::Int(i32::MIN),
        Value::Long(i64::MAX),
        Value::Float(f32::MIN_POSITIVE),
        Value::Double(f64::MIN),
        Value::String(String::new()),
        Value::String("grüße, 世界".into()),
    ]
}

/// Every combination of extreme values survives a round trip, field ids included.
#[test]
fn extrema_round_trip() -> Result<()> {
    for subset in extrema().into_iter().enumerate().powerset() {
        let mut enc = Encoder::new(vec![]);
        for (id, val) in subset.iter() {
            enc.write_value(*id as u32, val)?;
        }
        let buf = enc.finish()?;

        let mut dec = Decoder::new(&buf[..]);
        let obj = dec.read_all()?;
        dec.finish()?;

        let exp = subset
            .into_iter()
            .map(|(id, val)| (id as u32, val))
            .collect::<GenericObject>();
        assert_eq!(obj, exp);
    }
    Ok(())
}

#[test]
fn typed_readers() -> Result<()> {
    let mut enc = Encoder::new(vec![]);
    enc.write_boolean(0, Some(false))?;
    enc.write_byte(1, i8::MAX)?;
    enc.write_short(2, i16::MIN)?;
    enc.write_char(3, '\u{1F600}')?;
    enc.write_int(4, i32::MAX)?;
    enc.write_long(5, i64::MIN)?;
    enc.write_float(6, f32::MAX)?;
    enc.write_double(7, f64::EPSILON)?;
    enc.write_string(8, Some(""))?;
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    assert_eq!(dec.read_boolean()?, Some(false));
    assert_eq!(dec.read_byte()?, i8::MAX);
    assert_eq!(dec.read_short()?, i16::MIN);
    assert_eq!(dec.read_char()?, '\u{1F600}');
    assert_eq!(dec.read_int()?, i32::MAX);
    assert_eq!(dec.read_long()?, i64::MIN);
    assert_eq!(dec.read_float()?, f32::MAX);
    assert_eq!(dec.read_double()?, f64::EPSILON);
    assert_eq!(dec.read_string()?, Some(String::new()));
    dec.finish()?;
    Ok(())
}

#[test]
fn read_number_widens_nothing() -> Result<()> {
    let nums = [
        Number::Byte(-1),
        Number::Short(-1),
        Number::Int(-1),
        Number::Long(-1),
        Number::Float(-1.0),
        Number::Double(-1.0),
    ];
    let mut enc = Encoder::new(vec![]);
    for (id, num) in nums.iter().enumerate() {
        enc.write_value(id as u32, &Value::from(*num))?;
    }
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    for num in nums.iter() {
        assert_eq!(dec.current_field_type(), None);
        assert!(dec.has_next_field()?);
        assert_eq!(dec.current_field_type(), Some(TypeTag::from(num)));
        let read = dec.read_number()?;
        assert_eq!(read, *num);
        assert_eq!(read.as_f64(), -1.0);
    }
    dec.finish()?;
    Ok(())
}

#[test]
fn null_is_not_a_primitive() -> Result<()> {
    let mut enc = Encoder::new(vec![]);
    enc.write_null(1)?;
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    let err = dec.read_int().unwrap_err();
    assert_eq!(
        frame_error(&err),
        Some(&FrameError::TypeMismatch {
            field_id: 1,
            expected: TypeTag::Int,
            found: TypeTag::Null,
        })
    );
    assert_eq!(dec.read_string()?, None);
    dec.finish()?;
    Ok(())
}
