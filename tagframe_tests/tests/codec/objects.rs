use super::frame_error;
use anyhow::Result;
use tagframe_codec::{Decoder, Encoder, ObjectEncoding, Registry};
use tagframe_tests::{Point, Sample};
use tagframe_types::serde::{TypeTag, Value};
use tagframe_types::FrameError;

fn encode(registry: &mut Registry, val: &Sample, encoding: ObjectEncoding) -> Result<Vec<u8>> {
    let mut enc = Encoder::new(vec![]);
    enc.write_object(registry, 1, val, encoding)?;
    enc.finish()
}

#[test]
fn nested_round_trip() -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut registry = Registry::new();
    let vals = [
        Sample::sparse(),
        Sample::extrema(),
        Sample::random(&mut rng, 0),
        Sample::random(&mut rng, 6),
    ];
    for val in vals.iter() {
        for encoding in [ObjectEncoding::Dense, ObjectEncoding::Sparse] {
            let buf = encode(&mut registry, val, encoding)?;
            let mut dec = Decoder::new(&buf[..]);
            assert_eq!(&dec.read_record::<Sample>(&mut registry)?, val);
            dec.finish()?;
        }
    }
    Ok(())
}

#[test]
fn sparse_omits_absent_values() -> Result<()> {
    let mut registry = Registry::new();
    let val = Sample::sparse();
    let dense = encode(&mut registry, &val, ObjectEncoding::Dense)?;
    let sparse = encode(&mut registry, &val, ObjectEncoding::Sparse)?;

    // flag, name, ints and child, each a bare field header.
    assert_eq!(dense.len(), sparse.len() + 4 * 5);

    let mut dec = Decoder::new(&dense[..]);
    let dense_obj = dec.read_all()?;
    let mut dec = Decoder::new(&sparse[..]);
    let sparse_obj = dec.read_all()?;
    assert_ne!(dense_obj, sparse_obj);
    assert_eq!(dense_obj.without_nulls(), sparse_obj);
    Ok(())
}

#[test]
fn generic_read_of_a_record() -> Result<()> {
    let mut registry = Registry::new();
    let val = Sample::extrema();
    let buf = encode(&mut registry, &val, ObjectEncoding::Dense)?;

    let mut dec = Decoder::new(&buf[..]);
    let top = dec.read_all()?;
    dec.finish()?;
    let obj = top.get(1).and_then(Value::as_object).unwrap();

    let class = registry.class_info::<Sample>()?;
    assert_eq!(obj.field_ids(), class.fields.iter().map(|f| f.field_id).collect::<Vec<_>>());
    for (field, (_, val)) in class.fields.iter().zip(obj.iter()) {
        assert_eq!(field.type_tag, val.type_tag(), "{}", field.name);
    }
    assert_eq!(obj.get(5), Some(&Value::Int(i32::MIN)));
    let child = obj.get(12).and_then(Value::as_object).unwrap();
    assert_eq!(child.get(1), Some(&Value::Null));
    Ok(())
}

/// Re-encoding what a generic read produced gives back the same bytes.
#[test]
fn generic_re_encode() -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut registry = Registry::new();
    let val = Sample::random(&mut rng, 3);
    for encoding in [ObjectEncoding::Dense, ObjectEncoding::Sparse] {
        let buf = encode(&mut registry, &val, encoding)?;

        let mut dec = Decoder::new(&buf[..]);
        let top = dec.read_all()?;
        dec.finish()?;

        let mut enc = Encoder::new(vec![]);
        for (field_id, val) in top.iter() {
            enc.write_value(field_id, val)?;
        }
        assert_eq!(enc.finish()?, buf);
    }
    Ok(())
}

#[test]
fn wrong_record_type() -> Result<()> {
    let mut registry = Registry::new();
    let buf = encode(&mut registry, &Sample::extrema(), ObjectEncoding::Dense)?;

    let mut dec = Decoder::new(&buf[..]);
    let err = dec.read_record::<Point>(&mut registry).unwrap_err();
    assert_eq!(
        frame_error(&err),
        Some(&FrameError::TypeMismatch {
            field_id: 1,
            expected: TypeTag::Double,
            found: TypeTag::Boolean,
        })
    );
    Ok(())
}

#[test]
fn skip_a_record() -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut registry = Registry::new();
    let mut enc = Encoder::new(vec![]);
    enc.write_object(&mut registry, 1, &Sample::random(&mut rng, 4), ObjectEncoding::Sparse)?;
    enc.write_object(&mut registry, 2, &Point { x: 1.0, y: 2.0 }, ObjectEncoding::Sparse)?;
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    dec.skip()?;
    assert_eq!(dec.read_record::<Point>(&mut registry)?, Point { x: 1.0, y: 2.0 });
    dec.finish()?;
    Ok(())
}
