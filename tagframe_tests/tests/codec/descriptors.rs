use super::frame_error;
use anyhow::Result;
use tagframe_codec::{Decoder, Encoder, Registry};
use tagframe_tests::{Point, Sample, Shape};
use tagframe_types::serde::TypeTag;
use tagframe_types::FrameError;

#[test]
fn descriptor_round_trip() -> Result<()> {
    let mut registry = Registry::new();
    let mut enc = Encoder::new(vec![]);
    registry.write_class::<Sample, _>(&mut enc, 1)?;
    let buf = enc.finish()?;

    let mut parsed = Registry::new();
    let mut dec = Decoder::new(&buf[..]);
    let class = parsed.read_class(&mut dec, 1)?;
    // The stream holds the descriptor and nothing else.
    dec.finish()?;

    assert_eq!(class, *registry.class_info::<Sample>()?);
    assert_eq!(class.name, "Sample");
    let child = class.fields.last().unwrap();
    assert_eq!(child.type_tag, TypeTag::Object);
    assert_eq!(child.class_id, Some(class.class_id));
    let names = class.fields.iter().find(|f| f.name == "names").unwrap();
    assert_eq!(names.element_type, Some(TypeTag::String));
    Ok(())
}

#[test]
fn reachable_classes_are_included() -> Result<()> {
    let mut registry = Registry::new();
    registry.set_field_start_id(10)?;
    let mut enc = Encoder::new(vec![]);
    registry.write_class::<Shape, _>(&mut enc, 1000)?;
    let buf = enc.finish()?;

    let mut parsed = Registry::new();
    let mut dec = Decoder::new(&buf[..]);
    let shape = parsed.read_class(&mut dec, 1000)?;
    dec.finish()?;

    let point = registry.class_info::<Point>()?;
    assert_eq!(shape.class_id, 0);
    assert_eq!(point.class_id, 1);
    assert_eq!(shape.fields[0].field_id, 10);
    assert_eq!(shape.fields[1].class_id, Some(point.class_id));
    assert_eq!(parsed.described_by_id(point.class_id), Some(point));
    Ok(())
}

#[test]
fn meta_ids_cannot_reach_frame_end() -> Result<()> {
    let mut registry = Registry::new();
    let mut enc = Encoder::new(vec![]);
    let err = registry
        .write_class::<Point, _>(&mut enc, u32::MAX - 4)
        .unwrap_err();
    assert_eq!(
        frame_error(&err),
        Some(&FrameError::ReservedFieldId(u32::MAX))
    );
    registry.write_class::<Point, _>(&mut enc, u32::MAX - 5)?;
    enc.finish()?;
    Ok(())
}

#[test]
fn inconsistent_field_descriptor() -> Result<()> {
    let mut enc = Encoder::new(vec![]);
    {
        let mut class = enc.start_object(1)?;
        class.write_long(1, 0)?;
        class.write_string(2, Some("Broken"))?;
        {
            let mut field = class.start_object(3)?;
            field.write_long(1, 1)?;
            field.write_string(2, Some("xs"))?;
            // An array without an element type.
            field.write_byte(3, 10)?;
            field.finish()?;
        }
        class.finish()?;
    }
    let buf = enc.finish()?;

    let mut registry = Registry::new();
    let mut dec = Decoder::new(&buf[..]);
    let err = registry.read_class(&mut dec, 1).unwrap_err();
    assert!(matches!(
        frame_error(&err),
        Some(FrameError::BadDescriptor(_))
    ));
    Ok(())
}
