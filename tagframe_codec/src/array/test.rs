#[cfg(test)]
mod test {
    use crate::decoder::Decoder;
    use crate::encoder::Encoder;
    use anyhow::Result;
    use tagframe_types::serde::{ArrayValue, TypeTag};

    #[test]
    fn packed_layout() -> Result<()> {
        let mut enc = Encoder::new(vec![]);
        enc.write_array(3, &[1i16, -1])?;
        let buf = enc.finish()?;

        let mut exp: Vec<u8> = vec![];
        exp.extend([3, 0, 0, 0, 10]);
        exp.extend([3, 2, 0, 0, 0]);
        exp.extend([1, 0, 0xFF, 0xFF]);
        exp.extend([0xFF; 4]);
        assert_eq!(buf, exp);
        Ok(())
    }

    #[test]
    fn string_elements_distinguish_null_from_empty() -> Result<()> {
        let elems = vec![Some("a".to_owned()), None, Some(String::new())];
        let mut enc = Encoder::new(vec![]);
        enc.write_array(1, &elems)?;
        let buf = enc.finish()?;

        let mut exp: Vec<u8> = vec![];
        exp.extend([1, 0, 0, 0, 10]);
        exp.extend([9, 3, 0, 0, 0]);
        exp.extend([1, 0, 0, 0, b'a']);
        exp.extend([0xFF; 4]);
        exp.extend([0, 0, 0, 0]);
        exp.extend([0xFF; 4]);
        assert_eq!(buf, exp);

        let mut dec = Decoder::new(&buf[..]);
        assert_eq!(dec.read_string_array()?, elems);
        dec.finish()?;
        Ok(())
    }

    #[test]
    fn empty_arrays_keep_their_type() -> Result<()> {
        let mut enc = Encoder::new(vec![]);
        enc.write_array::<char>(1, &[])?;
        enc.write_array::<bool>(2, &[])?;
        enc.write_array::<Option<String>>(3, &[])?;
        let buf = enc.finish()?;

        let mut dec = Decoder::new(&buf[..]);
        let a = dec.read_array()?;
        let b = dec.read_array()?;
        let c = dec.read_array()?;
        dec.finish()?;

        assert_eq!(a, ArrayValue::Char(vec![]));
        assert_eq!(b.elem_type(), TypeTag::Boolean);
        assert_eq!(c.elem_type(), TypeTag::String);
        assert!(c.is_empty());
        Ok(())
    }

    #[test]
    fn untyped_read_matches_typed_write() -> Result<()> {
        let arrays = vec![
            ArrayValue::Boolean(vec![true, false]),
            ArrayValue::Byte(vec![i8::MIN, 0, i8::MAX]),
            ArrayValue::Short(vec![i16::MIN, i16::MAX]),
            ArrayValue::Char(vec!['a', '\u{10FFFF}']),
            ArrayValue::Int(vec![i32::MIN]),
            ArrayValue::Long(vec![i64::MAX, 0]),
            ArrayValue::Float(vec![f32::MIN_POSITIVE, -0.0]),
            ArrayValue::Double(vec![f64::MAX, f64::NEG_INFINITY]),
            ArrayValue::String(vec![None, Some("ü".to_owned())]),
        ];
        let mut enc = Encoder::new(vec![]);
        for (i, arr) in arrays.iter().enumerate() {
            enc.write_array_value(i as u32, arr)?;
        }
        let buf = enc.finish()?;

        let mut dec = Decoder::new(&buf[..]);
        for arr in arrays.iter() {
            assert_eq!(&dec.read_array()?, arr);
        }
        dec.finish()?;
        Ok(())
    }

    #[test]
    fn skip_arrays() -> Result<()> {
        let mut enc = Encoder::new(vec![]);
        enc.write_array(1, &[1i64, 2, 3])?;
        enc.write_array(2, &[Some("xy".to_owned()), None])?;
        let buf = enc.finish()?;

        let mut dec = Decoder::new(&buf[..]);
        assert_eq!(dec.skip()?, 5 + 3 * 8);
        assert_eq!(dec.skip()?, 5 + (4 + 2) + 4);
        dec.finish()?;
        Ok(())
    }
}
