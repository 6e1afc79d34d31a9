use anyhow::Result;
use rand::distributions::{Distribution, Standard};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::fmt::Debug;
use tagframe_codec::{ArrayElement, Decoder, Encoder};
use tagframe_tests::random_string;

const RANDOM_LEN: usize = 101;

fn round_trip<T>(elems: Vec<T>) -> Result<()>
where
    T: ArrayElement + PartialEq + Debug,
{
    let mut enc = Encoder::new(vec![]);
    enc.write_array(1, &elems)?;
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    assert_eq!(dec.read_array_of::<T>()?, elems);
    dec.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    let arr = dec.read_array()?;
    assert_eq!(arr.elem_type(), T::TAG);
    assert_eq!(arr.len(), elems.len());
    dec.finish()?;
    Ok(())
}

fn random_and_empty<T>(rng: &mut ThreadRng) -> Result<()>
where
    T: ArrayElement + PartialEq + Debug,
    Standard: Distribution<T>,
{
    let elems = (0..RANDOM_LEN).map(|_| rng.gen::<T>()).collect::<Vec<_>>();
    round_trip(elems)?;
    round_trip(Vec::<T>::new())
}

#[test]
fn every_element_type() -> Result<()> {
    let mut rng = rand::thread_rng();
    random_and_empty::<bool>(&mut rng)?;
    random_and_empty::<i8>(&mut rng)?;
    random_and_empty::<i16>(&mut rng)?;
    random_and_empty::<char>(&mut rng)?;
    random_and_empty::<i32>(&mut rng)?;
    random_and_empty::<i64>(&mut rng)?;
    random_and_empty::<f32>(&mut rng)?;
    random_and_empty::<f64>(&mut rng)?;

    let strings = (0..RANDOM_LEN)
        .map(|_| rng.gen_bool(0.9).then(|| random_string(&mut rng)))
        .collect::<Vec<_>>();
    round_trip(strings)?;
    round_trip(Vec::<Option<String>>::new())
}

#[test]
fn named_readers() -> Result<()> {
    let mut enc = Encoder::new(vec![]);
    enc.write_array(1, &[true])?;
    enc.write_array(2, &[1i8])?;
    enc.write_array(3, &[2i16])?;
    enc.write_array(4, &['c'])?;
    enc.write_array(5, &[3i32])?;
    enc.write_array(6, &[4i64])?;
    enc.write_array(7, &[5.0f32])?;
    enc.write_array(8, &[6.0f64])?;
    enc.write_array(9, &[Some("s".to_owned())])?;
    let buf = enc.finish()?;

    let mut dec = Decoder::new(&buf[..]);
    assert_eq!(dec.read_boolean_array()?, vec![true]);
    assert_eq!(dec.read_byte_array()?, vec![1]);
    assert_eq!(dec.read_short_array()?, vec![2]);
    assert_eq!(dec.read_char_array()?, vec!['c']);
    assert_eq!(dec.read_int_array()?, vec![3]);
    assert_eq!(dec.read_long_array()?, vec![4]);
    assert_eq!(dec.read_float_array()?, vec![5.0]);
    assert_eq!(dec.read_double_array()?, vec![6.0]);
    assert_eq!(dec.read_string_array()?, vec![Some("s".to_owned())]);
    dec.finish()?;
    Ok(())
}
