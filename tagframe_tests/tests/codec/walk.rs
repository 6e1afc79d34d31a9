use anyhow::Result;
use rand::Rng;
use tagframe_codec::{Decoder, Encoder, ObjectEncoding, Registry};
use tagframe_dump::{dump, DumpConfig};
use tagframe_tests::Sample;
use tagframe_types::serde::{GenericObject, Value};

fn count_fields(obj: &GenericObject) -> usize {
    obj.iter()
        .map(|(_, val)| match val {
            Value::Object(child) => 1 + count_fields(child),
            _ => 1,
        })
        .sum()
}

/// Whatever the shape, the walk classifies every field and accounts for every byte.
#[test]
fn schemaless_walk() -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut registry = Registry::new();
    for _ in 0..20 {
        let mut enc = Encoder::new(vec![]);
        for id in 0..rng.gen_range(1..4) {
            let depth = rng.gen_range(0..5);
            let encoding = match rng.gen_bool(0.5) {
                true => ObjectEncoding::Dense,
                false => ObjectEncoding::Sparse,
            };
            enc.write_object(&mut registry, id, &Sample::random(&mut rng, depth), encoding)?;
        }
        let buf = enc.finish()?;

        let stats = dump(&buf, &DumpConfig::default())?;
        stats.verify()?;
        assert_eq!(stats.other(), 0);
        assert_eq!(
            stats.string_bytes() + stats.fixed_bytes() + stats.overhead_bytes(),
            buf.len()
        );

        let mut dec = Decoder::new(&buf[..]);
        let obj = dec.read_all()?;
        assert_eq!(stats.fields(), count_fields(&obj));
    }
    Ok(())
}
