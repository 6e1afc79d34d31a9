use crate::DumpStats;
use anyhow::Result;
use std::mem;
use tagframe_codec::{Decoder, FrameDecoder, SourceMut};
use tagframe_types::config::{self, CodecConfig};
use tagframe_types::serde::{ArrayValue, TypeTag, ARRAY_HEADER_LEN, FIELD_HEADER_LEN};
use tagframe_types::FrameError;


pub const ENV_VAR_DUMP_MAX_DEPTH: &str = "TAGFRAME_DUMP_MAX_DEPTH";

const FRAME_END_LEN: usize = mem::size_of::<u32>();
const STR_LEN_LEN: usize = mem::size_of::<i32>();

#[derive(Clone, Copy, Debug)]
pub struct DumpConfig {
    /// Objects nested deeper than this are skipped rather than walked.
    pub max_depth: usize,
    pub codec: CodecConfig,
}

impl Default for DumpConfig {
    fn default() -> Self {
        let codec = CodecConfig::default();
        Self {
            max_depth: codec.max_depth,
            codec,
        }
    }
}

impl DumpConfig {
    pub fn from_env() -> Result<Self> {
        let codec = CodecConfig::from_env()?;
        let max_depth = config::env_usize(ENV_VAR_DUMP_MAX_DEPTH)?.unwrap_or(codec.max_depth);
        Ok(Self { max_depth, codec })
    }
}

/// Walks the whole stream in `buf`, which must hold exactly one top-level frame.
pub fn dump(buf: &[u8], config: &DumpConfig) -> Result<DumpStats> {
    let mut stats = DumpStats::default();
    let mut dec = Decoder::with_config(buf, config.codec);
    walk_frame(&mut dec, 0, config, &mut stats)?;
    dec.finish()?;
    stats.total_bytes = buf.len();
    Ok(stats)
}

fn walk_frame<S: SourceMut>(
    dec: &mut FrameDecoder<S>,
    depth: usize,
    config: &DumpConfig,
    stats: &mut DumpStats,
) -> Result<()> {
    while dec.has_next_field()? {
        stats.overhead_bytes += FIELD_HEADER_LEN;
        let tag = dec.current_field_type().ok_or(FrameError::NoPendingField)?;
        match tag {
            TypeTag::Null => {
                dec.read_null()?;
                stats.nulls += 1;
            }
            TypeTag::Boolean => {
                dec.read_boolean()?;
                stats.booleans += 1;
                stats.fixed_bytes += mem::size_of::<u8>();
            }
            TypeTag::Char => {
                dec.read_char()?;
                stats.numbers += 1;
                stats.fixed_bytes += mem::size_of::<u32>();
            }
            TypeTag::Byte
            | TypeTag::Short
            | TypeTag::Int
            | TypeTag::Long
            | TypeTag::Float
            | TypeTag::Double => {
                let num = dec.read_number()?;
                stats.numbers += 1;
                stats.fixed_bytes += TypeTag::from(&num).payload_width().unwrap_or(0);
            }
            TypeTag::String => {
                let s = dec.read_string()?;
                stats.strings += 1;
                stats.overhead_bytes += STR_LEN_LEN;
                stats.string_bytes += s.map_or(0, |s| s.len());
            }
            TypeTag::Array => {
                let arr = dec.read_array()?;
                stats.arrays += 1;
                stats.array_elements += arr.len();
                stats.overhead_bytes += ARRAY_HEADER_LEN;
                match arr {
                    ArrayValue::String(elems) => {
                        for elem in elems.iter() {
                            stats.overhead_bytes += STR_LEN_LEN;
                            stats.string_bytes += elem.as_ref().map_or(0, |s| s.len());
                        }
                    }
                    arr => {
                        let width = arr.elem_type().payload_width().unwrap_or(0);
                        stats.fixed_bytes += width * arr.len();
                    }
                }
            }
            TypeTag::Object => {
                stats.objects += 1;
                if depth >= config.max_depth {
                    stats.skipped_bytes += dec.skip()?;
                } else {
                    let mut child = dec.start_object()?;
                    walk_frame(&mut child, depth + 1, config, stats)?;
                    child.finish()?;
                }
            }
        }
    }
    stats.overhead_bytes += FRAME_END_LEN;
    Ok(())
}

/// Renders the stream as nested `{id: value}` maps, without knowing its shape.
pub fn render_tree(buf: &[u8], config: &DumpConfig) -> Result<String> {
    let mut dec = Decoder::with_config(buf, config.codec);
    let obj = dec.read_all()?;
    dec.finish()?;
    Ok(obj.to_string())
}
