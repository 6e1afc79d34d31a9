use anyhow::{anyhow, Context, Result};
use std::env::{self, VarError};

pub const ENV_VAR_BUFFER_CAPACITY: &str = "TAGFRAME_BUFFER_CAPACITY";
pub const ENV_VAR_MAX_DEPTH: &str = "TAGFRAME_MAX_DEPTH";
pub const ENV_VAR_MAX_LEN: &str = "TAGFRAME_MAX_LEN";

pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;
pub const DEFAULT_MAX_DEPTH: usize = 256;
pub const DEFAULT_MAX_LEN: usize = 64 * 1024 * 1024;

/// Limits and buffer sizing shared by encoders and decoders.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CodecConfig {
    /// Capacity of the buffer in front of the byte sink or source.
    pub buffer_capacity: usize,
    /// Deepest permitted nesting of object frames. The top-level frame is depth 0.
    pub max_depth: usize,
    /// Largest permitted string byte length or array element count.
    pub max_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl CodecConfig {
    /// Defaults, overridden by whichever env vars are set.
    pub fn from_env() -> Result<Self> {
        let dflt = Self::default();
        Ok(Self {
            buffer_capacity: env_usize(ENV_VAR_BUFFER_CAPACITY)?.unwrap_or(dflt.buffer_capacity),
            max_depth: env_usize(ENV_VAR_MAX_DEPTH)?.unwrap_or(dflt.max_depth),
            max_len: env_usize(ENV_VAR_MAX_LEN)?.unwrap_or(dflt.max_len),
        })
    }
}

/// `None` if the var is unset.
pub fn env_usize(name: &str) -> Result<Option<usize>> {
    match env::var(name) {
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow!(e)).with_context(|| format!("env var {name}")),
        Ok(s) => parse_usize(&s)
            .map(Some)
            .with_context(|| format!("env var {name}={s:?}")),
    }
}

fn parse_usize(s: &str) -> Result<usize> {
    let s = s.trim().replace('_', "");
    s.parse::<usize>().map_err(|e| anyhow!(e))
}
