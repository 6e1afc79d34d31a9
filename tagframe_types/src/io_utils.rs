use crate::FrameError;
use anyhow::Result;
use std::io::{self, ErrorKind, Read};

/// Reads exactly `N` bytes. A short read is a truncated stream; any other I/O error passes through.
pub fn read_exact_arr<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(eof_as_truncated)?;
    Ok(buf)
}

/// Lengths come from the stream, so the buffer grows with the bytes that actually arrive.
const PREALLOC_CAP: usize = 64 * 1024;

pub fn read_exact_vec(r: &mut impl Read, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(PREALLOC_CAP));
    r.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(FrameError::Truncated.into());
    }
    Ok(buf)
}

/// Reads and drops `len` bytes.
pub fn discard(r: &mut impl Read, len: usize) -> Result<()> {
    let copied = io::copy(&mut r.take(len as u64), &mut io::sink())?;
    if copied < len as u64 {
        return Err(FrameError::Truncated.into());
    }
    Ok(())
}

pub fn eof_as_truncated(e: io::Error) -> anyhow::Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        FrameError::Truncated.into()
    } else {
        e.into()
    }
}
