use anyhow::{bail, Result};

/// Wire serialization with the exact byte layout peers expect.
///
/// Multi-byte integers are little-endian and variable-length counts use the
/// standard varint prefix. Structures that cross the network implement this
/// instead of a storage codec.
pub trait ConsensusCodec: Sized {
    fn consensus_encode(&self) -> Vec<u8>;
    fn consensus_decode(buf: &[u8]) -> Result<Self>;
}

pub fn put_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_i32_le(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_i64_le(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Writes a varint count: one byte below 0xfd, otherwise a marker byte
/// followed by the little-endian value in the smallest encoding that fits.
pub fn put_var_int(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Cursor over an input buffer for decoding.
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            bail!(
                "unexpected end of input: need {} bytes, have {}",
                len,
                self.remaining()
            );
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into()?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        Ok(self.take(N)?.try_into()?)
    }

    pub fn read_var_int(&mut self) -> Result<u64> {
        let marker = self.read_u8()?;
        Ok(match marker {
            0xfd => u64::from(self.read_u16_le()?),
            0xfe => u64::from(self.read_u32_le()?),
            0xff => self.read_u64_le()?,
            n => u64::from(n),
        })
    }

    /// Fails if any input is left unconsumed.
    pub fn finish(self) -> Result<()> {
        if self.remaining() != 0 {
            bail!("{} trailing bytes after decode", self.remaining());
        }
        Ok(())
    }
}
