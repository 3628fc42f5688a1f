//! # Bit-Field Extraction
//!
//! Fixed-offset reads over an uplink payload. Frames are dispatched on their exact
//! length before any field is read, so an out-of-range read indicates a frame table
//! mistake rather than bad input; it is still reported as an error, never a panic.

use crate::error::DecodeError;

/// Extract a big-endian unsigned integer of `size` bytes starting at `offset`.
pub fn read_be_uint(data: &[u8], offset: usize, size: usize) -> Result<u64, DecodeError> {
    if size > 8 || offset + size > data.len() {
        return Err(DecodeError::Truncated {
            offset,
            size,
            actual: data.len(),
        });
    }

    let mut value = 0u64;
    for byte in &data[offset..offset + size] {
        value = (value << 8) | *byte as u64;
    }
    Ok(value)
}

/// Extract `width` bits of `value`, starting at bit `shift` (bit 0 = LSB).
pub fn bits(value: u64, shift: u32, width: u32) -> u64 {
    (value >> shift) & mask(width)
}

/// All-ones mask of `width` bits.
pub const fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Cursor-free reader over a payload with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct FrameReader<'a> {
    data: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(read_be_uint(self.data, offset, 1)? as u8)
    }

    pub fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(read_be_uint(self.data, offset, 2)? as u16)
    }

    pub fn u24(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(read_be_uint(self.data, offset, 3)? as u32)
    }

    pub fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(read_be_uint(self.data, offset, 4)? as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be_uint() {
        let data = [0x2F, 0xA3, 0x02, 0x06];
        assert_eq!(read_be_uint(&data, 0, 2).unwrap(), 0x2FA3);
        assert_eq!(read_be_uint(&data, 1, 3).unwrap(), 0xA30206);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x01, 0x02];
        assert!(matches!(
            read_be_uint(&data, 1, 2),
            Err(DecodeError::Truncated { offset: 1, size: 2, actual: 2 })
        ));
    }

    #[test]
    fn test_bits() {
        assert_eq!(bits(0x2FA3, 0, 14), 0x2FA3);
        assert_eq!(bits(0xC001, 14, 2), 3);
        assert_eq!(mask(12), 0xFFF);
        assert_eq!(mask(64), u64::MAX);
    }

    #[test]
    fn test_frame_reader() {
        let reader = FrameReader::new(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(reader.u8(3).unwrap(), 0x78);
        assert_eq!(reader.u16(1).unwrap(), 0x3456);
        assert_eq!(reader.u24(0).unwrap(), 0x123456);
        assert_eq!(reader.u32(0).unwrap(), 0x12345678);
        assert!(reader.u32(1).is_err());
    }
}
