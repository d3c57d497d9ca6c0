use std::io::{Cursor, Error as IoError, ErrorKind, Result as IoResult};
use byteorder::{BigEndian, ReadBytesExt};

/// Big-endian read cursor over a borrowed byte slice.
pub struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, cursor: 0 }
    }

    /// Get current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Get remaining bytes from current position
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    /// Check if reader has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    fn take(&mut self, len: usize) -> IoResult<&'a [u8]> {
        if !self.has_remaining(len) {
            return Err(IoError::new(ErrorKind::UnexpectedEof, "Not enough bytes"));
        }
        let slice = &self.data[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    /// Read a borrowed run of bytes
    pub fn read_slice(&mut self, len: usize) -> IoResult<&'a [u8]> {
        self.take(len)
    }

    pub fn skip(&mut self, len: usize) -> IoResult<()> {
        self.take(len).map(|_| ())
    }

    /// Read the next byte without consuming it
    pub fn peek_u8(&self) -> IoResult<u8> {
        self.data
            .get(self.cursor)
            .copied()
            .ok_or_else(|| IoError::new(ErrorKind::UnexpectedEof, "Not enough bytes"))
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> IoResult<u16> {
        Cursor::new(self.take(2)?).read_u16::<BigEndian>()
    }

    pub fn read_i16_be(&mut self) -> IoResult<i16> {
        Cursor::new(self.take(2)?).read_i16::<BigEndian>()
    }

    pub fn read_u24_be(&mut self) -> IoResult<u32> {
        Cursor::new(self.take(3)?).read_u24::<BigEndian>()
    }

    pub fn read_u32_be(&mut self) -> IoResult<u32> {
        Cursor::new(self.take(4)?).read_u32::<BigEndian>()
    }

    pub fn read_f64_be(&mut self) -> IoResult<f64> {
        Cursor::new(self.take(8)?).read_f64::<BigEndian>()
    }

    /// Read a u16-length-prefixed UTF-8 string (AMF0 short string body)
    pub fn read_utf8_u16(&mut self) -> IoResult<String> {
        let len = self.read_u16_be()? as usize;
        self.read_utf8(len)
    }

    /// Read a u32-length-prefixed UTF-8 string (AMF0 long string body)
    pub fn read_utf8_u32(&mut self) -> IoResult<String> {
        let len = self.read_u32_be()? as usize;
        self.read_utf8(len)
    }

    fn read_utf8(&mut self, len: usize) -> IoResult<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| IoError::new(ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let data = [0x42, 0x12, 0x34, 0x00, 0x01, 0x02, 0xDE, 0xAD, 0xBE, 0xEF];
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
        assert_eq!(reader.read_u24_be().unwrap(), 0x000102);
        assert_eq!(reader.read_u32_be().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let data = [7, 8];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.peek_u8().unwrap(), 7);
        assert_eq!(reader.position(), 0);
        reader.skip(2).unwrap();
        assert!(reader.peek_u8().is_err());
    }

    #[test]
    fn test_boundary_checks() {
        let data = [1, 2];
        let mut reader = ByteReader::new(&data);

        assert!(reader.read_u16_be().is_ok());
        assert!(reader.read_u32_be().is_err());
    }

    #[test]
    fn test_read_utf8_u16() {
        let data = [0x00, 0x03, b'c', b'a', b'm'];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_utf8_u16().unwrap(), "cam");
    }
}
