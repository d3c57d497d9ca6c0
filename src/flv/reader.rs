use bytes::{Buf, BytesMut};
use crate::flv::tag::{FlvHeader, FlvTag, FlvTagType, FLV_HEADER_SIZE, TAG_HEADER_SIZE};
use crate::{ByteReader, Error, Result};

/// Incremental FLV demuxer fed with arbitrary byte chunks.
pub struct FlvTagReader {
    buffer: BytesMut,
    header: Option<FlvHeader>,
}

impl FlvTagReader {
    pub fn new() -> Self {
        FlvTagReader {
            buffer: BytesMut::with_capacity(64 * 1024),
            header: None,
        }
    }

    /// Append received bytes
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// FLV header, once it has been read
    pub fn header(&self) -> Option<FlvHeader> {
        self.header
    }

    /// Bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pop the next complete tag, or `None` if more input is needed
    pub fn next_tag(&mut self) -> Result<Option<FlvTag>> {
        if self.header.is_none() && !self.read_header()? {
            return Ok(None);
        }

        if self.buffer.len() < TAG_HEADER_SIZE {
            return Ok(None);
        }

        let mut reader = ByteReader::new(&self.buffer[..TAG_HEADER_SIZE]);
        let tag_type = FlvTagType::from_u8(reader.read_u8()?)?;
        let data_size = reader.read_u24_be()? as usize;
        let timestamp_low = reader.read_u24_be()?;
        let timestamp_ext = reader.read_u8()? as u32;
        let timestamp = (timestamp_ext << 24) | timestamp_low;

        let total = TAG_HEADER_SIZE + data_size + 4;
        if self.buffer.len() < total {
            return Ok(None);
        }

        self.buffer.advance(TAG_HEADER_SIZE);
        let data = self.buffer.split_to(data_size).freeze();
        self.buffer.advance(4);

        Ok(Some(FlvTag {
            tag_type,
            timestamp,
            data,
        }))
    }

    fn read_header(&mut self) -> Result<bool> {
        if self.buffer.len() < FLV_HEADER_SIZE {
            return Ok(false);
        }

        let mut reader = ByteReader::new(&self.buffer[..FLV_HEADER_SIZE]);
        if reader.read_slice(3)? != b"FLV" {
            return Err(Error::stream("Missing FLV signature"));
        }
        let _version = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let data_offset = reader.read_u32_be()? as usize;
        if data_offset < FLV_HEADER_SIZE {
            return Err(Error::stream(format!("Invalid FLV data offset: {}", data_offset)));
        }

        // Header, any extension bytes, then PreviousTagSize0
        let skip = data_offset + 4;
        if self.buffer.len() < skip {
            return Ok(false);
        }
        self.buffer.advance(skip);
        self.header = Some(FlvHeader::from_flags(flags));
        Ok(true)
    }
}

impl Default for FlvTagReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flv::muxer::{write_flv_header, write_tag};

    fn sample_stream() -> Vec<u8> {
        let mut buf = Vec::new();
        write_flv_header(&mut buf, true, true).unwrap();
        write_tag(&mut buf, FlvTagType::Video, 0, &[0x17, 0x00, 0x01]).unwrap();
        write_tag(&mut buf, FlvTagType::Audio, 23, &[0xAF, 0x01, 0x21]).unwrap();
        write_tag(&mut buf, FlvTagType::Video, 0x0100_0000, &[0x27, 0x01]).unwrap();
        buf
    }

    #[test]
    fn test_reads_whole_stream() {
        let mut reader = FlvTagReader::new();
        reader.push(&sample_stream());

        let first = reader.next_tag().unwrap().unwrap();
        assert_eq!(reader.header(), Some(FlvHeader { has_video: true, has_audio: true }));
        assert_eq!(first.tag_type, FlvTagType::Video);
        assert_eq!(&first.data[..], &[0x17, 0x00, 0x01]);

        let second = reader.next_tag().unwrap().unwrap();
        assert_eq!(second.tag_type, FlvTagType::Audio);
        assert_eq!(second.timestamp, 23);

        let third = reader.next_tag().unwrap().unwrap();
        assert_eq!(third.timestamp, 0x0100_0000);

        assert!(reader.next_tag().unwrap().is_none());
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_reads_byte_by_byte() {
        let stream = sample_stream();
        let mut reader = FlvTagReader::new();
        let mut tags = Vec::new();
        for byte in stream {
            reader.push(&[byte]);
            while let Some(tag) = reader.next_tag().unwrap() {
                tags.push(tag);
            }
        }
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[1].timestamp, 23);
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut reader = FlvTagReader::new();
        reader.push(b"MP4\x01\x05\x00\x00\x00\x09\x00\x00\x00\x00");
        assert!(reader.next_tag().is_err());
    }
}
