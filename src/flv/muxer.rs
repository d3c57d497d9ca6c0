//! FLV byte-stream packaging.
//!
//! Layout written by this module:
//!
//! ```text
//! 'F' 'L' 'V' 0x01 flags 00 00 00 09 | 00 00 00 00
//! tag: type u8 | size u24 | ts u24 | ts_ext u8 | stream_id u24 (0) | data | prev_tag_size u32
//! ```

use std::collections::HashMap;
use std::io::Write;
use byteorder::{BigEndian, WriteBytesExt};
use crate::amf::{write_ecma_array, write_string, Amf0Value};
use crate::flv::tag::{FlvHeader, FlvTagType, FLV_HEADER_SIZE, MAX_TAG_DATA_SIZE, TAG_HEADER_SIZE};
use crate::{Error, Result};

/// Script data name carried by the metadata tag
pub const ON_METADATA: &str = "onMetaData";

/// Write the 9-byte FLV header followed by the zero PreviousTagSize0.
///
/// Returns the number of bytes written (always 13).
pub fn write_flv_header<W: Write>(w: &mut W, has_video: bool, has_audio: bool) -> Result<usize> {
    let header = FlvHeader { has_video, has_audio };
    w.write_all(b"FLV")?;
    w.write_u8(0x01)?;
    w.write_u8(header.flags())?;
    w.write_u32::<BigEndian>(FLV_HEADER_SIZE as u32)?;
    w.write_u32::<BigEndian>(0)?;
    Ok(FLV_HEADER_SIZE + 4)
}

/// Write one tag (header, payload, trailing PreviousTagSize).
///
/// Timestamps above 24 bits spill into the extension byte.
pub fn write_tag<W: Write>(
    w: &mut W,
    tag_type: FlvTagType,
    timestamp_ms: u32,
    payload: &[u8],
) -> Result<usize> {
    if payload.len() > MAX_TAG_DATA_SIZE {
        return Err(Error::encoding(format!(
            "FLV tag payload too large: {} bytes",
            payload.len()
        )));
    }
    let data_size = payload.len() as u32;

    w.write_u8(tag_type.as_u8())?;
    w.write_u24::<BigEndian>(data_size)?;
    w.write_u24::<BigEndian>(timestamp_ms & 0x00FF_FFFF)?;
    w.write_u8((timestamp_ms >> 24) as u8)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_all(payload)?;
    w.write_u32::<BigEndian>(data_size + TAG_HEADER_SIZE as u32)?;

    Ok(TAG_HEADER_SIZE + payload.len() + 4)
}

/// Encode the `onMetaData` script tag body
pub fn script_payload(metadata: &HashMap<String, Amf0Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    write_string(&mut buf, ON_METADATA)?;
    write_ecma_array(&mut buf, metadata)?;
    Ok(buf)
}

/// Write the metadata script tag at timestamp 0
pub fn write_metadata_tag<W: Write>(w: &mut W, metadata: &HashMap<String, Amf0Value>) -> Result<usize> {
    let payload = script_payload(metadata)?;
    write_tag(w, FlvTagType::Script, 0, &payload)
}
