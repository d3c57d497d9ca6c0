//! AMF0 serialization into any [`std::io::Write`].
//!
//! Every function returns the number of bytes it wrote and stops at the first
//! write error. There is no partial-object recovery: a caller that sees an
//! error must treat everything written so far as garbage.

use std::collections::HashMap;
use std::io::Write;
use byteorder::{BigEndian, WriteBytesExt};
use crate::amf::amf0::{markers, Amf0Value};
use crate::{Error, Result};

/// Write a type marker byte
pub fn write_marker<W: Write>(w: &mut W, marker: u8) -> Result<usize> {
    w.write_u8(marker)?;
    Ok(1)
}

/// Write a string value, switching to the long-string form past 65535 bytes
pub fn write_string<W: Write>(w: &mut W, value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return write_long_string(w, value);
    }
    w.write_u8(markers::STRING)?;
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(3 + bytes.len())
}

fn write_long_string<W: Write>(w: &mut W, value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    if bytes.len() > u32::MAX as usize {
        return Err(Error::encoding("AMF0 long string exceeds 4 GiB"));
    }
    w.write_u8(markers::LONG_STRING)?;
    w.write_u32::<BigEndian>(bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(5 + bytes.len())
}

/// Write an object property name (u16 length + UTF-8, no marker)
pub fn write_object_name<W: Write>(w: &mut W, name: &str) -> Result<usize> {
    let bytes = name.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(Error::encoding(format!(
            "AMF0 property name too long: {} bytes",
            bytes.len()
        )));
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(2 + bytes.len())
}

/// Write the empty name + object-end marker that closes objects and ECMA arrays
pub fn write_object_end_marker<W: Write>(w: &mut W) -> Result<usize> {
    w.write_u16::<BigEndian>(0)?;
    w.write_u8(markers::OBJECT_END)?;
    Ok(3)
}

/// Write any value, dispatching on its kind
pub fn write_value<W: Write>(w: &mut W, value: &Amf0Value) -> Result<usize> {
    match value {
        Amf0Value::Number(n) => {
            w.write_u8(markers::NUMBER)?;
            w.write_f64::<BigEndian>(*n)?;
            Ok(9)
        }
        Amf0Value::Boolean(b) => {
            w.write_u8(markers::BOOLEAN)?;
            w.write_u8(u8::from(*b))?;
            Ok(2)
        }
        Amf0Value::String(s) => write_string(w, s),
        Amf0Value::LongString(s) => write_long_string(w, s),
        Amf0Value::Object(obj) => write_object(w, obj),
        Amf0Value::EcmaArray(obj) => write_ecma_array(w, obj),
        Amf0Value::Null => write_marker(w, markers::NULL),
        Amf0Value::Undefined => write_marker(w, markers::UNDEFINED),
        Amf0Value::Array(items) => {
            let mut n = write_marker(w, markers::STRICT_ARRAY)?;
            w.write_u32::<BigEndian>(items.len() as u32)?;
            n += 4;
            for item in items {
                n += write_value(w, item)?;
            }
            Ok(n)
        }
        Amf0Value::Date(timestamp, timezone) => {
            w.write_u8(markers::DATE)?;
            w.write_f64::<BigEndian>(*timestamp)?;
            w.write_i16::<BigEndian>(*timezone)?;
            Ok(11)
        }
    }
}

/// Write an anonymous object
pub fn write_object<W: Write>(w: &mut W, obj: &HashMap<String, Amf0Value>) -> Result<usize> {
    let mut n = write_marker(w, markers::OBJECT)?;
    n += write_properties(w, obj)?;
    Ok(n + write_object_end_marker(w)?)
}

/// Write an ECMA array: marker, u32 element count, properties, end marker.
///
/// Iteration order of `obj` is whatever the map yields; AMF0 readers must
/// not depend on it.
pub fn write_ecma_array<W: Write>(w: &mut W, obj: &HashMap<String, Amf0Value>) -> Result<usize> {
    let mut n = write_marker(w, markers::ECMA_ARRAY)?;
    let count = u32::try_from(obj.len())
        .map_err(|_| Error::encoding("ECMA array has too many elements"))?;
    w.write_u32::<BigEndian>(count)?;
    n += 4;
    n += write_properties(w, obj)?;
    Ok(n + write_object_end_marker(w)?)
}

fn write_properties<W: Write>(w: &mut W, obj: &HashMap<String, Amf0Value>) -> Result<usize> {
    let mut n = 0;
    for (name, value) in obj {
        n += write_object_name(w, name)?;
        n += write_value(w, value)?;
    }
    Ok(n)
}
