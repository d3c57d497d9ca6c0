use std::collections::HashMap;
use crate::amf::amf0::{markers, Amf0Value};
use crate::{ByteReader, Error, Result};

/// AMF0 reader over a byte slice.
pub struct Amf0Decoder<'a> {
    reader: ByteReader<'a>,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Amf0Decoder {
            reader: ByteReader::new(data),
        }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.reader.remaining() > 0
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn decode(&mut self) -> Result<Amf0Value> {
        let marker = self.reader.read_u8()?;
        match marker {
            markers::NUMBER => Ok(Amf0Value::Number(self.reader.read_f64_be()?)),
            markers::BOOLEAN => Ok(Amf0Value::Boolean(self.reader.read_u8()? != 0)),
            markers::STRING => Ok(Amf0Value::String(self.reader.read_utf8_u16()?)),
            markers::OBJECT => Ok(Amf0Value::Object(self.decode_properties()?)),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => {
                // Count is advisory; the end marker terminates the array
                let _count = self.reader.read_u32_be()?;
                Ok(Amf0Value::EcmaArray(self.decode_properties()?))
            }
            markers::STRICT_ARRAY => {
                let count = self.reader.read_u32_be()? as usize;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.decode()?);
                }
                Ok(Amf0Value::Array(items))
            }
            markers::DATE => {
                let timestamp = self.reader.read_f64_be()?;
                let timezone = self.reader.read_i16_be()?;
                Ok(Amf0Value::Date(timestamp, timezone))
            }
            markers::LONG_STRING => Ok(Amf0Value::LongString(self.reader.read_utf8_u32()?)),
            _ => Err(Error::amf_decode(format!("Unknown AMF0 marker: 0x{:02x}", marker))),
        }
    }

    /// Decode every value until the input is exhausted
    pub fn decode_all(&mut self) -> Result<Vec<Amf0Value>> {
        let mut values = Vec::new();
        while self.has_remaining() {
            values.push(self.decode()?);
        }
        Ok(values)
    }

    fn decode_properties(&mut self) -> Result<HashMap<String, Amf0Value>> {
        let mut object = HashMap::new();
        loop {
            let name = self.reader.read_utf8_u16()?;
            if name.is_empty() {
                let end = self.reader.read_u8()?;
                if end != markers::OBJECT_END {
                    return Err(Error::amf_decode(format!(
                        "Expected object end marker, got 0x{:02x}",
                        end
                    )));
                }
                break;
            }
            let value = self.decode()?;
            object.insert(name, value);
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::encoder::{write_ecma_array, write_string, write_value};

    #[test]
    fn test_decode_script_payload() {
        let mut obj = HashMap::new();
        obj.insert("hasVideo".to_string(), Amf0Value::Boolean(true));
        obj.insert("width".to_string(), Amf0Value::Number(1920.0));
        obj.insert("MetaDataCreator".to_string(), Amf0Value::String("hdl".into()));

        let mut buf = Vec::new();
        write_string(&mut buf, "onMetaData").unwrap();
        write_ecma_array(&mut buf, &obj).unwrap();

        let values = Amf0Decoder::new(&buf).decode_all().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_string(), Some("onMetaData"));
        assert_eq!(values[1], Amf0Value::EcmaArray(obj));
    }

    #[test]
    fn test_decode_nested_object_and_array() {
        let mut inner = HashMap::new();
        inner.insert("level".to_string(), Amf0Value::String("status".into()));
        let value = Amf0Value::Array(vec![
            Amf0Value::Object(inner),
            Amf0Value::Null,
            Amf0Value::Date(1.5e12, 0),
        ]);

        let mut buf = Vec::new();
        write_value(&mut buf, &value).unwrap();
        let mut decoder = Amf0Decoder::new(&buf);
        assert_eq!(decoder.decode().unwrap(), value);
        assert!(!decoder.has_remaining());
    }

    #[test]
    fn test_unknown_marker() {
        let data = [0x11];
        let err = Amf0Decoder::new(&data).decode().unwrap_err();
        assert!(matches!(err, Error::AmfDecode(_)));
    }

    #[test]
    fn test_truncated_input() {
        let data = [0x00, 0x40, 0x59];
        assert!(Amf0Decoder::new(&data).decode().is_err());
    }
}
