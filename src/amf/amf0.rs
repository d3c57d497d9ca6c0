use std::collections::HashMap;

/// AMF0 data types
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),                                    // 0x00
    Boolean(bool),                                  // 0x01
    String(String),                                 // 0x02
    Object(HashMap<String, Amf0Value>),             // 0x03
    Null,                                           // 0x05
    Undefined,                                      // 0x06
    EcmaArray(HashMap<String, Amf0Value>),          // 0x08 (onMetaData)
    Array(Vec<Amf0Value>),                          // 0x0A (strict array)
    Date(f64, i16),                                 // 0x0B
    LongString(String),                             // 0x0C
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
}

impl Amf0Value {
    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract object or ECMA array properties
    pub fn as_object(&self) -> Option<&HashMap<String, Amf0Value>> {
        match self {
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get property from object
    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }
}

impl From<f64> for Amf0Value {
    fn from(value: f64) -> Self {
        Amf0Value::Number(value)
    }
}

impl From<u32> for Amf0Value {
    fn from(value: u32) -> Self {
        Amf0Value::Number(value as f64)
    }
}

impl From<u8> for Amf0Value {
    fn from(value: u8) -> Self {
        Amf0Value::Number(value as f64)
    }
}

impl From<bool> for Amf0Value {
    fn from(value: bool) -> Self {
        Amf0Value::Boolean(value)
    }
}

impl From<&str> for Amf0Value {
    fn from(value: &str) -> Self {
        Amf0Value::String(value.to_string())
    }
}

impl From<String> for Amf0Value {
    fn from(value: String) -> Self {
        Amf0Value::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Amf0Value::from(3u32).as_number(), Some(3.0));
        assert_eq!(Amf0Value::from("m").as_string(), Some("m"));
        assert_eq!(Amf0Value::from(true).as_boolean(), Some(true));
        assert!(Amf0Value::Undefined.is_null());
        assert!(Amf0Value::Number(1.0).as_string().is_none());
    }

    #[test]
    fn test_get_property() {
        let mut map = HashMap::new();
        map.insert("width".to_string(), Amf0Value::Number(1280.0));
        let value = Amf0Value::EcmaArray(map);
        assert_eq!(value.get_property("width").and_then(|v| v.as_number()), Some(1280.0));
        assert!(value.get_property("height").is_none());
    }
}
