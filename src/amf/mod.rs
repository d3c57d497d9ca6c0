mod amf0;
mod decoder;
pub mod encoder;

pub use amf0::*;
pub use decoder::Amf0Decoder;
pub use encoder::{write_ecma_array, write_object_end_marker, write_object_name, write_string, write_value};
