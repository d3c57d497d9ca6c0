mod tag;
mod muxer;
mod metadata;
mod reader;

pub use tag::*;
pub use muxer::*;
pub use metadata::*;
pub use reader::*;
