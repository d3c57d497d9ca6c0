mod reader;
mod error;
mod time;

pub use reader::*;
pub use error::*;
pub use time::*;
