mod audio;
mod video;
mod track;

pub use audio::*;
pub use video::*;
pub use track::*;
