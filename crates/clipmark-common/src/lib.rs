pub mod clip;
pub mod protocol;

pub use clip::{Clip, SelectionInfo, base_url};
