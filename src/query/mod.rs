pub mod buffer;
pub mod nearest;
