//! Internal support structures shared by the `lzw` module.
pub mod bitio;
pub mod dlb;
