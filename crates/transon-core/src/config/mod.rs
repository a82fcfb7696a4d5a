//! Transformation options

pub mod consts;
mod model;

pub use model::{OptionsFile, TransformOptions};
