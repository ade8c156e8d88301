pub mod common;
pub mod image;
pub mod job;

pub use common::*;
pub use image::*;
pub use job::*;
