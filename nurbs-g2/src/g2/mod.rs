//! The G2 interchange format: canonical spline descriptors and their text
//! serialization.
pub mod spline;
pub use spline::*;
pub mod writer;
pub use writer::*;
