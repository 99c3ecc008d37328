//! NURBS geometry in the convention of the source archive.
//!
//! Curves and surfaces here store their knot vectors *without* the two
//! superfluous boundary knots and keep rational weights separate from the
//! Euclidean control vertex coordinates. The [`convert`](crate::convert)
//! module translates them into the G2 convention.
pub mod curve;
pub use curve::*;

pub mod knot;
pub use knot::KnotEnd;

pub mod surface;
pub use surface::*;
