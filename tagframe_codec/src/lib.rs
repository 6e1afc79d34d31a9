//! Encoder and decoder for tagged-field frames.
//!
//! See [`tagframe_types::serde`] for the byte layout.
//!
//! - [`Encoder`] and [`Decoder`] read and write one top-level frame. Their
//!   `start_object` hands out an [`ObjectEncoder`] / [`ObjectDecoder`] for a
//!   nested frame, which borrows the parent until it is finished.
//! - [`ArrayElement`] is implemented by everything that may be an array element.
//! - [`Registry`] turns [`Record`] types into [`ClassInfo`] descriptors, and
//!   writes and reads those descriptors as ordinary frames.

mod array;
mod decoder;
mod encoder;
mod registry;

pub use array::*;
pub use decoder::*;
pub use encoder::*;
pub use registry::*;
