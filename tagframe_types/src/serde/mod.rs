//! # Serialization format
//!
//! A stream is one top-level [`Frame`](#frame). A frame is a sequence of fields,
//! each of which is a field id, a [`TypeTag`], and a payload whose shape
//! depends only on the tag. Readers therefore never need the original data
//! shape in order to walk or skip a stream.
//!
//! All multi-byte integers and floats are little-endian.
//!
//! Fixed-size payloads (`Boolean` and the numeric tags) carry no length.
//! `String` carries an `i32` length, where `-1` stands for a null string.
//! `Array` carries its element tag and element count; fixed-size elements are
//! packed with no per-element tag, and string elements are each length-prefixed.
//! `Object` nests another frame.
//!
//! Every frame, including the top-level one, ends with the reserved field id
//! [`FieldId::FRAME_END`].
//!
//! ```text
//! struct Frame {
//!     fields:     Field*,
//!     frame_end:  u32,            // 0xFFFF_FFFF
//! }
//!
//! struct Field::Null {
//!     field_id:   u32,
//!     type_tag:   u8,
//! }
//!
//! struct Field::Long {
//!     field_id:   u32,
//!     type_tag:   u8,
//!     payload:    [u8; 8],
//! }
//!
//! struct Field::String {
//!     field_id:   u32,
//!     type_tag:   u8,
//!     str_len:    i32,            // -1 for null
//!     utf8:       [u8; str_len],
//! }
//!
//! struct Field::Array {
//!     field_id:   u32,
//!     type_tag:   u8,
//!     elem_tag:   u8,
//!     elem_count: u32,
//!     elems:      {
//!         // Fixed-size elem_tag:
//!         packed:     [[u8; width]; elem_count],
//!         // String elem_tag:
//!         strings:    [{ str_len: i32, utf8: [u8; str_len] }; elem_count],
//!     }
//! }
//!
//! struct Field::Object {
//!     field_id:   u32,
//!     type_tag:   u8,
//!     frame:      Frame,          // recursively
//! }
//! ```

mod lengths;
mod type_tag;
mod value;

pub use lengths::*;
pub use type_tag::*;
pub use value::*;
