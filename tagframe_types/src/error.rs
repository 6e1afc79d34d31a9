use crate::serde::TypeTag;
use thiserror::Error;

/// How a [`FrameError`] should be read by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorClass {
    /// The bytes do not form a valid stream. Fatal to the current decode.
    Malformed,
    /// The caller broke the encoder/decoder contract. A programming error.
    Misuse,
}

/// Errors raised by the codec itself.
///
/// They are returned inside [`anyhow::Error`]; use `downcast_ref::<FrameError>()` to inspect them.
/// I/O errors from the underlying sink or source are not wrapped and come through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /* Malformed stream. */
    #[error("unexpected end of stream")]
    Truncated,
    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),
    #[error("{0:?} is not an array element type")]
    InvalidElementType(TypeTag),
    #[error("invalid boolean byte {0}")]
    InvalidBoolean(u8),
    #[error("invalid char scalar value {0:#x}")]
    InvalidChar(u32),
    #[error("invalid UTF-8 in a string payload")]
    InvalidUtf8,
    #[error("invalid length prefix {0}")]
    InvalidLength(i64),
    #[error("length {len} exceeds the limit of {max}")]
    LengthLimit { len: usize, max: usize },
    #[error("nesting depth exceeds the limit of {0}")]
    DepthLimit(usize),
    #[error("field id {id} follows field id {prev}")]
    FieldOrder { prev: u32, id: u32 },
    #[error("trailing bytes after the top-level frame")]
    TrailingBytes,
    #[error("field id {field_id} is not described by class `{class}`")]
    UnexpectedField { class: String, field_id: u32 },
    #[error("malformed class descriptor: {0}")]
    BadDescriptor(String),

    /* Misuse. */
    #[error("field {field_id} is {found:?}, not {expected:?}")]
    TypeMismatch {
        field_id: u32,
        expected: TypeTag,
        found: TypeTag,
    },
    #[error("field {field_id} is {found:?}, not a number")]
    NotANumber { field_id: u32, found: TypeTag },
    #[error("the frame has no more fields")]
    FrameExhausted,
    #[error("no field is pending")]
    NoPendingField,
    #[error("a nested frame is still open")]
    ChildFrameOpen,
    #[error("the frame still has unread fields")]
    UnreadFields,
    #[error("an earlier write failed partway through a field")]
    SinkFailed,
    #[error("field id {0:#x} is reserved")]
    ReservedFieldId(u32),
    #[error("class `{class}` has no value for non-nullable field `{field}`")]
    MissingField { class: String, field: String },
    #[error("values of class `{class}` do not match its description: {detail}")]
    ShapeMismatch { class: String, detail: String },
    #[error("unknown class id {0}")]
    UnknownClass(u32),
}

impl FrameError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FrameError::Truncated
            | FrameError::UnknownTypeTag(_)
            | FrameError::InvalidElementType(_)
            | FrameError::InvalidBoolean(_)
            | FrameError::InvalidChar(_)
            | FrameError::InvalidUtf8
            | FrameError::InvalidLength(_)
            | FrameError::LengthLimit { .. }
            | FrameError::DepthLimit(_)
            | FrameError::FieldOrder { .. }
            | FrameError::TrailingBytes
            | FrameError::UnexpectedField { .. }
            | FrameError::BadDescriptor(_) => ErrorClass::Malformed,

            FrameError::TypeMismatch { .. }
            | FrameError::NotANumber { .. }
            | FrameError::FrameExhausted
            | FrameError::NoPendingField
            | FrameError::ChildFrameOpen
            | FrameError::UnreadFields
            | FrameError::SinkFailed
            | FrameError::ReservedFieldId(_)
            | FrameError::MissingField { .. }
            | FrameError::ShapeMismatch { .. }
            | FrameError::UnknownClass(_) => ErrorClass::Misuse,
        }
    }
}
