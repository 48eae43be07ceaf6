//! Markup codec: node schemas, scalar converters, decoder and encoder.

mod decode;
mod encode;
mod scalar;
mod schema;

pub use decode::Decoder;
pub use encode::{encode, encode_pretty, Encoder};
pub use scalar::{parse_bool, Method, RichtextType, Scalar, Status, Type, Version};
pub use schema::{Field, Node, Schema, SchemaBuilder, Spanned, Usage};

use crate::message::SyntaxError;
use crate::position::Position;
use std::path::Path;

/// Decode a complete markup text as `N`, positions starting at `start`.
pub fn decode<N: Node>(file: &Path, text: &str, start: Position, strict: bool) -> Result<N, SyntaxError> {
    Decoder::new(file, text, start, strict).decode_root()
}
