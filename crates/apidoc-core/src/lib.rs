//! Extract API documentation written as markup inside source-code comments.
//!
//! The pipeline reads source files ([`input`]), finds their comment blocks
//! with per-language rules ([`lang`], [`extract`]), decodes the markup in
//! each block into a typed tree ([`token`], [`codec`], [`ast`]), and
//! validates the assembled [`ast::Document`] ([`ast::sanitize`]).
//! [`pipeline::parse`] ties the stages together.

pub mod ast;
pub mod codec;
pub mod extract;
pub mod input;
pub mod lang;
pub mod message;
pub mod pipeline;
pub mod position;
pub mod token;

pub use ast::{Document, MetadataPolicy, OutputOptions};
pub use input::{ConfigError, SourceInput};
pub use message::{Catalog, Collector, LocaleId, Reporter, SyntaxError};
pub use pipeline::{parse, ParseOptions};
pub use position::{Position, Range, Span};
