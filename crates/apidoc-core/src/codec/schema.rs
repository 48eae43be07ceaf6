//! Declarative node schemas.
//!
//! A node type lists its attributes, child elements and text content once in
//! [`Node::describe`]. The resulting [`Schema`] is built on first use, cached
//! per type for the life of the process, and shared by the decoder, the
//! encoder and anything else that needs to walk a node generically.

use super::decode::Decoder;
use super::encode::Encoder;
use super::scalar::Scalar;
use crate::message::{MessageKey, SyntaxError};
use crate::position::{Range, Span};
use crate::token::StartElement;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::LazyLock;

/// A scalar value and where it was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Spanned<V> {
    pub value: V,
    #[serde(skip)]
    pub span: Span,
}

impl<V> Spanned<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            span: Span::default(),
        }
    }

    pub fn at(value: V, range: Range) -> Self {
        Self {
            value,
            span: Span(range),
        }
    }

    pub fn range(&self) -> Range {
        self.span.0
    }
}

/// How a declared field takes part in decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Missing after the element closes is a decode error.
    Required,
    Optional,
    /// Written by the encoder, never read back from input.
    OutputOnly,
}

/// A decodable, encodable document node.
pub trait Node: Default + Send + Sync + 'static {
    fn describe(schema: &mut SchemaBuilder<Self>);

    /// Range of the whole element, start tag through end tag.
    fn span(&self) -> Span;

    fn set_span(&mut self, span: Span);

    fn schema() -> &'static Schema<Self> {
        Schema::get()
    }
}

/// Implements [`Node::span`] and [`Node::set_span`] over a `span` field.
#[macro_export]
macro_rules! node_span {
    () => {
        fn span(&self) -> $crate::position::Span {
            self.span
        }

        fn set_span(&mut self, span: $crate::position::Span) {
            self.span = span;
        }
    };
}

// -- Field accessors ----------------------------------------------------------

pub(crate) trait ScalarSlot<T>: Send + Sync {
    fn set(&self, node: &mut T, raw: &str, range: Range) -> Result<(), MessageKey>;
    fn is_set(&self, node: &T) -> bool;
    fn is_zero(&self, node: &T) -> bool;
    fn clear(&self, node: &mut T);
    fn format(&self, node: &T) -> Option<String>;
}

pub(crate) trait ElemSlot<T>: Send + Sync {
    fn decode(&self, node: &mut T, dec: &mut Decoder<'_>, start: StartElement) -> Result<(), SyntaxError>;
    fn is_set(&self, node: &T) -> bool;
    fn encode(&self, node: &T, name: &str, enc: &mut Encoder);
}

struct ScalarField<T, V> {
    get: fn(&T) -> &Option<Spanned<V>>,
    get_mut: fn(&mut T) -> &mut Option<Spanned<V>>,
}

impl<T: 'static, V: Scalar> ScalarSlot<T> for ScalarField<T, V> {
    fn set(&self, node: &mut T, raw: &str, range: Range) -> Result<(), MessageKey> {
        let value = V::parse(raw)?;
        *(self.get_mut)(node) = Some(Spanned::at(value, range));
        Ok(())
    }

    fn is_set(&self, node: &T) -> bool {
        (self.get)(node).is_some()
    }

    fn is_zero(&self, node: &T) -> bool {
        (self.get)(node).as_ref().map_or(true, |v| v.value.is_zero())
    }

    fn clear(&self, node: &mut T) {
        *(self.get_mut)(node) = None;
    }

    fn format(&self, node: &T) -> Option<String> {
        (self.get)(node).as_ref().map(|v| v.value.format())
    }
}

struct OneElem<T, N> {
    get: fn(&T) -> &Option<N>,
    get_mut: fn(&mut T) -> &mut Option<N>,
}

impl<T: 'static, N: Node> ElemSlot<T> for OneElem<T, N> {
    fn decode(&self, node: &mut T, dec: &mut Decoder<'_>, start: StartElement) -> Result<(), SyntaxError> {
        if (self.get)(node).is_some() {
            return Err(dec
                .error(start.name.range, MessageKey::DuplicateElement)
                .with_field(start.name.local));
        }
        let child = dec.decode_node::<N>(start)?;
        *(self.get_mut)(node) = Some(child);
        Ok(())
    }

    fn is_set(&self, node: &T) -> bool {
        (self.get)(node).is_some()
    }

    fn encode(&self, node: &T, name: &str, enc: &mut Encoder) {
        if let Some(child) = (self.get)(node) {
            enc.element(name, child);
        }
    }
}

struct ManyElem<T, N> {
    get: fn(&T) -> &Vec<N>,
    get_mut: fn(&mut T) -> &mut Vec<N>,
}

impl<T: 'static, N: Node> ElemSlot<T> for ManyElem<T, N> {
    fn decode(&self, node: &mut T, dec: &mut Decoder<'_>, start: StartElement) -> Result<(), SyntaxError> {
        let child = dec.decode_node::<N>(start)?;
        (self.get_mut)(node).push(child);
        Ok(())
    }

    fn is_set(&self, node: &T) -> bool {
        !(self.get)(node).is_empty()
    }

    fn encode(&self, node: &T, name: &str, enc: &mut Encoder) {
        for child in (self.get)(node) {
            enc.element(name, child);
        }
    }
}

// -- Schema -------------------------------------------------------------------

pub(crate) enum FieldKind<T> {
    Attr(Box<dyn ScalarSlot<T>>),
    /// Element text. `cdata` content is kept verbatim and written as a CDATA
    /// section; otherwise it is trimmed and escaped.
    Content { cdata: bool, slot: Box<dyn ScalarSlot<T>> },
    Elem(Box<dyn ElemSlot<T>>),
}

pub struct Field<T> {
    pub name: &'static str,
    pub usage: Usage,
    pub(crate) kind: FieldKind<T>,
}

impl<T> Field<T> {
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FieldKind::Attr(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, FieldKind::Elem(_))
    }

    pub fn is_content(&self) -> bool {
        matches!(self.kind, FieldKind::Content { .. })
    }

    /// True when the node holds a value for this field.
    pub fn is_set(&self, node: &T) -> bool {
        match &self.kind {
            FieldKind::Attr(slot) | FieldKind::Content { slot, .. } => slot.is_set(node),
            FieldKind::Elem(slot) => slot.is_set(node),
        }
    }
}

/// The declared shape of node type `T`.
pub struct Schema<T> {
    root: Option<&'static str>,
    fields: Vec<Field<T>>,
}

type Registry = HashMap<TypeId, &'static (dyn Any + Send + Sync)>;

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(Default::default);

impl<T: Node> Schema<T> {
    /// The schema of `T`, built on first request.
    pub fn get() -> &'static Schema<T> {
        let id = TypeId::of::<T>();
        let cached = REGISTRY.read().get(&id).copied();
        let entry = match cached {
            Some(entry) => entry,
            None => {
                let mut builder = SchemaBuilder {
                    schema: Schema {
                        root: None,
                        fields: Vec::new(),
                    },
                };
                T::describe(&mut builder);
                let built: &'static Schema<T> = Box::leak(Box::new(builder.schema));
                // A racing thread may have registered first; the loser's copy
                // is leaked once and never handed out.
                *REGISTRY.write().entry(id).or_insert(built)
            }
        };
        entry
            .downcast_ref::<Schema<T>>()
            .expect("schema registry entries are keyed by their own type")
    }
}

impl<T> Schema<T> {
    /// Element name used when `T` stands at the top of a block.
    pub fn root(&self) -> Option<&'static str> {
        self.root
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.is_attribute() && f.name == name)
    }

    pub(crate) fn element(&self, name: &str) -> Option<(&Field<T>, &dyn ElemSlot<T>)> {
        self.fields.iter().find_map(|f| match &f.kind {
            FieldKind::Elem(slot) if f.name == name => Some((f, slot.as_ref())),
            _ => None,
        })
    }

    pub(crate) fn content(&self) -> Option<(&Field<T>, bool, &dyn ScalarSlot<T>)> {
        self.fields.iter().find_map(|f| match &f.kind {
            FieldKind::Content { cdata, slot } => Some((f, *cdata, slot.as_ref())),
            _ => None,
        })
    }
}

/// Collects a node's field declarations, in encoding order.
pub struct SchemaBuilder<T> {
    schema: Schema<T>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn root(&mut self, name: &'static str) -> &mut Self {
        self.schema.root = Some(name);
        self
    }

    pub fn attr<V: Scalar>(
        &mut self,
        name: &'static str,
        usage: Usage,
        get: fn(&T) -> &Option<Spanned<V>>,
        get_mut: fn(&mut T) -> &mut Option<Spanned<V>>,
    ) -> &mut Self {
        self.push(name, usage, FieldKind::Attr(Box::new(ScalarField { get, get_mut })))
    }

    /// Trimmed, escaped element text.
    pub fn content<V: Scalar>(
        &mut self,
        usage: Usage,
        get: fn(&T) -> &Option<Spanned<V>>,
        get_mut: fn(&mut T) -> &mut Option<Spanned<V>>,
    ) -> &mut Self {
        let slot = Box::new(ScalarField { get, get_mut });
        self.push("#text", usage, FieldKind::Content { cdata: false, slot })
    }

    /// Verbatim element text, written back as CDATA.
    pub fn cdata<V: Scalar>(
        &mut self,
        usage: Usage,
        get: fn(&T) -> &Option<Spanned<V>>,
        get_mut: fn(&mut T) -> &mut Option<Spanned<V>>,
    ) -> &mut Self {
        let slot = Box::new(ScalarField { get, get_mut });
        self.push("#cdata", usage, FieldKind::Content { cdata: true, slot })
    }

    /// A child element that may appear at most once.
    pub fn elem<N: Node>(
        &mut self,
        name: &'static str,
        usage: Usage,
        get: fn(&T) -> &Option<N>,
        get_mut: fn(&mut T) -> &mut Option<N>,
    ) -> &mut Self {
        self.push(name, usage, FieldKind::Elem(Box::new(OneElem { get, get_mut })))
    }

    /// A repeatable child element.
    pub fn elems<N: Node>(
        &mut self,
        name: &'static str,
        usage: Usage,
        get: fn(&T) -> &Vec<N>,
        get_mut: fn(&mut T) -> &mut Vec<N>,
    ) -> &mut Self {
        self.push(name, usage, FieldKind::Elem(Box::new(ManyElem { get, get_mut })))
    }

    fn push(&mut self, name: &'static str, usage: Usage, kind: FieldKind<T>) -> &mut Self {
        self.schema.fields.push(Field { name, usage, kind });
        self
    }
}
