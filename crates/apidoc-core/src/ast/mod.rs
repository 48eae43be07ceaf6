//! Document model.
//!
//! Every node declares its markup vocabulary in [`Node::describe`]; the codec
//! does the rest. Top-level nodes (APIs, tags, servers, document-wide
//! responses) also remember the file they were decoded from, which is not
//! part of the markup.

mod assemble;
pub mod output;
pub mod sanitize;

pub use assemble::MetadataPolicy;
pub use output::OutputOptions;
pub use sanitize::sanitize;

use crate::codec::{Method, Node, RichtextType, Scalar, SchemaBuilder, Spanned, Status, Type, Usage, Version};
use crate::position::Span;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::PathBuf;

/// Schema version stamped on every sanitized document.
pub const VERSION: &str = "1.0.0";

/// Text of an optional string field, empty when absent.
pub fn text_of(v: &Option<Spanned<String>>) -> &str {
    v.as_ref().map_or("", |s| s.value.as_str())
}

fn flag(v: &Option<Spanned<bool>>) -> bool {
    v.as_ref().is_some_and(|s| s.value)
}

/// Root of a documentation set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub apidoc: Option<Spanned<String>>,
    pub lang: Option<Spanned<String>>,
    pub logo: Option<Spanned<String>>,
    pub created: Option<Spanned<DateTime<FixedOffset>>>,
    pub version: Option<Spanned<Version>>,
    pub title: Option<Element>,
    pub description: Option<Richtext>,
    pub contact: Option<Contact>,
    pub license: Option<Link>,
    pub tags: Vec<Tag>,
    pub servers: Vec<Server>,
    pub mimetypes: Vec<Element>,
    pub responses: Vec<Request>,
    pub apis: Vec<Api>,
    /// File the document metadata came from.
    #[serde(skip)]
    pub file: PathBuf,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Document {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.root("apidoc")
            .attr("apidoc", Usage::OutputOnly, |n| &n.apidoc, |n| &mut n.apidoc)
            .attr("lang", Usage::Optional, |n| &n.lang, |n| &mut n.lang)
            .attr("logo", Usage::Optional, |n| &n.logo, |n| &mut n.logo)
            .attr("created", Usage::OutputOnly, |n| &n.created, |n| &mut n.created)
            .attr("version", Usage::Required, |n| &n.version, |n| &mut n.version)
            .elem("title", Usage::Required, |n| &n.title, |n| &mut n.title)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description)
            .elem("contact", Usage::Optional, |n| &n.contact, |n| &mut n.contact)
            .elem("license", Usage::Optional, |n| &n.license, |n| &mut n.license)
            .elems("tag", Usage::Optional, |n| &n.tags, |n| &mut n.tags)
            .elems("server", Usage::Optional, |n| &n.servers, |n| &mut n.servers)
            .elems("mimetype", Usage::Required, |n| &n.mimetypes, |n| &mut n.mimetypes)
            .elems("response", Usage::Optional, |n| &n.responses, |n| &mut n.responses)
            .elems("api", Usage::Optional, |n| &n.apis, |n| &mut n.apis);
    }

    crate::node_span!();
}

impl Document {
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| text_of(&t.name) == name)
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| text_of(&s.name) == name)
    }
}

/// One endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Api {
    pub version: Option<Spanned<Version>>,
    pub method: Option<Spanned<Method>>,
    pub id: Option<Spanned<String>>,
    pub summary: Option<Spanned<String>>,
    pub deprecated: Option<Spanned<Version>>,
    pub description: Option<Richtext>,
    pub headers: Vec<Param>,
    /// Tag references, by name.
    pub tags: Vec<Element>,
    pub path: Option<Path>,
    pub requests: Vec<Request>,
    pub responses: Vec<Request>,
    pub callback: Option<Callback>,
    /// Server references, by name.
    pub servers: Vec<Element>,
    #[serde(skip)]
    pub file: PathBuf,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Api {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.root("api")
            .attr("version", Usage::Optional, |n| &n.version, |n| &mut n.version)
            .attr("method", Usage::Required, |n| &n.method, |n| &mut n.method)
            .attr("id", Usage::Optional, |n| &n.id, |n| &mut n.id)
            .attr("summary", Usage::Required, |n| &n.summary, |n| &mut n.summary)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description)
            .elems("header", Usage::Optional, |n| &n.headers, |n| &mut n.headers)
            .elems("tag", Usage::Optional, |n| &n.tags, |n| &mut n.tags)
            .elem("path", Usage::Required, |n| &n.path, |n| &mut n.path)
            .elems("request", Usage::Optional, |n| &n.requests, |n| &mut n.requests)
            .elems("response", Usage::Optional, |n| &n.responses, |n| &mut n.responses)
            .elem("callback", Usage::Optional, |n| &n.callback, |n| &mut n.callback)
            .elems("server", Usage::Optional, |n| &n.servers, |n| &mut n.servers);
    }

    crate::node_span!();
}

impl Api {
    /// Path template, empty when the API has no path.
    pub fn path_template(&self) -> &str {
        self.path.as_ref().map_or("", |p| text_of(&p.path))
    }

    pub fn method_name(&self) -> &'static str {
        self.method.as_ref().map_or("", |m| m.value.as_str())
    }
}

/// URL template plus its path and query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    pub path: Option<Spanned<String>>,
    pub params: Vec<Param>,
    pub queries: Vec<Param>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Path {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("path", Usage::Required, |n| &n.path, |n| &mut n.path)
            .elems("param", Usage::Optional, |n| &n.params, |n| &mut n.params)
            .elems("query", Usage::Optional, |n| &n.queries, |n| &mut n.queries);
    }

    crate::node_span!();
}

/// XML serialization hints shared by params and request bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Xml {
    pub attr: Option<Spanned<bool>>,
    pub extract: Option<Spanned<bool>>,
    pub cdata: Option<Spanned<bool>>,
    pub ns: Option<Spanned<String>>,
    pub ns_prefix: Option<Spanned<String>>,
    pub wrapped: Option<Spanned<String>>,
}

trait HasXml {
    fn xml(&self) -> &Xml;
    fn xml_mut(&mut self) -> &mut Xml;
}

fn describe_xml<T: HasXml + 'static>(s: &mut SchemaBuilder<T>) {
    s.attr("xml-attr", Usage::Optional, |n| &n.xml().attr, |n| &mut n.xml_mut().attr)
        .attr("xml-extract", Usage::Optional, |n| &n.xml().extract, |n| &mut n.xml_mut().extract)
        .attr("xml-cdata", Usage::Optional, |n| &n.xml().cdata, |n| &mut n.xml_mut().cdata)
        .attr("xml-ns", Usage::Optional, |n| &n.xml().ns, |n| &mut n.xml_mut().ns)
        .attr("xml-ns-prefix", Usage::Optional, |n| &n.xml().ns_prefix, |n| &mut n.xml_mut().ns_prefix)
        .attr("xml-wrapped", Usage::Optional, |n| &n.xml().wrapped, |n| &mut n.xml_mut().wrapped);
}

/// A named, typed value: header, path or query parameter, or body field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Param {
    #[serde(flatten)]
    pub xml: Xml,
    pub name: Option<Spanned<String>>,
    #[serde(rename = "type")]
    pub ty: Option<Spanned<Type>>,
    pub deprecated: Option<Spanned<Version>>,
    pub default: Option<Spanned<String>>,
    pub optional: Option<Spanned<bool>>,
    pub array: Option<Spanned<bool>>,
    pub array_style: Option<Spanned<bool>>,
    pub summary: Option<Spanned<String>>,
    pub items: Vec<Param>,
    pub enums: Vec<Enum>,
    pub description: Option<Richtext>,
    #[serde(skip)]
    pub span: Span,
}

impl HasXml for Param {
    fn xml(&self) -> &Xml {
        &self.xml
    }

    fn xml_mut(&mut self) -> &mut Xml {
        &mut self.xml
    }
}

impl Node for Param {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("name", Usage::Required, |n| &n.name, |n| &mut n.name)
            .attr("type", Usage::Optional, |n| &n.ty, |n| &mut n.ty)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .attr("default", Usage::Optional, |n| &n.default, |n| &mut n.default)
            .attr("optional", Usage::Optional, |n| &n.optional, |n| &mut n.optional)
            .attr("array", Usage::Optional, |n| &n.array, |n| &mut n.array)
            .attr("array-style", Usage::Optional, |n| &n.array_style, |n| &mut n.array_style)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary);
        describe_xml(s);
        s.elems("param", Usage::Optional, |n| &n.items, |n| &mut n.items)
            .elems("enum", Usage::Optional, |n| &n.enums, |n| &mut n.enums)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description);
    }

    crate::node_span!();
}

impl Param {
    pub fn type_of(&self) -> Type {
        self.ty.as_ref().map_or(Type::None, |t| t.value)
    }

    pub fn is_array(&self) -> bool {
        flag(&self.array)
    }
}

/// Request or response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Request {
    #[serde(flatten)]
    pub xml: Xml,
    pub name: Option<Spanned<String>>,
    #[serde(rename = "type")]
    pub ty: Option<Spanned<Type>>,
    pub deprecated: Option<Spanned<Version>>,
    pub array: Option<Spanned<bool>>,
    pub summary: Option<Spanned<String>>,
    pub status: Option<Spanned<Status>>,
    pub mimetype: Option<Spanned<String>>,
    pub enums: Vec<Enum>,
    pub items: Vec<Param>,
    pub examples: Vec<Example>,
    pub headers: Vec<Param>,
    pub description: Option<Richtext>,
    /// Set for document-wide responses only.
    #[serde(skip)]
    pub file: PathBuf,
    #[serde(skip)]
    pub span: Span,
}

impl HasXml for Request {
    fn xml(&self) -> &Xml {
        &self.xml
    }

    fn xml_mut(&mut self) -> &mut Xml {
        &mut self.xml
    }
}

impl Node for Request {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("name", Usage::Optional, |n| &n.name, |n| &mut n.name)
            .attr("type", Usage::Optional, |n| &n.ty, |n| &mut n.ty)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .attr("array", Usage::Optional, |n| &n.array, |n| &mut n.array)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary)
            .attr("status", Usage::Optional, |n| &n.status, |n| &mut n.status)
            .attr("mimetype", Usage::Optional, |n| &n.mimetype, |n| &mut n.mimetype);
        describe_xml(s);
        s.elems("enum", Usage::Optional, |n| &n.enums, |n| &mut n.enums)
            .elems("param", Usage::Optional, |n| &n.items, |n| &mut n.items)
            .elems("example", Usage::Optional, |n| &n.examples, |n| &mut n.examples)
            .elems("header", Usage::Optional, |n| &n.headers, |n| &mut n.headers)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description);
    }

    crate::node_span!();
}

impl Request {
    pub fn type_of(&self) -> Type {
        self.ty.as_ref().map_or(Type::None, |t| t.value)
    }

    pub fn is_array(&self) -> bool {
        flag(&self.array)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enum {
    pub deprecated: Option<Spanned<Version>>,
    pub value: Option<Spanned<String>>,
    pub summary: Option<Spanned<String>>,
    pub description: Option<Richtext>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Enum {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .attr("value", Usage::Required, |n| &n.value, |n| &mut n.value)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description);
    }

    crate::node_span!();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tag {
    pub name: Option<Spanned<String>>,
    pub title: Option<Spanned<String>>,
    pub deprecated: Option<Spanned<Version>>,
    #[serde(skip)]
    pub file: PathBuf,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Tag {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("name", Usage::Required, |n| &n.name, |n| &mut n.name)
            .attr("title", Usage::Required, |n| &n.title, |n| &mut n.title)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated);
    }

    crate::node_span!();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    pub name: Option<Spanned<String>>,
    pub url: Option<Spanned<String>>,
    pub deprecated: Option<Spanned<Version>>,
    pub summary: Option<Spanned<String>>,
    pub description: Option<Richtext>,
    #[serde(skip)]
    pub file: PathBuf,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Server {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("name", Usage::Required, |n| &n.name, |n| &mut n.name)
            .attr("url", Usage::Required, |n| &n.url, |n| &mut n.url)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description);
    }

    crate::node_span!();
}

/// Sample body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Example {
    pub mimetype: Option<Spanned<String>>,
    pub summary: Option<Spanned<String>>,
    pub content: Option<Spanned<String>>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Example {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("mimetype", Usage::Required, |n| &n.mimetype, |n| &mut n.mimetype)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary)
            .cdata(Usage::Required, |n| &n.content, |n| &mut n.content);
    }

    crate::node_span!();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    pub name: Option<Spanned<String>>,
    pub url: Option<Element>,
    pub email: Option<Element>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Contact {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("name", Usage::Required, |n| &n.name, |n| &mut n.name)
            .elem("url", Usage::Optional, |n| &n.url, |n| &mut n.url)
            .elem("email", Usage::Optional, |n| &n.email, |n| &mut n.email);
    }

    crate::node_span!();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Link {
    pub text: Option<Spanned<String>>,
    pub url: Option<Spanned<String>>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Link {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("text", Usage::Required, |n| &n.text, |n| &mut n.text)
            .attr("url", Usage::Required, |n| &n.url, |n| &mut n.url);
    }

    crate::node_span!();
}

/// Formatted prose.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Richtext {
    #[serde(rename = "type")]
    pub ty: Option<Spanned<RichtextType>>,
    pub text: Option<Spanned<String>>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Richtext {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("type", Usage::Required, |n| &n.ty, |n| &mut n.ty)
            .cdata(Usage::Required, |n| &n.text, |n| &mut n.text);
    }

    crate::node_span!();
}

impl Richtext {
    pub fn is_empty(&self) -> bool {
        text_of(&self.text).trim().is_empty()
    }
}

/// Request the server makes back to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Callback {
    pub method: Option<Spanned<Method>>,
    pub summary: Option<Spanned<String>>,
    pub deprecated: Option<Spanned<Version>>,
    pub description: Option<Richtext>,
    pub requests: Vec<Request>,
    pub responses: Vec<Request>,
    #[serde(skip)]
    pub span: Span,
}

impl Node for Callback {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.attr("method", Usage::Required, |n| &n.method, |n| &mut n.method)
            .attr("summary", Usage::Optional, |n| &n.summary, |n| &mut n.summary)
            .attr("deprecated", Usage::Optional, |n| &n.deprecated, |n| &mut n.deprecated)
            .elem("description", Usage::Optional, |n| &n.description, |n| &mut n.description)
            .elems("request", Usage::Optional, |n| &n.requests, |n| &mut n.requests)
            .elems("response", Usage::Optional, |n| &n.responses, |n| &mut n.responses);
    }

    crate::node_span!();
}

/// An element holding only text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Element<V = String> {
    pub content: Option<Spanned<V>>,
    #[serde(skip)]
    pub span: Span,
}

impl<V> Default for Element<V> {
    fn default() -> Self {
        Self {
            content: None,
            span: Span::default(),
        }
    }
}

impl<V: Scalar> Node for Element<V> {
    fn describe(s: &mut SchemaBuilder<Self>) {
        s.content(Usage::Required, |n| &n.content, |n| &mut n.content);
    }

    crate::node_span!();
}

impl Element {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: Some(Spanned::new(text.into())),
            span: Span::default(),
        }
    }

    pub fn text(&self) -> &str {
        text_of(&self.content)
    }
}
