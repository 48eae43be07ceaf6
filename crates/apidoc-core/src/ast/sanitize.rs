//! Post-assembly validation and canonicalization.
//!
//! Runs once, single-threaded, after every block has been decoded. Each node
//! stops at its first problem; problems in different nodes are all reported.

use super::{text_of, Api, Callback, Document, Enum, Param, Path, Request, Xml, VERSION};
use crate::codec::{parse_bool, Spanned, Type};
use crate::message::{MessageKey, SyntaxError};
use crate::position::Range;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path as FsPath;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap());

type Check = Result<(), SyntaxError>;

/// Sort, stamp and validate `doc`, returning every problem found.
pub fn sanitize(doc: &mut Document) -> Vec<SyntaxError> {
    doc.apis.sort_by(|a, b| {
        a.path_template()
            .cmp(b.path_template())
            .then_with(|| a.method_name().cmp(b.method_name()))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.span.range().start.offset.cmp(&b.span.range().start.offset))
    });
    doc.apidoc = Some(Spanned::new(VERSION.to_string()));

    let mut errors = Vec::new();
    duplicate_declarations(doc, &mut errors);
    for response in &doc.responses {
        walk_request(response, &response.file, &mut errors);
    }
    for api in &doc.apis {
        references(doc, api, &mut errors);
        walk_api(api, &mut errors);
    }
    errors
}

fn err(file: &FsPath, range: Range, key: MessageKey, field: &str) -> SyntaxError {
    SyntaxError::sanitize(file, range, key).with_field(field)
}

fn range_of<V>(v: &Option<Spanned<V>>, fallback: Range) -> Range {
    v.as_ref().map_or(fallback, |s| s.range())
}

fn record(errors: &mut Vec<SyntaxError>, check: Check) {
    if let Err(e) = check {
        errors.push(e);
    }
}

// -- Document scope -----------------------------------------------------------

fn duplicate_declarations(doc: &Document, errors: &mut Vec<SyntaxError>) {
    let mut seen = HashSet::new();
    for tag in &doc.tags {
        if !seen.insert(text_of(&tag.name)) {
            errors.push(err(&tag.file, range_of(&tag.name, tag.span.range()), MessageKey::DuplicateValue, "tag"));
        }
    }
    let mut seen = HashSet::new();
    for server in &doc.servers {
        if !seen.insert(text_of(&server.name)) {
            errors.push(err(
                &server.file,
                range_of(&server.name, server.span.range()),
                MessageKey::DuplicateValue,
                "server",
            ));
        }
    }
}

/// Every tag and server an API names must be declared.
fn references(doc: &Document, api: &Api, errors: &mut Vec<SyntaxError>) {
    for tag in &api.tags {
        if doc.tag(tag.text()).is_none() {
            errors.push(err(&api.file, range_of(&tag.content, tag.span.range()), MessageKey::NotFound, "tag"));
        }
    }
    for server in &api.servers {
        if doc.server(server.text()).is_none() {
            errors.push(err(
                &api.file,
                range_of(&server.content, server.span.range()),
                MessageKey::NotFound,
                "server",
            ));
        }
    }
}

// -- Walkers ------------------------------------------------------------------

fn walk_api(api: &Api, errors: &mut Vec<SyntaxError>) {
    let file = api.file.as_path();
    record(errors, check_api(api));
    for header in &api.headers {
        walk_param(header, file, errors);
    }
    if let Some(path) = &api.path {
        record(errors, check_path(path, file));
        for p in path.params.iter().chain(&path.queries) {
            walk_param(p, file, errors);
        }
    }
    for r in api.requests.iter().chain(&api.responses) {
        walk_request(r, file, errors);
    }
    if let Some(cb) = &api.callback {
        walk_callback(cb, file, errors);
    }
}

fn walk_callback(cb: &Callback, file: &FsPath, errors: &mut Vec<SyntaxError>) {
    for r in cb.requests.iter().chain(&cb.responses) {
        walk_request(r, file, errors);
    }
}

fn walk_request(r: &Request, file: &FsPath, errors: &mut Vec<SyntaxError>) {
    record(errors, check_request(r, file));
    for e in &r.enums {
        record(errors, check_enum(e, file));
    }
    for p in r.items.iter().chain(&r.headers) {
        walk_param(p, file, errors);
    }
}

fn walk_param(p: &Param, file: &FsPath, errors: &mut Vec<SyntaxError>) {
    record(errors, check_param(p, file));
    for e in &p.enums {
        record(errors, check_enum(e, file));
    }
    for item in &p.items {
        walk_param(item, file, errors);
    }
}

// -- Node checks --------------------------------------------------------------

fn check_api(api: &Api) -> Check {
    for header in &api.headers {
        if header.type_of() == Type::Object {
            let range = range_of(&header.ty, header.span.range());
            return Err(err(&api.file, range, MessageKey::InvalidValue, "header"));
        }
    }
    Ok(())
}

/// Names of the `{name}` segments in a path template.
///
/// `None` when braces are unbalanced or nested.
pub fn path_params(template: &str) -> Option<HashSet<&str>> {
    let mut params = HashSet::new();
    let mut start = None;
    for (i, c) in template.char_indices() {
        match c {
            '{' if start.is_some() => return None,
            '{' => start = Some(i + 1),
            '}' => {
                params.insert(&template[start?..i]);
                start = None;
            }
            _ => {}
        }
    }
    start.is_none().then_some(params)
}

fn check_path(path: &Path, file: &FsPath) -> Check {
    let whole = path.span.range();
    let Some(names) = path_params(text_of(&path.path)) else {
        return Err(err(file, range_of(&path.path, whole), MessageKey::InvalidFormat, "path"));
    };
    if names.len() != path.params.len() {
        return Err(err(file, whole, MessageKey::PathNotMatchParams, "path"));
    }
    for p in &path.params {
        if !names.contains(text_of(&p.name)) {
            return Err(err(file, p.span.range(), MessageKey::PathNotMatchParams, "path"));
        }
    }
    for p in path.params.iter().chain(&path.queries) {
        if p.type_of() == Type::Object {
            return Err(err(file, p.span.range(), MessageKey::InvalidValue, "type"));
        }
    }
    Ok(())
}

fn check_request(r: &Request, file: &FsPath) -> Check {
    let whole = r.span.range();
    if r.type_of() == Type::Object && r.items.is_empty() {
        return Err(err(file, whole, MessageKey::Required, "param"));
    }
    if let Some(dup) = duplicate(&r.enums, |e| text_of(&e.value)) {
        return Err(err(file, dup.span.range(), MessageKey::DuplicateValue, "enum"));
    }
    check_enum_types(r.type_of(), range_of(&r.ty, whole), &r.enums, file)?;
    check_xml(r.is_array(), !r.items.is_empty(), &r.xml, whole, file)?;

    if let Some(mimetype) = &r.mimetype {
        if r.examples.iter().any(|ex| text_of(&ex.mimetype) != mimetype.value) {
            return Err(err(file, mimetype.range(), MessageKey::InvalidValue, "mimetype"));
        }
    }
    for header in &r.headers {
        if header.type_of() == Type::Object {
            return Err(err(file, range_of(&header.ty, header.span.range()), MessageKey::InvalidValue, "type"));
        }
    }
    if let Some(dup) = duplicate(&r.items, |p| text_of(&p.name)) {
        return Err(err(file, dup.span.range(), MessageKey::DuplicateValue, "param"));
    }
    Ok(())
}

fn check_param(p: &Param, file: &FsPath) -> Check {
    let whole = p.span.range();
    if p.type_of() == Type::None {
        return Err(err(file, whole, MessageKey::Required, "type"));
    }
    if p.type_of() == Type::Object && p.items.is_empty() {
        return Err(err(file, whole, MessageKey::Required, "param"));
    }
    if let Some(dup) = duplicate(&p.enums, |e| text_of(&e.value)) {
        return Err(err(file, dup.span.range(), MessageKey::DuplicateValue, "enum"));
    }
    check_enum_types(p.type_of(), range_of(&p.ty, whole), &p.enums, file)?;
    if let Some(dup) = duplicate(&p.items, |i| text_of(&i.name)) {
        return Err(err(file, dup.span.range(), MessageKey::DuplicateValue, "param"));
    }
    check_xml(p.is_array(), !p.items.is_empty(), &p.xml, whole, file)?;

    let described = p.description.as_ref().is_some_and(|d| !d.is_empty());
    if text_of(&p.summary).is_empty() && !described {
        return Err(err(file, whole, MessageKey::Required, "summary"));
    }
    Ok(())
}

fn check_enum(e: &Enum, file: &FsPath) -> Check {
    let described = e.description.as_ref().is_some_and(|d| !d.is_empty());
    if text_of(&e.summary).is_empty() && !described {
        return Err(err(file, e.span.range(), MessageKey::Required, "summary"));
    }
    Ok(())
}

/// Later of the first pair of nodes sharing a key.
///
/// Stable sort by key, then an adjacent scan: for equal keys the sort keeps
/// source order, so the second of a pair is the later declaration.
fn duplicate<T>(nodes: &[T], key: impl Fn(&T) -> &str) -> Option<&T> {
    let mut sorted: Vec<&T> = nodes.iter().collect();
    sorted.sort_by(|a, b| key(a).cmp(key(b)));
    sorted.windows(2).find(|w| key(w[0]) == key(w[1])).map(|w| w[1])
}

/// Enum values must be valid for the declared type.
fn check_enum_types(ty: Type, type_range: Range, enums: &[Enum], file: &FsPath) -> Check {
    if enums.is_empty() {
        return Ok(());
    }
    match ty {
        Type::Number => {
            if let Some(e) = enums.iter().find(|e| !NUMBER.is_match(text_of(&e.value))) {
                return Err(err(file, e.span.range(), MessageKey::InvalidFormat, "enum"));
            }
        }
        Type::Bool => {
            if let Some(e) = enums.iter().find(|e| parse_bool(text_of(&e.value)).is_none()) {
                return Err(err(file, e.span.range(), MessageKey::InvalidFormat, "enum"));
            }
        }
        Type::Object | Type::None => {
            return Err(err(file, type_range, MessageKey::InvalidValue, "type"));
        }
        Type::String => {}
    }
    Ok(())
}

fn check_xml(is_array: bool, has_items: bool, xml: &Xml, whole: Range, file: &FsPath) -> Check {
    let set = |v: &Option<Spanned<String>>| !text_of(v).is_empty();
    let on = |v: &Option<Spanned<bool>>| v.as_ref().is_some_and(|s| s.value);
    let invalid = |field: &str, range: Range| Err(err(file, range, MessageKey::InvalidValue, field));

    if on(&xml.attr) {
        if is_array || has_items {
            return invalid("xml-attr", range_of(&xml.attr, whole));
        }
        if set(&xml.wrapped) {
            return invalid("xml-wrapped", range_of(&xml.wrapped, whole));
        }
        if on(&xml.extract) {
            return invalid("xml-extract", range_of(&xml.extract, whole));
        }
        if set(&xml.ns) {
            return invalid("xml-ns", range_of(&xml.ns, whole));
        }
        if set(&xml.ns_prefix) {
            return invalid("xml-ns-prefix", range_of(&xml.ns_prefix, whole));
        }
    }
    if set(&xml.wrapped) && !is_array {
        return invalid("xml-wrapped", range_of(&xml.wrapped, whole));
    }
    if on(&xml.extract) {
        if set(&xml.ns) {
            return invalid("xml-ns", range_of(&xml.ns, whole));
        }
        if set(&xml.ns_prefix) {
            return invalid("xml-ns-prefix", range_of(&xml.ns_prefix, whole));
        }
    }
    if set(&xml.ns) && !set(&xml.ns_prefix) {
        return invalid("xml-ns-prefix", range_of(&xml.ns_prefix, whole));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::position::Position;

    fn api(text: &str) -> Api {
        let mut api: Api = decode(FsPath::new("api.rs"), text, Position::default(), false).unwrap();
        api.file = "api.rs".into();
        api
    }

    fn doc_with(apis: Vec<Api>) -> Document {
        let mut doc: Document = decode(
            FsPath::new("doc.rs"),
            r#"<apidoc version="1.0.0"><title>t</title><mimetype>json</mimetype>
                 <tag name="users" title="Users"/><server name="main" url="https://x"/></apidoc>"#,
            Position::default(),
            false,
        )
        .unwrap();
        doc.apis = apis;
        doc
    }

    fn wrap(body: &str) -> String {
        format!(r#"<api method="GET" summary="s"><path path="/"/>{body}</api>"#)
    }

    #[test]
    fn sorts_by_path_then_method_and_stamps_version() {
        let mut doc = doc_with(vec![
            api(r#"<api method="POST" summary="s"><path path="/b"/></api>"#),
            api(r#"<api method="GET" summary="s"><path path="/b"/></api>"#),
            api(r#"<api method="DELETE" summary="s"><path path="/a"/></api>"#),
        ]);
        assert!(sanitize(&mut doc).is_empty());
        let order: Vec<_> = doc.apis.iter().map(|a| (a.path_template(), a.method_name())).collect();
        assert_eq!(order, [("/a", "DELETE"), ("/b", "GET"), ("/b", "POST")]);
        assert_eq!(text_of(&doc.apidoc), VERSION);
    }

    #[test]
    fn dangling_references() {
        let mut doc = doc_with(vec![api(&wrap("<tag>users</tag><tag>nobody</tag><server>main</server>"))]);
        let errs = sanitize(&mut doc);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].key, MessageKey::NotFound);
        assert_eq!(errs[0].field.as_deref(), Some("tag"));

        doc.tags.push(crate::ast::Tag {
            name: Some(Spanned::new("nobody".into())),
            ..Default::default()
        });
        assert!(sanitize(&mut doc).is_empty());
    }

    #[test]
    fn numeric_enum_reports_the_offending_value() {
        let body = r#"<request type="number">
<enum value="1" summary="one"/>
<enum value="2" summary="two"/>
<enum value="x" summary="ex"/>
</request>"#;
        let mut doc = doc_with(vec![api(&wrap(body))]);
        let errs = sanitize(&mut doc);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].key, MessageKey::InvalidFormat);
        assert_eq!(errs[0].range.start.line, 3);
        assert_eq!(errs[0].range.start.character, 0);
    }

    #[test]
    fn duplicate_enum_reports_the_later_one() {
        let body = r#"<request type="string">
<enum value="a" summary="1"/>
<enum value="b" summary="2"/>
<enum value="a" summary="3"/>
</request>"#;
        let mut doc = doc_with(vec![api(&wrap(body))]);
        let errs = sanitize(&mut doc);
        assert_eq!(errs[0].key, MessageKey::DuplicateValue);
        assert_eq!(errs[0].range.start.line, 3);
    }

    #[test]
    fn object_needs_items_and_enums_need_a_scalar_type() {
        let mut doc = doc_with(vec![api(&wrap(r#"<request type="object"/>"#))]);
        assert_eq!(sanitize(&mut doc)[0].field.as_deref(), Some("param"));

        let body = r#"<request><enum value="a" summary="1"/></request>"#;
        let mut doc = doc_with(vec![api(&wrap(body))]);
        let errs = sanitize(&mut doc);
        assert_eq!(errs[0].key, MessageKey::InvalidValue);
        assert_eq!(errs[0].field.as_deref(), Some("type"));
    }

    #[test]
    fn path_template_must_match_params() {
        let ok = r#"<api method="GET" summary="s"><path path="/u/{id}">
            <param name="id" type="number" summary="id"/></path></api>"#;
        assert!(sanitize(&mut doc_with(vec![api(ok)])).is_empty());

        let missing = r#"<api method="GET" summary="s"><path path="/u/{id}"/></api>"#;
        let errs = sanitize(&mut doc_with(vec![api(missing)]));
        assert_eq!(errs[0].key, MessageKey::PathNotMatchParams);

        let broken = r#"<api method="GET" summary="s"><path path="/u/{id"/></api>"#;
        let errs = sanitize(&mut doc_with(vec![api(broken)]));
        assert_eq!(errs[0].key, MessageKey::InvalidFormat);
    }

    #[test]
    fn problems_in_different_nodes_accumulate() {
        let body = r#"<header name="h" type="object"/>
            <request type="object"/>
            <response type="bool"><enum value="maybe" summary="?"/></response>"#;
        let mut doc = doc_with(vec![api(&wrap(body))]);
        let errs = sanitize(&mut doc);
        let keys: Vec<_> = errs.iter().map(|e| e.field.as_deref().unwrap_or("")).collect();
        assert_eq!(keys, ["header", "param", "param", "enum"]);
    }

    #[test]
    fn xml_hints_must_be_consistent() {
        let body = r#"<request type="string" xml-wrapped="list"/>"#;
        let errs = sanitize(&mut doc_with(vec![api(&wrap(body))]));
        assert_eq!(errs[0].field.as_deref(), Some("xml-wrapped"));

        let body = r#"<request type="string" xml-ns="urn:x"/>"#;
        let errs = sanitize(&mut doc_with(vec![api(&wrap(body))]));
        assert_eq!(errs[0].field.as_deref(), Some("xml-ns-prefix"));
    }

    #[test]
    fn path_param_parsing() {
        let names = path_params("/a/{x}/b/{y}").unwrap();
        assert!(names.contains("x") && names.contains("y"));
        assert!(path_params("/a/{x").is_none());
        assert!(path_params("/a/x}").is_none());
        assert!(path_params("/a/{{x}}").is_none());
    }
}
