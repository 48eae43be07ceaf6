use apidoc_core::ast::text_of;
use apidoc_core::codec::{decode, encode};
use apidoc_core::message::{ErrorKind, MessageKey};
use apidoc_core::{parse, Collector, ConfigError, Document, MetadataPolicy, ParseOptions, Position, SourceInput};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DOC: &str = r#"package main

/*
 * <apidoc version="1.0.0">
 *   <title>Pets</title>
 *   <mimetype>application/json</mimetype>
 *   <tag name="pets" title="Pet store"/>
 *   <server name="prod" url="https://pets.example.com"/>
 * </apidoc>
 */
func main() {}
"#;

fn api(method: &str, path: &str) -> String {
    format!(
        r#"// <api method="{method}" summary="{method} {path}">
// <tag>pets</tag>
// <path path="{path}"/>
// <response status="200" type="string" summary="ok"/>
// </api>
func handler() {{}}
"#
    )
}

/// Three Go files declaring APIs out of order, plus the document block.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.go"), DOC).unwrap();
    fs::write(dir.path().join("a.go"), format!("{}\n{}", api("POST", "/pets"), api("GET", "/zoo"))).unwrap();
    fs::write(dir.path().join("b.go"), api("GET", "/pets")).unwrap();
    fs::write(dir.path().join("c.go"), format!("// just a comment\nvar _ = 0\n{}", api("DELETE", "/pets"))).unwrap();
    dir
}

fn run(dir: &Path, opts: &ParseOptions) -> (Document, Collector) {
    let collector = Collector::new();
    let doc = parse(&[SourceInput::new("go", dir)], opts, &collector).unwrap();
    (doc, collector)
}

#[test]
fn apis_come_out_sorted_by_path_then_method() {
    let dir = project();
    let (doc, errors) = run(dir.path(), &ParseOptions::default());
    assert!(errors.is_empty(), "{:?}", errors.errors());

    let order: Vec<_> = doc.apis.iter().map(|a| (a.path_template(), a.method_name())).collect();
    assert_eq!(
        order,
        [("/pets", "DELETE"), ("/pets", "GET"), ("/pets", "POST"), ("/zoo", "GET")]
    );
    assert_eq!(doc.title.as_ref().unwrap().text(), "Pets");
    assert!(doc.apis.iter().all(|a| a.file.starts_with(dir.path())));
}

#[test]
fn output_is_independent_of_scheduling() {
    let dir = project();
    let (reference, _) = run(dir.path(), &ParseOptions::default());

    for (extract_workers, decode_workers, queue_capacity) in [(1, 1, 1), (8, 1, 1), (1, 8, 2), (4, 4, 1)] {
        let opts = ParseOptions {
            extract_workers,
            decode_workers,
            queue_capacity,
            ..ParseOptions::default()
        };
        let (doc, errors) = run(dir.path(), &opts);
        assert!(errors.is_empty());
        assert_eq!(doc, reference);
        assert_eq!(encode(&doc), encode(&reference));
    }
}

/// Nine more `apidoc` fragments, each declaring a tag and a server. Two of
/// them declare the same tag.
fn fragments(dir: &Path) {
    for i in 0..9 {
        let dup = if i == 3 || i == 7 { r#"<tag name="dup" title="d"/>"# } else { "" };
        let text = format!(
            "/* <apidoc version=\"1.0.0\" lang=\"l{i}\"><title>Pets</title><mimetype>application/json</mimetype>\n\
             <tag name=\"z{i}\" title=\"z\"/>{dup}<server name=\"s{i}\" url=\"https://s{i}.example.com\"/></apidoc> */\n"
        );
        fs::write(dir.join(format!("m{i}.go")), text).unwrap();
    }
}

#[test]
fn metadata_merge_is_independent_of_scheduling() {
    let dir = project();
    fragments(dir.path());
    let base = ParseOptions {
        metadata: MetadataPolicy::KeepFirst,
        ..ParseOptions::default()
    };

    let (reference, errors) = run(dir.path(), &base);
    let errors = errors.into_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].file.ends_with("m7.go"));
    // m0.go sorts before every other file declaring metadata
    assert_eq!(reference.lang.as_ref().unwrap().value, "l0");
    assert!(reference.file.ends_with("m0.go"));
    let tags: Vec<_> = reference.tags.iter().map(|t| text_of(&t.name)).collect();
    assert_eq!(tags, ["z0", "z1", "z2", "z3", "dup", "z4", "z5", "z6", "z7", "z8", "pets"]);
    assert!(reference.tag("dup").unwrap().file.ends_with("m3.go"));

    for _ in 0..10 {
        for (extract_workers, decode_workers, queue_capacity) in [(8, 8, 1), (1, 8, 1), (8, 1, 4)] {
            let opts = ParseOptions {
                extract_workers,
                decode_workers,
                queue_capacity,
                ..base.clone()
            };
            let (doc, errors) = run(dir.path(), &opts);
            let errors = errors.into_errors();
            assert_eq!(doc, reference);
            assert_eq!(encode(&doc), encode(&reference));
            assert_eq!(errors.len(), 1);
            assert!(errors[0].file.ends_with("m7.go"));
        }
    }
}

#[test]
fn encoded_document_decodes_to_the_same_tree() {
    let dir = project();
    let (doc, _) = run(dir.path(), &ParseOptions::default());

    let text = encode(&doc);
    let mut again: Document = decode(Path::new("out.xml"), &text, Position::default(), true).unwrap();
    // The schema version stamp is output-only and never read back.
    assert!(again.apidoc.is_none());
    again.apidoc = doc.apidoc.clone();
    assert_eq!(encode(&again), text);
    assert_eq!(again.apis.len(), doc.apis.len());
    assert_eq!(again.title, doc.title);
}

#[test]
fn dangling_tag_is_reported_in_the_referencing_file() {
    let dir = project();
    let orphan = api("PUT", "/pets").replace("<tag>pets</tag>", "<tag>birds</tag>");
    fs::write(dir.path().join("d.go"), orphan).unwrap();

    let (_, errors) = run(dir.path(), &ParseOptions::default());
    let errors = errors.into_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Sanitize);
    assert_eq!(errors[0].key, MessageKey::NotFound);
    assert!(errors[0].file.ends_with("d.go"));
    // `birds` sits on the second line, right after `// <tag>`
    assert_eq!(errors[0].range.start.line, 1);
    assert_eq!(errors[0].range.start.character, 8);
}

#[test]
fn numeric_enum_error_points_into_the_source_file() {
    let dir = project();
    let source = r#"// <api method="GET" summary="by size">
// <path path="/size"/>
// <response status="200" type="number" summary="size">
//   <enum value="1" summary="small"/>
//   <enum value="x" summary="broken"/>
// </response>
// </api>
"#;
    fs::write(dir.path().join("e.go"), source).unwrap();

    let (_, errors) = run(dir.path(), &ParseOptions::default());
    let errors = errors.into_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].key, MessageKey::InvalidFormat);
    assert_eq!(errors[0].field.as_deref(), Some("enum"));
    assert_eq!(errors[0].range.start.line, 4);
    assert_eq!(errors[0].range.start.character, 5);
}

#[test]
fn decode_errors_skip_only_their_block() {
    let dir = project();
    fs::write(
        dir.path().join("f.go"),
        "// <api method=\"FETCH\" summary=\"x\"><path path=\"/f\"/></api>\nvar x = 1\n",
    )
    .unwrap();

    let (doc, errors) = run(dir.path(), &ParseOptions::default());
    let errors = errors.into_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Decode);
    assert_eq!(errors[0].key, MessageKey::InvalidValue);
    assert_eq!(errors[0].field.as_deref(), Some("method"));
    assert_eq!(doc.apis.len(), 4);
}

#[test]
fn unterminated_block_drops_the_rest_of_the_file() {
    let dir = project();
    let source = format!("{}\n/* <api method=\"GET\" summary=\"lost\">\n", api("PATCH", "/pets"));
    fs::write(dir.path().join("g.go"), source).unwrap();

    let (doc, errors) = run(dir.path(), &ParseOptions::default());
    assert!(errors.is_empty());
    assert_eq!(doc.apis.len(), 5);
    assert!(doc.apis.iter().all(|a| a.summary.as_ref().unwrap().value != "lost"));
}

#[test]
fn malformed_bytes_keep_earlier_blocks() {
    let dir = project();
    let mut bytes = api("HEAD", "/pets").into_bytes();
    bytes.extend_from_slice(b"// \xff\xfe\n");
    fs::write(dir.path().join("h.go"), bytes).unwrap();

    let (doc, errors) = run(dir.path(), &ParseOptions::default());
    let errors = errors.into_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Extract);
    assert_eq!(errors[0].key, MessageKey::InvalidEncoding);
    assert!(doc.apis.iter().any(|a| a.method_name() == "HEAD"));
}

#[test]
fn strict_mode_rejects_unknown_attributes() {
    let dir = project();
    fs::write(
        dir.path().join("i.go"),
        "// <api method=\"GET\" summary=\"s\" colour=\"red\"><path path=\"/i\"/></api>\n",
    )
    .unwrap();

    let (lenient, errors) = run(dir.path(), &ParseOptions::default());
    assert!(errors.is_empty());
    assert_eq!(lenient.apis.len(), 5);

    let strict = ParseOptions {
        strict: true,
        ..ParseOptions::default()
    };
    let (doc, errors) = run(dir.path(), &strict);
    assert_eq!(errors.into_errors()[0].key, MessageKey::UnknownAttribute);
    assert_eq!(doc.apis.len(), 4);
}

#[test]
fn missing_root_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let result = parse(
        &[SourceInput::new("go", dir.path().join("nope"))],
        &ParseOptions::default(),
        &Collector::new(),
    );
    assert!(matches!(result, Err(ConfigError::PathNotFound(_))));
}
