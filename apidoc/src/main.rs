//! apidoc: build API documentation from markup written in source comments.
//!
//! - `apidoc build src/` writes the assembled document to stdout (or `-o`).
//! - `apidoc check src/` only reports diagnostics, failing when there are any.
//! - `apidoc lang` lists the languages whose comments can be read.

mod logger;
mod render;
mod report;

use anyhow::{bail, Context, Result};
use apidoc_core::lang::{self, Language};
use apidoc_core::{parse, Catalog, Document, LocaleId, OutputOptions, ParseOptions, SourceInput};
use clap::{Args, Parser, Subcommand};
use report::ConsoleReporter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "apidoc",
    version,
    about = "Build API documentation from markup embedded in source-code comments"
)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the sources and write the document
    Build(BuildArgs),
    /// Parse the sources and report problems without writing anything
    Check(SourceArgs),
    /// List supported languages
    Lang,
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: xml (default), json
    #[arg(short = 'f', long, default_value = "xml")]
    format: String,

    /// Only write APIs carrying this tag. Can be given multiple times.
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,

    /// Override the document version
    #[arg(long)]
    doc_version: Option<String>,
}

#[derive(Args)]
struct SourceArgs {
    /// Files, directories or glob patterns to read.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Language id (see `apidoc lang`). Detected per path when omitted.
    #[arg(long)]
    lang: Option<String>,

    /// Descend into subdirectories
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Source encoding label, e.g. gbk or shift_jis
    #[arg(long)]
    encoding: Option<String>,

    /// Treat unknown attributes, elements and stray text as errors
    #[arg(long)]
    strict: bool,

    /// Diagnostic language: en, zh-Hans
    #[arg(long, default_value = "en")]
    locale: LocaleId,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build(args) => build(&args),
        Command::Check(args) => check(&args),
        Command::Lang => {
            list_languages();
            Ok(())
        }
    }
}

fn build(args: &BuildArgs) -> Result<()> {
    // Fail on bad output settings before spending time on the sources.
    let renderer = render::create_renderer(&args.format)?;
    let output_opts = OutputOptions {
        tags: args.tags.clone(),
        version: args.doc_version.clone(),
    };
    output_opts.validate()?;

    let (mut doc, errors) = run(&args.source)?;
    if errors > 0 {
        warn!(errors, "document has errors");
    }
    output_opts.apply(&mut doc)?;

    let output = renderer.render(&doc)?;
    match &args.output {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
            }
            fs::write(path, &output).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), apis = doc.apis.len(), "written");
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn check(args: &SourceArgs) -> Result<()> {
    let (doc, errors) = run(args)?;
    if errors > 0 {
        bail!("{} error(s) found", errors);
    }
    info!(apis = doc.apis.len(), "no errors");
    Ok(())
}

/// Run the pipeline, printing diagnostics as they arrive. Returns the
/// document with the number of diagnostics printed.
fn run(args: &SourceArgs) -> Result<(Document, usize)> {
    let inputs = args
        .paths
        .iter()
        .map(|path| source_input(args, path))
        .collect::<Result<Vec<_>>>()?;

    let opts = ParseOptions {
        strict: args.strict,
        ..ParseOptions::default()
    };
    let reporter = ConsoleReporter::new(Catalog::new(args.locale));
    let doc = parse(&inputs, &opts, &reporter).context("failed to read sources")?;
    Ok((doc, reporter.count()))
}

fn source_input(args: &SourceArgs, path: &Path) -> Result<SourceInput> {
    let lang = match &args.lang {
        Some(id) => id.clone(),
        None => detect_language(path, args.recursive)?.id.to_string(),
    };
    let mut input = SourceInput::new(lang, path).recursive(args.recursive);
    if let Some(label) = &args.encoding {
        input = input.with_encoding(label.as_str());
    }
    Ok(input)
}

fn detect_language(path: &Path, recursive: bool) -> Result<&'static Language> {
    let found = if path.is_dir() {
        lang::detect(path, recursive)
    } else {
        lang::by_path(path)
    };
    found.with_context(|| format!("cannot detect the language of {}; pass --lang", path.display()))
}

fn list_languages() {
    for lang in lang::languages() {
        println!("{:<12} {:<12} {}", lang.id, lang.name, lang.exts.join(", "));
    }
}
