//! Pipeline coordinator.
//!
//! Files flow through a pool of extract workers, which push comment blocks
//! onto a bounded queue; a pool of decode workers drains the queue, appending
//! APIs to the shared [`Document`] and setting `apidoc` fragments aside. The
//! scope join is the barrier: fragments are merged in source order after it,
//! then the document is sanitized.

use crate::ast::{sanitize, Api, Document, MetadataPolicy};
use crate::codec::{Decoder, Node};
use crate::extract::{read_source, CommentBlock, Extractor};
use crate::input::{ConfigError, SourceInput};
use crate::lang::Language;
use crate::message::Reporter;
use crossbeam_channel::{bounded, unbounded, Sender};
use encoding_rs::Encoding;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Tuning and behaviour switches for [`parse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParseOptions {
    pub extract_workers: usize,
    pub decode_workers: usize,
    /// Blocks buffered between the two pools before extractors wait.
    pub queue_capacity: usize,
    /// Unknown attributes, elements and stray text become errors.
    pub strict: bool,
    pub metadata: MetadataPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        let cpus = thread::available_parallelism().map_or(4, |n| n.get());
        Self {
            extract_workers: cpus,
            decode_workers: cpus,
            queue_capacity: 500,
            strict: false,
            metadata: MetadataPolicy::default(),
        }
    }
}

/// A decoded `apidoc` block waiting to be merged.
struct Fragment {
    file: Arc<Path>,
    offset: usize,
    doc: Document,
}

/// Shared by the decode workers.
#[derive(Default)]
struct Assembly {
    doc: Mutex<Document>,
    fragments: Mutex<Vec<Fragment>>,
}

/// One file to extract.
struct Job {
    path: PathBuf,
    lang: &'static Language,
    encoding: Option<&'static Encoding>,
}

/// Parse every file named by `inputs` into one sanitized document.
///
/// Only configuration problems are returned as errors; everything found in
/// the sources goes to `reporter`.
pub fn parse(inputs: &[SourceInput], opts: &ParseOptions, reporter: &dyn Reporter) -> Result<Document, ConfigError> {
    let jobs = plan(inputs)?;
    info!(files = jobs.len(), "parsing");

    let assembly = Assembly::default();
    run(jobs, opts, &assembly, reporter);

    let mut doc = assembly.doc.into_inner();
    let mut fragments = assembly.fragments.into_inner();
    // First declaration wins, so merge order must not depend on scheduling.
    fragments.sort_by(|a, b| a.file.cmp(&b.file).then(a.offset.cmp(&b.offset)));
    for frag in fragments {
        for err in doc.merge(frag.doc, &frag.file, opts.metadata) {
            reporter.report(err);
        }
    }
    for err in sanitize(&mut doc) {
        reporter.report(err);
    }
    debug!(apis = doc.apis.len(), "document assembled");
    Ok(doc)
}

/// Resolve all inputs up front. A file named by two inputs is read once,
/// with the settings of the first.
fn plan(inputs: &[SourceInput]) -> Result<Vec<Job>, ConfigError> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    for input in inputs {
        let resolved = input.resolve()?;
        for path in resolved.files {
            if seen.insert(path.clone()) {
                jobs.push(Job {
                    path,
                    lang: resolved.lang,
                    encoding: resolved.encoding,
                });
            }
        }
    }
    Ok(jobs)
}

fn run(jobs: Vec<Job>, opts: &ParseOptions, assembly: &Assembly, reporter: &dyn Reporter) {
    let (job_tx, job_rx) = unbounded::<Job>();
    let (block_tx, block_rx) = bounded::<CommentBlock>(opts.queue_capacity.max(1));

    thread::scope(|scope| {
        for job in jobs {
            job_tx.send(job).ok();
        }
        drop(job_tx);

        for _ in 0..opts.extract_workers.max(1) {
            let job_rx = job_rx.clone();
            let block_tx = block_tx.clone();
            scope.spawn(move || {
                for job in job_rx {
                    extract_job(&job, &block_tx, reporter);
                }
            });
        }
        drop(block_tx);

        for _ in 0..opts.decode_workers.max(1) {
            let block_rx = block_rx.clone();
            scope.spawn(move || {
                for block in block_rx {
                    decode_block(&block, opts, assembly, reporter);
                }
            });
        }
    });
}

fn extract_job(job: &Job, tx: &Sender<CommentBlock>, reporter: &dyn Reporter) {
    let source = match read_source(&job.path, job.encoding) {
        Ok(source) => source,
        Err(err) => {
            reporter.report(err);
            return;
        }
    };

    let file: Arc<Path> = Arc::from(job.path.as_path());
    let mut blocks = 0usize;
    for block in Extractor::new(file, &source.text, job.lang) {
        if tx.send(block).is_err() {
            return;
        }
        blocks += 1;
    }
    if let Some(err) = source.error {
        reporter.report(err);
    }
    debug!(file = %job.path.display(), lang = job.lang.id, blocks, "extracted");
}

/// Local name of the block's first element, if the block starts with one.
fn root_name(data: &str) -> Option<&str> {
    let mut text = data.trim_start();
    while let Some(rest) = text.strip_prefix("<?") {
        text = rest.split_once("?>")?.1.trim_start();
    }
    let rest = text.strip_prefix('<')?;
    let len = rest
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        .unwrap_or(rest.len());
    rest[..len].rsplit(':').next()
}

fn decode_block(block: &CommentBlock, opts: &ParseOptions, assembly: &Assembly, reporter: &dyn Reporter) {
    let Some(root) = root_name(&block.data) else {
        return;
    };
    let file: &Path = &block.file;
    let mut decoder = Decoder::new(file, &block.data, block.start, opts.strict);

    if Some(root) == Api::schema().root() {
        match decoder.decode_root::<Api>() {
            Ok(api) => assembly.doc.lock().append_api(api, file),
            Err(err) => reporter.report(err),
        }
    } else if Some(root) == Document::schema().root() {
        match decoder.decode_root::<Document>() {
            Ok(doc) => assembly.fragments.lock().push(Fragment {
                file: Arc::clone(&block.file),
                offset: block.start.offset,
                doc,
            }),
            Err(err) => reporter.report(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_names() {
        assert_eq!(root_name("  <api method=\"GET\">"), Some("api"));
        assert_eq!(root_name("<?xml version=\"1.0\"?>\n<apidoc>"), Some("apidoc"));
        assert_eq!(root_name("<x:api/>"), Some("api"));
        assert_eq!(root_name("just prose < here"), None);
        assert_eq!(root_name("<?xml never closed"), None);
    }

    #[test]
    fn default_queue_capacity() {
        let opts = ParseOptions::default();
        assert_eq!(opts.queue_capacity, 500);
        assert!(opts.extract_workers >= 1 && opts.decode_workers >= 1);
        assert_eq!(opts.metadata, MetadataPolicy::RejectConflicts);
    }
}
