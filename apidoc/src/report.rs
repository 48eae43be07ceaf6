use apidoc_core::{Catalog, Reporter, SyntaxError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prints each diagnostic to stderr in the chosen locale and counts them.
pub struct ConsoleReporter {
    catalog: Catalog,
    count: AtomicUsize,
}

impl ConsoleReporter {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            count: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, err: SyntaxError) {
        self.count.fetch_add(1, Ordering::Relaxed);
        eprintln!("error: {}", self.catalog.render(&err));
    }
}
