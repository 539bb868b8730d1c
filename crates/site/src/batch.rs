//! Parallel page builds.

use crate::assembler::{CancelToken, FinalDocument, PageAssembler};
use crate::config::SiteConfig;
use crate::error::BuildError;
use goku_core::Page;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Options for [`PageAssembler::build_all`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to rayon's global pool.
    pub max_threads: Option<usize>,
    /// Whether to keep building after a page fails. Defaults to true.
    pub continue_on_error: bool,
    /// Shared cancellation flag for every page in the batch.
    pub cancel: CancelToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_threads: None,
            continue_on_error: true,
            cancel: CancelToken::new(),
        }
    }
}

impl BatchOptions {
    /// Options using the configured thread count.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            max_threads: config.max_threads,
            ..Self::default()
        }
    }
}

/// Statistics for a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    /// Number of pages attempted.
    pub total: u32,
    /// Number of pages built.
    pub succeeded: u32,
    /// Number of pages that failed.
    pub failed: u32,
    /// Wall-clock time in milliseconds.
    pub processing_time_ms: f64,
}

/// Per-page results, in input order, plus statistics.
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per attempted page.
    pub results: Vec<Result<FinalDocument, BuildError>>,
    /// Batch statistics.
    pub stats: BatchStats,
}

impl BatchReport {
    /// Successfully built documents.
    pub fn documents(&self) -> impl Iterator<Item = &FinalDocument> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Failed builds.
    pub fn errors(&self) -> impl Iterator<Item = &BuildError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

impl PageAssembler {
    /// Build every page in `pages`.
    ///
    /// A failing page never affects the others. With `continue_on_error`
    /// unset the pages are built one at a time and the batch stops after the
    /// first failure, so `results` may be shorter than `pages`.
    pub fn build_all(&self, pages: &[Page], options: &BatchOptions) -> BatchReport {
        let start = Instant::now();

        let pool = options.max_threads.and_then(|threads| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| log::warn!("falling back to the global thread pool: {err}"))
                .ok()
        });

        let succeeded = AtomicU32::new(0);
        let failed = AtomicU32::new(0);

        let build_one = |page: &Page| {
            let result = self.build_cancellable(page, &options.cancel);
            match &result {
                Ok(_) => succeeded.fetch_add(1, Ordering::Relaxed),
                Err(err) => {
                    log::warn!("{err}");
                    failed.fetch_add(1, Ordering::Relaxed)
                }
            };
            result
        };

        let results: Vec<_> = if options.continue_on_error {
            match pool {
                Some(pool) => pool.install(|| pages.par_iter().map(build_one).collect()),
                None => pages.par_iter().map(build_one).collect(),
            }
        } else {
            let mut results = Vec::with_capacity(pages.len());
            for page in pages {
                let result = build_one(page);
                let stop = result.is_err();
                results.push(result);
                if stop {
                    break;
                }
            }
            results
        };

        let stats = BatchStats {
            total: results.len() as u32,
            succeeded: succeeded.into_inner(),
            failed: failed.into_inner(),
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        log::debug!(
            "built {} of {} pages in {:.1}ms",
            stats.succeeded,
            stats.total,
            stats.processing_time_ms
        );
        BatchReport { results, stats }
    }
}
