//! Whole-world patch run over a worker pool

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::landscape::{patch_tile, remove_vertex_colors, SnowClassifier, TileOutcome};
use crate::plugin::{OverrideStore, Plugin};
use crate::settings::Settings;

pub const DEFAULT_THREADS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker threads
    pub threads: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { threads: DEFAULT_THREADS }
    }
}

/// Outcome counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub patched: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub discarded_alpha_entries: usize,
    /// Channel formulas that failed to compile or evaluate
    pub formula_errors: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.formula_errors > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} landscapes: {} patched, {} unchanged, {} skipped, {} failed",
            self.total, self.patched, self.unchanged, self.skipped, self.failed
        )?;
        if self.discarded_alpha_entries > 0 {
            write!(f, " ({} alpha entries discarded)", self.discarded_alpha_entries)?;
        }
        if self.formula_errors > 0 {
            write!(f, "\n  {} channel formulas failed, those channels were left unchanged", self.formula_errors)?;
        }
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Tally {
    done: AtomicUsize,
    patched: AtomicUsize,
    unchanged: AtomicUsize,
    skipped: AtomicUsize,
    discarded_alpha_entries: AtomicUsize,
    failures: Mutex<Vec<String>>,
}

/// Recolor (or strip) the vertex colors of every landscape in `plugin`,
/// writing changed tiles to `store`.
///
/// Tiles are independent: a failed tile is logged and counted, the run goes on.
pub fn run_patch(
    plugin: &Plugin,
    store: &dyn OverrideStore,
    settings: &Settings,
    options: &RunOptions,
) -> Result<RunSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()?;

    let total = plugin.landscapes.len();
    let remove_all = settings.remove_all_vertex_colors;
    let formulas = settings.compile();
    let classifier = SnowClassifier::new(plugin);
    let tally = Tally::default();

    if remove_all {
        info!("Removing vertex colors from {} landscapes", total);
    } else {
        info!("Recoloring {} landscapes on {} threads", total, options.threads.max(1));
    }

    pool.install(|| {
        plugin.landscapes.par_iter().for_each(|record| {
            let report = if remove_all {
                remove_vertex_colors(record, store)
            } else {
                patch_tile(record, &classifier, &formulas, store)
            };

            match report {
                Ok(report) => {
                    let counter = match report.outcome {
                        TileOutcome::Patched => &tally.patched,
                        TileOutcome::Unchanged => &tally.unchanged,
                        TileOutcome::Skipped => &tally.skipped,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    tally
                        .discarded_alpha_entries
                        .fetch_add(report.discarded_alpha_entries, Ordering::Relaxed);
                }
                Err(e) => {
                    let message = e.in_landscape(record.form_id).to_string();
                    error!("{}", message);
                    tally.failures.lock().unwrap_or_else(PoisonError::into_inner).push(message);
                }
            }

            let done = tally.done.fetch_add(1, Ordering::Relaxed) + 1;
            info!("Patch: {}/{}", done, total);
        });
    });

    let formula_errors = if remove_all {
        0
    } else {
        formulas.snow.error_count() + formulas.standard.error_count()
    };

    let mut failures = tally.failures.into_inner().unwrap_or_else(PoisonError::into_inner);
    failures.sort();

    let summary = RunSummary {
        total,
        patched: tally.patched.into_inner(),
        unchanged: tally.unchanged.into_inner(),
        skipped: tally.skipped.into_inner(),
        failed: failures.len(),
        discarded_alpha_entries: tally.discarded_alpha_entries.into_inner(),
        formula_errors,
        failures,
    };

    if summary.discarded_alpha_entries > 0 {
        warn!("{} alpha entries outside their quadrant were discarded", summary.discarded_alpha_entries);
    }
    info!(
        "Done: {} patched, {} unchanged, {} skipped, {} failed",
        summary.patched, summary.unchanged, summary.skipped, summary.failed
    );

    Ok(summary)
}
