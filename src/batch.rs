//! Batch resolution across a library tree.
//!
//! Walks the library root for e-book files and runs independent lookups on
//! bounded parallel workers. The cache and the throttle are shared through
//! the resolver, so pacing holds across workers. Cancellation is checked
//! between books only; an in-flight lookup always finishes and its cache
//! write lands.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::calibre;
use crate::extract;
use crate::resolver::{ResolveOptions, Resolver};

/// Per-run counts reported after a batch completes.
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub scanned: usize,
    pub resolved: usize,
    pub from_cache: usize,
    pub not_found: usize,
    pub failed: usize,
    pub written_back: usize,
    pub elapsed_ms: u64,
}

/// Collect e-book files under `root`, in walk order.
pub fn collect_books(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    extensions.iter().any(|known| known == &ext)
                })
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect()
}

/// Resolve every book under `root` with up to `jobs` parallel workers.
///
/// Ctrl-C stops the run at the next book boundary; books already in flight
/// complete normally.
pub async fn run(
    resolver: Arc<Resolver>,
    root: &Path,
    jobs: usize,
    opts: ResolveOptions,
    extensions: &[String],
    write_back: bool,
) -> Result<BatchSummary> {
    let started = Instant::now();
    let books = collect_books(root, extensions);
    info!(root = %root.display(), count = books.len(), jobs = jobs, "starting batch");

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested, finishing in-flight lookups");
                cancelled.store(true, Ordering::SeqCst);
            }
        });
    }

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();
    let mut summary = BatchSummary {
        scanned: books.len(),
        ..Default::default()
    };

    for path in books {
        // Checkpoint between books, never mid-lookup.
        if cancelled.load(Ordering::SeqCst) {
            break;
        }

        let permit = semaphore.clone().acquire_owned().await?;
        let resolver = resolver.clone();
        let opts = opts.clone();

        tasks.spawn(async move {
            let _permit = permit;
            let query = extract::extract(&path);
            let result = resolver.lookup(&query, &opts).await;
            (path, query, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (path, query, result) = match joined {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "batch worker panicked");
                summary.failed += 1;
                continue;
            }
        };

        match result {
            Ok(result) => {
                if result.from_cache {
                    summary.from_cache += 1;
                }
                match result.asin {
                    Some(ref asin) => {
                        summary.resolved += 1;
                        println!("{}: {} ({})", path.display(), asin, query.title);
                        if write_back {
                            match calibre::write_asin(&path, asin) {
                                Ok(()) => summary.written_back += 1,
                                Err(e) => {
                                    warn!(path = %path.display(), error = %e, "write-back failed")
                                }
                            }
                        }
                    }
                    None => {
                        summary.not_found += 1;
                        println!("{}: not found ({} attempts)", path.display(), result.attempts.len());
                    }
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn!(path = %path.display(), error = %e, "lookup failed");
            }
        }
    }

    summary.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        resolved = summary.resolved,
        from_cache = summary.from_cache,
        not_found = summary.not_found,
        failed = summary.failed,
        elapsed_ms = summary.elapsed_ms,
        "batch complete"
    );
    Ok(summary)
}
