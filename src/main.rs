mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{CacheCommands, Cli, Commands};

use bookhound::cache::AsinCache;
use bookhound::config::{self, Config};
use bookhound::models::{AttemptOutcome, BookQuery, LookupResult, SourceKind};
use bookhound::resolver::{ResolveOptions, Resolver};
use bookhound::sources::{
    AmazonSource, BookSource, GoogleBooksSource, HttpPageFetcher, OpenLibrarySource,
};
use bookhound::throttle::{RetryPolicy, Throttle};
use bookhound::{batch, calibre};

fn open_cache(config: &Config) -> Arc<AsinCache> {
    Arc::new(AsinCache::open(
        Some(config.cache.path.clone()),
        config.cache.negative_ttl_days,
    ))
}

fn build_resolver(config: &Config) -> Arc<Resolver> {
    let throttle = Throttle::new(
        Duration::from_millis(config.throttle.min_delay_ms),
        RetryPolicy {
            max_attempts: config.throttle.max_attempts,
            base_delay: Duration::from_millis(config.throttle.base_delay_ms),
            multiplier: config.throttle.multiplier,
        },
    );

    let sources: Vec<Arc<dyn BookSource>> = vec![
        Arc::new(AmazonSource::new(Arc::new(HttpPageFetcher::new()))),
        Arc::new(GoogleBooksSource::new()),
        Arc::new(OpenLibrarySource::new()),
    ];

    Arc::new(Resolver::new(sources, throttle, open_cache(config)))
}

fn print_result(result: &LookupResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match &result.asin {
        Some(asin) => {
            let source = result
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "cache".to_string());
            let origin = if result.from_cache { "cache" } else { source.as_str() };
            println!("{asin} (via {origin}, {} ms)", result.elapsed_ms);
        }
        None => {
            if result.from_cache {
                println!("not found (cached negative; use --refresh to retry)");
                return Ok(());
            }
            println!("not found after {} attempts:", result.attempts.len());
            for attempt in &result.attempts {
                let reason = match &attempt.outcome {
                    AttemptOutcome::Accepted { asin, .. } => format!("accepted {asin}"),
                    AttemptOutcome::Rejected { reason } => reason.clone(),
                    AttemptOutcome::Failed { reason } => reason.clone(),
                };
                println!("  {:12} {} -> {}", attempt.source.to_string(), attempt.variant, reason);
            }
        }
    }
    Ok(())
}

async fn run_lookup(
    config: &Config,
    title: Option<String>,
    author: Option<String>,
    language: Option<String>,
    isbn: Option<String>,
    source: Option<String>,
    fuzzy: bool,
    fuzzy_threshold: f64,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let source_filter = match source {
        Some(ref name) => {
            let kind = SourceKind::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown source '{}'", name))?;
            Some(vec![kind])
        }
        None => None,
    };

    let query = BookQuery::new(
        title.unwrap_or_default(),
        author.unwrap_or_default(),
        language.as_deref().unwrap_or(bookhound::lang::DEFAULT_LANG),
        None,
        isbn,
    )?;

    let opts = ResolveOptions {
        fuzzy: fuzzy || config.fuzzy.enabled,
        fuzzy_threshold,
        refresh,
        source_filter,
    };

    let resolver = build_resolver(config);
    let result = resolver.lookup(&query, &opts).await?;
    print_result(&result, json)
}

async fn run_batch(
    config: &Config,
    library: Option<std::path::PathBuf>,
    jobs: Option<usize>,
    fuzzy: bool,
    write_back: bool,
) -> Result<()> {
    let flag = library.or_else(|| config.library.clone());
    let root = calibre::resolve_library_root(flag.as_deref());
    if !root.exists() {
        anyhow::bail!("Library root does not exist: {:?}", root);
    }

    let opts = ResolveOptions {
        fuzzy: fuzzy || config.fuzzy.enabled,
        fuzzy_threshold: config.fuzzy.threshold,
        refresh: false,
        source_filter: None,
    };

    let resolver = build_resolver(config);
    let summary = batch::run(
        resolver,
        &root,
        jobs.unwrap_or(config.batch.jobs),
        opts,
        &config.batch.extensions,
        write_back,
    )
    .await?;

    println!(
        "{} scanned, {} resolved ({} from cache), {} not found, {} failed in {} ms",
        summary.scanned,
        summary.resolved,
        summary.from_cache,
        summary.not_found,
        summary.failed,
        summary.elapsed_ms
    );
    if write_back {
        println!("{} identifiers written back", summary.written_back);
    }
    Ok(())
}

fn run_cache(config: &Config, command: CacheCommands) -> Result<()> {
    let cache = open_cache(config);
    match command {
        CacheCommands::Stats => {
            let stats = cache.stats();
            println!(
                "{} entries ({} positive, {} negative)",
                stats.total, stats.positive, stats.negative
            );
        }
        CacheCommands::Clear => {
            cache.clear()?;
            println!("cache cleared");
        }
        CacheCommands::Prune => {
            let removed = cache.prune()?;
            println!("{removed} expired negative entries removed");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "bookhound=debug".to_string()
        } else {
            "bookhound=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Lookup {
            title,
            author,
            language,
            isbn,
            source,
            fuzzy,
            fuzzy_threshold,
            refresh,
            json,
        } => rt.block_on(run_lookup(
            &config,
            title,
            author,
            language,
            isbn,
            source,
            fuzzy,
            fuzzy_threshold,
            refresh,
            json,
        )),
        Commands::Batch {
            library,
            jobs,
            fuzzy,
            write_back,
        } => rt.block_on(run_batch(&config, library, jobs, fuzzy, write_back)),
        Commands::Cache { command } => run_cache(&config, command),
    }
}
