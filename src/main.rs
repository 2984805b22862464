mod cli;

use reelgate::{
    catalog::{ListCategory, MediaKind, SearchKind},
    config,
    server::{self, AppContext},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelgate=trace,tower_http=debug".to_string()
        } else {
            "reelgate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config::load_config_or_default(config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(config))
        }
        Commands::List { category, page } => {
            let category: ListCategory = category.parse()?;
            run_query(config_path, |ctx| async move {
                ctx.catalog.fetch_list(category, page).await
            })
        }
        Commands::Details { kind, id } => {
            let kind: MediaKind = kind.parse()?;
            run_query(config_path, |ctx| async move {
                ctx.catalog.fetch_details(kind, id).await
            })
        }
        Commands::Search { query, page, kind } => {
            let kind: SearchKind = kind.parse()?;
            run_query(config_path, |ctx| async move {
                ctx.catalog.search(&query, page, kind).await
            })
        }
        Commands::Suggest { query } => run_query(config_path, |ctx| async move {
            ctx.catalog.suggest(&query).await
        }),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Build the catalog, run one query on a fresh runtime and print it as JSON.
fn run_query<T, F, Fut>(config_path: Option<&Path>, query: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(AppContext) -> Fut,
    Fut: std::future::Future<Output = reelgate_core::Result<T>>,
{
    let config = config::load_config_or_default(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let value = rt.block_on(async {
        let ctx = AppContext::from_config(&config);
        query(ctx).await
    })?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    let ttl = config.ttl_policy();
    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Environment: {}", config.environment);
    println!("  Upstream: {}", config.upstream.base_url);
    println!(
        "  API key: {}",
        if config.upstream.api_key.is_empty() {
            "missing"
        } else {
            "set"
        }
    );
    println!(
        "  Spacing: {}ms, retries: {}",
        config.governor.min_interval_ms, config.governor.max_attempts
    );
    println!(
        "  Batches: {} every {}ms",
        config.queue.batch_size, config.queue.batch_yield_ms
    );
    println!(
        "  TTLs: list {}s, search {}s, details {}s, suggestions {}s",
        ttl.list_secs, ttl.search_secs, ttl.details_secs, ttl.suggestions_secs
    );

    Ok(())
}
