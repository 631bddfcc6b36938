mod serve;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lensview_core::{
    Config, DgraphClient, DisplayLookup, GraphNode, HttpScopeFetcher, LensResolver, LensView,
    NoDisplayLookup, ScopeFetcher, StaticDisplayLookup, SubgraphScoper,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "lensview")]
#[command(about = "Live investigation lens server and watcher", long_about = None)]
struct Cli {
    /// Config file (defaults to ./lensview.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the lens resolvers over HTTP
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// List lenses by descending score
    Lenses {
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        first: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// Print the normalized scope of a lens
    Scope {
        lens: String,
        /// Print the drop and prune counters instead of the lens
        #[arg(long)]
        diagnostics: bool,
    },
    /// Poll a lens and log graph updates until interrupted
    Watch {
        lens: String,
        /// Query the graph database directly instead of a resolver server
        #[arg(long, conflicts_with = "server")]
        direct: bool,
        /// Resolver server URL (overrides config)
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve { bind, port } => {
            let bind = bind.unwrap_or_else(|| config.serve.bind.clone());
            let port = port.unwrap_or(config.serve.port);
            let addr: SocketAddr = format!("{bind}:{port}").parse()?;

            let resolver = LensResolver::new(build_scoper(&config)?, &config.api);
            println!("Starting lens resolver at http://{addr}");
            println!("Press Ctrl+C to stop");
            serve::start_server(resolver, addr).await?;
        }
        Commands::Lenses { first, offset } => {
            let resolver = LensResolver::new(build_scoper(&config)?, &config.api);
            let lenses = resolver.lenses(Some(first), Some(offset)).await?;
            if lenses.is_empty() {
                println!("No lenses found.");
            }
            for lens in lenses {
                let score = lens.score.map(|s| s.to_string()).unwrap_or_default();
                println!("{:>6}  {}  ({})", score, lens.lens_name, lens.uid.to_hex());
            }
        }
        Commands::Scope { lens, diagnostics } => {
            let scoper = build_scoper(&config)?;
            match scoper.scope_lens_with_diagnostics(&lens).await? {
                Some(scoped) if diagnostics => {
                    println!("{}", serde_json::to_string_pretty(&scoped.diagnostics)?);
                }
                Some(scoped) => {
                    println!("{}", serde_json::to_string_pretty(&scoped.lens)?);
                }
                None => println!("Lens '{lens}' not found."),
            }
        }
        Commands::Watch {
            lens,
            direct,
            server,
        } => {
            let fetcher: Arc<dyn ScopeFetcher> = if direct {
                let scoper: Arc<dyn ScopeFetcher> = build_scoper(&config)?;
                scoper
            } else {
                let url = server.unwrap_or_else(|| config.poll.server_url.clone());
                Arc::new(HttpScopeFetcher::new(&url, config.poll.timeout())?)
            };
            watch(fetcher, &config, lens).await;
        }
    }

    Ok(())
}

/// Wire the graph database client, display lookup and schema together.
fn build_scoper(config: &Config) -> CliResult<Arc<SubgraphScoper>> {
    let client = DgraphClient::new(&config.dgraph)?;
    let display: Arc<dyn DisplayLookup> = if config.display.enabled {
        Arc::new(StaticDisplayLookup::new(config.display.properties.clone()))
    } else {
        Arc::new(NoDisplayLookup)
    };
    Ok(Arc::new(SubgraphScoper::new(
        Arc::new(client),
        display,
        config.schema(),
    )))
}

async fn watch(fetcher: Arc<dyn ScopeFetcher>, config: &Config, lens: String) {
    let on_select = Arc::new(|node: Arc<GraphNode>| {
        info!(id = %node.id, label = %node.label(), "node selected");
    });
    let view = LensView::spawn(fetcher, &config.poll, on_select);
    let mut updates = view.subscribe();
    view.set_lens(Some(lens.clone()));

    println!("Watching lens '{lens}' every {}ms", config.poll.interval_ms);
    println!("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let model = updates.borrow_and_update().clone();
                info!(
                    lens = %lens,
                    nodes = model.nodes().len(),
                    links = model.links().len(),
                    "graph updated"
                );
            }
        }
    }

    view.shutdown().await;
}
