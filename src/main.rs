use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use towerintel::analysis::AnalysisSettings;
use towerintel::completion::UnavailableCompletion;
use towerintel::enrichment::UnavailableEnrichment;
use towerintel::models::AnalysisRequest;
use towerintel::rpc::{self, RpcHandler};
use towerintel::{
    AnalysisService, CompletionProvider, EnrichmentProvider, GooglePlacesProvider,
    HttpTowerStore, InMemoryTowerStore, OpenAiCompletion, ToolName, ToolRegistry,
    TowerIntelConfig, TowerStore, logging, server,
};

#[derive(Parser)]
#[command(name = "towerintel", version, about = "Cell tower location intelligence engine")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "TOWERINTEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Serve newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// Analyse one location and print the result as JSON
    Analyze {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in meters
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Print the tool definitions as JSON
    Tools,
}

fn tower_store(config: &TowerIntelConfig) -> Result<Arc<dyn TowerStore>> {
    if let Some(path) = &config.tower_store.fixture_path {
        let store = InMemoryTowerStore::from_json_file(path)
            .with_context(|| format!("Failed to load tower fixture {}", path.display()))?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(HttpTowerStore::new(&config.tower_store)?))
}

fn enrichment(config: &TowerIntelConfig) -> Result<Arc<dyn EnrichmentProvider>> {
    if config.enrichment.api_key.is_none() {
        tracing::warn!("No places API key configured; location analysis is unavailable");
        return Ok(Arc::new(UnavailableEnrichment));
    }
    Ok(Arc::new(GooglePlacesProvider::new(&config.enrichment)?))
}

fn completion(config: &TowerIntelConfig) -> Result<Arc<dyn CompletionProvider>> {
    if config.completion.api_key.is_none() {
        tracing::warn!("No completion API key configured; using fallback recommendations");
        return Ok(Arc::new(UnavailableCompletion));
    }
    Ok(Arc::new(OpenAiCompletion::new(&config.completion)?))
}

fn build_handler(config: &TowerIntelConfig) -> Result<RpcHandler> {
    let service = Arc::new(AnalysisService::new(
        tower_store(config)?,
        enrichment(config)?,
        completion(config)?,
        AnalysisSettings::from_config(config),
    ));
    let registry = ToolRegistry::new(service).context("Failed to register tools")?;
    Ok(RpcHandler::new(Arc::new(registry)))
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Tools = cli.command {
        let tools: Vec<_> = ToolName::ALL.into_iter().map(ToolName::definition).collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    let mut config = TowerIntelConfig::load_from_path(cli.config)?;
    logging::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let handler = build_handler(&config)?;
            server::run(handler, &config.server, config.analysis.request_timeout()).await?;
        }
        Commands::Stdio => {
            let handler = build_handler(&config)?;
            rpc::serve_stdio(handler).await?;
        }
        Commands::Analyze { lat, lng, radius } => {
            let handler = build_handler(&config)?;
            let radius = radius.unwrap_or(config.analysis.default_radius_meters);
            let analysis = handler
                .registry()
                .service()
                .analyze(AnalysisRequest::new(lat, lng, radius)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Tools => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
