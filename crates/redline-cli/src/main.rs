use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use redline_common::telemetry::{self, TelemetryConfig};
use redline_common::{
    ClientConfig, FeatureCollection, HttpMapService, MapService, MemoryMapService, UserId,
};
use redline_core::SyncController;

mod render;
mod session;

/// Placeholder base URL for offline runs, where nothing goes over the wire.
const LOCAL_API_URL: &str = "http://localhost:3232";

#[derive(Parser)]
#[command(version, about = "redline - pins and the redlining overlay from a terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the map service
    #[arg(long, env = "REDLINE_API_URL")]
    api_url: Option<String>,

    /// User id the pins are stored under
    #[arg(long, env = "REDLINE_USER", default_value = "anonymous")]
    user: String,

    /// TOML or JSON client configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use an in-memory service instead of the network
    #[arg(long)]
    offline: bool,

    /// GeoJSON overlay served in offline mode
    #[arg(long, requires = "offline")]
    overlay_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Session,
    /// List the current pins
    Pins,
    /// Add a pin
    Add {
        /// Latitude, sent as typed
        #[arg(allow_hyphen_values = true)]
        lat: String,
        /// Longitude, sent as typed
        #[arg(allow_hyphen_values = true)]
        lng: String,
    },
    /// Remove all of your pins
    Clear,
    /// Fetch the overlay, optionally filtered by keyword
    Overlay {
        #[arg(long)]
        keyword: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    telemetry::init(TelemetryConfig::from_env("redline-cli").with_level(level));

    let config = load_config(&cli)?;
    let user = UserId::new(&cli.user);
    let command = cli.command.unwrap_or(Commands::Session);

    if cli.offline {
        let overlay = match &cli.overlay_file {
            Some(path) => read_overlay(path)?,
            None => FeatureCollection::empty(),
        };
        println!("⚠ Offline: pins are kept in memory for this run only");
        run(MemoryMapService::new(overlay), user, config, command).await
    } else {
        let service = HttpMapService::new(config.clone())?;
        run(service, user, config, command).await
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match (&cli.config, &cli.api_url) {
        (Some(path), _) => ClientConfig::from_file(path)?.with_env_overrides()?,
        (None, Some(url)) => ClientConfig::for_url(url)?.with_env_overrides()?,
        (None, None) if cli.offline => ClientConfig::for_url(LOCAL_API_URL)?,
        (None, None) => ClientConfig::from_env()?,
    };
    // --api-url wins over the file
    if let (Some(_), Some(url)) = (&cli.config, &cli.api_url) {
        config.base_url = ClientConfig::for_url(url)?.base_url;
    }
    Ok(config)
}

fn read_overlay(path: &Path) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path).into_diagnostic()?;
    let overlay: FeatureCollection = serde_json::from_str(&text).into_diagnostic()?;
    if !overlay.is_feature_collection() {
        return Err(miette::miette!(
            "{} is not a GeoJSON FeatureCollection",
            path.display()
        ));
    }
    Ok(overlay)
}

async fn run<S>(service: S, user: UserId, config: ClientConfig, command: Commands) -> Result<()>
where
    S: MapService,
{
    let controller = Arc::new(SyncController::from_config(service, user, &config));

    match command {
        Commands::Session => session::run(controller, &config).await,
        Commands::Pins => {
            controller.refresh_pins().await;
            finish(&controller, |state| render::markers(&state.markers))
        }
        Commands::Add { lat, lng } => {
            controller.add_pin_raw(&lat, &lng).await;
            finish(&controller, |state| {
                format!("✓ Pin added\n{}", render::markers(&state.markers))
            })
        }
        Commands::Clear => {
            controller.clear_all().await;
            finish(&controller, |state| {
                format!("✓ Pins cleared ({} remaining)", state.markers.len())
            })
        }
        Commands::Overlay { keyword } => {
            match keyword {
                Some(keyword) => controller.search(&keyword).await,
                None => controller.initialize().await,
            }
            finish(&controller, |state| render::overlay(state.overlay.as_deref()))
        }
    }
}

/// Print the outcome of a one-shot command, or fail with the view's error.
fn finish<S: MapService>(
    controller: &SyncController<S>,
    describe: impl FnOnce(&redline_core::ViewState) -> String,
) -> Result<()> {
    let state = controller.snapshot();
    match &state.last_error {
        Some(error) => Err(miette::miette!("{error}")),
        None => {
            println!("{}", describe(&state));
            Ok(())
        }
    }
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .ok();
    miette::set_panic_hook();
}
