use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use locamap::Session;
use locamap_core::Config;
use locamap_maps::{HeadlessSurface, SearchOutcome};
use locamap_services::Location;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "LOCAMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored locations
    Locations,
    /// Select a location and center the map on it
    Select { index: usize },
    /// Delete the selected location (the first one unless --index is given)
    Delete {
        #[arg(long)]
        index: Option<usize>,
    },
    /// Search places and show the results
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show the current weather
    Weather {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Show configuration and validation problems
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_overrides(|name| std::env::var(name).ok());
            Ok(config)
        }
        None => Config::load(),
    }
}

fn print_locations(locations: &[Location], active: Option<usize>) {
    if locations.is_empty() {
        println!("No locations");
        return;
    }
    for (i, location) in locations.iter().enumerate() {
        let marker = if active == Some(i) { "*" } else { " " };
        println!(
            "{} [{}] #{} {} {} {}",
            marker,
            i,
            location.id,
            location.position(),
            location.province.as_deref().unwrap_or("-"),
            location.name().unwrap_or("")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    locamap_core::init()?;

    let config = load_config(cli.config.as_ref())?;

    if let Commands::Config = cli.command {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        println!("Configuration file: {}", path.display());
        println!("Database configured: {}", config.supabase.is_configured());
        println!("Weather municipality: {}", config.weather.municipality_id);
        let result = config.validate();
        for warning in &result.warnings {
            println!("warning: {}: {}", warning.field, warning.message);
        }
        if !result.is_valid() {
            println!("{}", result.error_summary());
        }
        return Ok(());
    }

    let mut session = Session::from_config(config)?;

    match cli.command {
        Commands::Locations => {
            if session.store().refresh().await.is_ok() {
                print_locations(&session.store().locations(), session.store().active_index());
            } else {
                eprintln!("Error al obtener ubicaciones.");
            }
        }
        Commands::Select { index } => {
            match session.select_location(index).await {
                Ok(position) => println!(
                    "Selected [{}] at {} (zoom {})",
                    index,
                    position,
                    session.view().zoom()
                ),
                Err(e) => eprintln!("{}", e.user_message()),
            }
        }
        Commands::Delete { index } => match session.delete_location(index).await {
            Ok(removed) => {
                println!("Deleted #{}", removed.id);
                print_locations(&session.store().locations(), session.store().active_index());
            }
            Err(e) => eprintln!("{}", e.user_message()),
        },
        Commands::Search { query } => {
            let surface = Arc::new(HeadlessSurface::new());
            session.on_map_ready(surface.clone()).await;
            match session.search().search(&query.join(" ")).await {
                Ok(SearchOutcome::Found { places, .. }) => {
                    for place in &places {
                        match place.position() {
                            Some(position) => println!("{}  {}", place.label(), position),
                            None => println!("{}", place.label()),
                        }
                    }
                    if let Some((bounds, options)) = surface.last_fit() {
                        println!(
                            "Fitted to {:?} (max zoom {})",
                            bounds.center(),
                            options.max_zoom
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => eprintln!("{}", e.user_message()),
            }
        }
        Commands::Weather { watch } => {
            if watch {
                let mut updates = session.weather().subscribe();
                session.start()?;
                loop {
                    tokio::select! {
                        changed = updates.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let snapshot = updates.borrow_and_update().clone();
                            println!(
                                "{}°C  {}  humedad {}%  viento {} km/h",
                                snapshot.temp, snapshot.condition, snapshot.humidity, snapshot.wind
                            );
                        }
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
            } else {
                let snapshot = session.weather().refresh_now().await;
                println!(
                    "{}°C  {}  humedad {}%  viento {} km/h",
                    snapshot.temp, snapshot.condition, snapshot.humidity, snapshot.wind
                );
            }
        }
        Commands::Config => {}
    }

    session.shutdown()?;
    Ok(())
}
