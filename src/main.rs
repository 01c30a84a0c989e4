use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cuaca_app::{
    adapters_from_config, key_source_from_config, LocationWeatherController, Panel, SessionContext,
    WeatherCardView,
};
use cuaca_core::{AppError, Config};

#[derive(Parser)]
#[command(version, about = "Weather for Indonesian provinces and regencies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List provinces
    Provinces,
    /// List regencies of a province
    Regencies {
        #[arg(short, long)]
        province: String,
    },
    /// Show the weather card for a regency
    Weather {
        #[arg(short, long)]
        province: String,
        #[arg(short, long)]
        regency: String,
        /// Keep the local clock ticking for this many seconds
        #[arg(short, long)]
        watch: Option<u64>,
        /// Print the render model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage bookmarked cities
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Show the configuration file location and validation result
    Config,
}

#[derive(Subcommand)]
enum BookmarkAction {
    List,
    Add {
        #[arg(short, long)]
        city: String,
        #[arg(short, long)]
        province: String,
    },
    Remove {
        #[arg(short, long)]
        id: String,
    },
    /// Bookmark or un-bookmark the city shown for a regency
    Toggle {
        #[arg(short, long)]
        province: String,
        #[arg(short, long)]
        regency: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    cuaca_core::init()?;
    let cli = Cli::parse();

    let config = Config::load()?;
    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    if let Commands::Config = cli.command {
        println!("Config directory: {}", config.config_dir.display());
        if validation.is_valid() {
            println!("Configuration is valid");
        } else {
            println!("{}", validation.error_summary());
        }
        return Ok(());
    }
    if !validation.is_valid() {
        anyhow::bail!("Invalid configuration:\n{}", validation.error_summary());
    }

    match run(cli.command, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            eprintln!("❌ {}", e.user_message());
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: &Config) -> Result<(), AppError> {
    let session = Arc::new(SessionContext::new());
    let adapters = adapters_from_config(config)?;
    let controller = LocationWeatherController::new(session.clone(), adapters, config.map.clone());

    match command {
        Commands::Provinces => {
            for province in controller.load_provinces().await? {
                println!("{:>4}  {}", province.id, province.display_name);
            }
        }
        Commands::Regencies { province } => {
            controller.load_provinces().await?;
            for regency in controller.select_province(&province).await? {
                println!("{:>6}  {}", regency.id, regency.display_name);
            }
        }
        Commands::Weather {
            province,
            regency,
            watch,
            json,
        } => {
            initialize(&session, config).await?;
            show_weather(&controller, &province, &regency).await?;

            match controller.panel() {
                Panel::Card(card) if json => {
                    let text = serde_json::to_string_pretty(&card)
                        .context("Failed to serialize weather card")?;
                    println!("{}", text);
                }
                Panel::Card(card) => print_card(&card),
                Panel::Error(view) => println!("❌ {}", view.message),
                Panel::Loading => println!("Fetching weather..."),
                Panel::Placeholder(view) => println!("{}", view.message),
            }

            if let (Some(seconds), Some(mut clock)) = (watch, controller.clock()) {
                let deadline = tokio::time::sleep(Duration::from_secs(seconds));
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        _ = &mut deadline => break,
                        changed = clock.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            println!("Local time: {}", *clock.borrow_and_update());
                        }
                    }
                }
            }
        }
        Commands::Bookmarks { action } => match action {
            BookmarkAction::List => {
                let bookmarks = controller.get_bookmarks().await?;
                if bookmarks.is_empty() {
                    println!("No bookmarks yet.");
                }
                for bookmark in bookmarks {
                    println!("{:>6}  {}, {}", bookmark.id, bookmark.city, bookmark.province);
                }
            }
            BookmarkAction::Add { city, province } => {
                let bookmark = controller.add_bookmark(&city, &province).await?;
                println!("Bookmarked {} ({})", bookmark.city, bookmark.id);
            }
            BookmarkAction::Remove { id } => {
                controller.delete_bookmark(&id).await?;
                println!("Removed bookmark {}", id);
            }
            BookmarkAction::Toggle { province, regency } => {
                initialize(&session, config).await?;
                show_weather(&controller, &province, &regency).await?;
                let (city, _) = controller.current_bookmark_target()?;
                if controller.toggle_bookmark().await? {
                    println!("Bookmarked {}", city);
                } else {
                    println!("Removed {} from bookmarks", city);
                }
            }
        },
        Commands::Config => {}
    }

    Ok(())
}

async fn initialize(session: &SessionContext, config: &Config) -> Result<(), AppError> {
    let key_source = key_source_from_config(config)?;
    session
        .initialize(key_source.as_ref(), &config.translations)
        .await
}

async fn show_weather(
    controller: &LocationWeatherController,
    province: &str,
    regency: &str,
) -> Result<(), AppError> {
    controller.load_provinces().await?;
    controller.select_province(province).await?;
    controller.load_weather(regency).await?;
    controller.is_bookmarked().await.map(|_| ()).or_else(|e| {
        // The card is still useful without the bookmark flag
        tracing::warn!("Could not check bookmarks: {}", e);
        Ok(())
    })
}

fn print_card(card: &WeatherCardView) {
    let star = if card.bookmarked { " ★" } else { "" };
    println!("{}{}", card.title, star);
    if let Some(notice) = &card.nearby_notice {
        println!("  ({})", notice);
    }
    println!("  Province     {}", card.province);
    println!("  Condition    {}", card.condition);
    println!("  Temperature  {}", card.temperature);
    println!("  Humidity     {}", card.humidity);
    println!("  Pressure     {}", card.pressure);
    println!("  Wind         {}", card.wind);
    println!("  Local time   {} ({})", card.local_time, card.timezone);
    println!("  Icon         {}", card.icon_url);
    println!(
        "  Map          {:.4}, {:.4} at zoom {}",
        card.map.latitude, card.map.longitude, card.map.zoom
    );
    println!();
    for item in &card.forecast {
        println!(
            "  {:<16} {:<22} {}",
            item.day_label, item.condition, item.temperature
        );
    }
}
