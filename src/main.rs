use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storywatch::app::AppContext;
use storywatch::cli::{commands, Cli, Commands};
use storywatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Sync { pages, full } => {
            commands::sync(&mut ctx, pages, full).await?;
        }
        Commands::Scrape { page, all } => {
            commands::scrape(&mut ctx, page, all).await?;
        }
        Commands::Refresh { id } => {
            commands::refresh(&mut ctx, id).await?;
        }
        Commands::Pages => {
            commands::pages(&ctx).await?;
        }
        Commands::Watch { id, reset } => {
            commands::watch(&mut ctx, id, reset)?;
        }
        Commands::Ignore { id, reset } => {
            commands::ignore(&mut ctx, id, reset)?;
        }
        Commands::Ack { id } => {
            commands::acknowledge(&mut ctx, id)?;
        }
        Commands::SetTitle { id, title } => {
            commands::set_title(&mut ctx, id, title)?;
        }
        Commands::SetPriority { id, priority } => {
            commands::set_priority(&mut ctx, id, priority)?;
        }
        Commands::SetDescription { id, description } => {
            commands::set_description(&mut ctx, id, description)?;
        }
        Commands::SetMarker { id, marker } => {
            commands::set_marker(&mut ctx, id, marker)?;
        }
        Commands::Show { view } => {
            commands::show(&ctx, view)?;
        }
        Commands::Open { id } => {
            commands::open_story(&ctx, id)?;
        }
    }

    Ok(())
}
