mod cli;

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{BingAction, Cli, Commands, PrefsAction, SourceAction};
use wallpaper_provider::prelude::*;
use wallpaper_provider::settings::render_source_list;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ProviderConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }
    let provider = Provider::connect(config).await?;

    match cli.command {
        Commands::Wallpapers { json } => {
            let list = provider.get_wallpapers().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for w in list {
                    println!("[{}] {} ({}) {}", w.source_type, w.title, w.id, w.image_url);
                }
            }
        }
        Commands::Sources { action } => match action {
            SourceAction::List => {
                println!("{}", render_source_list(&provider.custom_records().await?));
            }
            SourceAction::Add { title, url, source_type, description, thumbnail, resolve } => {
                let form = SourceForm { title, url, description, thumbnail, source_type };
                let (record, warnings) = if resolve {
                    provider.add_stream_source(form).await?
                } else {
                    provider.add_from_form(form).await?
                };
                for w in warnings {
                    eprintln!("{}", w);
                }
                println!("Added {} ({})", record.title, record.id);
            }
            SourceAction::Remove { id } => {
                let removed = provider.remove_custom_source(&id).await?;
                println!("Removed {} source(s)", removed);
            }
            SourceAction::Refresh => {
                let report = provider.refresh_expired_sources().await?;
                for id in &report.refreshed {
                    println!("Refreshed {}", id);
                }
                for id in &report.skipped {
                    println!("Skipped {} (direct URLs cannot be refreshed, add it again)", id);
                }
                for (id, err) in &report.failed {
                    eprintln!("Failed to refresh {}: {}", id, err);
                }
            }
        },
        Commands::Bing { action } => match action {
            BingAction::On => provider.set_include_bing(true).await?,
            BingAction::Off => provider.set_include_bing(false).await?,
            BingAction::Status => {
                let state = if provider.include_bing().await { "enabled" } else { "disabled" };
                println!("Bing wallpapers {}", state);
            }
        },
        Commands::Prefs { action } => match action {
            PrefsAction::Export => println!("{}", provider.export_preferences().await?),
            PrefsAction::Import { file } => {
                let json = match file {
                    Some(path) => std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                    None => {
                        let mut buf = String::new();
                        std::io::stdin().read_to_string(&mut buf)?;
                        buf
                    }
                };
                provider.import_preferences(&json).await?;
            }
        },
        Commands::Resolve { url } => {
            let playlist = provider.stream_resolver()?.resolve(&url).await?;
            println!("{}", playlist);
        }
    }
    Ok(())
}
