//! ideaspot - Expand spoken ideas into structured notes
//!
//! Entry point for the ideaspot CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ideaspot::cli::commands::{self, ExpandOptions};
use ideaspot::cli::{Cli, Commands};
use ideaspot::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            ideaspot::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            match command {
                Commands::Expand {
                    transcript,
                    file,
                    json,
                    no_save,
                    tags,
                    timeout,
                } => {
                    let options = ExpandOptions {
                        transcript,
                        file,
                        json,
                        no_save,
                        tags,
                        timeout,
                    };
                    commands::expand_idea(&settings, options).await?;
                }
                Commands::Serve { bind } => {
                    commands::serve(&settings, bind).await?;
                }
                Commands::List {
                    limit,
                    search,
                    favorites,
                } => {
                    commands::list_ideas(&settings, limit, search, favorites)?;
                }
                Commands::View { id, json } => {
                    commands::view_idea(&settings, &id, json)?;
                }
                Commands::Search { query } => {
                    commands::search_sections(&settings, &query)?;
                }
                Commands::Edit {
                    id,
                    title,
                    section,
                    content,
                } => {
                    commands::edit_idea(&settings, &id, title, section, content)?;
                }
                Commands::Tag { id, tags, remove } => {
                    commands::tag_idea(&settings, &id, &tags, remove)?;
                }
                Commands::Favorite { id } => {
                    commands::toggle_favorite(&settings, &id)?;
                }
                Commands::Delete { id } => {
                    commands::delete_idea(&settings, &id)?;
                }
                Commands::Export { id, format, output } => {
                    commands::export_idea(&settings, &id, format, output)?;
                }
                Commands::Sections => {
                    commands::show_sections(&settings)?;
                }
                Commands::Config(config_cmd) => {
                    commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
