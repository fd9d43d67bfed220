//! CLI command implementations

use anyhow::{Context, Result};
use chrono::Local;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::args::{ConfigCommand, ExportFormat};
use crate::config::Settings;
use crate::expansion::{Expander, ExpansionRequest, ExpansionResult};
use crate::storage::{Database, Idea, IdeaStatus};

/// Options for `expand`
#[derive(Debug, Default)]
pub struct ExpandOptions {
    pub transcript: Option<String>,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub no_save: bool,
    pub tags: Vec<String>,
    pub timeout: Option<u64>,
}

/// Expand a transcript and save it to the idea library
pub async fn expand_idea(settings: &Settings, options: ExpandOptions) -> Result<()> {
    let input = read_transcript(options.transcript, options.file)?;

    // Validate before touching the provider, so bad input never needs an API key.
    let request = ExpansionRequest::new(&input, settings.expansion.max_transcript_chars)?;
    let expander = Expander::from_settings(settings)?;

    let expansion = expander.expand(request.transcript());
    let result = match options.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), expansion)
            .await
            .map_err(|_| anyhow::anyhow!("Idea expansion timed out after {}s", secs))??,
        None => expansion.await?,
    };

    let saved = if options.no_save {
        None
    } else {
        let mut idea = Idea::from_expansion(request.transcript().to_string(), result.clone());
        for tag in &options.tags {
            idea.add_tag(tag);
        }
        let db = Database::open(settings)?;
        db.insert_idea(&idea)?;
        Some(idea)
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_expansion(&result);
        if let Some(idea) = &saved {
            println!();
            println!("Saved as {}", short_id(&idea.id));
        }
    }

    Ok(())
}

fn read_transcript(transcript: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = transcript {
        if text != "-" {
            return Ok(text);
        }
    }

    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript file: {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read transcript from stdin")?;
    Ok(text)
}

/// Run the callable server
pub async fn serve(settings: &Settings, bind: Option<String>) -> Result<()> {
    crate::server::serve(settings, bind.as_deref()).await
}

/// List saved ideas
pub fn list_ideas(
    settings: &Settings,
    limit: usize,
    search: Option<String>,
    favorites: bool,
) -> Result<()> {
    let db = Database::open(settings)?;

    let ideas = if let Some(query) = search {
        db.search_ideas(&query, limit, favorites)?
    } else {
        db.list_ideas(limit, favorites)?
    };

    if ideas.is_empty() {
        println!("No ideas found");
        return Ok(());
    }

    println!(
        "{:<10} {:<36} {:<12} {:<10}",
        "ID", "Title", "Date", "Status"
    );
    println!("{}", "-".repeat(70));

    for idea in ideas {
        let star = if idea.is_favorite { "*" } else { " " };
        println!(
            "{:<10} {}{:<35} {:<12} {:<10}",
            short_id(&idea.id),
            star,
            truncate(&idea.display_title(), 33),
            idea.created_at.with_timezone(&Local).format("%Y-%m-%d"),
            idea.status.as_str()
        );
    }

    Ok(())
}

/// View a saved idea
pub fn view_idea(settings: &Settings, id: &str, json: bool) -> Result<()> {
    let db = Database::open(settings)?;
    let idea = find_idea(&db, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&idea)?);
        return Ok(());
    }

    println!("Title: {}", idea.display_title());
    println!(
        "Date: {}",
        idea.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!("Status: {}", idea.status.as_str());
    if idea.is_favorite {
        println!("Favorite: yes");
    }
    if !idea.tags.is_empty() {
        println!("Tags: {}", idea.tags.join(", "));
    }
    println!();
    println!("Transcript:");
    println!("{}", idea.transcript);

    if idea.sections.is_empty() {
        println!();
        println!("(No expansion available)");
        return Ok(());
    }

    for (i, section) in idea.sections.iter().enumerate() {
        println!();
        println!("[{}] {}", i + 1, section.section_title);
        println!("{}", section.content);
    }

    Ok(())
}

/// Full-text search through idea sections
pub fn search_sections(settings: &Settings, query: &str) -> Result<()> {
    let db = Database::open(settings)?;

    let results = db.search_sections(query, 20)?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} results for: {}", results.len(), query);
    println!();

    let mut current_idea_id = String::new();

    for (idea, section) in results {
        if idea.id != current_idea_id {
            if !current_idea_id.is_empty() {
                println!();
            }
            println!("== {} ({}) ==", idea.display_title(), short_id(&idea.id));
            current_idea_id = idea.id.clone();
        }

        println!(
            "  [{}] {}",
            section.section_title,
            truncate(&first_line(&section.content), 80)
        );
    }

    Ok(())
}

/// Edit an idea's title and/or one section
pub fn edit_idea(
    settings: &Settings,
    id: &str,
    title: Option<String>,
    section: Option<usize>,
    content: Option<String>,
) -> Result<()> {
    if title.is_none() && section.is_none() {
        anyhow::bail!("Nothing to edit. Pass --title and/or --section with --content.");
    }

    let db = Database::open(settings)?;
    let mut idea = find_idea(&db, id)?;

    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() {
            anyhow::bail!("Title must not be empty");
        }
        idea.title = Some(title.to_string());
        db.update_idea(&idea)?;
        println!("Title updated: {}", title);
    }

    if let (Some(number), Some(content)) = (section, content) {
        if number == 0 || !db.update_section_content(&idea.id, number - 1, &content)? {
            anyhow::bail!(
                "Idea {} has no section {} (it has {})",
                short_id(&idea.id),
                number,
                idea.sections.len()
            );
        }
        println!("Section {} updated", number);
    }

    Ok(())
}

/// Add or remove tags
pub fn tag_idea(settings: &Settings, id: &str, tags: &[String], remove: bool) -> Result<()> {
    let db = Database::open(settings)?;
    let mut idea = find_idea(&db, id)?;

    for tag in tags {
        if remove {
            idea.remove_tag(tag);
        } else {
            idea.add_tag(tag);
        }
    }

    db.update_idea(&idea)?;

    if idea.tags.is_empty() {
        println!("{} has no tags", short_id(&idea.id));
    } else {
        println!("{} tags: {}", short_id(&idea.id), idea.tags.join(", "));
    }

    Ok(())
}

/// Toggle the favorite flag
pub fn toggle_favorite(settings: &Settings, id: &str) -> Result<()> {
    let db = Database::open(settings)?;
    let mut idea = find_idea(&db, id)?;

    idea.is_favorite = !idea.is_favorite;
    db.update_idea(&idea)?;

    if idea.is_favorite {
        println!("Marked {} as favorite", short_id(&idea.id));
    } else {
        println!("Removed {} from favorites", short_id(&idea.id));
    }

    Ok(())
}

/// Delete an idea
pub fn delete_idea(settings: &Settings, id: &str) -> Result<()> {
    let db = Database::open(settings)?;
    let idea = find_idea(&db, id)?;

    db.delete_idea(&idea.id)?;
    println!("Deleted {} ({})", idea.display_title(), short_id(&idea.id));

    Ok(())
}

/// Export an idea to a file
pub fn export_idea(
    settings: &Settings,
    id: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let db = Database::open(settings)?;
    let idea = find_idea(&db, id)?;

    let content = match format {
        ExportFormat::Md => export_as_markdown(&idea),
        ExportFormat::Json => serde_json::to_string_pretty(&idea)? + "\n",
    };

    if let Some(path) = output {
        std::fs::write(&path, content)?;
        println!("Exported to: {}", path.display());
    } else {
        print!("{}", content);
    }

    Ok(())
}

/// Print the configured section catalog
pub fn show_sections(settings: &Settings) -> Result<()> {
    let catalog = settings.expansion.catalog()?;

    for (i, section) in catalog.iter().enumerate() {
        println!("{}. {} ({})", i + 1, section.title, section.key);
        println!("   {}", section.instruction);
    }

    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(&settings.redacted())?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

// Helper functions

fn find_idea(db: &Database, id: &str) -> Result<Idea> {
    let id = id.trim();
    if id.is_empty() {
        anyhow::bail!("Idea ID must not be empty");
    }
    db.find_idea_by_prefix(id)?.context("Idea not found")
}

fn print_expansion(result: &ExpansionResult) {
    println!("{}", result.title);
    println!("{}", "=".repeat(result.title.chars().count().max(3)));

    for expansion in &result.expansions {
        println!();
        println!("## {}", expansion.section_title);
        println!("{}", expansion.content);
    }
}

fn export_as_markdown(idea: &Idea) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", idea.display_title()));
    output.push_str(&format!(
        "_{}_",
        idea.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    ));
    if !idea.tags.is_empty() {
        output.push_str(&format!(" · {}", idea.tags.join(", ")));
    }
    output.push_str("\n\n");

    output.push_str("## Transcript\n\n");
    output.push_str(&format!("> {}\n", idea.transcript.replace('\n', "\n> ")));

    if idea.status != IdeaStatus::Complete {
        output.push_str(&format!("\n_Status: {}_\n", idea.status.as_str()));
    }

    for section in &idea.sections {
        output.push_str(&format!(
            "\n## {}\n\n{}\n",
            section.section_title, section.content
        ));
    }

    output
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn first_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
