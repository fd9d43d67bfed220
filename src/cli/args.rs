//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// ideaspot - Expand spoken ideas into structured notes
#[derive(Parser, Debug)]
#[command(name = "ideaspot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a transcript into a titled set of sections
    Expand {
        /// Transcript text (reads stdin when omitted)
        transcript: Option<String>,

        /// Read the transcript from a file
        #[arg(short, long, conflicts_with = "transcript")]
        file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Do not save the result to the idea library
        #[arg(long)]
        no_save: bool,

        /// Tag to attach to the saved idea (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Serve the expandIdea callable endpoint
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List saved ideas
    List {
        /// Maximum number of ideas to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Filter by title or transcript
        #[arg(short, long)]
        search: Option<String>,

        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },

    /// View a saved idea
    View {
        /// Idea ID or partial ID
        id: String,

        /// Print the idea as JSON
        #[arg(long)]
        json: bool,
    },

    /// Full-text search through idea sections
    Search {
        /// Search query (FTS5 syntax)
        query: String,
    },

    /// Edit an idea's title or one of its sections
    Edit {
        /// Idea ID or partial ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Section number to replace (as shown by `view`)
        #[arg(long, requires = "content")]
        section: Option<usize>,

        /// New content for --section
        #[arg(long, requires = "section")]
        content: Option<String>,
    },

    /// Add or remove tags
    Tag {
        /// Idea ID or partial ID
        id: String,

        /// Tags to add (or remove with --remove)
        #[arg(required = true)]
        tags: Vec<String>,

        /// Remove the given tags instead of adding them
        #[arg(short, long)]
        remove: bool,
    },

    /// Toggle the favorite flag on an idea
    Favorite {
        /// Idea ID or partial ID
        id: String,
    },

    /// Delete an idea
    Delete {
        /// Idea ID or partial ID
        id: String,
    },

    /// Export an idea to a file
    Export {
        /// Idea ID or partial ID
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Md)]
        format: ExportFormat,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the configured section catalog
    Sections,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Md,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration (API key masked)
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn expand_collects_repeated_tags() {
        let cli = Cli::parse_from(["ideaspot", "expand", "an idea", "-t", "App", "--tag", "Voice"]);
        match cli.command {
            Commands::Expand { transcript, tags, .. } => {
                assert_eq!(transcript.as_deref(), Some("an idea"));
                assert_eq!(tags, ["App", "Voice"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn edit_section_requires_content() {
        let err = Cli::try_parse_from(["ideaspot", "edit", "abcd", "--section", "2"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
