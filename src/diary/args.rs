use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "diary", version)]
#[command(about = "A personal diary: dated entries, grouped by day", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log debug output to stderr (DIARY_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an entry
    #[command(alias = "a")]
    Add {
        /// Entry text; read from stdin when omitted or "-"
        content: Option<String>,

        /// Image reference stored with the entry
        #[arg(long)]
        image: Option<String>,

        /// When the entry happened (e.g. "2024-01-02 18:30"), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// List entries grouped by day, newest first
    #[command(alias = "ls")]
    List {
        /// Days to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Days to show (defaults to the page-size setting)
        #[arg(short = 'n', long, value_parser = parse_limit)]
        limit: Option<usize>,
    },

    /// Show the days containing a term in an entry or its date
    #[command(alias = "s")]
    Search {
        term: String,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(short = 'n', long, value_parser = parse_limit)]
        limit: Option<usize>,
    },

    /// Print one or more entries in full
    #[command(alias = "v")]
    Show {
        /// Entry ids or unique id prefixes
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Change an entry
    #[command(alias = "e")]
    Edit {
        /// Entry id or unique id prefix
        id: String,

        /// New text; "-" reads stdin
        #[arg(long)]
        content: Option<String>,

        /// New image reference
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,

        /// Remove the image
        #[arg(long)]
        clear_image: bool,

        /// Move the entry to another time
        #[arg(long)]
        at: Option<String>,
    },

    /// Delete one or more entries
    #[command(alias = "rm")]
    Delete {
        /// Entry ids or unique id prefixes
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (timezone, intra-day-order, page-size, data-file)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

fn parse_limit(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_edit_flags() {
        let cli = Cli::parse_from(["diary", "edit", "ab12", "--clear-image", "--at", "2024-01-03"]);
        match cli.command {
            Some(Commands::Edit {
                id,
                clear_image,
                at,
                image,
                ..
            }) => {
                assert_eq!(id, "ab12");
                assert!(clear_image);
                assert_eq!(at.as_deref(), Some("2024-01-03"));
                assert!(image.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn image_and_clear_image_conflict() {
        let parsed =
            Cli::try_parse_from(["diary", "edit", "ab12", "--image", "x.png", "--clear-image"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn rm_is_delete() {
        let cli = Cli::parse_from(["diary", "rm", "a", "b"]);
        assert!(matches!(cli.command, Some(Commands::Delete { ids }) if ids.len() == 2));
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(Cli::try_parse_from(["diary", "list", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["diary", "search", "dog", "--limit", "0"]).is_err());

        let cli = Cli::parse_from(["diary", "list", "-n", "2"]);
        assert!(matches!(cli.command, Some(Commands::List { limit: Some(2), .. })));
    }
}
