//! CLI commands and argument parsing

use crate::config::RunOverrides;
use crate::types::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batch collector for marketplace listings, profiles and reviews
#[derive(Parser, Debug)]
#[command(name = "market-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site definition: built-in name or YAML file
    #[arg(long, global = true, default_value = "kmong")]
    pub site: String,

    /// Run configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Parallel workers, each with its own browser session
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Page limit per target
    #[arg(long, global = true)]
    pub max_pages: Option<u32>,

    /// Records per checkpoint batch
    #[arg(long, global = true)]
    pub checkpoint_every: Option<usize>,

    /// Page bound when no page limit is set
    #[arg(long, global = true)]
    pub safety_ceiling: Option<u32>,

    /// State file (JSON) for resumable runs
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Drop duplicate records
    #[arg(long, global = true)]
    pub dedup: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Run config values given as flags
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            output_dir: self.output_dir.clone(),
            format: self.format,
            workers: self.workers,
            checkpoint_every: self.checkpoint_every,
            max_pages: self.max_pages,
            safety_ceiling: self.safety_ceiling,
            state_file: self.state.clone(),
            dedup: self.dedup,
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl category listings
    Categories {
        /// Category ids (repeatable, empty = the site's defaults)
        #[arg(long = "category", value_delimiter = ',')]
        categories: Vec<String>,

        /// Listing to crawl (default: every category listing)
        #[arg(long)]
        listing: Option<String>,
    },

    /// Crawl seller profiles with their reviews and services
    Profiles {
        /// Seller names (repeatable)
        #[arg(long = "seller", value_delimiter = ',')]
        sellers: Vec<String>,

        /// CSV file with a `seller` column (default: the listing output)
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Crawl categories, then the profiles of every seller found
    All {
        /// Category ids (repeatable, empty = the site's defaults)
        #[arg(long = "category", value_delimiter = ',')]
        categories: Vec<String>,
    },

    /// Validate the site definition
    Validate,

    /// List built-in sites
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_categories_with_globals() {
        let cli = Cli::try_parse_from([
            "market-harvest",
            "categories",
            "--category",
            "661,663",
            "--category",
            "645",
            "-w",
            "3",
            "--format",
            "parquet",
            "--dedup",
        ])
        .unwrap();

        assert_eq!(cli.site, "kmong");
        match &cli.command {
            Commands::Categories {
                categories,
                listing,
            } => {
                assert_eq!(categories, &vec!["661", "663", "645"]);
                assert!(listing.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let overrides = cli.overrides();
        assert_eq!(overrides.workers, Some(3));
        assert_eq!(overrides.format, Some(OutputFormat::Parquet));
        assert!(overrides.dedup);
        assert_eq!(overrides.max_pages, None);
    }

    #[test]
    fn test_parse_profiles() {
        let cli = Cli::try_parse_from([
            "market-harvest",
            "--site",
            "sites/other.yaml",
            "profiles",
            "--seller",
            "alice",
            "--from",
            "sellers.csv",
        ])
        .unwrap();

        assert_eq!(cli.site, "sites/other.yaml");
        match cli.command {
            Commands::Profiles { sellers, from } => {
                assert_eq!(sellers, vec!["alice"]);
                assert_eq!(from, Some(PathBuf::from("sellers.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["market-harvest", "--format", "xml", "list"]).is_err());
    }
}
