//! CLI runner - executes commands

use crate::browser::HttpBrowserFactory;
use crate::cli::commands::{Cli, Commands};
use crate::config::RunConfig;
use crate::crawl::{Crawler, ListingReport, ProfileReport};
use crate::error::{Error, Result, ResultExt};
use crate::extract::{Record, SellerProfile};
use crate::loader::{load_site, SiteDefinition};
use crate::partition::{CsvColumnSource, ListSource, Target, TargetSource};
use crate::sink::open_sink;
use crate::sites::list_builtin_info;
use crate::types::OutputFormat;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Column of the listing output that holds seller names
const SELLER_COLUMN: &str = "seller";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Categories {
                categories,
                listing,
            } => {
                let (site, config) = self.prepare()?;
                let crawler = self.crawler(site, &config)?;
                self.categories(&crawler, &config, categories, listing.as_deref())
                    .await
            }
            Commands::Profiles { sellers, from } => {
                let (site, config) = self.prepare()?;
                let crawler = self.crawler(site, &config)?;
                self.profiles(&crawler, &config, sellers, from.as_deref())
                    .await
            }
            Commands::All { categories } => {
                let (site, config) = self.prepare()?;
                let crawler = self.crawler(site, &config)?;
                self.categories(&crawler, &config, categories, None).await?;
                if crawler.is_cancelled() {
                    return Ok(());
                }
                self.profiles(&crawler, &config, &[], None).await
            }
            Commands::Validate => self.validate(),
            Commands::List => {
                self.list_sites();
                Ok(())
            }
        }
    }

    /// Load the site definition and the run config
    fn prepare(&self) -> Result<(SiteDefinition, RunConfig)> {
        let site = load_site(&self.cli.site)?;
        let config = match &self.cli.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        }
        .with_overrides(self.cli.overrides())?;

        info!(
            "Site '{}' v{}: output to {} as {:?}, {} workers",
            site.name,
            site.version,
            config.output_dir.display(),
            config.format,
            config.workers
        );
        Ok((site, config))
    }

    /// Build a crawler over HTTP sessions, stopped by Ctrl-C
    fn crawler(&self, site: SiteDefinition, config: &RunConfig) -> Result<Crawler> {
        let factory = Arc::new(HttpBrowserFactory::new(site.browser_config()));
        let crawler = Crawler::new(site, factory)
            .with_options(config.crawl_options())
            .with_state(config.state_manager()?);
        watch_interrupt(crawler.cancel_flag());
        Ok(crawler)
    }

    /// Crawl category listings, one output file per listing
    async fn categories(
        &self,
        crawler: &Crawler,
        config: &RunConfig,
        categories: &[String],
        listing: Option<&str>,
    ) -> Result<()> {
        let listings = match listing {
            Some(name) => {
                let def = crawler
                    .site()
                    .listing(name)
                    .ok_or_else(|| Error::config(format!("Unknown listing '{name}'")))?;
                if def.locator.is_none() {
                    return Err(Error::config(format!(
                        "Listing '{name}' is only crawled as part of profiles"
                    )));
                }
                vec![def]
            }
            None => crawler.site().category_listings(),
        };

        for def in listings {
            if crawler.is_cancelled() {
                break;
            }
            let path = config.output_path(&def.name);
            let targets = crawler.listing_targets(def, categories);
            let sink = open_sink::<Record>(config.format, &path)
                .with_context(|| format!("Opening {}", path.display()))?;

            let report = crawler.crawl_listing(&def.name, targets, Some(sink)).await?;
            log_listing_report(&report, &path);
        }

        self.finish(crawler).await
    }

    /// Crawl seller profiles into `profiles.<ext>`
    async fn profiles(
        &self,
        crawler: &Crawler,
        config: &RunConfig,
        sellers: &[String],
        from: Option<&Path>,
    ) -> Result<()> {
        let targets = seller_targets(crawler.site(), config, sellers, from)?;
        let path = config.output_path("profiles");
        let sink = open_sink::<SellerProfile>(config.format, &path)
            .with_context(|| format!("Opening {}", path.display()))?;

        let report = crawler.crawl_profiles(targets, Some(sink)).await?;
        log_profile_report(&report, &path);

        self.finish(crawler).await
    }

    async fn finish(&self, crawler: &Crawler) -> Result<()> {
        if !crawler.state().is_in_memory() {
            crawler
                .state()
                .save()
                .await
                .context("Saving the state file")?;
        }
        if crawler.is_cancelled() {
            warn!("Interrupted; completed targets are kept and skipped on the next run with the same state file");
        }
        Ok(())
    }

    /// Validate site definition
    fn validate(&self) -> Result<()> {
        let site = load_site(&self.cli.site)?;

        println!(
            "Site '{}' v{} is valid with {} listings: {}",
            site.name,
            site.version,
            site.listings.len(),
            site.listing_names().join(", ")
        );
        if let Some(profile) = &site.profile {
            println!("Profile: {} ({})", profile.locator, profile.listing_refs().join(", "));
        }

        Ok(())
    }

    /// List built-in sites
    fn list_sites(&self) {
        for info in list_builtin_info() {
            println!("{:<12} {:<24} {}", info.name, info.url, info.description);
        }
    }
}

/// Sellers to crawl: given names, else a seller column of a CSV file
fn seller_targets(
    site: &SiteDefinition,
    config: &RunConfig,
    sellers: &[String],
    from: Option<&Path>,
) -> Result<Vec<Target>> {
    let profile = site
        .profile
        .as_ref()
        .ok_or_else(|| Error::config(format!("Site '{}' has no profile", site.name)))?;

    if !sellers.is_empty() {
        return ListSource::new(sellers, &profile.variable).targets();
    }

    let path: PathBuf = match (from, &profile.sellers_from) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(listing)) if config.format == OutputFormat::Csv => {
            config.output_path(listing)
        }
        (None, Some(listing)) => {
            return Err(Error::config(format!(
                "Sellers are read from the '{listing}' CSV output; use --from with a CSV file when the format is {:?}",
                config.format
            )))
        }
        (None, None) => {
            return Err(Error::config(
                "No sellers given; use --seller or --from",
            ))
        }
    };

    let targets = CsvColumnSource::new(&path, SELLER_COLUMN, &profile.variable).targets()?;
    info!("{} sellers from {}", targets.len(), path.display());
    Ok(targets)
}

/// Raise `flag` on Ctrl-C
fn watch_interrupt(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current pages");
            flag.store(true, Ordering::Relaxed);
        }
    });
}

fn log_listing_report(report: &ListingReport, path: &Path) {
    for target in report.targets.iter().filter(|t| t.is_failure()) {
        warn!(
            "{} {}: {}",
            report.listing,
            target.target,
            target.error.as_deref().unwrap_or("start page failed")
        );
    }
    info!(
        "{}: {} records -> {} ({} targets, {} failed, {} skipped, {} duplicates)",
        report.listing,
        report.records.len(),
        path.display(),
        report.targets.len(),
        report.failures(),
        report.skipped.len(),
        report.duplicates
    );
}

fn log_profile_report(report: &ProfileReport, path: &Path) {
    for target in report.targets.iter().filter(|t| t.is_failure()) {
        warn!(
            "profile {}: {}",
            target.target,
            target.error.as_deref().unwrap_or("failed")
        );
    }
    info!(
        "profiles: {} -> {} ({} failed, {} skipped)",
        report.profiles.len(),
        path.display(),
        report.failures(),
        report.skipped.len()
    );
}
