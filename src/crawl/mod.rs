//! Crawl orchestration module
//!
//! Drives the extraction engine over many targets of a site definition.
//!
//! # Overview
//!
//! The crawl module provides:
//! - `Crawler` - Category listings and seller profiles over a site definition
//! - `CrawlOptions` - Workers, limits and overrides for one run
//! - `ListingReport` / `ProfileReport` - Merged results and per-target status
//!
//! Every target gets its own browser session from the [`BrowserFactory`],
//! closed on every exit path. Targets are split into contiguous chunks, one
//! tokio task per chunk, and merged back in target order. A target that
//! fails is logged and reported; a sink failure stops the whole crawl.

mod types;
mod workers;

pub use types::{CrawlOptions, ListingReport, ProfileReport, TargetReport, PROFILE_JOB};
pub use workers::{run_partitioned, TargetRun};

use crate::browser::{Browser, BrowserFactory};
use crate::engine::{CrawlOutcome, ExtractionEngine, TerminationReason};
use crate::error::{Error, Result};
use crate::extract::{PageExtractor, ProfileExtractor, Record, SellerProfile};
use crate::loader::{
    build_advancer, build_extractor, build_profile_extractor, ListingDefinition,
    ProfileDefinition, SiteDefinition,
};
use crate::pagination::{Advancer, CancellableAdvancer};
use crate::partition::Target;
use crate::sink::{CheckpointSink, DedupSink, SharedSink};
use crate::state::StateManager;
use crate::template::{self, TemplateContext};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

// ============================================================================
// Compiled listing
// ============================================================================

/// A listing definition with its extractor and advancer built
struct CompiledListing {
    def: ListingDefinition,
    extractor: Box<dyn PageExtractor>,
    advancer: CancellableAdvancer<Box<dyn Advancer>>,
    engine: ExtractionEngine,
}

impl CompiledListing {
    fn new(def: &ListingDefinition, options: &CrawlOptions, cancelled: &Arc<AtomicBool>) -> Result<Self> {
        Ok(Self {
            extractor: build_extractor(def)?,
            advancer: CancellableAdvancer::new(
                build_advancer(def.pagination.as_ref()),
                Arc::clone(cancelled),
            ),
            engine: ExtractionEngine::new(options.engine_config(def)),
            def: def.clone(),
        })
    }

    async fn run(
        &self,
        browser: &mut dyn Browser,
        start: &str,
        sink: Option<&mut dyn CheckpointSink<Record>>,
    ) -> Result<CrawlOutcome<Record>> {
        self.engine
            .run(browser, start, self.extractor.as_ref(), &self.advancer, sink)
            .await
    }

    /// Run a listing that belongs to a profile page.
    ///
    /// Listings without a locator of their own live on the profile page:
    /// they continue from the current page while it is still the profile,
    /// and reload `profile_url` otherwise.
    async fn run_embedded(
        &self,
        browser: &mut dyn Browser,
        ctx: &TemplateContext,
        profile_url: &str,
        on_profile: bool,
    ) -> Result<CrawlOutcome<Record>> {
        match &self.def.locator {
            Some(locator) => {
                let start = template::render(locator, ctx)?;
                self.run(browser, &start, None).await
            }
            None if on_profile => {
                self.engine
                    .run_loaded(browser, self.extractor.as_ref(), &self.advancer, None)
                    .await
            }
            None => self.run(browser, profile_url, None).await,
        }
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// Everything a worker needs to crawl targets of one listing
struct ListingJob {
    listing: CompiledListing,
    context: TemplateContext,
    factory: Arc<dyn BrowserFactory>,
    state: StateManager,
    cancelled: Arc<AtomicBool>,
}

impl ListingJob {
    async fn crawl_target(
        &self,
        target: &Target,
        mut sink: Option<SharedSink<Record>>,
    ) -> Result<CrawlOutcome<Record>> {
        let locator = self.listing.def.locator.as_deref().ok_or_else(|| {
            Error::config(format!("Listing '{}' has no locator", self.listing.def.name))
        })?;
        let start = template::render(locator, &self.context.clone().with_target(target))?;

        let mut browser = self.factory.launch().await?;
        let result = self
            .listing
            .run(
                browser.as_mut(),
                &start,
                sink.as_mut().map(|s| s as &mut dyn CheckpointSink<Record>),
            )
            .await;
        close_session(browser.as_mut(), &target.id).await;
        let outcome = result?;

        if outcome.reason != TerminationReason::StartFailed && !self.is_cancelled() {
            self.state
                .mark_completed(
                    &self.listing.def.name,
                    &target.id,
                    outcome.len(),
                    outcome.pages_visited,
                )
                .await?;
        }
        Ok(outcome)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Everything a worker needs to crawl seller profiles
struct ProfileJob {
    profile: ProfileDefinition,
    fields: ProfileExtractor,
    reviews: Option<CompiledListing>,
    services: Option<CompiledListing>,
    context: TemplateContext,
    factory: Arc<dyn BrowserFactory>,
    state: StateManager,
    cancelled: Arc<AtomicBool>,
}

impl ProfileJob {
    async fn crawl_target(
        &self,
        target: &Target,
        sink: Option<SharedSink<SellerProfile>>,
    ) -> Result<(SellerProfile, u32)> {
        let ctx = self.context.clone().with_target(target);
        let profile_url = template::render(&self.profile.locator, &ctx)?;

        let mut browser = self.factory.launch().await?;
        let result = self
            .read_profile(browser.as_mut(), &ctx, target, &profile_url)
            .await;
        close_session(browser.as_mut(), &target.id).await;
        let (profile, pages) = result?;

        if let Some(mut sink) = sink {
            sink.write_batch(std::slice::from_ref(&profile))
                .map_err(|e| {
                    if e.is_data_loss() {
                        e
                    } else {
                        Error::sink(format!("profile write failed: {e}"))
                    }
                })?;
        }

        if !self.cancelled.load(Ordering::Relaxed) {
            self.state
                .mark_completed(
                    PROFILE_JOB,
                    &target.id,
                    profile.reviews.len() + profile.services.len(),
                    pages,
                )
                .await?;
        }
        Ok((profile, pages))
    }

    /// Profile fields, then reviews, then services; returns the profile and
    /// the number of pages read
    async fn read_profile(
        &self,
        browser: &mut dyn Browser,
        ctx: &TemplateContext,
        target: &Target,
        profile_url: &str,
    ) -> Result<(SellerProfile, u32)> {
        browser.navigate(profile_url).await?;
        let page = browser.current_page().await?;

        let seller = target
            .get(&self.profile.variable)
            .unwrap_or(target.id.as_str());
        let mut profile = SellerProfile::new(seller, profile_url);
        profile.fields = self.fields.extract(&page);
        let mut pages = 1;
        let mut on_profile = true;

        if let Some(reviews) = &self.reviews {
            let outcome = reviews
                .run_embedded(browser, ctx, profile_url, on_profile)
                .await?;
            info!("{seller}: {} reviews ({})", outcome.len(), outcome.reason);
            pages += outcome.pages_visited;
            profile.reviews = outcome.records;
            on_profile = false;
        }

        if let Some(services) = &self.services {
            let outcome = services
                .run_embedded(browser, ctx, profile_url, on_profile)
                .await?;
            info!("{seller}: {} services ({})", outcome.len(), outcome.reason);
            pages += outcome.pages_visited;
            profile.services = outcome.records;
        }

        Ok((profile, pages))
    }
}

async fn close_session(browser: &mut dyn Browser, target: &str) {
    if let Err(e) = browser.close().await {
        warn!("Closing the session of {target} failed: {e}");
    }
}

// ============================================================================
// Crawler
// ============================================================================

/// Crawls the listings and profiles of one site definition
pub struct Crawler {
    site: Arc<SiteDefinition>,
    factory: Arc<dyn BrowserFactory>,
    options: CrawlOptions,
    state: StateManager,
    cancelled: Arc<AtomicBool>,
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("site", &self.site.name)
            .field("options", &self.options)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Crawler {
    /// Create a crawler with default options and in-memory state
    pub fn new(site: SiteDefinition, factory: Arc<dyn BrowserFactory>) -> Self {
        Self {
            site: Arc::new(site),
            factory,
            options: CrawlOptions::default(),
            state: StateManager::in_memory(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the run options
    #[must_use]
    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    /// Track completed targets in `state`
    #[must_use]
    pub fn with_state(mut self, state: StateManager) -> Self {
        self.state = state;
        self
    }

    /// The site definition
    pub fn site(&self) -> &SiteDefinition {
        &self.site
    }

    /// The run options
    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// The resume state
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Flag that stops pagination and pending targets once raised
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Site values available to every locator
    pub fn site_context(&self) -> TemplateContext {
        TemplateContext::new()
            .with_site("base_url", self.site.base_url.trim_end_matches('/'))
            .with_site("name", &self.site.name)
    }

    /// Targets of a listing: `values` when given, else the listing's defaults
    pub fn listing_targets(&self, listing: &ListingDefinition, values: &[String]) -> Vec<Target> {
        let values = if values.is_empty() {
            &listing.targets
        } else {
            values
        };

        match &listing.variable {
            Some(variable) => values
                .iter()
                .map(|value| Target::bound(variable, value))
                .collect(),
            None => vec![Target::new(&listing.name)],
        }
    }

    /// Crawl one listing over `targets`.
    ///
    /// Records stream into `sink` in checkpoint batches as the targets run;
    /// the sink is finished before returning. Targets the state marks as
    /// completed are skipped.
    pub async fn crawl_listing(
        &self,
        name: &str,
        targets: Vec<Target>,
        sink: Option<Box<dyn CheckpointSink<Record>>>,
    ) -> Result<ListingReport> {
        let started = Instant::now();
        let def = self
            .site
            .listing(name)
            .ok_or_else(|| Error::config(format!("Unknown listing '{name}'")))?;
        let dedup = self.options.dedup_for(def);

        let (pending, skipped) = self.pending(name, targets).await;
        info!(
            "Crawling {name}: {} targets ({} already done), {} workers",
            pending.len(),
            skipped.len(),
            self.options.workers
        );

        let job = Arc::new(ListingJob {
            listing: CompiledListing::new(def, &self.options, &self.cancelled)?,
            context: self.site_context(),
            factory: Arc::clone(&self.factory),
            state: self.state.clone(),
            cancelled: Arc::clone(&self.cancelled),
        });
        let shared = sink.map(|sink| {
            if dedup {
                SharedSink::new(Box::new(DedupSink::new(sink)))
            } else {
                SharedSink::new(sink)
            }
        });

        let runs = {
            let shared = shared.clone();
            run_partitioned(
                pending,
                self.options.workers,
                Arc::clone(&self.cancelled),
                move |target| {
                    let job = Arc::clone(&job);
                    let sink = shared.clone();
                    async move { job.crawl_target(&target, sink).await }
                },
            )
            .await?
        };

        if let Some(mut sink) = shared {
            sink.finish()?;
        }

        let mut report = ListingReport {
            listing: name.to_string(),
            skipped,
            ..Default::default()
        };
        for run in runs {
            match run.result {
                Ok(outcome) => {
                    report.targets.push(TargetReport::finished(&run.target, &outcome));
                    report.records.extend(outcome.records);
                }
                Err(e) => report.targets.push(TargetReport::failed(&run.target, e)),
            }
        }

        if dedup {
            let before = report.records.len();
            let mut seen = HashSet::new();
            report.records.retain(|record| seen.insert(record.clone()));
            report.duplicates = before - report.records.len();
        }

        info!(
            "Finished {name}: {} records from {} targets ({} failed, {} duplicates) in {:?}",
            report.records.len(),
            report.targets.len(),
            report.failures(),
            report.duplicates,
            started.elapsed()
        );
        Ok(report)
    }

    /// Crawl seller profiles: fields, reviews, then services per seller.
    ///
    /// One row per seller goes to `sink` as soon as the seller is done.
    pub async fn crawl_profiles(
        &self,
        sellers: Vec<Target>,
        sink: Option<Box<dyn CheckpointSink<SellerProfile>>>,
    ) -> Result<ProfileReport> {
        let started = Instant::now();
        let profile = self
            .site
            .profile
            .as_ref()
            .ok_or_else(|| Error::config(format!("Site '{}' has no profile", self.site.name)))?;

        let compile = |name: &Option<String>| -> Result<Option<CompiledListing>> {
            name.as_deref()
                .map(|name| {
                    let def = self.site.listing(name).ok_or_else(|| {
                        Error::config(format!("Unknown listing '{name}'"))
                    })?;
                    CompiledListing::new(def, &self.options, &self.cancelled)
                })
                .transpose()
        };

        let (pending, skipped) = self.pending(PROFILE_JOB, sellers).await;
        info!(
            "Crawling {} profiles ({} already done), {} workers",
            pending.len(),
            skipped.len(),
            self.options.workers
        );

        let job = Arc::new(ProfileJob {
            fields: build_profile_extractor(profile)?,
            reviews: compile(&profile.reviews)?,
            services: compile(&profile.services)?,
            profile: profile.clone(),
            context: self.site_context(),
            factory: Arc::clone(&self.factory),
            state: self.state.clone(),
            cancelled: Arc::clone(&self.cancelled),
        });
        let shared = sink.map(SharedSink::new);

        let runs = {
            let shared = shared.clone();
            run_partitioned(
                pending,
                self.options.workers,
                Arc::clone(&self.cancelled),
                move |target| {
                    let job = Arc::clone(&job);
                    let sink = shared.clone();
                    async move { job.crawl_target(&target, sink).await }
                },
            )
            .await?
        };

        if let Some(mut sink) = shared {
            sink.finish()?;
        }

        let mut report = ProfileReport {
            skipped,
            ..Default::default()
        };
        for run in runs {
            match run.result {
                Ok((profile, pages)) => {
                    report.targets.push(TargetReport {
                        target: run.target.id.clone(),
                        pages,
                        records: profile.reviews.len() + profile.services.len(),
                        reason: None,
                        error: None,
                    });
                    report.profiles.push(profile);
                }
                Err(e) => report.targets.push(TargetReport::failed(&run.target, e)),
            }
        }

        info!(
            "Finished {} profiles ({} failed) in {:?}",
            report.profiles.len(),
            report.failures(),
            started.elapsed()
        );
        Ok(report)
    }

    /// Split `targets` into those still to do and the ids already completed
    async fn pending(&self, job: &str, targets: Vec<Target>) -> (Vec<Target>, Vec<String>) {
        let mut pending = Vec::with_capacity(targets.len());
        let mut skipped = Vec::new();
        for target in targets {
            if self.state.is_completed(job, &target.id).await {
                skipped.push(target.id);
            } else {
                pending.push(target);
            }
        }
        (pending, skipped)
    }
}
