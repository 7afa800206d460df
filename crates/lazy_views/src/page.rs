//! One page worth of lazy views: ties the scanner, fetch, dispatch and
//! replacement engine to a document and its settings store.
use std::sync::mpsc::Sender;
use std::time::Instant;

use bus::{CoreCommand, CoreEvent};
use core_types::RequestId;
use html::Document;

use crate::SUCCESS_STATUS;
use crate::command::Command;
use crate::config::LazyViewsConfig;
use crate::dispatch::{CommandRegistry, DispatchContext, DispatchReport};
use crate::error::LazyViewsError;
use crate::fetch::FetchCoordinator;
use crate::host::PageHost;
use crate::query::extract_query;
use crate::replace::ReplacementEngine;
use crate::scanner::{ClaimSet, PlaceholderScanner};
use crate::settings::Settings;

pub struct LazyViews<H: PageHost> {
    config: LazyViewsConfig,
    document: Document,
    settings: Settings,
    location: String,
    scanner: PlaceholderScanner,
    claims: ClaimSet,
    fetch: FetchCoordinator,
    registry: CommandRegistry,
    engine: ReplacementEngine,
    host: H,
}

impl<H: PageHost> LazyViews<H> {
    pub fn new(
        config: LazyViewsConfig,
        document: Document,
        settings: Settings,
        location: impl Into<String>,
        cmd_tx: Sender<CoreCommand>,
        host: H,
    ) -> Result<Self, LazyViewsError> {
        let scanner = PlaceholderScanner::new(&config)?;
        let fetch = FetchCoordinator::new(config.endpoint_url()?, cmd_tx);
        let engine = ReplacementEngine::new(config.fade_timings());
        Ok(Self {
            config,
            document,
            settings,
            location: location.into(),
            scanner,
            claims: ClaimSet::new(),
            fetch,
            registry: CommandRegistry::with_defaults(),
            engine,
            host,
        })
    }

    /// Scans for unclaimed placeholders and requests them in one batch.
    pub fn attach(&mut self) -> Result<Option<RequestId>, LazyViewsError> {
        let ids = self
            .scanner
            .scan(&mut self.document, &mut self.claims, &mut self.host);
        self.fetch
            .request(ids, extract_query(&self.location), &self.settings)
    }

    /// Handles one network event. Errors leave the placeholders spinning.
    pub fn on_event(
        &mut self,
        event: CoreEvent,
        now: Instant,
    ) -> Result<DispatchReport, LazyViewsError> {
        let (_, commands) = self.fetch.complete(event)?;
        Ok(self.apply_commands(&commands, now))
    }

    pub fn apply_commands(&mut self, commands: &[Command], now: Instant) -> DispatchReport {
        let mut ctx = DispatchContext {
            document: &mut self.document,
            settings: &mut self.settings,
            engine: &mut self.engine,
            now,
        };
        self.registry
            .dispatch(commands, SUCCESS_STATUS, &mut ctx, &self.host)
    }

    /// Advances running transitions. Settled fragments may carry placeholders
    /// of their own, so finishing any transition triggers another attach pass.
    pub fn tick(&mut self, now: Instant) -> Result<usize, LazyViewsError> {
        let settled = self.engine.tick(now, &mut self.document, &mut self.host);
        if settled > 0 {
            self.attach()?;
        }
        Ok(settled)
    }

    /// No request pending and no transition running.
    pub fn is_idle(&self) -> bool {
        self.fetch.pending() == 0 && self.engine.is_idle()
    }

    pub fn pending_requests(&self) -> usize {
        self.fetch.pending()
    }

    pub fn config(&self) -> &LazyViewsConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}
