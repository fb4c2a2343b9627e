pub mod backend;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use backend::http::HttpBackend;
use backend::traits::{Credentials, PortfolioBackend};
use log::{debug, info, warn};
use models::{
    analytics::Valuation,
    company::{Company, CompanyLookup},
    ids::CompanyId,
    investment::{InvestmentRecord, NewInvestment},
    portfolio::{GroupedInvestments, PortfolioSnapshot},
    settings::{Settings, MAX_QUOTE_TIMEOUT_SECS},
};
use services::{
    aggregation_service::AggregationService, position_service::PositionService,
    price_service::PriceService,
};
use std::sync::Arc;

use errors::CoreError;

/// Everything needed to value one investment set, detached from the
/// tracker so the price lookups can run while the tracker moves on.
///
/// The result is handed back through [`PortfolioTracker::apply_valuation`],
/// which drops it if the investment set changed in the meantime.
#[derive(Debug, Clone)]
pub struct ValuationRequest {
    pub generation: u64,
    pub grouped: GroupedInvestments,
    pub lookup: CompanyLookup,
}

impl ValuationRequest {
    /// Resolve every referenced ticker and value the lots.
    pub async fn run(&self, price_service: &PriceService) -> Valuation {
        price_service
            .reconcile_live_prices(&self.grouped, &self.lookup, self.generation)
            .await
    }
}

/// Main entry point for the stock portfolio core library.
/// Holds the session state and all services needed to operate on it.
#[must_use]
pub struct PortfolioTracker {
    settings: Settings,
    backend: Box<dyn PortfolioBackend>,
    price_service: Arc<PriceService>,
    aggregation_service: AggregationService,
    position_service: PositionService,
    credentials: Option<Credentials>,
    companies: Vec<Company>,
    investments: Vec<InvestmentRecord>,
    valuation: Option<Valuation>,
    /// Bumped on every change of the investment set.
    generation: u64,
    /// Set when a mutation was sent but the follow-up re-fetch failed.
    stale: bool,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("settings", &self.settings)
            .field("authenticated", &self.credentials.is_some())
            .field("companies", &self.companies.len())
            .field("investments", &self.investments.len())
            .field("generation", &self.generation)
            .field("valued", &self.valuation.is_some())
            .field("stale", &self.stale)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create a tracker talking to the configured backend over HTTP, with
    /// the default quote providers for the configured API keys.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let backend = HttpBackend::new(&settings.api_base_url)?;
        let price_service = PriceService::from_settings(&settings);
        Ok(Self::with_services(settings, Box::new(backend), price_service))
    }

    /// Create a tracker with an explicit backend and price service.
    pub fn with_services(
        settings: Settings,
        backend: Box<dyn PortfolioBackend>,
        price_service: PriceService,
    ) -> Self {
        Self {
            settings,
            backend,
            price_service: Arc::new(price_service),
            aggregation_service: AggregationService::new(),
            position_service: PositionService::new(),
            credentials: None,
            companies: Vec::new(),
            investments: Vec::new(),
            valuation: None,
            generation: 0,
            stale: false,
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Attach the bearer token used for every backend call.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Forget the token and every piece of user data loaded with it.
    pub fn clear_credentials(&mut self) {
        self.credentials = None;
        self.investments.clear();
        self.companies.clear();
        self.valuation = None;
        self.generation += 1;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    // ── Fetch & Value ───────────────────────────────────────────────

    /// Re-fetch companies and lots from the backend.
    ///
    /// State is only replaced once both lists arrived and every lot passed
    /// validation. The previous valuation is invalidated.
    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        let credentials = self.require_credentials()?;

        let (stocks, investments) = futures::join!(
            self.backend.list_stocks(&credentials),
            self.backend.list_investments(&credentials),
        );
        let stocks = self.note_auth(stocks)?;
        let investments = self.note_auth(investments)?;

        // Reject malformed lots before they reach any total.
        self.aggregation_service.group_investments(&investments)?;

        self.companies = stocks;
        self.set_investments(investments);
        self.stale = false;
        info!(
            "Loaded {} companies and {} investments (generation {})",
            self.companies.len(),
            self.investments.len(),
            self.generation
        );
        Ok(())
    }

    /// Detach a valuation request for the current investment set.
    pub fn begin_valuation(&self) -> Result<ValuationRequest, CoreError> {
        let grouped = self.aggregation_service.group_investments(&self.investments)?;
        Ok(ValuationRequest {
            generation: self.generation,
            grouped,
            lookup: CompanyLookup::new(&self.companies),
        })
    }

    /// Store a finished valuation. Returns `false` (and keeps the current
    /// state) when the valuation belongs to a superseded investment set.
    pub fn apply_valuation(&mut self, valuation: Valuation) -> bool {
        if valuation.generation != self.generation {
            debug!(
                "Discarding stale valuation (generation {} != {})",
                valuation.generation, self.generation
            );
            return false;
        }
        self.valuation = Some(valuation);
        true
    }

    /// Look up live prices for every held ticker and store the valuation.
    pub async fn refresh_live_values(&mut self) -> Result<bool, CoreError> {
        let request = self.begin_valuation()?;
        let price_service = Arc::clone(&self.price_service);
        let valuation = request.run(&price_service).await;
        Ok(self.apply_valuation(valuation))
    }

    /// Full cycle: fetch, then value.
    pub async fn reload(&mut self) -> Result<(), CoreError> {
        self.refresh().await?;
        self.refresh_live_values().await?;
        Ok(())
    }

    /// Aggregate the current state for display.
    pub fn snapshot(&self) -> Result<PortfolioSnapshot, CoreError> {
        self.aggregation_service.aggregate_with_valuation(
            &self.investments,
            &self.companies,
            self.valuation.as_ref(),
            self.generation,
        )
    }

    /// Lots grouped by company, for the edit view.
    pub fn grouped_investments(&self) -> Result<GroupedInvestments, CoreError> {
        self.aggregation_service.group_investments(&self.investments)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Add a new lot, then reload.
    pub async fn add_investment(
        &mut self,
        company: impl Into<CompanyId>,
        stock_unit: i64,
        base_price: f64,
    ) -> Result<InvestmentRecord, CoreError> {
        let credentials = self.require_credentials()?;
        let investment = NewInvestment::new(company, stock_unit, base_price);
        investment.validate()?;

        let result = self
            .position_service
            .add_investment(self.backend.as_ref(), &credentials, &investment)
            .await;
        let created = self.note_auth(result);

        if let Ok(record) = &created {
            let mut investments = self.investments.clone();
            investments.push(record.clone());
            self.set_investments(investments);
        }
        self.after_mutation(created).await
    }

    /// Replace a company's lots with a single lot, then reload.
    pub async fn edit_position(
        &mut self,
        company: &CompanyId,
        stock_unit: i64,
        base_price: f64,
    ) -> Result<InvestmentRecord, CoreError> {
        let credentials = self.require_credentials()?;
        let grouped = self.grouped_investments()?;

        let result = self
            .position_service
            .edit_position(
                self.backend.as_ref(),
                &credentials,
                &grouped,
                company,
                stock_unit,
                base_price,
            )
            .await;
        let edited = self.note_auth(result);

        if let Ok(record) = &edited {
            let mut investments: Vec<InvestmentRecord> = self
                .investments
                .iter()
                .filter(|i| &i.company != company)
                .cloned()
                .collect();
            investments.push(record.clone());
            self.set_investments(investments);
        }
        self.after_mutation(edited).await
    }

    /// Remove every lot of a company, then reload.
    /// Returns the number of lots deleted.
    pub async fn delete_position(&mut self, company: &CompanyId) -> Result<usize, CoreError> {
        let credentials = self.require_credentials()?;
        let grouped = self.grouped_investments()?;

        let result = self
            .position_service
            .delete_position(self.backend.as_ref(), &credentials, &grouped, company)
            .await;
        let deleted = self.note_auth(result);

        if deleted.is_ok() {
            let investments: Vec<InvestmentRecord> = self
                .investments
                .iter()
                .filter(|i| &i.company != company)
                .cloned()
                .collect();
            self.set_investments(investments);
        }
        self.after_mutation(deleted).await
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    #[must_use]
    pub fn investments(&self) -> &[InvestmentRecord] {
        &self.investments
    }

    /// Latest applied valuation, if it matches the current investment set.
    #[must_use]
    pub fn valuation(&self) -> Option<&Valuation> {
        self.valuation
            .as_ref()
            .filter(|v| v.generation == self.generation)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` when a mutation was sent (successfully or not) but the
    /// follow-up re-fetch failed, so the in-memory state may lag behind
    /// the backend.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Shared handle to the price service, for running a
    /// [`ValuationRequest`] outside the tracker.
    #[must_use]
    pub fn price_service(&self) -> Arc<PriceService> {
        Arc::clone(&self.price_service)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set an API key for a quote provider (e.g., "finnhub", "alphavantage").
    /// Rebuilds the provider registry so the new key takes effect immediately.
    pub fn set_api_key(&mut self, provider: String, key: String) {
        self.settings.api_keys.insert(provider, key);
        self.rebuild_price_service();
    }

    /// Remove an API key for a quote provider.
    pub fn remove_api_key(&mut self, provider: &str) -> bool {
        let removed = self.settings.api_keys.remove(provider).is_some();
        if removed {
            self.rebuild_price_service();
        }
        removed
    }

    /// Change the per-provider quote timeout (1..=120 seconds).
    pub fn set_quote_timeout_secs(&mut self, secs: u64) -> Result<(), CoreError> {
        if secs == 0 || secs > MAX_QUOTE_TIMEOUT_SECS {
            return Err(CoreError::ValidationError(format!(
                "Quote timeout must be between 1 and {MAX_QUOTE_TIMEOUT_SECS} seconds, got {secs}"
            )));
        }
        self.settings.quote_timeout_secs = secs;
        self.rebuild_price_service();
        Ok(())
    }

    /// Names of the configured quote providers, in priority order.
    #[must_use]
    pub fn get_provider_names(&self) -> Vec<String> {
        self.price_service.get_provider_names()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn require_credentials(&self) -> Result<Credentials, CoreError> {
        self.credentials.clone().ok_or(CoreError::NotAuthenticated)
    }

    /// An expired session invalidates the stored token.
    fn note_auth<T>(&mut self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(CoreError::Unauthorized) = &result {
            warn!("Backend rejected credentials; clearing session");
            self.clear_credentials();
        }
        result
    }

    fn set_investments(&mut self, investments: Vec<InvestmentRecord>) {
        self.investments = investments;
        self.valuation = None;
        self.generation += 1;
    }

    /// Re-sync with the backend after a mutation, whatever its outcome.
    ///
    /// A failed mutation may have gone through partially (some deletes
    /// landed), so the backend is the only source of truth afterwards.
    async fn after_mutation<T>(&mut self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        let sent = !matches!(
            result,
            Err(CoreError::ValidationError(_))
                | Err(CoreError::CompanyNotFound(_))
                | Err(CoreError::Unauthorized)
                | Err(CoreError::NotAuthenticated)
        );
        if !sent {
            return result;
        }

        if let Err(e) = self.reload().await {
            warn!("Re-fetch after mutation failed: {e}");
            self.stale = true;
        }
        result
    }

    fn rebuild_price_service(&mut self) {
        self.price_service = Arc::new(PriceService::from_settings(&self.settings));
    }
}
