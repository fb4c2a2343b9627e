// ═══════════════════════════════════════════════════════════════════
// Integration Tests — PortfolioTracker facade against a stateful
// mock backend and mock quote providers
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use stock_portfolio_core::backend::traits::{Credentials, PortfolioBackend};
use stock_portfolio_core::errors::CoreError;
use stock_portfolio_core::models::company::Company;
use stock_portfolio_core::models::ids::{CompanyId, InvestmentId};
use stock_portfolio_core::models::investment::{InvestmentRecord, NewInvestment};
use stock_portfolio_core::models::settings::Settings;
use stock_portfolio_core::providers::registry::QuoteProviderRegistry;
use stock_portfolio_core::providers::traits::QuoteProvider;
use stock_portfolio_core::services::price_service::PriceService;
use stock_portfolio_core::PortfolioTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock Quote Provider
// ═══════════════════════════════════════════════════════════════════

struct MockQuoteProvider {
    prices: HashMap<String, f64>,
}

impl MockQuoteProvider {
    fn new(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
        }
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError> {
        self.prices.get(symbol).copied().ok_or_else(|| CoreError::Api {
            provider: "MockProvider".into(),
            message: format!("No quote data for {symbol}"),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════
// Mock Backend (stateful, shared with the test through an Arc)
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Call {
    ListStocks,
    ListInvestments,
    Create(NewInvestment),
    Delete(InvestmentId),
}

#[derive(Default)]
struct BackendState {
    stocks: Vec<Company>,
    investments: Vec<InvestmentRecord>,
    calls: Vec<Call>,
    next_id: i64,
    failing_deletes: HashSet<InvestmentId>,
    reject_token: bool,
    fail_reads: bool,
}

#[derive(Clone, Default)]
struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    fn with_data(stocks: Vec<Company>, investments: Vec<InvestmentRecord>) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.next_id = 1000;
            state.stocks = stocks;
            state.investments = investments;
        }
        backend
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create(_) | Call::Delete(_)))
            .collect()
    }

    fn fail_delete(&self, id: i64) {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(InvestmentId::from(id));
    }

    fn reject_token(&self) {
        self.state.lock().unwrap().reject_token = true;
    }

    fn fail_reads(&self) {
        self.state.lock().unwrap().fail_reads = true;
    }

    fn set_investments(&self, investments: Vec<InvestmentRecord>) {
        self.state.lock().unwrap().investments = investments;
    }
}

#[async_trait]
impl PortfolioBackend for MockBackend {
    async fn list_stocks(&self, _credentials: &Credentials) -> Result<Vec<Company>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListStocks);
        if state.reject_token {
            return Err(CoreError::Unauthorized);
        }
        if state.fail_reads {
            return Err(CoreError::UpstreamFetch {
                resource: "stocks".into(),
                message: "HTTP 503 Service Unavailable".into(),
            });
        }
        Ok(state.stocks.clone())
    }

    async fn list_investments(
        &self,
        _credentials: &Credentials,
    ) -> Result<Vec<InvestmentRecord>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListInvestments);
        if state.reject_token {
            return Err(CoreError::Unauthorized);
        }
        if state.fail_reads {
            return Err(CoreError::UpstreamFetch {
                resource: "investments".into(),
                message: "HTTP 503 Service Unavailable".into(),
            });
        }
        Ok(state.investments.clone())
    }

    async fn create_investment(
        &self,
        _credentials: &Credentials,
        investment: &NewInvestment,
    ) -> Result<InvestmentRecord, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(investment.clone()));
        if state.reject_token {
            return Err(CoreError::Unauthorized);
        }
        state.next_id += 1;
        let record = InvestmentRecord::new(
            state.next_id,
            investment.company.clone(),
            investment.stock_unit,
            investment.base_price,
            investment.base_price * investment.stock_unit as f64,
        );
        state.investments.push(record.clone());
        Ok(record)
    }

    async fn delete_investment(
        &self,
        _credentials: &Credentials,
        id: &InvestmentId,
    ) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(id.clone()));
        if state.reject_token {
            return Err(CoreError::Unauthorized);
        }
        if state.failing_deletes.contains(id) {
            return Err(CoreError::Mutation {
                operation: format!("delete investment {id}"),
                message: "HTTP 500 Internal Server Error".into(),
            });
        }
        state.investments.retain(|i| &i.id != id);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════

fn lot(id: i64, company: i64, units: i64, base: f64) -> InvestmentRecord {
    InvestmentRecord::new(id, company, units, base, base * units as f64)
}

fn stocks() -> Vec<Company> {
    vec![
        Company::new(10, "Acme", "ACME"),
        Company::new(20, "Beta Corp", "BETA"),
    ]
}

fn tracker_with(backend: &MockBackend, prices: &[(&str, f64)]) -> PortfolioTracker {
    let mut registry = QuoteProviderRegistry::new();
    registry.register(Box::new(MockQuoteProvider::new(prices)));
    let mut tracker = PortfolioTracker::with_services(
        Settings::default(),
        Box::new(backend.clone()),
        PriceService::new(registry),
    );
    tracker.set_credentials(Credentials::bearer("token"));
    tracker
}

fn acme_tracker() -> (MockBackend, PortfolioTracker) {
    let backend = MockBackend::with_data(stocks(), vec![lot(1, 10, 5, 100.0)]);
    let tracker = tracker_with(&backend, &[("ACME", 120.0)]);
    (backend, tracker)
}

// ═══════════════════════════════════════════════════════════════════
// Construction & session
// ═══════════════════════════════════════════════════════════════════

mod session {
    use super::*;

    #[test]
    fn new_with_default_settings() {
        let tracker = PortfolioTracker::new(Settings::default()).unwrap();
        assert!(!tracker.is_authenticated());
        assert_eq!(tracker.generation(), 0);
        assert!(tracker.get_provider_names().contains(&"Yahoo Finance".to_string()));
    }

    #[test]
    fn new_rejects_invalid_settings() {
        let settings = Settings {
            api_base_url: "localhost:8000".into(),
            ..Settings::default()
        };
        assert!(matches!(
            PortfolioTracker::new(settings),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn refresh_requires_credentials() {
        let backend = MockBackend::with_data(stocks(), vec![]);
        let mut tracker = tracker_with(&backend, &[]);
        tracker.clear_credentials();

        assert!(matches!(tracker.refresh().await, Err(CoreError::NotAuthenticated)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_clears_session() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();
        backend.reject_token();

        let err = tracker.refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized));
        assert!(err.is_auth_error());
        assert!(!tracker.is_authenticated());
        assert!(tracker.investments().is_empty());
        assert!(tracker.companies().is_empty());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let backend = MockBackend::default();
        let tracker = tracker_with(&backend, &[]);
        let dbg = format!("{tracker:?}");
        assert!(dbg.contains("authenticated: true"));
        assert!(!dbg.contains("token"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fetch & valuation
// ═══════════════════════════════════════════════════════════════════

mod valuation {
    use super::*;

    #[tokio::test]
    async fn reload_values_at_live_price() {
        let (_backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();

        let snap = tracker.snapshot().unwrap();
        assert!(!snap.calculating_value);
        assert_eq!(snap.live_value, Some(600.0));
        assert_eq!(snap.company_value(&CompanyId::from(10)), Some(600.0));
        assert_eq!(snap.summary.total_price, 500.0);
        assert_eq!(snap.summary.total_companies, 1);
        assert_eq!(snap.summary.total_stocks, 5);
        assert_eq!(snap.stock_distribution[0].name, "Acme");
    }

    #[tokio::test]
    async fn unavailable_price_values_at_base() {
        let backend = MockBackend::with_data(stocks(), vec![lot(1, 10, 5, 100.0)]);
        let mut tracker = tracker_with(&backend, &[]);
        tracker.reload().await.unwrap();

        let snap = tracker.snapshot().unwrap();
        assert!(!snap.calculating_value);
        assert_eq!(snap.live_value, Some(500.0));
    }

    #[tokio::test]
    async fn snapshot_before_valuation_is_calculating() {
        let (_backend, mut tracker) = acme_tracker();
        tracker.refresh().await.unwrap();

        let snap = tracker.snapshot().unwrap();
        assert!(snap.calculating_value);
        assert_eq!(snap.live_value, None);
        assert!(snap.value_distribution.is_empty());
        assert_eq!(snap.display_total(), 500.0);
        assert!(tracker.valuation().is_none());
    }

    #[tokio::test]
    async fn refresh_bumps_generation() {
        let (_backend, mut tracker) = acme_tracker();
        tracker.refresh().await.unwrap();
        let first = tracker.generation();
        tracker.refresh().await.unwrap();
        assert!(tracker.generation() > first);
    }

    #[tokio::test]
    async fn stale_valuation_is_discarded() {
        let (backend, mut tracker) = acme_tracker();
        tracker.refresh().await.unwrap();

        let request = tracker.begin_valuation().unwrap();
        backend.set_investments(vec![lot(1, 10, 5, 100.0), lot(2, 20, 1, 10.0)]);
        tracker.refresh().await.unwrap();

        let stale = request.run(&tracker.price_service()).await;
        assert!(!tracker.apply_valuation(stale));
        let snap = tracker.snapshot().unwrap();
        assert!(snap.calculating_value);
        assert_eq!(snap.grouped.len(), 2);

        let request = tracker.begin_valuation().unwrap();
        let fresh = request.run(&tracker.price_service()).await;
        assert!(tracker.apply_valuation(fresh));
        assert!(!tracker.snapshot().unwrap().calculating_value);
    }

    #[tokio::test]
    async fn invalid_record_keeps_previous_state() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();
        let generation = tracker.generation();

        backend.set_investments(vec![lot(1, 10, 5, 100.0), lot(2, 10, 0, 1.0)]);
        let err = tracker.refresh().await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidRecord(_)));
        assert_eq!(tracker.generation(), generation);
        assert_eq!(tracker.investments().len(), 1);
        assert_eq!(tracker.snapshot().unwrap().live_value, Some(600.0));
    }

    #[tokio::test]
    async fn unknown_company_gets_placeholder_name() {
        let backend = MockBackend::with_data(stocks(), vec![lot(1, 77, 3, 1.0)]);
        let mut tracker = tracker_with(&backend, &[]);
        tracker.reload().await.unwrap();

        let snap = tracker.snapshot().unwrap();
        assert_eq!(snap.stock_distribution[0].name, "Company 77");
        assert_eq!(snap.live_value, Some(3.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Mutations
// ═══════════════════════════════════════════════════════════════════

mod mutations {
    use super::*;

    #[tokio::test]
    async fn edit_replaces_position() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();

        let created = tracker
            .edit_position(&CompanyId::from(10), 8, 90.0)
            .await
            .unwrap();

        assert_eq!(
            backend.mutations(),
            vec![
                Call::Delete(InvestmentId::from(1)),
                Call::Create(NewInvestment::new(10, 8, 90.0)),
            ]
        );
        assert_eq!(tracker.investments(), &[created]);

        let snap = tracker.snapshot().unwrap();
        assert_eq!(snap.summary.total_stocks, 8);
        assert_eq!(snap.summary.total_price, 720.0);
        assert_eq!(snap.live_value, Some(960.0));
    }

    #[tokio::test]
    async fn failed_delete_skips_create_and_resyncs() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();
        backend.fail_delete(1);
        let reads_before = backend.calls().len();

        let err = tracker
            .edit_position(&CompanyId::from(10), 8, 90.0)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Mutation { .. }));
        assert_eq!(backend.mutations(), vec![Call::Delete(InvestmentId::from(1))]);
        assert!(backend.calls()[reads_before..].contains(&Call::ListInvestments));
        assert_eq!(tracker.investments(), &[lot(1, 10, 5, 100.0)]);
    }

    #[tokio::test]
    async fn delete_removes_company_key() {
        let backend = MockBackend::with_data(
            stocks(),
            vec![lot(1, 10, 5, 100.0), lot(2, 20, 1, 10.0), lot(3, 10, 1, 90.0)],
        );
        let mut tracker = tracker_with(&backend, &[("ACME", 120.0), ("BETA", 11.0)]);
        tracker.reload().await.unwrap();

        let removed = tracker.delete_position(&CompanyId::from(10)).await.unwrap();
        assert_eq!(removed, 2);

        let snap = tracker.snapshot().unwrap();
        assert!(!snap.grouped.contains(&CompanyId::from(10)));
        assert!(snap
            .stock_distribution
            .iter()
            .all(|d| d.company_id != CompanyId::from(10)));
        assert_eq!(snap.company_value(&CompanyId::from(10)), None);
        assert_eq!(snap.live_value, Some(11.0));
    }

    #[tokio::test]
    async fn add_shows_up_after_reload() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();

        tracker.add_investment(20, 2, 10.0).await.unwrap();

        assert_eq!(backend.mutations().len(), 1);
        let snap = tracker.snapshot().unwrap();
        assert_eq!(snap.summary.total_companies, 2);
        assert_eq!(snap.summary.total_stocks, 7);
        // BETA has no mock quote: base price
        assert_eq!(snap.live_value, Some(620.0));
    }

    #[tokio::test]
    async fn invalid_add_sends_nothing() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();
        let calls_before = backend.calls().len();

        let err = tracker.add_investment(10, 0, 10.0).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(backend.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn edit_unknown_company() {
        let (_backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();

        let err = tracker
            .edit_position(&CompanyId::from(99), 1, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CompanyNotFound(_)));
    }

    #[tokio::test]
    async fn failed_resync_marks_state_stale() {
        let (backend, mut tracker) = acme_tracker();
        tracker.reload().await.unwrap();
        backend.fail_reads();

        let created = tracker.add_investment(20, 1, 10.0).await.unwrap();

        assert!(tracker.is_stale());
        assert!(tracker.investments().contains(&created));

        let state = Arc::clone(&backend.state);
        state.lock().unwrap().fail_reads = false;
        tracker.reload().await.unwrap();
        assert!(!tracker.is_stale());
    }

    #[tokio::test]
    async fn partial_delete_with_failed_resync_marks_state_stale() {
        let backend = MockBackend::with_data(
            stocks(),
            vec![lot(1, 10, 5, 100.0), lot(2, 10, 1, 90.0)],
        );
        let mut tracker = tracker_with(&backend, &[("ACME", 120.0)]);
        tracker.reload().await.unwrap();
        backend.fail_delete(2);
        backend.fail_reads();

        let err = tracker
            .edit_position(&CompanyId::from(10), 8, 90.0)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Mutation { .. }));
        assert_eq!(backend.state.lock().unwrap().investments, vec![lot(2, 10, 1, 90.0)]);
        assert_eq!(tracker.investments().len(), 2);
        assert!(tracker.is_stale());

        backend.state.lock().unwrap().fail_reads = false;
        tracker.reload().await.unwrap();
        assert!(!tracker.is_stale());
        assert_eq!(tracker.investments(), &[lot(2, 10, 1, 90.0)]);
    }

    #[tokio::test]
    async fn mutation_requires_credentials() {
        let (backend, mut tracker) = acme_tracker();
        tracker.clear_credentials();

        let err = tracker.delete_position(&CompanyId::from(10)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAuthenticated));
        assert!(backend.calls().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn api_keys_rebuild_providers() {
        let backend = MockBackend::default();
        let mut tracker = tracker_with(&backend, &[]);
        assert_eq!(tracker.get_provider_names(), vec!["MockProvider"]);

        tracker.set_api_key("finnhub".into(), "fh-key".into());
        assert!(tracker.get_provider_names().contains(&"Finnhub".to_string()));
        assert_eq!(tracker.settings().api_keys.get("finnhub").map(String::as_str), Some("fh-key"));

        assert!(tracker.remove_api_key("finnhub"));
        assert!(!tracker.get_provider_names().contains(&"Finnhub".to_string()));
        assert!(!tracker.remove_api_key("finnhub"));
    }

    #[test]
    fn quote_timeout_bounds() {
        let backend = MockBackend::default();
        let mut tracker = tracker_with(&backend, &[]);

        assert!(tracker.set_quote_timeout_secs(0).is_err());
        assert!(tracker.set_quote_timeout_secs(121).is_err());
        tracker.set_quote_timeout_secs(30).unwrap();
        assert_eq!(tracker.settings().quote_timeout_secs, 30);
    }
}
