use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use skylane_core::iata;
use skylane_core::offer::FlightOffer;
use skylane_core::provider::{FlightProvider, RouteQuery};
use skylane_core::repository::FlightCatalog;
use skylane_core::search::FlightSearchQuery;
use skylane_core::CoreResult;

use crate::mock;

/// What one strategy produced for a query.
pub enum StrategyOutcome {
    /// Use these offers; no further strategy runs.
    Offers(Vec<FlightOffer>),
    /// Yield to the next strategy, with the reason for the log.
    Pass(String),
}

/// One rung of the search fallback chain. Strategies are tried in order
/// until one yields offers; upstream failures turn into a `Pass`, never
/// into an error the caller sees.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, query: &FlightSearchQuery) -> StrategyOutcome;
}

/// Live provider lookup. Resolves the free-text route to IATA codes
/// first; an unresolvable endpoint skips the provider call entirely.
pub struct LiveSearch {
    provider: Arc<dyn FlightProvider>,
}

impl LiveSearch {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SearchStrategy for LiveSearch {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn attempt(&self, query: &FlightSearchQuery) -> StrategyOutcome {
        if query.use_mock {
            return StrategyOutcome::Pass("mock data requested by caller".to_string());
        }
        if !query.has_full_route() {
            return StrategyOutcome::Pass("incomplete route parameters".to_string());
        }

        let departure = query.departure.as_deref().unwrap_or_default();
        let arrival = query.arrival.as_deref().unwrap_or_default();
        let (Some(origin), Some(destination)) = (iata::resolve(departure), iata::resolve(arrival))
        else {
            warn!("could not resolve route to IATA codes: {departure} -> {arrival}");
            return StrategyOutcome::Pass("unresolvable origin or destination".to_string());
        };

        let route = RouteQuery {
            origin,
            destination,
            date: query.date.expect("full route has a date"),
            return_date: query.return_date,
            adults: query.adults,
        };

        match self.provider.search_flights(&route).await {
            Ok(offers) if !offers.is_empty() => StrategyOutcome::Offers(offers),
            Ok(_) => StrategyOutcome::Pass(format!("{} returned no offers", self.provider.name())),
            Err(err) => {
                warn!("{} search failed: {err}", self.provider.name());
                StrategyOutcome::Pass(format!("{} failed: {err}", self.provider.name()))
            }
        }
    }
}

/// Synthetic offers for any fully specified route.
pub struct MockFallback;

#[async_trait]
impl SearchStrategy for MockFallback {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn attempt(&self, query: &FlightSearchQuery) -> StrategyOutcome {
        if !query.has_full_route() {
            return StrategyOutcome::Pass("incomplete route parameters".to_string());
        }
        let departure = query.departure.as_deref().unwrap_or_default();
        let arrival = query.arrival.as_deref().unwrap_or_default();
        let date = query.date.expect("full route has a date");
        StrategyOutcome::Offers(mock::generate_offers(departure, arrival, date))
    }
}

/// Local catalog listing: substring route match, exact date match. Runs
/// last and always answers, so a search never hard-fails.
pub struct CatalogSearch {
    catalog: Arc<dyn FlightCatalog>,
}

impl CatalogSearch {
    pub fn new(catalog: Arc<dyn FlightCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl SearchStrategy for CatalogSearch {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn attempt(&self, query: &FlightSearchQuery) -> StrategyOutcome {
        let flights = match self
            .catalog
            .search_flights(
                query.departure.as_deref(),
                query.arrival.as_deref(),
                query.date,
            )
            .await
        {
            Ok(flights) => flights,
            Err(err) => {
                warn!("catalog search failed: {err}");
                return StrategyOutcome::Offers(Vec::new());
            }
        };
        StrategyOutcome::Offers(flights.iter().map(|f| f.to_offer()).collect())
    }
}

/// Runs the ordered fallback chain: live provider, then the mock
/// generator, then the local catalog. Validation happens before any
/// strategy is attempted.
pub struct SearchOrchestrator {
    strategies: Vec<Box<dyn SearchStrategy>>,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn FlightProvider>, catalog: Arc<dyn FlightCatalog>) -> Self {
        Self {
            strategies: vec![
                Box::new(LiveSearch::new(provider)),
                Box::new(MockFallback),
                Box::new(CatalogSearch::new(catalog)),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn search(&self, query: &FlightSearchQuery) -> CoreResult<Vec<FlightOffer>> {
        query.validate(Utc::now().date_naive())?;

        for strategy in &self.strategies {
            match strategy.attempt(query).await {
                StrategyOutcome::Offers(offers) => {
                    info!(
                        strategy = strategy.name(),
                        count = offers.len(),
                        "search resolved"
                    );
                    return Ok(offers);
                }
                StrategyOutcome::Pass(reason) => {
                    debug!(strategy = strategy.name(), %reason, "strategy passed");
                }
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use skylane_core::flight::{Flight, FlightStatus};
    use skylane_core::offer::OfferSource;
    use skylane_core::CoreError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    struct PassingStrategy {
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl SearchStrategy for PassingStrategy {
        fn name(&self) -> &'static str {
            "passing"
        }

        async fn attempt(&self, _query: &FlightSearchQuery) -> StrategyOutcome {
            self.called.store(true, Ordering::SeqCst);
            StrategyOutcome::Pass("always yields".to_string())
        }
    }

    struct InMemoryCatalog {
        flights: Vec<Flight>,
    }

    #[async_trait]
    impl FlightCatalog for InMemoryCatalog {
        async fn search_flights(
            &self,
            departure: Option<&str>,
            _arrival: Option<&str>,
            _date: Option<NaiveDate>,
        ) -> CoreResult<Vec<Flight>> {
            Ok(self
                .flights
                .iter()
                .filter(|f| {
                    departure.map_or(true, |d| {
                        f.departure.to_lowercase().contains(&d.to_lowercase())
                    })
                })
                .cloned()
                .collect())
        }
    }

    fn future_query() -> FlightSearchQuery {
        FlightSearchQuery {
            departure: Some("new york".into()),
            arrival: Some("london".into()),
            date: Some(Utc::now().date_naive() + Days::new(30)),
            return_date: None,
            adults: 1,
            use_mock: false,
        }
    }

    #[tokio::test]
    async fn test_past_date_rejected_before_any_strategy_runs() {
        let called = Arc::new(AtomicBool::new(false));
        let orchestrator = SearchOrchestrator::with_strategies(vec![Box::new(PassingStrategy {
            called: called.clone(),
        })]);

        let mut query = future_query();
        query.date = Some(Utc::now().date_naive() - Days::new(1));

        let result = orchestrator.search(&query).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_falls_through_to_mock_when_earlier_strategies_pass() {
        let called = Arc::new(AtomicBool::new(false));
        let orchestrator = SearchOrchestrator::with_strategies(vec![
            Box::new(PassingStrategy {
                called: called.clone(),
            }),
            Box::new(MockFallback),
        ]);

        let offers = orchestrator.search(&future_query()).await.unwrap();
        assert!(called.load(Ordering::SeqCst));
        assert!((5..=10).contains(&offers.len()));
        assert!(offers.iter().all(|o| o.source == OfferSource::Mock));
        for pair in offers.windows(2) {
            assert!(pair[0].price <= pair[1].price);
        }
    }

    struct RecordingProvider {
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl skylane_core::provider::FlightProvider for RecordingProvider {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search_flights(
            &self,
            _query: &skylane_core::provider::RouteQuery,
        ) -> skylane_core::provider::ProviderResult<Vec<skylane_core::offer::FlightOffer>> {
            self.called.store(true, Ordering::SeqCst);
            Err(skylane_core::provider::ProviderError::NotFound)
        }

        async fn search_airports(
            &self,
            _keyword: &str,
        ) -> skylane_core::provider::ProviderResult<Vec<skylane_core::offer::Airport>> {
            Err(skylane_core::provider::ProviderError::Unsupported)
        }
    }

    #[tokio::test]
    async fn test_mock_flag_skips_live_lookup() {
        let provider_called = Arc::new(AtomicBool::new(false));
        let orchestrator = SearchOrchestrator::with_strategies(vec![
            Box::new(LiveSearch::new(Arc::new(RecordingProvider {
                called: provider_called.clone(),
            }))),
            Box::new(MockFallback),
        ]);

        let mut query = future_query();
        query.use_mock = true;
        let offers = orchestrator.search(&query).await.unwrap();
        assert!(!offers.is_empty());
        assert!(offers.iter().all(|o| o.source == OfferSource::Mock));
        assert!(
            !provider_called.load(Ordering::SeqCst),
            "use_mock must skip the live provider entirely"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_route_skips_the_live_call() {
        let provider_called = Arc::new(AtomicBool::new(false));
        let orchestrator = SearchOrchestrator::with_strategies(vec![
            Box::new(LiveSearch::new(Arc::new(RecordingProvider {
                called: provider_called.clone(),
            }))),
            Box::new(MockFallback),
        ]);

        let mut query = future_query();
        query.departure = Some("gotham".into());
        let offers = orchestrator.search(&query).await.unwrap();
        assert!(!offers.is_empty());
        assert!(offers.iter().all(|o| o.source == OfferSource::Mock));
        assert!(
            !provider_called.load(Ordering::SeqCst),
            "an unresolvable endpoint must not reach the provider"
        );
    }

    #[tokio::test]
    async fn test_incomplete_query_reaches_the_catalog() {
        let catalog = Arc::new(InMemoryCatalog {
            flights: vec![Flight {
                id: Uuid::new_v4(),
                flight_number: "SK100".into(),
                departure: "New York JFK".into(),
                arrival: "London Heathrow".into(),
                departure_at: Utc::now(),
                price: 310.0,
                availability: true,
                status: FlightStatus::OnTime,
            }],
        });
        let orchestrator = SearchOrchestrator::with_strategies(vec![
            Box::new(MockFallback),
            Box::new(CatalogSearch::new(catalog)),
        ]);

        let query = FlightSearchQuery {
            departure: Some("york".into()),
            arrival: None,
            date: None,
            return_date: None,
            adults: 1,
            use_mock: false,
        };
        let offers = orchestrator.search(&query).await.unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].flight_number, "SK100");
        assert_eq!(offers[0].source, OfferSource::Database);
    }
}
