//! Application controller tying the weather client to the user's preferences.
//!
//! Searches are stamped with a generation number. When a slow search
//! finishes after a newer one has started, its result is discarded instead
//! of overwriting what the newer search displayed.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    client::{AirQuality, WeatherClient},
    error::SearchError,
    geolocation::LocationSource,
    model::{WeatherData, WeatherQuery},
    preferences::{PreferenceContext, Preferences},
    units::Units,
};

/// What the dashboard currently shows.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub weather: Option<Arc<WeatherData>>,
    /// Units the displayed weather was fetched in.
    pub units: Units,
    /// `None` until the air quality lookup for the displayed weather finished.
    pub air_quality: Option<AirQuality>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Applied(DashboardView),
    /// A newer search started before this one finished.
    Superseded,
}

#[derive(Debug)]
pub struct Dashboard {
    client: WeatherClient,
    preferences: Mutex<PreferenceContext>,
    location: Arc<dyn LocationSource>,
    generation: AtomicU64,
    view: Mutex<DashboardView>,
}

impl Dashboard {
    pub fn new(
        client: WeatherClient,
        preferences: PreferenceContext,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            client,
            preferences: Mutex::new(preferences),
            location,
            generation: AtomicU64::new(0),
            view: Mutex::new(DashboardView::default()),
        }
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    pub fn view(&self) -> DashboardView {
        self.view.lock().clone()
    }

    pub fn units(&self) -> Units {
        self.preferences.lock().units()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.lock().preferences().clone()
    }

    /// Flip the unit system. Already displayed data keeps its units until the next search.
    pub fn toggle_units(&self) -> Units {
        let mut prefs = self.preferences.lock();
        prefs.toggle_units();
        prefs.units()
    }

    pub async fn search_city(&self, city: &str) -> Result<SearchOutcome, SearchError> {
        let ticket = self.next_ticket();
        self.run_search(ticket, WeatherQuery::city(city)).await
    }

    pub async fn search_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<SearchOutcome, SearchError> {
        let ticket = self.next_ticket();
        self.run_search(ticket, WeatherQuery::coordinates(lat, lon)).await
    }

    /// Search at the position reported by the location source.
    ///
    /// The location lookup counts as part of the search: a newer search
    /// started while it is pending supersedes this one.
    pub async fn search_here(&self) -> Result<SearchOutcome, SearchError> {
        let ticket = self.next_ticket();
        let position = self.location.current_position().await;
        if !self.is_current(ticket) {
            tracing::debug!(ticket, "discarding superseded location lookup");
            return Ok(SearchOutcome::Superseded);
        }

        match position {
            Ok(position) => {
                let query = WeatherQuery::coordinates(position.lat, position.lon);
                self.run_search(ticket, query).await
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not determine location");
                let err = SearchError::from(err);
                self.show_error(&err);
                Err(err)
            }
        }
    }

    async fn run_search(
        &self,
        ticket: u64,
        query: WeatherQuery,
    ) -> Result<SearchOutcome, SearchError> {
        let units = self.units();
        let query = query.with_units(units);

        let result = self.client.fetch_weather(&query).await;
        if !self.is_current(ticket) {
            tracing::debug!(ticket, "discarding superseded search result");
            return Ok(SearchOutcome::Superseded);
        }

        let data = match result {
            Ok(data) => data,
            Err(err) => {
                let err = SearchError::from(err);
                self.show_error(&err);
                return Err(err);
            }
        };

        let recent = match query.city.as_deref() {
            Some(city) => city.to_string(),
            None => data.current.location.name.clone(),
        };
        self.preferences.lock().add_recent_search(&recent);

        *self.view.lock() = DashboardView {
            weather: Some(Arc::clone(&data)),
            units,
            air_quality: None,
            error: None,
        };

        let coordinates = data.current.location.coordinates;
        let air_quality = self.client.fetch_air_quality_at(coordinates).await;
        if !self.is_current(ticket) {
            return Ok(SearchOutcome::Superseded);
        }

        let mut view = self.view.lock();
        view.air_quality = Some(air_quality);
        Ok(SearchOutcome::Applied(view.clone()))
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    fn show_error(&self, err: &SearchError) {
        *self.view.lock() = DashboardView {
            error: Some(err.user_message()),
            units: self.units(),
            ..DashboardView::default()
        };
    }
}
