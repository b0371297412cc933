use tracing::warn;

use crate::error::{FlightError, StoreError};
use crate::fetch::SkyClient;
use crate::model::{Airport, FlightItinerary};
use crate::prefs::PreferenceStore;
use crate::query::FlightSearchParams;
use crate::storage::KeyValueStore;

/// Everything a front-end needs, built once at startup and handed around by
/// reference.
pub struct App<K: KeyValueStore> {
    client: SkyClient,
    prefs: PreferenceStore<K>,
}

impl<K: KeyValueStore> App<K> {
    pub fn new(client: SkyClient, storage: K) -> Self {
        Self {
            client,
            prefs: PreferenceStore::load(storage),
        }
    }

    pub fn client(&self) -> &SkyClient {
        &self.client
    }

    pub fn prefs(&self) -> &PreferenceStore<K> {
        &self.prefs
    }

    /// Runs a flight search for the route, recording it as a recent search
    /// first. The route ids sent upstream are taken from `origin` and
    /// `destination`; `options` supplies everything else. A failure to save
    /// the recent search is logged, not returned.
    pub async fn search_route(
        &mut self,
        origin: Airport,
        destination: Airport,
        options: &FlightSearchParams,
    ) -> Result<Vec<FlightItinerary>, FlightError> {
        let params = FlightSearchParams {
            origin_sky_id: origin.sky_id.clone(),
            destination_sky_id: destination.sky_id.clone(),
            origin_entity_id: origin.entity_id.clone(),
            destination_entity_id: destination.entity_id.clone(),
            ..options.clone()
        };

        if let Err(e) = self.prefs.add_recent_search(
            Some(origin),
            Some(destination),
            Some(params.date.clone()),
            params.return_date.clone(),
        ) {
            warn!(error = %e, "could not record recent search");
        }

        self.client.search_flights(&params).await
    }

    pub fn toggle_favorite(
        &mut self,
        origin: &Airport,
        destination: &Airport,
    ) -> Result<bool, StoreError> {
        self.prefs.toggle_favorite(origin, destination)
    }

    pub fn is_favorite(&self, origin_sky_id: &str, destination_sky_id: &str) -> bool {
        self.prefs.is_favorite(origin_sky_id, destination_sky_id)
    }
}
