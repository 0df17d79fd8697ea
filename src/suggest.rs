use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::form::PinForm;
use crate::geocoding::{Geocoder, Place};

/// Queries this short or shorter never reach the geocoder.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestions {
    pub query: String,
    pub places: Vec<Place>,
    pub error: Option<String>,
}

/// Debounced autocomplete over a [`Geocoder`].
///
/// Each call to [`SuggestionSearch::update_query`] aborts the pending timer
/// and starts a new one. Once a timer fires the request runs in its own
/// task and is never cancelled, but its result is dropped if another
/// query was typed in the meantime.
pub struct SuggestionSearch<G> {
    geocoder: Arc<G>,
    debounce: Duration,
    limit: usize,
    pending: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<Suggestions>>,
}

impl<G: Geocoder + 'static> SuggestionSearch<G> {
    pub fn new(geocoder: Arc<G>, debounce: Duration, limit: usize) -> SuggestionSearch<G> {
        let (state, _) = watch::channel(Suggestions::default());

        SuggestionSearch {
            geocoder,
            debounce,
            limit,
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn update_query(&mut self, query: &str) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.chars().count() <= MIN_QUERY_CHARS {
            self.state.send_replace(Suggestions::default());
            return;
        }

        let geocoder = Arc::clone(&self.geocoder);
        let current = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let query = query.to_string();
        let debounce = self.debounce;
        let limit = self.limit;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            debug!(query = %query, "Requesting suggestions");

            tokio::spawn(async move {
                let next = match geocoder.suggest(&query, limit).await {
                    Ok(places) => {
                        debug!(query = %query, count = places.len(), "Got suggestions");
                        Suggestions { query: query.clone(), places, error: None }
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Suggestion request failed");
                        Suggestions {
                            query: query.clone(),
                            places: Vec::new(),
                            error: Some(e.to_string()),
                        }
                    }
                };

                // Checked under the channel lock so a concurrent clear wins.
                let published = state.send_if_modified(|suggestions| {
                    if current.load(Ordering::SeqCst) != generation {
                        return false;
                    }

                    *suggestions = next;
                    true
                });

                if !published {
                    debug!(query = %query, "Dropping superseded suggestions");
                }
            });
        }));
    }

    pub fn suggestions(&self) -> Vec<Place> {
        self.state.borrow().places.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Suggestions> {
        self.state.subscribe()
    }

    /// Copies the chosen suggestion into the pin being composed. Returns
    /// `false` if there is no such suggestion.
    pub fn select(&self, index: usize, form: &mut PinForm) -> bool {
        match self.state.borrow().places.get(index) {
            Some(place) => {
                form.apply_place(place);
                true
            }
            None => false,
        }
    }
}

impl<G> Drop for SuggestionSearch<G> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::tests::{place, FakeGeocoder};
    use crate::model::PinType;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn hanoi_geocoder() -> Arc<FakeGeocoder> {
        Arc::new(FakeGeocoder::with_places(vec![
            place("Hanoi, Vietnam", 21.0283334, 105.854041),
            place("Hanoi Opera House", 21.0242, 105.8575),
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_sends_one_request() {
        let geocoder = hanoi_geocoder();
        let mut search = SuggestionSearch::new(Arc::clone(&geocoder), DEBOUNCE, 5);
        let mut updates = search.subscribe();

        for query in ["han", "hano", "hanoi"] {
            search.update_query(query);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert!(geocoder.calls().is_empty());

        updates.changed().await.unwrap();

        assert_eq!(geocoder.calls(), vec![("hanoi".to_string(), 5, true)]);
        assert_eq!(search.suggestions().len(), 2);
        assert_eq!(updates.borrow().query, "hanoi");
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_and_cancels_timer() {
        let geocoder = hanoi_geocoder();
        let mut search = SuggestionSearch::new(Arc::clone(&geocoder), DEBOUNCE, 5);
        let mut updates = search.subscribe();

        search.update_query("hanoi");
        updates.changed().await.unwrap();
        assert_eq!(search.suggestions().len(), 2);

        search.update_query("hano");
        tokio::time::sleep(Duration::from_millis(50)).await;
        search.update_query("ha");

        assert!(search.suggestions().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(geocoder.calls().len(), 1);
        assert!(search.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_response_is_dropped_not_cancelled() {
        let geocoder = Arc::new(FakeGeocoder {
            delay: Duration::from_secs(1),
            ..FakeGeocoder::with_places(vec![place("Hoi An", 15.8801, 108.338)])
        });
        let mut search = SuggestionSearch::new(Arc::clone(&geocoder), DEBOUNCE, 5);

        search.update_query("hoi an");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(geocoder.calls().len(), 1);

        search.update_query("");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(geocoder.calls().len(), 1);
        assert!(search.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_query() {
        let geocoder = Arc::new(FakeGeocoder {
            delay: Duration::from_secs(1),
            ..FakeGeocoder::with_places(vec![place("Hue, Vietnam", 16.4637, 107.5909)])
        });
        let mut search = SuggestionSearch::new(Arc::clone(&geocoder), DEBOUNCE, 5);
        let mut updates = search.subscribe();

        search.update_query("hoi an");
        tokio::time::sleep(Duration::from_millis(400)).await;
        search.update_query("hue city");

        // The first response lands while the second request is in flight.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(geocoder.calls().len(), 2);
        assert!(!updates.has_changed().unwrap());
        assert_eq!(updates.borrow().query, "");

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().query, "hue city");
        assert_eq!(search.suggestions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn request_error_is_reported() {
        let geocoder = Arc::new(FakeGeocoder { fail: true, ..FakeGeocoder::default() });
        let mut search = SuggestionSearch::new(geocoder, DEBOUNCE, 5);
        let mut updates = search.subscribe();

        search.update_query("sapa");
        updates.changed().await.unwrap();

        assert!(search.suggestions().is_empty());
        assert!(search.last_error().unwrap().starts_with("Search error"));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_suggestion_fills_a_form() {
        let mut search = SuggestionSearch::new(hanoi_geocoder(), DEBOUNCE, 5);
        let mut updates = search.subscribe();

        search.update_query("opera");
        updates.changed().await.unwrap();

        let mut form = PinForm::default();
        assert!(search.select(1, &mut form));
        assert_eq!(form.name, "Hanoi Opera House");
        assert_eq!(form.latitude, "21.0242");
        assert_eq!(form.longitude, "105.8575");
        assert!(!search.select(2, &mut form));
        assert_eq!(form.name, "Hanoi Opera House");
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_keeps_fields_already_entered() {
        let mut search = SuggestionSearch::new(hanoi_geocoder(), DEBOUNCE, 5);
        let mut updates = search.subscribe();

        search.update_query("opera");
        updates.changed().await.unwrap();

        let mut form = PinForm {
            pin_type: "eat".to_string(),
            description: "Cao lau".to_string(),
            color: "#3498db".to_string(),
            ..PinForm::default()
        };
        assert!(search.select(0, &mut form));

        let draft = form.validate().unwrap();
        assert_eq!(draft.pin_type, PinType::Eat);
        assert_eq!(draft.description, "Cao lau");
        assert_eq!(draft.color.as_str(), "#3498db");
        assert_eq!(draft.name, search.suggestions()[0].display_name);
    }
}
