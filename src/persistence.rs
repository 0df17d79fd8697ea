use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Position, Viewport};
use crate::repository::KeyValueStore;

pub const PINS_KEY: &str = "pins";
pub const MAP_CENTER_KEY: &str = "map_center";
pub const MAP_ZOOM_KEY: &str = "map_zoom";

/// Typed reads and writes over a key-value store that never fail.
///
/// Every error is logged and replaced by the caller's default (reads) or
/// dropped (writes).
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Persistence<S> {
        Persistence { store }
    }

    /// Returns `true` if the value was written.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Unable to serialize value");
                return false;
            }
        };

        match self.store.set(key, &json) {
            Ok(()) => {
                debug!(key, bytes = json.len(), "Saved");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Unable to write value");
                false
            }
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let json = match self.store.get(key) {
            Ok(Some(json)) => json,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "Unable to read value, using default");
                return default;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    key,
                    bytes = json.len(),
                    error = %e,
                    "Stored value is corrupt, using default"
                );
                default
            }
        }
    }

    pub fn load_viewport(&self, default: Viewport) -> Viewport {
        let center = self.load(MAP_CENTER_KEY, default.center);
        let zoom = self.load(MAP_ZOOM_KEY, default.zoom);
        Viewport::new(center, zoom)
    }

    pub fn save_viewport(&mut self, viewport: &Viewport) {
        self.save_center(viewport.center);
        self.save(MAP_ZOOM_KEY, &viewport.zoom);
    }

    pub fn save_center(&mut self, center: Position) {
        self.save(MAP_CENTER_KEY, &center);
    }

    /// Drops the stored viewport so the next load uses the defaults.
    pub fn reset_viewport(&mut self) {
        for key in [MAP_CENTER_KEY, MAP_ZOOM_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Unable to remove value");
            }
        }
    }
}
