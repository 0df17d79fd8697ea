use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::{Pin, PinDraft};
use crate::persistence::{Persistence, PINS_KEY};
use crate::repository::KeyValueStore;

/// The ordered pin collection of a session.
///
/// Mutations write the whole collection back through [`Persistence`]. A
/// failed write is logged and the in-memory list stays authoritative.
pub struct PinStore<S> {
    pins: Vec<Pin>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> PinStore<S> {
    /// Loads the stored collection. Entries that don't parse, have a blank
    /// name or repeat an earlier id are skipped, so one bad entry doesn't
    /// cost the whole list.
    pub fn open(persistence: Persistence<S>) -> PinStore<S> {
        let entries: Vec<Value> = persistence.load(PINS_KEY, Vec::new());
        let pins = sanitize(entries);
        info!(count = pins.len(), "Loaded pins");
        PinStore { pins, persistence }
    }

    pub fn list(&self) -> &[Pin] {
        &self.pins
    }

    pub fn get(&self, id: &str) -> Option<&Pin> {
        self.pins.iter().find(|it| it.id == id)
    }

    pub fn add(&mut self, draft: PinDraft) -> &Pin {
        let id = self.fresh_id();
        self.pins.push(Pin::new(id, draft));
        self.persist();
        &self.pins[self.pins.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> Option<Pin> {
        let index = self.pins.iter().position(|it| it.id == id)?;
        let removed = self.pins.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn edit(&mut self, id: &str, draft: PinDraft) -> Option<&Pin> {
        let index = self.pins.iter().position(|it| it.id == id)?;
        self.pins[index].replace(draft);
        self.persist();
        Some(&self.pins[index])
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();

            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        if !self.persistence.save(PINS_KEY, &self.pins) {
            warn!(count = self.pins.len(), "Pins were not saved, keeping them in memory");
        }
    }
}

fn sanitize(entries: Vec<Value>) -> Vec<Pin> {
    let mut ids = HashSet::new();
    let mut pins = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let pin: Pin = match serde_json::from_value(entry) {
            Ok(pin) => pin,
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable stored pin");
                continue;
            }
        };

        if pin.name.trim().is_empty() {
            warn!(index, id = %pin.id, "Skipping stored pin without a name");
            continue;
        }

        if !ids.insert(pin.id.clone()) {
            warn!(index, id = %pin.id, "Skipping stored pin with a duplicate id");
            continue;
        }

        pins.push(pin);
    }

    pins
}
