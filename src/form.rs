use thiserror::Error;

use crate::coordinates::{parse_lat_lon, validate_lat_lon, CoordinateError};
use crate::geocoding::Place;
use crate::model::{Color, PinDraft, PinType, Position};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    EmptyName,

    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    #[error("Invalid color {0}, expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("Unknown pin type {0}, expected stay, eat or activity")]
    UnknownType(String),
}

/// Raw field values of a pin being composed.
///
/// Nothing is checked until [`PinForm::validate`], which is the only way to
/// obtain a [`PinDraft`] from user input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinForm {
    pub pin_type: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub latitude: String,
    pub longitude: String,
    pub link: String,
}

impl PinForm {
    /// Form for a location picked on the map.
    pub fn at(position: Position) -> PinForm {
        let mut form = PinForm::default();
        form.set_position(position);
        form
    }

    /// Copies a search result's name and coordinate into the form, keeping
    /// everything else already entered.
    pub fn apply_place(&mut self, place: &Place) {
        self.set_position(place.position);
        self.name = place.display_name.clone();
    }

    /// Form pre-filled with existing values, for editing.
    pub fn from_draft(draft: &PinDraft) -> PinForm {
        PinForm {
            pin_type: draft.pin_type.to_string(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            color: draft.color.to_string(),
            latitude: draft.position.lat().to_string(),
            longitude: draft.position.lon().to_string(),
            link: draft.link.clone().unwrap_or_default(),
        }
    }

    /// Handles text entered into the latitude field. A pasted "lat, lon"
    /// pair is split across both coordinate fields.
    pub fn paste_latitude(&mut self, text: &str) {
        match parse_lat_lon(text) {
            Some(position) => self.set_position(position),
            None => self.latitude = text.to_string(),
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.latitude = position.lat().to_string();
        self.longitude = position.lon().to_string();
    }

    pub fn validate(&self) -> Result<PinDraft, ValidationError> {
        let pin_type = if self.pin_type.trim().is_empty() {
            PinType::Stay
        } else {
            self.pin_type.parse().map_err(ValidationError::UnknownType)?
        };

        let name = self.name.trim();

        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let position = validate_lat_lon(&self.latitude, &self.longitude)?;

        let color = if self.color.trim().is_empty() {
            Color::default()
        } else {
            Color::parse(&self.color)
                .ok_or_else(|| ValidationError::InvalidColor(self.color.clone()))?
        };

        let link = Some(self.link.trim())
            .filter(|it| !it.is_empty())
            .map(str::to_string);

        Ok(PinDraft {
            pin_type,
            name: name.to_string(),
            description: self.description.clone(),
            color,
            position,
            link,
        })
    }
}
