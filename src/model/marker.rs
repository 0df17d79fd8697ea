use serde::Serialize;

use super::{Pin, PinType, Position};

/// What the map widget needs to draw a pin.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Marker {
    pub pin_id: String,
    pub position: Position,
    pub title: String,
    pub icon: Icon,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Icon {
    pub glyph: &'static str,
    pub color: String,
}

impl From<&Pin> for Marker {
    fn from(pin: &Pin) -> Self {
        Marker {
            pin_id: pin.id.clone(),
            position: pin.position,
            title: pin.name.clone(),
            icon: Icon {
                glyph: glyph(pin.pin_type),
                color: pin.color.to_string(),
            },
        }
    }
}

fn glyph(pin_type: PinType) -> &'static str {
    match pin_type {
        PinType::Stay => "🏨",
        PinType::Eat => "🍴",
        PinType::Activity => "🎯",
    }
}
