use serde::Serialize;

use super::position::DEFAULT_CENTER;
use super::Position;

pub const DEFAULT_ZOOM: u8 = 13;
pub const MAX_ZOOM: u8 = 19;

/// Last known map view.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Position,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(center: Position, zoom: u8) -> Viewport {
        Viewport { center, zoom: zoom.min(MAX_ZOOM) }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(DEFAULT_CENTER, DEFAULT_ZOOM)
    }
}
