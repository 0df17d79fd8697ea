mod marker;
mod pin;
mod position;
mod viewport;

pub use marker::Marker;
pub use pin::{Color, Pin, PinDraft, PinType};
pub use position::{Position, DEFAULT_CENTER};
pub use viewport::{Viewport, DEFAULT_ZOOM};
