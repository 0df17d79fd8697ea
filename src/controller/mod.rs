mod pin;

pub use pin::{get_markers, get_pin, get_pins, get_viewport};
