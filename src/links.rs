//! Directions links for the detail pane.
//!
//! The TUI cannot open a navigation app itself, so it renders ready-made
//! URLs the user can copy into a browser or phone. Addresses are
//! percent-encoded aggressively (everything non-alphanumeric) so the same
//! encoder works for both providers.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// Apple Maps directions to `address` from the user's current position.
pub fn apple_maps_directions(address: &str) -> String {
    format!(
        "http://maps.apple.com/?daddr={}",
        utf8_percent_encode(address, NON_ALPHANUMERIC)
    )
}

/// Google Maps directions to `address` from the user's current position.
pub fn google_maps_directions(address: &str) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={}",
        utf8_percent_encode(address, NON_ALPHANUMERIC)
    )
}
