//! vendo-tui: a terminal locator for trading-card vending machines.
//!
//! Loads a static machine dataset, acquires the user's position, ranks
//! every machine by great-circle distance, and renders the result as a
//! selectable list and a canvas map with outbound directions links.

pub mod app;
pub mod config;
pub mod events;
pub mod geo;
pub mod links;
pub mod location;
pub mod logging;
pub mod machines;
pub mod ui;
