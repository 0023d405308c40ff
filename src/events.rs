//! Event types and the main event loop driver for the machine locator TUI.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, and the
//! location lookup messages) and the [`EventHandler`], which runs a
//! background task that polls crossterm for key events and emits periodic
//! [`Event::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; spawned lookup tasks send their outcomes back
//! through clones of [`EventHandler::tx`].

use crate::geo::Coordinate;
use crate::location::LocationError;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Events processed by the application event loop.
pub enum Event {
    /// Periodic tick used for UI refresh (status spinner, redraw).
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Ask the app to start a position lookup. Sent once shortly after
    /// startup; the `r` key goes through the same path.
    Locate,
    /// A position lookup finished, successfully or not.
    Position(Result<Coordinate, LocationError>),
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and handed to spawned tasks (the lookup task, the startup
/// auto-locate timer), while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop. A background task polls
/// crossterm with a timeout and sends [`Event::Input`] on key press and
/// [`Event::Tick`] at the configured interval.
pub struct EventHandler {
    /// Sender for posting events from outside the input task.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task runs until the process exits. It polls crossterm
    /// with a timeout of `tick_rate_ms`; when a key is pressed it sends
    /// [`Event::Input`], and when the tick interval elapses it sends
    /// [`Event::Tick`].
    ///
    /// # Panics
    ///
    /// The background task may panic if crossterm `poll` or `read` fails
    /// (e.g. terminal disconnected). The main loop does not protect against
    /// this.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                if event::poll(timeout).expect("Poll failed") {
                    if let CrosstermEvent::Key(key) = event::read().expect("Read failed") {
                        event_tx.send(Event::Input(key)).ok();
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    event_tx.send(Event::Tick).ok();
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` when all senders have been dropped (e.g. the input
    /// task exited).
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
