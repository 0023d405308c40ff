use crate::config::Config;
use crate::events::Event;
use crate::geo::Coordinate;
use crate::location::{Acquisition, LocationError, PositionProvider};
use crate::machines::{self, MachineRecord, RankedMachine};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ViewMode {
    Dashboard,
    Map,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Dashboard
    }
}

impl ViewMode {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("map") {
            ViewMode::Map
        } else {
            ViewMode::Dashboard
        }
    }
}

pub struct App {
    pub config: Config,
    pub view_mode: ViewMode,
    pub machines: Vec<RankedMachine>,
    pub selected_index: usize,
    pub acquisition: Acquisition,
    pub user_position: Option<Coordinate>,
    pub located_at: Option<DateTime<Local>>,
    pub tick_count: usize,
    pub should_quit: bool,

    // The immutable dataset; `machines` is re-derived from it on each fix.
    catalog: Vec<MachineRecord>,
    provider: Option<Arc<dyn PositionProvider>>,
    tx: UnboundedSender<Event>,
}

impl App {
    pub fn new(
        config: Config,
        catalog: Vec<MachineRecord>,
        provider: Option<Arc<dyn PositionProvider>>,
        tx: UnboundedSender<Event>,
    ) -> Self {
        let machines = machines::unranked(&catalog);
        Self {
            view_mode: ViewMode::from_name(&config.ui.default_view),
            config,
            machines,
            selected_index: 0,
            acquisition: Acquisition::new(),
            user_position: None,
            located_at: None,
            tick_count: 0,
            should_quit: false,
            catalog,
            provider,
            tx,
        }
    }

    pub fn selected(&self) -> Option<&RankedMachine> {
        self.machines.get(self.selected_index)
    }

    pub fn on_tick(&mut self) {
        self.tick_count += 1;
    }

    /// Kicks off a position lookup on the configured provider.
    ///
    /// With no provider the acquisition fails immediately as unsupported.
    /// While a lookup is already in flight this is a no-op, so hammering the
    /// retry key never spawns a second lookup.
    pub fn request_position(&mut self) {
        let Some(provider) = self.provider.clone() else {
            self.acquisition.mark_unsupported();
            return;
        };
        if !self.acquisition.request() {
            return;
        }
        let options = self.config.location.lookup_options();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = provider.locate(&options).await;
            tx.send(Event::Position(outcome)).ok();
        });
    }

    /// Feeds a lookup outcome into the acquisition and, on success,
    /// re-ranks the list around the new fix. A failure changes only the
    /// status pane; the displayed list keeps whatever ordering it had.
    pub fn apply_position(&mut self, outcome: Result<Coordinate, LocationError>) {
        if !self.acquisition.resolve(outcome) {
            return;
        }
        if let Some(position) = self.acquisition.position() {
            self.user_position = Some(position);
            self.located_at = Some(Local::now());
            self.rerank(position);
        }
    }

    fn rerank(&mut self, origin: Coordinate) {
        // Keep the cursor on the same machine across the reshuffle.
        let followed = self.selected().map(|m| m.record.id.clone());
        self.machines = machines::rank(origin, &self.catalog);
        self.selected_index = followed
            .and_then(|id| self.machines.iter().position(|m| m.record.id == id))
            .unwrap_or(0);
        info!(count = self.machines.len(), "re-ranked machines by distance");
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.machines.is_empty() {
                    self.selected_index = (self.selected_index + 1) % self.machines.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.machines.is_empty() {
                    self.selected_index = self
                        .selected_index
                        .checked_sub(1)
                        .unwrap_or(self.machines.len() - 1);
                }
            }
            KeyCode::Char('r') => self.request_position(),
            KeyCode::Char('1') => self.view_mode = ViewMode::Dashboard,
            KeyCode::Char('2') => self.view_mode = ViewMode::Map,
            KeyCode::Tab => {
                self.view_mode = match self.view_mode {
                    ViewMode::Dashboard => ViewMode::Map,
                    ViewMode::Map => ViewMode::Dashboard,
                };
            }
            _ => {}
        }
    }
}
