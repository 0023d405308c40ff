use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::Path, time::Duration};
use vendo_tui::{
    app::App,
    config::Config,
    events::{Event, EventHandler},
    location, logging, machines, ui,
};

/// Delay between startup and the automatic position request, so the first
/// frame is on screen before the lookup begins.
const AUTO_LOCATE_DELAY_MS: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    // Configuration, dataset, and the position capability. Load failures
    // surface here, before the terminal is switched into raw mode.
    let config = Config::load();
    let catalog = machines::load_machines(Path::new(&config.data.machines_path))?;
    let provider = location::provider_from_config(&config.location);

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new(150); // High tick rate for smooth animation
    let mut app = App::new(config, catalog, provider, events.tx.clone());

    // Ask for the user's position once, shortly after the UI is up. The 'r'
    // key re-enters the same path later.
    let locate_tx = events.tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(AUTO_LOCATE_DELAY_MS)).await;
        let _ = locate_tx.send(Event::Locate);
    });

    // Main loop
    let mut event_handler = events;
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = event_handler.next().await {
            match event {
                Event::Tick => app.on_tick(),
                Event::Input(key) => app.handle_key(key),
                Event::Locate => app.request_position(),
                Event::Position(outcome) => app.apply_position(outcome),
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
