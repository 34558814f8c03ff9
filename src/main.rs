use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui_slides::app::App;
use tui_slides::config::Config;
use tui_slides::ui;

const FRAME: Duration = Duration::from_millis(16);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_logging(&config)?;
    info!("Starting with {:?}", config);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config).await;

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// stdout belongs to the UI, so logs go to a file
fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tui_slides=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
    let size = terminal.size()?;
    let tick = config.tick;
    let mut app = App::new(config, size.width, size.height);
    app.start().await;

    let mut frames = tokio::time::interval(FRAME);
    let mut ticks = tokio::time::interval(tick);
    let mut last_frame = Instant::now();

    // Main loop
    while !app.should_quit {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                app.frame(now - last_frame);
                last_frame = now;

                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        // Only handle key press events (not release)
                        Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                        Event::Mouse(mouse) => app.handle_mouse(mouse),
                        Event::Resize(width, height) => app.resize(width, height),
                        _ => {}
                    }
                }

                app.pump().await;
                terminal.draw(|frame| ui::render(frame, &app))?;
            }
            _ = ticks.tick() => {
                app.tick();
            }
        }
    }

    app.shutdown();
    info!("Bye");
    Ok(())
}
