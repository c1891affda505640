mod audio;
mod audio_api;
mod config;
mod error;
mod middle;
mod playback;
mod scheduler;
mod sequence;
mod shared;
mod timer;
mod transport;
mod tui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::terminal;
use env_logger::{Builder, Env, Target};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio::{SoundBank, Speaker};
use middle::Middle;
use shared::InputEvent;

const LOG_FILE: &str = "clavetty.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir().context("no current directory")?,
    };
    let data_dir = config::data_dir(&project_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    setup_logger(&data_dir)?;

    if config::save_default_config(&project_dir)? {
        log::info!("wrote starter config to {}", data_dir.display());
    }
    let config = config::load_config(&project_dir)?;

    let audio = audio::start_audio()?;
    let bank = SoundBank::load(&project_dir, audio.sample_rate(), |cmd| {
        if !audio.send(cmd) {
            log::warn!("command queue full while registering samples");
        }
    });
    let clock = audio.clock();
    let speaker = Speaker::new(audio, bank);
    let mut middle = Middle::new(clock, speaker, &config)?;

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // restores the terminal on every exit path

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 500) % 2 == 0;
        let ds = middle.display_state();
        term.draw(|frame| {
            let area = frame.area();
            tui::view::render(frame, area, &ds, tui_state.focus, blink_on);
        })?;

        // wake up early if the scheduler is due before the next frame
        let timeout = middle
            .time_until_wake(Instant::now())
            .map_or(frame_rate, |wake| wake.min(frame_rate));
        let events = tui::input::poll_input(timeout, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                middle.handle_input(event, Instant::now());
                log::info!("quit");
                return Ok(());
            }
            middle.handle_input(event, Instant::now());
        }

        middle.tick(Instant::now());
    }
}

// The terminal is in raw mode while the UI runs, so log lines go to a file.
fn setup_logger(data_dir: &Path) -> anyhow::Result<()> {
    let path = data_dir.join(LOG_FILE);
    let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init(); // already initialized
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
