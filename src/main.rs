use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use keshi::{
    app::App,
    clock::SystemClock,
    effects::{DesktopCues, DesktopNotifier},
    radio::{MpvPlayer, Radio},
    store::{FileStorage, MemoryStorage, Storage},
    theme::ThemeStore,
    timer::{self, Timer},
    ui,
};
use ratatui::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Parser, Clone)]
#[command(author, version, about = "keshi - a moody terminal Pomodoro timer")]
struct Args {
    /// Focus length, e.g. 25, 25m, 1h30m
    #[arg(short, long, value_parser = parse_minutes)]
    focus: Option<u32>,
    /// Break length, e.g. 5, 5m
    #[arg(short, long = "break", value_parser = parse_minutes)]
    break_: Option<u32>,
    #[arg(long)]
    no_sound: bool,
    #[arg(long)]
    no_notify: bool,
    /// Where settings, history and theme are stored
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_minutes(s: &str) -> std::result::Result<u32, String> {
    timer::parse_minutes(s).map_err(|e| e.to_string())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("keshi"))
        .unwrap_or_else(|| PathBuf::from("keshi"))
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "keshi=info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_storage(dir: &Path) -> Rc<dyn Storage> {
    match FileStorage::new(dir) {
        Ok(storage) => Rc::new(storage),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "data dir unavailable, nothing will be saved");
            Rc::new(MemoryStorage::new())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    let log_file = args.log_file.clone().unwrap_or_else(|| data_dir.join("keshi.log"));
    init_logging(&log_file)?;

    let storage = open_storage(&data_dir);
    let mut timer = Timer::new(
        storage.clone(),
        Rc::new(SystemClock),
        Box::new(DesktopCues),
        Box::new(DesktopNotifier::new(!args.no_notify)),
    );
    timer.override_durations(args.focus, args.break_);
    if args.no_sound {
        timer.mute();
    }
    tracing::info!(
        data_dir = %data_dir.display(),
        focus_minutes = timer.settings().focus_minutes,
        break_minutes = timer.settings().break_minutes,
        "keshi starting"
    );

    let theme = ThemeStore::load(storage.clone());
    let radio = Radio::new(storage, Box::new(MpvPlayer));
    let mut app = App::new(timer, theme, radio);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
    terminal.show_cursor()?;

    app.radio.stop();
    tracing::info!("keshi exiting");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::FocusGained => app.on_focus_gained(),
                _ => {}
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}
