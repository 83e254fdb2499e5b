use crate::{
    analytics::{self, Insights},
    history::Session,
    radio::Radio,
    theme::{Side, ThemeStore},
    timer::{self, Mode, Timer},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum View {
    Timer,
    Help,
    Settings,
    History,
    Insights,
    Theme,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SettingsField {
    FocusDuration,
    BreakDuration,
    Sound,
}

impl SettingsField {
    pub const ALL: [Self; 3] = [Self::FocusDuration, Self::BreakDuration, Self::Sound];

    fn next(self) -> Self {
        match self {
            Self::FocusDuration => Self::BreakDuration,
            Self::BreakDuration => Self::Sound,
            Self::Sound => Self::FocusDuration,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::FocusDuration => Self::Sound,
            Self::BreakDuration => Self::FocusDuration,
            Self::Sound => Self::BreakDuration,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ThemeField {
    FocusColor,
    BreakColor,
    LeftImage,
    RightImage,
    Reset,
}

impl ThemeField {
    pub const ALL: [Self; 5] =
        [Self::FocusColor, Self::BreakColor, Self::LeftImage, Self::RightImage, Self::Reset];

    fn next(self) -> Self {
        match self {
            Self::FocusColor => Self::BreakColor,
            Self::BreakColor => Self::LeftImage,
            Self::LeftImage => Self::RightImage,
            Self::RightImage => Self::Reset,
            Self::Reset => Self::FocusColor,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::FocusColor => Self::Reset,
            Self::BreakColor => Self::FocusColor,
            Self::LeftImage => Self::BreakColor,
            Self::RightImage => Self::LeftImage,
            Self::Reset => Self::RightImage,
        }
    }

    fn side(self) -> Option<Side> {
        match self {
            Self::LeftImage => Some(Side::Left),
            Self::RightImage => Some(Side::Right),
            _ => None,
        }
    }
}

pub struct App {
    pub timer: Timer,
    pub theme: ThemeStore,
    pub radio: Radio,
    pub view: View,
    pub settings_field: SettingsField,
    pub theme_field: ThemeField,
    pub editing: bool,
    pub input: String,
    pub confirming_clear: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new(timer: Timer, theme: ThemeStore, radio: Radio) -> Self {
        Self {
            timer,
            theme,
            radio,
            view: View::Timer,
            settings_field: SettingsField::FocusDuration,
            theme_field: ThemeField::FocusColor,
            editing: false,
            input: String::new(),
            confirming_clear: false,
            status: None,
        }
    }

    pub fn accent(&self) -> ratatui::style::Color {
        self.theme.accent(self.timer.mode())
    }

    /// Derived fresh from the log on every call.
    pub fn insights(&self) -> Insights {
        analytics::insights(self.timer.history().sessions(), chrono::Local::now().date_naive())
    }

    pub fn on_tick(&mut self) {
        self.radio.reap();
        let completed = self.timer.tick();
        self.record(completed);
    }

    pub fn on_focus_gained(&mut self) {
        let completed = self.timer.on_visibility_restored();
        self.record(completed);
    }

    fn record(&mut self, completed: Option<Session>) {
        if let Some(session) = completed {
            self.status = Some(format!(
                "{} session logged ({}m). Up next: {}",
                session.mode.name(),
                session.duration,
                self.timer.mode().name()
            ));
        }
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.editing {
            match key.code {
                KeyCode::Char(c) => self.input.push(c),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Enter => self.apply_input(),
                KeyCode::Esc => {
                    self.editing = false;
                    self.input.clear();
                }
                _ => {}
            }
            return false;
        }

        if self.confirming_clear {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.timer.clear_history();
                    self.status = Some("History cleared".into());
                    self.confirming_clear = false;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirming_clear = false;
                }
                _ => {}
            }
            return false;
        }

        match self.view {
            View::Timer => self.handle_timer_view(key),
            View::Settings => {
                self.handle_settings_view(key);
                false
            }
            View::Theme => {
                self.handle_theme_view(key);
                false
            }
            View::History => {
                self.handle_history_view(key);
                false
            }
            View::Help | View::Insights => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.view = View::Timer;
                }
                false
            }
        }
    }

    fn open(&mut self, view: View) {
        self.timer.click();
        self.view = view;
        self.status = None;
    }

    fn handle_timer_view(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') => {
                self.timer.click();
                let completed = self.timer.toggle();
                self.record(completed);
            }
            KeyCode::Char('r') => {
                self.timer.click();
                self.timer.reset();
            }
            KeyCode::Char('m') => {
                self.timer.click();
                self.timer.switch_mode(self.timer.mode().other());
            }
            KeyCode::Char('a') => self.radio.toggle(),
            KeyCode::Char('n') => self.radio.next_station(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.radio.volume_up(),
            KeyCode::Char('-') => self.radio.volume_down(),
            KeyCode::Char('x') => self.radio.toggle_mute(),
            KeyCode::Char('s') => self.open(View::Settings),
            KeyCode::Char('h') => self.open(View::History),
            KeyCode::Char('i') => self.open(View::Insights),
            KeyCode::Char('c') => self.open(View::Theme),
            KeyCode::Char('?') => self.open(View::Help),
            _ => {}
        }
        false
    }

    fn handle_settings_view(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.view = View::Timer,
            KeyCode::Down | KeyCode::Char('j') => self.settings_field = self.settings_field.next(),
            KeyCode::Up | KeyCode::Char('k') => self.settings_field = self.settings_field.prev(),
            KeyCode::Enter | KeyCode::Char('e') => {
                let settings = *self.timer.settings();
                let current = match self.settings_field {
                    SettingsField::FocusDuration => settings.focus_minutes,
                    SettingsField::BreakDuration => settings.break_minutes,
                    SettingsField::Sound => {
                        self.toggle_sound();
                        return;
                    }
                };
                self.input = current.to_string();
                self.editing = true;
            }
            KeyCode::Char(' ') if self.settings_field == SettingsField::Sound => self.toggle_sound(),
            _ => {}
        }
    }

    fn toggle_sound(&mut self) {
        let enabled = !self.timer.settings().sound_enabled;
        self.timer.set_sound_enabled(enabled);
    }

    fn handle_theme_view(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.view = View::Timer,
            KeyCode::Down | KeyCode::Char('j') => self.theme_field = self.theme_field.next(),
            KeyCode::Up | KeyCode::Char('k') => self.theme_field = self.theme_field.prev(),
            KeyCode::Enter | KeyCode::Char('e') => match self.theme_field {
                ThemeField::FocusColor => self.edit(self.theme.colors().focus.clone()),
                ThemeField::BreakColor => self.edit(self.theme.colors().break_.clone()),
                ThemeField::LeftImage | ThemeField::RightImage => self.edit(String::new()),
                ThemeField::Reset => {
                    self.theme.reset();
                    self.status = Some("Theme reset".into());
                }
            },
            KeyCode::Left | KeyCode::Char('h') => self.cycle_color(-1),
            KeyCode::Right | KeyCode::Char('l') => self.cycle_color(1),
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(side) = self.theme_field.side() {
                    self.theme.update_image(side, None);
                }
            }
            _ => {}
        }
    }

    fn cycle_color(&mut self, step: isize) {
        let mode = match self.theme_field {
            ThemeField::FocusColor => Mode::Focus,
            ThemeField::BreakColor => Mode::Break,
            _ => return,
        };
        self.status = match self.theme.cycle_color(mode, step) {
            Ok(preset) => Some(format!("{} accent: {}", mode.name(), preset.name)),
            Err(e) => Some(e.to_string()),
        };
    }

    fn handle_history_view(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.view = View::Timer,
            KeyCode::Char('i') => self.view = View::Insights,
            KeyCode::Char('c') | KeyCode::Char('d') => {
                if !self.timer.history().is_empty() {
                    self.confirming_clear = true;
                }
            }
            _ => {}
        }
    }

    fn edit(&mut self, initial: String) {
        self.input = initial;
        self.editing = true;
    }

    fn apply_input(&mut self) {
        let input = std::mem::take(&mut self.input);
        self.editing = false;

        let result = match self.view {
            View::Settings => timer::parse_minutes(&input).and_then(|m| match self.settings_field {
                SettingsField::FocusDuration => self.timer.set_focus_minutes(m),
                SettingsField::BreakDuration => self.timer.set_break_minutes(m),
                SettingsField::Sound => Ok(()),
            }),
            View::Theme => match self.theme_field {
                ThemeField::FocusColor => self.theme.update_color(Mode::Focus, &input),
                ThemeField::BreakColor => self.theme.update_color(Mode::Break, &input),
                ThemeField::LeftImage | ThemeField::RightImage if input.trim().is_empty() => Ok(()),
                ThemeField::LeftImage => self.theme.load_image(Side::Left, &expand(&input)),
                ThemeField::RightImage => self.theme.load_image(Side::Right, &expand(&input)),
                ThemeField::Reset => Ok(()),
            },
            _ => Ok(()),
        };

        self.status = match result {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        };
    }
}

/// Expands a leading `~/` to the home directory.
fn expand(input: &str) -> PathBuf {
    let input = input.trim();
    match (input.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(input),
    }
}
