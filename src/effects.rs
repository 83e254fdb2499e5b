use notify_rust::{Notification, Urgency};
use std::{
    cell::RefCell,
    path::Path,
    process::{Command, Stdio},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Played when a countdown completes.
    Chime,
    /// Played on explicit user interaction.
    Click,
}

pub trait CuePlayer {
    fn play(&self, cue: Cue);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

pub trait Notifier {
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Permission;
    fn notify(&self, title: &str, body: &str);
}

/// Plays freedesktop sound theme files through whichever player is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopCues;

impl DesktopCues {
    fn candidates(cue: Cue) -> &'static [(&'static str, &'static str)] {
        match cue {
            Cue::Chime => &[
                ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
                ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
                ("aplay", "/usr/share/sounds/generic.wav"),
            ],
            Cue::Click => &[
                ("paplay", "/usr/share/sounds/freedesktop/stereo/audio-volume-change.oga"),
                ("aplay", "/usr/share/sounds/sound-icons/percussion-10.wav"),
            ],
        }
    }
}

impl CuePlayer for DesktopCues {
    fn play(&self, cue: Cue) {
        let candidates = Self::candidates(cue);
        std::thread::spawn(move || {
            let Some(&(cmd, file)) = candidates.iter().find(|(_, f)| Path::new(f).exists()) else {
                tracing::debug!(?cue, "no sound file available for cue");
                return;
            };
            if let Err(e) = Command::new(cmd)
                .arg(file)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                tracing::warn!(?cue, player = cmd, error = %e, "cue playback failed");
            }
        });
    }
}

/// Desktop notifications through the session notification daemon.
#[derive(Debug)]
pub struct DesktopNotifier {
    permission: Permission,
    allowed: bool,
}

impl DesktopNotifier {
    /// `allowed = false` makes every permission request come back denied.
    pub fn new(allowed: bool) -> Self {
        Self { permission: Permission::Default, allowed }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission = if self.allowed { Permission::Granted } else { Permission::Denied };
        self.permission
    }

    fn notify(&self, title: &str, body: &str) {
        if self.permission != Permission::Granted {
            return;
        }
        if let Err(e) = Notification::new()
            .summary(title)
            .body(body)
            .appname("keshi")
            .icon("alarm-clock")
            .urgency(Urgency::Critical)
            .show()
        {
            tracing::warn!(error = %e, "desktop notification failed");
        }
    }
}

/// Records cues instead of playing them. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingCues {
    played: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingCues {
    pub fn played(&self) -> Vec<Cue> {
        self.played.borrow().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.borrow().iter().filter(|c| **c == cue).count()
    }
}

impl CuePlayer for RecordingCues {
    fn play(&self, cue: Cue) {
        self.played.borrow_mut().push(cue);
    }
}

/// Records delivered notifications. Clones share the same log.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    permission: Permission,
    grant: bool,
    sent: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new(grant: bool) -> Self {
        Self { permission: Permission::Default, grant, sent: Rc::default() }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission = if self.grant { Permission::Granted } else { Permission::Denied };
        self.permission
    }

    fn notify(&self, title: &str, body: &str) {
        if self.permission == Permission::Granted {
            self.sent.borrow_mut().push((title.to_owned(), body.to_owned()));
        }
    }
}
