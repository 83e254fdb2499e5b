//! Ambient radio backed by an external `mpv` process.

use crate::store::{self, Storage};
use std::{
    io,
    process::{Child, Command, Stdio},
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub name: &'static str,
    pub short_name: &'static str,
    pub video_id: &'static str,
}

impl Station {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

pub static STATIONS: [Station; 4] = [
    Station { name: "Lofi Girl", short_name: "LOFI", video_id: "jfKfPfyJRdk" },
    Station { name: "Chillhop Music", short_name: "CHILL", video_id: "5yx6BWlEVcY" },
    Station { name: "Lofi Cafe", short_name: "CAFE", video_id: "h2zkV-l_TbY" },
    Station { name: "Jazz Hop Café", short_name: "JAZZ", video_id: "-5KAN9_CzSA" },
];

pub const DEFAULT_VOLUME: u8 = 50;
const VOLUME_STEP: u8 = 10;

/// Launches a stream at `volume` (0-100). Swappable so tests never spawn
/// processes.
pub trait Player {
    fn spawn(&self, url: &str, volume: u8) -> io::Result<Child>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MpvPlayer;

impl Player for MpvPlayer {
    fn spawn(&self, url: &str, volume: u8) -> io::Result<Child> {
        Command::new("mpv")
            .args(["--no-video", "--really-quiet"])
            .arg(format!("--volume={volume}"))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

pub struct Radio {
    station: usize,
    child: Option<Child>,
    volume: u8,
    muted: bool,
    tooltip_seen: bool,
    player: Box<dyn Player>,
    storage: Rc<dyn Storage>,
}

impl Radio {
    pub fn new(storage: Rc<dyn Storage>, player: Box<dyn Player>) -> Self {
        let tooltip_seen = store::load(storage.as_ref(), store::RADIO_TOOLTIP_SEEN).unwrap_or(false);
        Self {
            station: 0,
            child: None,
            volume: DEFAULT_VOLUME,
            muted: false,
            tooltip_seen,
            player,
            storage,
        }
    }

    pub fn station(&self) -> &'static Station {
        &STATIONS[self.station]
    }

    pub fn is_playing(&self) -> bool {
        self.child.is_some()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// What the player is actually asked for: zero while muted.
    pub fn effective_volume(&self) -> u8 {
        if self.muted { 0 } else { self.volume }
    }

    /// Drops the child if the player exited on its own, e.g. a dead stream.
    pub fn reap(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                tracing::warn!(station = self.station().name, %status, "radio player exited");
                self.child = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "radio player status unavailable");
                self.child = None;
            }
        }
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.volume.saturating_add(VOLUME_STEP));
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume.saturating_sub(VOLUME_STEP));
    }

    /// Clamps to 0-100. Zero mutes; anything louder unmutes.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.muted = self.volume == 0;
        self.restart();
    }

    pub fn toggle_mute(&mut self) {
        if self.muted && self.volume == 0 {
            self.volume = DEFAULT_VOLUME;
        }
        self.muted = !self.muted;
        self.restart();
    }

    pub fn show_tooltip(&self) -> bool {
        !self.tooltip_seen
    }

    pub fn dismiss_tooltip(&mut self) {
        if !self.tooltip_seen {
            self.tooltip_seen = true;
            store::persist(self.storage.as_ref(), store::RADIO_TOOLTIP_SEEN, &true);
        }
    }

    pub fn toggle(&mut self) {
        self.dismiss_tooltip();
        self.reap();
        if self.is_playing() {
            self.stop();
        } else {
            self.play();
        }
    }

    pub fn next_station(&mut self) {
        self.dismiss_tooltip();
        self.station = (self.station + 1) % STATIONS.len();
        self.restart();
    }

    /// mpv takes its volume at launch, so a running stream is relaunched.
    fn restart(&mut self) {
        self.reap();
        if self.is_playing() {
            self.stop();
            self.play();
        }
    }

    fn play(&mut self) {
        let station = self.station();
        let volume = self.effective_volume();
        match self.player.spawn(&station.url(), volume) {
            Ok(child) => {
                tracing::info!(station = station.name, volume, "radio playing");
                self.child = Some(child);
            }
            Err(e) => tracing::warn!(station = station.name, error = %e, "radio player unavailable"),
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::info!("radio stopped");
        }
    }
}

impl Drop for Radio {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use std::{cell::RefCell, thread, time::Duration};

    struct MissingPlayer;

    impl Player for MissingPlayer {
        fn spawn(&self, _url: &str, _volume: u8) -> io::Result<Child> {
            Err(io::Error::new(io::ErrorKind::NotFound, "mpv"))
        }
    }

    /// Records the volume of each launch attempt, then fails like a missing mpv.
    #[derive(Default, Clone)]
    struct VolumeLog(Rc<RefCell<Vec<u8>>>);

    impl Player for VolumeLog {
        fn spawn(&self, _url: &str, volume: u8) -> io::Result<Child> {
            self.0.borrow_mut().push(volume);
            Err(io::Error::new(io::ErrorKind::NotFound, "mpv"))
        }
    }

    /// Stands in for a stream that dies right after launch.
    struct ShortLived;

    impl Player for ShortLived {
        fn spawn(&self, _url: &str, _volume: u8) -> io::Result<Child> {
            Command::new("true").stdout(Stdio::null()).stderr(Stdio::null()).spawn()
        }
    }

    fn radio(storage: Rc<dyn Storage>) -> Radio {
        Radio::new(storage, Box::new(MissingPlayer))
    }

    #[test]
    fn tooltip_is_shown_until_dismissed_and_remembered() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        let mut r = radio(storage.clone());
        assert!(r.show_tooltip());
        r.dismiss_tooltip();
        assert!(!r.show_tooltip());
        assert!(!radio(storage).show_tooltip());
    }

    #[test]
    fn missing_player_degrades_to_off() {
        let mut r = radio(Rc::new(MemoryStorage::new()));
        r.toggle();
        assert!(!r.is_playing());
        assert!(!r.show_tooltip());
    }

    #[test]
    fn volume_is_clamped_and_passed_to_the_player() {
        let log = VolumeLog::default();
        let mut r = Radio::new(Rc::new(MemoryStorage::new()), Box::new(log.clone()));
        assert_eq!(r.volume(), DEFAULT_VOLUME);

        r.volume_down();
        r.volume_down();
        r.toggle();
        r.set_volume(250);
        assert_eq!(r.volume(), 100);
        r.toggle();
        assert_eq!(*log.0.borrow(), vec![30, 100]);
    }

    #[test]
    fn mute_sends_zero_and_zero_volume_mutes() {
        let log = VolumeLog::default();
        let mut r = Radio::new(Rc::new(MemoryStorage::new()), Box::new(log.clone()));
        r.toggle_mute();
        assert!(r.is_muted());
        r.toggle();
        assert_eq!(r.effective_volume(), 0);
        assert_eq!(r.volume(), DEFAULT_VOLUME);

        r.toggle_mute();
        assert!(!r.is_muted());
        r.set_volume(0);
        assert!(r.is_muted());
        r.volume_up();
        assert!(!r.is_muted());
        assert_eq!(r.volume(), 10);
        assert_eq!(*log.0.borrow(), vec![0]);
    }

    #[cfg(unix)]
    #[test]
    fn exited_player_is_reaped() {
        let mut r = Radio::new(Rc::new(MemoryStorage::new()), Box::new(ShortLived));
        r.toggle();
        assert!(r.is_playing());
        for _ in 0..100 {
            r.reap();
            if !r.is_playing() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!r.is_playing());
    }

    #[test]
    fn stations_wrap_around() {
        let mut r = radio(Rc::new(MemoryStorage::new()));
        for _ in 0..STATIONS.len() {
            r.next_station();
        }
        assert_eq!(r.station().short_name, "LOFI");
        assert_eq!(r.station().url(), "https://www.youtube.com/watch?v=jfKfPfyJRdk");
    }
}
