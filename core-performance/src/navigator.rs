//! # Performance Navigator
//!
//! Tracks which song of the setlist is on screen.
//!
//! `current_index` is `Some` whenever the song list is non-empty and always
//! in range. Invalid requests (stepping past either end, jumping out of
//! range, unknown keys) leave the state untouched.

use bridge_traits::content::SongRef;
use bridge_traits::ui::{ExitSignal, NoopExitSignal};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PerformanceEvent};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::NavigatorConfig;
use crate::keys::NavKey;

pub struct PerformanceNavigator {
    songs: Vec<SongRef>,
    current: Option<usize>,
    config: NavigatorConfig,
    exit_signal: Arc<dyn ExitSignal>,
    event_bus: Option<EventBus>,
}

impl PerformanceNavigator {
    /// Start at the first song, if any.
    pub fn new(songs: Vec<SongRef>) -> Self {
        let current = if songs.is_empty() { None } else { Some(0) };
        Self {
            songs,
            current,
            config: NavigatorConfig::default(),
            exit_signal: Arc::new(NoopExitSignal),
            event_bus: None,
        }
    }

    /// Navigator wired to the runtime's exit signal, latency budget and
    /// event bus.
    pub fn from_core_config(config: &CoreConfig, songs: Vec<SongRef>) -> Self {
        let mut navigator = Self::new(songs)
            .with_config(NavigatorConfig::from(config))
            .with_exit_signal(config.exit_signal.clone());
        navigator.event_bus = config.event_bus.clone();
        navigator
    }

    pub fn with_config(mut self, config: NavigatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_exit_signal(mut self, exit_signal: Arc<dyn ExitSignal>) -> Self {
        self.exit_signal = exit_signal;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_song(&self) -> Option<&SongRef> {
        self.current.and_then(|i| self.songs.get(i))
    }

    pub fn songs(&self) -> &[SongRef] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn can_go_next(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.songs.len())
    }

    pub fn can_go_previous(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    /// One-based position for display, e.g. `"3 / 12"`.
    pub fn position_label(&self) -> String {
        match self.current {
            Some(i) => format!("{} / {}", i + 1, self.songs.len()),
            None => "0 / 0".to_string(),
        }
    }

    /// Advance one song. Returns `true` if the current song changed.
    pub fn next(&mut self) -> bool {
        self.timed("next", |nav| {
            if !nav.can_go_next() {
                return false;
            }
            let target = nav.current.map_or(0, |i| i + 1);
            nav.set_current(target)
        })
    }

    /// Go back one song. Returns `true` if the current song changed.
    pub fn previous(&mut self) -> bool {
        self.timed("previous", |nav| {
            if !nav.can_go_previous() {
                return false;
            }
            let target = nav.current.map_or(0, |i| i - 1);
            nav.set_current(target)
        })
    }

    /// Jump to `index`. Out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        self.timed("go_to", |nav| {
            if index >= nav.songs.len() {
                debug!(index, len = nav.songs.len(), "Ignoring out-of-range jump");
                return false;
            }
            nav.set_current(index)
        })
    }

    /// Replace the song list, keeping the current index when it is still
    /// valid and clamping it otherwise.
    pub fn set_songs(&mut self, songs: Vec<SongRef>) {
        let previous_id = self.current_song().map(|s| s.id.clone());
        self.songs = songs;
        self.current = match (self.current, self.songs.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };

        let current_id = self.current_song().map(|s| s.id.clone());
        if current_id != previous_id {
            self.emit_song_changed();
        }
    }

    /// Apply a key press. Returns `true` if the key is a navigation key.
    ///
    /// Right/Left step through the setlist; Escape asks the host to leave
    /// performance mode.
    pub fn handle_key(&mut self, key: &NavKey) -> bool {
        match key {
            NavKey::ArrowRight => {
                self.next();
                true
            }
            NavKey::ArrowLeft => {
                self.previous();
                true
            }
            NavKey::Escape => {
                debug!("Exit requested from performance mode");
                self.exit_signal.exit_requested();
                self.emit(PerformanceEvent::ExitRequested);
                true
            }
            NavKey::Other(_) => false,
        }
    }

    fn set_current(&mut self, index: usize) -> bool {
        if self.current == Some(index) {
            return false;
        }
        self.current = Some(index);
        self.emit_song_changed();
        true
    }

    fn emit_song_changed(&self) {
        if let (Some(index), Some(song)) = (self.current, self.current_song()) {
            self.emit(PerformanceEvent::SongChanged {
                index,
                song_id: song.id.clone(),
            });
        }
    }

    fn emit(&self, event: PerformanceEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Performance(event));
        }
    }

    fn timed<R>(&mut self, operation: &'static str, f: impl FnOnce(&mut Self) -> R) -> R {
        let started = Instant::now();
        let result = f(self);
        let elapsed = started.elapsed();
        if elapsed > self.config.latency_budget {
            warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.config.latency_budget.as_millis() as u64,
                "Navigation exceeded latency budget"
            );
        }
        result
    }
}
