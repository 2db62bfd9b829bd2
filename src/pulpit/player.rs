//! Playback controller: keeps UI-level play/pause/seek/rate intent in step
//! with a single underlying audio transport, across track changes.
//!
//! The transport itself (a media element, a decoder, a test double) arrives
//! through the [`Transport`] trait; this module owns only the state
//! synchronization rules.

use tracing::warn;

use crate::error::Result;
use crate::model::Sermon;

/// Playback rate cycle, in cycling order. Default is the first entry.
pub const PLAYBACK_RATES: [f64; 5] = [1.0, 1.25, 1.5, 2.0, 0.75];

/// The single underlying audio transport.
pub trait Transport {
    /// Begin loading the resource at `url`, replacing whatever was loaded.
    fn load(&mut self, url: &str);

    /// Start or resume playback. Errors when the transport cannot start
    /// (decode failure, rejected autoplay, dead stream).
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Total duration in seconds, once known. `None` while nothing is loaded
    /// or metadata has not arrived yet.
    fn duration(&self) -> Option<f64>;

    /// Current position in seconds.
    fn position(&self) -> f64;

    /// Relocate to an absolute position. Clamping to the valid range is the
    /// transport's responsibility.
    fn set_position(&mut self, seconds: f64);

    fn set_rate(&mut self, rate: f64);
}

pub struct PlayerController<T: Transport> {
    transport: T,
    current: Option<Sermon>,
    playing: bool,
    rate_index: usize,
}

impl<T: Transport> PlayerController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            current: None,
            playing: false,
            rate_index: 0,
        }
    }

    /// The sermon currently loaded, if any. Retained after natural end so a
    /// replay affordance can be shown.
    pub fn current(&self) -> Option<&Sermon> {
        self.current.as_ref()
    }

    /// Play intent as last confirmed against the transport. Never reports
    /// playing when the transport failed to start.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rate(&self) -> f64 {
        PLAYBACK_RATES[self.rate_index]
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Select `sermon` for playback.
    ///
    /// A different sermon loads its audio, applies the current rate and starts
    /// playing; intent flips to playing only once the transport confirms the
    /// start. The already-loaded sermon instead toggles play/pause without
    /// reloading — a toggle must never reload the resource.
    pub fn select_track(&mut self, sermon: &Sermon) {
        let same_track = self
            .current
            .as_ref()
            .map(|c| c.id == sermon.id)
            .unwrap_or(false);

        if !same_track {
            self.transport.load(&sermon.audio_url);
            self.transport.set_rate(self.rate());
            self.current = Some(sermon.clone());
            self.playing = self.try_play();
            return;
        }

        if self.playing {
            self.transport.pause();
            self.playing = false;
        } else {
            self.playing = self.try_play();
        }
    }

    /// Relocate to `fraction` (0–100) of the transport-reported duration.
    /// No-op while the duration is unknown.
    pub fn seek(&mut self, fraction: f64) {
        let Some(duration) = self.transport.duration() else {
            return;
        };
        let fraction = fraction.clamp(0.0, 100.0);
        self.transport.set_position(duration * fraction / 100.0);
    }

    /// Adjust position by a relative offset in seconds; may be negative.
    pub fn skip(&mut self, delta_seconds: f64) {
        let position = self.transport.position();
        self.transport.set_position(position + delta_seconds);
    }

    /// Advance the playback rate through the fixed cycle and apply it live —
    /// no reload, no playback interruption.
    pub fn cycle_rate(&mut self) -> f64 {
        self.rate_index = (self.rate_index + 1) % PLAYBACK_RATES.len();
        let rate = self.rate();
        self.transport.set_rate(rate);
        rate
    }

    /// Natural end of track: intent resets, the track reference stays.
    pub fn handle_ended(&mut self) {
        self.playing = false;
    }

    fn try_play(&mut self) -> bool {
        match self.transport.play() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "transport failed to start playback");
                false
            }
        }
    }
}
