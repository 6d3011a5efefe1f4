mod analyser;
mod decode;
mod media;
mod player;
mod regions;
mod spectrogram;
mod sync;
mod tap;
mod ticker;
pub mod transform;
mod waterfall;

pub use analyser::LiveAnalyser;
pub use decode::{MAX_DURATION, load_decode_result};
pub use media::{MediaElement, TapToken};
pub use player::{PlaybackControl, PlaybackEvent, SAMPLE_RATE, TonePlayer, synthesize};
pub use regions::{RegionIndex, RegionSpan};
pub use spectrogram::{SpectrogramImage, SpectrogramSampler};
pub use sync::PlaybackSync;
pub use tap::{AcquisitionTap, Frame, TapVariant};
pub use ticker::TickTimer;
pub use waterfall::{BACKGROUND, BASELINE, WaterfallBuffer, WaterfallRenderer, intensity_color};

use anyhow::Result;
use flume::{Receiver, RecvError, Selector, Sender};
use log::{debug, warn};
use morsescope_messages::{Command, Event, WaterfallConfig};
use std::time::{Duration, Instant};

/// How long to wait for input while no tick is scheduled
const IDLE_POLL: Duration = Duration::from_millis(100);

enum Input {
    Command(Result<Command, RecvError>),
    Playback(Result<PlaybackEvent, RecvError>),
}

/// The waterfall engine.
/// Owns the playback sync state and processes commands, playback
/// notifications and render ticks on one thread.
pub struct Engine {
    cmd_rx: Receiver<Command>,
    playback_rx: Receiver<PlaybackEvent>,
    event_tx: Sender<Event>,
    player: Box<dyn PlaybackControl>,
    sync: PlaybackSync,
    playback_closed: bool,
    should_exit: bool,
}

impl Engine {
    /// Create a new Engine instance.
    pub fn new(
        cmd_rx: Receiver<Command>,
        playback_rx: Receiver<PlaybackEvent>,
        event_tx: Sender<Event>,
        player: Box<dyn PlaybackControl>,
        config: WaterfallConfig,
    ) -> Self {
        debug!("Constructing a new engine with {:?}", config);
        Self {
            cmd_rx,
            playback_rx,
            event_tx,
            player,
            sync: PlaybackSync::new(config),
            playback_closed: false,
            should_exit: false,
        }
    }

    /// Run the engine (blocking) until `Command::Stop`, the command channel
    /// closing, or the UI going away.
    pub fn run(mut self) -> Result<()> {
        self.emit(Event::StateSnapshot(self.sync.view_state()));
        while !self.should_exit {
            self.step();
        }
        self.player.stop();
        Ok(())
    }

    fn step(&mut self) {
        let input = {
            let mut selector = Selector::new().recv(&self.cmd_rx, Input::Command);
            if !self.playback_closed {
                selector = selector.recv(&self.playback_rx, Input::Playback);
            }
            match self.sync.deadline() {
                Some(deadline) => selector.wait_deadline(deadline),
                None => selector.wait_timeout(IDLE_POLL),
            }
        };

        match input {
            Ok(Input::Command(Ok(cmd))) => {
                debug!("Engine received command: {:?}", cmd);
                self.handle_command(cmd);
            }
            Ok(Input::Command(Err(RecvError::Disconnected))) => self.should_exit = true,
            Ok(Input::Playback(Ok(event))) => self.handle_playback(event),
            Ok(Input::Playback(Err(RecvError::Disconnected))) => {
                debug!("Playback channel closed");
                self.playback_closed = true;
                self.sync.on_finish();
            }
            // timed out: a tick may be due
            Err(_) => {}
        }

        if self.sync.poll_tick(Instant::now()) {
            if let Some(image) = self.sync.waterfall_image() {
                self.emit(Event::WaterfallFrame(image));
            }
        }
        if self.sync.take_overlay_dirty() {
            self.emit(Event::StateSnapshot(self.sync.view_state()));
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Stop => self.should_exit = true,
            Command::PlayPause => {
                if self.sync.is_playing() {
                    self.player.pause();
                } else {
                    self.player.play();
                }
            }
            Command::Seek(normalized) => {
                if normalized.is_finite() {
                    self.player.seek(normalized.clamp(0.0, 1.0));
                }
            }
            Command::ApplyDecode(result) => {
                if let Err(e) = self.sync.apply_decode(result) {
                    warn!("Rejected decode result: {e:#}");
                }
            }
            Command::Retune(freq) => {
                self.sync.retune(freq);
                self.emit(Event::StateSnapshot(self.sync.view_state()));
            }
            Command::ResizeWaterfall { width, height } => self.sync.resize(width, height),
            Command::SetWaterfallVisible(visible) => self.sync.set_visible(visible),
        }
    }

    fn handle_playback(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::MediaLoaded { media, duration } => {
                self.sync.on_media_loaded(media, duration);
                self.emit(Event::LiveChar(self.sync.live_char()));
                self.emit(Event::StateSnapshot(self.sync.view_state()));
            }
            PlaybackEvent::Spectrogram(image) => {
                self.emit(Event::Spectrogram {
                    image: image.to_image(),
                    nyquist: self.sync.sample_rate().nyquist(),
                });
                self.sync.on_spectrogram(image);
            }
            PlaybackEvent::TimeUpdate(t) => {
                if let Some(ch) = self.sync.on_time_update(t) {
                    self.emit(Event::LiveChar(ch));
                }
                self.emit(Event::Position(t));
            }
            PlaybackEvent::Play => {
                self.sync.on_play(Instant::now());
                self.emit(Event::Playing(true));
            }
            PlaybackEvent::Pause => {
                self.sync.on_pause();
                self.emit(Event::Playing(false));
            }
            PlaybackEvent::Finish => {
                self.sync.on_finish();
                self.emit(Event::Playing(false));
            }
        }
    }

    fn emit(&mut self, event: Event) {
        if self.event_tx.send(event).is_err() {
            debug!("UI disconnected, shutting down");
            self.should_exit = true;
        }
    }
}
