//! Tracker module player.
//!
//! Keeps an audio device topped up while playing and reports row changes on
//! its OSC output. Module decoding is not implemented: the rendered frames are
//! silence, but queue accounting and row timing follow real playback.

use crate::actors::osc::OscMessage;
use crate::runtime::{ActorContext, ActorHandler, ApiMessage, Message, Outcome};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(test)]
use mockall::automock;

pub const MODPLAYER_CAPABILITIES: &str = r#"capabilities
    data
        name = "file"
        type = "string"
        value = ""
        api_call = "LOAD"
    data
        name = "playing"
        type = "int"
        value = "0"
        min = "0"
        max = "1"
        api_call = "PLAY"
    data
        name = "volume"
        type = "float"
        value = "1.0"
        min = "0"
        max = "1"
        step = "0.05"
        api_call = "SET VOLUME"
outputs
    output
        type = "OSC"
"#;

pub const SAMPLE_RATE: u32 = 48_000;

/// Frames kept queued on the device while playing.
pub const TARGET_QUEUED_FRAMES: usize = 16_384;

/// Frames rendered per queue call.
const CHUNK_FRAMES: usize = 1024;

/// Frames per tracker row at the default tempo (125 BPM, speed 6).
pub const ROW_FRAMES: u64 = SAMPLE_RATE as u64 * 6 / 50;

/// Rows per pattern.
const PATTERN_ROWS: u64 = 64;

/// An output stream of interleaved stereo `i16` frames.
#[cfg_attr(test, automock)]
pub trait AudioDevice: Send {
    /// Frames queued but not yet played.
    fn queued_frames(&self) -> usize;

    fn queue(&mut self, samples: &[i16]) -> std::io::Result<()>;

    fn set_paused(&mut self, paused: bool);
}

/// Opens audio devices.
#[cfg_attr(test, automock)]
pub trait AudioBackend: Send {
    fn open(&self, sample_rate: u32) -> std::io::Result<Box<dyn AudioDevice>>;
}

/// Device that plays nothing but drains its queue in real time.
#[derive(Debug)]
pub struct NullAudioDevice {
    sample_rate: u32,
    queued: usize,
    since: Instant,
    paused: bool,
}

impl NullAudioDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            queued: 0,
            since: Instant::now(),
            paused: true,
        }
    }
}

impl AudioDevice for NullAudioDevice {
    fn queued_frames(&self) -> usize {
        if self.paused {
            return self.queued;
        }
        let played = self.since.elapsed().as_secs_f64() * f64::from(self.sample_rate);
        self.queued.saturating_sub(played as usize)
    }

    fn queue(&mut self, samples: &[i16]) -> std::io::Result<()> {
        self.queued = self.queued_frames() + samples.len() / 2;
        self.since = Instant::now();
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        self.queued = self.queued_frames();
        self.since = Instant::now();
        self.paused = paused;
    }
}

#[derive(Debug, Default)]
pub struct NullAudioBackend;

impl AudioBackend for NullAudioBackend {
    fn open(&self, sample_rate: u32) -> std::io::Result<Box<dyn AudioDevice>> {
        Ok(Box::new(NullAudioDevice::new(sample_rate)))
    }
}

pub struct ModPlayerActor {
    backend: Box<dyn AudioBackend>,
    device: Option<Box<dyn AudioDevice>>,
    file: Option<PathBuf>,
    module: Option<Vec<u8>>,
    playing: bool,
    volume: f32,
    frames_rendered: u64,
    row: Option<u64>,
}

impl Default for ModPlayerActor {
    fn default() -> Self {
        Self::new(Box::new(NullAudioBackend))
    }
}

impl ModPlayerActor {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            device: None,
            file: None,
            module: None,
            playing: false,
            volume: 1.0,
            frames_rendered: 0,
            row: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Module path last requested with `LOAD`.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }

    /// Current row within the pattern, once playback has started.
    pub fn row(&self) -> Option<u64> {
        self.row
    }

    fn load(&mut self, path: String) {
        self.module.take();
        self.frames_rendered = 0;
        self.row = None;

        if path.is_empty() {
            self.file = None;
            return;
        }

        let path = PathBuf::from(path);
        match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::info!("Loaded module {:?} ({} bytes)", path, bytes.len());
                self.module = Some(bytes);
            }
            Err(e) => tracing::warn!("Could not load module {:?}: {}", path, e),
        }
        self.file = Some(path);
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        if let Some(device) = self.device.as_mut() {
            device.set_paused(!playing);
        }
    }

    fn handle_api(&mut self, msg: &ApiMessage) -> Outcome {
        let mut args = msg.reader();
        match msg.command() {
            "LOAD" => self.load(args.pop_str().unwrap_or_default()),
            "PLAY" => self.set_playing(args.pop_int().unwrap_or(0) != 0),
            "SET VOLUME" => self.volume = args.pop_float().unwrap_or(1.0).clamp(0.0, 1.0) as f32,
            _ => return Outcome::Ignored,
        }
        Outcome::Handled
    }

    /// Top up the device queue and report row changes.
    fn handle_timer(&mut self, ctx: &ActorContext) -> Outcome {
        if !self.playing || self.module.is_none() {
            return Outcome::Ignored;
        }
        let Some(device) = self.device.as_mut() else {
            return Outcome::Ignored;
        };

        let deficit = TARGET_QUEUED_FRAMES.saturating_sub(device.queued_frames());
        let silence = [0i16; CHUNK_FRAMES * 2];
        let mut remaining = deficit;
        while remaining > 0 {
            let frames = remaining.min(CHUNK_FRAMES);
            if let Err(e) = device.queue(&silence[..frames * 2]) {
                tracing::warn!("Audio queue failed: {}", e);
                break;
            }
            self.frames_rendered += frames as u64;
            remaining -= frames;
        }

        let row = (self.frames_rendered / ROW_FRAMES) % PATTERN_ROWS;
        if deficit > 0 && self.row != Some(row) {
            self.row = Some(row);
            let msg = OscMessage::new("/modplayer/row")
                .int(row as i32)
                .float(self.volume);
            ctx.forward(msg.into_payload());
        }
        Outcome::Handled
    }
}

impl ActorHandler for ModPlayerActor {
    fn capabilities(&self) -> Option<&str> {
        Some(MODPLAYER_CAPABILITIES)
    }

    fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Outcome {
        match msg {
            Message::Init => {
                match self.backend.open(SAMPLE_RATE) {
                    Ok(mut device) => {
                        device.set_paused(!self.playing);
                        self.device = Some(device);
                    }
                    Err(e) => tracing::warn!("Could not open audio device: {}", e),
                }
                Outcome::Handled
            }
            Message::Api(api) => self.handle_api(&api),
            Message::Timer => self.handle_timer(ctx),
            Message::Data { .. } => Outcome::Ignored,
            Message::Destroy => {
                if let Some(mut device) = self.device.take() {
                    device.set_paused(true);
                }
                self.module.take();
                self.playing = false;
                Outcome::Handled
            }
        }
    }
}
