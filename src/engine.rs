use crate::audio::{self, SoundPreset, SynthBackend};
use crate::channels::{CHANNEL_COUNT, ChannelSet};
use crate::config::PlayerConfig;
use crate::error::{LoadError, PlayerError};
use crate::events::{NoteCallbackEvent, cc};
use crate::timing::{self, CueEvent, CueQueue, Song, TransportState};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Ticks the playback thread may fall behind before it gives up catching
/// up and resynchronises with the wall clock.
const MAX_TICK_BACKLOG: u32 = 100;

/// Summary handed back by a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct SongInfo {
    pub length_seconds: f64,
    pub looping: bool,
    pub active_channels: ChannelSet,
}

impl SongInfo {
    fn of(song: &Song) -> Self {
        Self {
            length_seconds: song.length_seconds,
            looping: song.looping,
            active_channels: song.active_channels(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    pub time: f64,
    pub length: f64,
    pub speed: f64,
    pub paused: bool,
    pub looping: bool,
    pub finished: bool,
    pub active_channels: ChannelSet,
}

/// Everything guarded by the playback lock: the song and its cursors, the
/// transport, the cue queue and the backend they all talk to.
struct PlaybackState {
    song: Song,
    transport: TransportState,
    cues: CueQueue,
    backend: Box<dyn SynthBackend>,
}

impl PlaybackState {
    fn new(backend: Box<dyn SynthBackend>) -> Self {
        Self {
            song: Song::default(),
            transport: TransportState::default(),
            cues: CueQueue::default(),
            backend,
        }
    }

    fn install(&mut self, song: Song) {
        for channel in 0..CHANNEL_COUNT as u8 {
            self.backend.all_notes_off(channel);
        }
        self.song = song;
        self.transport.rewind();
        for change in &self.song.setup {
            self.backend
                .control_change(change.channel, change.controller, change.value);
        }
    }

    fn tick(&mut self, dt: f64, filter: ChannelSet, out: &mut Vec<NoteCallbackEvent>) {
        self.cues.advance(dt, self.backend.as_mut());
        if self.transport.paused {
            return;
        }
        self.transport.advance(dt, self.song.length_seconds);
        timing::schedule_channels(
            &mut self.song,
            &self.transport,
            self.backend.as_mut(),
            filter,
            out,
        );
        if timing::wrap_if_finished(&mut self.song, &mut self.transport, self.backend.as_mut()) {
            debug!(time = self.transport.virtual_time, "song looped");
        }
    }

    fn play(&mut self) {
        let length = self.song.length_seconds;
        if length > 0.0 && self.transport.virtual_time >= length {
            self.transport.virtual_time = self.transport.virtual_time.rem_euclid(length);
            self.song.rewind();
            timing::recenter_bends(&self.song, self.backend.as_mut());
        }
        self.transport.paused = false;
    }

    fn pause(&mut self) {
        timing::silence(&self.song, self.backend.as_mut());
        self.transport.paused = true;
    }

    fn seek(&mut self, seconds: f64) {
        self.pause();
        self.transport.virtual_time = seconds;
        for (index, channel) in self.song.channels_mut().iter_mut().enumerate() {
            let bend = channel.seek(seconds);
            if !channel.pitch_bends().is_empty() {
                self.backend
                    .pitch_bend(index as u8, bend.unwrap_or(timing::BEND_CENTER));
            }
        }
        self.transport.paused = false;
    }

    fn mute(&mut self, channel: u8) {
        if let Some(timeline) = self.song.channel_mut(channel) {
            timeline.set_active(false);
            self.backend.all_notes_off(channel);
        }
    }

    fn unmute(&mut self, channel: u8) {
        if let Some(timeline) = self.song.channel_mut(channel) {
            timeline.set_active(true);
        }
    }

    fn set_transpose(&mut self, channel: u8, semitones: i32) {
        if let Some(timeline) = self.song.channel_mut(channel) {
            if timeline.transpose() != semitones {
                // note-offs would go to the new pitch and miss the sounding ones
                self.backend.all_notes_off(channel);
                timeline.set_transpose(semitones);
            }
        }
    }

    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            time: self.transport.virtual_time,
            length: self.song.length_seconds,
            speed: self.transport.speed,
            paused: self.transport.paused,
            looping: self.song.looping,
            finished: self.song.is_finished(self.transport.virtual_time),
            active_channels: self.song.active_channels(),
        }
    }
}

struct Shared {
    /// The playback lock.
    playback: Mutex<PlaybackState>,
    /// The queue lock. Only ever taken after, never before, the playback lock.
    queue: Mutex<Vec<NoteCallbackEvent>>,
    filter: ArcSwap<ChannelSet>,
    tick_interval: Duration,
}

impl Shared {
    fn tick(&self, dt: f64) {
        let filter = **self.filter.load();
        let mut emitted = Vec::new();
        let mut playback = self.playback.lock();
        playback.tick(dt, filter, &mut emitted);
        if !emitted.is_empty() {
            self.queue.lock().extend(emitted);
        }
    }
}

/// The sequencer service. One per process is the normal setup; share it
/// behind an `Arc` with whatever needs to control or observe playback.
pub struct Player {
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn new(backend: Box<dyn SynthBackend>) -> Self {
        Self::with_tick_interval(backend, PlayerConfig::default().tick_interval())
    }

    pub fn with_tick_interval(backend: Box<dyn SynthBackend>, tick_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                playback: Mutex::new(PlaybackState::new(backend)),
                queue: Mutex::new(Vec::new()),
                filter: ArcSwap::from_pointee(ChannelSet::EMPTY),
                tick_interval,
            }),
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Builds a player with the cadence, speed, presets and channel filter
    /// from `config`. Looping and muting apply per song and are left to the
    /// caller.
    pub fn with_config(
        backend: Box<dyn SynthBackend>,
        config: &PlayerConfig,
    ) -> Result<Self, PlayerError> {
        let player = Self::with_tick_interval(backend, config.tick_interval());
        if let Some(presets) = &config.presets {
            player.set_presets(presets)?;
        }
        if !player.set_speed(config.speed) {
            warn!(speed = config.speed, "ignoring invalid configured speed");
        }
        for &channel in &config.registered_channels {
            player.register_channel(channel);
        }
        Ok(player)
    }

    /// Parses `path` and makes it the current song, paused at the start.
    /// Parsing happens before the playback lock is taken; on failure the
    /// current song keeps playing untouched.
    pub fn load(&self, path: &Path, looping: bool) -> Result<SongInfo, LoadError> {
        let song = timing::load_song(path, looping)?;
        debug!(path = %path.display(), "read song file");
        Ok(self.load_song(song))
    }

    pub fn load_bytes(&self, bytes: &[u8], looping: bool) -> Result<SongInfo, LoadError> {
        let song = timing::build_song(bytes, looping)?;
        Ok(self.load_song(song))
    }

    /// Installs an already built song. Every load path ends here.
    pub fn load_song(&self, song: Song) -> SongInfo {
        let info = SongInfo::of(&song);
        self.shared.playback.lock().install(song);
        info!(
            length = info.length_seconds,
            looping = info.looping,
            channels = ?info.active_channels.iter().collect::<Vec<_>>(),
            "loaded song"
        );
        info
    }

    pub fn play(&self) {
        self.shared.playback.lock().play();
        debug!("play");
    }

    pub fn pause(&self) {
        self.shared.playback.lock().pause();
        debug!("pause");
    }

    /// Jumps to `seconds` and resumes playing from there. Negative or
    /// non-finite positions are ignored.
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            warn!(seconds, "ignoring seek to invalid position");
            return;
        }
        self.shared.playback.lock().seek(seconds);
        debug!(seconds, "seek");
    }

    /// Returns false, leaving the speed unchanged, for non-positive or
    /// non-finite factors.
    pub fn set_speed(&self, factor: f64) -> bool {
        self.shared.playback.lock().transport.set_speed(factor)
    }

    pub fn set_looping(&self, looping: bool) {
        self.shared.playback.lock().song.looping = looping;
    }

    /// Advances playback by `dt` wall seconds. The playback thread calls
    /// this on its own; call it directly to drive a player without one.
    pub fn tick(&self, dt: f64) {
        self.shared.tick(dt);
    }

    pub fn mute(&self, channel: u8) {
        self.shared.playback.lock().mute(channel);
    }

    pub fn unmute(&self, channel: u8) {
        self.shared.playback.lock().unmute(channel);
    }

    pub fn set_transpose(&self, channel: u8, semitones: i32) {
        self.shared.playback.lock().set_transpose(channel, semitones);
    }

    pub fn set_volume(&self, channel: u8, volume: u8) {
        if crate::channels::channel_index(channel).is_some() {
            self.shared
                .playback
                .lock()
                .backend
                .control_change(channel, cc::VOLUME, volume.min(127));
        }
    }

    pub fn set_presets(&self, presets: &[SoundPreset]) -> Result<(), PlayerError> {
        let mut playback = self.shared.playback.lock();
        audio::apply_presets(playback.backend.as_mut(), presets)
    }

    pub fn register_channel(&self, channel: u8) {
        self.shared.filter.rcu(|set| set.with(channel));
    }

    pub fn unregister_channel(&self, channel: u8) {
        self.shared.filter.rcu(|set| set.without(channel));
    }

    pub fn clear_registered(&self) {
        self.shared.filter.store(Arc::new(ChannelSet::EMPTY));
    }

    pub fn registered_channels(&self) -> ChannelSet {
        **self.shared.filter.load()
    }

    /// Removes and returns every callback queued since the last drain.
    /// Never waits on the playback lock.
    pub fn drain_events(&self) -> Vec<NoteCallbackEvent> {
        std::mem::take(&mut *self.shared.queue.lock())
    }

    pub fn clear_event_queue(&self) {
        self.shared.queue.lock().clear();
    }

    pub fn play_sequence(&self, events: &[CueEvent]) {
        self.shared.playback.lock().cues.extend(events);
    }

    pub fn clear_cue_queue(&self) {
        let mut playback = self.shared.playback.lock();
        let PlaybackState { cues, backend, .. } = &mut *playback;
        cues.clear(backend.as_mut());
    }

    pub fn is_cue_queue_empty(&self) -> bool {
        self.shared.playback.lock().cues.is_empty()
    }

    pub fn status(&self) -> PlayerStatus {
        self.shared.playback.lock().status()
    }

    pub fn transport(&self) -> TransportState {
        self.shared.playback.lock().transport
    }

    /// Runs `f` against the current song with the playback lock held.
    pub fn with_song<R>(&self, f: impl FnOnce(&Song) -> R) -> R {
        f(&self.shared.playback.lock().song)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawns the playback thread. A second call while it runs only logs.
    /// Start and stop hold the handle slot for their whole run, so racing
    /// calls from different threads never leave two playback threads behind.
    pub fn start_thread(&self) {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            warn!("playback thread already running");
            return;
        }

        self.running.store(true, Ordering::Release);
        let shared = self.shared.clone();
        let running = self.running.clone();
        let spawned = thread::Builder::new()
            .name("tocata-playback".into())
            .spawn(move || playback_thread(shared, running));

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                info!(
                    interval_us = self.shared.tick_interval.as_micros() as u64,
                    "playback thread started"
                );
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                error!(%err, "failed to spawn playback thread");
            }
        }
    }

    /// Stops the playback thread and waits for it. The thread notices within
    /// one tick interval. Does nothing when no thread runs.
    pub fn stop_thread(&self) {
        let mut slot = self.thread.lock();
        let Some(handle) = slot.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        if handle.join().is_err() {
            error!("playback thread panicked");
        }
        info!("playback thread stopped");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn playback_thread(shared: Arc<Shared>, running: Arc<AtomicBool>) {
    let interval = shared.tick_interval;
    let dt = interval.as_secs_f64();
    let mut next_tick = Instant::now();

    while running.load(Ordering::Acquire) {
        shared.tick(dt);

        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else if now - next_tick > interval * MAX_TICK_BACKLOG {
            warn!(behind_ms = (now - next_tick).as_millis() as u64, "playback thread fell behind");
            next_tick = now;
        }
    }
}
