use crossbeam::channel::RecvTimeoutError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tocata::ui::{self, RawLineWriter, RawTerminal, UiCommand};
use tocata::{MidiOutBackend, NullBackend, Player, PlayerConfig, SynthBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const USAGE: &str = "usage: tocata <song.mid> [--config player.ron] [--no-loop]";

struct Args {
    song: PathBuf,
    config: Option<PathBuf>,
    no_loop: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut song = None;
    let mut config = None;
    let mut no_loop = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().ok_or(USAGE)?)),
            "--no-loop" => no_loop = true,
            "-h" | "--help" => return Err(USAGE.into()),
            _ if song.is_none() => song = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument {arg:?}\n{USAGE}")),
        }
    }

    Ok(Args {
        song: song.ok_or(USAGE)?,
        config,
        no_loop,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(|| RawLineWriter(std::io::stderr()))
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    let port_hint = config.midi_port.as_deref();
    let backend: Box<dyn SynthBackend> = match MidiOutBackend::connect(port_hint) {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            warn!(%err, "no midi output, playing silently");
            Box::new(NullBackend)
        }
    };

    let player = Arc::new(Player::with_config(backend, &config)?);
    player.load(&args.song, config.looping && !args.no_loop)?;
    for &channel in &config.muted_channels {
        player.mute(channel);
    }

    let _terminal = RawTerminal::enable()?;
    let commands = ui::spawn_input();
    info!("space play/pause, arrows seek, +/- speed, 0-9 mute, l loop, q quit");

    player.start_thread();
    player.play();

    loop {
        match commands.recv_timeout(FRAME) {
            Ok(UiCommand::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(command) => apply(&player, command),
            Err(RecvTimeoutError::Timeout) => {}
        }

        for event in player.drain_events() {
            info!(
                channel = event.channel,
                pitch = event.pitch,
                on = event.is_note_on,
                at = format_args!("{:.3}", event.timestamp),
                next = ?event.next.map(|next| (next.pitch, next.delta)),
                "note"
            );
        }
    }

    player.stop_thread();
    player.pause();
    Ok(())
}

fn apply(player: &Player, command: UiCommand) {
    let status = player.status();
    match command {
        UiCommand::TogglePlay if status.paused => player.play(),
        UiCommand::TogglePlay => player.pause(),
        UiCommand::SeekBy(delta) => player.seek((status.time + delta).clamp(0.0, status.length)),
        UiCommand::ScaleSpeed(factor) => {
            player.set_speed(status.speed * factor);
            info!(speed = status.speed * factor, "speed");
        }
        UiCommand::ToggleMute(channel) if status.active_channels.contains(channel) => {
            player.mute(channel)
        }
        UiCommand::ToggleMute(channel) => player.unmute(channel),
        UiCommand::ToggleLoop => {
            player.set_looping(!status.looping);
            info!(looping = !status.looping, "loop");
        }
        UiCommand::Quit => {}
    }
}
