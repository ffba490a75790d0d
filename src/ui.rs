use crossbeam::channel::{Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, Write};
use std::time::Duration;

const SEEK_STEP: f64 = 5.0;
const SPEED_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    TogglePlay,
    SeekBy(f64),
    ScaleSpeed(f64),
    ToggleMute(u8),
    ToggleLoop,
    Quit,
}

/// Maps a key press onto a transport command.
pub fn command_for_key(key: KeyEvent) -> Option<UiCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UiCommand::Quit)
        }
        KeyCode::Char(' ') => Some(UiCommand::TogglePlay),
        KeyCode::Left => Some(UiCommand::SeekBy(-SEEK_STEP)),
        KeyCode::Right => Some(UiCommand::SeekBy(SEEK_STEP)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UiCommand::ScaleSpeed(SPEED_STEP)),
        KeyCode::Char('-') => Some(UiCommand::ScaleSpeed(1.0 / SPEED_STEP)),
        KeyCode::Char('l') => Some(UiCommand::ToggleLoop),
        KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Char(digit @ '0'..='9') => digit
            .to_digit(10)
            .map(|d| UiCommand::ToggleMute(d as u8)),
        _ => None,
    }
}

/// Puts the terminal in raw mode for as long as it lives.
pub struct RawTerminal;

impl RawTerminal {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Log writer for raw mode, where a bare `\n` does not return the carriage.
pub struct RawLineWriter<W>(pub W);

impl<W: Write> Write for RawLineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in buf.split_inclusive(|&b| b == b'\n') {
            match line.strip_suffix(b"\n") {
                Some(body) => {
                    self.0.write_all(body)?;
                    self.0.write_all(b"\r\n")?;
                }
                None => self.0.write_all(line)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Reads keys on a background thread until quit is pressed or the receiver
/// goes away.
pub fn spawn_input() -> Receiver<UiCommand> {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();

    std::thread::spawn(move || {
        if let Err(err) = input_thread(&command_tx) {
            tracing::error!(%err, "terminal input failed");
            let _ = command_tx.send(UiCommand::Quit);
        }
    });

    command_rx
}

fn input_thread(command_tx: &Sender<UiCommand>) -> io::Result<()> {
    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if let Some(command) = command_for_key(key) {
                if command_tx.send(command).is_err() || command == UiCommand::Quit {
                    return Ok(());
                }
            }
        }
    }
}
