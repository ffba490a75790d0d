mod common;

use common::{close, note_off, note_on, player, smf_bytes, song, tempo};
use midly::Format;
use std::fs;
use tocata::{LoadError, NoteEvent, SynthCommand};

#[test]
fn tempo_conversion_at_120_bpm() {
    let (player, _backend) = player();
    let bytes = smf_bytes(
        Format::Parallel,
        480,
        vec![
            vec![tempo(0, 500_000)],
            vec![note_on(0, 0, 60, 100), note_off(480, 0, 60), note_on(960, 0, 62, 100)],
        ],
    );
    let info = player.load_bytes(&bytes, false).unwrap();
    assert!(close(info.length_seconds, 1.5));

    player.play();
    for _ in 0..10 {
        player.tick(0.1);
    }

    let events = player.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events[0].is_note_on);
    assert!(!events[1].is_note_on);
    assert_eq!(events[1].pitch, 60);
    assert!(close(events[1].timestamp, 0.5));
}

#[test]
fn conductor_tempo_drives_playback() {
    let (player, _backend) = player();
    let bytes = smf_bytes(
        Format::Parallel,
        480,
        vec![
            vec![tempo(0, 1_000_000)],
            vec![note_on(0, 0, 60, 100), note_off(480, 0, 60)],
        ],
    );
    let info = player.load_bytes(&bytes, false).unwrap();
    assert!(close(info.length_seconds, 1.0));

    player.play();
    player.tick(0.75);
    assert_eq!(player.drain_events().len(), 1);

    player.tick(0.25);
    let events = player.drain_events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].is_note_on);
    assert!(close(events[0].timestamp, 1.0));
}

#[test]
fn loads_from_disk() {
    let (player, _backend) = player();
    let path = std::env::temp_dir().join(format!("tocata-load-{}.mid", std::process::id()));
    let bytes = smf_bytes(
        Format::Parallel,
        96,
        vec![vec![note_on(0, 9, 36, 120), note_off(48, 9, 36)]],
    );
    fs::write(&path, bytes).unwrap();

    let info = player.load(&path, true).unwrap();
    fs::remove_file(&path).ok();

    assert!(info.looping);
    assert!(close(info.length_seconds, 0.25));
    assert_eq!(info.active_channels.iter().collect::<Vec<_>>(), vec![9]);
}

#[test]
fn failed_loads_keep_the_current_song() {
    let (player, backend) = player();
    player.load_song(song(
        true,
        &[(0, NoteEvent::on(0.0, 60, 100)), (0, NoteEvent::off(2.0, 60, 0))],
    ));
    player.play();
    player.tick(0.5);
    backend.clear();
    player.drain_events();

    let missing = player.load(std::path::Path::new("/nonexistent/tocata.mid"), true);
    assert!(matches!(missing, Err(LoadError::Io { .. })));

    let garbage = player.load_bytes(b"definitely not midi", true);
    assert!(matches!(garbage, Err(LoadError::Parse(_))));

    let single = smf_bytes(Format::SingleTrack, 480, vec![vec![note_on(0, 0, 60, 100)]]);
    assert!(matches!(
        player.load_bytes(&single, true),
        Err(LoadError::Format(_))
    ));

    assert!(backend.commands().is_empty());
    let status = player.status();
    assert!(!status.paused);
    assert!(close(status.time, 0.5));
    assert!(close(status.length, 2.0));

    player.tick(1.6);
    let events = player.drain_events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].is_note_on);
}

#[test]
fn reload_silences_and_replaces_the_song() {
    let (player, backend) = player();
    player.load_song(song(
        true,
        &[(3, NoteEvent::on(0.0, 50, 100)), (3, NoteEvent::off(1.0, 50, 0))],
    ));
    player.play();
    player.tick(0.01);
    backend.clear();

    let bytes = smf_bytes(
        Format::Parallel,
        480,
        vec![vec![note_on(0, 1, 70, 90), note_off(480, 1, 70)]],
    );
    let info = player.load_bytes(&bytes, false).unwrap();

    assert_eq!(info.active_channels.iter().collect::<Vec<_>>(), vec![1]);
    let commands = backend.take();
    assert_eq!(common::all_notes_off(&commands), (0..16).collect::<Vec<u8>>());
    assert!(
        commands
            .iter()
            .all(|command| matches!(command, SynthCommand::AllNotesOff { .. }))
    );

    let status = player.status();
    assert!(status.paused);
    assert_eq!(status.time, 0.0);
}
