use morsescope_engine::{Engine, TonePlayer, load_decode_result};
use morsescope_messages::{Command, DecodeResult, DecodedEvent, WaterfallConfig};

use log::{LevelFilter, info};
use std::io::Write;

/// "SOS" keyed at 600 Hz, shown when no decode file is given.
fn demo_decode() -> DecodeResult {
    DecodeResult {
        full_text: "SOS SOS".into(),
        frequency: 600.0,
        wpm: 12.0,
        threshold_factor: 1.0,
        avg_snr: 18.0,
        events: vec![
            DecodedEvent::new(0.2, 0.9, 'S'),
            DecodedEvent::new(1.2, 2.8, 'O'),
            DecodedEvent::new(3.1, 3.8, 'S'),
            DecodedEvent::new(3.8, 4.6, ' '),
            DecodedEvent::new(4.6, 5.3, 'S'),
            DecodedEvent::new(5.6, 7.2, 'O'),
            DecodedEvent::new(7.5, 8.2, 'S'),
        ],
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} - mod path |{}| - args: |{}|",
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .filter_level(LevelFilter::Warn)
        .filter_module("morsescope", LevelFilter::Info)
        .filter_module("morsescope_engine", LevelFilter::Info)
        .filter_module("morsescope_ui", LevelFilter::Debug)
        .init();

    // Decode result from the first CLI argument, or the built-in demo
    let decode = match std::env::args().nth(1) {
        Some(path) => load_decode_result(&path)?,
        None => demo_decode(),
    };
    info!(
        "Reviewing {:?}: {} characters around {}",
        decode.full_text,
        decode.events.len(),
        decode.center_frequency()
    );

    let (cmd_tx, cmd_rx) = flume::unbounded();
    let (playback_tx, playback_rx) = flume::unbounded();
    let (event_tx, event_rx) = flume::unbounded();

    let player = TonePlayer::spawn(&decode, playback_tx);

    // Spawn engine thread
    let engine_handle = std::thread::spawn(move || {
        let engine = Engine::new(
            cmd_rx,
            playback_rx,
            event_tx,
            Box::new(player),
            WaterfallConfig::default(),
        );
        engine.run()
    });

    cmd_tx.send(Command::ApplyDecode(decode))?;

    // Run UI on main thread (blocking)
    let ui_result = morsescope_ui::run(event_rx, cmd_tx.clone());

    // UI has exited - send stop command to engine
    let _ = cmd_tx.send(Command::Stop);

    // Wait for engine thread to finish
    engine_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Engine thread panicked"))??;

    ui_result
}
