//! chordpad - chord pad and step sequencer on the command line
//!
//! Builds chords from a key and scale degree, and plays chord progressions
//! through the chordpad runtime, printing every note trigger.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chordpad_cli::{
    printer::PrintTrigger,
    progression::{load_into, parse_progression},
};
use chordpad_core::{
    arpeggiate, build_chord, scale_notes, ArpeggioOrder, ChordModifier, Config, EngineMessage,
    MusicalKey, PlayMode, Runtime, ScaleDegree,
};

#[derive(Parser)]
#[command(name = "chordpad")]
#[command(author, version, about = "Chord pad and step sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: ~/.config/chordpad/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the chord on a scale degree
    Chord {
        /// Key, e.g. C, F#, Bb
        key: MusicalKey,
        /// Scale degree, 1-7 or a numeral (IV, vi)
        degree: ScaleDegree,
        /// Chord modifier (plain, triad, dim, aug, dom7, seventh, ninth, sus2, sus4)
        #[arg(short, long)]
        modifier: Option<ChordModifier>,
        /// Octave (2-6)
        #[arg(short, long)]
        octave: Option<i32>,
        /// Inversion (0-2)
        #[arg(short, long)]
        inversion: Option<usize>,
    },
    /// Show the major scale of a key
    Scale {
        key: MusicalKey,
    },
    /// Show an arpeggio of the chord on a scale degree
    Arp {
        key: MusicalKey,
        degree: ScaleDegree,
        /// up, down, up-down, random
        #[arg(long)]
        order: Option<ArpeggioOrder>,
        #[arg(short, long)]
        modifier: Option<ChordModifier>,
        /// Seed for the random order
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a chord progression through the sequencer
    Play {
        /// Steps such as "1:triad 4 5:dom7~ 5:dom7 -" (`~` ties, `-` rests)
        #[arg(short, long)]
        progression: String,
        /// Key of the progression
        #[arg(short, long)]
        key: Option<MusicalKey>,
        /// Tempo (40-240)
        #[arg(long)]
        bpm: Option<u32>,
        /// Loop the progression
        #[arg(long = "loop")]
        loop_mode: bool,
        /// Arpeggiate each chord instead of striking it
        #[arg(long)]
        arp: bool,
        /// Stop after this many beats (default: two passes when looping)
        #[arg(long)]
        beats: Option<u32>,
        /// Click a metronome along with the progression
        #[arg(long)]
        metronome: bool,
    },
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
        }
        Commands::ConfigPath => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
        Commands::Chord {
            key,
            degree,
            modifier,
            octave,
            inversion,
        } => {
            let pad = &mut config.performance;
            pad.key = key;
            if let Some(modifier) = modifier {
                pad.modifier = modifier;
            }
            if let Some(octave) = octave {
                pad.set_octave(octave);
            }
            if let Some(inversion) = inversion {
                pad.set_inversion(inversion);
            }
            let chord = pad.chord_for(degree);
            println!("{} ({})", chord.label(), degree);
            println!("  notes:    {}", chord.pitch_names().join(" "));
            println!("  playback: {}", chord.note_names().join(" "));
        }
        Commands::Scale { key } => {
            let notes = scale_notes(key);
            println!("{} major", key);
            for degree in ScaleDegree::all() {
                println!("  {:<4} {}", degree.numeral(), notes[degree.index()]);
            }
        }
        Commands::Arp {
            key,
            degree,
            order,
            modifier,
            seed,
        } => {
            let pad = &config.performance;
            let modifier = modifier.unwrap_or(pad.modifier);
            let order = order.unwrap_or(pad.arp_order);
            let chord = build_chord(key, degree, modifier, pad.octave).inverted(pad.inversion);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let notes = arpeggiate(chord.notes(), order, &mut rng);
            let names: Vec<String> = notes.iter().map(|n| n.to_string()).collect();
            println!("{} ({})", chord.label(), order);
            println!("  {}", names.join(" "));
        }
        Commands::Play {
            progression,
            key,
            bpm,
            loop_mode,
            arp,
            beats,
            metronome,
        } => {
            if let Some(key) = key {
                config.performance.key = key;
            }
            if let Some(bpm) = bpm {
                config.sequencer.bpm = bpm.into();
            }
            if loop_mode {
                config.sequencer.loop_mode = true;
            }
            if arp {
                config.performance.play_mode = PlayMode::Arp;
            }
            play(&config, &progression, beats, metronome)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn play(config: &Config, progression: &str, beats: Option<u32>, metronome: bool) -> Result<()> {
    let steps = parse_progression(progression).context("Invalid progression")?;
    if steps.is_empty() {
        bail!("The progression is empty");
    }

    let runtime = Runtime::start(PrintTrigger::new(), config).context("Failed to start runtime")?;
    let handle = runtime.handle();

    load_into(handle, &steps, config.sequencer.rows, config.performance.modifier)?;
    if metronome {
        handle.send(EngineMessage::StartMetronome)?;
    }
    handle.send(EngineMessage::StartTransport)?;

    if !handle.wait_until(|s| s.transport_running, Some(Duration::from_secs(2))) {
        bail!("Nothing to play");
    }

    let beat = config.sequencer.bpm.beat_interval();
    let limit = match (beats, config.sequencer.loop_mode) {
        (Some(beats), _) => Some(beat * beats),
        (None, true) => Some(beat * (2 * steps.len() as u32)),
        (None, false) => None,
    };
    handle.wait_until(|s| !s.transport_running, limit);

    handle.send(EngineMessage::StopTransport)?;
    // Let the last chord ring out
    std::thread::sleep(beat);
    runtime.shutdown();
    Ok(())
}
