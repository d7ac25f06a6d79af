//! Configuration file support for chordpad
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/chordpad/config.toml`
//! - macOS: `~/Library/Application Support/chordpad/config.toml`
//! - Windows: `%APPDATA%\chordpad\config.toml`

use crate::error::{Error, Result};
use crate::metronome::{Metronome, DEFAULT_BEATS_PER_MEASURE};
use crate::performance::PerformanceSettings;
use crate::sequencer::{SequencerState, DEFAULT_ARP_STAGGER};
use crate::timing::{clamp_secs, clamped_duration, Bpm};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# chordpad configuration file

[performance]
# Key of the chord pad: C, C#, D, ... B (flats are accepted too)
key = "C"

# Pad octave (2-6)
octave = 4

# Inversion (0-2)
inversion = 0

# plain, triad, dim, aug, dom7, seventh, ninth, sus2, sus4
modifier = "triad"

# "chord" plays all notes at once, "arp" staggers them
play_mode = "chord"

# up, down, up-down, random
arp_order = "up"

# Delay between arpeggiated pad notes, in seconds
arp_speed_secs = 0.15

# Length of pad notes, in seconds
note_length_secs = 0.5

[sequencer]
# Tempo (40-240)
bpm = 120

# Rows of 8 slots
rows = 1

# Wrap around to the first slot instead of stopping at the end
loop_mode = false

# Delay between arpeggiated notes during playback, in seconds
arp_stagger_secs = 0.1

[metronome]
# Tempo (40-240), independent of the sequencer
bpm = 120

# Beats per measure (3-6)
beats_per_measure = 4
"#;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Live chord pad settings
    pub performance: PerformanceSettings,
    /// Step sequencer settings
    pub sequencer: SequencerSettings,
    /// Click track settings
    pub metronome: MetronomeSettings,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config.normalized())
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "chordpad") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config(&path)?;
        Ok(path)
    }

    pub fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Clamp every value into its valid range.
    pub fn normalized(self) -> Self {
        Self {
            performance: self.performance.normalized(),
            sequencer: SequencerSettings {
                rows: self.sequencer.rows.max(1),
                arp_stagger_secs: clamp_secs(self.sequencer.arp_stagger_secs),
                ..self.sequencer
            },
            metronome: self.metronome,
        }
    }

    /// A fresh sequencer with these settings.
    pub fn build_sequencer(&self) -> SequencerState {
        let mut sequencer = SequencerState::with_rows(self.sequencer.rows);
        sequencer.set_bpm(self.sequencer.bpm);
        sequencer.set_loop_mode(self.sequencer.loop_mode);
        sequencer.set_arp_stagger(clamped_duration(self.sequencer.arp_stagger_secs));
        sequencer
    }

    pub fn build_metronome(&self) -> Metronome {
        Metronome::new(self.metronome.bpm, self.metronome.beats_per_measure)
    }
}

/// Step sequencer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerSettings {
    /// Tempo, clamped to 40-240
    pub bpm: Bpm,
    /// Initial number of rows of 8 slots
    pub rows: usize,
    pub loop_mode: bool,
    /// Delay between arpeggiated notes during playback
    pub arp_stagger_secs: f64,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            bpm: Bpm::DEFAULT,
            rows: 1,
            loop_mode: false,
            arp_stagger_secs: DEFAULT_ARP_STAGGER.as_secs_f64(),
        }
    }
}

/// Metronome settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeSettings {
    pub bpm: Bpm,
    /// 3-6; anything else falls back to 4
    pub beats_per_measure: u32,
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self {
            bpm: Bpm::DEFAULT,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::PlayMode;
    use crate::theory::{ArpeggioOrder, ChordModifier, PitchClass};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.performance.key, PitchClass::C);
        assert_eq!(config.performance.octave, 4);
        assert_eq!(config.sequencer.bpm, Bpm::DEFAULT);
        assert_eq!(config.sequencer.rows, 1);
        assert_eq!(config.metronome.beats_per_measure, 4);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[performance]
key = "Eb"
modifier = "dom7"
play_mode = "arp"
arp_order = "up-down"

[sequencer]
bpm = 500
"#,
        )
        .unwrap();
        assert_eq!(parsed.performance.key, PitchClass::Ds);
        assert_eq!(parsed.performance.modifier, ChordModifier::Dominant7);
        assert_eq!(parsed.performance.play_mode, PlayMode::Arp);
        assert_eq!(parsed.performance.arp_order, ArpeggioOrder::UpDown);
        assert_eq!(parsed.performance.octave, 4);
        assert_eq!(parsed.sequencer.bpm.get(), 240);
        assert_eq!(parsed.metronome, MetronomeSettings::default());
    }

    #[test]
    fn test_load_from_file_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[performance]\noctave = 9\n\n[sequencer]\nrows = 0\nloop_mode = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.performance.octave, 6);
        assert_eq!(config.sequencer.rows, 1);

        let sequencer = config.build_sequencer();
        assert_eq!(sequencer.row_count(), 1);
        assert!(sequencer.loop_mode());
    }

    #[test]
    fn test_infinite_lengths_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[performance]\narp_speed_secs = inf\nnote_length_secs = nan\n\n[sequencer]\narp_stagger_secs = inf\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.performance.arp_speed_secs, 60.0);
        assert_eq!(config.performance.note_length_secs, 0.0);
        assert_eq!(config.sequencer.arp_stagger_secs, 60.0);

        // Unnormalized settings still build
        let mut raw = Config::default();
        raw.sequencer.arp_stagger_secs = f64::INFINITY;
        assert_eq!(raw.build_sequencer().arp_stagger(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_save_and_write_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default_config(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut config = Config::default();
        config.sequencer.rows = 3;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().sequencer.rows, 3);
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[performance\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::TomlParse(_))));
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
