//! Note trigger that prints to stdout.

use chordpad_core::NoteTrigger;
use std::io::Write;
use std::time::Instant;

/// Prints one line per trigger, stamped with the time since creation.
#[derive(Debug)]
pub struct PrintTrigger {
    started: Instant,
}

impl Default for PrintTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintTrigger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

pub fn format_trigger(elapsed_secs: f64, pitches: &[String], duration_secs: f64) -> String {
    format!(
        "{:>8.3}s  {:<24} ({:.2}s)",
        elapsed_secs,
        pitches.join(" "),
        duration_secs
    )
}

impl NoteTrigger for PrintTrigger {
    fn trigger_notes(&mut self, pitches: &[String], duration_secs: f64) {
        let line = format_trigger(self.started.elapsed().as_secs_f64(), pitches, duration_secs);
        let mut out = std::io::stdout().lock();
        if writeln!(out, "{line}").is_err() {
            log::warn!("Failed to write trigger output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_trigger() {
        let pitches = vec!["C4".to_string(), "E4".to_string(), "G4".to_string()];
        let line = format_trigger(1.5, &pitches, 0.5);
        assert!(line.starts_with("   1.500s  C4 E4 G4"));
        assert!(line.ends_with("(0.50s)"));
    }
}
