//! Line commands read from stdin.

use anyhow::{bail, Context, Result};
use driftmix_core::TimerMinutes;

pub const HELP: &str = "\
commands:
  sounds                       list catalog sounds
  list                         list saved mixes
  play <mix-id>                play a saved mix
  compose <name> <id=vol>...   play an unsaved mix
  save <name> <id=vol>...      save a mix
  delete <mix-id>              delete a saved mix
  pause | resume | stop        transport
  loop                         toggle looping
  timer <minutes|off>          sleep timer, 1-180 minutes
  preview <id>                 toggle a sound in the composer
  volume <id> <0..1>           set a track or composer volume
  bg | fg                      simulate app backgrounding
  status                       show engine state
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Sounds,
    List,
    Play(String),
    Compose { name: String, volumes: Vec<(String, f32)> },
    Save { name: String, volumes: Vec<(String, f32)> },
    Delete(String),
    Pause,
    Resume,
    Stop,
    Loop,
    /// Minutes; zero cancels.
    Timer(u32),
    Preview(String),
    Volume { id: String, volume: f32 },
    Background,
    Foreground,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (verb, rest.as_slice()) {
            ("sounds", []) => Self::Sounds,
            ("list", []) => Self::List,
            ("play", [id]) => Self::Play(id.to_string()),
            ("compose", [name, pairs @ ..]) => Self::Compose {
                name: name.to_string(),
                volumes: parse_volumes(pairs)?,
            },
            ("save", [name, pairs @ ..]) => Self::Save {
                name: name.to_string(),
                volumes: parse_volumes(pairs)?,
            },
            ("delete", [id]) => Self::Delete(id.to_string()),
            ("pause", []) => Self::Pause,
            ("resume", []) => Self::Resume,
            ("stop", []) => Self::Stop,
            ("loop", []) => Self::Loop,
            ("timer", ["off"]) => Self::Timer(0),
            ("timer", [minutes]) => Self::Timer(TimerMinutes::parse(minutes)?.get()),
            ("preview", [id]) => Self::Preview(id.to_string()),
            ("volume", [id, volume]) => Self::Volume {
                id: id.to_string(),
                volume: parse_volume(volume)?,
            },
            ("bg", []) => Self::Background,
            ("fg", []) => Self::Foreground,
            ("status", []) => Self::Status,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => bail!("Unrecognized command: {} (try 'help')", line.trim()),
        };
        Ok(Some(command))
    }
}

fn parse_volume(text: &str) -> Result<f32> {
    text.parse::<f32>()
        .ok()
        .filter(|v| (0.0..=1.0).contains(v))
        .with_context(|| format!("Volume must be a number between 0 and 1, got {}", text))
}

fn parse_volumes(pairs: &[&str]) -> Result<Vec<(String, f32)>> {
    pairs
        .iter()
        .map(|pair| {
            let (id, volume) = pair
                .split_once('=')
                .with_context(|| format!("Expected <id>=<volume>, got {}", pair))?;
            Ok((id.to_string(), parse_volume(volume)?))
        })
        .collect()
}
