//! Executes commands against the engine, the store and the app phase.

use std::fmt::Write as _;

use anyhow::{bail, Result};
use driftmix_audio::{AppPhase, MixEngine, PlayOutcome};
use driftmix_core::{format_created_at, format_remaining, SoundMix};
use driftmix_store::MixStore;
use tokio::sync::watch;

use crate::commands::{Command, HELP};

/// What the input loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(String),
    Quit,
}

pub struct Session {
    engine: MixEngine,
    store: MixStore,
    phase: watch::Sender<AppPhase>,
}

impl Session {
    pub fn new(engine: MixEngine, store: MixStore, phase: watch::Sender<AppPhase>) -> Self {
        Self {
            engine,
            store,
            phase,
        }
    }

    pub fn engine(&self) -> &MixEngine {
        &self.engine
    }

    pub async fn execute(&self, command: Command) -> Result<Flow> {
        let reply = match command {
            Command::Sounds => {
                let mut out = String::new();
                for sound in self.engine.catalog().iter() {
                    let _ = writeln!(out, "{:<10} {:<12} {}", sound.id, sound.name, sound.category);
                }
                out
            }
            Command::List => {
                let mixes = self.store.list().await;
                if mixes.is_empty() {
                    return Ok(Flow::Continue("no saved mixes".into()));
                }
                let mut out = String::new();
                for mix in mixes {
                    let _ = writeln!(
                        out,
                        "{}  {}  ({} sounds, {})",
                        mix.id,
                        mix.name,
                        mix.sounds.len(),
                        format_created_at(&mix.created_at)
                    );
                }
                out
            }
            Command::Play(id) => {
                let Some(mix) = self.store.get(&id).await else {
                    bail!("No saved mix with id {}", id);
                };
                self.play(mix).await?
            }
            Command::Compose { name, volumes } => {
                self.engine.preview_stop().await;
                self.play(SoundMix::preview(name, volumes)?).await?
            }
            Command::Save { name, volumes } => {
                let mix = SoundMix::compose(name, volumes)?;
                let reply = format!("saved {} as {}", mix.name, mix.id);
                self.store.save(mix).await?;
                reply
            }
            Command::Delete(id) => {
                if self.store.delete(&id).await? {
                    format!("deleted {}", id)
                } else {
                    format!("no saved mix with id {}", id)
                }
            }
            Command::Pause => {
                self.engine.pause_mix().await;
                "paused".into()
            }
            Command::Resume => {
                if self.engine.resume_mix().await {
                    "playing".into()
                } else {
                    "nothing to resume".into()
                }
            }
            Command::Stop => {
                self.engine.stop_mix().await;
                "stopped".into()
            }
            Command::Loop => {
                let enabled = self.engine.toggle_loop().await;
                format!("loop {}", if enabled { "on" } else { "off" })
            }
            Command::Timer(minutes) => {
                self.engine.set_timer(minutes)?;
                if minutes == 0 {
                    "timer off".into()
                } else {
                    format!("stopping in {} min", minutes)
                }
            }
            Command::Preview(id) => {
                let playing = self.engine.preview_toggle(&id).await?;
                format!("{} {}", id, if playing { "previewing" } else { "paused" })
            }
            Command::Volume { id, volume } => {
                if self.engine.state().current_mix.is_some() {
                    if !self.engine.set_track_volume(&id, volume).await? {
                        bail!("{} is not part of the current mix", id);
                    }
                } else {
                    self.engine.preview_set_volume(&id, volume).await?;
                }
                format!("{} at {:.2}", id, volume)
            }
            Command::Background => {
                self.phase.send_replace(AppPhase::Background);
                "backgrounded".into()
            }
            Command::Foreground => {
                self.phase.send_replace(AppPhase::Foreground);
                "foregrounded".into()
            }
            Command::Status => self.status().await,
            Command::Help => HELP.into(),
            Command::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(reply))
    }

    async fn play(&self, mix: SoundMix) -> Result<String> {
        let name = mix.name.clone();
        let reply = match self.engine.play_mix(mix).await? {
            PlayOutcome::Started { tracks, skipped } if skipped.is_empty() => {
                format!("playing {} ({} tracks)", name, tracks)
            }
            PlayOutcome::Started { tracks, skipped } => format!(
                "playing {} ({} tracks, skipped {})",
                name,
                tracks,
                skipped.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
            ),
            PlayOutcome::NothingPlayable { .. } => {
                format!("none of the sounds in {} could be loaded", name)
            }
            PlayOutcome::AlreadyLoading => "a mix is already loading".into(),
            PlayOutcome::Cancelled => "stopped while loading".into(),
        };
        Ok(reply)
    }

    async fn status(&self) -> String {
        let state = self.engine.state();
        let mut out = match &state.current_mix {
            Some(mix) => format!("{:?}: {}", state.phase, mix.name),
            None if state.previewing => "Previewing".to_string(),
            None => format!("{:?}", state.phase),
        };
        let _ = write!(out, ", loop {}", if state.is_loop_enabled { "on" } else { "off" });
        if state.timer_active {
            let _ = write!(out, ", stops in {}", format_remaining(state.time_remaining));
        }
        for track in self.engine.active_tracks().await {
            let _ = write!(out, "\n  {:<10} {:.2} {:?}", track.id, track.volume, track.status);
        }
        out
    }

    /// Stop everything. The lifecycle subscription is shut down by the caller.
    pub async fn teardown(&self) {
        self.engine.shutdown().await;
    }
}
