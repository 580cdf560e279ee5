//! Collision sounds
//!
//! Impacts are turned into fire-and-forget playback requests: louder for
//! harder hits, scaled by object size, through a bank chosen by material.

use std::collections::HashMap;

use thiserror::Error;
use tumble_math::Vec3;
use tumble_physics::{CollisionEvent, MaterialTag};

/// Playback failure; never fatal
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("unknown sound bank `{0}`")]
    UnknownBank(String),
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
}

/// Something that can play a named sound
///
/// Playing a bank that is already playing restarts it from the beginning.
pub trait AudioSink {
    fn play(&mut self, bank: &str, volume: f32) -> Result<(), AudioError>;
}

/// Headless sink that logs playback instead of producing sound
#[derive(Default)]
pub struct LogAudioSink {
    /// Banks this sink accepts; empty accepts everything
    known: Vec<String>,
    last_bank: Option<String>,
    plays: usize,
}

impl LogAudioSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept the given banks
    pub fn with_banks<I, S>(banks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: banks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Successful plays so far
    pub fn plays(&self) -> usize {
        self.plays
    }
}

impl AudioSink for LogAudioSink {
    fn play(&mut self, bank: &str, volume: f32) -> Result<(), AudioError> {
        if !self.known.is_empty() && !self.known.iter().any(|b| b == bank) {
            return Err(AudioError::UnknownBank(bank.to_string()));
        }
        let restart = self.last_bank.as_deref() == Some(bank);
        log::debug!(
            "{} `{}` at volume {:.2}",
            if restart { "Restart" } else { "Play" },
            bank,
            volume
        );
        self.last_bank = Some(bank.to_string());
        self.plays += 1;
        Ok(())
    }
}

/// Bank a material's impacts play through
#[derive(Clone, Debug, PartialEq)]
pub struct SoundBank {
    pub name: String,
    /// Multiplier on the computed volume
    pub attenuation: f32,
}

/// Maps collision events to playback requests
#[derive(Clone, Debug)]
pub struct CollisionAudioDispatcher {
    /// Impact strength that maps to full volume
    impact_ceiling: f32,
    /// Impacts at or below this are silent
    audibility_threshold: f32,
    banks: HashMap<MaterialTag, SoundBank>,
}

impl Default for CollisionAudioDispatcher {
    fn default() -> Self {
        Self::new(10.0, 0.7)
    }
}

impl CollisionAudioDispatcher {
    pub fn new(impact_ceiling: f32, audibility_threshold: f32) -> Self {
        Self {
            impact_ceiling: impact_ceiling.max(f32::EPSILON),
            audibility_threshold,
            banks: HashMap::new(),
        }
    }

    /// Play `bank` for impacts on bodies of `material`
    pub fn with_bank(mut self, material: MaterialTag, bank: impl Into<String>, attenuation: f32) -> Self {
        self.banks.insert(
            material,
            SoundBank {
                name: bank.into(),
                attenuation,
            },
        );
        self
    }

    pub fn bank(&self, material: MaterialTag) -> Option<&SoundBank> {
        self.banks.get(&material)
    }

    /// Loudness before bank attenuation
    ///
    /// Bigger objects are louder: `size_scale` multiplies the normalized impact.
    pub fn volume_for(&self, impact: f32, size_scale: f32) -> f32 {
        (impact / self.impact_ceiling).min(1.0) * size_scale
    }

    /// Play the impact sound for one event
    ///
    /// `scale` is the subscribed body's proxy scale. Returns the requested
    /// volume, or `None` when nothing was requested (too soft, or no bank).
    pub fn dispatch(&self, event: &CollisionEvent, scale: Vec3, audio: &mut dyn AudioSink) -> Option<f32> {
        if event.impact_strength <= self.audibility_threshold {
            return None;
        }
        let bank = self.banks.get(&event.material)?;

        let volume = (self.volume_for(event.impact_strength, scale.min_element()) * bank.attenuation).clamp(0.0, 1.0);
        if let Err(err) = audio.play(&bank.name, volume) {
            log::debug!("Dropped impact sound: {err}");
        }
        Some(volume)
    }
}
