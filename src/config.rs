// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;
use tracing::debug;

use crate::voice::Waveform;

mod error;

pub use error::ConfigError;

const DEFAULT_SAMPLE_RATE: u32 = 96000;
const DEFAULT_BLOCK_SIZE: usize = 512;
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 4096;
const DEFAULT_TICK_RATE: u32 = 1000;
const DEFAULT_TUNING: f32 = 440.0;
const DEFAULT_PERCUSSION_CHANNEL: u8 = 10;

/// The engine configuration. Every field is optional in the file.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct EngineConfig {
    /// Output sample rate in Hz (default: 96000).
    sample_rate: Option<u32>,

    /// Frames per block for offline rendering (default: 512).
    block_size: Option<usize>,

    /// Number of queued events before enqueue fails (default: 4096).
    event_queue_capacity: Option<usize>,

    /// Scheduler ticks per second (default: 1000, i.e. millisecond ticks).
    tick_rate: Option<u32>,

    /// Frequency of A4 in Hz (default: 440).
    tuning: Option<f32>,

    /// 1-indexed channels that play from the percussion bank (default: [10]).
    percussion_channels: Option<Vec<u8>>,

    /// Translate program changes through the MT-32 table (default: false).
    #[serde(default)]
    mt32: bool,

    /// Math waveform used when no bank is loaded (default: sine).
    #[serde(default)]
    fallback_waveform: Waveform,

    /// Whether block peak normalization is applied (default: true).
    normalize: Option<bool>,
}

impl EngineConfig {
    /// Parse an engine config from a file (YAML, TOML or JSON by extension).
    pub fn deserialize(path: &Path) -> Result<EngineConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<EngineConfig>()?;
        config.validate()?;
        debug!(path = ?path, sample_rate = config.sample_rate(), "Engine config loaded");
        Ok(config)
    }

    /// Checks that every value is usable by the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate() == 0 {
            return Err(ConfigError::Invalid("sample_rate must be non-zero".into()));
        }
        if self.block_size() == 0 {
            return Err(ConfigError::Invalid("block_size must be non-zero".into()));
        }
        if self.event_queue_capacity() == 0 {
            return Err(ConfigError::Invalid(
                "event_queue_capacity must be non-zero".into(),
            ));
        }
        if self.tick_rate() == 0 {
            return Err(ConfigError::Invalid("tick_rate must be non-zero".into()));
        }
        if self.tuning().is_nan() || self.tuning() <= 0.0 {
            return Err(ConfigError::Invalid("tuning must be positive".into()));
        }
        if let Some(channel) = self
            .percussion_channels
            .iter()
            .flatten()
            .find(|c| !(1..=16).contains(*c))
        {
            return Err(ConfigError::Invalid(format!(
                "percussion channel {} is outside 1-16",
                channel
            )));
        }
        Ok(())
    }

    /// Returns a copy with the given sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Returns a copy with the given event queue capacity.
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = Some(capacity);
        self
    }

    /// Returns a copy with normalization switched on or off.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Returns a copy with the given fallback waveform.
    pub fn with_fallback_waveform(mut self, waveform: Waveform) -> Self {
        self.fallback_waveform = waveform;
        self
    }

    /// Returns a copy with MT-32 program translation switched on or off.
    pub fn with_mt32(mut self, mt32: bool) -> Self {
        self.mt32 = mt32;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn block_size(&self) -> usize {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    pub fn event_queue_capacity(&self) -> usize {
        self.event_queue_capacity
            .unwrap_or(DEFAULT_EVENT_QUEUE_CAPACITY)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate.unwrap_or(DEFAULT_TICK_RATE)
    }

    pub fn tuning(&self) -> f32 {
        self.tuning.unwrap_or(DEFAULT_TUNING)
    }

    pub fn mt32(&self) -> bool {
        self.mt32
    }

    pub fn fallback_waveform(&self) -> Waveform {
        self.fallback_waveform
    }

    pub fn normalize(&self) -> bool {
        self.normalize.unwrap_or(true)
    }

    /// Returns the percussion channels as a 0-indexed bit mask.
    pub fn percussion_mask(&self) -> u16 {
        match &self.percussion_channels {
            Some(channels) => channels
                .iter()
                .filter(|c| (1..=16).contains(*c))
                .fold(0, |mask, c| mask | 1 << (c - 1)),
            None => 1 << (DEFAULT_PERCUSSION_CHANNEL - 1),
        }
    }
}
