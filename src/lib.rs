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

//! A real-time polyphonic SoundFont wavetable voice engine.
//!
//! This crate provides:
//! - A read-only SoundFont bank model and preset/instrument zone resolution
//! - A single-producer/single-consumer queue of sample-stamped MIDI events
//! - A fixed pool of 128 voices with retrigger and oldest-first stealing
//! - A per-sample render loop producing interleaved stereo `f32` frames
//! - Block peak normalization and an offline WAV bounce

pub mod bank;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod midi;
pub mod queue;
pub mod render;
pub mod resolver;
pub mod units;
pub mod voice;

pub use bank::{Bank, BankBuilder};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{BankError, EngineError};
pub use queue::{EventConsumer, EventProducer, QueuedEvent};

use std::sync::Arc;

/// Builds an engine and the producer half of its event queue.
///
/// The engine is meant to be moved into the audio callback; the producer stays with the
/// scheduler. A `None` bank (or one that fails validation) selects math-waveform synthesis.
/// A config with unusable values (zero sample rate, zero queue capacity, ...) is rejected.
pub fn synth(
    config: EngineConfig,
    bank: Option<Arc<Bank>>,
) -> Result<(Engine, EventProducer), ConfigError> {
    config.validate()?;
    let (producer, consumer) = queue::event_queue(&config);
    Ok((Engine::new(config, bank, consumer), producer))
}
