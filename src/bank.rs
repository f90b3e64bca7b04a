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

//! The read-only SoundFont bank model.
//!
//! A bank is a set of flat parallel arrays, exactly as they sit in the `pdta` and
//! `sdta` chunks of a SoundFont file. Each header/zone array ends with the terminal
//! record the format requires, so the zones of record `i` run from `i.zone_index`
//! up to (not including) `(i + 1).zone_index`.

mod builder;
mod generator;

pub use builder::BankBuilder;
pub use generator::{GenAmount, Generator, GeneratorType};

use std::ops::Range;

use crate::error::BankError;

/// Bank number SoundFont reserves for percussion kits.
pub const PERCUSSION_BANK: u16 = 128;

/// A preset header (`phdr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetHeader {
    pub name: String,
    pub program: u16,
    pub bank: u16,
    pub zone_index: u16,
}

/// A zone (`pbag`/`ibag`): where its generators and modulators start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub generator_index: u16,
    pub modulator_index: u16,
}

/// An instrument header (`inst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentHeader {
    pub name: String,
    pub zone_index: u16,
}

/// A sample header (`shdr`). Offsets are absolute indices into the bank's sample data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHeader {
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub sample_rate: u32,
    pub original_key: u8,
    pub correction: i8,
    pub sample_link: u16,
    pub sample_type: u16,
}

/// All bank data the voice engine reads.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    pub presets: Vec<PresetHeader>,
    pub preset_zones: Vec<Zone>,
    pub preset_generators: Vec<Generator>,
    pub instruments: Vec<InstrumentHeader>,
    pub instrument_zones: Vec<Zone>,
    pub instrument_generators: Vec<Generator>,
    pub samples: Vec<SampleHeader>,
    pub sample_data: Vec<i16>,
}

impl Bank {
    /// Checks that the required chunks are present and every index stays in range
    /// and never decreases.
    pub fn validate(&self) -> Result<(), BankError> {
        // Each required chunk needs at least one record plus its terminal record.
        let required = [
            ("phdr", self.presets.len()),
            ("pbag", self.preset_zones.len()),
            ("pgen", self.preset_generators.len()),
            ("inst", self.instruments.len()),
            ("igen", self.instrument_generators.len()),
            ("shdr", self.samples.len()),
        ];
        for (chunk, len) in required {
            if len < 2 {
                return Err(BankError::MissingChunk(chunk));
            }
        }

        check_indices(
            "phdr",
            self.presets.iter().map(|p| p.zone_index as usize),
            self.preset_zones.len(),
        )?;
        check_indices(
            "pbag",
            self.preset_zones.iter().map(|z| z.generator_index as usize),
            self.preset_generators.len(),
        )?;
        check_indices(
            "inst",
            self.instruments.iter().map(|i| i.zone_index as usize),
            self.instrument_zones.len(),
        )?;
        check_indices(
            "ibag",
            self.instrument_zones
                .iter()
                .map(|z| z.generator_index as usize),
            self.instrument_generators.len(),
        )?;

        for (index, sample) in self.samples.iter().enumerate() {
            // The terminal sample record carries no data.
            if index + 1 == self.samples.len() {
                break;
            }
            if sample.end as usize > self.sample_data.len() || sample.start > sample.end {
                return Err(BankError::IndexOutOfRange {
                    chunk: "shdr",
                    index: sample.end as usize,
                    len: self.sample_data.len(),
                });
            }
        }

        Ok(())
    }

    /// Number of real presets (excluding the terminal record).
    pub fn preset_count(&self) -> usize {
        self.presets.len().saturating_sub(1)
    }

    /// The preset zone indices belonging to the given preset.
    pub fn preset_zone_range(&self, preset: usize) -> Range<usize> {
        zone_range(
            self.presets.get(preset).map(|p| p.zone_index),
            self.presets.get(preset + 1).map(|p| p.zone_index),
        )
    }

    /// The instrument zone indices belonging to the given instrument.
    pub fn instrument_zone_range(&self, instrument: usize) -> Range<usize> {
        zone_range(
            self.instruments.get(instrument).map(|i| i.zone_index),
            self.instruments.get(instrument + 1).map(|i| i.zone_index),
        )
    }

    /// The generators of a preset zone.
    pub fn preset_zone_generators(&self, zone: usize) -> &[Generator] {
        zone_generators(&self.preset_zones, &self.preset_generators, zone)
    }

    /// The generators of an instrument zone.
    pub fn instrument_zone_generators(&self, zone: usize) -> &[Generator] {
        zone_generators(&self.instrument_zones, &self.instrument_generators, zone)
    }
}

fn zone_range(start: Option<u16>, end: Option<u16>) -> Range<usize> {
    match (start, end) {
        (Some(start), Some(end)) if start <= end => start as usize..end as usize,
        _ => 0..0,
    }
}

fn zone_generators<'a>(
    zones: &[Zone],
    generators: &'a [Generator],
    zone: usize,
) -> &'a [Generator] {
    let (Some(start), Some(end)) = (zones.get(zone), zones.get(zone + 1)) else {
        return &[];
    };
    generators
        .get(start.generator_index as usize..end.generator_index as usize)
        .unwrap_or(&[])
}

fn check_indices(
    chunk: &'static str,
    indices: impl Iterator<Item = usize>,
    len: usize,
) -> Result<(), BankError> {
    let mut previous = 0;
    for (record, index) in indices.enumerate() {
        if index < previous {
            return Err(BankError::NonMonotonic {
                chunk,
                index: record,
            });
        }
        if index >= len {
            return Err(BankError::IndexOutOfRange { chunk, index, len });
        }
        previous = index;
    }
    Ok(())
}
