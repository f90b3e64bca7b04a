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

//! Zone resolution: turns a note request into playback parameters.
//!
//! The walk goes preset header, preset zones, instrument, instrument zones, sample.
//! Zones without a terminal generator are global zones and supply defaults for their
//! level. Generator amounts are collected in explicit [`Accumulator`]s, one per
//! level, and the two levels are added together before conversion to engine units.

mod accumulator;

pub use accumulator::{Accumulator, Level};

use std::ops::Range;

use crate::bank::{Bank, Generator, GeneratorType, SampleHeader, PERCUSSION_BANK};
use crate::units::{
    cents_to_multiplier, centibels_to_linear, note_to_frequency, timecents_to_samples,
};
use crate::voice::{Envelope, LoopMode, SampleWindow};

/// Default for every envelope time generator, in timecents.
const DEFAULT_TIMECENTS: i32 = -12000;

/// Largest attenuation the engine honours, in centibels.
const MAX_ATTENUATION: i32 = 1440;

/// Address offsets in coarse generators are in units of 32768 frames.
const COARSE_OFFSET: i64 = 32768;

/// What a note-on asks the resolver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRequest {
    pub note: u8,
    pub velocity: u8,
    pub bank: u16,
    pub program: u8,
}

/// Fully converted playback parameters for one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub preset: usize,
    pub instrument: usize,
    pub sample: usize,
    /// The note after any key number override.
    pub note: u8,
    pub window: SampleWindow,
    /// Frames of sample data per output frame.
    pub increment: f64,
    pub envelope: Envelope,
    /// Samples between the note-on and the start of the envelope.
    pub delay: u64,
    /// Initial pan from the bank, if it sets one.
    pub pan: Option<f32>,
    /// Velocity and attenuation, linear.
    pub gain: f32,
    pub exclusive_class: u16,
}

/// Finds the preset header for a bank/program pair.
///
/// An exact bank and program match wins. Melodic requests otherwise fall back to bank
/// 0, and percussion requests to the last bank 128 kit with a program at or below the
/// one asked for. Later headers overwrite earlier fallbacks.
pub fn find_preset(bank: &Bank, bank_number: u16, program: u8) -> Option<usize> {
    let program = program as u16;
    let mut chosen = None;
    for (index, header) in bank.presets.iter().take(bank.preset_count()).enumerate() {
        if bank_number == PERCUSSION_BANK
            && header.bank == PERCUSSION_BANK
            && header.program <= program
        {
            chosen = Some(index);
        }
        if header.program == program {
            if header.bank == 0 && bank_number != PERCUSSION_BANK {
                chosen = Some(index);
            }
            if header.bank == bank_number {
                return Some(index);
            }
        }
    }
    chosen
}

/// Resolves a note against the bank. `None` means the note has nothing to play.
pub fn resolve(bank: &Bank, request: &NoteRequest, output_rate: f32) -> Option<Resolved> {
    let preset = find_preset(bank, request.bank, request.program)?;

    let (instrument, preset_amounts) = walk_zones(
        bank.preset_zone_range(preset),
        |zone| bank.preset_zone_generators(zone),
        GeneratorType::Instrument,
        Level::Preset,
        request,
    )?;
    let instrument = instrument as usize;
    if instrument >= bank.instruments.len().saturating_sub(1) {
        return None;
    }

    let (sample, instrument_amounts) = walk_zones(
        bank.instrument_zone_range(instrument),
        |zone| bank.instrument_zone_generators(zone),
        GeneratorType::SampleId,
        Level::Instrument,
        request,
    )?;
    let sample = sample as usize;
    if sample >= bank.samples.len().saturating_sub(1) {
        return None;
    }
    let header = &bank.samples[sample];
    if header.sample_rate == 0 {
        return None;
    }

    let amounts = instrument_amounts.merge(&preset_amounts);
    Some(finalize(
        &amounts,
        header,
        bank.sample_data.len(),
        request,
        output_rate,
        (preset, instrument, sample),
    ))
}

/// Walks a zone range. Global zones feed the accumulator; the first zone whose key and
/// velocity ranges match and that names a terminal target ends the walk.
fn walk_zones<'a>(
    zones: Range<usize>,
    generators_of: impl Fn(usize) -> &'a [Generator],
    terminal: GeneratorType,
    level: Level,
    request: &NoteRequest,
) -> Option<(u16, Accumulator)> {
    let mut global = Accumulator::new();
    for zone in zones {
        let generators = generators_of(zone);
        let Some(target) = generators.iter().find(|g| g.operator == terminal) else {
            global.apply(generators, level);
            continue;
        };
        if !in_ranges(generators, request) {
            continue;
        }
        let mut amounts = global;
        amounts.apply(generators, level);
        return Some((target.amount.as_u16(), amounts));
    }
    None
}

fn in_ranges(generators: &[Generator], request: &NoteRequest) -> bool {
    generators.iter().all(|g| match g.operator {
        GeneratorType::KeyRange => g.amount.range_contains(request.note),
        GeneratorType::VelRange => g.amount.range_contains(request.velocity),
        _ => true,
    })
}

fn finalize(
    amounts: &Accumulator,
    header: &SampleHeader,
    data_len: usize,
    request: &NoteRequest,
    output_rate: f32,
    (preset, instrument, sample): (usize, usize, usize),
) -> Resolved {
    let midi_value = |operator| {
        amounts
            .get(operator)
            .filter(|v| (0..=127).contains(v))
            .map(|v| v as u8)
    };
    let note = midi_value(GeneratorType::Keynum).unwrap_or(request.note);
    let velocity = midi_value(GeneratorType::Velocity).unwrap_or(request.velocity);
    let root = midi_value(GeneratorType::OverridingRootKey).unwrap_or(header.original_key);

    let attenuation = amounts
        .get_or(GeneratorType::InitialAttenuation, 0)
        .clamp(0, MAX_ATTENUATION);
    let gain = velocity as f32 / 128.0 * centibels_to_linear(-(attenuation as f32));

    let envelope = envelope(amounts, note, output_rate);
    let delay = amounts
        .get(GeneratorType::DelayVolEnv)
        .map(|tc| timecents_to_samples(tc, output_rate) as u64)
        .unwrap_or(0);
    let pan = amounts
        .get(GeneratorType::Pan)
        .map(|p| ((p as f32 / 500.0 + 1.0) / 2.0).clamp(0.0, 1.0));

    let window = window(amounts, header, data_len);

    let scale = amounts
        .get_or(GeneratorType::ScaleTuning, 100)
        .clamp(0, 1200) as u16;
    let coarse = amounts.get_or(GeneratorType::CoarseTune, 0) as f32;
    let fine = amounts.get_or(GeneratorType::FineTune, 0) as f32;
    let mut increment = note_to_frequency(note, scale, 440.0) as f64
        / note_to_frequency(root, scale, 440.0) as f64
        * (header.sample_rate as f64 / output_rate as f64);
    increment *= cents_to_multiplier(coarse * 100.0, 1, 1) as f64;
    increment *= cents_to_multiplier(fine, 1, 1) as f64;
    increment *= cents_to_multiplier(header.correction as f32, 1, 1) as f64;

    Resolved {
        preset,
        instrument,
        sample,
        note,
        window,
        increment,
        envelope,
        delay,
        pan,
        gain,
        exclusive_class: amounts
            .get_or(GeneratorType::ExclusiveClass, 0)
            .clamp(0, u16::MAX as i32) as u16,
    }
}

fn envelope(amounts: &Accumulator, note: u8, output_rate: f32) -> Envelope {
    let time = |operator| {
        timecents_to_samples(amounts.get_or(operator, DEFAULT_TIMECENTS), output_rate)
    };
    let key_scale = |operator| {
        let per_key = amounts.get_or(operator, 0) as f32;
        cents_to_multiplier((60.0 - note as f32) * per_key, 1, 1)
    };

    let hold = time(GeneratorType::HoldVolEnv) * key_scale(GeneratorType::KeynumToVolEnvHold);
    let mut decay =
        time(GeneratorType::DecayVolEnv) * key_scale(GeneratorType::KeynumToVolEnvDecay);

    let sustain_cb = amounts
        .get_or(GeneratorType::SustainVolEnv, 0)
        .min(MAX_ATTENUATION);
    let sustain = if sustain_cb <= 0 {
        // Full level sustain has nothing to decay to.
        decay = 0.0;
        1.0
    } else {
        centibels_to_linear(-(sustain_cb as f32))
    };

    Envelope {
        attack: time(GeneratorType::AttackVolEnv),
        hold,
        decay,
        sustain,
        release: time(GeneratorType::ReleaseVolEnv),
    }
}

fn window(amounts: &Accumulator, header: &SampleHeader, data_len: usize) -> SampleWindow {
    let offset = |fine, coarse| {
        amounts.get_or(fine, 0) as i64 + amounts.get_or(coarse, 0) as i64 * COARSE_OFFSET
    };
    let clamp = |base: u32, delta: i64, low: usize, high: usize| {
        (base as i64 + delta).clamp(low as i64, high.max(low) as i64) as usize
    };

    let start = clamp(
        header.start,
        offset(
            GeneratorType::StartAddrsOffset,
            GeneratorType::StartAddrsCoarseOffset,
        ),
        0,
        data_len,
    );
    let end = clamp(
        header.end,
        offset(
            GeneratorType::EndAddrsOffset,
            GeneratorType::EndAddrsCoarseOffset,
        ),
        start,
        data_len,
    );
    let loop_start = clamp(
        header.loop_start,
        offset(
            GeneratorType::StartloopAddrsOffset,
            GeneratorType::StartloopAddrsCoarseOffset,
        ),
        start,
        end,
    );
    let loop_end = clamp(
        header.loop_end,
        offset(
            GeneratorType::EndloopAddrsOffset,
            GeneratorType::EndloopAddrsCoarseOffset,
        ),
        loop_start,
        end,
    );

    SampleWindow {
        start,
        end,
        loop_start,
        loop_end,
        mode: LoopMode::from_sample_modes(amounts.get_or(GeneratorType::SampleModes, 0) as u16),
    }
}
