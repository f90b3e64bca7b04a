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
use crate::bank::{Generator, GeneratorType};

const GENERATOR_COUNT: usize = GeneratorType::EndOper as usize + 1;

/// Which level of the bank hierarchy generators come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Preset,
    Instrument,
}

/// Generator amounts gathered while walking zones. Amounts add up, except for the
/// generators that select a value (key/velocity overrides, root key, sample modes),
/// where a later zone replaces an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    amounts: [i32; GENERATOR_COUNT],
    present: u64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            amounts: [0; GENERATOR_COUNT],
            present: 0,
        }
    }
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    /// Applies a zone's generators. Ranges and terminal generators are skipped, and
    /// instrument-only generators are skipped at preset level.
    pub fn apply(&mut self, generators: &[Generator], level: Level) {
        for generator in generators {
            if is_structural(generator.operator)
                || (level == Level::Preset && generator.operator.is_instrument_only())
            {
                continue;
            }
            let amount = amount_of(generator);
            if is_selector(generator.operator) {
                self.set(generator.operator, amount);
            } else {
                self.add(generator.operator, amount);
            }
        }
    }

    /// Adds another level's amounts onto this one.
    pub fn merge(mut self, other: &Accumulator) -> Accumulator {
        for index in 0..GENERATOR_COUNT {
            if other.present & (1 << index) != 0 {
                self.amounts[index] += other.amounts[index];
                self.present |= 1 << index;
            }
        }
        self
    }

    pub fn get(&self, operator: GeneratorType) -> Option<i32> {
        let index = operator as usize;
        (self.present & (1 << index) != 0).then_some(self.amounts[index])
    }

    pub fn get_or(&self, operator: GeneratorType, default: i32) -> i32 {
        self.get(operator).unwrap_or(default)
    }

    fn add(&mut self, operator: GeneratorType, amount: i32) {
        let index = operator as usize;
        self.amounts[index] += amount;
        self.present |= 1 << index;
    }

    fn set(&mut self, operator: GeneratorType, amount: i32) {
        let index = operator as usize;
        self.amounts[index] = amount;
        self.present |= 1 << index;
    }
}

fn is_structural(operator: GeneratorType) -> bool {
    matches!(
        operator,
        GeneratorType::KeyRange
            | GeneratorType::VelRange
            | GeneratorType::Instrument
            | GeneratorType::SampleId
            | GeneratorType::EndOper
    )
}

fn is_selector(operator: GeneratorType) -> bool {
    matches!(
        operator,
        GeneratorType::Keynum
            | GeneratorType::Velocity
            | GeneratorType::OverridingRootKey
            | GeneratorType::SampleModes
    )
}

fn amount_of(generator: &Generator) -> i32 {
    match generator.operator {
        GeneratorType::Keynum
        | GeneratorType::Velocity
        | GeneratorType::InitialAttenuation
        | GeneratorType::SampleModes
        | GeneratorType::ScaleTuning
        | GeneratorType::ExclusiveClass => generator.amount.as_u16() as i32,
        _ => generator.amount.as_i16() as i32,
    }
}
