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
use super::{
    Bank, GenAmount, Generator, GeneratorType, InstrumentHeader, PresetHeader, SampleHeader, Zone,
};

/// Zero frames the format requires after every sample.
const SAMPLE_PADDING: usize = 46;

/// Mono sample type in `shdr`.
const MONO_SAMPLE: u16 = 1;

/// Assembles a bank in memory, in the same flat layout a bank loader produces.
///
/// Zones are given as generator lists. Generators are reordered the way the format
/// requires (ranges first, the terminal instrument/sample generator last) and the
/// terminal records are appended by [`BankBuilder::build`].
#[derive(Debug, Default)]
pub struct BankBuilder {
    bank: Bank,
}

impl BankBuilder {
    pub fn new() -> BankBuilder {
        BankBuilder::default()
    }

    /// Adds an unlooped mono sample and returns its sample index.
    pub fn add_sample(&mut self, name: &str, data: &[i16], sample_rate: u32, root_key: u8) -> u16 {
        let len = data.len() as u32;
        self.add_looped_sample(name, data, 0, len, sample_rate, root_key)
    }

    /// Adds a mono sample with loop points relative to its first frame and returns its
    /// sample index.
    pub fn add_looped_sample(
        &mut self,
        name: &str,
        data: &[i16],
        loop_start: u32,
        loop_end: u32,
        sample_rate: u32,
        root_key: u8,
    ) -> u16 {
        let start = self.bank.sample_data.len() as u32;
        self.bank.sample_data.extend_from_slice(data);
        let end = self.bank.sample_data.len() as u32;
        self.bank
            .sample_data
            .resize(end as usize + SAMPLE_PADDING, 0);

        self.bank.samples.push(SampleHeader {
            name: name.to_string(),
            start,
            end,
            loop_start: start + loop_start,
            loop_end: start + loop_end,
            sample_rate,
            original_key: root_key,
            correction: 0,
            sample_link: 0,
            sample_type: MONO_SAMPLE,
        });
        (self.bank.samples.len() - 1) as u16
    }

    /// Sets the pitch correction of an already added sample, in cents.
    pub fn set_sample_correction(&mut self, sample: u16, correction: i8) {
        if let Some(header) = self.bank.samples.get_mut(sample as usize) {
            header.correction = correction;
        }
    }

    /// Adds an instrument made of the given zones and returns its instrument index.
    pub fn add_instrument(&mut self, name: &str, zones: Vec<Vec<Generator>>) -> u16 {
        let zone_index = self.bank.instrument_zones.len() as u16;
        for generators in zones {
            self.bank.instrument_zones.push(Zone {
                generator_index: self.bank.instrument_generators.len() as u16,
                modulator_index: 0,
            });
            self.bank
                .instrument_generators
                .extend(in_format_order(generators));
        }
        self.bank.instruments.push(InstrumentHeader {
            name: name.to_string(),
            zone_index,
        });
        (self.bank.instruments.len() - 1) as u16
    }

    /// Adds a preset made of the given zones and returns its preset index.
    pub fn add_preset(
        &mut self,
        name: &str,
        bank: u16,
        program: u16,
        zones: Vec<Vec<Generator>>,
    ) -> u16 {
        let zone_index = self.bank.preset_zones.len() as u16;
        for generators in zones {
            self.bank.preset_zones.push(Zone {
                generator_index: self.bank.preset_generators.len() as u16,
                modulator_index: 0,
            });
            self.bank
                .preset_generators
                .extend(in_format_order(generators));
        }
        self.bank.presets.push(PresetHeader {
            name: name.to_string(),
            program,
            bank,
            zone_index,
        });
        (self.bank.presets.len() - 1) as u16
    }

    /// Appends the terminal records and returns the finished bank.
    pub fn build(mut self) -> Bank {
        let bank = &mut self.bank;
        let terminal_generator = Generator::new(GeneratorType::EndOper, GenAmount::default());

        bank.presets.push(PresetHeader {
            name: "EOP".to_string(),
            program: 0,
            bank: 0,
            zone_index: bank.preset_zones.len() as u16,
        });
        bank.preset_zones.push(Zone {
            generator_index: bank.preset_generators.len() as u16,
            modulator_index: 0,
        });
        bank.preset_generators.push(terminal_generator);

        bank.instruments.push(InstrumentHeader {
            name: "EOI".to_string(),
            zone_index: bank.instrument_zones.len() as u16,
        });
        bank.instrument_zones.push(Zone {
            generator_index: bank.instrument_generators.len() as u16,
            modulator_index: 0,
        });
        bank.instrument_generators.push(terminal_generator);

        let data_len = bank.sample_data.len() as u32;
        bank.samples.push(SampleHeader {
            name: "EOS".to_string(),
            start: data_len,
            end: data_len,
            loop_start: data_len,
            loop_end: data_len,
            sample_rate: 0,
            original_key: 0,
            correction: 0,
            sample_link: 0,
            sample_type: 0,
        });

        self.bank
    }
}

fn in_format_order(mut generators: Vec<Generator>) -> Vec<Generator> {
    generators.sort_by_key(|generator| match generator.operator {
        GeneratorType::KeyRange => 0,
        GeneratorType::VelRange => 1,
        GeneratorType::Instrument | GeneratorType::SampleId => 3,
        _ => 2,
    });
    generators
}
