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

/// SoundFont 2.04 generator operators (section 8.1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GeneratorType {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    EndOper = 60,
}

impl GeneratorType {
    const ALL: [GeneratorType; 61] = [
        GeneratorType::StartAddrsOffset,
        GeneratorType::EndAddrsOffset,
        GeneratorType::StartloopAddrsOffset,
        GeneratorType::EndloopAddrsOffset,
        GeneratorType::StartAddrsCoarseOffset,
        GeneratorType::ModLfoToPitch,
        GeneratorType::VibLfoToPitch,
        GeneratorType::ModEnvToPitch,
        GeneratorType::InitialFilterFc,
        GeneratorType::InitialFilterQ,
        GeneratorType::ModLfoToFilterFc,
        GeneratorType::ModEnvToFilterFc,
        GeneratorType::EndAddrsCoarseOffset,
        GeneratorType::ModLfoToVolume,
        GeneratorType::Unused1,
        GeneratorType::ChorusEffectsSend,
        GeneratorType::ReverbEffectsSend,
        GeneratorType::Pan,
        GeneratorType::Unused2,
        GeneratorType::Unused3,
        GeneratorType::Unused4,
        GeneratorType::DelayModLfo,
        GeneratorType::FreqModLfo,
        GeneratorType::DelayVibLfo,
        GeneratorType::FreqVibLfo,
        GeneratorType::DelayModEnv,
        GeneratorType::AttackModEnv,
        GeneratorType::HoldModEnv,
        GeneratorType::DecayModEnv,
        GeneratorType::SustainModEnv,
        GeneratorType::ReleaseModEnv,
        GeneratorType::KeynumToModEnvHold,
        GeneratorType::KeynumToModEnvDecay,
        GeneratorType::DelayVolEnv,
        GeneratorType::AttackVolEnv,
        GeneratorType::HoldVolEnv,
        GeneratorType::DecayVolEnv,
        GeneratorType::SustainVolEnv,
        GeneratorType::ReleaseVolEnv,
        GeneratorType::KeynumToVolEnvHold,
        GeneratorType::KeynumToVolEnvDecay,
        GeneratorType::Instrument,
        GeneratorType::Reserved1,
        GeneratorType::KeyRange,
        GeneratorType::VelRange,
        GeneratorType::StartloopAddrsCoarseOffset,
        GeneratorType::Keynum,
        GeneratorType::Velocity,
        GeneratorType::InitialAttenuation,
        GeneratorType::Reserved2,
        GeneratorType::EndloopAddrsCoarseOffset,
        GeneratorType::CoarseTune,
        GeneratorType::FineTune,
        GeneratorType::SampleId,
        GeneratorType::SampleModes,
        GeneratorType::Reserved3,
        GeneratorType::ScaleTuning,
        GeneratorType::ExclusiveClass,
        GeneratorType::OverridingRootKey,
        GeneratorType::Unused5,
        GeneratorType::EndOper,
    ];

    /// Maps a raw operator number from a bank to its generator, if it is one.
    pub fn from_raw(raw: u16) -> Option<GeneratorType> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Instrument-only generators (marked `+` in the SoundFont spec). A bank that
    /// carries one of these at preset level is invalid there and it is ignored.
    pub fn is_instrument_only(self) -> bool {
        matches!(
            self,
            GeneratorType::StartAddrsOffset
                | GeneratorType::EndAddrsOffset
                | GeneratorType::StartloopAddrsOffset
                | GeneratorType::EndloopAddrsOffset
                | GeneratorType::StartAddrsCoarseOffset
                | GeneratorType::EndAddrsCoarseOffset
                | GeneratorType::StartloopAddrsCoarseOffset
                | GeneratorType::EndloopAddrsCoarseOffset
                | GeneratorType::Keynum
                | GeneratorType::Velocity
                | GeneratorType::SampleModes
                | GeneratorType::ExclusiveClass
                | GeneratorType::OverridingRootKey
        )
    }
}

/// A generator amount. Banks store a 16-bit word that is read as signed, unsigned
/// or a low/high byte range depending on the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenAmount(u16);

impl GenAmount {
    pub fn signed(amount: i16) -> GenAmount {
        GenAmount(amount as u16)
    }

    pub fn unsigned(amount: u16) -> GenAmount {
        GenAmount(amount)
    }

    pub fn range(low: u8, high: u8) -> GenAmount {
        GenAmount(u16::from_le_bytes([low, high]))
    }

    pub fn as_i16(self) -> i16 {
        self.0 as i16
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// The (low, high) byte range, both inclusive.
    pub fn as_range(self) -> (u8, u8) {
        let [low, high] = self.0.to_le_bytes();
        (low, high)
    }

    /// Whether the value falls inside the range reading of this amount.
    pub fn range_contains(self, value: u8) -> bool {
        let (low, high) = self.as_range();
        low <= value && value <= high
    }
}

/// One generator record: an operator plus its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    pub operator: GeneratorType,
    pub amount: GenAmount,
}

impl Generator {
    pub fn new(operator: GeneratorType, amount: GenAmount) -> Generator {
        Generator { operator, amount }
    }

    pub fn signed(operator: GeneratorType, amount: i16) -> Generator {
        Generator::new(operator, GenAmount::signed(amount))
    }

    pub fn unsigned(operator: GeneratorType, amount: u16) -> Generator {
        Generator::new(operator, GenAmount::unsigned(amount))
    }

    pub fn key_range(low: u8, high: u8) -> Generator {
        Generator::new(GeneratorType::KeyRange, GenAmount::range(low, high))
    }

    pub fn vel_range(low: u8, high: u8) -> Generator {
        Generator::new(GeneratorType::VelRange, GenAmount::range(low, high))
    }

    pub fn instrument(index: u16) -> Generator {
        Generator::unsigned(GeneratorType::Instrument, index)
    }

    pub fn sample(index: u16) -> Generator {
        Generator::unsigned(GeneratorType::SampleId, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_matches_discriminant() {
        for raw in 0..=60u16 {
            let generator = GeneratorType::from_raw(raw).unwrap();
            assert_eq!(generator as u16, raw);
        }
        assert_eq!(GeneratorType::from_raw(61), None);
        assert_eq!(GeneratorType::from_raw(0x7fff), None);
    }

    #[test]
    fn test_amount_readings() {
        let amount = GenAmount::signed(-1200);
        assert_eq!(amount.as_i16(), -1200);
        assert_eq!(amount.as_u16(), 64336);

        let range = GenAmount::range(36, 72);
        assert_eq!(range.as_range(), (36, 72));
        assert!(range.range_contains(36));
        assert!(range.range_contains(72));
        assert!(!range.range_contains(35));
        assert!(!range.range_contains(73));
    }

    #[test]
    fn test_instrument_only() {
        assert!(GeneratorType::StartAddrsOffset.is_instrument_only());
        assert!(GeneratorType::EndloopAddrsCoarseOffset.is_instrument_only());
        assert!(GeneratorType::ExclusiveClass.is_instrument_only());
        assert!(!GeneratorType::CoarseTune.is_instrument_only());
        assert!(!GeneratorType::AttackVolEnv.is_instrument_only());
    }
}
