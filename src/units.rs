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

//! Conversions out of the SoundFont logarithmic unit system.

/// Centre value of a 14-bit pitch bend.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Default pitch bend range in semitones.
pub const DEFAULT_BEND_RANGE: u8 = 2;

/// Converts a scaled cents value into a frequency multiplier: `2^(num * cents / 1200 / den)`.
///
/// With `num == den` this is the plain timecent/cent conversion. Controllers use the
/// ratio to scale a fixed depth by their 0-127 value.
pub fn cents_to_multiplier(cents: f32, num: u16, den: u16) -> f32 {
    2f32.powf(num as f32 * (cents / 1200.0) / den as f32)
}

/// Converts a (negative) centibel attenuation to linear amplitude, 0.0 to 1.0.
pub fn centibels_to_linear(cb: f32) -> f32 {
    if cb > 0.0 {
        return 1.0;
    }
    10f32.powf(cb / 200.0)
}

/// Converts timecents to a duration in samples at the given rate.
pub fn timecents_to_samples(timecents: i32, sample_rate: f32) -> f32 {
    sample_rate * cents_to_multiplier(timecents as f32, 1, 1)
}

/// Converts a MIDI note to a frequency, with `cents_per_key` spacing around A4.
pub fn note_to_frequency(note: u8, cents_per_key: u16, a4: f32) -> f32 {
    2f32.powf((note as f32 - 69.0) * cents_per_key as f32 / 1200.0) * a4
}

/// Converts a raw 14-bit pitch bend into a frequency multiplier.
///
/// Ranges wider than an octave are replaced by the 2 semitone default, matching what
/// common GS hardware does with them.
pub fn pitch_bend_to_multiplier(bend: u16, range: u8) -> f32 {
    let range = if range > 12 { DEFAULT_BEND_RANGE } else { range };
    let offset = bend as f32 - PITCH_BEND_CENTER as f32;
    2f32.powf(offset * (range as f32 / 12.0) / PITCH_BEND_CENTER as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4 * b.abs().max(1.0)
    }

    #[test]
    fn test_cents_to_multiplier() {
        assert!(close(cents_to_multiplier(1200.0, 1, 1), 2.0));
        assert!(close(cents_to_multiplier(-1200.0, 1, 1), 0.5));
        assert!(close(cents_to_multiplier(0.0, 1, 1), 1.0));
        // Half the controller range gives half the depth.
        assert!(close(cents_to_multiplier(1200.0, 64, 128), 2f32.sqrt()));
    }

    #[test]
    fn test_centibels() {
        assert_eq!(centibels_to_linear(10.0), 1.0);
        assert!(close(centibels_to_linear(0.0), 1.0));
        assert!(close(centibels_to_linear(-200.0), 0.1));
        assert!(close(centibels_to_linear(-60.0), 0.501187));
    }

    #[test]
    fn test_timecents() {
        assert!(close(timecents_to_samples(0, 44100.0), 44100.0));
        assert!(close(timecents_to_samples(-1200, 44100.0), 22050.0));
        assert!(close(timecents_to_samples(-12000, 1024.0), 1.0));
    }

    #[test]
    fn test_note_frequency() {
        assert!(close(note_to_frequency(69, 100, 440.0), 440.0));
        assert!(close(note_to_frequency(81, 100, 440.0), 880.0));
        assert!(close(note_to_frequency(60, 100, 440.0), 261.6256));
        // Zero scale tuning makes every key play at A4.
        assert!(close(note_to_frequency(30, 0, 440.0), 440.0));
    }

    #[test]
    fn test_pitch_bend() {
        assert!(close(pitch_bend_to_multiplier(8192, 2), 1.0));
        assert!(close(pitch_bend_to_multiplier(16384, 12), 2.0));
        assert!(close(pitch_bend_to_multiplier(0, 12), 0.5));
        // Out of range values fall back to +/-2 semitones.
        assert!(close(
            pitch_bend_to_multiplier(16384, 24),
            pitch_bend_to_multiplier(16384, 2)
        ));
        assert!(close(pitch_bend_to_multiplier(16384, 2), 2f32.powf(2.0 / 12.0)));
    }
}
