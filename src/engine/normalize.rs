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

/// Block peak normalization.
///
/// When a block peaks above 1.0 the gain ramps linearly from the previous block's gain
/// at the first frame to `1 / peak` at the peak frame, and holds there for the rest of
/// the block. Blocks that stay within range are left untouched.
#[derive(Debug, Clone)]
pub struct Normalizer {
    gain: f32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer { gain: 1.0 }
    }
}

impl Normalizer {
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }

    /// Normalizes an interleaved block with `channels` samples per frame.
    pub fn process(&mut self, block: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let Some((peak_index, peak)) = block
            .iter()
            .map(|s| s.abs())
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (index, value)| match best {
                Some((_, peak)) if peak >= value => best,
                _ => Some((index, value)),
            })
        else {
            return;
        };
        if peak <= 1.0 {
            return;
        }

        let previous = self.gain;
        let target = 1.0 / peak;
        let peak_frame = peak_index / channels;
        for (frame, samples) in block.chunks_mut(channels).enumerate() {
            let gain = if frame < peak_frame {
                previous + (target - previous) * frame as f32 / peak_frame as f32
            } else {
                target
            };
            for sample in samples {
                *sample *= gain;
            }
        }
        self.gain = target;
    }
}
