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
use super::SampleWindow;

const I16_SCALE: f32 = 1.0 / 32767.0;

/// Reads the sample window at a fractional `position` (frames from the window
/// start) with 4-point Catmull-Rom interpolation. Neighbours past the loop end
/// wrap when the window loops, otherwise they clamp to the window end.
pub fn read(data: &[i16], window: &SampleWindow, position: f64) -> f32 {
    let whole = position.floor();
    let mu = (position - whole) as f32;
    let index = window.start + whole as usize;

    let before = if index > window.start { index - 1 } else { index };
    let next = step(window, index);
    let after = step(window, next);

    let p0 = frame(data, before);
    let p1 = frame(data, index);
    let p2 = frame(data, next);
    let p3 = frame(data, after);

    let mu2 = mu * mu;
    let mu3 = mu2 * mu;
    let value = 0.5
        * (2.0 * p1
            + (p2 - p0) * mu
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * mu2
            + (3.0 * (p1 - p2) + p3 - p0) * mu3);
    value * I16_SCALE
}

fn step(window: &SampleWindow, index: usize) -> usize {
    let next = index + 1;
    if window.loops() && next >= window.loop_end {
        next - window.loop_len()
    } else {
        next.min(window.end)
    }
}

fn frame(data: &[i16], index: usize) -> f32 {
    data.get(index).copied().unwrap_or(0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::LoopMode;

    fn window(mode: LoopMode) -> SampleWindow {
        SampleWindow {
            start: 2,
            end: 10,
            loop_start: 4,
            loop_end: 8,
            mode,
        }
    }

    fn ramp() -> Vec<i16> {
        (0..12).map(|i| i * 1000).collect()
    }

    #[test]
    fn test_integer_positions_are_exact() {
        let data = ramp();
        let w = window(LoopMode::NoLoop);
        for offset in 0..8 {
            let expected = data[2 + offset] as f32 / 32767.0;
            assert!((read(&data, &w, offset as f64) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_data_interpolates_linearly() {
        let data = ramp();
        let w = window(LoopMode::NoLoop);
        let value = read(&data, &w, 2.5);
        assert!((value - 4500.0 / 32767.0).abs() < 1e-5);
    }

    #[test]
    fn test_loop_wraps_neighbours() {
        let data = ramp();
        let looped = window(LoopMode::Continuous);
        let unlooped = window(LoopMode::NoLoop);
        // Frame 7 is the last before the loop end; its next neighbour wraps to frame 4.
        let looped_value = read(&data, &looped, 5.5);
        let unlooped_value = read(&data, &unlooped, 5.5);
        assert!(looped_value < unlooped_value);
    }

    #[test]
    fn test_reads_past_data_are_silent() {
        let data = vec![1000i16; 4];
        let w = SampleWindow {
            start: 0,
            end: 10,
            loop_start: 0,
            loop_end: 0,
            mode: LoopMode::NoLoop,
        };
        assert_eq!(read(&data, &w, 8.0), 0.0);
    }
}
