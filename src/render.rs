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

//! Offline rendering, for tests and for bouncing a performance to disk.

use std::{fs::File, io::BufWriter, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use crate::engine::Engine;
use crate::error::EngineError;

/// Renders `frames` stereo frames in block-size chunks and returns them interleaved.
pub fn render_frames(engine: &mut Engine, frames: usize) -> Vec<f32> {
    let block = engine.config().block_size().max(1) * 2;
    let mut out = vec![0.0; frames * 2];
    for chunk in out.chunks_mut(block) {
        engine.render(chunk);
    }
    out
}

/// Renders `frames` stereo frames into a 16-bit WAV file at the engine's sample rate.
pub fn bounce_to_wav(engine: &mut Engine, frames: usize, path: &Path) -> Result<(), EngineError> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: engine.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::new(BufWriter::new(File::create(path)?), spec)?;

    let mut block = vec![0.0; engine.config().block_size().max(1) * 2];
    let mut remaining = frames;
    while remaining > 0 {
        let len = remaining.min(block.len() / 2) * 2;
        let block = &mut block[..len];
        engine.render(block);
        for sample in block.iter() {
            writer.write_sample(to_i16(*sample))?;
        }
        remaining -= len / 2;
    }
    writer.finalize()?;

    info!(
        path = %path.display(),
        frames,
        sample_rate = spec.sample_rate,
        "Bounced engine output"
    );
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::config::EngineConfig;

    fn engine() -> (Engine, crate::EventProducer) {
        crate::synth(EngineConfig::default().with_sample_rate(44100), None).unwrap()
    }

    #[test]
    fn test_render_frames_matches_single_block() {
        let (mut chunked, producer) = engine();
        producer.note_on(0, 0, 69, 100).unwrap();
        producer.note_off(700, 0, 69).unwrap();
        let (mut whole, producer) = engine();
        producer.note_on(0, 0, 69, 100).unwrap();
        producer.note_off(700, 0, 69).unwrap();

        let out = render_frames(&mut chunked, 1300);
        assert_eq!(out.len(), 2600);
        assert_eq!(chunked.position(), 1300);

        let mut reference = vec![0.0; 2600];
        whole.render(&mut reference);
        // Quiet output is never rescaled, so the block boundaries don't matter.
        assert_eq!(out, reference);
    }

    #[test]
    fn test_bounce_to_wav() -> Result<(), Box<dyn Error>> {
        let tempdir = tempfile::tempdir()?;
        let path = tempdir.path().join("bounce.wav");

        let (mut engine, producer) = engine();
        producer.note_on(0, 0, 69, 127)?;
        bounce_to_wav(&mut engine, 1000, &path)?;

        let reader = hound::WavReader::open(&path)?;
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 2000);

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<i16>, _>>()?;
        assert!(samples.iter().any(|s| s.unsigned_abs() > 1000));
        Ok(())
    }

    #[test]
    fn test_to_i16_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(4.0), i16::MAX);
        assert_eq!(to_i16(-4.0), -i16::MAX);
    }
}
