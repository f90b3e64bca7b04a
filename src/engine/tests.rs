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
use std::f64::consts::TAU;
use std::sync::Arc;

use super::*;
use crate::bank::{BankBuilder, Generator, GeneratorType};
use crate::queue::EventProducer;
use crate::voice::{EnvelopePhase, Waveform};

const RATE: u32 = 48000;

fn config() -> EngineConfig {
    EngineConfig::default().with_sample_rate(RATE)
}

fn engine(bank: Option<Bank>) -> (Engine, EventProducer) {
    crate::synth(config(), bank.map(Arc::new)).unwrap()
}

fn render(engine: &mut Engine, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames * 2];
    engine.render(&mut out);
    out
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6 * b.abs().max(1.0)
}

/// One unlooped 64 frame sample at root key 60, 44.1kHz, on bank 0 program 0.
fn simple_bank() -> Bank {
    let mut builder = BankBuilder::new();
    let data: Vec<i16> = (0..64).map(|i| if i % 8 < 4 { 8000 } else { -8000 }).collect();
    let sample = builder.add_sample("pulse", &data, 44100, 60);
    let instrument = builder.add_instrument("pulse", vec![vec![Generator::sample(sample)]]);
    builder.add_preset("pulse", 0, 0, vec![vec![Generator::instrument(instrument)]]);
    builder.build()
}

/// A continuously looping sample on bank 0 program 0 with extra instrument generators.
fn looped_bank(generators: Vec<Generator>) -> Bank {
    let mut builder = BankBuilder::new();
    let data: Vec<i16> = (0..200)
        .map(|i| if i % 20 < 10 { 16000 } else { -16000 })
        .collect();
    let sample = builder.add_looped_sample("square", &data, 20, 180, 44100, 60);
    let mut zone = generators;
    zone.push(Generator::unsigned(GeneratorType::SampleModes, 1));
    zone.push(Generator::sample(sample));
    let instrument = builder.add_instrument("square", vec![zone]);
    builder.add_preset("square", 0, 0, vec![vec![Generator::instrument(instrument)]]);
    builder.build()
}

#[test]
fn test_note_on_resolves_voice() {
    let (mut engine, producer) = engine(Some(simple_bank()));
    assert!(engine.has_bank());
    producer.note_on(0, 0, 60, 100).unwrap();

    let out = render(&mut engine, 1);
    let voice = engine.voice(0).unwrap();
    assert_eq!(voice.channel(), 0);
    assert_eq!(voice.note(), 60);
    assert_eq!(voice.start(), 0);
    assert!(voice.is_held());
    assert!(close(voice.increment(), 44100.0 / RATE as f64));
    assert_eq!(voice.envelope().phase(0), EnvelopePhase::Attack);
    // Attack starts from silence.
    assert_eq!(out, vec![0.0, 0.0]);

    let out = render(&mut engine, 30);
    assert!(out.iter().any(|s| *s != 0.0));
}

#[test]
fn test_unlooped_sample_plays_out() {
    let (mut engine, producer) = engine(Some(simple_bank()));
    producer.note_on(0, 0, 60, 100).unwrap();
    render(&mut engine, 10);
    assert_eq!(engine.active_voices(), 1);

    // 64 frames at 44.1kHz run out in under 70 output frames.
    render(&mut engine, 200);
    assert_eq!(engine.active_voices(), 0);
    assert!(render(&mut engine, 16).iter().all(|s| *s == 0.0));
}

#[test]
fn test_looped_sample_sustains_past_end() {
    let (mut engine, producer) = engine(Some(looped_bank(vec![])));
    producer.note_on(0, 0, 60, 100).unwrap();

    // 200 frames of data would run out in well under 5000 output frames without the loop.
    render(&mut engine, 5000);
    assert_eq!(engine.active_voices(), 1);
    assert!(engine.voice(0).unwrap().is_held());
    assert!(render(&mut engine, 64).iter().any(|s| s.abs() > 0.01));
}

#[test]
fn test_oldest_voice_is_stolen() {
    let (mut engine, producer) = engine(None);
    for note in 0..128u8 {
        producer.note_on(note as u64, 0, note, 100).unwrap();
    }
    producer.note_on(128, 1, 60, 100).unwrap();

    render(&mut engine, 128);
    assert_eq!(engine.active_voices(), MAX_VOICES);

    render(&mut engine, 2);
    assert_eq!(engine.active_voices(), MAX_VOICES);
    let stolen = engine.voice(0).unwrap();
    assert_eq!((stolen.channel(), stolen.note()), (1, 60));
    assert_eq!(stolen.start(), 128);

    // Exactly one voice was evicted.
    let survivors = (0..MAX_VOICES)
        .filter_map(|i| engine.voice(i))
        .filter(|v| v.channel() == 0 && !v.is_free(engine.position()))
        .count();
    assert_eq!(survivors, 127);
}

#[test]
fn test_retrigger_keeps_one_voice() {
    let (mut engine, producer) = engine(None);
    producer.note_on(0, 0, 60, 100).unwrap();
    producer.note_on(10, 0, 60, 90).unwrap();

    render(&mut engine, 20);
    assert_eq!(engine.active_voices(), 1);
    let voice = engine.voice(0).unwrap();
    assert_eq!(voice.start(), 10);
    assert_eq!(voice.velocity(), 90);
}

#[test]
fn test_sustain_pedal() {
    let (mut engine, producer) = engine(Some(looped_bank(vec![Generator::signed(
        GeneratorType::ReleaseVolEnv,
        0,
    )])));
    producer.note_on(0, 0, 60, 100).unwrap();
    producer.control_change(10, 0, controller::SUSTAIN, 127).unwrap();
    producer.note_off(20, 0, 60).unwrap();
    producer.control_change(100, 0, controller::SUSTAIN, 0).unwrap();

    render(&mut engine, 50);
    let voice = engine.voice(0).unwrap();
    assert!(voice.is_sustained());
    assert!(voice.is_held());

    render(&mut engine, 51);
    let voice = engine.voice(0).unwrap();
    assert!(!voice.is_sustained());
    // One second of release from the pedal-up position.
    assert_eq!(voice.end(), 100 + RATE as u64);
    assert_eq!(engine.active_voices(), 1);
}

#[test]
fn test_note_off_releases_to_silence() {
    let (mut engine, producer) = engine(None);
    producer.note_on(0, 0, 60, 100).unwrap();
    producer.note_off(100, 0, 60).unwrap();

    render(&mut engine, 101);
    let release = engine.voice(0).unwrap().envelope().release;
    assert_eq!(engine.voice(0).unwrap().end(), 100 + release as u64);

    render(&mut engine, release as usize + 10);
    assert_eq!(engine.active_voices(), 0);
    assert!(render(&mut engine, 8).iter().all(|s| *s == 0.0));
}

#[test]
fn test_events_are_sample_accurate() {
    let (mut engine, producer) = engine(None);
    producer.note_on(100, 3, 64, 100).unwrap();

    render(&mut engine, 100);
    assert_eq!(engine.active_voices(), 0);
    assert_eq!(engine.position(), 100);

    render(&mut engine, 1);
    assert_eq!(engine.active_voices(), 1);
    assert_eq!(engine.voice(0).unwrap().start(), 100);
}

#[test]
fn test_math_fallback_without_bank() {
    let (mut engine, producer) = engine(None);
    assert!(!engine.has_bank());
    producer.note_on(0, 0, 69, 127).unwrap();

    let out = render(&mut engine, 1000);
    let voice = engine.voice(0).unwrap();
    assert_eq!(voice.source(), &Source::Math(Waveform::Sine));
    assert!(close(voice.increment(), TAU * 440.0 / RATE as f64));
    assert!(out.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn test_configured_fallback_waveform() {
    let (mut engine, producer) =
        crate::synth(config().with_fallback_waveform(Waveform::Sawtooth), None).unwrap();
    producer.note_on(0, 0, 60, 100).unwrap();
    render(&mut engine, 1);
    assert_eq!(
        engine.voice(0).unwrap().source(),
        &Source::Math(Waveform::Sawtooth)
    );
}

#[test]
fn test_invalid_bank_falls_back() {
    let (mut engine, producer) = crate::synth(config(), Some(Arc::new(Bank::default()))).unwrap();
    assert!(!engine.has_bank());
    producer.note_on(0, 0, 60, 100).unwrap();
    render(&mut engine, 1);
    assert!(matches!(
        engine.voice(0).unwrap().source(),
        Source::Math(_)
    ));
}

#[test]
fn test_percussion_is_silent_without_bank() {
    let (mut engine, producer) = engine(None);
    assert!(engine.is_percussion(9));
    producer.note_on(0, 9, 36, 100).unwrap();
    let out = render(&mut engine, 10);
    assert_eq!(engine.active_voices(), 0);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn test_missing_preset_is_silent() {
    let (mut engine, producer) = engine(Some(simple_bank()));
    producer.program_change(0, 0, 5).unwrap();
    producer.note_on(0, 0, 60, 100).unwrap();
    let out = render(&mut engine, 10);
    assert_eq!(engine.active_voices(), 0);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn test_program_and_bank_select() {
    let mut builder = BankBuilder::new();
    let middle = builder.add_sample("middle", &[1000; 256], 44100, 60);
    let high = builder.add_sample("high", &[1000; 256], 44100, 72);
    let low = builder.add_sample("low", &[1000; 256], 44100, 48);
    for (program, bank, sample) in [(0, 0, middle), (1, 0, high), (0, 1, low)] {
        let instrument =
            builder.add_instrument("instrument", vec![vec![Generator::sample(sample)]]);
        builder.add_preset(
            "preset",
            bank,
            program,
            vec![vec![Generator::instrument(instrument)]],
        );
    }
    let (mut engine, producer) = engine(Some(builder.build()));

    producer.note_on(0, 0, 60, 100).unwrap();
    producer.program_change(0, 1, 1).unwrap();
    producer.note_on(0, 1, 60, 100).unwrap();
    producer
        .control_change(0, 2, controller::BANK_SELECT_LSB, 1)
        .unwrap();
    producer.note_on(0, 2, 60, 100).unwrap();
    render(&mut engine, 1);

    let unity = 44100.0 / RATE as f64;
    assert!(close(engine.voice(0).unwrap().increment(), unity));
    assert!(close(engine.voice(1).unwrap().increment(), unity / 2.0));
    assert!(close(engine.voice(2).unwrap().increment(), unity * 2.0));
}

#[test]
fn test_exclusive_class_releases_others() {
    let mut builder = BankBuilder::new();
    let data = vec![4000i16; 200];
    let sample = builder.add_looped_sample("hat", &data, 10, 190, 44100, 42);
    let zone = |key: u8| {
        vec![
            Generator::key_range(key, key),
            Generator::unsigned(GeneratorType::ExclusiveClass, 1),
            Generator::unsigned(GeneratorType::SampleModes, 1),
            Generator::sample(sample),
        ]
    };
    let instrument = builder.add_instrument("hats", vec![zone(42), zone(46)]);
    builder.add_preset(
        "drums",
        PERCUSSION_BANK,
        0,
        vec![vec![Generator::instrument(instrument)]],
    );
    let (mut engine, producer) = engine(Some(builder.build()));

    producer.note_on(0, 9, 42, 100).unwrap();
    producer.note_on(10, 9, 46, 100).unwrap();
    render(&mut engine, 20);

    let closed = engine.voice(0).unwrap();
    assert_eq!(closed.exclusive_class(), 1);
    assert_eq!(closed.end(), 10 + closed.envelope().release as u64);
    let open = engine.voice(1).unwrap();
    assert_eq!(open.note(), 46);
    assert!(open.is_held());
}

#[test]
fn test_delayed_voice_waits() {
    let (mut engine, producer) = engine(Some(looped_bank(vec![Generator::signed(
        GeneratorType::DelayVolEnv,
        -4800,
    )])));
    producer.note_on(0, 0, 60, 100).unwrap();

    let out = render(&mut engine, 2900);
    let start = engine.voice(0).unwrap().start();
    assert!((2999..=3001).contains(&start));
    assert_eq!(engine.active_voices(), 1);
    assert!(out.iter().all(|s| *s == 0.0));

    let out = render(&mut engine, 500);
    assert!(out.iter().any(|s| *s != 0.0));
}

#[test]
fn test_pan_follows_channel() {
    let (mut engine, producer) = engine(None);
    producer.control_change(0, 0, controller::PAN, 0).unwrap();
    producer.note_on(0, 0, 69, 127).unwrap();

    let out = render(&mut engine, 1000);
    assert!(out.chunks(2).all(|frame| frame[1] == 0.0));
    assert!(out.chunks(2).any(|frame| frame[0] != 0.0));

    // Moving the pan glides over a second, not instantly.
    producer.control_change(1000, 0, controller::PAN, 127).unwrap();
    render(&mut engine, 480);
    let pan = engine.voice(0).unwrap().pan();
    assert!(pan > 0.0 && pan < 0.05, "pan {}", pan);
}

#[test]
fn test_channel_mode_messages() {
    let (mut engine, producer) = engine(None);
    producer.note_on(0, 0, 60, 100).unwrap();
    producer.note_on(0, 0, 64, 100).unwrap();
    producer.note_on(0, 1, 60, 100).unwrap();
    producer
        .control_change(10, 0, controller::ALL_NOTES_OFF, 0)
        .unwrap();
    producer
        .control_change(10, 1, controller::ALL_SOUNDS_OFF, 0)
        .unwrap();

    render(&mut engine, 11);
    let release = engine.voice(0).unwrap().envelope().release as u64;
    assert_eq!(engine.voice(0).unwrap().end(), 10 + release);
    assert_eq!(engine.voice(1).unwrap().end(), 10 + release);
    assert!(engine.voice(2).unwrap().is_free(engine.position()));
    assert_eq!(engine.active_voices(), 2);
}

#[test]
fn test_pitch_bend_speeds_up_phase() {
    let (mut engine, producer) = engine(Some(looped_bank(vec![])));
    producer.note_on(0, 0, 60, 100).unwrap();
    render(&mut engine, 10);
    let before = engine.voice(0).unwrap().phase;
    render(&mut engine, 1);
    let straight = engine.voice(0).unwrap().phase - before;

    producer.pitch_bend(11, 0, 16383).unwrap();
    let before = engine.voice(0).unwrap().phase;
    render(&mut engine, 1);
    let bent = engine.voice(0).unwrap().phase - before;

    // Full upward bend with the default range is a whole tone.
    assert!((bent / straight - 2f64.powf(2.0 / 12.0)).abs() < 1e-3);
}

#[test]
fn test_normalization_leaves_quiet_output() {
    let events = |producer: &EventProducer| {
        producer.note_on(0, 0, 69, 64).unwrap();
        producer.note_off(2000, 0, 69).unwrap();
    };
    let (mut normalized, producer) = crate::synth(config().with_normalize(true), None).unwrap();
    events(&producer);
    let (mut plain, producer) = crate::synth(config().with_normalize(false), None).unwrap();
    events(&producer);

    let first = render(&mut normalized, 4096);
    let second = render(&mut plain, 4096);
    assert!(first.iter().all(|s| s.abs() <= 1.0));
    assert_eq!(first, second);
    assert_eq!(normalized.normalizer_gain(), 1.0);
}

#[test]
fn test_silent_block_carries_gain() {
    let (mut engine, producer) = engine(None);
    let melodic = (0..16u8).filter(|ch| *ch != 9);
    for channel in melodic.clone() {
        producer.note_on(0, channel, 69, 127).unwrap();
    }
    render(&mut engine, 1024);
    let gain = engine.normalizer_gain();
    assert!(gain < 1.0);

    for channel in melodic {
        producer
            .control_change(1024, channel, controller::ALL_SOUNDS_OFF, 0)
            .unwrap();
    }
    let out = render(&mut engine, 512);
    assert!(out.iter().all(|s| *s == 0.0));
    assert_eq!(engine.normalizer_gain(), gain);
}

#[test]
fn test_odd_buffer_tail_is_zeroed() {
    let (mut engine, producer) = engine(None);
    producer.note_on(0, 0, 69, 127).unwrap();
    let mut out = vec![9.0; 201];
    engine.render(&mut out);
    assert_eq!(out[200], 0.0);
    assert_eq!(engine.position(), 100);
}

#[test]
fn test_gs_sysex() {
    let (mut engine, producer) = engine(None);

    // Part 2 (channel 1) becomes a rhythm part.
    assert!(engine.apply_sysex(&[0x41, 0x10, 0x42, 0x12, 0x40, 0x12, 0x15, 0x02, 0x17]));
    assert!(engine.is_percussion(1));
    producer.note_on(0, 1, 60, 100).unwrap();
    producer.pitch_bend(0, 0, 0).unwrap();
    render(&mut engine, 4);
    assert_eq!(engine.active_voices(), 0);
    assert_eq!(engine.channel(0).unwrap().bend(), 0);

    let reset = [0xf0, 0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7f, 0x00, 0x41, 0xf7];
    assert!(engine.apply_sysex(&reset));
    assert!(!engine.is_percussion(1));
    assert!(engine.is_percussion(9));
    assert_eq!(engine.channel(0).unwrap().bend(), PITCH_BEND_CENTER);

    producer.note_on(4, 1, 60, 100).unwrap();
    render(&mut engine, 4);
    assert_eq!(engine.active_voices(), 1);

    assert!(!engine.apply_sysex(&[0xf0, 0x7e, 0x7f, 0x09, 0x01, 0xf7]));
}

#[test]
fn test_scale_tuning_detunes_pitch_class() {
    let (mut engine, producer) = engine(None);
    let mut tuning = vec![0x41, 0x10, 0x42, 0x12, 0x40, 0x11, 0x40];
    tuning.extend_from_slice(&[64, 64, 64, 64, 74, 64, 64, 64, 64, 64, 64, 64]);
    tuning.push(0x00);
    assert!(engine.apply_sysex(&tuning));

    producer.note_on(0, 0, 64, 100).unwrap();
    producer.note_on(0, 2, 64, 100).unwrap();
    render(&mut engine, 1);

    let tuned = engine.voice(0).unwrap().increment();
    let plain = engine.voice(1).unwrap().increment();
    assert!((tuned / plain - 2f64.powf(10.0 / 1200.0)).abs() < 1e-5);
}

#[test]
fn test_reset() {
    let (mut engine, producer) = engine(None);
    producer.program_change(0, 0, 12).unwrap();
    producer.note_on(0, 0, 60, 100).unwrap();
    producer.note_on(5000, 0, 62, 100).unwrap();
    render(&mut engine, 10);
    assert_eq!(engine.channel(0).unwrap().program(), 12);
    assert!(engine.apply_sysex(&[0x41, 0x10, 0x42, 0x12, 0x40, 0x12, 0x15, 0x02, 0x17]));

    engine.reset();
    assert_eq!(engine.position(), 0);
    assert_eq!(engine.active_voices(), 0);
    assert_eq!(engine.channel(0).unwrap().program(), 0);
    assert!(!engine.is_percussion(1));

    // The queued note was dropped.
    render(&mut engine, 6000);
    assert_eq!(engine.active_voices(), 0);
}
