//! Synthesis of the completion cue.

use std::f32::consts::TAU;
use std::io::Cursor;

/// Sample rate the cue is rendered at.
pub const CUE_SAMPLE_RATE: u32 = 44_100;

/// Total cue length in seconds.
pub const CUE_DURATION_SECS: f32 = 0.4;

/// Tone steps as (start offset in seconds, frequency in Hz).
const STEPS: [(f32, f32); 3] = [(0.0, 800.0), (0.1, 1000.0), (0.2, 1200.0)];

const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

fn frequency_at(t: f32) -> f32 {
    STEPS
        .iter()
        .rev()
        .find(|(start, _)| t >= *start)
        .map(|(_, freq)| *freq)
        .unwrap_or(STEPS[0].1)
}

fn gain_at(t: f32) -> f32 {
    START_GAIN * (END_GAIN / START_GAIN).powf(t / CUE_DURATION_SECS)
}

/// Renders the ascending three-tone cue as mono samples in `[-1, 1]`.
///
/// Sine tones step 800 → 1000 → 1200 Hz every 0.1 s while the gain decays
/// exponentially from 0.3 to 0.01 over the whole cue.
pub fn synthesize_cue(sample_rate: u32) -> Vec<f32> {
    let total = (sample_rate as f32 * CUE_DURATION_SECS).round() as usize;
    let mut samples = Vec::with_capacity(total);
    // Accumulated phase keeps the waveform continuous across frequency steps.
    let mut phase = 0.0f32;

    for i in 0..total {
        let t = i as f32 / sample_rate as f32;
        samples.push(phase.sin() * gain_at(t));
        phase = (phase + TAU * frequency_at(t) / sample_rate as f32) % TAU;
    }
    samples
}

/// Encodes mono samples as a 16-bit PCM WAV file in memory.
pub fn render_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
