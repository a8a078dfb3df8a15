// In-process signal helpers used by the native normalizer.
//
// All buffers are interleaved f32 in [-1.0, 1.0].

/// Convert a dBFS level to linear amplitude
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.log10()
}

/// Remove leading and trailing near-silence
///
/// A run only counts as silence when every sample in it stays at or below
/// `threshold_db` for at least `min_silence_secs`; shorter pauses are kept.
/// A buffer that never rises above the threshold comes back empty.
pub fn trim_silence(
    samples: &[f32],
    channels: usize,
    sample_rate: u32,
    threshold_db: f32,
    min_silence_secs: f32,
) -> Vec<f32> {
    if channels == 0 || samples.is_empty() {
        return Vec::new();
    }

    let threshold = db_to_amplitude(threshold_db);
    let min_frames = (min_silence_secs * sample_rate as f32).round() as usize;
    let is_loud = |frame: &[f32]| frame.iter().any(|s| s.abs() > threshold);

    let frames: Vec<&[f32]> = samples.chunks_exact(channels).collect();
    let Some(first_loud) = frames.iter().position(|f| is_loud(f)) else {
        return Vec::new();
    };
    let last_loud = frames.iter().rposition(|f| is_loud(f)).unwrap_or(first_loud);

    let start = if first_loud >= min_frames { first_loud } else { 0 };
    let trailing = frames.len() - 1 - last_loud;
    let end = if trailing >= min_frames {
        last_loud + 1
    } else {
        frames.len()
    };

    samples[start * channels..end * channels].to_vec()
}

/// Change the channel count
///
/// Down-mixing to mono averages all channels. Mono to stereo duplicates the
/// signal; wider layouts going to stereo keep their first two channels.
pub fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.chunks_exact(from);
    match to {
        1 => frames
            .map(|frame| frame.iter().sum::<f32>() / from as f32)
            .collect(),
        _ if from == 1 => frames
            .flat_map(|frame| std::iter::repeat(frame[0]).take(to))
            .collect(),
        _ => frames
            .flat_map(|frame| {
                (0..to).map(move |ch| frame.get(ch).copied().unwrap_or(0.0))
            })
            .collect(),
    }
}

/// Resample by linear interpolation between neighbouring frames
pub fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || channels == 0 || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let in_frames = samples.len() / channels;
    if in_frames == 0 {
        return Vec::new();
    }

    let out_frames = (in_frames as u64 * to_rate as u64 / from_rate as u64) as usize;
    let step = from_rate as f64 / to_rate as f64;
    let mut out = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let pos = i as f64 * step;
        let idx = (pos.floor() as usize).min(in_frames - 1);
        let next = (idx + 1).min(in_frames - 1);
        let frac = (pos - idx as f64) as f32;

        for ch in 0..channels {
            let a = samples[idx * channels + ch];
            let b = samples[next * channels + ch];
            out.push(a + (b - a) * frac);
        }
    }

    out
}

/// Apply a single gain so RMS level approaches `target_db`
///
/// The gain is capped so the sample peak never exceeds `peak_ceiling_db`.
/// Silent input is returned unchanged.
pub fn normalize_loudness(samples: &[f32], target_db: f32, peak_ceiling_db: f32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let peak = samples.iter().fold(0f32, |acc, s| acc.max(s.abs()));
    if mean_square <= 0.0 || peak <= 0.0 {
        return samples.to_vec();
    }

    let rms_db = amplitude_to_db(mean_square.sqrt());
    let peak_db = amplitude_to_db(peak);
    let gain_db = (target_db - rms_db).min(peak_ceiling_db - peak_db);
    let gain = db_to_amplitude(gain_db);

    samples.iter().map(|s| s * gain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_removes_long_leading_and_trailing_silence() {
        // 10 Hz sample rate: 0.1 s == 1 frame
        let samples = vec![0.0, 0.0, 0.5, 0.6, 0.0, 0.0, 0.0];
        let trimmed = trim_silence(&samples, 1, 10, -45.0, 0.1);
        assert_eq!(trimmed, vec![0.5, 0.6]);
    }

    #[test]
    fn test_trim_keeps_short_pauses() {
        // 100 Hz: 0.1 s == 10 frames, pauses here are shorter
        let samples = vec![0.0, 0.0, 0.5, 0.0, 0.4, 0.0];
        let trimmed = trim_silence(&samples, 1, 100, -45.0, 0.1);
        assert_eq!(trimmed, samples);
    }

    #[test]
    fn test_trim_all_silent_is_empty() {
        let samples = vec![0.0001; 100];
        assert!(trim_silence(&samples, 1, 100, -45.0, 0.1).is_empty());
    }

    #[test]
    fn test_remix_stereo_to_mono_averages() {
        let mono = remix(&[0.2, 0.4, -0.2, -0.4], 2, 1);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_remix_mono_to_stereo_duplicates() {
        assert_eq!(remix(&[0.1, 0.2], 1, 2), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_resample_halves_frame_count() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample_linear(&samples, 1, 44100, 22050);
        assert_eq!(out.len(), 50);
        assert!((out[1] - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.1, -0.1, 0.2];
        assert_eq!(resample_linear(&samples, 1, 16000, 16000), samples);
    }

    #[test]
    fn test_normalize_respects_peak_ceiling() {
        let samples = vec![0.01, -0.9, 0.01, 0.01];
        let out = normalize_loudness(&samples, -18.0, -1.5);
        let peak = out.iter().fold(0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= db_to_amplitude(-1.5) + 1e-4);
    }

    #[test]
    fn test_normalize_raises_quiet_signal() {
        let samples: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let out = normalize_loudness(&samples, -18.0, -1.5);
        let rms = (out.iter().map(|s| s * s).sum::<f32>() / out.len() as f32).sqrt();
        assert!((20.0 * rms.log10() + 18.0).abs() < 0.1);
    }
}
