//! Mel-frequency cepstral analysis
//!
//! **Algorithm:**
//! 1. Centered STFT frames (reflect padding of `N_FFT / 2` both ends), periodic Hann window
//! 2. Power spectrum per frame, projected onto triangular HTK mel filters (0 Hz to Nyquist)
//! 3. Power → dB (`10·log10(max(x, 1e-10))`), floored at 80 dB below the global peak
//! 4. Orthonormal DCT-II of the dB mel bands, first `N_MFCC` coefficients
//! 5. Mean of every coefficient across frames
//!
//! Frames are computed in parallel, but the per-frame results are collected in
//! frame order and reduced sequentially, so output is bit-identical across runs.

use anyhow::{bail, Result};
use rayon::prelude::*;
use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use std::f64::consts::PI;
use std::sync::Arc;

pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = 512;
pub const N_MELS: usize = 128;
pub const N_MFCC: usize = 40;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// One triangular mel filter, stored from its first non-zero FFT bin
struct MelFilter {
    start_bin: usize,
    weights: Vec<f32>,
}

/// Fixed-parameter MFCC transform for one sample rate
pub struct MfccTransform {
    window: Vec<f32>,
    filters: Vec<MelFilter>,
    /// Row-major `N_MELS × N_MFCC`
    dct: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
}

impl MfccTransform {
    pub fn new(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            bail!("sample rate must be non-zero");
        }

        let mut planner = RealFftPlanner::<f32>::new();
        Ok(Self {
            window: hann_window(N_FFT),
            filters: build_mel_filters(N_MELS, N_FFT, sample_rate),
            dct: build_dct(N_MFCC, N_MELS),
            fft: planner.plan_fft_forward(N_FFT),
        })
    }

    /// Number of STFT frames for a signal of `len` samples
    pub fn frame_count(len: usize) -> usize {
        1 + len / HOP_LENGTH
    }

    /// Time-averaged MFCC vector (`N_MFCC` values)
    pub fn mean_coefficients(&self, samples: &[f32]) -> Result<Vec<f32>> {
        if samples.is_empty() {
            bail!("cannot analyze an empty signal");
        }

        let mut mel_db = self.mel_power_frames(samples)?;
        power_to_db(&mut mel_db);

        let mut sums = vec![0.0f64; N_MFCC];
        for frame in &mel_db {
            for (coef, sum) in sums.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (mel, value) in frame.iter().enumerate() {
                    acc += value * self.dct[mel * N_MFCC + coef];
                }
                *sum += f64::from(acc);
            }
        }

        let frames = mel_db.len() as f64;
        Ok(sums.into_iter().map(|s| (s / frames) as f32).collect())
    }

    /// Mel-band power for every frame, in frame order
    fn mel_power_frames(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>> {
        let frame_count = Self::frame_count(samples.len());

        (0..frame_count)
            .into_par_iter()
            .map_init(
                || (self.fft.make_input_vec(), self.fft.make_output_vec()),
                |(input, spectrum), frame| self.frame_mel_power(samples, frame, input, spectrum),
            )
            .collect()
    }

    fn frame_mel_power(
        &self,
        samples: &[f32],
        frame: usize,
        input: &mut [f32],
        spectrum: &mut [Complex32],
    ) -> Result<Vec<f32>> {
        let origin = (frame * HOP_LENGTH) as isize - (N_FFT / 2) as isize;
        for (i, slot) in input.iter_mut().enumerate() {
            let idx = reflect_index(origin + i as isize, samples.len());
            *slot = samples[idx] * self.window[i];
        }

        self.fft
            .process(input, spectrum)
            .map_err(|e| anyhow::anyhow!("FFT failed on frame {}: {}", frame, e))?;

        Ok(self
            .filters
            .iter()
            .map(|filter| {
                filter
                    .weights
                    .iter()
                    .zip(&spectrum[filter.start_bin..])
                    .map(|(w, bin)| w * bin.norm_sqr())
                    .sum::<f32>()
            })
            .collect())
    }
}

/// Index into a signal of `len` samples under reflect padding (edge not repeated)
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let m = i.rem_euclid(period);
    if m >= len {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Convert power to dB in place, floored at `TOP_DB` below the global maximum
fn power_to_db(frames: &mut [Vec<f32>]) {
    let mut max_db = f32::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *value = 10.0 * value.max(AMIN).log10();
        max_db = max_db.max(*value);
    }

    let floor = max_db - TOP_DB;
    for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *value = value.max(floor);
    }
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / size as f64;
            (0.5 - 0.5 * angle.cos()) as f32
        })
        .collect()
}

fn build_mel_filters(mel_bins: usize, fft_size: usize, sample_rate: u32) -> Vec<MelFilter> {
    let freq_bins = fft_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let bin_freqs: Vec<f64> = (0..freq_bins)
        .map(|k| nyquist * k as f64 / (freq_bins - 1) as f64)
        .collect();

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(nyquist);
    let hz_points: Vec<f64> = (0..mel_bins + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (mel_bins + 1) as f64))
        .collect();

    (0..mel_bins)
        .map(|m| {
            let (lower, center, upper) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
            let dense: Vec<f32> = bin_freqs
                .iter()
                .map(|&f| {
                    let down = (f - lower) / (center - lower);
                    let up = (upper - f) / (upper - center);
                    down.min(up).max(0.0) as f32
                })
                .collect();

            match dense.iter().position(|&w| w > 0.0) {
                Some(start) => {
                    let end = dense.iter().rposition(|&w| w > 0.0).unwrap_or(start);
                    MelFilter {
                        start_bin: start,
                        weights: dense[start..=end].to_vec(),
                    }
                }
                // Narrow low-frequency filters can fall between FFT bins
                None => MelFilter {
                    start_bin: 0,
                    weights: Vec::new(),
                },
            }
        })
        .collect()
}

/// Orthonormal DCT-II basis, row-major `n_mels × n_mfcc`
fn build_dct(n_mfcc: usize, n_mels: usize) -> Vec<f32> {
    let n = n_mels as f64;
    let mut dct = vec![0.0f32; n_mels * n_mfcc];
    for mel in 0..n_mels {
        for coef in 0..n_mfcc {
            let mut value = (PI / n * (mel as f64 + 0.5) * coef as f64).cos() * (2.0 / n).sqrt();
            if coef == 0 {
                value *= std::f64::consts::FRAC_1_SQRT_2;
            }
            dct[mel * n_mfcc + coef] = value as f32;
        }
    }
    dct
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_reflect_index_mirrors_without_repeating_edge() {
        // [a b c d] padded by 2: c b | a b c d | c b
        assert_eq!(reflect_index(-2, 4), 2);
        assert_eq!(reflect_index(-1, 4), 1);
        assert_eq!(reflect_index(0, 4), 0);
        assert_eq!(reflect_index(3, 4), 3);
        assert_eq!(reflect_index(4, 4), 2);
        assert_eq!(reflect_index(5, 4), 1);
        assert_eq!(reflect_index(7, 1), 0);
    }

    #[test]
    fn test_frame_count_is_centered() {
        assert_eq!(MfccTransform::frame_count(1000), 2);
        assert_eq!(MfccTransform::frame_count(44100), 87);
    }

    #[test]
    fn test_mel_filters_are_triangles_within_bounds() {
        let filters = build_mel_filters(N_MELS, N_FFT, 44100);
        assert_eq!(filters.len(), N_MELS);
        for filter in &filters {
            assert!(filter.start_bin + filter.weights.len() <= N_FFT / 2 + 1);
            assert!(filter.weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
        // Upper filters are wide enough to always cover bins
        assert!(!filters[N_MELS - 1].weights.is_empty());
    }

    #[test]
    fn test_dct_is_orthonormal_on_columns() {
        let dct = build_dct(N_MFCC, N_MELS);
        for a in 0..N_MFCC {
            for b in 0..N_MFCC {
                let dot: f64 = (0..N_MELS)
                    .map(|m| f64::from(dct[m * N_MFCC + a]) * f64::from(dct[m * N_MFCC + b]))
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-4, "dct[{a}]·dct[{b}] = {dot}");
            }
        }
    }

    #[test]
    fn test_power_to_db_applies_top_db_floor() {
        let mut frames = vec![vec![1.0, 1e-12, 1e-3], vec![0.0, 10.0, 1e-9]];
        power_to_db(&mut frames);

        // Peak is 10 dB; floor is -70 dB
        assert!((frames[1][1] - 10.0).abs() < 1e-5);
        assert!((frames[0][0] - 0.0).abs() < 1e-5);
        assert!((frames[0][2] + 30.0).abs() < 1e-4);
        for floored in [frames[0][1], frames[1][0], frames[1][2]] {
            assert!((floored + 70.0).abs() < 1e-4, "expected -70 dB floor, got {floored}");
        }
    }

    #[test]
    fn test_mean_coefficients_shape_and_determinism() {
        let transform = MfccTransform::new(22050).unwrap();
        let signal = tone(440.0, 22050, 22050);

        let first = transform.mean_coefficients(&signal).unwrap();
        let second = transform.mean_coefficients(&signal).unwrap();

        assert_eq!(first.len(), N_MFCC);
        assert!(first.iter().all(|v| v.is_finite()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_tones_give_different_coefficients() {
        let transform = MfccTransform::new(22050).unwrap();
        let low = transform.mean_coefficients(&tone(220.0, 22050, 22050)).unwrap();
        let high = transform.mean_coefficients(&tone(3520.0, 22050, 22050)).unwrap();
        assert_ne!(low, high);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(MfccTransform::new(0).is_err());
    }

    #[test]
    fn test_empty_signal_rejected() {
        let transform = MfccTransform::new(16000).unwrap();
        assert!(transform.mean_coefficients(&[]).is_err());
    }
}
