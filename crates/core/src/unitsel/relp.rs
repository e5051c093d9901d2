//! Residual-excited LPC resynthesis.
//!
//! Each selected unit carries a pitch-synchronous LPC track and a
//! residual signal. Resynthesis windows the residual around every pitch
//! mark, concatenates unit tracks with shifted times, overlap-adds the
//! windowed snippets into one excitation buffer, and drives the
//! time-varying synthesis filter with it.

use std::sync::Arc;

use crate::track::Track;
use crate::waveform::Waveform;

use super::{CatalogueUnit, SAMPLERATE};

/// Symmetric Hamming window; a single-point window is 1.
pub fn hamming(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|i| {
                0.54 - 0.46 * (std::f64::consts::TAU * i as f64 / (n - 1) as f64).cos()
            })
            .collect(),
    }
}

/// Window the residual around each pitch mark. The window spans one
/// pitch period centred on the mark (half a period each side); buffer
/// edges are clamped.
pub fn window_residual(lpc: &Track, residual: &[f64]) -> Vec<Vec<f64>> {
    let sr = SAMPLERATE as f64;
    let mut snippets = Vec::with_capacity(lpc.len());
    let mut prevtime = 0.0;
    for i in 0..lpc.len() {
        let time = lpc.times[i];
        let halfperiod = time - prevtime;
        let centersample = (time * sr).round() as i64;
        let firstsample = ((time - halfperiod) * sr).round() as i64;
        let lastsample = centersample + (centersample - firstsample);

        let first = firstsample.max(0);
        let last = lastsample.min(residual.len() as i64 - 1);
        let mut snippet: Vec<f64> = if first <= last {
            residual[first as usize..=last as usize].to_vec()
        } else {
            Vec::new()
        };
        for (value, w) in snippet.iter_mut().zip(hamming_len(last, first)) {
            *value *= w;
        }
        snippets.push(snippet);
        prevtime = time;
    }
    snippets
}

fn hamming_len(last: i64, first: i64) -> Vec<f64> {
    if last < first {
        Vec::new()
    } else {
        hamming((last - first + 1) as usize)
    }
}

/// Concatenate unit LPC tracks (times shifted onto the end of the
/// running track) and collect every unit's windowed residual snippets.
/// The tracks are copied; the shared catalogue is never touched.
pub fn concat_tracks(units: &[Arc<CatalogueUnit>]) -> (Track, Vec<Vec<f64>>) {
    let mut lpc = Track::new();
    let mut snippets = Vec::new();
    for unit in units {
        snippets.extend(window_residual(&unit.lpc, &unit.residual));
        lpc.concat_shifted(&unit.lpc);
    }
    (lpc, snippets)
}

/// Overlap-add the windowed snippets at the sample positions of the
/// concatenated pitch marks.
pub fn overlap_add(lpc: &Track, snippets: &[Vec<f64>]) -> Vec<f64> {
    let sr = SAMPLERATE as f64;
    let last_center = (lpc.end_time() * sr).round() as i64;
    let half_last = snippets.last().map(|s| (s.len() as f64 / 2.0).round() as i64).unwrap_or(0);
    let mut residual = vec![0.0; (last_center + half_last + 1).max(0) as usize];
    for (snippet, &time) in snippets.iter().zip(lpc.times.iter()) {
        let center = (time * sr).round() as i64;
        let first = center - (snippet.len() / 2) as i64;
        for (j, &value) in snippet.iter().enumerate() {
            let index = first + j as i64;
            if index >= 0 && (index as usize) < residual.len() {
                residual[index as usize] += value;
            }
        }
    }
    residual
}

/// The time-varying synthesis filter. Each frame governs the samples
/// from the previous pitch-mark midpoint to the next; within a frame,
/// `s[j] = clip16(sum_{k>=1} a_k * s[j-k]) + residual[j]`, clipped to 16
/// bits. Sample 0 is never used as filter history (`j - k > 0`).
pub fn synth_filter(times: &[f64], frames: &[Vec<f64>], residual: &[f64]) -> Vec<i16> {
    let sr = SAMPLERATE as f64;
    let mut samples = vec![0i16; residual.len()];
    let mut start = 0usize;
    for (i, frame) in frames.iter().enumerate() {
        let end = if i + 1 < times.len() {
            let midpoint = ((times[i] + times[i + 1]) * sr) as i64 / 2;
            (midpoint.max(0) as usize).min(residual.len())
        } else {
            residual.len()
        };
        for j in start..end {
            let mut acc = 0.0;
            for (k, &coef) in frame.iter().enumerate().skip(1) {
                if j > k {
                    acc += coef * samples[j - k] as f64;
                }
            }
            let predicted = acc.clamp(i16::MIN as f64, i16::MAX as f64).trunc();
            let excited = (predicted + residual[j]).clamp(i16::MIN as f64, i16::MAX as f64);
            samples[j] = excited as i16;
        }
        start = end;
    }
    samples
}

/// Full resynthesis of a selected unit sequence at 16 kHz / 16-bit.
pub fn synthesize(units: &[Arc<CatalogueUnit>]) -> Waveform {
    let (lpc, snippets) = concat_tracks(units);
    let residual = overlap_add(&lpc, &snippets);
    let samples = synth_filter(&lpc.times, &lpc.frames, &residual);
    Waveform::new(SAMPLERATE, samples)
}
