//! Time-stamped frame tracks: pitch-synchronous LPC coefficient frames
//! and generated F0 contours.

use serde::{Deserialize, Serialize};

/// A sequence of frames, each a vector of channel values at a time stamp
/// (seconds). Times are non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub times: Vec<f64>,
    pub frames: Vec<Vec<f64>>,
}

impl Track {
    pub fn new() -> Self {
        Track::default()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn num_channels(&self) -> usize {
        self.frames.first().map(Vec::len).unwrap_or(0)
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Append another track with its times shifted to start at this
    /// track's end time.
    pub fn concat_shifted(&mut self, other: &Track) {
        let offset = self.end_time();
        self.times.extend(other.times.iter().map(|t| t + offset));
        self.frames.extend(other.frames.iter().cloned());
    }

    /// Index of the frame whose time is nearest to `time`.
    pub fn index_at(&self, time: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, t) in self.times.iter().enumerate() {
            let dist = (t - time).abs();
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        Some(best)
    }

    /// An evenly spaced single-channel track (used for generated F0).
    pub fn evenly_spaced(values: Vec<f64>, step: f64) -> Self {
        let times = (0..values.len()).map(|i| i as f64 * step).collect();
        let frames = values.into_iter().map(|v| vec![v]).collect();
        Track { times, frames }
    }
}
