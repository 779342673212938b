use crate::error::{WavefadeError, WavefadeResult};

/// Already-decoded PCM samples, peak-normalized to `[-1, 1]`.
///
/// Decoding stays outside this crate; callers hand in interleaved samples
/// from whatever reader they use. An all-silent buffer normalizes to zeros.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    channels: u16,
    samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn from_interleaved_i16(raw: &[i16], channels: u16) -> WavefadeResult<Self> {
        if channels == 0 {
            return Err(WavefadeError::config("sample buffer needs >= 1 channel"));
        }
        if raw.len() % channels as usize != 0 {
            return Err(WavefadeError::config(
                "interleaved sample count must be a multiple of the channel count",
            ));
        }
        // abs() via i32: i16::MIN has no i16 absolute value.
        let peak = raw.iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0);
        let scale = if peak == 0 { 0.0 } else { 1.0 / peak as f32 };
        Ok(Self {
            channels,
            samples: raw.iter().map(|s| f32::from(*s) * scale).collect(),
        })
    }

    /// Number of per-channel sample frames.
    pub fn sample_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// `(left, right)` magnitudes at sample frame `pos`, in `[0, 1]`.
    ///
    /// Mono buffers duplicate their single channel; positions past the end
    /// read as silence, which is what the tail of a scrolled-out waveform
    /// should draw.
    pub fn magnitudes_at(&self, pos: usize) -> (f32, f32) {
        if pos >= self.sample_frames() {
            return (0.0, 0.0);
        }
        let base = pos * self.channels as usize;
        let left = self.samples[base].abs();
        let right = if self.channels > 1 {
            self.samples[base + 1].abs()
        } else {
            left
        };
        (left, right)
    }
}

/// Maps video frames onto sample positions for a scrolling waveform.
///
/// Each frame advances the wave strip by `speed` pixel columns; each column
/// represents `floor(sample_rate / fps / speed)` sample frames.
#[derive(Clone, Copy, Debug)]
pub struct WaveTimeline {
    samples_per_column: usize,
    speed: u32,
}

impl WaveTimeline {
    pub fn new(sample_rate: u32, fps: u32, speed: u32) -> WavefadeResult<Self> {
        if sample_rate == 0 || fps == 0 || speed == 0 {
            return Err(WavefadeError::config(
                "wave timeline needs non-zero sample rate, fps and speed",
            ));
        }
        let samples_per_column =
            (f64::from(sample_rate) / f64::from(fps) / f64::from(speed)).floor() as usize;
        if samples_per_column == 0 {
            return Err(WavefadeError::config(
                "speed * fps exceeds the audio sample rate; nothing to draw per column",
            ));
        }
        Ok(Self {
            samples_per_column,
            speed,
        })
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn samples_per_column(&self) -> usize {
        self.samples_per_column
    }

    /// The `speed` fresh column magnitudes revealed on frame `n`.
    pub fn columns(&self, buf: &SampleBuffer, frame: u64) -> Vec<(f32, f32)> {
        (0..self.speed)
            .map(|i| {
                let pos = (frame as usize * self.speed as usize + i as usize)
                    * self.samples_per_column;
                buf.magnitudes_at(pos)
            })
            .collect()
    }
}

/// Video length in frames for `sample_frames` of audio: `ceil(n / rate * fps)`.
pub fn frame_count(sample_frames: usize, sample_rate: u32, fps: u32) -> u64 {
    (sample_frames as f64 / f64::from(sample_rate) * f64::from(fps)).ceil() as u64
}

/// Frames needed for a fully drawn wave strip to scroll off screen.
pub fn drain_frames(strip_width_px: u32, speed: u32) -> u64 {
    u64::from(strip_width_px.div_ceil(speed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_scales_to_the_loudest_sample() {
        let buf = SampleBuffer::from_interleaved_i16(&[100, -200, 50, 400], 2).unwrap();
        assert_eq!(buf.sample_frames(), 2);
        assert_eq!(buf.magnitudes_at(0), (0.25, 0.5));
        assert_eq!(buf.magnitudes_at(1), (0.125, 1.0));
    }

    #[test]
    fn silent_buffer_normalizes_to_zeros() {
        let buf = SampleBuffer::from_interleaved_i16(&[0, 0, 0, 0], 2).unwrap();
        assert_eq!(buf.magnitudes_at(0), (0.0, 0.0));
    }

    #[test]
    fn mono_duplicates_and_past_end_is_silent() {
        let buf = SampleBuffer::from_interleaved_i16(&[-300, 150], 1).unwrap();
        assert_eq!(buf.magnitudes_at(0), (1.0, 1.0));
        assert_eq!(buf.magnitudes_at(1), (0.5, 0.5));
        assert_eq!(buf.magnitudes_at(2), (0.0, 0.0));
    }

    #[test]
    fn ragged_interleaving_is_rejected() {
        assert!(SampleBuffer::from_interleaved_i16(&[1, 2, 3], 2).is_err());
        assert!(SampleBuffer::from_interleaved_i16(&[1, 2], 0).is_err());
    }

    #[test]
    fn timeline_column_positions_step_by_floor_ratio() {
        // 48000 / 60 / 5 = 160 samples per column.
        let tl = WaveTimeline::new(48_000, 60, 5).unwrap();
        assert_eq!(tl.samples_per_column(), 160);

        let raw: Vec<i16> = (0..48_000).map(|i| (i % 1000) as i16).collect();
        let buf = SampleBuffer::from_interleaved_i16(&raw, 1).unwrap();
        let cols = tl.columns(&buf, 2);
        assert_eq!(cols.len(), 5);
        // Frame 2 starts at column 10 -> sample position 1600.
        assert_eq!(cols[0], buf.magnitudes_at(1_600));
        assert_eq!(cols[4], buf.magnitudes_at(2_240));
    }

    #[test]
    fn timeline_rejects_degenerate_ratios() {
        assert!(WaveTimeline::new(0, 60, 5).is_err());
        // 8000 samples/s cannot feed 60fps * 200px columns.
        assert!(WaveTimeline::new(8_000, 60, 200).is_err());
    }

    #[test]
    fn frame_count_rounds_up() {
        assert_eq!(frame_count(48_000, 48_000, 60), 60);
        assert_eq!(frame_count(48_001, 48_000, 60), 61);
        assert_eq!(frame_count(0, 48_000, 60), 0);
    }

    #[test]
    fn drain_frames_covers_the_last_partial_step() {
        assert_eq!(drain_frames(1_600, 5), 320);
        assert_eq!(drain_frames(1_601, 5), 321);
    }
}
