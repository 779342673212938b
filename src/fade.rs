use std::time::Duration;

use crate::{
    caption::{CaptionLine, TimeMs},
    error::{WavefadeError, WavefadeResult},
};

/// A caption line with its resolved fade schedule.
///
/// The four timestamps are ordered: `start_fade_in <= end_fade_in <=
/// start_fade_out <= end_fade_out`. The line is fully opaque between
/// `end_fade_in` and `start_fade_out` (the stable view interval).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FadeWindow {
    pub content: String,
    pub start_fade_in: TimeMs,
    pub end_fade_in: TimeMs,
    pub start_fade_out: TimeMs,
    pub end_fade_out: TimeMs,
}

impl FadeWindow {
    pub fn fade_in_ms(&self) -> i64 {
        self.end_fade_in.0 - self.start_fade_in.0
    }

    pub fn stable_ms(&self) -> i64 {
        self.start_fade_out.0 - self.end_fade_in.0
    }

    pub fn fade_out_ms(&self) -> i64 {
        self.end_fade_out.0 - self.start_fade_out.0
    }
}

/// Resolve caption lines into non-conflicting fade windows.
///
/// Each line nominally fades in over `fade_in` ending at its start time and
/// fades out over `fade_out` beginning at its end time. When a line's nominal
/// fade-in would begin at or before the previous window's fade-out end, the
/// shared boundary is re-anchored between the two: the anchor splits the span
/// from the previous fade-out start to the current line start in proportion
/// `fade_out / fade_in`, truncated to whole milliseconds. The previous window
/// then fades out ending exactly at the anchor and the current one fades in
/// from 1ms past it, shrinking both stable intervals instead of overlapping.
///
/// Fails with [`WavefadeError::Conflict`] when two lines sit so close that the
/// previous window's stable interval would go negative, and with
/// [`WavefadeError::Config`] when either fade duration rounds to zero
/// milliseconds.
///
/// Single left-to-right pass; each window depends only on its predecessor, so
/// resolving the same input twice yields identical output.
pub fn resolve_fade_windows(
    lines: &[CaptionLine],
    fade_in: Duration,
    fade_out: Duration,
) -> WavefadeResult<Vec<FadeWindow>> {
    let fin = fade_in.as_millis() as i64;
    let fout = fade_out.as_millis() as i64;
    if fin == 0 || fout == 0 {
        return Err(WavefadeError::config(
            "fade durations must be at least one millisecond",
        ));
    }

    let mut out: Vec<FadeWindow> = Vec::with_capacity(lines.len());
    for line in lines {
        let start_fade_in = line.start.0 - fin;
        let conflicted = out
            .last()
            .is_some_and(|prev| start_fade_in <= prev.end_fade_out.0);
        if conflicted {
            let at = out.len() - 1;
            let ratio = fout as f64 / fin as f64;
            let delta = (line.start.0 - out[at].start_fade_out.0) as f64;
            let anchor = (line.start.0 as f64 - delta / (1.0 + ratio)).floor() as i64;
            if out[at].end_fade_in.0 > anchor - fout {
                return Err(WavefadeError::conflict(format!(
                    "caption at {:.3}s starts too close to its predecessor to fit any fade \
                     schedule",
                    line.start.as_secs_f64()
                )));
            }
            out[at].start_fade_out = TimeMs(anchor - fout);
            out[at].end_fade_out = TimeMs(anchor);
            out.push(FadeWindow {
                content: line.content.clone(),
                start_fade_in: TimeMs(anchor + 1),
                end_fade_in: TimeMs(anchor + fin),
                start_fade_out: line.end,
                end_fade_out: TimeMs(line.end.0 + fout),
            });
        } else {
            out.push(FadeWindow {
                content: line.content.clone(),
                start_fade_in: TimeMs(start_fade_in),
                end_fade_in: line.start,
                start_fade_out: line.end,
                end_fade_out: TimeMs(line.end.0 + fout),
            });
        }
    }
    Ok(out)
}
