use crate::fade::FadeWindow;

/// Where inside its fade window a line is on a given frame.
///
/// `progress` runs linearly over the ramp: 0.0 on the ramp's first frame,
/// approaching 1.0 on its last.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FadePhase {
    FadeIn { progress: f32 },
    Stable,
    FadeOut { progress: f32 },
}

impl FadePhase {
    /// Text opacity for this phase, ramped the way the original effect did:
    /// `floor(progress * max + 0.5)` on the way up and its mirror on the way
    /// down, so a full ramp ends exactly at `max` / at zero.
    pub fn alpha(self, max: u8) -> u8 {
        let scaled = |p: f32| (p * f32::from(max) + 0.5).floor() as u8;
        match self {
            Self::FadeIn { progress } => scaled(progress),
            Self::Stable => max,
            Self::FadeOut { progress } => max - scaled(progress),
        }
    }
}

/// A fade window projected onto the frame grid of a fixed-fps video.
///
/// `start_frame` may be negative: a caption that starts within `fade_in` of
/// t=0 begins its ramp before the first frame exists, and simply joins
/// mid-ramp at frame 0.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LineSchedule {
    pub content: String,
    pub start_frame: i64,
    pub fade_in_frames: u32,
    pub stable_frames: u32,
    pub fade_out_frames: u32,
}

impl LineSchedule {
    /// Project `window` onto the frame grid at `fps`.
    ///
    /// Ramp and stable lengths round half-up (`floor(fps * secs + 0.5)`);
    /// the start frame truncates toward zero, matching the scheduling the
    /// compositor expects.
    pub fn project(window: &FadeWindow, fps: u32) -> Self {
        let frames = |ms: i64| (f64::from(fps) * ms as f64 / 1000.0 + 0.5).floor() as u32;
        Self {
            content: window.content.clone(),
            start_frame: (f64::from(fps) * window.start_fade_in.as_secs_f64()).trunc() as i64,
            fade_in_frames: frames(window.fade_in_ms()),
            stable_frames: frames(window.stable_ms()),
            fade_out_frames: frames(window.fade_out_ms()),
        }
    }

    pub fn total_frames(&self) -> u64 {
        u64::from(self.fade_in_frames) + u64::from(self.stable_frames)
            + u64::from(self.fade_out_frames)
    }

    /// First frame past the end of the fade-out ramp.
    pub fn end_frame(&self) -> i64 {
        self.start_frame + self.total_frames() as i64
    }

    /// Phase on `frame`, or `None` when the line is off screen.
    pub fn phase_at(&self, frame: i64) -> Option<FadePhase> {
        let local = frame - self.start_frame;
        if local < 0 || local >= self.total_frames() as i64 {
            return None;
        }
        let local = local as u64;
        let t1 = u64::from(self.fade_in_frames);
        let t2 = t1 + u64::from(self.stable_frames);
        if local < t1 {
            Some(FadePhase::FadeIn {
                progress: local as f32 / self.fade_in_frames as f32,
            })
        } else if local < t2 {
            Some(FadePhase::Stable)
        } else {
            Some(FadePhase::FadeOut {
                progress: (local - t2) as f32 / self.fade_out_frames as f32,
            })
        }
    }
}

/// Monotone lookup over one caption track's schedules.
///
/// Frame queries must not go backwards; expired lines are skipped once and
/// never revisited, so a whole render is O(frames + lines).
#[derive(Clone, Debug)]
pub struct TrackCursor {
    lines: Vec<LineSchedule>,
    at: usize,
}

impl TrackCursor {
    pub fn new(lines: Vec<LineSchedule>) -> Self {
        Self { lines, at: 0 }
    }

    /// Project resolved `windows` at `fps` and wrap them in a cursor.
    pub fn project(windows: &[FadeWindow], fps: u32) -> Self {
        Self::new(windows.iter().map(|w| LineSchedule::project(w, fps)).collect())
    }

    /// The line visible on `frame`, with its phase, if any.
    pub fn active(&mut self, frame: i64) -> Option<(&LineSchedule, FadePhase)> {
        while self.at < self.lines.len() && frame >= self.lines[self.at].end_frame() {
            self.at += 1;
        }
        let line = self.lines.get(self.at)?;
        let phase = line.phase_at(frame)?;
        Some((line, phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::TimeMs;

    fn window(content: &str, sfi: i64, efi: i64, sfo: i64, efo: i64) -> FadeWindow {
        FadeWindow {
            content: content.to_string(),
            start_fade_in: TimeMs(sfi),
            end_fade_in: TimeMs(efi),
            start_fade_out: TimeMs(sfo),
            end_fade_out: TimeMs(efo),
        }
    }

    #[test]
    fn projection_rounds_ramps_half_up() {
        // 0.5s ramps at 60fps are exactly 30 frames; the 1.9s stable span
        // rounds from 114.0.
        let s = LineSchedule::project(&window("a", 9_500, 10_000, 11_900, 12_400), 60);
        assert_eq!(s.start_frame, 570);
        assert_eq!(s.fade_in_frames, 30);
        assert_eq!(s.stable_frames, 114);
        assert_eq!(s.fade_out_frames, 30);
        assert_eq!(s.end_frame(), 744);
    }

    #[test]
    fn negative_start_truncates_toward_zero() {
        let s = LineSchedule::project(&window("a", -300, 200, 1_000, 1_500), 60);
        // -0.3s * 60 = -18.0 exactly.
        assert_eq!(s.start_frame, -18);
        assert!(s.phase_at(0).is_some());
    }

    #[test]
    fn phase_boundaries_land_on_ramp_edges() {
        let s = LineSchedule::project(&window("a", 0, 500, 1_500, 2_000), 10);
        // 5 fade-in frames, 10 stable, 5 fade-out.
        assert_eq!(s.phase_at(-1), None);
        assert_eq!(s.phase_at(0), Some(FadePhase::FadeIn { progress: 0.0 }));
        assert_eq!(s.phase_at(4), Some(FadePhase::FadeIn { progress: 0.8 }));
        assert_eq!(s.phase_at(5), Some(FadePhase::Stable));
        assert_eq!(s.phase_at(14), Some(FadePhase::Stable));
        assert_eq!(s.phase_at(15), Some(FadePhase::FadeOut { progress: 0.0 }));
        assert_eq!(s.phase_at(19), Some(FadePhase::FadeOut { progress: 0.8 }));
        assert_eq!(s.phase_at(20), None);
    }

    #[test]
    fn alpha_ramp_hits_endpoints() {
        assert_eq!(FadePhase::FadeIn { progress: 0.0 }.alpha(255), 0);
        assert_eq!(FadePhase::FadeIn { progress: 0.5 }.alpha(255), 128);
        assert_eq!(FadePhase::Stable.alpha(255), 255);
        assert_eq!(FadePhase::FadeOut { progress: 0.0 }.alpha(255), 255);
        assert_eq!(FadePhase::FadeOut { progress: 1.0 }.alpha(255), 0);
    }

    #[test]
    fn cursor_walks_lines_in_order_and_skips_expired() {
        let mut cursor = TrackCursor::project(
            &[
                window("a", 0, 500, 1_500, 2_000),
                window("b", 3_000, 3_500, 4_500, 5_000),
            ],
            10,
        );
        assert_eq!(cursor.active(0).unwrap().0.content, "a");
        assert_eq!(cursor.active(10).unwrap().0.content, "a");
        // Gap between the lines: nothing visible, cursor does not advance past b.
        assert!(cursor.active(25).is_none());
        assert_eq!(cursor.active(30).unwrap().0.content, "b");
        assert!(cursor.active(50).is_none());
    }
}
