use std::time::Duration;

use crate::error::{WavefadeError, WavefadeResult};

/// Millisecond timestamp, relative to the start of the track.
///
/// Signed because fade scheduling may place a fade-in start before t=0
/// (a caption that begins within `fade_in` of the first sample).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1000.0).round() as i64)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

/// One caption line: what to show, and when it is nominally on screen.
///
/// The pair `(start, end)` is the stable interval from the source subtitle
/// file; fade ramps around it are derived later by the resolver.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptionLine {
    pub content: String,
    pub start: TimeMs,
    pub end: TimeMs,
}

/// Parse SRT text into caption lines.
///
/// Accepts the usual block shape: an optional numeric counter, a
/// `HH:MM:SS,mmm --> HH:MM:SS,mmm` time line, then text lines until a blank
/// line. Blocks are returned in file order; no reordering is applied.
pub fn parse_srt(input: &str) -> WavefadeResult<Vec<CaptionLine>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut cur: Vec<&str> = Vec::new();
    for raw in input.lines() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !cur.is_empty() {
                blocks.push(std::mem::take(&mut cur));
            }
        } else {
            cur.push(line);
        }
    }
    if !cur.is_empty() {
        blocks.push(cur);
    }

    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut at = 0usize;
        if !block[at].contains("-->") && block[at].trim().chars().all(|c| c.is_ascii_digit()) {
            at += 1;
        }
        let time_line = block
            .get(at)
            .filter(|l| l.contains("-->"))
            .ok_or_else(|| WavefadeError::caption("subtitle block is missing its time line"))?;
        let (start_s, end_s) = time_line
            .split_once("-->")
            .ok_or_else(|| WavefadeError::caption("subtitle time line is missing '-->'"))?;
        out.push(CaptionLine {
            content: block[at + 1..].join("\n"),
            start: parse_srt_timestamp(start_s)?,
            end: parse_srt_timestamp(end_s)?,
        });
    }
    Ok(out)
}

/// Parse LRC lyric text into caption lines.
///
/// Each lyric line carries one or more `[mm:ss.xx]` tags; a tagged line ends
/// where the next one begins, and the final line holds for `last_line_hold`.
/// Metadata tags (`[ar:..]`, `[ti:..]`, ...) are skipped. Output is sorted by
/// start time, which also normalizes multi-tag lines.
pub fn parse_lrc(input: &str, last_line_hold: Duration) -> WavefadeResult<Vec<CaptionLine>> {
    let mut timed: Vec<(TimeMs, String)> = Vec::new();
    for raw in input.lines() {
        let mut rest = raw.trim();
        if rest.is_empty() {
            continue;
        }
        let mut stamps = Vec::new();
        while let Some(tail) = rest.strip_prefix('[') {
            let Some(close) = tail.find(']') else {
                return Err(WavefadeError::caption(format!(
                    "unterminated tag in lrc line '{raw}'"
                )));
            };
            if let Some(t) = parse_lrc_tag(&tail[..close]) {
                stamps.push(t);
            }
            rest = tail[close + 1..].trim_start();
        }
        if stamps.is_empty() {
            continue;
        }
        let text = rest.to_string();
        for t in stamps {
            timed.push((t, text.clone()));
        }
    }
    timed.sort_by_key(|(t, _)| *t);

    let hold_ms = last_line_hold.as_millis() as i64;
    let ends: Vec<TimeMs> = (0..timed.len())
        .map(|i| match timed.get(i + 1) {
            Some((next_start, _)) => *next_start,
            None => TimeMs(timed[i].0.0 + hold_ms),
        })
        .collect();
    Ok(timed
        .into_iter()
        .zip(ends)
        .map(|((start, content), end)| CaptionLine {
            content,
            start,
            end,
        })
        .collect())
}

/// Render caption lines back out as SRT text.
pub fn to_srt(lines: &[CaptionLine]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(line.start),
            format_srt_timestamp(line.end),
            line.content
        ));
    }
    out
}

/// Convenience: `.lrc` text straight to SRT text.
pub fn lrc_to_srt(input: &str, last_line_hold: Duration) -> WavefadeResult<String> {
    Ok(to_srt(&parse_lrc(input, last_line_hold)?))
}

fn parse_srt_timestamp(s: &str) -> WavefadeResult<TimeMs> {
    let s = s.trim();
    let bad = || WavefadeError::caption(format!("invalid srt timestamp '{s}'"));

    let (hms, millis) = s.split_once([',', '.']).ok_or_else(bad)?;
    let mut parts = hms.split(':');
    let (Some(h), Some(m), Some(sec), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };
    if millis.len() != 3 {
        return Err(bad());
    }
    let h: i64 = h.trim().parse().map_err(|_| bad())?;
    let m: i64 = m.parse().map_err(|_| bad())?;
    let sec: i64 = sec.parse().map_err(|_| bad())?;
    let millis: i64 = millis.parse().map_err(|_| bad())?;
    Ok(TimeMs(((h * 60 + m) * 60 + sec) * 1000 + millis))
}

fn format_srt_timestamp(t: TimeMs) -> String {
    let total = t.0.max(0);
    let millis = total % 1000;
    let secs = (total / 1000) % 60;
    let mins = (total / 60_000) % 60;
    let hours = total / 3_600_000;
    format!("{hours:02}:{mins:02}:{secs:02},{millis:03}")
}

fn parse_lrc_tag(tag: &str) -> Option<TimeMs> {
    let (mins, rest) = tag.split_once(':')?;
    if mins.is_empty() || !mins.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (secs, frac) = match rest.split_once('.') {
        Some((s, f)) => (s, Some(f)),
        None => (rest, None),
    };
    if secs.len() != 2 || !secs.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut ms = mins.parse::<i64>().ok()? * 60_000 + secs.parse::<i64>().ok()? * 1000;
    if let Some(frac) = frac {
        if frac.is_empty() || frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let scale = 10i64.pow(3 - frac.len() as u32);
        ms += frac.parse::<i64>().ok()? * scale;
    }
    Some(TimeMs(ms))
}
