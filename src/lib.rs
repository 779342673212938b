//! Wavefade turns an audio waveform plus timed caption lines into a video,
//! streaming frames into the system `ffmpeg` binary.
//!
//! # Pipeline overview
//!
//! 1. **Parse**: caption text (`.srt`/`.lrc`) -> [`CaptionLine`]s
//! 2. **Resolve**: caption lines -> non-conflicting [`FadeWindow`]s
//! 3. **Schedule**: fade windows -> per-frame [`FadePhase`] lookups at a fixed fps
//! 4. **Conduct**: a pull-based [`FrameSource`] -> JPEG stills on ffmpeg's stdin,
//!    with lifecycle [`PipelineEvent`]s pushed to a synchronous observer
//!
//! Compositing is deliberately not here: the frame source owns pixels, this
//! crate owns timing, ordering, the encoder process and backpressure.
#![forbid(unsafe_code)]

pub mod caption;
pub mod conduct;
pub mod encode_ffmpeg;
pub mod error;
pub mod fade;
pub mod schedule;
pub mod wave;

pub use caption::{CaptionLine, TimeMs, lrc_to_srt, parse_lrc, parse_srt, to_srt};
pub use conduct::{
    ConductSummary, FinishCause, FrameIndex, FrameSource, Observer, PipelineEvent, conduct,
    run_pipeline,
};
pub use encode_ffmpeg::{
    EncodeConfig, EncoderExit, EncoderSink, FfmpegEncoder, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use error::{WavefadeError, WavefadeResult};
pub use fade::{FadeWindow, resolve_fade_windows};
pub use schedule::{FadePhase, LineSchedule, TrackCursor};
pub use wave::{SampleBuffer, WaveTimeline, drain_frames, frame_count};
