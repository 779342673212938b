use std::{
    ffi::OsString,
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::mpsc::{self, SyncSender},
    thread::JoinHandle,
};

use crate::error::{WavefadeError, WavefadeResult};

/// Everything the encoder invocation depends on, validated up front.
///
/// Optional fields map one-to-one onto optional ffmpeg arguments; an absent
/// field removes its flags from the invocation entirely.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EncodeConfig {
    pub out_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub vcodec: Option<String>,
    /// Video bitrate in Kb/s.
    pub bitrate_kbps: Option<u32>,
    pub audio_path: Option<PathBuf>,
    pub acodec: Option<String>,
    pub filter_complex: Option<String>,
}

impl EncodeConfig {
    pub fn new(out_path: impl Into<PathBuf>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            out_path: out_path.into(),
            width,
            height,
            fps,
            vcodec: None,
            bitrate_kbps: None,
            audio_path: None,
            acodec: None,
            filter_complex: None,
        }
    }

    pub fn validate(&self) -> WavefadeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WavefadeError::config("frame width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(WavefadeError::config("fps must be non-zero"));
        }
        if self.bitrate_kbps == Some(0) {
            return Err(WavefadeError::config("bitrate must be positive when set"));
        }
        if self.acodec.is_some() && self.audio_path.is_none() {
            return Err(WavefadeError::config(
                "audio codec is set but no audio file is configured",
            ));
        }
        Ok(())
    }

    /// The full, deterministically ordered ffmpeg argument list.
    ///
    /// Stills arrive as one JPEG per frame on stdin (`image2pipe`/`mjpeg`);
    /// the output side rescales to the configured frame size, so the source
    /// may hand over stills at any resolution.
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for s in ["-y", "-f", "image2pipe", "-vcodec", "mjpeg", "-r"] {
            args.push(s.into());
        }
        args.push(self.fps.to_string().into());
        args.push("-i".into());
        args.push("-".into());
        if let Some(audio) = &self.audio_path {
            args.push("-i".into());
            args.push(audio.into());
        }
        if let Some(vcodec) = &self.vcodec {
            args.push("-vcodec".into());
            args.push(vcodec.into());
        }
        args.push("-r".into());
        args.push(self.fps.to_string().into());
        args.push("-vf".into());
        args.push(format!("scale={}:{}", self.width, self.height).into());
        if let Some(kbps) = self.bitrate_kbps {
            args.push("-b:v".into());
            args.push(format!("{kbps}K").into());
        }
        if let Some(acodec) = &self.acodec {
            args.push("-acodec".into());
            args.push(acodec.into());
        }
        if let Some(filter) = &self.filter_complex {
            args.push("-filter_complex".into());
            args.push(filter.into());
        }
        args.push(self.out_path.clone().into());
        args
    }
}

/// How the encoder process ended. The pipeline itself never judges this;
/// callers decide whether a non-zero exit fails their job.
#[derive(Clone, Debug)]
pub struct EncoderExit {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Ordered consumer of encoded stills. [`FfmpegEncoder`] is the production
/// implementation; tests substitute in-memory sinks.
pub trait EncoderSink {
    /// Append one encoded still to the stream, in order. May block when the
    /// consumer is behind; that blocking is the pipeline's backpressure.
    fn write_still(&mut self, still: Vec<u8>) -> WavefadeResult<()>;

    /// Close the stream, wait for the consumer to drain it, and report how
    /// the consumer ended.
    fn finish(self) -> WavefadeResult<EncoderExit>
    where
        Self: Sized;
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> WavefadeResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// A running ffmpeg process fed through a bounded hand-off.
///
/// Stills go over a depth-1 channel to a dedicated writer thread that owns
/// the child's stdin — the explicit queue between "still ready" and "written
/// to the encoder". When ffmpeg falls behind, `write_still` blocks, and
/// memory stays bounded at one queued still plus the one in flight.
pub struct FfmpegEncoder {
    child: Child,
    tx: Option<SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
}

impl FfmpegEncoder {
    pub fn spawn(cfg: &EncodeConfig) -> WavefadeResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(WavefadeError::process(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        // The system binary, not linked FFmpeg: no native dev headers needed.
        let mut cmd = Command::new("ffmpeg");
        cmd.args(cfg.ffmpeg_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::debug!(out = %cfg.out_path.display(), "spawning ffmpeg");

        let mut child = cmd.spawn().map_err(|e| {
            WavefadeError::process(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| WavefadeError::process("failed to open ffmpeg stdin (unexpected)"))?;

        let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(1);
        let writer = std::thread::Builder::new()
            .name("wavefade-encoder-writer".to_string())
            .spawn(move || -> std::io::Result<()> {
                for still in rx {
                    stdin.write_all(&still)?;
                }
                // Dropping stdin after the flush signals end-of-input.
                stdin.flush()
            })
            .map_err(|e| {
                WavefadeError::process(format!("failed to spawn encoder writer thread: {e}"))
            })?;

        Ok(Self {
            child,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    fn writer_failure(&mut self) -> String {
        match self.writer.take().map(JoinHandle::join) {
            Some(Ok(Err(e))) => e.to_string(),
            Some(Err(_)) => "encoder writer thread panicked".to_string(),
            _ => "encoder input stream closed".to_string(),
        }
    }
}

impl EncoderSink for FfmpegEncoder {
    fn write_still(&mut self, still: Vec<u8>) -> WavefadeResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(WavefadeError::encode("encoder is already finalized"));
        };
        if tx.send(still).is_err() {
            // The writer bailed out; its io error is the interesting one.
            let detail = self.writer_failure();
            return Err(WavefadeError::encode(format!(
                "failed to write still to encoder input: {detail}"
            )));
        }
        Ok(())
    }

    fn finish(mut self) -> WavefadeResult<EncoderExit> {
        drop(self.tx.take());
        let writer_err = match self.writer.take().map(JoinHandle::join) {
            Some(Ok(Err(e))) => Some(e.to_string()),
            Some(Err(_)) => Some("encoder writer thread panicked".to_string()),
            _ => None,
        };

        let output = self.child.wait_with_output().map_err(|e| {
            WavefadeError::process(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if let Some(detail) = writer_err {
            return Err(WavefadeError::encode(format!(
                "encoder input stream failed while draining: {detail}"
            )));
        }

        Ok(EncoderExit {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
