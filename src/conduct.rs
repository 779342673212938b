use std::{io::Cursor, time::SystemTime};

use image::{ImageFormat, RgbImage};

use crate::{
    encode_ffmpeg::{EncodeConfig, EncoderExit, EncoderSink, FfmpegEncoder},
    error::{WavefadeError, WavefadeResult},
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Pull-based producer of finished frames.
///
/// The pipeline calls `next_frame` with strictly increasing indices starting
/// at 0, never re-queries an index and never calls concurrently. `Ok(None)`
/// signals the end of generation. Returned images are consumed once and
/// never touched again, so implementations reusing internal draw buffers
/// must hand out a fresh copy per call.
pub trait FrameSource {
    fn next_frame(&mut self, index: FrameIndex) -> WavefadeResult<Option<RgbImage>>;
}

impl<F> FrameSource for F
where
    F: FnMut(FrameIndex) -> WavefadeResult<Option<RgbImage>>,
{
    fn next_frame(&mut self, index: FrameIndex) -> WavefadeResult<Option<RgbImage>> {
        self(index)
    }
}

/// Why frame generation stopped ahead of teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FinishCause {
    ReachedFrameLimit,
    GeneratorExhausted,
}

/// One lifecycle moment of a pipeline run, pushed to the observer in order.
///
/// `Finished` fires twice on a clean run: once when generation stops (with
/// its cause) and once, without a cause, after the encoder has drained and
/// exited. Frame payloads are borrowed; observers wanting to keep one must
/// copy it out.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    BeforeWrite {
        at: SystemTime,
        index: FrameIndex,
        frame: &'a RgbImage,
    },
    AfterWrite {
        at: SystemTime,
        index: FrameIndex,
        frame: &'a RgbImage,
    },
    Finished {
        at: SystemTime,
        index: FrameIndex,
        cause: Option<FinishCause>,
        frame: Option<&'a RgbImage>,
    },
    Error {
        at: SystemTime,
        index: FrameIndex,
        frame: Option<&'a RgbImage>,
        error: &'a WavefadeError,
    },
}

/// Observer callback. Invoked synchronously, in order, never concurrently.
pub type Observer<'a> = &'a mut dyn FnMut(PipelineEvent<'_>);

/// What a finished run looked like. `exit` is `None` when teardown could not
/// collect the encoder's status; the conductor itself never inspects it.
#[derive(Clone, Debug)]
pub struct ConductSummary {
    pub frames_written: u64,
    pub exit: Option<EncoderExit>,
}

/// Stream frames from `source` into an ffmpeg process built from `cfg`.
///
/// Configuration problems and a failed encoder launch surface as `Err`
/// before any frame is produced. Once streaming starts, failures are
/// reported through a single `Error` event instead, followed by the
/// unconditional teardown and terminal `Finished` event.
///
/// `frame_limit` caps how many frames are pulled; `None` streams until the
/// source is exhausted.
#[tracing::instrument(skip(source, observer), fields(out = %cfg.out_path.display()))]
pub fn conduct(
    cfg: &EncodeConfig,
    frame_limit: Option<u64>,
    source: &mut dyn FrameSource,
    observer: Observer<'_>,
) -> WavefadeResult<ConductSummary> {
    let sink = FfmpegEncoder::spawn(cfg)?;
    Ok(run_pipeline(sink, frame_limit, source, observer))
}

/// The sink-generic pipeline driver behind [`conduct`].
///
/// Exactly one teardown happens on every exit path: the sink is finished
/// (closing the encoder's input and waiting for it), then the terminal
/// `Finished` event fires. Teardown failures are reported as a best-effort
/// `Error` event and never propagate.
pub fn run_pipeline<K: EncoderSink>(
    mut sink: K,
    frame_limit: Option<u64>,
    source: &mut dyn FrameSource,
    observer: Observer<'_>,
) -> ConductSummary {
    let mut index = 0u64;
    let mut frames_written = 0u64;
    let mut last_frame: Option<RgbImage> = None;

    loop {
        if let Some(limit) = frame_limit
            && index >= limit
        {
            observer(PipelineEvent::Finished {
                at: SystemTime::now(),
                index: FrameIndex(index),
                cause: Some(FinishCause::ReachedFrameLimit),
                frame: None,
            });
            break;
        }

        match source.next_frame(FrameIndex(index)) {
            Ok(Some(frame)) => {
                observer(PipelineEvent::BeforeWrite {
                    at: SystemTime::now(),
                    index: FrameIndex(index),
                    frame: &frame,
                });
                let written = encode_still(&frame).and_then(|still| sink.write_still(still));
                match written {
                    Ok(()) => {
                        observer(PipelineEvent::AfterWrite {
                            at: SystemTime::now(),
                            index: FrameIndex(index),
                            frame: &frame,
                        });
                        last_frame = Some(frame);
                        frames_written += 1;
                        index += 1;
                    }
                    Err(error) => {
                        observer(PipelineEvent::Error {
                            at: SystemTime::now(),
                            index: FrameIndex(index),
                            frame: Some(&frame),
                            error: &error,
                        });
                        last_frame = Some(frame);
                        break;
                    }
                }
            }
            Ok(None) => {
                observer(PipelineEvent::Finished {
                    at: SystemTime::now(),
                    index: FrameIndex(index),
                    cause: Some(FinishCause::GeneratorExhausted),
                    frame: None,
                });
                break;
            }
            Err(error) => {
                observer(PipelineEvent::Error {
                    at: SystemTime::now(),
                    index: FrameIndex(index),
                    frame: last_frame.as_ref(),
                    error: &error,
                });
                break;
            }
        }
    }

    let exit = match sink.finish() {
        Ok(exit) => Some(exit),
        Err(error) => {
            tracing::warn!(%error, "encoder teardown failed");
            observer(PipelineEvent::Error {
                at: SystemTime::now(),
                index: FrameIndex(index),
                frame: last_frame.as_ref(),
                error: &error,
            });
            None
        }
    };

    observer(PipelineEvent::Finished {
        at: SystemTime::now(),
        index: FrameIndex(index),
        cause: None,
        frame: last_frame.as_ref(),
    });

    ConductSummary {
        frames_written,
        exit,
    }
}

/// One frame as one self-contained JPEG still, the unit the encoder's
/// `image2pipe` input consumes.
fn encode_still(frame: &RgbImage) -> WavefadeResult<Vec<u8>> {
    let mut buf = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| WavefadeError::encode(format!("failed to encode frame as jpeg: {e}")))?;
    Ok(buf)
}
