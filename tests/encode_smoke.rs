use std::path::PathBuf;

use image::{Rgb, RgbImage};

use wavefade::{
    EncodeConfig, FinishCause, FrameIndex, PipelineEvent, WavefadeResult, conduct,
    is_ffmpeg_on_path,
};

#[test]
fn conduct_streams_stills_into_real_ffmpeg() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not found on PATH");
        return;
    }

    let dir = PathBuf::from("target").join("encode_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("out.mp4");
    let _ = std::fs::remove_file(&out_path);

    let cfg = EncodeConfig::new(&out_path, 64, 64, 30);

    let mut source = |index: FrameIndex| -> WavefadeResult<Option<RgbImage>> {
        if index.0 < 6 {
            let shade = (index.0 * 40) as u8;
            Ok(Some(RgbImage::from_pixel(64, 64, Rgb([shade, 64, 128]))))
        } else {
            Ok(None)
        }
    };

    let mut pairs = 0u64;
    let mut finishes = Vec::new();
    let summary = conduct(&cfg, None, &mut source, &mut |event| match event {
        PipelineEvent::AfterWrite { .. } => pairs += 1,
        PipelineEvent::Finished { cause, .. } => finishes.push(cause),
        _ => {}
    })
    .unwrap();

    assert_eq!(pairs, 6);
    assert_eq!(
        finishes,
        vec![Some(FinishCause::GeneratorExhausted), None]
    );
    assert_eq!(summary.frames_written, 6);

    let exit = summary.exit.expect("teardown collected the encoder exit");
    assert!(exit.success, "ffmpeg failed: {}", exit.stderr);
    assert!(out_path.metadata().unwrap().len() > 0);
}

#[test]
fn frame_limit_caps_a_real_encode() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not found on PATH");
        return;
    }

    let dir = PathBuf::from("target").join("encode_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("capped.mp4");
    let _ = std::fs::remove_file(&out_path);

    let cfg = EncodeConfig::new(&out_path, 64, 64, 30);
    let mut source = |_: FrameIndex| -> WavefadeResult<Option<RgbImage>> {
        Ok(Some(RgbImage::from_pixel(64, 64, Rgb([10, 200, 10]))))
    };

    let summary = conduct(&cfg, Some(4), &mut source, &mut |_| {}).unwrap();
    assert_eq!(summary.frames_written, 4);
    assert!(summary.exit.unwrap().success);
    assert!(out_path.exists());
}
