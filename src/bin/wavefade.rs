use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use wavefade::{CaptionLine, LineSchedule, lrc_to_srt, parse_lrc, parse_srt, resolve_fade_windows};

#[derive(Parser, Debug)]
#[command(name = "wavefade", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve caption fade windows and print them as JSON.
    Windows(WindowsArgs),
    /// Convert an .lrc lyric file to SRT text.
    Srt(SrtArgs),
}

#[derive(Parser, Debug)]
struct WindowsArgs {
    /// Input caption file (.srt, or .lrc by extension).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Fade-in duration in seconds.
    #[arg(long, default_value_t = 0.5)]
    fade_in: f64,

    /// Fade-out duration in seconds.
    #[arg(long, default_value_t = 0.5)]
    fade_out: f64,

    /// How long the last .lrc line stays on screen, in seconds.
    #[arg(long, default_value_t = 5.0)]
    last_line_hold: f64,

    /// Also project the windows onto this frame rate and print per-line
    /// frame schedules instead of raw windows.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Parser, Debug)]
struct SrtArgs {
    /// Input .lrc lyric file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// How long the last line stays on screen, in seconds.
    #[arg(long, default_value_t = 5.0)]
    last_line_hold: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Windows(args) => cmd_windows(args),
        Command::Srt(args) => cmd_srt(args),
    }
}

fn read_captions(path: &Path, last_line_hold: f64) -> anyhow::Result<Vec<CaptionLine>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read caption file '{}'", path.display()))?;
    let lines = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("lrc")) {
        parse_lrc(&text, Duration::from_secs_f64(last_line_hold))?
    } else {
        parse_srt(&text)?
    };
    Ok(lines)
}

fn cmd_windows(args: WindowsArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fade_in > 0.0 && args.fade_out > 0.0,
        "fade durations must be positive"
    );
    anyhow::ensure!(args.last_line_hold >= 0.0, "last-line-hold must be >= 0");
    let lines = read_captions(&args.in_path, args.last_line_hold)?;
    let windows = resolve_fade_windows(
        &lines,
        Duration::from_secs_f64(args.fade_in),
        Duration::from_secs_f64(args.fade_out),
    )?;

    let stdout = std::io::stdout().lock();
    match args.fps {
        Some(fps) => {
            let schedules: Vec<LineSchedule> =
                windows.iter().map(|w| LineSchedule::project(w, fps)).collect();
            serde_json::to_writer_pretty(stdout, &schedules)?;
        }
        None => serde_json::to_writer_pretty(stdout, &windows)?,
    }
    println!();
    Ok(())
}

fn cmd_srt(args: SrtArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.last_line_hold >= 0.0, "last-line-hold must be >= 0");
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read lyric file '{}'", args.in_path.display()))?;
    let srt = lrc_to_srt(&text, Duration::from_secs_f64(args.last_line_hold))?;
    print!("{srt}");
    Ok(())
}
