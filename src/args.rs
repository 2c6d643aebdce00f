use clap::Parser;
use std::path::PathBuf;

/// This program writes GPS positions from a GPX track into
/// the EXIF data of the JPEG images taken along it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ProgramArgs {
    /// The folder containing the images
    #[arg(short, long)]
    pub input: PathBuf,

    /// The GPX track file
    #[arg(short, long)]
    pub track: PathBuf,

    /// JSON file with per-camera clock offsets, instead of asking
    #[arg(short, long, conflicts_with = "auto_offset")]
    pub offsets: Option<PathBuf>,

    /// Guess whole-hour clock offsets from the track, instead of asking
    #[arg(long)]
    pub auto_offset: bool,

    /// Match images without writing to them
    #[arg(long)]
    pub dry_run: bool,

    /// Use verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
