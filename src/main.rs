use gpx_geotag::{args::ProgramArgs, config::load_offset_config, features::{run, LogProgress, Outcome, RunOptions}, offset::{AutoReviewer, ConfiguredReviewer, InteractiveReviewer, OffsetReviewer}, track::Track, GeotagError};

use std::{io, process::ExitCode};
use clap::Parser;

fn geotag(args: &ProgramArgs) -> Result<Outcome, GeotagError> {
    let track = Track::load(&args.track)?;

    let mut reviewer: Box<dyn OffsetReviewer> = if let Some(path) = &args.offsets {
        Box::new(ConfiguredReviewer::new(load_offset_config(path)?))
    } else if args.auto_offset {
        Box::new(AutoReviewer)
    } else {
        Box::new(InteractiveReviewer::new(io::stdin().lock(), io::stdout()))
    };

    let options = RunOptions { dry_run: args.dry_run };

    run(&args.input, &track, reviewer.as_mut(), &mut LogProgress, options)
}

fn main() -> ExitCode {
    let args = ProgramArgs::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if !args.input.is_dir() {
        eprintln!("Error: the input path must be a folder, not a file.");
        return ExitCode::FAILURE;
    }

    match geotag(&args) {
        Ok(Outcome::NothingToDo) => {
            println!("No images without GPS data found.");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Aborted { camera }) => {
            println!("Offset for {} was not confirmed, nothing was written.", camera);
            ExitCode::FAILURE
        }
        Ok(Outcome::Cancelled(tally)) => {
            println!("Cancelled. Tagged: {}, failed: {}", tally.success, tally.failed);
            ExitCode::FAILURE
        }
        Ok(Outcome::Completed(tally)) => {
            if args.dry_run {
                println!("Dry run. Would tag: {}, failed: {}", tally.success, tally.failed);
            } else {
                println!("Tagged: {}, failed: {}", tally.success, tally.failed);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
