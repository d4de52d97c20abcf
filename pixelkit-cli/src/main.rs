use anyhow::{bail, ensure, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use pixelkit::{target_colors_from_reduction, Interpolation};
use std::path::PathBuf;
use tracing::info;

mod batch;

use batch::{collect_inputs, run_batch, write_report, Operation, ResizeTarget};

#[derive(Parser, Debug)]
#[command(name = "pixelkit-cli")]
#[command(about = "Batch color quantization (median cut) and resizing for image files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce every image to a median-cut palette
    Quantize {
        /// Palette size (2-256)
        #[arg(long, conflicts_with = "reduce")]
        colors: Option<u32>,

        /// Reduce colors by this percentage of 256 (0-99)
        #[arg(long)]
        reduce: Option<f64>,

        /// Diffuse quantization error (Floyd-Steinberg)
        #[arg(long)]
        dither: bool,

        #[command(flatten)]
        io: IoArgs,
    },
    /// Resample every image to a new size
    Resize {
        #[arg(long, conflicts_with = "percent")]
        width: Option<u32>,

        #[arg(long, conflicts_with = "percent")]
        height: Option<u32>,

        /// Derive the missing side from the source aspect ratio
        #[arg(long)]
        keep_aspect: bool,

        /// Scale both sides by this percentage
        #[arg(long)]
        percent: Option<f64>,

        /// nearest, bilinear or bicubic
        #[arg(long, default_value = "bilinear")]
        method: Interpolation,

        #[command(flatten)]
        io: IoArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct IoArgs {
    /// Image files or directories of images
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Write a JSON summary of the batch
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn resize_target(
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect: bool,
    percent: Option<f64>,
) -> Result<ResizeTarget> {
    if let Some(percent) = percent {
        ensure!(percent.is_finite() && percent > 0.0, "--percent must be positive, got {}", percent);
        return Ok(ResizeTarget::Percent(percent));
    }

    let target = match (width, height, keep_aspect) {
        (Some(width), _, true) => ResizeTarget::Width(width),
        (None, Some(height), true) => ResizeTarget::Height(height),
        (Some(width), Some(height), false) => ResizeTarget::Exact { width, height },
        (None, None, _) => bail!("resize needs --percent, or --width and/or --height"),
        _ => bail!("give both --width and --height, or add --keep-aspect"),
    };

    match target {
        ResizeTarget::Width(0) | ResizeTarget::Height(0) => bail!("target size must be positive"),
        ResizeTarget::Exact { width, height } if width == 0 || height == 0 => {
            bail!("target size must be positive, got {}x{}", width, height)
        }
        _ => Ok(target),
    }
}

fn quantize_colors(colors: Option<u32>, reduce: Option<f64>) -> Result<u32> {
    let colors = match (colors, reduce) {
        (Some(colors), _) => colors,
        (None, Some(percent)) => target_colors_from_reduction(percent)?,
        (None, None) => bail!("quantize needs --colors or --reduce"),
    };
    pixelkit::validate_target_colors(colors)?;
    Ok(colors)
}

fn main() -> Result<()> {
    pixelkit::init_tracing();
    let args = Args::parse();

    let (operation, io) = match args.command {
        Command::Quantize { colors, reduce, dither, io } => {
            let colors = quantize_colors(colors, reduce)?;
            info!("Quantize: {} colors, dither={}", colors, dither);
            (Operation::Quantize { colors, dither }, io)
        }
        Command::Resize { width, height, keep_aspect, percent, method, io } => {
            let target = resize_target(width, height, keep_aspect, percent)?;
            info!("Resize: {:?} with {}", target, method);
            (Operation::Resize { target, method }, io)
        }
    };

    let files = collect_inputs(&io.inputs)?;
    ensure!(!files.is_empty(), "no image files found in {:?}", io.inputs);
    info!("Processing {} images into {:?}", files.len(), io.out);

    let report = run_batch(&files, &io.out, &operation)?;
    info!("Done: {} processed, {} failed", report.processed, report.failed);

    if let Some(path) = &io.report {
        write_report(&report, path)?;
        info!("Report written to {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_colors_from_flags() {
        assert_eq!(quantize_colors(Some(16), None).unwrap(), 16);
        assert_eq!(quantize_colors(None, Some(50.0)).unwrap(), 128);
        assert!(quantize_colors(Some(1), None).is_err());
        assert!(quantize_colors(Some(300), None).is_err());
        assert!(quantize_colors(None, Some(100.0)).is_err());
        assert!(quantize_colors(None, None).is_err());
    }

    #[test]
    fn test_resize_target_from_flags() {
        assert_eq!(
            resize_target(Some(10), Some(20), false, None).unwrap(),
            ResizeTarget::Exact { width: 10, height: 20 }
        );
        assert_eq!(resize_target(Some(10), Some(20), true, None).unwrap(), ResizeTarget::Width(10));
        assert_eq!(resize_target(None, Some(20), true, None).unwrap(), ResizeTarget::Height(20));
        assert_eq!(resize_target(None, None, false, Some(50.0)).unwrap(), ResizeTarget::Percent(50.0));

        assert!(resize_target(Some(10), None, false, None).is_err());
        assert!(resize_target(None, None, false, None).is_err());
        assert!(resize_target(Some(0), Some(5), false, None).is_err());
        assert!(resize_target(None, None, false, Some(-5.0)).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "pixelkit-cli", "resize", "--width", "64", "--keep-aspect", "--method", "bicubic",
            "--out", "out", "in.png",
        ])
        .unwrap();
        match args.command {
            Command::Resize { width, method, keep_aspect, io, .. } => {
                assert_eq!(width, Some(64));
                assert!(keep_aspect);
                assert_eq!(method, Interpolation::Bicubic);
                assert_eq!(io.inputs, vec![PathBuf::from("in.png")]);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from([
            "pixelkit-cli", "resize", "--percent", "50", "--method", "lanczos", "--out", "o", "a.png",
        ])
        .is_err());
        assert!(Args::try_parse_from([
            "pixelkit-cli", "quantize", "--colors", "8", "--reduce", "10", "--out", "o", "a.png",
        ])
        .is_err());
    }
}
