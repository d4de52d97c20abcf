use anyhow::{anyhow, Context, Result};
use pixelkit::{
    build_and_apply_palette, height_for_width, resample, scaled_dimensions, width_for_height,
    Interpolation, PixelBuffer, PixelError,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, read_dir};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// How the resize output size is chosen per image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeTarget {
    Exact { width: u32, height: u32 },
    /// Fixed width, height follows the source aspect ratio
    Width(u32),
    /// Fixed height, width follows the source aspect ratio
    Height(u32),
    Percent(f64),
}

impl ResizeTarget {
    pub fn dimensions_for(&self, src_width: u32, src_height: u32) -> Result<(u32, u32), PixelError> {
        match *self {
            ResizeTarget::Exact { width, height } => Ok((width, height)),
            ResizeTarget::Width(width) => Ok((width, height_for_width(width, src_width, src_height)?)),
            ResizeTarget::Height(height) => Ok((width_for_height(height, src_width, src_height)?, height)),
            ResizeTarget::Percent(percent) => scaled_dimensions(src_width, src_height, percent),
        }
    }
}

/// One pipeline applied to every image in a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Quantize { colors: u32, dither: bool },
    Resize { target: ResizeTarget, method: Interpolation },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Quantize { .. } => "quantize",
            Operation::Resize { .. } => "resize",
        }
    }

    /// Suffix that replaces the input extension in the output file name
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Operation::Quantize { .. } => "_quantized.png",
            Operation::Resize { .. } => "_resized.png",
        }
    }

    pub fn apply(&self, image: &PixelBuffer) -> Result<PixelBuffer, PixelError> {
        match *self {
            Operation::Quantize { colors, dither } => build_and_apply_palette(image, colors, dither),
            Operation::Resize { target, method } => {
                let (width, height) = target.dimensions_for(image.width(), image.height())?;
                resample(image, width, height, method)
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub name: String,
    pub source_bytes: u64,
    pub output: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub operation: &'static str,
    pub processed: usize,
    pub failed: usize,
    pub images: Vec<ImageReport>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Expand directories (sorted by path) and drop anything that is not an image file.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = read_dir(input)
                .with_context(|| format!("Failed to read directory {:?}", input))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_image(path))
                .collect();
            entries.sort();
            info!("Folder {:?}: {} image files", input, entries.len());
            files.extend(entries);
        } else if is_image(input) {
            files.push(input.clone());
        } else {
            warn!("Skipping non-image input {:?}", input);
        }
    }

    Ok(files)
}

pub fn output_path(input: &Path, out_dir: &Path, operation: &Operation) -> PathBuf {
    out_dir.join(format!("{}{}", file_stem(input), operation.output_suffix()))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Like [`output_path`], but never one of `taken`.
///
/// Inputs sharing a stem (`photo.png`, `photo.bmp`) get `photo_1`, `photo_2`, ...
/// in batch order.
fn unique_output_path(
    input: &Path,
    out_dir: &Path,
    operation: &Operation,
    taken: &HashSet<PathBuf>,
) -> PathBuf {
    let candidate = output_path(input, out_dir, operation);
    if !taken.contains(&candidate) {
        return candidate;
    }

    let stem = file_stem(input);
    (1..)
        .map(|n| out_dir.join(format!("{}_{}{}", stem, n, operation.output_suffix())))
        .find(|path| !taken.contains(path))
        .unwrap_or(candidate)
}

fn load_rgba(path: &Path) -> Result<PixelBuffer> {
    let rgba = image::open(path)
        .with_context(|| format!("Failed to decode {:?}", path))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PixelBuffer::new(width, height, rgba.into_raw())?)
}

fn save_png(buffer: PixelBuffer, path: &Path) -> Result<()> {
    let (width, height) = buffer.dimensions();
    let rgba = image::RgbaImage::from_raw(width, height, buffer.into_bytes())
        .ok_or_else(|| anyhow!("Pixel buffer does not fit {}x{}", width, height))?;
    rgba.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn process_one(input: &Path, output: &Path, operation: &Operation) -> Result<(u32, u32)> {
    let source = load_rgba(input)?;
    let result = operation.apply(&source)?;
    let (width, height) = result.dimensions();

    save_png(result, output)?;
    Ok((width, height))
}

/// Run `operation` over every file in turn.
///
/// A file that fails to decode, process or save is logged and recorded in
/// the report; the rest of the batch still runs. No two images in a batch
/// are written to the same path.
pub fn run_batch(files: &[PathBuf], out_dir: &Path, operation: &Operation) -> Result<BatchReport> {
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut images = Vec::with_capacity(files.len());
    let mut written: HashSet<PathBuf> = HashSet::new();
    let mut failed = 0;

    for (i, input) in files.iter().enumerate() {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing {}/{}: {}", i + 1, files.len(), name);

        let source_bytes = fs::metadata(input).map(|m| m.len()).unwrap_or(0);

        let output = unique_output_path(input, out_dir, operation, &written);
        let report = match process_one(input, &output, operation) {
            Ok((width, height)) => {
                info!("Wrote {:?} ({}x{})", output, width, height);
                written.insert(output.clone());
                ImageReport {
                    name,
                    source_bytes,
                    output: Some(output),
                    width: Some(width),
                    height: Some(height),
                    error: None,
                }
            }
            Err(err) => {
                error!("Error processing {}: {:#}", name, err);
                failed += 1;
                ImageReport {
                    name,
                    source_bytes,
                    output: None,
                    width: None,
                    height: None,
                    error: Some(format!("{:#}", err)),
                }
            }
        };
        images.push(report);
    }

    Ok(BatchReport {
        operation: operation.name(),
        processed: images.len() - failed,
        failed,
        images,
    })
}

pub fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
