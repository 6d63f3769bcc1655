//! Capture encoding and atomic file output.
//!
//! Encodes tightly-packed RGBA pixels into a standard container. The image
//! is written to a temporary sibling file and renamed over the destination,
//! so a failing run never leaves a partially-written output visible.

use std::path::{Path, PathBuf};

use crate::device::Gpu;
use crate::error::{Error, Result};
use crate::target::RenderTarget;

/// Supported output containers. PNG is lossless and the default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ContainerFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl ContainerFormat {
    pub fn label(self) -> &'static str {
        match self {
            ContainerFormat::Png => "png",
            ContainerFormat::Jpeg => "jpeg",
            ContainerFormat::Bmp => "bmp",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            ContainerFormat::Png => image::ImageFormat::Png,
            ContainerFormat::Jpeg => image::ImageFormat::Jpeg,
            ContainerFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Reads the rendered target back and serializes it to `path`.
///
/// The caller must have flushed the draw work already; this performs the
/// final resolve-and-save step of the pipeline.
pub fn export_target(
    gpu: &Gpu,
    target: &RenderTarget,
    format: ContainerFormat,
    path: &Path,
) -> Result<()> {
    let pixels = target
        .read_back(gpu.device(), gpu.queue())
        .map_err(|err| Error::ExportFailed {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        })?;

    export_rgba(&pixels, target.width(), target.height(), format, path)
}

/// Encodes tightly-packed RGBA bytes and writes them atomically to `path`.
pub fn export_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: ContainerFormat,
    path: &Path,
) -> Result<()> {
    let fail = |reason: String| Error::ExportFailed {
        path: path.to_path_buf(),
        reason,
    };

    let rgba = image::RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| fail(format!("pixel buffer does not match {width}x{height}")))?;

    let tmp = temp_sibling(path);
    let written = match format {
        // JPEG carries no alpha channel; drop it rather than fail.
        ContainerFormat::Jpeg => image::DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .save_with_format(&tmp, format.image_format()),
        ContainerFormat::Png | ContainerFormat::Bmp => {
            rgba.save_with_format(&tmp, format.image_format())
        }
    };

    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(fail(err.to_string()));
    }

    std::fs::rename(&tmp, path).map_err(|err| {
        let _ = std::fs::remove_file(&tmp);
        fail(format!("renaming temporary file: {err}"))
    })?;

    log::info!("wrote {} ({}x{}, {})", path.display(), width, height, format.label());
    Ok(())
}

/// Temporary path in the same directory as `path`, so the final rename
/// never crosses a filesystem boundary.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    PathBuf::from(name)
}
