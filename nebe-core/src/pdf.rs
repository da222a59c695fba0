//! `convert-pdf`: first page of each print PDF of a visual to a JPEG next
//! to it.
//!
//! PDFs live in size folders named after their physical size, e.g.
//! `210x297mm/poster.pdf` or `100x50mm-bleed/flyer.pdf`.

use crate::contract::Rasterizer;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DPI: u32 = 300;
const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PdfNameError {
    #[error("`{0}` is not inside a `{{width}}x{{height}}mm` folder")]
    Folder(String),
    #[error("`{0}` is not a pdf file")]
    File(String),
}

/// Physical size and output location parsed from a PDF path.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTarget {
    pub pdf: PathBuf,
    pub width_mm: f64,
    pub height_mm: f64,
    /// File name without `.pdf`.
    pub name: String,
}

impl PdfTarget {
    /// Parses `{...}/{w}x{h}mm{variant}/{name}.pdf`.
    pub fn parse(pdf: &Path) -> Result<Self, PdfNameError> {
        let display = pdf.to_string_lossy().into_owned();

        let name = match (pdf.file_stem(), pdf.extension()) {
            (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case("pdf") => {
                stem.to_string_lossy().into_owned()
            }
            _ => return Err(PdfNameError::File(display)),
        };

        let folder = pdf
            .parent()
            .and_then(Path::file_name)
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| PdfNameError::Folder(display.clone()))?;

        let (size, _variant) = folder
            .split_once("mm")
            .ok_or_else(|| PdfNameError::Folder(display.clone()))?;
        let (width, height) = size
            .split_once('x')
            .ok_or_else(|| PdfNameError::Folder(display.clone()))?;
        let parse = |v: &str| -> Result<f64, PdfNameError> {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| *v > 0.0)
                .ok_or_else(|| PdfNameError::Folder(display.clone()))
        };

        Ok(Self {
            pdf: pdf.to_path_buf(),
            width_mm: parse(width)?,
            height_mm: parse(height)?,
            name,
        })
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (to_pixels(self.width_mm), to_pixels(self.height_mm))
    }

    pub fn output(&self) -> PathBuf {
        self.pdf.with_file_name(format!("{}.jpg", self.name))
    }
}

pub fn to_pixels(mm: f64) -> u32 {
    (mm * DPI as f64 / MM_PER_INCH).round() as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub pdf: PathBuf,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

/// Converts every PDF concurrently; failures are isolated per file.
pub async fn convert_all<R>(pdfs: &[PathBuf], rasterizer: &R) -> Vec<Conversion>
where
    R: Rasterizer + ?Sized,
{
    info!(count = pdfs.len(), "Converting pdfs");

    let tasks = pdfs.iter().map(|pdf| async move {
        let target = match PdfTarget::parse(pdf) {
            Ok(target) => target,
            Err(e) => {
                warn!(pdf = %pdf.display(), error = %e, "Skipping pdf");
                return Conversion {
                    pdf: pdf.clone(),
                    output: None,
                    error: Some(e.to_string()),
                };
            }
        };

        let (width, height) = target.pixel_size();
        let output = target.output();
        debug!(pdf = %pdf.display(), width, height, "Rasterizing");

        match rasterizer
            .rasterize(pdf, &output, DPI, width, height)
            .await
        {
            Ok(()) => Conversion {
                pdf: pdf.clone(),
                output: Some(output),
                error: None,
            },
            Err(e) => {
                warn!(pdf = %pdf.display(), error = %e, "Conversion failed");
                Conversion {
                    pdf: pdf.clone(),
                    output: None,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_at_300_dpi() {
        assert_eq!(to_pixels(210.0), 2480);
        assert_eq!(to_pixels(297.0), 3508);
    }
}
