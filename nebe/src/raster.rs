//! [`Rasterizer`] backed by GraphicsMagick (`gm`), which needs Ghostscript
//! (`gs`) to read PDFs.

use async_trait::async_trait;
use nebe_core::contract::{BoxError, Rasterizer};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("{tool} is not installed, {hint}")]
    Missing { tool: &'static str, hint: &'static str },
    #[error("gm convert failed for {pdf} ({status}): {stderr}")]
    Convert {
        pdf: String,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GmRasterizer;

impl GmRasterizer {
    /// Fails when `gm` or `gs` is not on `PATH`.
    pub fn detect() -> Result<Self, RasterError> {
        if which::which("gm").is_err() {
            return Err(RasterError::Missing {
                tool: "GraphicsMagick",
                hint: "install it (e.g. `brew install graphicsmagick`) and try again",
            });
        }
        if which::which("gs").is_err() {
            return Err(RasterError::Missing {
                tool: "Ghostscript",
                hint: "install it (e.g. `brew install ghostscript`) and try again",
            });
        }
        Ok(Self)
    }
}

#[async_trait]
impl Rasterizer for GmRasterizer {
    async fn rasterize(
        &self,
        pdf: &Path,
        output: &Path,
        density: u32,
        width: u32,
        height: u32,
    ) -> Result<(), BoxError> {
        // First page only.
        let input = format!("{}[0]", pdf.display());
        let output_arg = output.to_string_lossy().into_owned();
        let resize = format!("{width}x{height}!");
        let density = density.to_string();

        tracing::debug!(pdf = %pdf.display(), %resize, "Rasterizing pdf");
        let result = Command::new("gm")
            .args([
                "convert",
                "-density",
                density.as_str(),
                "-resize",
                resize.as_str(),
                input.as_str(),
                "-quality",
                "100",
                output_arg.as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await?;

        if !result.status.success() {
            return Err(Box::new(RasterError::Convert {
                pdf: pdf.display().to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            }));
        }
        Ok(())
    }
}
