//! `build` and `convert-pdf`.

use crate::context::Context;
use crate::output::Table;
use crate::raster::GmRasterizer;
use anyhow::{bail, Result};
use colored::Colorize;
use nebe_core::build::{self, BrowserslistUpdate, DIST_BUILD};
use nebe_core::pdf;
use nebe_core::visual;

pub fn build(ctx: &Context) -> Result<()> {
    let root = ctx.root()?;
    match build::ensure_browserslist(&root)? {
        BrowserslistUpdate::Unchanged => {}
        BrowserslistUpdate::Updated => println!("{}", "Updated browserslist in package.json".yellow()),
        BrowserslistUpdate::Created => println!("{}", "Created package.json with browserslist".yellow()),
    }

    let brand = visual::select_brand(&root, &ctx.prompter())?;
    let report = build::build_brand(&root, &brand)?;

    println!("Copied {} configs", report.configs);
    println!("Copied {} include folders", report.includes);
    println!("Bundled {} visual sizes", report.sizes.len());

    let total = report.sizes.len();
    for (i, size) in report.sizes.iter().enumerate() {
        match &size.error {
            None => println!("{}/{} Bundled {}", i + 1, total, size.folder),
            Some(error) => {
                println!("{}", format!("{}/{} Error {}: {}", i + 1, total, size.folder, error).red())
            }
        }
        if size.error.is_none() && !size.has_click_tag {
            println!("{}", format!("{} does not have clickTag", size.folder).yellow());
        }
    }

    let failed = report.sizes.iter().filter(|s| s.error.is_some()).count();
    if failed > 0 {
        bail!("{failed} of {total} sizes failed to build");
    }
    println!(
        "{}",
        format!("Build written to {}", root.join(DIST_BUILD).display()).green()
    );
    Ok(())
}

pub async fn convert_pdf(ctx: &Context) -> Result<()> {
    let rasterizer = GmRasterizer::detect()?;
    if ctx.debug {
        for tool in ["gm", "gs"] {
            if let Ok(path) = which::which(tool) {
                println!("{}", format!("Using binary for {tool}: {}", path.display()).blue());
            }
        }
    }

    let root = ctx.root()?;
    let id = visual::select_visual(&root, &ctx.prompter())?;
    let pdfs = visual::pdfs(&id.dir(&root));
    println!("{}", format!("Converting {} pdfs", pdfs.len()).blue());
    if pdfs.is_empty() {
        return Ok(());
    }

    let spinner = ctx.spinner("Converting");
    let conversions = pdf::convert_all(&pdfs, &rasterizer).await;
    let failed = conversions.iter().filter(|c| c.error.is_some()).count();
    spinner.finish(
        failed == 0,
        format!("Converted {} of {} pdfs", conversions.len() - failed, conversions.len()),
    );

    let mut table = Table::new(["Pdf", "Result"]);
    for conversion in &conversions {
        let pdf = conversion.pdf.display().to_string();
        let result = match (&conversion.output, &conversion.error) {
            (_, Some(error)) => error.red().to_string(),
            (Some(output), None) => output.display().to_string().green().to_string(),
            (None, None) => String::new(),
        };
        table.push([pdf, result]);
    }
    println!("{}", table.render());

    if failed > 0 {
        bail!("{failed} of {} conversions failed", conversions.len());
    }
    Ok(())
}
