//! Page input discovery: count pages and read per-page metadata.
//!
//! The rasteriser leaves one set of files per page under a fixed naming
//! scheme (`page-{i}.rgb` + `.width` + `.height`, or a pre-rendered
//! `page-{i}.png`). Everything read here is untrusted, so dimensions are
//! range-checked and the pixel buffer length must match them exactly
//! before any tool sees the data.

use crate::config::{PageInputMode, WorkLayout};
use crate::error::Pixels2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest accepted page count.
pub const MAX_PAGES: usize = 10_000;
/// Largest accepted page width in pixels.
pub const MAX_PAGE_WIDTH: u32 = 10_000;
/// Largest accepted page height in pixels.
pub const MAX_PAGE_HEIGHT: u32 = 10_000;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

static PAGE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-(\d+)\.([a-z]+)$").expect("valid page-file regex"));

/// Where a page's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Raw 8-bit RGB buffer with declared dimensions.
    Pixels {
        rgb: PathBuf,
        width: u32,
        height: u32,
    },
    /// Already a PNG; the pixels → PNG step is skipped.
    Rendered { png: PathBuf },
}

/// Inputs of one page, ready for conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAssets {
    /// 1-indexed ordinal.
    pub page: usize,
    pub source: PageSource,
    /// Size of the input file in MiB, used to size deadlines.
    pub size_mb: f64,
}

/// Count pages by the marker files present for `mode`.
///
/// Only names matching `page-{digits}.{ext}` count, so stray files in the
/// directory are ignored.
pub async fn count_pages(layout: &WorkLayout, mode: PageInputMode) -> Result<usize, Pixels2PdfError> {
    let dir = layout.page_input_dir(mode);
    let ext = mode.marker_extension();

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Pixels2PdfError::InvalidMetadata {
            path: dir.to_path_buf(),
            detail: format!("cannot list page inputs: {}", e),
        })?;

    let mut count = 0usize;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Pixels2PdfError::InvalidMetadata {
            path: dir.to_path_buf(),
            detail: e.to_string(),
        })?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(caps) = PAGE_FILE.captures(name) {
            if &caps[2] == ext {
                count += 1;
            }
        }
    }

    debug!("Found {} page inputs (*.{}) in {}", count, ext, dir.display());
    if count == 0 {
        return Err(Pixels2PdfError::NoPages {
            dir: dir.to_path_buf(),
        });
    }
    validate_page_count(count)
}

/// Check a page count, counted or configured, against [`MAX_PAGES`].
pub fn validate_page_count(count: usize) -> Result<usize, Pixels2PdfError> {
    if count > MAX_PAGES {
        return Err(Pixels2PdfError::TooManyPages {
            count,
            max: MAX_PAGES,
        });
    }
    Ok(count)
}

/// Read and validate the inputs of `page`.
pub async fn read_page(
    layout: &WorkLayout,
    mode: PageInputMode,
    page: usize,
) -> Result<PageAssets, Pixels2PdfError> {
    match mode {
        PageInputMode::Pixels => {
            let rgb = layout.rgb(page);
            let width = read_dimension(&layout.width(page)).await?;
            let height = read_dimension(&layout.height(page)).await?;
            validate_dimensions(page, width, height)?;

            let len = file_len(&rgb).await?;
            let expected = u64::from(width) * u64::from(height) * 3;
            if len != expected {
                return Err(Pixels2PdfError::PixelDataMismatch {
                    page,
                    expected,
                    actual: len,
                });
            }

            Ok(PageAssets {
                page,
                source: PageSource::Pixels { rgb, width, height },
                size_mb: len as f64 / BYTES_PER_MIB,
            })
        }
        PageInputMode::Rendered => {
            let png = layout.png(page);
            let len = file_len(&png).await?;
            Ok(PageAssets {
                page,
                source: PageSource::Rendered { png },
                size_mb: len as f64 / BYTES_PER_MIB,
            })
        }
    }
}

/// Check declared dimensions against the accepted range.
pub fn validate_dimensions(page: usize, width: u32, height: u32) -> Result<(), Pixels2PdfError> {
    if !(1..=MAX_PAGE_WIDTH).contains(&width) || !(1..=MAX_PAGE_HEIGHT).contains(&height) {
        return Err(Pixels2PdfError::PageDimensions {
            page,
            width,
            height,
        });
    }
    Ok(())
}

async fn read_dimension(path: &Path) -> Result<u32, Pixels2PdfError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Pixels2PdfError::InvalidMetadata {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    raw.trim()
        .parse::<u32>()
        .map_err(|e| Pixels2PdfError::InvalidMetadata {
            path: path.to_path_buf(),
            detail: format!("{:?} is not a dimension: {}", raw.trim(), e),
        })
}

async fn file_len(path: &Path) -> Result<u64, Pixels2PdfError> {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|e| Pixels2PdfError::InvalidMetadata {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}
