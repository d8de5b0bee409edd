//! Delivery of final artifacts and the diagnostic log.
//!
//! In a two-zone deployment the sandbox writes into a scratch area and the
//! trusted side only sees `output_dir`, so both PDFs are renamed into it.
//! In a single-zone deployment the consumer already shares the scratch area
//! and nothing moves.

use crate::config::{DeliveryMode, WorkLayout, DIAGNOSTICS_LOG_NAME};
use crate::context::Diagnostics;
use crate::error::Pixels2PdfError;
use crate::output::FinalArtifacts;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Put `merged` and `compressed` where the consumer expects them.
pub async fn publish_artifacts(
    layout: &WorkLayout,
    delivery: DeliveryMode,
    merged: &Path,
    compressed: &Path,
) -> Result<FinalArtifacts, Pixels2PdfError> {
    match delivery {
        DeliveryMode::InPlace => {
            debug!("Single-zone delivery: leaving artifacts in {}", layout.scratch_dir.display());
            Ok(FinalArtifacts {
                merged: merged.to_path_buf(),
                compressed: compressed.to_path_buf(),
            })
        }
        DeliveryMode::Relocate => {
            tokio::fs::create_dir_all(&layout.output_dir)
                .await
                .map_err(|e| Pixels2PdfError::PublishFailed {
                    path: layout.output_dir.clone(),
                    source: e,
                })?;
            let published = move_into(merged, &layout.output_dir).await?;
            let compressed = match move_into(compressed, &layout.output_dir).await {
                Ok(path) => path,
                Err(e) => {
                    withdraw(&published, merged).await;
                    return Err(e);
                }
            };
            info!("Published {} and {}", published.display(), compressed.display());
            Ok(FinalArtifacts {
                merged: published,
                compressed,
            })
        }
    }
}

/// Take a published artifact back out of the output dir.
///
/// Moves it back to `origin`; if that fails it is deleted, so the output dir
/// never holds one artifact of a failed job.
async fn withdraw(published: &Path, origin: &Path) {
    if tokio::fs::rename(published, origin).await.is_ok() {
        debug!("Withdrew {} to {}", published.display(), origin.display());
        return;
    }
    if let Err(e) = tokio::fs::remove_file(published).await {
        warn!("Could not withdraw {}: {}", published.display(), e);
    }
}

/// Where the diagnostic log goes for `delivery`.
pub fn diagnostics_log_path(layout: &WorkLayout, delivery: DeliveryMode) -> PathBuf {
    match delivery {
        DeliveryMode::Relocate => layout.output_dir.join(DIAGNOSTICS_LOG_NAME),
        DeliveryMode::InPlace => layout.scratch_dir.join(DIAGNOSTICS_LOG_NAME),
    }
}

/// Persist the captured tool output at `path`.
pub async fn write_diagnostics(
    diagnostics: &Diagnostics,
    path: &Path,
) -> Result<(), Pixels2PdfError> {
    let diagnostics = diagnostics.clone();
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || diagnostics.write_to(&target))
        .await
        .map_err(|e| Pixels2PdfError::Internal(format!("Log writer panicked: {}", e)))?
        .map_err(|e| Pixels2PdfError::PublishFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Rename `src` into `dir`, keeping its file name.
///
/// Across filesystems a plain rename is impossible; the file is then copied
/// to a temp file inside `dir` and renamed into place, so the destination
/// still appears in one step.
pub async fn move_into(src: &Path, dir: &Path) -> Result<PathBuf, Pixels2PdfError> {
    let name = src.file_name().ok_or_else(|| {
        Pixels2PdfError::Internal(format!("artifact path {} has no file name", src.display()))
    })?;
    let dest = dir.join(name);

    match tokio::fs::rename(src, &dest).await {
        Ok(()) => Ok(dest),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("{} is on another filesystem, copying", dest.display());
            let (from, to) = (src.to_path_buf(), dest.clone());
            tokio::task::spawn_blocking(move || copy_then_rename(&from, &to))
                .await
                .map_err(|e| Pixels2PdfError::Internal(format!("Mover panicked: {}", e)))?
                .map_err(|e| Pixels2PdfError::PublishFailed {
                    path: dest.clone(),
                    source: e,
                })?;
            Ok(dest)
        }
        Err(e) => Err(Pixels2PdfError::PublishFailed {
            path: dest,
            source: e,
        }),
    }
}

fn copy_then_rename(src: &Path, dest: &Path) -> io::Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let mut input = std::fs::File::open(src)?;
    io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    std::fs::remove_file(src)
}
