//! espeak-ng voice data management
//!
//! The synthesizer needs an `espeak-ng-data` directory holding voice
//! and language definitions. A system espeak-ng install usually brings
//! one; this module installs a standalone copy from a tar.gz archive
//! into the app data directory for machines without it.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::{Error, Result};

/// Directory that holds installed synthesizer resources
#[must_use]
pub fn voices_root(data_dir: &Path) -> PathBuf {
    data_dir.join("voices")
}

/// Expected location of the `espeak-ng-data` directory
#[must_use]
pub fn data_path(data_dir: &Path) -> PathBuf {
    voices_root(data_dir).join("espeak-ng-data")
}

/// Check whether the base voice resources are present
///
/// The `voices` and `lang` subdirectories are the minimum espeak-ng
/// needs to start.
#[must_use]
pub fn has_base_resources(data_path: &Path) -> bool {
    data_path.join("voices").is_dir() && data_path.join("lang").is_dir()
}

/// Install voice data from an archive unless already present
///
/// Returns `false` when the resources were already installed.
///
/// # Errors
///
/// Returns error if the archive cannot be read or does not contain
/// voice resources
pub fn install_if_missing(data_dir: &Path, archive: &Path) -> Result<bool> {
    let target = data_path(data_dir);
    if has_base_resources(&target) {
        tracing::debug!(path = %target.display(), "voice data already installed");
        return Ok(false);
    }
    install_from_archive(data_dir, archive)?;
    Ok(true)
}

/// Unpack a voice data tar.gz archive into the voices root
///
/// Extraction goes through a staging directory and a final rename, so
/// an interrupted run never leaves a half-written `espeak-ng-data`.
///
/// # Errors
///
/// Returns error if extraction fails or the unpacked tree lacks the
/// base resources
pub fn install_from_archive(data_dir: &Path, archive: &Path) -> Result<()> {
    let target = data_path(data_dir);
    let staging = voices_root(data_dir).join("espeak-ng-data.extracting");

    // Leftover staging dir from an interrupted install
    if staging.exists() {
        tracing::warn!(path = %staging.display(), "removing interrupted extraction");
        let _ = fs::remove_dir_all(&staging);
    }
    fs::create_dir_all(&staging)?;

    tracing::info!(archive = %archive.display(), "unpacking voice data");
    let tar_gz = File::open(archive)
        .map_err(|e| Error::VoiceData(format!("cannot open archive {}: {e}", archive.display())))?;
    let mut tar = Archive::new(GzDecoder::new(tar_gz));
    tar.unpack(&staging).map_err(|e| {
        let _ = fs::remove_dir_all(&staging);
        Error::VoiceData(format!("failed to unpack archive: {e}"))
    })?;

    // Archives may nest everything under a single top-level directory
    let source = nested_root(&staging)?.unwrap_or_else(|| staging.clone());

    if target.exists() {
        fs::remove_dir_all(&target)?;
    }
    fs::rename(&source, &target)?;
    if source != staging {
        let _ = fs::remove_dir_all(&staging);
    }

    if !has_base_resources(&target) {
        let _ = fs::remove_dir_all(&target);
        return Err(Error::VoiceData(
            "archive did not contain espeak-ng voice resources".to_string(),
        ));
    }

    tracing::info!(path = %target.display(), "voice data installed");
    Ok(())
}

fn nested_root(staging: &Path) -> Result<Option<PathBuf>> {
    let entries: Vec<_> = fs::read_dir(staging)?
        .filter_map(std::result::Result::ok)
        .collect();

    if entries.len() == 1 && entries[0].file_type().is_ok_and(|t| t.is_dir()) {
        Ok(Some(entries[0].path()))
    } else {
        Ok(None)
    }
}
