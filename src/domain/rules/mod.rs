// Domain rules - Naming and container derivation policies

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codec::EncodingOptions;
use crate::domain::model::*;

/// Kilobytes of Matroska cue space to reserve per started hour of video.
/// See <https://www.ffmpeg.org/ffmpeg-formats.html#matroska>.
pub const MATROSKA_RESERVE_INDEX_SPACE_PER_HOUR: u32 = 50;

/// Name used when structured naming cannot classify the media kind
pub const FALLBACK_STEM: &str = "unknown";

const DEFAULT_EXTENSION: &str = "mkv";

/// Computes where a transcoded file is placed
pub struct OutputNamer;

impl OutputNamer {
    /// Path of the placed file relative to the output root
    pub fn relative_path(target: &PlacementTarget, source: &Path) -> PathBuf {
        match target.mode {
            NamingMode::Flat => source
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{}.{}", FALLBACK_STEM, extension(source)))),
            NamingMode::Structured => Self::structured_path(target, extension(source)),
        }
    }

    /// Absolute destination under `output_root`
    pub fn destination(output_root: &Path, target: &PlacementTarget, source: &Path) -> PathBuf {
        output_root.join(Self::relative_path(target, source))
    }

    /// Library layout, e.g. `Show (2020)/Season 01/Show (2020) - s01e03.mkv`
    pub fn structured_path(target: &PlacementTarget, ext: &str) -> PathBuf {
        let name = if target.year > 0 {
            format!("{} ({})", target.title, target.year)
        } else {
            target.title.clone()
        };

        match &target.kind {
            MediaKind::Movie => PathBuf::from(&name).join(format!("{}.{}", name, ext)),
            MediaKind::Episodic => PathBuf::from(&name)
                .join(format!("Season {:02}", target.season))
                .join(format!(
                    "{} - s{:02}e{:02}.{}",
                    name, target.season, target.episode, ext
                )),
            // Permissive: an unclassified kind still gets a name instead of an error.
            MediaKind::Other(kind) => {
                tracing::warn!(kind = %kind, "unrecognized media kind, using placeholder name");
                PathBuf::from(format!("{}.{}", FALLBACK_STEM, ext))
            }
        }
    }
}

fn extension(path: &Path) -> &str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Index reservation for a Matroska file of the given length, in kilobytes
pub fn matroska_index_reservation(duration: Duration) -> Option<u32> {
    if duration.is_zero() {
        return None;
    }
    let started_hours = (duration.as_secs() / 3600) as u32 + 1;
    Some(MATROSKA_RESERVE_INDEX_SPACE_PER_HOUR * started_hours)
}

/// Fill container flags that depend on user intent and the analyzed duration.
///
/// Never invents a duration: without one the Matroska reservation is left untouched.
pub fn derive_container_options(
    options: &mut EncodingOptions,
    enable_fast_start: bool,
    analysis: Option<&AnalysisResult>,
) {
    if !enable_fast_start {
        return;
    }

    match options {
        EncodingOptions::Matroska(mkv) => {
            if let Some(size) = analysis.and_then(|a| matroska_index_reservation(a.duration)) {
                mkv.reserve_index_space = Some(size);
            }
        }
        EncodingOptions::Mp4(mp4) => mp4.enable_fast_start = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests;
