// Unit tests for naming and container rules

use super::*;
use crate::codec::{CopyOptions, MatroskaOptions, Mp4Options};

fn show(year: u32, season: u32, episode: u32) -> PlacementTarget {
    PlacementTarget {
        mode: NamingMode::Structured,
        title: "Show".to_string(),
        year,
        kind: MediaKind::Episodic,
        season,
        episode,
    }
}

fn analysis_of(duration: Duration) -> AnalysisResult {
    AnalysisResult {
        duration,
        ..AnalysisResult::default()
    }
}

#[test]
fn test_structured_episode_without_year() {
    let path = OutputNamer::relative_path(&show(0, 1, 3), Path::new("/work/ep-output.mkv"));
    assert_eq!(path, PathBuf::from("Show/Season 01/Show - s01e03.mkv"));
}

#[test]
fn test_structured_episode_with_year() {
    let path = OutputNamer::relative_path(&show(2020, 1, 3), Path::new("/work/ep-output.mkv"));
    assert_eq!(
        path,
        PathBuf::from("Show (2020)/Season 01/Show (2020) - s01e03.mkv")
    );
}

#[test]
fn test_structured_movie() {
    let target = PlacementTarget {
        kind: MediaKind::Movie,
        title: "Film".to_string(),
        ..show(1999, 1, 1)
    };
    let path = OutputNamer::relative_path(&target, Path::new("/work/film-output.mp4"));
    assert_eq!(path, PathBuf::from("Film (1999)/Film (1999).mp4"));
}

#[test]
fn test_structured_two_digit_padding_only() {
    let path = OutputNamer::relative_path(&show(0, 12, 104), Path::new("x.mkv"));
    assert_eq!(path, PathBuf::from("Show/Season 12/Show - s12e104.mkv"));
}

#[test]
fn test_unknown_kind_falls_back() {
    let target = PlacementTarget {
        kind: MediaKind::Other("podcast".to_string()),
        ..show(0, 1, 1)
    };
    let path = OutputNamer::relative_path(&target, Path::new("x.mkv"));
    assert_eq!(path, PathBuf::from("unknown.mkv"));
}

#[test]
fn test_flat_keeps_base_name() {
    let target = PlacementTarget {
        mode: NamingMode::Flat,
        ..show(2020, 1, 3)
    };
    let dest = OutputNamer::destination(
        Path::new("/library"),
        &target,
        Path::new("/tmp/work/episode-002-output.mkv"),
    );
    assert_eq!(dest, PathBuf::from("/library/episode-002-output.mkv"));
}

#[test]
fn test_missing_extension_defaults_to_mkv() {
    let path = OutputNamer::relative_path(&show(0, 2, 1), Path::new("/work/noext"));
    assert_eq!(path, PathBuf::from("Show/Season 02/Show - s02e01.mkv"));
}

#[test]
fn test_matroska_reservation_by_started_hour() {
    assert_eq!(matroska_index_reservation(Duration::from_secs(45 * 60)), Some(50));
    assert_eq!(matroska_index_reservation(Duration::from_secs(90 * 60)), Some(100));
    assert_eq!(matroska_index_reservation(Duration::from_secs(3600)), Some(100));
    assert_eq!(matroska_index_reservation(Duration::from_secs(3599)), Some(50));
    assert_eq!(matroska_index_reservation(Duration::ZERO), None);
}

#[test]
fn test_derive_matroska_with_duration() {
    let mut options = EncodingOptions::Matroska(MatroskaOptions::default());
    let analysis = analysis_of(Duration::from_secs(90 * 60));
    derive_container_options(&mut options, true, Some(&analysis));
    assert_eq!(
        options,
        EncodingOptions::Matroska(MatroskaOptions {
            reserve_index_space: Some(100)
        })
    );
}

#[test]
fn test_derive_matroska_without_duration_leaves_unset() {
    let mut options = EncodingOptions::Matroska(MatroskaOptions::default());
    derive_container_options(&mut options, true, None);
    assert_eq!(options, EncodingOptions::Matroska(MatroskaOptions::default()));

    derive_container_options(&mut options, true, Some(&analysis_of(Duration::ZERO)));
    assert_eq!(options, EncodingOptions::Matroska(MatroskaOptions::default()));
}

#[test]
fn test_derive_requires_fast_start() {
    let mut options = EncodingOptions::Matroska(MatroskaOptions::default());
    let analysis = analysis_of(Duration::from_secs(7200));
    derive_container_options(&mut options, false, Some(&analysis));
    assert_eq!(options, EncodingOptions::Matroska(MatroskaOptions::default()));

    let mut options = EncodingOptions::Mp4(Mp4Options::default());
    derive_container_options(&mut options, false, Some(&analysis));
    assert_eq!(options, EncodingOptions::Mp4(Mp4Options::default()));
}

#[test]
fn test_derive_mp4_sets_flag_only() {
    let mut options = EncodingOptions::Mp4(Mp4Options::default());
    derive_container_options(&mut options, true, None);
    assert_eq!(
        options,
        EncodingOptions::Mp4(Mp4Options {
            enable_fast_start: true
        })
    );
}

#[test]
fn test_derive_ignores_other_variants() {
    let mut options = EncodingOptions::Copy(CopyOptions {});
    derive_container_options(&mut options, true, Some(&analysis_of(Duration::from_secs(60))));
    assert_eq!(options, EncodingOptions::Copy(CopyOptions {}));
}
