// Unit tests for domain models

use super::*;

#[test]
fn test_parse_frame_rate() {
    assert_eq!(parse_frame_rate("100").unwrap(), 100.0);
    assert_eq!(parse_frame_rate("100/2").unwrap(), 50.0);
    assert_eq!(
        parse_frame_rate("24000/1001").unwrap(),
        24000.0_f64 / 1001.0_f64
    );
}

#[test]
fn test_parse_frame_rate_rejects_garbage() {
    assert!(parse_frame_rate("abc").is_err());
    assert!(parse_frame_rate("24/x").is_err());
    assert!(parse_frame_rate("24/0").is_err());
}

#[test]
fn test_duration_from_frame_rate() {
    let mut result = AnalysisResult::from_frames(24);
    result.set_duration_from_frame_rate("24").unwrap();
    assert_eq!(result.duration, Duration::from_secs(1));

    // ~10 minutes
    let mut result = AnalysisResult::from_frames(14386);
    result.set_duration_from_frame_rate("24").unwrap();
    let minutes = (result.duration.as_secs_f64() / 60.0).round() as u64;
    assert_eq!(minutes, 10);
    assert!(result.has_duration());
}

#[test]
fn test_duration_unknown_without_frames() {
    let mut result = AnalysisResult::default();
    result.set_duration_from_frame_rate("25").unwrap();
    assert!(!result.has_duration());
}

#[test]
fn test_progress_report_applies_known_keys() {
    let mut report = ProgressReport::default();
    assert_eq!(report.apply_line("frame=24"), StatusLine::Field);
    assert_eq!(report.apply_line("fps=24.0"), StatusLine::Field);
    assert_eq!(report.apply_line("bitrate=1024.5kbits/s"), StatusLine::Field);
    assert_eq!(report.apply_line("out_time=00:00:01.000000"), StatusLine::Field);
    assert_eq!(report.apply_line("speed=1.5x"), StatusLine::Field);
    assert_eq!(report.apply_line("total_size=4096"), StatusLine::Field);

    assert_eq!(report.frame, 24);
    assert_eq!(report.fps, 24.0);
    assert_eq!(report.bitrate, "1024.5kbits/s");
    assert_eq!(report.out_time, "00:00:01.000000");
    assert_eq!(report.speed, "1.5x");
    assert_eq!(report.total_size, 4096);
}

#[test]
fn test_progress_report_keeps_previous_value_on_bad_number() {
    let mut report = ProgressReport::default();
    report.apply_line("frame=10");
    report.apply_line("frame=ten");
    report.apply_line("total_size=N/A");
    assert_eq!(report.frame, 10);
    assert_eq!(report.total_size, 0);
}

#[test]
fn test_progress_report_ignores_unknown_and_malformed() {
    let mut report = ProgressReport::default();
    assert_eq!(report.apply_line("dup_frames=3"), StatusLine::Ignored);
    assert_eq!(report.apply_line("garbage without separator"), StatusLine::Ignored);
    assert_eq!(report, ProgressReport::default());
}

#[test]
fn test_progress_markers() {
    let mut report = ProgressReport::default();
    assert_eq!(report.apply_line("progress=continue"), StatusLine::Unit);
    assert_eq!(report.apply_line("progress=end\r"), StatusLine::End);
}

#[test]
fn test_percent_is_clamped() {
    let mut report = ProgressReport::default();
    report.frame = 50;
    assert_eq!(report.percent_of(200), Some(25.0));
    assert_eq!(report.percent_of(0), None);

    report.frame = 500;
    assert_eq!(report.percent_of(200), Some(100.0));
}

#[test]
fn test_summary_display() {
    let mut report = ProgressReport::default();
    report.apply_line("frame=12");
    report.apply_line("fps=23.976");

    let with_total = report.summary(24).to_string();
    assert!(with_total.starts_with(" 50.0% "));
    assert!(with_total.contains("fps=23.98"));

    let without_total = report.summary(0).to_string();
    assert!(without_total.starts_with("frame=12"));
}

#[test]
fn test_media_kind_parsing() {
    assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
    assert_eq!("TV".parse::<MediaKind>().unwrap(), MediaKind::Episodic);
    assert_eq!("show".parse::<MediaKind>().unwrap(), MediaKind::Episodic);
    assert_eq!(
        "documentary".parse::<MediaKind>().unwrap(),
        MediaKind::Other("documentary".to_string())
    );
}

#[test]
fn test_pipeline_state_counter() {
    let mut state = PipelineState::new(vec![PathBuf::from("a.mkv")], 4);
    assert_eq!(state.stage, PipelineStage::Idle);
    state.enter(PipelineStage::Placing);
    state.advance_episode().unwrap();
    assert_eq!(state.episode, 5);
    assert_eq!(state.stage, PipelineStage::Placing);
}

#[test]
fn test_pipeline_state_counter_overflow_is_error() {
    let mut state = PipelineState::new(Vec::new(), u32::MAX);
    assert!(matches!(
        state.advance_episode(),
        Err(DomainError::InvalidConfig(_))
    ));
    assert_eq!(state.episode, u32::MAX);
}

#[test]
fn test_output_path_follows_container() {
    use crate::codec::{EncodingOptions, Mp4Options};

    let work = Path::new("/tmp/work");
    let mp4 = EncodingOptions::Mp4(Mp4Options::default());
    assert_eq!(
        TranscodeRequest::output_path_for(work, "episode-001", Some(&mp4)),
        PathBuf::from("/tmp/work/episode-001-output.mp4")
    );
    assert_eq!(
        TranscodeRequest::output_path_for(work, "movie", None),
        PathBuf::from("/tmp/work/movie-output.mkv")
    );
}

#[test]
fn test_artifact_stem_prefixes_split_pieces() {
    let piece = Path::new("/work/disc1-split/episode-001.mkv");
    assert_eq!(
        TranscodeRequest::artifact_stem(Path::new("/in/disc1.mkv"), piece),
        "disc1-episode-001"
    );
    assert_eq!(
        TranscodeRequest::artifact_stem(Path::new("/in/disc2.mkv"), Path::new("/work/disc2-split/episode-001.mkv")),
        "disc2-episode-001"
    );

    let whole = Path::new("/in/movie.m2ts");
    assert_eq!(TranscodeRequest::artifact_stem(whole, whole), "movie");
}

#[test]
fn test_transcode_options_from_yaml() {
    let yaml = r#"
audio_languages: [eng, jpn]
enable_fast_start: true
video_options:
  codec: libx264
  qp: 18
"#;
    let options: TranscodeOptions = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(options.audio_languages, vec!["eng", "jpn"]);
    assert!(options.enable_fast_start);
    assert!(options.video_options.is_some());
    assert!(options.audio_options.is_none());
}
