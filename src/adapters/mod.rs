// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod probe_ffprobe;
pub mod split_mkvmerge;
pub mod template_config;

// Re-export adapters
pub use exec_ffmpeg::FfmpegAdapter;
pub use fs_local::LocalFsAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use split_mkvmerge::MkvmergeSplitAdapter;
pub use template_config::TemplateConfigAdapter;
