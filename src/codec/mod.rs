//! Encoding and container option variants
//!
//! Each per-stream or container option block in a template decodes into exactly one
//! [`EncodingOptions`] variant. The variant renders the ffmpeg arguments for its stream.

use serde::{Deserialize, Serialize};

pub mod resolver;

pub use resolver::{resolve, resolve_with_fallback, OptionKind};

/// One decoded option block
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingOptions {
    Copy(CopyOptions),
    Libx264(Libx264Options),
    Libx265(Libx265Options),
    GenericAudio(GenericAudioOptions),
    Matroska(MatroskaOptions),
    Mp4(Mp4Options),
}

/// Stream pass-through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {}

/// Software H.264 encoder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Libx264Options {
    /// Quantization parameter, `-qp`
    pub qp: i32,
    pub preset: String,
    pub tune: String,
    /// Emit `-qp` only when set
    #[serde(alias = "useqp")]
    pub use_qp: bool,
}

/// Software H.265 encoder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Libx265Options {
    /// Constant rate factor, `-crf`
    pub crf: i32,
    pub preset: String,
    pub tune: String,
    /// Emit `-crf` only when set
    #[serde(alias = "usecrf")]
    pub use_crf: bool,
}

/// Audio settings for any encoder without a dedicated variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericAudioOptions {
    pub codec: String,
    /// Target bitrate such as `192k`
    pub bitrate: String,
    pub channels: Option<u32>,
}

/// Matroska container settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatroskaOptions {
    /// Space reserved at the head of the file for cues, in kilobytes
    #[serde(alias = "reserveindexspace")]
    pub reserve_index_space: Option<u32>,
}

/// MP4 container settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mp4Options {
    /// Move the moov atom to the front of the file
    #[serde(alias = "enablefaststart")]
    pub enable_fast_start: bool,
}

impl EncodingOptions {
    /// The kind tag of this variant
    pub fn kind(&self) -> OptionKind {
        match self {
            EncodingOptions::Copy(_) => OptionKind::Copy,
            EncodingOptions::Libx264(_) => OptionKind::Libx264,
            EncodingOptions::Libx265(_) => OptionKind::Libx265,
            EncodingOptions::GenericAudio(_) => OptionKind::GenericAudio,
            EncodingOptions::Matroska(_) => OptionKind::Matroska,
            EncodingOptions::Mp4(_) => OptionKind::Mp4,
        }
    }

    /// Whether this variant configures the output container rather than a stream
    pub fn is_container(&self) -> bool {
        matches!(self, EncodingOptions::Matroska(_) | EncodingOptions::Mp4(_))
    }

    /// ffmpeg arguments for this variant.
    ///
    /// Stream variants start with the codec name and are meant to follow `-c:<stream>`;
    /// container variants are output options.
    pub fn args(&self) -> Vec<String> {
        let args = match self {
            EncodingOptions::Copy(_) => vec!["copy".to_string()],
            EncodingOptions::Libx264(o) => {
                let mut args = vec!["libx264".to_string()];
                if o.use_qp {
                    args.extend(["-qp".to_string(), o.qp.to_string()]);
                }
                args.extend(flag("-preset", &o.preset));
                args.extend(flag("-tune", &o.tune));
                args
            }
            EncodingOptions::Libx265(o) => {
                let mut args = vec!["libx265".to_string()];
                if o.use_crf {
                    args.extend(["-crf".to_string(), o.crf.to_string()]);
                }
                args.extend(flag("-preset", &o.preset));
                args.extend(flag("-tune", &o.tune));
                args
            }
            EncodingOptions::GenericAudio(o) => {
                // Without a codec there is nothing for `-c:a` to name
                if o.codec.is_empty() {
                    return Vec::new();
                }
                let mut args = vec![o.codec.clone()];
                args.extend(flag("-b:a", &o.bitrate));
                if let Some(channels) = o.channels {
                    args.extend(["-ac".to_string(), channels.to_string()]);
                }
                args
            }
            EncodingOptions::Matroska(o) => {
                let mut args = vec!["-f".to_string(), "matroska".to_string()];
                if let Some(size) = o.reserve_index_space {
                    args.extend(["-reserve_index_space".to_string(), format!("{}k", size)]);
                }
                args
            }
            EncodingOptions::Mp4(o) => {
                let mut args = vec!["-f".to_string(), "mp4".to_string()];
                if o.enable_fast_start {
                    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
                }
                args
            }
        };

        args.into_iter().filter(|s| !s.is_empty()).collect()
    }
}

fn flag(name: &str, value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    vec![name.to_string(), value.to_string()]
}
