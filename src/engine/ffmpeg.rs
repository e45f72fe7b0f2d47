//! ffmpeg command line construction

use crate::codec::EncodingOptions;
use crate::domain::model::TranscodeRequest;

/// Builds the argument vector for one ffmpeg invocation
pub struct FfmpegArgs<'a> {
    request: &'a TranscodeRequest,
    progress_address: Option<&'a str>,
}

impl<'a> FfmpegArgs<'a> {
    pub fn new(request: &'a TranscodeRequest) -> Self {
        Self {
            request,
            progress_address: None,
        }
    }

    /// Report status to a listener at `address`
    pub fn with_progress(mut self, address: &'a str) -> Self {
        self.progress_address = Some(address);
        self
    }

    /// Final argument list, without the program name. Empty arguments are dropped.
    pub fn build(&self) -> Vec<String> {
        let r = self.request;
        let mut args: Vec<String> = r.input_args.clone();

        if let Some(address) = self.progress_address {
            args.extend(["-nostats".to_string(), "-progress".to_string(), address.to_string()]);
        }

        args.push("-i".to_string());
        args.push(r.input.to_string_lossy().into_owned());

        args.extend(stream_codec("-an", "-c:a", r.discard_audio, r.audio.as_ref()));
        args.extend(stream_codec("-sn", "-c:s", r.discard_subtitles, r.subtitle.as_ref()));
        args.extend(stream_codec("-vn", "-c:v", r.discard_video, r.video.as_ref()));

        args.extend(self.maps());

        if let Some(container) = r.container.as_ref() {
            args.extend(container.args());
        }

        args.extend(r.output_args.iter().cloned());
        args.push("-y".to_string());
        args.push(r.output.to_string_lossy().into_owned());

        args.into_iter().filter(|s| !s.is_empty()).collect()
    }

    /// Rendered command for logging
    pub fn command_line(&self) -> String {
        let mut parts = vec!["ffmpeg".to_string()];
        parts.extend(self.build());
        parts.join(" ")
    }

    fn maps(&self) -> Vec<String> {
        let r = self.request;
        let mut selectors = Vec::new();

        if !r.discard_video {
            selectors.push(if r.map_all_video { "0:v".to_string() } else { "0:v:0".to_string() });
        }

        if !r.discard_audio {
            selectors.extend(language_maps("a", r.map_all_audio, &r.audio_languages));
        }

        if !r.discard_subtitles {
            selectors.extend(language_maps("s", r.map_all_subtitles, &r.subtitle_languages));
        }

        selectors
            .into_iter()
            .flat_map(|selector| ["-map".to_string(), selector])
            .collect()
    }
}

fn stream_codec(
    discard_flag: &str,
    codec_flag: &str,
    discard: bool,
    options: Option<&EncodingOptions>,
) -> Vec<String> {
    if discard {
        return vec![discard_flag.to_string()];
    }

    let Some(codec_args) = options.map(EncodingOptions::args).filter(|a| !a.is_empty()) else {
        return Vec::new();
    };

    let mut args = vec![codec_flag.to_string()];
    args.extend(codec_args);
    args
}

/// Without a language filter every stream of the kind is kept
fn language_maps(kind: &str, map_all: bool, languages: &[String]) -> Vec<String> {
    if map_all || languages.is_empty() {
        return vec![format!("0:{}?", kind)];
    }

    languages
        .iter()
        .filter(|lang| !lang.is_empty())
        .map(|lang| format!("0:{}:m:language:{}", kind, lang))
        .collect()
}
