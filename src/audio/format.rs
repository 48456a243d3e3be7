use std::fmt;
use tracing::{debug, info};

/// Container/codec types the backend can decode, most preferred first
pub const PREFERRED_FORMATS: [&str; 6] = [
    "audio/webm",
    "audio/mp3",
    "audio/ogg",
    "audio/wav",
    "audio/mpeg",
    "audio/aac",
];

/// MIME type of a recorded payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    mime: String,
}

impl AudioFormat {
    pub fn new(mime: impl Into<String>) -> Self {
        Self { mime: mime.into() }
    }

    pub fn wav() -> Self {
        Self::new("audio/wav")
    }

    /// Format left entirely to the recorder
    pub fn unspecified() -> Self {
        Self::new("")
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// MIME type without parameters, lowercased (`audio/webm;codecs=opus` -> `audio/webm`)
    pub fn essence(&self) -> String {
        self.mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// File extension the backend uses to pick a decoder
    pub fn extension(&self) -> &'static str {
        let mime = self.mime.to_ascii_lowercase();
        if mime.contains("webm") {
            "webm"
        } else if mime.contains("ogg") {
            "ogg"
        } else if mime.contains("mp3") || mime.contains("mpeg") {
            "mp3"
        } else if mime.contains("wav") {
            "wav"
        } else if mime.contains("aac") {
            "m4a"
        } else {
            "webm"
        }
    }

    pub fn file_name(&self) -> String {
        format!("recording.{}", self.extension())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mime.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&self.mime)
        }
    }
}

/// Answers whether the recording runtime can produce a given format
pub trait FormatSupport {
    fn is_supported(&self, mime: &str) -> bool;
}

/// Capability backed by a fixed list of formats
#[derive(Debug, Clone, Default)]
pub struct StaticFormatSupport {
    supported: Vec<AudioFormat>,
}

impl StaticFormatSupport {
    pub fn new(supported: impl IntoIterator<Item = AudioFormat>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StaticFormatSupport {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(AudioFormat::new))
    }
}

impl FormatSupport for StaticFormatSupport {
    fn is_supported(&self, mime: &str) -> bool {
        let wanted = AudioFormat::new(mime);
        let has_params = mime.contains(';');

        self.supported.iter().any(|format| {
            if has_params {
                format.mime().eq_ignore_ascii_case(mime.trim())
            } else {
                format.essence() == wanted.essence()
            }
        })
    }
}

/// Pick the first preferred format the runtime supports, else `fallback`.
pub fn negotiate(
    support: &dyn FormatSupport,
    preferences: &[&str],
    fallback: AudioFormat,
) -> AudioFormat {
    for &candidate in preferences {
        if candidate.is_empty() {
            continue;
        }
        if support.is_supported(candidate) {
            info!("Negotiated recording format: {}", candidate);
            return AudioFormat::new(candidate);
        }
        debug!("Recording format not supported: {}", candidate);
    }

    info!("No preferred format supported, using recorder default: {}", fallback);
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_supported_preference_wins() {
        let support: StaticFormatSupport = ["audio/ogg", "audio/wav"].into_iter().collect();
        let format = negotiate(&support, &PREFERRED_FORMATS, AudioFormat::unspecified());
        assert_eq!(format.mime(), "audio/ogg");
        assert_eq!(format.extension(), "ogg");
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let support: StaticFormatSupport = ["audio/flac"].into_iter().collect();
        let format = negotiate(&support, &PREFERRED_FORMATS, AudioFormat::new("audio/x-caf"));
        assert_eq!(format.mime(), "audio/x-caf");
    }

    #[test]
    fn test_codec_parameters_match_essence() {
        let support: StaticFormatSupport = ["audio/webm;codecs=opus"].into_iter().collect();
        assert!(support.is_supported("audio/webm"));
        assert!(support.is_supported("audio/WEBM;codecs=opus"));
        assert!(!support.is_supported("audio/webm;codecs=vorbis"));
    }

    #[test]
    fn test_extension_mapping() {
        let cases = [
            ("audio/webm;codecs=opus", "webm"),
            ("audio/ogg", "ogg"),
            ("audio/mp3", "mp3"),
            ("audio/mpeg", "mp3"),
            ("audio/wav", "wav"),
            ("audio/aac", "m4a"),
            ("", "webm"),
            ("audio/x-unknown", "webm"),
        ];
        for (mime, ext) in cases {
            assert_eq!(AudioFormat::new(mime).extension(), ext, "mime {:?}", mime);
        }
        assert_eq!(AudioFormat::wav().file_name(), "recording.wav");
    }
}
