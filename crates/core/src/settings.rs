//! Conversion settings and the codec → output format mapping.

use serde::{Deserialize, Serialize};

/// Sample rate every conversion targets.
pub const FIXED_SAMPLE_RATE: u32 = 44100;

/// Channel count every conversion targets.
pub const FIXED_CHANNELS: u8 = 2;

/// Target audio codec.
///
/// Serialized as the encoder id (`libmp3lame`, `aac`). Unknown ids fall back to
/// [`Codec::Mp3`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Codec {
    /// LAME MP3 encoder.
    #[default]
    Mp3,
    /// Native AAC encoder.
    Aac,
}

impl Codec {
    /// Resolves an encoder id, falling back to MP3 for anything unknown.
    pub fn from_id(id: &str) -> Self {
        match id {
            "aac" => Self::Aac,
            _ => Self::Mp3,
        }
    }

    /// Encoder id passed to the transcoder.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
        }
    }

    /// Output format row for this codec.
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Self::Mp3 => OutputFormat {
                format: "MP3",
                codec_name: "LAME MP3",
                extension: "mp3",
                mime: "audio/mpeg",
                muxer: "mp3",
            },
            Self::Aac => OutputFormat {
                format: "AAC",
                codec_name: "AAC",
                extension: "aac",
                mime: "audio/aac",
                muxer: "adts",
            },
        }
    }

    /// All supported codecs, in display order.
    pub fn all() -> [Codec; 2] {
        [Self::Mp3, Self::Aac]
    }
}

impl From<String> for Codec {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.id().to_string()
    }
}

/// Display and file properties derived from a [`Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputFormat {
    /// Short display name ("MP3").
    pub format: &'static str,
    /// Human readable codec name ("LAME MP3").
    pub codec_name: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
    /// MIME type of the produced file.
    pub mime: &'static str,
    /// Container token for ffmpeg's `-f`. AAC output is raw ADTS.
    pub muxer: &'static str,
}

/// Settings for one batch. A copy is taken when the batch starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Target codec.
    #[serde(default)]
    pub codec: Codec,
    /// Target bitrate, e.g. `"192k"`.
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Output channel count.
    #[serde(default = "default_channels")]
    pub channels: u8,
}

fn default_bitrate() -> String {
    "192k".to_string()
}

fn default_sample_rate() -> u32 {
    FIXED_SAMPLE_RATE
}

fn default_channels() -> u8 {
    FIXED_CHANNELS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            bitrate: default_bitrate(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl Settings {
    /// Creates settings for the given codec and bitrate with the fixed rate and layout.
    pub fn new(codec: Codec, bitrate: impl Into<String>) -> Self {
        Self {
            codec,
            bitrate: bitrate.into(),
            ..Default::default()
        }
    }

    /// Same settings with the fixed sample rate and channel layout restored.
    pub fn with_fixed_layout(self) -> Self {
        Self {
            sample_rate: FIXED_SAMPLE_RATE,
            channels: FIXED_CHANNELS,
            ..self
        }
    }

    /// Whether the sample rate and channel count are the fixed ones.
    pub fn has_fixed_layout(&self) -> bool {
        self.sample_rate == FIXED_SAMPLE_RATE && self.channels == FIXED_CHANNELS
    }

    /// Output format derived from the codec.
    pub fn output_format(&self) -> OutputFormat {
        self.codec.output_format()
    }

    /// Output file extension derived from the codec.
    pub fn extension(&self) -> &'static str {
        self.codec.output_format().extension
    }
}

/// Whether a bitrate string has the `<digits>k` shape the transcoders expect.
pub fn is_valid_bitrate(bitrate: &str) -> bool {
    bitrate
        .strip_suffix('k')
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
