use crate::error::{RenderError, RenderResult};

/// Narration script, carried through the pipeline untouched.
///
/// The text drives voice generation upstream; this renderer never draws it
/// into the visuals.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Script {
    pub hook: String,
    #[serde(default)]
    pub body: Vec<String>,
    pub twist: String,
    pub cta: String,
}

/// One render request: image sources, a voice track, optional music and
/// watermark.
///
/// Images and voice each accept exactly one source form: remote URLs or
/// inline base64 blobs. Supplying both forms (or neither) is a validation
/// failure, never a silent preference.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    pub title: String,
    pub script: Script,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub image_b64: Vec<String>,
    #[serde(default)]
    pub voice_url: Option<String>,
    #[serde(default)]
    pub voice_b64: Option<String>,
    #[serde(default)]
    pub music_url: Option<String>,
    #[serde(default)]
    pub watermark_text: Option<String>,
    /// Reserved for future styling; accepted but unused by composition.
    #[serde(default)]
    pub brand_color_hex: Option<String>,
}

/// A single asset input, either referenced remotely or embedded inline.
#[derive(Clone, Debug)]
pub enum AssetSource {
    Url(String),
    Base64(String),
}

impl RenderRequest {
    /// Check the exactly-one-source-form invariants.
    ///
    /// Runs before any fetch or decode work is attempted.
    pub fn validate(&self) -> RenderResult<()> {
        match (self.image_urls.is_empty(), self.image_b64.is_empty()) {
            (true, true) => {
                return Err(RenderError::input("provide image_urls or image_b64"));
            }
            (false, false) => {
                return Err(RenderError::input(
                    "provide image_urls or image_b64, not both",
                ));
            }
            _ => {}
        }
        match (&self.voice_url, &self.voice_b64) {
            (None, None) => {
                return Err(RenderError::input("provide voice_url or voice_b64"));
            }
            (Some(_), Some(_)) => {
                return Err(RenderError::input(
                    "provide voice_url or voice_b64, not both",
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Image sources in supplied order.
    pub fn image_sources(&self) -> Vec<AssetSource> {
        if !self.image_b64.is_empty() {
            self.image_b64
                .iter()
                .cloned()
                .map(AssetSource::Base64)
                .collect()
        } else {
            self.image_urls
                .iter()
                .cloned()
                .map(AssetSource::Url)
                .collect()
        }
    }

    /// The narration source.
    pub fn voice_source(&self) -> RenderResult<AssetSource> {
        if let Some(b64) = &self.voice_b64 {
            return Ok(AssetSource::Base64(b64.clone()));
        }
        if let Some(url) = &self.voice_url {
            return Ok(AssetSource::Url(url.clone()));
        }
        Err(RenderError::input("provide voice_url or voice_b64"))
    }

    /// The optional background music source.
    pub fn music_source(&self) -> Option<AssetSource> {
        self.music_url.clone().map(AssetSource::Url)
    }
}
