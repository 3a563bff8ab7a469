//! Asset resolution: turn request sources into normalized local assets.
//!
//! Every render owns one [`AssetResolver`], which scopes all fetched and
//! decoded files to a temporary directory removed when the resolver drops,
//! on success and on every failure path alike.

pub mod fetch;
pub mod fit;
pub mod media;

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::request::AssetSource;
use fit::ResolvedImage;
use media::AudioPcm;

/// Per-request timeout for remote asset fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches/decodes request assets into a scoped temporary directory.
pub struct AssetResolver {
    tmp: tempfile::TempDir,
    client: reqwest::blocking::Client,
}

impl AssetResolver {
    pub fn new() -> RenderResult<Self> {
        Self::new_in(std::env::temp_dir())
    }

    fn new_in(root: impl AsRef<Path>) -> RenderResult<Self> {
        let tmp = tempfile::tempdir_in(root).context("failed to create temp directory")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| RenderError::fetch(format!("failed to build http client: {e}")))?;
        Ok(Self { tmp, client })
    }

    /// The render-scoped temporary directory.
    pub fn dir(&self) -> &Path {
        self.tmp.path()
    }

    fn source_bytes(&self, source: &AssetSource) -> RenderResult<Vec<u8>> {
        match source {
            AssetSource::Url(url) => fetch::fetch_url(&self.client, url),
            AssetSource::Base64(b64) => fetch::decode_inline(b64),
        }
    }

    /// Resolve and normalize every image source, preserving order.
    ///
    /// Each image is center-cropped to the target aspect ratio and resized to
    /// exactly `target_width x target_height`.
    pub fn resolve_images(
        &self,
        sources: &[AssetSource],
        cfg: &RenderConfig,
    ) -> RenderResult<Vec<ResolvedImage>> {
        if sources.is_empty() {
            return Err(RenderError::input("at least one image source is required"));
        }
        let mut out = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let bytes = self.source_bytes(source)?;
            let path = self.tmp.path().join(format!("img{}.jpg", i + 1));
            let resolved = fit::fit_to_frame(&bytes, cfg.target_width, cfg.target_height, &path)?;
            debug!(index = i, path = %path.display(), "normalized image");
            out.push(resolved);
        }
        Ok(out)
    }

    /// Resolve an audio source (voice or music) into stereo PCM at the mix
    /// sample rate.
    pub fn resolve_audio(&self, source: &AssetSource, name: &str) -> RenderResult<AudioPcm> {
        let bytes = self.source_bytes(source)?;
        let path = self.tmp.path().join(name);
        std::fs::write(&path, bytes).map_err(|e| {
            RenderError::decode(format!("failed to write '{}': {e}", path.display()))
        })?;
        media::decode_audio_f32_stereo(&path, media::MIX_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_failure_is_an_environment_error() {
        let err = AssetResolver::new_in("/definitely/not/a/real/root")
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Other(_)));
        assert!(!err.to_string().starts_with("input error"));
    }
}
