//! Reelsmith renders vertical short-form slideshow videos.
//!
//! Given a set of still images, a narration track, and optional background
//! music, it produces one MP4: images are normalized to the target frame,
//! distributed evenly across a voice-driven duration, animated with a
//! continuous zoom, mixed with the audio tracks, optionally watermarked, and
//! streamed into the system `ffmpeg` for encoding.
//!
//! The whole render is synchronous: [`pipeline::render`] blocks until the
//! output file exists or the pipeline fails with a single [`RenderError`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod audio;
pub mod compose;
pub mod config;
pub mod encode;
pub mod error;
pub mod overlay;
pub mod pipeline;
pub mod request;
pub mod timeline;

pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use pipeline::{RenderOutcome, render};
pub use request::{AssetSource, RenderRequest, Script};
pub use timeline::{Segment, Timeline};
