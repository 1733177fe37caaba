//! Video-backed textures.
//!
//! Playback is best-effort: a player that refuses to start leaves the texture
//! in `Unavailable` and the scene keeps rendering without it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    Nearest,
    #[default]
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Resolved video location.
    pub source: String,
    pub sampling: Sampling,
    pub auto_update: bool,
    pub autoplay: bool,
    pub looping: bool,
    pub generate_mipmaps: bool,
    pub invert_y: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            source: String::new(),
            sampling: Sampling::Bilinear,
            auto_update: true,
            autoplay: true,
            looping: true,
            generate_mipmaps: false,
            invert_y: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("video source not found: {0}")]
    NotFound(String),
    #[error("playback refused: {0}")]
    Refused(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Pending,
    Playing,
    Unavailable(String),
}

/// Host hook that actually decodes and plays a video.
pub trait VideoPlayer {
    fn play(&self, settings: &VideoSettings) -> Result<(), VideoError>;
}

/// Player for hosts without video decoding: accepts every source and logs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingVideoPlayer;

impl VideoPlayer for LoggingVideoPlayer {
    fn play(&self, settings: &VideoSettings) -> Result<(), VideoError> {
        tracing::info!(
            source = %settings.source,
            looping = settings.looping,
            "video playback started (no decoder attached)"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTexture {
    pub name: String,
    pub settings: VideoSettings,
    state: PlaybackState,
    frames_updated: u64,
}

impl VideoTexture {
    pub fn new(name: impl Into<String>, settings: VideoSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            state: PlaybackState::Pending,
            frames_updated: 0,
        }
    }

    /// Ask `player` to start playback. Failure is logged and recorded, never
    /// returned.
    pub fn start(&mut self, player: &dyn VideoPlayer) -> &PlaybackState {
        if !self.settings.autoplay {
            return &self.state;
        }
        self.state = match player.play(&self.settings) {
            Ok(()) => PlaybackState::Playing,
            Err(e) => {
                tracing::warn!(texture = %self.name, error = %e, "video playback unavailable");
                PlaybackState::Unavailable(e.to_string())
            }
        };
        &self.state
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Per-frame update.
    pub fn tick(&mut self) {
        if self.settings.auto_update && self.is_playing() {
            self.frames_updated += 1;
        }
    }

    pub fn frames_updated(&self) -> u64 {
        self.frames_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    impl VideoPlayer for Refusing {
        fn play(&self, settings: &VideoSettings) -> Result<(), VideoError> {
            Err(VideoError::NotFound(settings.source.clone()))
        }
    }

    fn texture() -> VideoTexture {
        VideoTexture::new(
            "screen",
            VideoSettings {
                source: "./models/inertia1.mp4".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn defaults() {
        let s = VideoSettings::default();
        assert_eq!(s.sampling, Sampling::Bilinear);
        assert!(s.auto_update && s.autoplay && s.looping && s.invert_y);
        assert!(!s.generate_mipmaps);
    }

    #[test]
    fn playing_texture_updates_each_tick() {
        let mut tex = texture();
        tex.tick();
        assert_eq!(tex.frames_updated(), 0);
        assert_eq!(tex.start(&LoggingVideoPlayer), &PlaybackState::Playing);
        tex.tick();
        tex.tick();
        assert_eq!(tex.frames_updated(), 2);
    }

    #[test]
    fn refused_playback_is_recorded() {
        let mut tex = texture();
        tex.start(&Refusing);
        assert!(matches!(tex.state(), PlaybackState::Unavailable(r) if r.contains("inertia1")));
        tex.tick();
        assert_eq!(tex.frames_updated(), 0);
    }

    #[test]
    fn no_autoplay_stays_pending() {
        let mut tex = texture();
        tex.settings.autoplay = false;
        tex.start(&LoggingVideoPlayer);
        assert_eq!(tex.state(), &PlaybackState::Pending);
    }
}
