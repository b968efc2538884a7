/// Convenience result type used across mediastitch.
pub type StitchResult<T> = Result<T, StitchError>;

/// Error taxonomy for the compositing engine.
///
/// Every variant aborts a running `finalize`; there is no partial artifact.
#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    /// The handle is no longer Active (already finalizing or deinited).
    #[error("state error: {0}")]
    State(String),

    /// The output collaborator cannot encode the configured surface dimensions.
    #[error("unsupported video: {0}")]
    UnsupportedVideo(String),

    /// The output collaborator cannot encode the configured channel count / sample rate.
    #[error("unsupported audio: {0}")]
    UnsupportedAudio(String),

    /// A producer discovered it lacks the track or data it needs.
    #[error("media access error: {0}")]
    MediaAccess(String),

    /// Failure raised inside a render producer or audio supplier.
    #[error("producer error: {0}")]
    Producer(String),

    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure inside an output collaborator while committing frames or bytes.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StitchError {
    /// Build a [`StitchError::State`] value.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Build a [`StitchError::UnsupportedVideo`] value.
    pub fn unsupported_video(msg: impl Into<String>) -> Self {
        Self::UnsupportedVideo(msg.into())
    }

    /// Build a [`StitchError::UnsupportedAudio`] value.
    pub fn unsupported_audio(msg: impl Into<String>) -> Self {
        Self::UnsupportedAudio(msg.into())
    }

    /// Build a [`StitchError::MediaAccess`] value.
    pub fn media_access(msg: impl Into<String>) -> Self {
        Self::MediaAccess(msg.into())
    }

    /// Build a [`StitchError::Producer`] value.
    pub fn producer(msg: impl Into<String>) -> Self {
        Self::Producer(msg.into())
    }

    /// Build a [`StitchError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StitchError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` for the two capability variants.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::UnsupportedVideo(_) | Self::UnsupportedAudio(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
