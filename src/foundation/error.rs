use crate::compositor::traits::CompositorError;
use crate::expression::error::ExprError;
use crate::layout::fill::LayoutError;

/// Convenience result type used across scenecast.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// A layout expression could not be parsed or evaluated.
    #[error("expression error in slot '{slot}', axis '{axis}': {source}")]
    Expression {
        /// Slot whose dimensions failed to resolve.
        slot: String,
        /// Axis being evaluated (`x`, `y`, `z`, `w` or `h`).
        axis: &'static str,
        /// Underlying parse/evaluation failure.
        #[source]
        source: ExprError,
    },

    /// Fill/crop placement could not be computed.
    #[error("layout error in slot '{slot}': {source}")]
    Layout {
        /// Slot whose placement failed.
        slot: String,
        /// Underlying layout failure.
        #[source]
        source: LayoutError,
    },

    /// A media stream or image asset could not be obtained.
    #[error("acquisition error for '{name}': {message}")]
    Acquisition {
        /// Slot, device or asset name.
        name: String,
        /// Human readable reason.
        message: String,
    },

    /// The compositor or audio mixer rejected a call.
    #[error(transparent)]
    Compositor(#[from] CompositorError),

    /// `refresh_current_scene` (or another scene-relative operation) was called before any
    /// scene was applied.
    #[error("no active scene: apply a scene before refreshing or toggling it")]
    NoActiveScene,

    /// The broadcast session was already torn down.
    #[error("session ended: no further scene operations are accepted")]
    SessionEnded,

    /// Invalid session configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Acquisition`] value.
    pub fn acquisition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Build a [`SceneError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a compositor "not found" report.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Compositor(CompositorError::NotFound(_)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
