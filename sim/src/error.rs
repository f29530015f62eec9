use thiserror::Error;

use crate::config::ConfigError;
use crate::shapes::PieceKind;

/// Failure while turning a configuration into a running scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("degenerate {kind:?} outline: {reason}")]
    DegenerateShape { kind: PieceKind, reason: String },
}
