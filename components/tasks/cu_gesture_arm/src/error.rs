use crate::gesture::GestureName;
use thiserror::Error;

/// Everything the arm core can report as a failure.
///
/// Out-of-range angles are not in here: they are clamped silently.
#[derive(Debug, Error)]
pub enum ArmError {
    #[error("gesture `{active}` is still playing, request rejected")]
    Busy { active: GestureName },

    #[error("unrecognized command `{0}`")]
    UnknownCommand(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] ron::de::SpannedError),

    #[error("could not serialize configuration: {0}")]
    ConfigWrite(#[from] ron::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ArmResult<T> = Result<T, ArmError>;
