use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectraError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Grid dimension mismatch: {0}")]
    GridMismatch(String),

    #[error("Farm {farm}: {problem}")]
    InvalidFarm { farm: usize, problem: String },

    #[error("Movement link {link}: {problem}")]
    InvalidMovementLink { link: usize, problem: String },
}

pub type Result<T> = std::result::Result<T, VectraError>;
