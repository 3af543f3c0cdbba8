use thiserror::Error;

#[derive(Error, Debug)]
pub enum RbpMapsError {
    #[error("Strand must be '+' or '-', found: '{0}'")]
    InvalidStrand(String),

    #[error("Chromosome not found in signal source: {0}")]
    MissingChromosome(String),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Cannot normalize by zero events")]
    DivisionByZero,

    #[error("Malformed feature: {0}")]
    MalformedFeature(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RbpMapsError>;
