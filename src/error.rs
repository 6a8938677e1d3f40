use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config Parse Error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid Config: {0}")]
    Config(String),

    #[error("Frame Size Mismatch: expected {expected:?}, got {got:?}")]
    FrameSize {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Image Shape Error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "video")]
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),
}
