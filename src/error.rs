//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Spider crate error enum.
pub enum Error {
    /// Indicates node Id bytes of the wrong length.
    #[error("Invalid Id size, expected 20, got {0}")]
    InvalidIdSize(usize),
}
