/// Possible model errors.
#[derive(Debug)]
pub enum ModelError {
    /// The inputs don't share a single scalar-or-vector shape
    ShapeMismatch,
    /// A physical quantity is outside its documented domain
    OutOfRange(&'static str),
    /// `mu0` is neither length 1 nor the scenario count
    ScenarioMismatch,
    /// A structured input file doesn't match a recognized layout
    FileFormat,
    /// An I/O error while reading an input file
    Io(std::io::Error),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ShapeMismatch => {
                write!(f, "size mismatch among input arguments")
            }
            ModelError::OutOfRange(what) => write!(f, "{what} out of range"),
            ModelError::ScenarioMismatch => {
                write!(f, "mismatch in shapes of 'mu0' and the scenario count")
            }
            ModelError::FileFormat => write!(f, "invalid file format"),
            ModelError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}
