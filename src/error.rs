use crate::codec::FormId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("{subrecord}: expected {expected} bytes, got {actual}")]
    InvalidLength { subrecord: &'static str, expected: usize, actual: usize },

    #[error("{subrecord}: {len} bytes is not a multiple of the {stride}-byte entry size")]
    Misaligned { subrecord: &'static str, len: usize, stride: usize },

    #[error("missing {0} subrecord")]
    MissingSubrecord(&'static str),

    #[error("alpha position {position} outside the 17x17 quadrant")]
    AlphaPositionOutOfRange { position: u16 },

    #[error("landscape {0} not found")]
    LandscapeNotFound(FormId),

    #[error("landscape {form_id}: {source}")]
    Landscape { form_id: FormId, source: Box<Error> },

    #[error("io error: {0}")]
    Io(String),

    #[error("json error: {0}")]
    Json(String),

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

impl Error {
    /// Attach the landscape record the error came from
    pub fn in_landscape(self, form_id: FormId) -> Self {
        Error::Landscape { form_id, source: Box::new(self) }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
