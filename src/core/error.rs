use std::fmt;

#[derive(Debug)]
pub enum ErrorKind {
    Io,
    Parse,
    Config,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<jieba_rs::Error> for Error {
    fn from(err: jieba_rs::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: format!("segmenter dictionary: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
