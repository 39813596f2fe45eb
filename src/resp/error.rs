use std::fmt;

/// The error taxonomy for the wire layer: malformed leading bytes, missing
/// CRLF terminators, structural/semantic syntax violations, I/O failures,
/// and the cooperative-shutdown signal observed at the top of the
/// connection loop.
#[derive(Debug)]
pub enum RespError {
    UnexpectedLeading { expected: u8, actual: u8 },
    UnexpectedTailing,
    Syntax(String),
    Io(std::io::Error),
    ServerStop,
}

impl fmt::Display for RespError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespError::UnexpectedLeading { expected, actual } => write!(
                f,
                "unexpected leading byte expected={}('{}') actual={}('{}')",
                expected, *expected as char, actual, *actual as char
            ),
            RespError::UnexpectedTailing => {
                write!(f, "unexpected tailing, CRLF not found where required")
            }
            RespError::Syntax(msg) => write!(f, "syntax error: {}", msg),
            RespError::Io(err) => write!(f, "i/o error: {}", err),
            RespError::ServerStop => write!(f, "server is stopping"),
        }
    }
}

impl std::error::Error for RespError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RespError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RespError {
    fn from(err: std::io::Error) -> Self {
        RespError::Io(err)
    }
}

pub type RespResult<T> = Result<T, RespError>;
