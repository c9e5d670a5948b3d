//! Wire protocol for the control socket
//!
//! Requests are `command|argument[|argument]` strings terminated by
//! [`DELIMITER`]:
//!
//! - `add-r|<path>`                - recursive add
//! - `add-x|<path>`                - non-recursive add
//! - `del|<path>`                  - delete a watch
//! - `listLocal|`                  - dump watched directories and files
//! - `listRemote|`                 - list remote objects, resolved to paths
//! - `download|<target>[|<sel>]`   - download into `<target>`, optionally
//!   selecting by hash or exact path

use std::path::PathBuf;

use thiserror::Error;

/// Terminator for both requests and responses
pub const DELIMITER: char = ';';

/// Maximum accepted request length in bytes
pub const MAX_REQUEST_LEN: usize = 2048;

/// Errors raised while parsing a control request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
}

/// A parsed administrative command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddWatch { path: PathBuf, recursive: bool },
    DelWatch { path: PathBuf },
    ListLocal,
    ListRemote,
    Download {
        target: PathBuf,
        selector: Option<String>,
    },
}

impl Command {
    /// Parse a request string (delimiter already stripped).
    pub fn parse(request: &str) -> Result<Self, ProtocolError> {
        let mut parts = request.splitn(3, '|');
        let command = parts.next().unwrap_or_default();
        let first = parts.next();
        let second = parts.next();

        match command {
            "add-r" | "add-x" => {
                let path = non_empty(first).ok_or(ProtocolError::MissingArgument("add"))?;
                Ok(Self::AddWatch {
                    path: PathBuf::from(path),
                    recursive: command == "add-r",
                })
            }
            "del" => {
                let path = non_empty(first).ok_or(ProtocolError::MissingArgument("del"))?;
                Ok(Self::DelWatch {
                    path: PathBuf::from(path),
                })
            }
            "listLocal" => Ok(Self::ListLocal),
            "listRemote" => Ok(Self::ListRemote),
            "download" => {
                let target =
                    non_empty(first).ok_or(ProtocolError::MissingArgument("download"))?;
                Ok(Self::Download {
                    target: PathBuf::from(target),
                    selector: non_empty(second).map(ToString::to_string),
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// Render back into the wire form (without the delimiter).
    #[must_use]
    pub fn to_request(&self) -> String {
        match self {
            Self::AddWatch { path, recursive } => {
                let prefix = if *recursive { "add-r" } else { "add-x" };
                format!("{prefix}|{}", path.display())
            }
            Self::DelWatch { path } => format!("del|{}", path.display()),
            Self::ListLocal => "listLocal|".to_string(),
            Self::ListRemote => "listRemote|".to_string(),
            Self::Download { target, selector } => match selector {
                Some(selector) => format!("download|{}|{selector}", target.display()),
                None => format!("download|{}", target.display()),
            },
        }
    }
}

fn non_empty(part: Option<&str>) -> Option<&str> {
    part.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recursive_add() {
        assert_eq!(
            Command::parse("add-r|/home/user/docs").unwrap(),
            Command::AddWatch {
                path: PathBuf::from("/home/user/docs"),
                recursive: true
            }
        );
    }

    #[test]
    fn test_parse_plain_add() {
        assert_eq!(
            Command::parse("add-x|/home/user/notes.txt").unwrap(),
            Command::AddWatch {
                path: PathBuf::from("/home/user/notes.txt"),
                recursive: false
            }
        );
    }

    #[test]
    fn test_parse_del() {
        assert_eq!(
            Command::parse("del|/home/user/docs").unwrap(),
            Command::DelWatch {
                path: PathBuf::from("/home/user/docs")
            }
        );
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(Command::parse("listLocal|").unwrap(), Command::ListLocal);
        assert_eq!(Command::parse("listRemote|").unwrap(), Command::ListRemote);
    }

    #[test]
    fn test_parse_download_with_selector() {
        assert_eq!(
            Command::parse("download|/restore/here|deadbeef").unwrap(),
            Command::Download {
                target: PathBuf::from("/restore/here"),
                selector: Some("deadbeef".to_string())
            }
        );
    }

    #[test]
    fn test_parse_download_without_selector() {
        assert_eq!(
            Command::parse("download|/restore/here").unwrap(),
            Command::Download {
                target: PathBuf::from("/restore/here"),
                selector: None
            }
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        assert_eq!(
            Command::parse("add-r|"),
            Err(ProtocolError::MissingArgument("add"))
        );
        assert_eq!(
            Command::parse("del|"),
            Err(ProtocolError::MissingArgument("del"))
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            Command::parse("explode|now"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_roundtrip() {
        for request in [
            "add-r|/a",
            "add-x|/b",
            "del|/c",
            "listLocal|",
            "listRemote|",
            "download|/t",
            "download|/t|abc",
        ] {
            let command = Command::parse(request).unwrap();
            assert_eq!(command.to_request(), request);
        }
    }
}
