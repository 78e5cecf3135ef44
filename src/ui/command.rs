//! Operator command line
//!
//! ```text
//! cr <pid> <size> [scheme]   create an allocation
//! dl <pid>                   delete an allocation
//! cv <scheme>                convert to another placement scheme
//! tr <pid> <address>         translate a process-relative address
//! r                          refresh now
//! q                          quit
//! ```

use crate::model::{ProcessId, Scheme};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        pid: ProcessId,
        size: u64,
        strategy: Option<Scheme>,
    },
    Delete {
        pid: ProcessId,
    },
    Convert {
        scheme: Scheme,
    },
    Translate {
        pid: ProcessId,
        address: u64,
    },
    Refresh,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try cr, dl, cv, tr, r, q)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a non-negative integer")]
    InvalidNumber(String),
}

const CREATE_USAGE: &str = "cr <pid> <size> [scheme]";
const DELETE_USAGE: &str = "dl <pid>";
const CONVERT_USAGE: &str = "cv <scheme>";
const TRANSLATE_USAGE: &str = "tr <pid> <address>";

pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = input.split_whitespace().collect();
    let (name, args) = words.split_first().ok_or(CommandError::Empty)?;

    match name.to_ascii_lowercase().as_str() {
        "cr" | "create" => match args {
            [pid, size] => Ok(Command::Create {
                pid: ProcessId(number(pid)?),
                size: number(size)?,
                strategy: None,
            }),
            [pid, size, scheme] => Ok(Command::Create {
                pid: ProcessId(number(pid)?),
                size: number(size)?,
                strategy: Some(Scheme::from_label(scheme)),
            }),
            _ => Err(CommandError::Usage(CREATE_USAGE)),
        },
        "dl" | "delete" => match args {
            [pid] => Ok(Command::Delete {
                pid: ProcessId(number(pid)?),
            }),
            _ => Err(CommandError::Usage(DELETE_USAGE)),
        },
        "cv" | "convert" => {
            if args.is_empty() {
                return Err(CommandError::Usage(CONVERT_USAGE));
            }
            Ok(Command::Convert {
                scheme: Scheme::from_label(&args.join(" ")),
            })
        }
        "tr" | "translate" => match args {
            [pid, address] => Ok(Command::Translate {
                pid: ProcessId(number(pid)?),
                address: number(address)?,
            }),
            _ => Err(CommandError::Usage(TRANSLATE_USAGE)),
        },
        "r" | "refresh" if args.is_empty() => Ok(Command::Refresh),
        "q" | "quit" if args.is_empty() => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn number(word: &str) -> Result<u64, CommandError> {
    word.parse()
        .map_err(|_| CommandError::InvalidNumber(word.to_string()))
}
