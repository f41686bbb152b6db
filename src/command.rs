//! Administrative command scripts.
//!
//! A script is a csv file with a `command,account` header. `add` and `sub`
//! need the caller's account id; `version` and `flush` ignore it.

use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// An administrative operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report the program name and version.
    Version,
    /// Deposit one unit of the default currency into the caller's account.
    Add(Uuid),
    /// Withdraw one unit of the default currency from the caller's account.
    Sub(Uuid),
    /// Persist every account, then evict it from memory.
    Flush,
}

/// Errors that can occur when reading a command script
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("cannot open command script: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command '{command}'")]
    UnrecognizedCommand { line: usize, command: String },

    #[error("line {line}: {command} missing account")]
    MissingAccount { line: usize, command: String },

    #[error("line {line}: invalid account '{account}': {source}")]
    InvalidAccount {
        line: usize,
        account: String,
        source: uuid::Error,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    command: String,
    account: Option<String>,
}

/// Read commands from a csv file
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CommandError>>, CommandError> {
    let file = std::fs::File::open(path).map_err(|e| CommandError::Open(e.into()))?;
    Ok(read_commands_from(file))
}

/// Read commands from any csv source
pub fn read_commands_from<R: io::Read>(
    reader: R,
) -> impl Iterator<Item = Result<Command, CommandError>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CommandError::Parse { line, source })?;
            parse_row(line, row)
        })
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, CommandError> {
    let command = row.command.to_ascii_lowercase();
    match command.as_str() {
        "version" => Ok(Command::Version),
        "flush" => Ok(Command::Flush),
        "add" => Ok(Command::Add(account(line, &command, row.account)?)),
        "sub" | "subtract" => Ok(Command::Sub(account(line, &command, row.account)?)),
        _ => Err(CommandError::UnrecognizedCommand { line, command }),
    }
}

fn account(line: usize, command: &str, account: Option<String>) -> Result<Uuid, CommandError> {
    let account = account
        .filter(|account| !account.is_empty())
        .ok_or_else(|| CommandError::MissingAccount {
            line,
            command: command.to_string(),
        })?;
    Uuid::parse_str(&account).map_err(|source| CommandError::InvalidAccount {
        line,
        account,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STEVE: &str = "0b8f7c4e-3d2a-4a7b-9a61-5b2f4c0d9e11";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read(content: &str) -> Vec<Result<Command, CommandError>> {
        let file = write_csv(content);
        read_commands(file.path()).unwrap().collect()
    }

    #[test]
    fn read_add_and_sub() {
        let results = read(&format!("command,account\nadd,{STEVE}\nsub,{STEVE}\n"));
        let steve = Uuid::parse_str(STEVE).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(*results[0].as_ref().unwrap(), Command::Add(steve));
        assert_eq!(*results[1].as_ref().unwrap(), Command::Sub(steve));
    }

    #[test]
    fn read_commands_without_account() {
        let results = read("command,account\nversion,\nflush\n");
        assert_eq!(results.len(), 2);
        assert_eq!(*results[0].as_ref().unwrap(), Command::Version);
        assert_eq!(*results[1].as_ref().unwrap(), Command::Flush);
    }

    #[test]
    fn read_with_whitespace_and_case() {
        let results = read(&format!("command, account\n ADD , {STEVE}\n"));
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Ok(Command::Add(_))));
    }

    #[test]
    fn subtract_is_an_alias() {
        let results = read(&format!("command,account\nsubtract,{STEVE}\n"));
        assert!(matches!(results[0], Ok(Command::Sub(_))));
    }

    #[test]
    fn read_returns_error_for_unknown_command() {
        let results = read("command,account\njump,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CommandError::UnrecognizedCommand { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_account() {
        let results = read("command,account\nversion,\nadd,\n");
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(err, CommandError::MissingAccount { line: 3, .. }));
    }

    #[test]
    fn read_returns_error_for_invalid_account() {
        let results = read("command,account\nsub,steve\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CommandError::InvalidAccount { line: 2, .. }));
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(matches!(
            read_commands("does/not/exist.csv"),
            Err(CommandError::Open(_))
        ));
    }
}
