use std::str::FromStr;

use crate::catalog::FieldKind;
use crate::cli::CliError;
use crate::data_types::DatabaseId;

/// Commands available inside the CLI
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    ListSources,
    UseSource(String),
    Register,
    ListDatabases,
    Connect(DatabaseId),
    Describe(Option<DatabaseId>),
    SetDescription {
        kind: FieldKind,
        /// An ID, or a name to look up in the current database
        target: String,
        description: String,
    },
}

pub fn all_commands_info() -> Vec<(&'static str, &'static str)> {
    vec![
        ("\\q", "Quit"),
        ("\\?", "Show this help"),
        ("\\sources", "List configured sources"),
        ("\\use <source>", "Switch to a source"),
        ("\\register", "Register the current source's schema"),
        ("\\l", "List registered databases"),
        ("\\c <id>", "Ask questions against a registered database"),
        ("\\d [id]", "Show a database's schema"),
        (
            "\\describe <database|table|column> <id|name> <text>",
            "Set a description",
        ),
        ("<question>", "Translate a question to SQL and run it"),
    ]
}

fn parse_id(value: &str) -> Result<i64, CliError> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("{value:?} is not a valid ID")))
}

fn parse_set_description(args: &str) -> Result<Command, CliError> {
    let mut parts = args.splitn(3, char::is_whitespace);
    let (Some(kind), Some(target), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CliError::InvalidArgument(
            "Usage: \\describe <database|table|column> <id|name> <text>".to_string(),
        ));
    };

    Ok(Command::SetDescription {
        kind: FieldKind::parse(kind).map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        target: target.to_string(),
        description: description.trim().to_string(),
    })
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (c, arg) = if let Some((a, b)) = s.split_once(char::is_whitespace) {
            (a, Some(b.trim()))
        } else {
            (s, None)
        };
        Ok(match (c, arg) {
            ("q", None) | ("quit", None) => Self::Quit,
            ("?", None) => Self::Help,
            ("sources", None) => Self::ListSources,
            ("use", Some(name)) => Self::UseSource(name.into()),
            ("register", None) => Self::Register,
            ("l", None) => Self::ListDatabases,
            ("c", Some(id)) => Self::Connect(parse_id(id)?),
            ("d", None) => Self::Describe(None),
            ("d", Some(id)) => Self::Describe(Some(parse_id(id)?)),
            ("describe", Some(args)) => parse_set_description(args)?,
            _ => return Err(CliError::InvalidCommand(s.to_string())),
        })
    }
}
