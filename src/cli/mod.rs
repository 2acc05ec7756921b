mod commands;

use std::io::Write;

use itertools::Itertools;
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::debug;

use crate::handler::{DatabaseHandler, HandlerError};
use commands::{all_commands_info, Command};

const HISTORY_FILE: &str = ".history";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("'\\{0}' is not a valid command")]
    InvalidCommand(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("Error writing output: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Handler(HandlerError::Render(err))
    }
}

/// What a single line of input produced
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Quit,
    Output(String),
}

pub struct SqltalkCli {
    handler: DatabaseHandler,
}

impl SqltalkCli {
    // Instantiate new CLI instance
    pub fn new(handler: DatabaseHandler) -> Self {
        SqltalkCli { handler }
    }

    fn prompt(&self) -> String {
        format!("{}> ", self.handler.current_source().unwrap_or("sqltalk"))
    }

    // Interactive loop for running commands from a CLI
    pub async fn repl_loop(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        rl.load_history(HISTORY_FILE).ok();

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.trim_end())?;
                    }

                    match self.execute(&line).await {
                        Ok(Reply::Quit) => break,
                        Ok(Reply::Output(output)) if output.is_empty() => {}
                        Ok(Reply::Output(output)) => println!("{output}"),
                        Err(err) => eprintln!("{err}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\\q");
                    break;
                }
                Err(err) => {
                    eprintln!("Error while reading input: {err:?}",);
                    break;
                }
            }
        }

        rl.save_history(HISTORY_FILE)
    }

    /// Run one line of input: a backslash command or a question.
    pub async fn execute(&mut self, line: &str) -> Result<Reply, CliError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Reply::Output(String::new()));
        }

        let Some(command) = line.strip_prefix('\\') else {
            return self.ask(line).await.map(Reply::Output);
        };

        let command = command.parse::<Command>()?;
        debug!(?command, "Running command");
        self.handle_command(command).await
    }

    // Handle a client command
    async fn handle_command(&mut self, cmd: Command) -> Result<Reply, CliError> {
        let output = match cmd {
            Command::Quit => return Ok(Reply::Quit),
            Command::Help => all_commands_info()
                .into_iter()
                .map(|(command, help)| format!("{command:<48} {help}"))
                .join("\n"),
            Command::ListSources => {
                let current = self.handler.current_source();
                self.handler
                    .sources()
                    .map(|(name, source)| {
                        let marker = if Some(name) == current { '*' } else { ' ' };
                        format!("{marker} {name} ({})", source.driver())
                    })
                    .join("\n")
            }
            Command::UseSource(name) => {
                self.handler.switch_source(&name)?;
                format!("Using source {name}")
            }
            Command::Register => {
                let id = self.handler.register_database().await?;
                format!("Registered database {id}")
            }
            Command::ListDatabases => {
                let databases = self.handler.databases()?;
                if databases.is_empty() {
                    "No databases registered".to_string()
                } else {
                    databases
                        .iter()
                        .map(|db| {
                            format!(
                                "{}\t{}\t{} tables\t{}",
                                db.id.unwrap_or_default(),
                                db.name,
                                db.tables.len(),
                                db.description
                            )
                        })
                        .join("\n")
                }
            }
            Command::Connect(id) => {
                let database = self.handler.choose_database(id)?;
                format!("Connected to database {id} ({})", database.name)
            }
            Command::Describe(Some(id)) => self.handler.database(id)?.schema_text()?,
            Command::Describe(None) => self
                .handler
                .current_database()
                .ok_or(HandlerError::NotConnected)?
                .schema_text()?,
            Command::SetDescription {
                kind,
                target,
                description,
            } => {
                let id = self.handler.resolve_field(kind, &target)?;
                self.handler.set_description(&description, id, kind)?;
                "Description updated".to_string()
            }
        };

        Ok(Reply::Output(output))
    }

    async fn ask(&self, question: &str) -> Result<String, CliError> {
        let outcome = self.handler.query(question).await?;
        Ok(format!("SQL: {}\n{}", outcome.sql, outcome.rows_json()?))
    }

    /// Run commands separated by semicolons and write their output to a
    /// writer, stopping at the first failure.
    pub async fn run_one_off<W>(&mut self, commands: &str, mut output: W) -> Result<(), CliError>
    where
        W: Write,
    {
        // Splitting on the semicolon means a question can't contain one
        for line in commands.split(';') {
            if line.trim().is_empty() {
                continue;
            }
            match self.execute(line).await? {
                Reply::Quit => break,
                Reply::Output(text) if text.is_empty() => {}
                Reply::Output(text) => writeln!(output, "{text}")?,
            }
        }
        Ok(())
    }
}
