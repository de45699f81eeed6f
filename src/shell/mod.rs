//! The interactive command layer.
//!
//! A [`Shell`] turns one input line into one response. Every command goes
//! through [`Shell::dispatch`], which wraps the handler with three layers:
//!
//! 1. confirmation for destructive verbs (`drop_table`, `delete`)
//! 2. timing
//! 3. error translation, so a failed command becomes a message instead of
//!    ending the session

use std::{fmt::Write, time::Instant};

use miette::Diagnostic;
use tracing::debug;

use crate::{
    Command, Database, DatabaseConfig, DatabaseError, DocumentStore, JsonFileStore, Keyword,
    parse_command,
};

pub mod format;

/// What the caller should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Print the message (if any) and read the next line.
    Continue(String),

    Exit,
}

/// Asks the user to approve a destructive command.
pub type Confirm = Box<dyn FnMut(&str) -> bool>;

/// Command loop state: the database plus the dispatch settings.
pub struct Shell<S: DocumentStore = JsonFileStore> {
    db: Database<S>,
    confirm: Confirm,
    confirm_destructive: bool,
    timing: bool,
}

impl<S: DocumentStore> Shell<S> {
    /// Creates a shell over `db`. Destructive commands are approved
    /// automatically until [`Shell::with_confirmation`] installs a prompt.
    pub fn new(db: Database<S>, config: &DatabaseConfig) -> Self {
        Self {
            db,
            confirm: Box::new(|_| true),
            confirm_destructive: config.confirm_destructive,
            timing: config.timing,
        }
    }

    pub fn with_confirmation(mut self, confirm: impl FnMut(&str) -> bool + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    pub fn database(&self) -> &Database<S> {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database<S> {
        &mut self.db
    }

    /// Parses and runs one input line.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue(String::new());
        }

        match parse_command(line) {
            Ok(Command::Exit) => Flow::Exit,
            Ok(command) => Flow::Continue(self.dispatch(command)),
            Err(err) => Flow::Continue(translate_error(&err)),
        }
    }

    /// Runs a command through confirmation, timing and error translation.
    pub fn dispatch(&mut self, command: Command) -> String {
        let verb = command.verb();

        if self.confirm_destructive
            && matches!(verb, Keyword::DropTable | Keyword::Delete)
            && !(self.confirm)(&format!(
                "Are you sure you want to run \"{}\"? [y/n]",
                verb.as_ref()
            ))
        {
            debug!(verb = verb.as_ref(), "command cancelled");
            return format!("Operation \"{}\" cancelled.", verb.as_ref());
        }

        let started = Instant::now();
        let mut output = match self.execute(command) {
            Ok(output) => output,
            Err(err) => translate_error(&err),
        };

        if self.timing {
            if !output.is_empty() {
                output.push('\n');
            }
            let _ = write!(
                output,
                "{} took {:.3}s",
                verb.as_ref(),
                started.elapsed().as_secs_f64()
            );
        }

        output
    }

    /// Runs a command and renders its success message.
    pub fn execute(&mut self, command: Command) -> Result<String, DatabaseError> {
        let mode = self.db.boolean_mode();

        match command {
            Command::CreateTable { table, columns } => {
                let schema = self.db.create_table(&table, &columns)?;
                Ok(format!(
                    "Table \"{}\" created with columns: {schema}.",
                    crate::normalize_name(&table)
                ))
            }
            Command::DropTable { table } => {
                self.db.drop_table(&table)?;
                Ok(format!("Table \"{}\" dropped.", crate::normalize_name(&table)))
            }
            Command::ListTables => Ok(format::render_table_list(&self.db.list_tables()?)),
            Command::Insert { table, values } => {
                let id = self.db.insert(&table, &values)?;
                Ok(format!(
                    "Record with ID={id} added to table \"{}\".",
                    crate::normalize_name(&table)
                ))
            }
            Command::Select { table, filter } => {
                let predicate = match filter {
                    Some(clause) => {
                        let schema = self.db.schema(&table)?;
                        Some(clause.to_predicate(&table, &schema, mode)?)
                    }
                    None => None,
                };
                let result = self.db.select(&table, predicate.as_ref())?;
                Ok(format::render_records(&result.schema, &result.records))
            }
            Command::Update { table, set, filter } => {
                let schema = self.db.schema(&table)?;
                let assignments = set.to_assignments(&table, &schema, mode)?;
                let predicate = filter
                    .map(|clause| clause.to_predicate(&table, &schema, mode))
                    .transpose()?;

                let ids = self.db.update(&table, &assignments, predicate.as_ref())?;
                let table = crate::normalize_name(&table);
                Ok(match ids.as_slice() {
                    [] => format!("No records in table \"{table}\" matched."),
                    [id] => format!("Record with ID={id} in table \"{table}\" updated."),
                    _ => format!("{} records in table \"{table}\" updated.", ids.len()),
                })
            }
            Command::Delete { table, filter } => {
                let schema = self.db.schema(&table)?;
                let predicate = filter.to_predicate(&table, &schema, mode)?;

                let removed = self.db.delete(&table, &predicate)?;
                let noun = if removed == 1 { "record" } else { "records" };
                Ok(format!(
                    "{removed} {noun} deleted from table \"{}\".",
                    crate::normalize_name(&table)
                ))
            }
            Command::Info { table } => Ok(format::render_table_info(&self.db.info(&table)?)),
            Command::Help => Ok(HELP.to_string()),
            Command::Exit => Ok(String::new()),
        }
    }
}

/// Turns an error into the message shown to the user, with its help line
/// when it has one.
pub fn translate_error(err: &DatabaseError) -> String {
    if let Some(code) = err.code() {
        debug!(%code, "command failed");
    }

    let mut message = format!("Error: {err}");
    if let Some(help) = err.help() {
        let _ = write!(message, "\n  help: {help}");
    }
    message
}

pub const HELP: &str = "\
Commands:
  create_table <table> <column:type> ...     create a table (types: int, str, bool)
  drop_table <table>                         delete a table and its records
  list_tables                                show all tables
  insert into <table> values (<v1>, ...)     add a record
  select from <table> [where <col> = <val>]  show records
  update <table> set <col> = <val> [where <col> = <val>]
  delete from <table> where <col> = <val>    remove records
  info <table>                               show a table's columns and size
  help                                       show this message
  exit                                       leave the program";

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::MemoryStore;

    fn quiet_config() -> DatabaseConfig {
        DatabaseConfig {
            timing: false,
            ..DatabaseConfig::default()
        }
    }

    fn shell() -> Shell<MemoryStore> {
        let config = quiet_config();
        Shell::new(Database::with_config(MemoryStore::new(), &config), &config)
    }

    fn run(shell: &mut Shell<MemoryStore>, line: &str) -> String {
        match shell.handle_line(line) {
            Flow::Continue(output) => output,
            Flow::Exit => panic!("unexpected exit on `{line}`"),
        }
    }

    #[test]
    fn test_session() {
        let mut shell = shell();

        assert_eq!(
            run(&mut shell, "create_table users name:str age:int"),
            "Table \"users\" created with columns: id:int, name:str, age:int."
        );
        assert_eq!(
            run(&mut shell, r#"insert into users values ("Ann", 30)"#),
            "Record with ID=1 added to table \"users\"."
        );
        run(&mut shell, "insert into users values (Bo, 25)");

        let out = run(&mut shell, "select from users where age = 30");
        assert!(out.contains("Ann"));
        assert!(!out.contains("Bo"));
        assert!(out.ends_with("(1 row)"));

        assert_eq!(
            run(&mut shell, "update users set age = 31 where name = Ann"),
            "Record with ID=1 in table \"users\" updated."
        );
        assert_eq!(
            run(&mut shell, "delete from users where id = 1"),
            "1 record deleted from table \"users\"."
        );
        assert_eq!(run(&mut shell, "list_tables"), "- users");
        assert_eq!(
            run(&mut shell, "info users"),
            "Table: users\nColumns: id:int, name:str, age:int\nRecords: 1"
        );
    }

    #[test]
    fn test_exit_and_blank_lines() {
        let mut shell = shell();
        assert_eq!(shell.handle_line("   "), Flow::Continue(String::new()));
        assert_eq!(shell.handle_line("EXIT"), Flow::Exit);
    }

    #[test]
    fn test_errors_are_translated() {
        let mut shell = shell();

        let out = run(&mut shell, "select from ghosts");
        assert!(out.starts_with("Error: Table \"ghosts\" does not exist"));
        assert!(out.contains("help: Run `list_tables`"));

        let out = run(&mut shell, "frobnicate");
        assert!(out.starts_with("Error:"));
    }

    #[test]
    fn test_invalid_value_leaves_table_untouched() {
        let mut shell = shell();
        run(&mut shell, "create_table users name:str age:int");

        let out = run(&mut shell, "insert into users values (Ann, thirty)");
        assert!(out.starts_with("Error:"));
        assert_eq!(shell.database().info("users").unwrap().record_count, 0);
    }

    #[test]
    fn test_declined_confirmation_cancels() {
        let config = quiet_config();
        let prompts = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&prompts);

        let mut shell = Shell::new(Database::with_config(MemoryStore::new(), &config), &config)
            .with_confirmation(move |prompt| {
                seen.borrow_mut().push(prompt.to_string());
                false
            });

        run(&mut shell, "create_table users name:str");
        assert_eq!(run(&mut shell, "drop_table users"), "Operation \"drop_table\" cancelled.");
        assert_eq!(shell.database().list_tables().unwrap(), vec!["users".to_string()]);

        assert_eq!(prompts.borrow().len(), 1);
        assert!(prompts.borrow()[0].contains("drop_table"));
    }

    #[test]
    fn test_confirmation_disabled_skips_prompt() {
        let config = DatabaseConfig {
            confirm_destructive: false,
            ..quiet_config()
        };
        let mut shell = Shell::new(Database::with_config(MemoryStore::new(), &config), &config)
            .with_confirmation(|_| panic!("should not prompt"));

        run(&mut shell, "create_table users name:str");
        assert_eq!(run(&mut shell, "drop_table users"), "Table \"users\" dropped.");
    }

    #[test]
    fn test_timing_is_reported() {
        let config = DatabaseConfig::default();
        let mut shell = Shell::new(Database::with_config(MemoryStore::new(), &config), &config);

        let out = run(&mut shell, "list_tables");
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("No tables."));
        assert!(lines.next().is_some_and(|line| line.starts_with("list_tables took ")));
    }

    #[test]
    fn test_update_identifier_is_rejected() {
        let mut shell = shell();
        run(&mut shell, "create_table users name:str");
        run(&mut shell, "insert into users values (Ann)");

        let out = run(&mut shell, "update users set id = 5 where name = Ann");
        assert!(out.starts_with("Error:"));
        assert!(run(&mut shell, "select from users where id = 1").contains("Ann"));
    }
}
