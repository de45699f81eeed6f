use std::{iter::Peekable, str::FromStr};

use crate::{
    DatabaseError, Schema, Value,
    catalog::normalize_name,
    core::types::{BooleanMode, validate_value_with},
    sql::{
        keyword::Keyword,
        lexer::{Lexer, Token},
        predicate::{Assignments, Predicate},
    },
};

/// A parsed command, still holding raw (untyped) values.
///
/// Values are typed later against the target table's schema, since only the
/// schema knows what each column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTable { table: String, columns: Vec<String> },
    DropTable { table: String },
    ListTables,
    Insert { table: String, values: Vec<String> },
    Select { table: String, filter: Option<Clause> },
    Update { table: String, set: Clause, filter: Option<Clause> },
    Delete { table: String, filter: Clause },
    Info { table: String },
    Help,
    Exit,
}

impl Command {
    /// The keyword that introduced this command.
    pub fn verb(&self) -> Keyword {
        match self {
            Command::CreateTable { .. } => Keyword::CreateTable,
            Command::DropTable { .. } => Keyword::DropTable,
            Command::ListTables => Keyword::ListTables,
            Command::Insert { .. } => Keyword::Insert,
            Command::Select { .. } => Keyword::Select,
            Command::Update { .. } => Keyword::Update,
            Command::Delete { .. } => Keyword::Delete,
            Command::Info { .. } => Keyword::Info,
            Command::Help => Keyword::Help,
            Command::Exit => Keyword::Exit,
        }
    }
}

/// One `<column> = <value>` pair from a WHERE or SET clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Lowercased column name.
    pub column: String,
    /// The raw value text.
    pub value: String,
}

impl Clause {
    pub fn new(column: &str, value: &str) -> Self {
        Self {
            column: normalize_name(column),
            value: value.to_owned(),
        }
    }

    /// Parses exactly `<column> = <value>`.
    pub fn parse(tokens: &[Token], clause: &'static str) -> Result<Self, DatabaseError> {
        if let [Token::Word(column), Token::Equal, value] = tokens
            && let Some(value) = value.as_value()
        {
            return Ok(Self::new(column, value));
        }

        let found = if tokens.is_empty() {
            String::from("nothing")
        } else {
            tokens
                .iter()
                .map(Token::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };

        Err(DatabaseError::MalformedPredicate {
            clause,
            reason: format!("expected `<column> = <value>`, found `{found}`"),
        })
    }

    /// Types the value against `schema` and builds a WHERE predicate.
    pub fn to_predicate(
        &self,
        table: &str,
        schema: &Schema,
        mode: BooleanMode,
    ) -> Result<Predicate, DatabaseError> {
        Ok(Predicate::equals(&self.column, self.typed_value(table, schema, mode)?))
    }

    /// Types the value against `schema` and builds a SET assignment.
    pub fn to_assignments(
        &self,
        table: &str,
        schema: &Schema,
        mode: BooleanMode,
    ) -> Result<Assignments, DatabaseError> {
        Ok(Assignments::set(&self.column, self.typed_value(table, schema, mode)?))
    }

    fn typed_value(
        &self,
        table: &str,
        schema: &Schema,
        mode: BooleanMode,
    ) -> Result<Value, DatabaseError> {
        let column = schema
            .column(&self.column)
            .ok_or_else(|| DatabaseError::UnknownColumn {
                table: table.to_owned(),
                column: self.column.clone(),
            })?;

        validate_value_with(&self.value, column.data_type, mode)
    }
}

/// Recursive-descent parser over the token stream of one command line.
pub struct CommandParser<'src> {
    lexer: Peekable<Lexer<'src>>,
}

impl<'src> CommandParser<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// Parses the whole line into a [`Command`].
    pub fn parse(&mut self) -> Result<Command, DatabaseError> {
        let verb = self.expect_verb()?;

        let command = match verb {
            Keyword::CreateTable => {
                let table = self.expect_name("table name")?;
                let columns = self.remaining_words()?;
                if columns.is_empty() {
                    return Err(DatabaseError::InvalidCommand(
                        "create_table <table> <column:type> [<column:type> ...]".to_string(),
                    ));
                }
                Command::CreateTable { table, columns }
            }
            Keyword::DropTable => Command::DropTable {
                table: self.expect_name("table name")?,
            },
            Keyword::ListTables => Command::ListTables,
            Keyword::Insert => {
                self.expect_keyword(Keyword::Into)?;
                let table = self.expect_name("table name")?;
                self.expect_keyword(Keyword::Values)?;
                let values = self.parse_value_list()?;
                Command::Insert { table, values }
            }
            Keyword::Select => {
                self.expect_keyword(Keyword::From)?;
                let table = self.expect_name("table name")?;
                let filter = self.parse_optional_where()?;
                Command::Select { table, filter }
            }
            Keyword::Update => {
                let table = self.expect_name("table name")?;
                self.expect_keyword(Keyword::Set)?;
                let set_tokens = self.take_until(Keyword::Where)?;
                let set = Clause::parse(&set_tokens, "SET")?;
                let filter = self.parse_optional_where()?;
                Command::Update { table, set, filter }
            }
            Keyword::Delete => {
                self.expect_keyword(Keyword::From)?;
                let table = self.expect_name("table name")?;
                let Some(filter) = self.parse_optional_where()? else {
                    return Err(DatabaseError::MalformedPredicate {
                        clause: "WHERE",
                        reason: "delete requires a WHERE clause".to_string(),
                    });
                };
                Command::Delete { table, filter }
            }
            Keyword::Info => Command::Info {
                table: self.expect_name("table name")?,
            },
            Keyword::Help => Command::Help,
            Keyword::Exit => Command::Exit,
            other => {
                return Err(DatabaseError::InvalidCommand(format!(
                    "`{}` cannot start a command",
                    other.as_ref()
                )));
            }
        };

        self.expect_end()?;
        Ok(command)
    }

    fn next_token(&mut self) -> Result<Option<Token>, DatabaseError> {
        self.lexer.next().transpose()
    }

    fn peek_keyword(&mut self, keyword: Keyword) -> bool {
        matches!(
            self.lexer.peek(),
            Some(Ok(Token::Word(word))) if Keyword::from_str(word).ok() == Some(keyword)
        )
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword(keyword) {
            self.lexer.next();
            true
        } else {
            false
        }
    }

    fn expect_verb(&mut self) -> Result<Keyword, DatabaseError> {
        match self.next_token()? {
            Some(Token::Word(word)) => Keyword::from_str(&word)
                .ok()
                .filter(|kw| kw.is_verb())
                .ok_or_else(|| DatabaseError::InvalidCommand(format!("unknown command `{word}`"))),
            Some(token) => Err(DatabaseError::InvalidCommand(format!(
                "unknown command `{token}`"
            ))),
            None => Err(DatabaseError::InvalidCommand("empty command".to_string())),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), DatabaseError> {
        if self.consume_keyword(keyword) {
            return Ok(());
        }

        let found = match self.next_token()? {
            Some(token) => format!("`{token}`"),
            None => String::from("end of input"),
        };
        Err(DatabaseError::InvalidCommand(format!(
            "expected `{}`, found {found}",
            keyword.as_ref()
        )))
    }

    fn expect_name(&mut self, what: &str) -> Result<String, DatabaseError> {
        match self.next_token()? {
            Some(Token::Word(word)) => Ok(word),
            Some(token) => Err(DatabaseError::InvalidCommand(format!(
                "expected {what}, found `{token}`"
            ))),
            None => Err(DatabaseError::InvalidCommand(format!("missing {what}"))),
        }
    }

    fn expect_end(&mut self) -> Result<(), DatabaseError> {
        match self.next_token()? {
            None => Ok(()),
            Some(token) => Err(DatabaseError::InvalidCommand(format!(
                "unexpected `{token}`"
            ))),
        }
    }

    fn remaining_words(&mut self) -> Result<Vec<String>, DatabaseError> {
        let mut words = Vec::new();
        while let Some(token) = self.next_token()? {
            match token {
                Token::Word(word) => words.push(word),
                other => {
                    return Err(DatabaseError::InvalidCommand(format!(
                        "unexpected `{other}`"
                    )));
                }
            }
        }
        Ok(words)
    }

    /// Collects tokens up to (not including) `keyword` or the end.
    fn take_until(&mut self, keyword: Keyword) -> Result<Vec<Token>, DatabaseError> {
        let mut tokens = Vec::new();
        while !self.peek_keyword(keyword) {
            match self.next_token()? {
                Some(token) => tokens.push(token),
                None => break,
            }
        }
        Ok(tokens)
    }

    fn parse_optional_where(&mut self) -> Result<Option<Clause>, DatabaseError> {
        if !self.consume_keyword(Keyword::Where) {
            return Ok(None);
        }

        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Clause::parse(&tokens, "WHERE").map(Some)
    }

    /// Parses `(<v1>, <v2> ...)`. Commas are optional, and so are the
    /// parentheses when the values run to the end of the line.
    fn parse_value_list(&mut self) -> Result<Vec<String>, DatabaseError> {
        let parenthesized = matches!(self.lexer.peek(), Some(Ok(Token::LeftParen)));
        if parenthesized {
            self.lexer.next();
        }

        let mut values = Vec::new();
        loop {
            match self.next_token()? {
                Some(Token::RightParen) if parenthesized => return Ok(values),
                Some(Token::Comma) => continue,
                Some(Token::Word(text) | Token::Quoted(text)) => values.push(text),
                Some(other) => {
                    return Err(DatabaseError::InvalidCommand(format!(
                        "unexpected `{other}` in values"
                    )));
                }
                None if parenthesized => {
                    return Err(DatabaseError::InvalidCommand(
                        "missing `)` after values".to_string(),
                    ));
                }
                None => return Ok(values),
            }
        }
    }
}

/// Parses one command line.
///
/// # Example
///
/// ```
/// use primdb::{Command, parse_command};
///
/// let command = parse_command("select from users where age = 30").unwrap();
/// assert!(matches!(command, Command::Select { ref table, filter: Some(_) } if table == "users"));
/// ```
pub fn parse_command(input: &str) -> Result<Command, DatabaseError> {
    CommandParser::new(input).parse()
}
