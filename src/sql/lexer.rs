use crate::DatabaseError;

/// A token of the command language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word: keyword, name, column spec or unquoted value.
    Word(String),

    /// Text that was wrapped in single or double quotes, quotes removed.
    Quoted(String),

    Equal,
    Comma,
    LeftParen,
    RightParen,
}

impl Token {
    /// The token's text when it can stand for a value.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Token::Word(text) | Token::Quoted(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(word) => write!(f, "{word}"),
            Token::Quoted(text) => write!(f, "\"{text}\""),
            Token::Equal => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Splits a command line into tokens.
///
/// Whitespace separates words; quotes group text; `=`, `,`, `(` and `)` are
/// tokens of their own outside quotes. Quoted and bare pieces with nothing
/// between them form one token, which counts as quoted.
pub(crate) struct Lexer<'a> {
    rest: &'a str,
    position: usize,
}

fn is_punctuation(c: char) -> bool {
    matches!(c, '=' | ',' | '(' | ')')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            position: 0,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.position += bytes;
        self.rest = &self.rest[bytes..];
    }

    fn skip_whitespace(&mut self) {
        let non_whitespace_pos = self
            .rest
            .char_indices()
            .find(|(_, ch)| !ch.is_whitespace())
            .map(|(pos, _)| pos)
            .unwrap_or(self.rest.len());

        self.advance(non_whitespace_pos);
    }

    fn consume_word(&mut self) -> &'a str {
        let word_end = self
            .rest
            .find(|c: char| c.is_whitespace() || is_punctuation(c) || c == '"' || c == '\'')
            .unwrap_or(self.rest.len());

        let word = &self.rest[..word_end];
        self.advance(word_end);
        word
    }

    fn consume_string(&mut self, closing: char) -> Result<&'a str, DatabaseError> {
        let start = self.position;
        let body = &self.rest[closing.len_utf8()..];

        let Some(end) = body.find(closing) else {
            return Err(DatabaseError::InvalidCommand(format!(
                "unterminated quote starting at position {start}"
            )));
        };

        let text = &body[..end];
        self.advance(closing.len_utf8() * 2 + end);
        Ok(text)
    }

    /// Reads bare and quoted pieces up to the next separator and joins them,
    /// so `ab"c d"` is the single text `abc d`.
    fn consume_text(&mut self) -> Result<Token, DatabaseError> {
        let mut text = String::new();
        let mut quoted = false;

        while let Some(c) = self.rest.chars().next() {
            if c == '"' || c == '\'' {
                text.push_str(self.consume_string(c)?);
                quoted = true;
            } else if c.is_whitespace() || is_punctuation(c) {
                break;
            } else {
                text.push_str(self.consume_word());
            }
        }

        Ok(if quoted {
            Token::Quoted(text)
        } else {
            Token::Word(text)
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();

        let char = self.rest.chars().next()?;

        let token = match char {
            '=' => Ok(Token::Equal),
            ',' => Ok(Token::Comma),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),
            _ => return Some(self.consume_text()),
        };

        self.advance(char.len_utf8());
        Some(token)
    }
}

/// Tokenizes a whole line.
pub fn tokenize(input: &str) -> Result<Vec<Token>, DatabaseError> {
    Lexer::new(input).collect()
}
