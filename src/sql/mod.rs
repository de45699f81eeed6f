pub(crate) mod keyword;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod predicate;
