//! Error taxonomy for the compiler crate.
//!
//! Mirrors the corpus convention of `thiserror`-derived enums at the
//! library boundary: lexical, syntactic and semantic failures are
//! distinct variants rather than one catch-all string.

use crate::token::TokenKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unknown token: {0:?}")]
    UnknownCharacter(char),

    #[error("expected !=, got !{0}")]
    MalformedNotEqual(char),

    #[error("forbidden character in string literal: {0:?}")]
    ForbiddenCharInString(char),

    #[error("malformed number: '.' must be followed by a digit")]
    MalformedNumber,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, got {found}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },

    #[error("expected number or identifier, got {found}")]
    ExpectedPrimary { found: TokenKind },

    #[error("expected a comparator, got {found}")]
    ExpectedComparator { found: TokenKind },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("symbol '{0}' is already declared")]
    DuplicateVariable(String),

    #[error("label '{0}' already exists")]
    DuplicateLabel(String),

    #[error("function '{0}' already exists")]
    DuplicateFunction(String),

    #[error("function parameter '{0}' already exists")]
    DuplicateParameter(String),

    #[error("symbol '{0}' does not exist")]
    UndeclaredVariable(String),

    #[error("function '{0}' does not exist")]
    UndeclaredFunction(String),

    #[error("attempting to GOTO undeclared label '{0}'")]
    UndeclaredLabel(String),

    #[error("cannot define a function inside of a function")]
    NestedFunction,

    #[error("cannot put a label inside a function")]
    LabelInsideFunction,

    #[error(
        "function '{function}' expects {expected} parameter(s), got {found}"
    )]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("function '{0}' expects arguments")]
    MissingWithClause(String),

    #[error("function parameter '{0}' exists outside of the function")]
    ParameterShadowsVariable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}
