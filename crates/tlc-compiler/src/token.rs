//! Token kinds and the keyword table.

/// The closed set of token kinds the lexer can produce.
///
/// `Invalid` from the original taxonomy has no variant here — lexical
/// failures are surfaced through `Result<Token, LexError>` instead of a
/// sentinel token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    End,
    Newline,
    Number,
    String,
    Identifier,

    // Keywords
    Int,
    Float,
    Text,
    If,
    Then,
    Else,
    EndIf,
    While,
    Do,
    EndWhile,
    Func,
    Is,
    Using,
    With,
    EndFunc,
    Print,
    Label,
    Goto,

    // Operators and comparators
    Eq,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Modulo,
    Gt,
    Lt,
    GtEq,
    LtEq,
    EqEq,
    Neq,
    Comma,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A lexed token: the matched source text plus its classified kind.
///
/// Tokens are ephemeral — only the parser's `cur`/`peek` pair is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Maps a maximal alphanumeric run to a keyword kind, if it is one.
///
/// The keyword set is case-sensitive and uppercase-only; anything else
/// (including a case-folded keyword like `int`) is an ordinary identifier.
pub fn keyword(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "INT" => Int,
        "FLOAT" => Float,
        "TEXT" => Text,
        "IF" => If,
        "THEN" => Then,
        "ELSE" => Else,
        "ENDIF" => EndIf,
        "WHILE" => While,
        "DO" => Do,
        "ENDWHILE" => EndWhile,
        "FUNC" => Func,
        "IS" => Is,
        "USING" => Using,
        "WITH" => With,
        "ENDFUNC" => EndFunc,
        "PRINT" => Print,
        "LABEL" => Label,
        "GOTO" => Goto,
        _ => return None,
    })
}
