//! Single-pass compiler from TinyLang source to AArch64 assembly text.
//!
//! There is no AST and no intermediate representation: [`compile`] lexes,
//! parses and emits in one pass, producing an [`Assembly`] ready to be
//! assembled and linked as a bare-metal `_start` binary (no libc, syscalls
//! issued directly via `svc #0`).
//!
//! ```
//! let asm = tlc_compiler::compile("PRINT \"hello\"\n").unwrap();
//! assert!(asm.as_str().contains("_start:"));
//! ```

mod emitter;
mod error;
mod lexer;
mod parser;
mod symbols;
mod token;

pub use emitter::Assembly;
pub use error::{CompileError, LexError, ParseError, SemanticError};
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// Compiles `source` to AArch64 assembly text.
pub fn compile(source: &str) -> Result<Assembly, CompileError> {
    Parser::new(source)?.compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_still_produces_a_runnable_entry_point() {
        let asm = compile("").unwrap();
        let text = asm.as_str();
        assert!(text.contains(".global _start"));
        assert!(text.contains("_start:"));
        assert!(text.contains("mov x8, #93"));
        assert!(text.contains("svc #0"));
    }

    #[test]
    fn lexical_errors_surface_as_compile_errors() {
        let err = compile("INT x = @\n").unwrap_err();
        assert!(matches!(err, CompileError::Lex(LexError::UnknownCharacter('@'))));
    }
}
