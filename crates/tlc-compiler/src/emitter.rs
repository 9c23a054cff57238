//! Four append-only text buffers, concatenated at flush time.

/// The fully assembled AArch64 source text, ready to be written to disk by
/// the caller. Kept separate from the `Emitter` itself so the library
/// crate never touches the filesystem directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly(String);

impl Assembly {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects generated assembly lines into four ordered text regions.
///
/// There is no ordering constraint between the regions while emitting —
/// only at `into_assembly()` is the concatenation order fixed.
#[derive(Default)]
pub struct Emitter {
    header: String,
    code: String,
    functions: String,
    data: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, text: &str) {
        self.code.push_str(text);
    }

    pub fn emit_line(&mut self, line: &str) {
        self.code.push_str(line);
        self.code.push('\n');
    }

    pub fn header_line(&mut self, line: &str) {
        self.header.push_str(line);
        self.header.push('\n');
    }

    pub fn function_line(&mut self, line: &str) {
        self.functions.push_str(line);
        self.functions.push('\n');
    }

    pub fn data_line(&mut self, line: &str) {
        self.data.push_str(line);
        self.data.push('\n');
    }

    /// Concatenates `header ‖ code ‖ functions ‖ "\n\t.data\n" ‖ data` into
    /// the final assembly text.
    pub fn into_assembly(self) -> Assembly {
        let mut out = String::with_capacity(
            self.header.len() + self.code.len() + self.functions.len() + self.data.len() + 16,
        );
        out.push_str(&self.header);
        out.push_str(&self.code);
        out.push_str(&self.functions);
        out.push_str("\n\t.data\n");
        out.push_str(&self.data);
        out.into()
    }
}

// `into_assembly` builds a plain `String`; wrap it so callers see the
// dedicated `Assembly` type while the buffer logic above stays simple.
impl From<String> for Assembly {
    fn from(s: String) -> Self {
        Assembly(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_order_is_fixed_at_flush() {
        let mut e = Emitter::new();
        e.data_line("V0: .quad 0");
        e.function_line("FUNC0:");
        e.emit_line("mov x8, #93");
        e.header_line(".global _start");

        let asm = e.into_assembly();
        let text = asm.as_str();

        let header_pos = text.find(".global _start").unwrap();
        let code_pos = text.find("mov x8, #93").unwrap();
        let functions_pos = text.find("FUNC0:").unwrap();
        let data_pos = text.find("V0: .quad 0").unwrap();

        assert!(header_pos < code_pos);
        assert!(code_pos < functions_pos);
        assert!(functions_pos < data_pos);
        assert!(text.contains("\n\t.data\n"));
    }
}
