//! Insertion-only symbol, function, label and string-literal registries.
//!
//! Each table pairs a `HashMap<String, usize>` for O(1) existence/index
//! lookup with a `Vec<String>` that preserves insertion order, since that
//! order is what determines the minted `V<i>` / `FUNC<i>` / `S<i>` labels.

use std::collections::HashMap;

use crate::error::SemanticError;

/// The variable registry: `name -> V<index>`.
#[derive(Default)]
pub struct VariableTable {
    index: HashMap<String, usize>,
    order: Vec<String>,
}

impl VariableTable {
    pub fn declare(&mut self, name: &str) -> Result<usize, SemanticError> {
        if self.index.contains_key(name) {
            return Err(SemanticError::DuplicateVariable(name.to_string()));
        }
        let idx = self.order.len();
        self.order.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn label(index: usize) -> String {
        format!("V{index}")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The function registry: `name -> FUNC<index>`, plus each function's
/// ordered parameter names.
#[derive(Default)]
pub struct FunctionTable {
    index: HashMap<String, usize>,
    order: Vec<String>,
    params: HashMap<String, Vec<String>>,
}

impl FunctionTable {
    /// Registers a function by name, before its body (and before its
    /// parameter list, if any) is parsed — so self-referential calls are
    /// legal.
    pub fn declare(&mut self, name: &str) -> Result<usize, SemanticError> {
        if self.index.contains_key(name) {
            return Err(SemanticError::DuplicateFunction(name.to_string()));
        }
        let idx = self.order.len();
        self.order.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        Ok(idx)
    }

    /// Attaches the parameter list once `USING` has been fully parsed.
    pub fn set_params(&mut self, name: &str, params: Vec<String>) {
        self.params.insert(name.to_string(), params);
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn params(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn label(index: usize) -> String {
        format!("FUNC{index}")
    }
}

/// User-defined `LABEL` targets. Insertion-only; duplicates are an error.
#[derive(Default)]
pub struct LabelSet {
    labels: std::collections::HashSet<String>,
}

impl LabelSet {
    pub fn declare(&mut self, name: &str) -> Result<(), SemanticError> {
        if !self.labels.insert(name.to_string()) {
            return Err(SemanticError::DuplicateLabel(name.to_string()));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains(name)
    }
}

/// Append-only list of `GOTO` targets, validated against the label set at
/// the end of the program.
#[derive(Default)]
pub struct GotoList {
    targets: Vec<String>,
}

impl GotoList {
    pub fn push(&mut self, name: &str) {
        self.targets.push(name.to_string());
    }

    /// Returns the first target with no matching label, if any.
    pub fn first_undeclared<'a>(&'a self, labels: &LabelSet) -> Option<&'a str> {
        self.targets
            .iter()
            .find(|t| !labels.contains(t))
            .map(String::as_str)
    }
}

/// Deduplicated, insertion-ordered pool of string literals: `S<index>`.
#[derive(Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Interns `text`, returning its (possibly pre-existing) index.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(idx) = self.strings.iter().position(|s| s == text) {
            return idx;
        }
        self.strings.push(text.to_string());
        self.strings.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    pub fn label(index: usize) -> String {
        format!("S{index}")
    }
}

/// Monotonically increasing counters minting unique `XIF<n>` / `SWHILE<n>`
/// / `XWHILE<n>` labels. Never reused, never reset.
#[derive(Default)]
pub struct Counters {
    if_count: usize,
    while_count: usize,
}

impl Counters {
    pub fn next_if(&mut self) -> usize {
        let n = self.if_count;
        self.if_count += 1;
        n
    }

    pub fn next_while(&mut self) -> usize {
        let n = self.while_count;
        self.while_count += 1;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_table_assigns_sequential_indices() {
        let mut vars = VariableTable::default();
        assert_eq!(vars.declare("a").unwrap(), 0);
        assert_eq!(vars.declare("b").unwrap(), 1);
        assert_eq!(VariableTable::label(1), "V1");
    }

    #[test]
    fn variable_table_rejects_duplicates() {
        let mut vars = VariableTable::default();
        vars.declare("a").unwrap();
        assert_eq!(
            vars.declare("a"),
            Err(SemanticError::DuplicateVariable("a".into()))
        );
    }

    #[test]
    fn function_table_tracks_params_separately_from_registration() {
        let mut funcs = FunctionTable::default();
        funcs.declare("f").unwrap();
        assert!(funcs.params("f").is_empty());
        funcs.set_params("f", vec!["a".into(), "b".into()]);
        assert_eq!(funcs.params("f"), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn string_pool_dedupes() {
        let mut pool = StringPool::default();
        assert_eq!(pool.intern("hi"), 0);
        assert_eq!(pool.intern("there"), 1);
        assert_eq!(pool.intern("hi"), 0);
        assert_eq!(pool.iter().count(), 2);
    }

    #[test]
    fn goto_list_flags_first_undeclared_target() {
        let mut labels = LabelSet::default();
        labels.declare("done").unwrap();

        let mut gotos = GotoList::default();
        gotos.push("done");
        assert_eq!(gotos.first_undeclared(&labels), None);

        gotos.push("nowhere");
        assert_eq!(gotos.first_undeclared(&labels), Some("nowhere"));
    }

    #[test]
    fn counters_never_reuse_values() {
        let mut counters = Counters::default();
        assert_eq!(counters.next_if(), 0);
        assert_eq!(counters.next_if(), 1);
        assert_eq!(counters.next_while(), 0);
        assert_eq!(counters.next_if(), 2);
    }
}
