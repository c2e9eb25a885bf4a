//! Translation state that must survive across VM source units:
//! the current function name, the per-function call-site counters
//! behind `$ret.n` labels, and the program-wide comparison counter.
//! Threaded explicitly through every lowering call — a second
//! translation run starts from a fresh value.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ProgramContext {
    current_function: String,
    return_indices: HashMap<String, usize>,
    compare_index: usize,
}

impl ProgramContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that emission entered a `function` body; `label`/`goto`
    /// targets are qualified with this name until the next `function`.
    ///
    /// A `return` command deliberately does not clear it: a function
    /// body can hold several `return`s, and the labels between them
    /// still belong to that function.
    pub fn enter_function(&mut self, name: &str) {
        name.clone_into(&mut self.current_function);
    }

    pub fn current_function(&self) -> &str {
        &self.current_function
    }

    /// Next call-site number of the current function, for uniquing its
    /// `<function>$ret.<n>` return-address labels.
    pub fn next_return_index(&mut self) -> usize {
        let index = self
            .return_indices
            .entry(self.current_function.clone())
            .or_insert(0);

        let current = *index;
        *index += 1;
        current
    }

    /// Next comparison number. Program-wide, not per-function: comparison
    /// labels must stay unique across every unit of the translation.
    pub fn next_compare_index(&mut self) -> usize {
        let current = self.compare_index;
        self.compare_index += 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_function_follows_function_commands() {
        let mut context = ProgramContext::new();

        assert_eq!(context.current_function(), "");

        context.enter_function("Sys.init");
        assert_eq!(context.current_function(), "Sys.init");

        context.enter_function("Main.main");
        assert_eq!(context.current_function(), "Main.main");
    }

    #[test]
    fn test_return_indices_count_per_function() {
        let mut context = ProgramContext::new();

        context.enter_function("Main.main");
        assert_eq!(context.next_return_index(), 0);
        assert_eq!(context.next_return_index(), 1);

        context.enter_function("Main.helper");
        assert_eq!(context.next_return_index(), 0);

        // counters are keyed by name, not reset by re-entry
        context.enter_function("Main.main");
        assert_eq!(context.next_return_index(), 2);
    }

    #[test]
    fn test_compare_index_is_program_wide() {
        let mut context = ProgramContext::new();

        context.enter_function("A.f");
        assert_eq!(context.next_compare_index(), 0);

        context.enter_function("B.g");
        assert_eq!(context.next_compare_index(), 1);
        assert_eq!(context.next_compare_index(), 2);
    }
}
