//! Stack of open, not yet matched, opening tags.

use std::collections::HashMap;

/// An opening tag waiting for its closer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OpenTag {
    /// Lower-cased name as written (aliases are resolved only when the pair is validated).
    pub(crate) name: String,
    pub(crate) token_index: usize,
}

impl OpenTag {
    pub(crate) fn new(name: &str, token_index: usize) -> Self {
        Self {
            name: name.to_string(),
            token_index,
        }
    }
}

/// LIFO of open tags; the top is the most recently opened one. Single tags never enter it.
///
/// A per-name count of open entries lets a closer with no opener at all be rejected
/// without walking the stack.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenTagStack {
    items: Vec<OpenTag>,
    open: HashMap<String, usize>,
    max_depth: usize,
    scanned: usize,
}

impl OpenTagStack {
    pub(crate) fn push(&mut self, entry: OpenTag) {
        *self.open.entry(entry.name.clone()).or_default() += 1;
        self.items.push(entry);
        self.max_depth = self.max_depth.max(self.items.len());
    }

    pub(crate) fn current(&self) -> Option<&OpenTag> {
        self.items.last()
    }

    pub(crate) fn pop(&mut self) -> Option<OpenTag> {
        let entry = self.items.pop()?;
        self.forget(&entry.name);
        Some(entry)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.open.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Entries examined by `pop_above` so far.
    pub(crate) fn scanned(&self) -> usize {
        self.scanned
    }

    /// Pops every entry above the nearest open `name`, leaving that entry on top.
    ///
    /// Returns the popped entries, innermost first. When `name` is not open at all the stack
    /// is left untouched and `None` is returned.
    pub(crate) fn pop_above(&mut self, name: &str) -> Option<Vec<OpenTag>> {
        if !self.contains(name) {
            return None;
        }
        let at = self.items.iter().rposition(|entry| entry.name == name)?;
        self.scanned += self.items.len() - at;
        let mut popped = self.items.split_off(at + 1);
        for entry in &popped {
            self.forget(&entry.name);
        }
        popped.reverse();
        Some(popped)
    }

    fn forget(&mut self, name: &str) {
        if let Some(count) = self.open.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.open.remove(name);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn iter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|entry| entry.name.as_str())
    }
}
