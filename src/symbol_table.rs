//! Symbol table: the ordered intern list behind the `:` and `;` forms.
//!
//! A new symbol is appended the first time it is read; a back-reference
//! resolves by index. Indices are stable — the list never shrinks and
//! re-interning an existing symbol is a no-op.
//!
//! Lifecycle: one table per decoded tree, shared by every handle.

use std::rc::Rc;

use crate::FastHashMap;

/// Schwelle ab der von linearer Suche auf HashMap gewechselt wird.
/// Für kleine Tabellen ist die lineare Suche auf `Vec<Rc<str>>` schneller
/// als Hashing+Probe; typische Payloads bleiben weit darunter.
const LINEAR_THRESHOLD: usize = 64;

/// Ordered list of distinct symbols with amortised O(1) dedup.
///
/// Uses `Rc<str>` so lookups and resolved back-references share one
/// allocation per symbol.
#[derive(Clone, Default)]
pub struct SymbolTable {
    entries: Vec<Rc<str>>,
    lookup: Option<FastHashMap<Rc<str>, usize>>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a symbol (idempotent). Returns its index.
    pub fn add(&mut self, value: &str) -> usize {
        if let Some(existing) = self.position(value) {
            return existing;
        }

        let index = self.entries.len();
        let rc: Rc<str> = value.into();

        // HashMap lazy anlegen wenn der Threshold erreicht ist
        if self.lookup.is_none() && index + 1 >= LINEAR_THRESHOLD {
            let mut map =
                FastHashMap::with_capacity_and_hasher(index + 1, Default::default());
            for (i, entry) in self.entries.iter().enumerate() {
                map.insert(Rc::clone(entry), i);
            }
            map.insert(Rc::clone(&rc), index);
            self.lookup = Some(map);
        } else if let Some(ref mut map) = self.lookup {
            map.insert(Rc::clone(&rc), index);
        }

        self.entries.push(rc);
        index
    }

    /// Resolves a back-reference index.
    pub fn get(&self, index: usize) -> Option<Rc<str>> {
        self.entries.get(index).cloned()
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no symbol has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, value: &str) -> Option<usize> {
        if let Some(ref map) = self.lookup {
            map.get(value).copied()
        } else {
            self.entries.iter().position(|entry| &**entry == value)
        }
    }
}
