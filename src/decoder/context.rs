use std::rc::Rc;

use crate::kind::{self, ValueKind};
use crate::symbol_table::SymbolTable;

use super::value::Node;

/// Shared decode state: one per tree, threaded through every handle.
///
/// Both tables grow monotonically and indices stay stable for the lifetime
/// of the tree — back-references on the wire are only resolvable because
/// entries land in the exact order the emitter enumerated them.
pub(super) struct DecodeContext<'a> {
    /// Interned symbols in first-seen order (`:` appends, `;` resolves).
    pub(super) symbols: SymbolTable,
    /// Back-reference targets in first-materialised order (`@` resolves).
    objects: Vec<Rc<Node<'a>>>,
}

impl<'a> DecodeContext<'a> {
    pub(super) fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            objects: Vec::new(),
        }
    }

    /// Registers a node as an object back-reference target.
    ///
    /// A node qualifies only if its data does not itself start with a
    /// back-reference or symbol tag, its own kind is string, array or map,
    /// and the same node identity is not registered yet. Dedup is by node
    /// identity, not byte content: equal payloads at different positions
    /// are distinct targets.
    pub(super) fn register(&mut self, node: &Rc<Node<'a>>) {
        match node.data().first() {
            None | Some(&kind::OBJECT_REF) | Some(&kind::SYMBOL) | Some(&kind::SYMBOL_REF) => {
                return;
            }
            Some(_) => {}
        }
        if !matches!(
            kind::classify(node.data()),
            ValueKind::String | ValueKind::Array | ValueKind::Map
        ) {
            return;
        }
        if self.objects.iter().any(|entry| Rc::ptr_eq(entry, node)) {
            return;
        }
        self.objects.push(Rc::clone(node));
    }

    /// Resolves an object back-reference index.
    pub(super) fn object(&self, index: usize) -> Option<Rc<Node<'a>>> {
        self.objects.get(index).cloned()
    }

    /// Number of registered back-reference targets.
    pub(super) fn object_count(&self) -> usize {
        self.objects.len()
    }
}
