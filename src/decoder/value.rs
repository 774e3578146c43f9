//! The value handle: lazy, reference-resolving views into the payload.
//!
//! A handle covers one value, starting at its tag byte. Children of arrays
//! and maps are materialised on demand; because primitive elements carry no
//! length prefix, slicing the next element requires probing the byte span
//! of the current one, which for nested composites means walking them. The
//! prober and the composite walkers are therefore mutually recursive, with
//! a hard nesting bound.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::warn;

use crate::error::{Error, Result};
use crate::kind::{self, ValueKind};
use crate::FastIndexMap;
use crate::{float, string, varint};

use super::context::DecodeContext;

/// Nesting bound for the mutually recursive prober and composite walkers.
const RECURSION_LIMIT: usize = 256;

/// Backing storage of one value. Object-table identity is pointer identity
/// of this node.
pub(super) struct Node<'a> {
    data: &'a [u8],
    /// Cached byte span of the value (0 = not yet probed).
    size: Cell<usize>,
    /// Memoized children of a materialised composite: elements for arrays,
    /// flattened key/value pairs for maps. Repeated materialisation hands
    /// out the same node identities, so the object table stays unchanged.
    children: RefCell<Vec<Rc<Node<'a>>>>,
}

impl<'a> Node<'a> {
    pub(super) fn new(data: &'a [u8]) -> Rc<Self> {
        Rc::new(Self {
            data,
            size: Cell::new(0),
            children: RefCell::new(Vec::new()),
        })
    }

    pub(super) fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// A lazy handle onto one value of a decoded payload.
///
/// Handles are cheap to clone. All handles of one tree share the symbol
/// and object tables; a handle never owns payload bytes — the input buffer
/// must outlive the tree. Handles are deliberately not `Send`: one tree is
/// single-threaded state, independent trees are independent.
#[derive(Clone)]
pub struct Value<'a> {
    major: u8,
    minor: u8,
    node: Rc<Node<'a>>,
    ctx: Rc<RefCell<DecodeContext<'a>>>,
}

impl<'a> Value<'a> {
    pub(super) fn root(major: u8, minor: u8, data: &'a [u8]) -> Self {
        Self {
            major,
            minor,
            node: Node::new(data),
            ctx: Rc::new(RefCell::new(DecodeContext::new())),
        }
    }

    /// Wraps an existing node into a handle of this tree.
    fn wrap(&self, node: Rc<Node<'a>>) -> Self {
        Self {
            major: self.major,
            minor: self.minor,
            node,
            ctx: Rc::clone(&self.ctx),
        }
    }

    /// A fresh handle over a sub-slice, sharing this tree's tables.
    fn child(&self, data: &'a [u8]) -> Self {
        self.wrap(Node::new(data))
    }

    fn data(&self) -> &'a [u8] {
        self.node.data
    }

    /// Format version pair `(major, minor)` from the payload header.
    pub fn version(&self) -> (u8, u8) {
        (self.major, self.minor)
    }

    /// The kind of this value.
    ///
    /// Total: empty data is [`ValueKind::Unknown`], a leading object
    /// back-reference resolves through the object table.
    pub fn kind(&self) -> ValueKind {
        if self.data().is_empty() {
            return ValueKind::Unknown;
        }
        if let Some(target) = self.resolve_link() {
            return target.kind();
        }
        kind::classify(self.data())
    }

    /// Reads a bool value.
    pub fn as_bool(&self) -> Result<bool> {
        if let Some(target) = self.resolve_link() {
            return target.as_bool();
        }
        self.assert_kind(ValueKind::Bool)?;
        Ok(self.data()[0] == kind::TRUE)
    }

    /// Reads an integer value.
    pub fn as_integer(&self) -> Result<i64> {
        if let Some(target) = self.resolve_link() {
            return target.as_integer();
        }
        self.assert_kind(ValueKind::Integer)?;
        Ok(varint::decode(&self.data()[1..])?.0)
    }

    /// Reads a float value.
    pub fn as_float(&self) -> Result<f64> {
        if let Some(target) = self.resolve_link() {
            return target.as_float();
        }
        self.assert_kind(ValueKind::Float)?;
        let (text, _) = string::read(&self.data()[1..])?;
        float::parse(&text)
    }

    /// Reads a string or symbol value.
    ///
    /// New symbols are interned into the symbol table. The handle itself
    /// becomes an object back-reference target; symbol forms live in the
    /// symbol table only.
    pub fn as_string(&self) -> Result<String> {
        if let Some(target) = self.resolve_link() {
            return target.as_string();
        }
        self.assert_kind(ValueKind::String)?;
        self.register_self();

        let data = self.data();
        match data[0] {
            kind::SYMBOL => {
                let (text, _) = string::read(&data[1..])?;
                self.ctx.borrow_mut().symbols.add(&text);
                Ok(text)
            }
            kind::SYMBOL_REF => {
                let (index, _) = varint::decode(&data[1..])?;
                let index = usize::try_from(index).map_err(|_| Error::IncompleteData)?;
                let symbol = self
                    .ctx
                    .borrow()
                    .symbols
                    .get(index)
                    .ok_or(Error::IncompleteData)?;
                Ok(symbol.to_string())
            }
            kind::STRING => Ok(string::read(&data[1..])?.0),
            _ => {
                // `I"`: raw string plus the trailing encoding block.
                let (text, _, new_symbols) = string::read_with_encoding(&data[2..])?;
                let mut ctx = self.ctx.borrow_mut();
                for symbol in &new_symbols {
                    ctx.symbols.add(symbol);
                }
                Ok(text)
            }
        }
    }

    /// Materialises an array's elements.
    ///
    /// On first materialisation this finalises the handle's cached span and
    /// registers the array and each eligible element in the object table,
    /// in emitter order (parent before descendants). Repeated calls return
    /// handles with the same identities and leave the tables unchanged.
    pub fn as_array(&self) -> Result<Vec<Value<'a>>> {
        self.as_array_at(0)
    }

    /// Materialises a map into key strings and value handles.
    ///
    /// Keys are rendered through [`Display`](fmt::Display); non-primitive
    /// keys collapse to the empty string, and duplicate renderings keep the
    /// last value. Use [`Value::as_map_entries`] when key handles must be
    /// preserved.
    pub fn as_map(&self) -> Result<FastIndexMap<String, Value<'a>>> {
        let entries = self.as_map_entries()?;
        let mut map = FastIndexMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (key, value) in entries {
            map.insert(key.to_string(), value);
        }
        Ok(map)
    }

    /// Materialises a map as ordered key/value handle pairs.
    ///
    /// Same caching discipline as [`Value::as_array`]; keys keep their full
    /// fidelity instead of being collapsed to strings.
    pub fn as_map_entries(&self) -> Result<Vec<(Value<'a>, Value<'a>)>> {
        self.as_map_entries_at(0)
    }

    /// Reads a user-defined (`_dump`) value: the class-name handle and the
    /// raw payload bytes. The payload is opaque to the reader.
    pub fn as_user_defined(&self) -> Result<(Value<'a>, &'a [u8])> {
        if let Some(target) = self.resolve_link() {
            return target.as_user_defined();
        }
        self.assert_kind(ValueKind::UserDefined)?;

        let data = self.data();
        let name = self.child(&data[1..]);
        let name_span = name.span(0)?;
        let tail = data.get(1 + name_span..).ok_or(Error::IncompleteData)?;
        let (payload_len, len_span) = varint::decode(tail)?;
        let payload_len = usize::try_from(payload_len).map_err(|_| Error::IncompleteData)?;
        let end = len_span
            .checked_add(payload_len)
            .ok_or(Error::IncompleteData)?;
        let payload = tail.get(len_span..end).ok_or(Error::IncompleteData)?;
        Ok((name, payload))
    }

    fn as_array_at(&self, depth: usize) -> Result<Vec<Value<'a>>> {
        if let Some(target) = self.resolve_link() {
            return target.as_array_at(depth);
        }
        self.assert_kind(ValueKind::Array)?;
        self.register_self();

        if self.node.size.get() != 0 {
            let children = self.node.children.borrow();
            return Ok(children
                .iter()
                .map(|node| self.wrap(Rc::clone(node)))
                .collect());
        }

        let data = self.data();
        let (count, header) = varint::decode(&data[1..])?;
        let count = usize::try_from(count).unwrap_or(0);
        let mut offset = 1 + header;
        // Kapazität durch die Restlänge begrenzen — ein manipulierter
        // Zähler darf keine Riesen-Allokation auslösen (jedes Element
        // belegt mindestens ein Byte).
        let mut elements: Vec<Rc<Node<'a>>> =
            Vec::with_capacity(count.min(data.len().saturating_sub(offset)));
        for _ in 0..count {
            let rest = data.get(offset..).ok_or(Error::IncompleteData)?;
            let child = Node::new(rest);
            self.ctx.borrow_mut().register(&child);
            offset += self.wrap(Rc::clone(&child)).span(depth + 1)?;
            elements.push(child);
        }

        self.node.size.set(offset);
        *self.node.children.borrow_mut() = elements.clone();
        Ok(elements.into_iter().map(|node| self.wrap(node)).collect())
    }

    fn as_map_entries_at(&self, depth: usize) -> Result<Vec<(Value<'a>, Value<'a>)>> {
        if let Some(target) = self.resolve_link() {
            return target.as_map_entries_at(depth);
        }
        self.assert_kind(ValueKind::Map)?;
        self.register_self();

        if self.node.size.get() != 0 {
            let children = self.node.children.borrow();
            return Ok(children
                .chunks_exact(2)
                .map(|pair| (self.wrap(Rc::clone(&pair[0])), self.wrap(Rc::clone(&pair[1]))))
                .collect());
        }

        let data = self.data();
        let (nodes, walked) = self.walk_maplike(&data[1..], true, depth)?;
        self.node.size.set(1 + walked);

        let pairs = nodes
            .chunks_exact(2)
            .map(|pair| (self.wrap(Rc::clone(&pair[0])), self.wrap(Rc::clone(&pair[1]))))
            .collect();
        *self.node.children.borrow_mut() = nodes;
        Ok(pairs)
    }

    /// Walks a headerless key/value sequence: count, then pairs.
    ///
    /// Registration is on when a map materialises and off when an
    /// instance-variable block is merely probed — probing must not append
    /// back-reference targets of its own.
    fn walk_maplike(
        &self,
        body: &'a [u8],
        register: bool,
        depth: usize,
    ) -> Result<(Vec<Rc<Node<'a>>>, usize)> {
        let (count, header) = varint::decode(body)?;
        let count = usize::try_from(count).unwrap_or(0);
        let mut offset = header;
        let mut nodes: Vec<Rc<Node<'a>>> = Vec::new();
        for _ in 0..count {
            let rest = body.get(offset..).ok_or(Error::IncompleteData)?;
            let key = Node::new(rest);
            if register {
                self.ctx.borrow_mut().register(&key);
            }
            offset += self.wrap(Rc::clone(&key)).span(depth + 1)?;
            nodes.push(key);

            let rest = body.get(offset..).ok_or(Error::IncompleteData)?;
            let value = Node::new(rest);
            if register {
                self.ctx.borrow_mut().register(&value);
            }
            offset += self.wrap(Rc::clone(&value)).span(depth + 1)?;
            nodes.push(value);
        }
        Ok((nodes, offset))
    }

    /// Computes the byte span of the value at this handle.
    ///
    /// Primitive spans are implicit in type and contents; arrays and maps
    /// have to be walked, which caches their span and registers their
    /// children as a side effect. Probing a `:`/`"`/`f` payload interns it
    /// into the symbol table alongside true symbols.
    fn span(&self, depth: usize) -> Result<usize> {
        if depth > RECURSION_LIMIT {
            return Err(Error::DepthExceeded);
        }
        let data = self.data();
        if data.is_empty() {
            return Err(Error::IncompleteData);
        }

        if data[0] == kind::OBJECT_REF {
            return Ok(1 + varint::decode(&data[1..])?.1);
        }

        match kind::classify(data) {
            ValueKind::Nil | ValueKind::Bool => Ok(1),
            ValueKind::Integer => Ok(1 + varint::decode(&data[1..])?.1),
            ValueKind::String | ValueKind::Float => match data[0] {
                kind::SYMBOL_REF => Ok(1 + varint::decode(&data[1..])?.1),
                kind::IVARS => {
                    let (_, span, new_symbols) = string::read_with_encoding(&data[2..])?;
                    let mut ctx = self.ctx.borrow_mut();
                    for symbol in &new_symbols {
                        ctx.symbols.add(symbol);
                    }
                    Ok(2 + span)
                }
                _ => {
                    let (text, span) = string::read(&data[1..])?;
                    self.ctx.borrow_mut().symbols.add(&text);
                    Ok(1 + span)
                }
            },
            ValueKind::UserDefined => {
                let name_span = self.child(&data[1..]).span(depth + 1)?;
                let tail = data.get(1 + name_span..).ok_or(Error::IncompleteData)?;
                let (payload_len, len_span) = varint::decode(tail)?;
                let payload_len =
                    usize::try_from(payload_len).map_err(|_| Error::IncompleteData)?;
                let total = (1 + name_span + len_span)
                    .checked_add(payload_len)
                    .ok_or(Error::IncompleteData)?;
                if total > data.len() {
                    return Err(Error::IncompleteData);
                }
                Ok(total)
            }
            ValueKind::InstanceVariables | ValueKind::ObjectInstance => {
                let inner_span = self.child(&data[1..]).span(depth + 1)?;
                let tail = data.get(1 + inner_span..).ok_or(Error::IncompleteData)?;
                let (_, ivars_span) = self.walk_maplike(tail, false, depth + 1)?;
                Ok(1 + inner_span + ivars_span)
            }
            ValueKind::Array => {
                if self.node.size.get() == 0 {
                    self.as_array_at(depth)?;
                }
                Ok(self.node.size.get())
            }
            ValueKind::Map => {
                if self.node.size.get() == 0 {
                    self.as_map_entries_at(depth)?;
                }
                Ok(self.node.size.get())
            }
            ValueKind::Unknown => Err(Error::UnsupportedType(data[0])),
        }
    }

    /// Follows a leading `@` through the object table.
    ///
    /// Out-of-range indices resolve to nothing and leave the extractor to
    /// report on the unresolved handle.
    fn resolve_link(&self) -> Option<Value<'a>> {
        if self.data().first() != Some(&kind::OBJECT_REF) {
            return None;
        }
        let (index, _) = varint::decode(&self.data()[1..]).ok()?;
        let index = usize::try_from(index).ok()?;
        let node = {
            let ctx = self.ctx.borrow();
            let found = ctx.object(index);
            if found.is_none() {
                warn!(
                    "object back-reference @{index} out of range ({} targets cached)",
                    ctx.object_count()
                );
            }
            found
        }?;
        Some(self.wrap(node))
    }

    fn register_self(&self) {
        self.ctx.borrow_mut().register(&self.node);
    }

    fn assert_kind(&self, expected: ValueKind) -> Result<()> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(Error::TypeMismatch { expected, found })
        }
    }
}

impl fmt::Display for Value<'_> {
    /// Best-effort rendering for primitives; composites and inner errors
    /// render as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ValueKind::Nil => f.write_str("<nil>"),
            ValueKind::Bool => match self.as_bool() {
                Ok(true) => f.write_str("true"),
                Ok(false) => f.write_str("false"),
                Err(_) => Ok(()),
            },
            ValueKind::Integer => match self.as_integer() {
                Ok(value) => write!(f, "{value}"),
                Err(_) => Ok(()),
            },
            ValueKind::Float => match self.as_float() {
                Ok(value) => write!(f, "{value}"),
                Err(_) => Ok(()),
            },
            ValueKind::String => match self.as_string() {
                Ok(value) => f.write_str(&value),
                Err(_) => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("kind", &self.kind())
            .field("len", &self.data().len())
            .finish_non_exhaustive()
    }
}
