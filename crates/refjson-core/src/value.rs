//! The JSON value algebra.
//!
//! [`Value`] is a cheap-to-clone handle: scalar variants are inline,
//! while strings, containers, and references sit behind `Rc` so a
//! sub-tree can be owned from several places at once. Shared ownership
//! is what lets the reference engine replace an owning slot with the
//! reduced value a reference points at, without copying the tree.
//!
//! Containers keep their children behind a `RefCell` (slots are
//! rewritten during reference binding) and carry the `touched`/`looped`
//! flag pair that guards every recursive visit against cycles.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RefJsonError, Result};
use crate::options::EvalOptions;
use crate::reference::RefNode;

/// Discriminant of a [`Value`], used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The `null` literal.
    Null,
    /// `true` or `false`.
    Boolean,
    /// 32-bit signed integer.
    Integer,
    /// 32-bit float with preserved text.
    Real,
    /// UTF-8 string.
    String,
    /// Ordered sequence of values.
    Array,
    /// Ordered sequence of key/value entries.
    Object,
    /// Deferred lookup (path, set, or function).
    Reference,
}

/// A JSON value, extended with a reference variant.
#[derive(Debug, Clone)]
pub enum Value {
    /// The `null` literal.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 32-bit float together with its originating text.
    Real(Rc<Real>),
    /// A UTF-8 string.
    Str(Rc<str>),
    /// An array of values.
    Array(Rc<ArrayNode>),
    /// An object with ordered entries and a key side index.
    Object(Rc<ObjectNode>),
    /// A symbolic reference awaiting context.
    Ref(Rc<RefNode>),
}

/// A real number that remembers the text it was written as.
///
/// The text is authoritative for output: a number parsed back and
/// printed again yields the same characters. Text is only fabricated
/// when the value was constructed from a binary float.
#[derive(Debug)]
pub struct Real {
    value: f32,
    text: String,
}

impl Real {
    /// Build from a binary float, fabricating text by trimming the
    /// trailing zeros of the six-decimal rendering. At least one
    /// fractional digit is kept, so `0.0f32` renders as `0.0`.
    pub fn from_f32(value: f32) -> Self {
        let mut text = format!("{value:.6}");
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.push('0');
        }
        Real { value, text }
    }

    /// Build from a textual form, which must parse as a finite `f32`
    /// in its entirety. The text is preserved verbatim.
    pub fn from_text(text: &str) -> Result<Self> {
        let value: f32 = text
            .parse()
            .map_err(|_| RefJsonError::InvalidArgument(format!("invalid real literal `{text}`")))?;
        if !value.is_finite() {
            return Err(RefJsonError::InvalidArgument(format!(
                "real literal `{text}` is out of range"
            )));
        }
        Ok(Real {
            value,
            text: text.to_string(),
        })
    }

    /// The numeric value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The preserved textual form.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The `touched`/`looped` pair carried by every container-shaped node.
///
/// `touched` means "currently inside a recursive visit"; re-entry sets
/// `looped`, which is permanent: once a node is known to sit on a
/// cycle, rendering it is an error.
#[derive(Debug, Default)]
pub(crate) struct VisitFlags {
    touched: Cell<bool>,
    looped: Cell<bool>,
}

impl VisitFlags {
    /// Enter a recursive visit. Returns `false` on re-entry, in which
    /// case the node is flagged as looped and must not be descended.
    pub(crate) fn enter(&self) -> bool {
        if self.touched.get() {
            self.looped.set(true);
            false
        } else {
            self.touched.set(true);
            true
        }
    }

    pub(crate) fn exit(&self) {
        self.touched.set(false);
    }

    pub(crate) fn looped(&self) -> bool {
        self.looped.get()
    }

    pub(crate) fn touched(&self) -> bool {
        self.touched.get()
    }
}

/// Array storage: child slots behind a `RefCell` plus cycle flags.
#[derive(Debug)]
pub struct ArrayNode {
    items: RefCell<Vec<Value>>,
    flags: VisitFlags,
}

impl ArrayNode {
    fn new(items: Vec<Value>) -> Self {
        ArrayNode {
            items: RefCell::new(items),
            flags: VisitFlags::default(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// True when the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Borrow the elements.
    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.items.borrow()
    }

    /// Look an element up by index. A negative index counts from the
    /// end when negative indexing is enabled, and is out of range
    /// otherwise.
    pub fn at(&self, index: i32, options: &EvalOptions) -> Result<Value> {
        let items = self.items.borrow();
        let len = items.len();
        let resolved = if index < 0 && options.negative_indexing {
            index as i64 + len as i64
        } else {
            index as i64
        };
        if resolved >= 0 && (resolved as usize) < len {
            Ok(items[resolved as usize].clone())
        } else {
            Err(RefJsonError::IndexOutOfRange { index, len })
        }
    }

    fn is_compact(&self) -> bool {
        if self.flags.touched() {
            return false;
        }
        self.flags.touched.set(true);
        let compact = self
            .items
            .borrow()
            .iter()
            .all(|item| item.is_compact() && item.is_empty());
        self.flags.touched.set(false);
        compact
    }

    fn render(&self, level: usize, pretty: bool) -> Result<String> {
        if self.flags.looped() {
            return Err(RefJsonError::Looped);
        }
        let effective = pretty && !self.is_compact();
        if !self.flags.enter() {
            return Err(RefJsonError::Looped);
        }
        let result = render_items(
            &self.items.borrow(),
            |item, nested, pretty| item.render_indented(nested, pretty),
            ('[', ']'),
            level,
            effective,
        );
        self.flags.exit();
        result
    }
}

/// Object storage: ordered entries behind a `RefCell`, a key→position
/// side index built once at construction, and cycle flags.
#[derive(Debug)]
pub struct ObjectNode {
    entries: RefCell<Vec<(Rc<str>, Value)>>,
    index: HashMap<Rc<str>, usize>,
    flags: VisitFlags,
}

impl ObjectNode {
    fn new(entries: Vec<(String, Value)>) -> Result<Self> {
        let mut data = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for (position, (key, value)) in entries.into_iter().enumerate() {
            let key: Rc<str> = Rc::from(key.as_str());
            if index.insert(key.clone(), position).is_some() {
                return Err(RefJsonError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            data.push((key, value));
        }
        Ok(ObjectNode {
            entries: RefCell::new(data),
            index,
            flags: VisitFlags::default(),
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True when the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Borrow the entries in insertion order.
    pub fn entries(&self) -> Ref<'_, Vec<(Rc<str>, Value)>> {
        self.entries.borrow()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Look a value up by key.
    pub fn at(&self, key: &str) -> Result<Value> {
        match self.index.get(key) {
            Some(&position) => Ok(self.entries.borrow()[position].1.clone()),
            None => Err(RefJsonError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Look a value up by key, without an error on absence.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.index
            .get(key)
            .map(|&position| self.entries.borrow()[position].1.clone())
    }

    fn is_compact(&self) -> bool {
        if self.flags.touched() {
            return false;
        }
        self.flags.touched.set(true);
        let entries = self.entries.borrow();
        let compact = entries.is_empty()
            || (entries.len() == 1 && entries[0].1.is_compact() && entries[0].1.is_empty());
        drop(entries);
        self.flags.touched.set(false);
        compact
    }

    fn render(&self, level: usize, pretty: bool) -> Result<String> {
        if self.flags.looped() {
            return Err(RefJsonError::Looped);
        }
        let effective = pretty && !self.is_compact();
        if !self.flags.enter() {
            return Err(RefJsonError::Looped);
        }
        let result = render_items(
            &self.entries.borrow(),
            |(key, value), nested, pretty| {
                let mut out = escape_str(key);
                out.push_str(": ");
                out.push_str(&value.render_indented(nested, pretty)?);
                Ok(out)
            },
            ('{', '}'),
            level,
            effective,
        );
        self.flags.exit();
        result
    }
}

impl Value {
    /// Build a string value.
    pub fn string(text: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(text.as_ref()))
    }

    /// Build a real from a binary float (text is fabricated).
    pub fn real(value: f32) -> Value {
        Value::Real(Rc::new(Real::from_f32(value)))
    }

    /// Build a real from its textual form, preserving the text.
    pub fn real_from_text(text: &str) -> Result<Value> {
        Ok(Value::Real(Rc::new(Real::from_text(text)?)))
    }

    /// Build an array value.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(ArrayNode::new(items)))
    }

    /// Build an object value. Duplicate keys are rejected.
    pub fn object(entries: Vec<(String, Value)>) -> Result<Value> {
        Ok(Value::Object(Rc::new(ObjectNode::new(entries)?)))
    }

    /// The variant discriminant.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Int(_) => Kind::Integer,
            Value::Real(_) => Kind::Real,
            Value::Str(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Ref(_) => Kind::Reference,
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "JSON-Null",
            Value::Bool(_) => "JSON-Boolean",
            Value::Int(_) => "JSON-Integer",
            Value::Real(_) => "JSON-Real",
            Value::Str(_) => "JSON-String",
            Value::Array(_) => "JSON-Array",
            Value::Object(_) => "JSON-Object",
            Value::Ref(_) => "JSON-Reference",
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The real, if this is one.
    pub fn as_real(&self) -> Option<&Real> {
        match self {
            Value::Real(real) => Some(real),
            _ => None,
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// The array node, if this is an array.
    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Value::Array(node) => Some(node),
            _ => None,
        }
    }

    /// The object node, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Value::Object(node) => Some(node),
            _ => None,
        }
    }

    /// The reference node, if this is a reference.
    pub fn as_reference(&self) -> Option<&Rc<RefNode>> {
        match self {
            Value::Ref(node) => Some(node),
            _ => None,
        }
    }

    /// True when the value has no nested children: containers when
    /// empty, everything else always.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Array(node) => node.is_empty(),
            Value::Object(node) => node.is_empty(),
            _ => true,
        }
    }

    /// True when the value always renders on a single line, so
    /// pretty-printing never breaks it up: scalars and references
    /// always; an array when every child is compact and empty; an
    /// object when it is empty or holds a single compact, empty child.
    pub fn is_compact(&self) -> bool {
        match self {
            Value::Array(node) => node.is_compact(),
            Value::Object(node) => node.is_compact(),
            _ => true,
        }
    }

    /// Walk the value recursively, flagging any node reached twice in
    /// one visit as looped. Rendering a looped node is an error.
    pub fn touch(&self) {
        match self {
            Value::Array(node) => {
                if node.flags.enter() {
                    for item in node.items.borrow().iter() {
                        item.touch();
                    }
                    node.flags.exit();
                }
            }
            Value::Object(node) => {
                if node.flags.enter() {
                    for (_, value) in node.entries.borrow().iter() {
                        value.touch();
                    }
                    node.flags.exit();
                }
            }
            Value::Ref(node) => node.touch(),
            _ => {}
        }
    }

    /// Dynamic lookup: `array.by(int)` and `object.by(string)` always
    /// work; the symmetric pairings `int.by(array)` and
    /// `string.by(object)` only when symmetric indexing is enabled.
    /// Every other pairing is a domain error naming both types.
    pub fn by(&self, accessor: &Value, options: &EvalOptions) -> Result<Value> {
        match (self, accessor) {
            (Value::Array(node), Value::Int(index)) => node.at(*index, options),
            (Value::Object(node), Value::Str(key)) => node.at(key),
            (Value::Int(index), Value::Array(node)) if options.symmetric_indexing => {
                node.at(*index, options)
            }
            (Value::Str(key), Value::Object(node)) if options.symmetric_indexing => node.at(key),
            _ => Err(RefJsonError::Domain {
                target: self.type_name(),
                accessor: accessor.type_name(),
            }),
        }
    }

    /// Bind `$` throughout the value to `root`. Containers propagate
    /// into their children and replace reference slots with their
    /// reduced values; reference nodes rebind root-headed paths and
    /// simplify.
    pub fn set_root(&self, root: &Value, options: &EvalOptions) -> Result<()> {
        match self {
            Value::Array(node) => {
                if !node.flags.enter() {
                    return Ok(());
                }
                let result = (|| {
                    let len = node.items.borrow().len();
                    for position in 0..len {
                        let child = node.items.borrow()[position].clone();
                        child.set_root(root, options)?;
                        if let Value::Ref(reference) = &child {
                            node.items.borrow_mut()[position] = reference.value()?;
                        }
                    }
                    Ok(())
                })();
                node.flags.exit();
                result
            }
            Value::Object(node) => {
                if !node.flags.enter() {
                    return Ok(());
                }
                let result = (|| {
                    let len = node.entries.borrow().len();
                    for position in 0..len {
                        let child = node.entries.borrow()[position].1.clone();
                        child.set_root(root, options)?;
                        if let Value::Ref(reference) = &child {
                            node.entries.borrow_mut()[position].1 = reference.value()?;
                        }
                    }
                    Ok(())
                })();
                node.flags.exit();
                result
            }
            Value::Ref(node) => node.set_root(root, options),
            _ => Ok(()),
        }
    }

    /// Bind reference children of a freshly built container to the
    /// container itself and replace each slot with the reduced value.
    /// A bare `@` child reduces to the container, forming a cycle the
    /// guard flags on the next touch.
    pub(crate) fn bind_children(&self, options: &EvalOptions) -> Result<()> {
        match self {
            Value::Array(node) => {
                let len = node.items.borrow().len();
                for position in 0..len {
                    let child = node.items.borrow()[position].clone();
                    if let Value::Ref(reference) = &child {
                        reference.set_parent(self, options)?;
                        node.items.borrow_mut()[position] = reference.value()?;
                    }
                }
                Ok(())
            }
            Value::Object(node) => {
                let len = node.entries.borrow().len();
                for position in 0..len {
                    let child = node.entries.borrow()[position].1.clone();
                    if let Value::Ref(reference) = &child {
                        reference.set_parent(self, options)?;
                        node.entries.borrow_mut()[position].1 = reference.value()?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Compact single-line rendering.
    pub fn render(&self) -> Result<String> {
        self.render_indented(0, false)
    }

    /// Pretty rendering: tab indentation, one level per nesting depth.
    /// Compact containers stay on one line.
    pub fn render_pretty(&self) -> Result<String> {
        self.render_indented(0, true)
    }

    /// The recursive rendering primitive: render at a given
    /// indentation level.
    pub fn render_indented(&self, level: usize, pretty: bool) -> Result<String> {
        match self {
            Value::Null => Ok("null".to_string()),
            Value::Bool(value) => Ok(value.to_string()),
            Value::Int(value) => Ok(value.to_string()),
            Value::Real(real) => Ok(real.text().to_string()),
            Value::Str(text) => Ok(escape_str(text)),
            Value::Array(node) => node.render(level, pretty),
            Value::Object(node) => node.render(level, pretty),
            Value::Ref(node) => node.render(level, pretty),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.text == b.text,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.items.borrow() == *b.items.borrow()
            }
            (Value::Object(a), Value::Object(b)) => {
                Rc::ptr_eq(a, b) || *a.entries.borrow() == *b.entries.borrow()
            }
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Quote and escape a string for output: the eight named escapes,
/// everything else passed through verbatim (UTF-8 is emitted as-is).
pub(crate) fn escape_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Shared container layout: one element per line when pretty, the
/// closing bracket back at the opening level, `", "` separators when
/// compact.
fn render_items<T>(
    items: &[T],
    mut render_one: impl FnMut(&T, usize, bool) -> Result<String>,
    brackets: (char, char),
    level: usize,
    pretty: bool,
) -> Result<String> {
    let mut out = String::new();
    out.push(brackets.0);
    let mut nested = level;
    let mut indent = String::new();
    if pretty {
        nested += 1;
        indent = "\t".repeat(level);
        out.push('\n');
    }
    for (position, item) in items.iter().enumerate() {
        if position > 0 {
            out.push(',');
            out.push(if pretty { '\n' } else { ' ' });
        }
        if pretty {
            out.push_str(&indent);
            out.push('\t');
        }
        out.push_str(&render_one(item, nested, pretty)?);
    }
    if pretty {
        out.push('\n');
        out.push_str(&indent);
    }
    out.push(brackets.1);
    Ok(out)
}
