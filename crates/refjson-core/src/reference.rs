//! The reference engine.
//!
//! A reference models a deferred lookup chain whose head may depend on
//! context that is not known yet: `$` waits for the outermost document,
//! `@` for the enclosing container, an accessor-headed path for the
//! value a set projects it over. Once a head becomes concrete the
//! simplify loop consumes tail accessors against it until the
//! reference either reduces to a plain value or stalls on a symbolic
//! dependency (an unbound `$`, a function call).
//!
//! Reference bodies live behind `RefCell`s because simplification
//! rewrites them in place while the node stays shared: the parser, an
//! enclosing container, and a tail being walked may all hold the same
//! node.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{RefJsonError, Result};
use crate::options::EvalOptions;
use crate::value::{Value, VisitFlags};

/// Which of the three reference shapes a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// A head plus a tail of accessors.
    Path,
    /// A projection of several paths over one head.
    Set,
    /// A named call.
    Function,
}

/// Head of a path reference.
#[derive(Debug, Clone)]
pub enum Head {
    /// A concrete value.
    Object(Value),
    /// The enclosing container, bound by `set_parent` (`@`).
    Local,
    /// The outermost document, bound by `set_root` (`$`).
    Root,
    /// Supplied later by the set projecting this path.
    Accessor,
}

/// How a set was written, which controls how it renders: an
/// accessor-set (`{a, b}`) projects into the current head; an
/// inline-set (`[a, b]`) came from a bracketed multi-index or from an
/// accessor-set whose parent has been bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// Written `{…}` inside a tail; renders with braces.
    Accessor,
    /// Bound or written as a multi-index; renders with brackets.
    Inline,
}

#[derive(Debug)]
enum Body {
    Path { head: Head },
    Set { elements: Vec<Value>, kind: SetKind },
    Func { name: String, args: Vec<Value> },
}

/// A shared reference node: one of the three bodies plus a tail of
/// pending accessors and the cycle flags.
#[derive(Debug)]
pub struct RefNode {
    body: RefCell<Body>,
    tail: RefCell<VecDeque<Value>>,
    flags: VisitFlags,
}

impl RefNode {
    fn new(body: Body) -> Rc<Self> {
        Rc::new(RefNode {
            body: RefCell::new(body),
            tail: RefCell::new(VecDeque::new()),
            flags: VisitFlags::default(),
        })
    }

    /// A path bound to the enclosing container (`@`).
    pub fn local() -> Rc<Self> {
        Self::new(Body::Path { head: Head::Local })
    }

    /// A path bound to the outermost document (`$`).
    pub fn root() -> Rc<Self> {
        Self::new(Body::Path { head: Head::Root })
    }

    /// A path whose head will be supplied by a projecting set.
    pub fn accessor() -> Rc<Self> {
        Self::new(Body::Path {
            head: Head::Accessor,
        })
    }

    /// A path with a concrete head.
    pub fn with_head(head: Value) -> Rc<Self> {
        Self::new(Body::Path {
            head: Head::Object(head),
        })
    }

    /// A set of path elements.
    pub fn set(elements: Vec<Value>, kind: SetKind) -> Rc<Self> {
        Self::new(Body::Set { elements, kind })
    }

    /// A named call. An argument that is a bare `@` (local head with
    /// an empty tail) would close over the call itself and is
    /// rejected.
    pub fn function(name: String, args: Vec<Value>) -> Result<Rc<Self>> {
        for arg in &args {
            if let Value::Ref(node) = arg {
                let local = matches!(
                    &*node.body.borrow(),
                    Body::Path { head: Head::Local }
                );
                if local && node.length() == 0 {
                    return Err(RefJsonError::InvalidArgument(
                        "recursive function".to_string(),
                    ));
                }
            }
        }
        Ok(Self::new(Body::Func { name, args }))
    }

    /// Wrap the node back into a [`Value`].
    pub fn into_value(self: Rc<Self>) -> Value {
        Value::Ref(self)
    }

    /// Which shape this reference is.
    pub fn ref_kind(&self) -> RefKind {
        match &*self.body.borrow() {
            Body::Path { .. } => RefKind::Path,
            Body::Set { .. } => RefKind::Set,
            Body::Func { .. } => RefKind::Function,
        }
    }

    /// Number of pending tail accessors.
    pub fn length(&self) -> usize {
        self.tail.borrow().len()
    }

    /// True for a path still waiting for its root binding.
    pub fn is_root_headed(&self) -> bool {
        matches!(&*self.body.borrow(), Body::Path { head: Head::Root })
    }

    fn set_elements(&self) -> Vec<Value> {
        match &*self.body.borrow() {
            Body::Set { elements, .. } => elements.clone(),
            _ => Vec::new(),
        }
    }

    fn args_len(&self) -> usize {
        match &*self.body.borrow() {
            Body::Func { args, .. } => args.len(),
            _ => 0,
        }
    }

    fn arg_at(&self, position: usize) -> Value {
        match &*self.body.borrow() {
            Body::Func { args, .. } => args[position].clone(),
            _ => Value::Null,
        }
    }

    fn replace_arg(&self, position: usize, value: Value) {
        if let Body::Func { args, .. } = &mut *self.body.borrow_mut() {
            args[position] = value;
        }
    }

    fn set_head(&self, value: Value) {
        if let Body::Path { head } = &mut *self.body.borrow_mut() {
            *head = Head::Object(value);
        }
    }

    /// Append one accessor. A concrete path (object head, empty tail)
    /// simplifies immediately; a set distributes the accessor to every
    /// element; a function only queues it.
    pub fn emplace_back(self: &Rc<Self>, accessor: Value, options: &EvalOptions) -> Result<()> {
        if self.ref_kind() == RefKind::Set {
            for element in self.set_elements() {
                if let Value::Ref(node) = &element {
                    node.emplace_back(accessor.clone(), options)?;
                }
            }
            return Ok(());
        }
        let concrete = self.length() == 0
            && matches!(
                &*self.body.borrow(),
                Body::Path {
                    head: Head::Object(_)
                }
            );
        self.tail.borrow_mut().push_back(accessor);
        if concrete {
            self.simplify(options)?;
        }
        Ok(())
    }

    /// Bind the enclosing container. A path rewrites a `Local` or
    /// `Accessor` head to the parent and simplifies; a set binds its
    /// elements and becomes an inline-set; a function binds reference
    /// arguments and replaces them with their reduced values.
    pub fn set_parent(self: &Rc<Self>, parent: &Value, options: &EvalOptions) -> Result<()> {
        match self.ref_kind() {
            RefKind::Path => {
                let rebound = {
                    let mut body = self.body.borrow_mut();
                    match &mut *body {
                        Body::Path { head } if matches!(head, Head::Local | Head::Accessor) => {
                            *head = Head::Object(parent.clone());
                            true
                        }
                        _ => false,
                    }
                };
                if rebound {
                    self.simplify(options)?;
                }
            }
            RefKind::Set => {
                for element in self.set_elements() {
                    if let Value::Ref(node) = &element {
                        node.set_parent(parent, options)?;
                    }
                }
                if let Body::Set { kind, .. } = &mut *self.body.borrow_mut() {
                    *kind = SetKind::Inline;
                }
            }
            RefKind::Function => {
                for position in 0..self.args_len() {
                    let arg = self.arg_at(position);
                    if let Value::Ref(node) = &arg {
                        node.set_parent(parent, options)?;
                        self.replace_arg(position, node.value()?);
                    }
                }
            }
        }
        Ok(())
    }

    /// Bind the outermost document: propagate through tails, elements,
    /// and arguments, rewrite `Root` heads, and simplify.
    pub fn set_root(self: &Rc<Self>, root: &Value, options: &EvalOptions) -> Result<()> {
        if !self.flags.enter() {
            return Ok(());
        }
        let result = self.set_root_inner(root, options);
        self.flags.exit();
        result
    }

    fn set_root_inner(self: &Rc<Self>, root: &Value, options: &EvalOptions) -> Result<()> {
        for position in 0..self.length() {
            let accessor = self.tail.borrow()[position].clone();
            accessor.set_root(root, options)?;
        }
        match self.ref_kind() {
            RefKind::Path => {
                {
                    let mut body = self.body.borrow_mut();
                    if let Body::Path { head: head @ Head::Root } = &mut *body {
                        *head = Head::Object(root.clone());
                    }
                }
                // Accessors in the tail may have just become concrete
                // even when the head already was.
                self.simplify(options)?;
            }
            RefKind::Set => {
                for element in self.set_elements() {
                    element.set_root(root, options)?;
                }
            }
            RefKind::Function => {
                for position in 0..self.args_len() {
                    self.arg_at(position).set_root(root, options)?;
                }
            }
        }
        Ok(())
    }

    /// The most-reduced form of this reference.
    ///
    /// A path with an empty tail unwraps its concrete head, chasing
    /// through nested references. A set collapses to a plain array
    /// once every element has fully reduced. A function evaluates when
    /// its name is built in and its arguments resolve. Anything else
    /// stays the reference itself.
    pub fn value(self: &Rc<Self>) -> Result<Value> {
        if self.length() > 0 {
            return Ok(Value::Ref(self.clone()));
        }
        match self.ref_kind() {
            RefKind::Path => {
                let head = match &*self.body.borrow() {
                    Body::Path {
                        head: Head::Object(value),
                    } => Some(value.clone()),
                    _ => None,
                };
                match head {
                    Some(Value::Ref(inner)) => inner.value(),
                    Some(value) => Ok(value),
                    None => Ok(Value::Ref(self.clone())),
                }
            }
            RefKind::Set => {
                let elements = self.set_elements();
                let mut reduced = Vec::with_capacity(elements.len());
                for element in &elements {
                    let value = match element {
                        Value::Ref(node) => node.value()?,
                        other => other.clone(),
                    };
                    if matches!(value, Value::Ref(_)) {
                        return Ok(Value::Ref(self.clone()));
                    }
                    reduced.push(value);
                }
                Ok(Value::array(reduced))
            }
            RefKind::Function => self.eval_function(),
        }
    }

    /// Evaluate a built-in call. Unknown names stay symbolic.
    fn eval_function(self: &Rc<Self>) -> Result<Value> {
        let name = match &*self.body.borrow() {
            Body::Func { name, .. } => name.clone(),
            _ => return Ok(Value::Ref(self.clone())),
        };
        match name.as_str() {
            "size" => {
                if self.args_len() != 1 {
                    return Ok(Value::Int(self.args_len() as i32));
                }
                match self.resolve_arg(0)? {
                    Value::Array(node) => Ok(Value::Int(node.len() as i32)),
                    Value::Object(node) => Ok(Value::Int(node.len() as i32)),
                    _ => Ok(Value::Ref(self.clone())),
                }
            }
            "min" | "max" => self.eval_fold(&name),
            _ => Ok(Value::Ref(self.clone())),
        }
    }

    /// Fold `min`/`max` over the arguments, or over the items of a
    /// single array argument. Items must reduce to integers; any item
    /// that stays symbolic keeps the whole call symbolic; an empty
    /// fold is an error.
    fn eval_fold(self: &Rc<Self>, name: &str) -> Result<Value> {
        let is_max = name == "max";
        let items: Vec<Value> = if self.args_len() == 1 {
            match self.resolve_arg(0)? {
                Value::Ref(_) => return Ok(Value::Ref(self.clone())),
                Value::Array(node) => node.items().clone(),
                other => vec![other],
            }
        } else {
            (0..self.args_len()).map(|i| self.arg_at(i)).collect()
        };
        let mut best: Option<i32> = None;
        for item in items {
            let value = match &item {
                Value::Ref(node) => node.value()?,
                other => other.clone(),
            };
            match value {
                Value::Ref(_) => return Ok(Value::Ref(self.clone())),
                Value::Int(candidate) => {
                    best = Some(match best {
                        None => candidate,
                        Some(current) if is_max => current.max(candidate),
                        Some(current) => current.min(candidate),
                    });
                }
                _ => {
                    return Err(RefJsonError::InvalidArgument(format!(
                        "trying to calculate `{name}()` of not integer"
                    )))
                }
            }
        }
        best.map(Value::Int).ok_or_else(|| {
            RefJsonError::InvalidArgument(format!(
                "trying to calculate `{name}()` of empty array"
            ))
        })
    }

    /// Reduce the argument at `position`, writing the reduced value
    /// back into the slot.
    fn resolve_arg(self: &Rc<Self>, position: usize) -> Result<Value> {
        let arg = self.arg_at(position);
        if let Value::Ref(node) = &arg {
            let reduced = node.value()?;
            self.replace_arg(position, reduced.clone());
            return Ok(reduced);
        }
        Ok(arg)
    }

    /// The rewrite loop: while the head is a concrete object and the
    /// tail is non-empty, consume the front accessor.
    pub(crate) fn simplify(self: &Rc<Self>, options: &EvalOptions) -> Result<()> {
        loop {
            let head = match &*self.body.borrow() {
                Body::Path {
                    head: Head::Object(value),
                } => value.clone(),
                _ => return Ok(()),
            };
            let Some(accessor) = self.tail.borrow().front().cloned() else {
                return Ok(());
            };

            if let Value::Ref(head_ref) = &head {
                // A reference head absorbs the accessor, collapsing
                // the chain; a set head distributes it.
                self.tail.borrow_mut().pop_front();
                head_ref.emplace_back(accessor, options)?;
                self.set_head(head_ref.value()?);
                continue;
            }

            if let Value::Ref(acc) = &accessor {
                match acc.ref_kind() {
                    RefKind::Path => {
                        if acc.is_root_headed() {
                            // Unresolvable until a root binding arrives.
                            return Ok(());
                        }
                        acc.set_parent(&head, options)?;
                        let reduced = acc.value()?;
                        if let Value::Ref(node) = &reduced {
                            if Rc::ptr_eq(node, acc) {
                                // Stalled on a symbolic dependency.
                                return Ok(());
                            }
                        }
                        self.tail.borrow_mut()[0] = reduced;
                        continue;
                    }
                    RefKind::Set => {
                        acc.set_parent(&head, options)?;
                        // The projected set becomes the head but stays
                        // symbolic here, so trailing accessors
                        // distribute into its elements; it collapses to
                        // a plain array at the next value() once every
                        // element is concrete.
                        self.tail.borrow_mut().pop_front();
                        self.set_head(accessor.clone());
                        continue;
                    }
                    RefKind::Function => {
                        // Functions reduce only on an explicit value().
                        return Ok(());
                    }
                }
            }

            let reduced = head.by(&accessor, options)?;
            self.tail.borrow_mut().pop_front();
            self.set_head(reduced);
        }
    }

    /// Recursive visit for cycle flagging; see [`Value::touch`].
    pub(crate) fn touch(&self) {
        if !self.flags.enter() {
            return;
        }
        match &*self.body.borrow() {
            Body::Path {
                head: Head::Object(value),
            } => value.touch(),
            Body::Path { .. } => {}
            Body::Set { elements, .. } => {
                for element in elements {
                    element.touch();
                }
            }
            Body::Func { args, .. } => {
                for arg in args {
                    arg.touch();
                }
            }
        }
        for accessor in self.tail.borrow().iter() {
            accessor.touch();
        }
        self.flags.exit();
    }

    /// Render the reference. `$`, `@`, and accessor heads render as
    /// themselves (the latter as nothing); object heads render
    /// recursively; the tail renders compact.
    pub(crate) fn render(&self, level: usize, pretty: bool) -> Result<String> {
        if self.flags.looped() {
            return Err(RefJsonError::Looped);
        }
        if !self.flags.enter() {
            return Err(RefJsonError::Looped);
        }
        let result = self.render_body(level, pretty);
        self.flags.exit();
        result
    }

    fn render_body(&self, level: usize, pretty: bool) -> Result<String> {
        let mut out = String::new();
        match &*self.body.borrow() {
            Body::Path { head } => match head {
                Head::Object(value) => out.push_str(&value.render_indented(level, pretty)?),
                Head::Local => out.push('@'),
                Head::Root => out.push('$'),
                Head::Accessor => {}
            },
            Body::Set { elements, kind } => {
                let (open, close) = match kind {
                    SetKind::Inline => ('[', ']'),
                    SetKind::Accessor => ('{', '}'),
                };
                out.push(open);
                for (position, element) in elements.iter().enumerate() {
                    if position > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&element.render_indented(0, false)?);
                }
                out.push(close);
            }
            Body::Func { name, args } => {
                out.push_str(name);
                out.push('(');
                for (position, arg) in args.iter().enumerate() {
                    if position > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&arg.render_indented(0, false)?);
                }
                out.push(')');
            }
        }
        out.push_str(&self.render_tail()?);
        Ok(out)
    }

    /// Tail accessors render compact inside brackets; a string key
    /// renders as `["key"]`, an index as `[3]`, a set as itself.
    fn render_tail(&self) -> Result<String> {
        let mut out = String::new();
        for accessor in self.tail.borrow().iter() {
            if let Value::Ref(node) = accessor {
                if node.ref_kind() == RefKind::Set {
                    out.push_str(&accessor.render_indented(0, false)?);
                    continue;
                }
            }
            out.push('[');
            out.push_str(&accessor.render_indented(0, false)?);
            out.push(']');
        }
        Ok(out)
    }
}
