//! Mutable type expressions and the store that owns them.
//!
//! # Representation
//! Every type expression in a workspace is a node in a single [`TypeStore`],
//! addressed by a copyable [`TyId`]. Compound nodes refer to their children
//! by id, and a type variable refers to the type it has been unified with (if
//! any) by id as well. Binding a variable is therefore a single in-place
//! update of one node, and dereferencing is a walk along `val` links.
//!
//! The node vector is an [`ena`] snapshot vector. Every binding, unbinding and
//! allocation is recorded in its undo log while a snapshot is open, which is
//! what makes [`TypeStore::able_to_unify`] side-effect free and lets a whole
//! editing operation be rolled back if inference fails halfway through. The
//! store keeps a second log for its side tables (generated names and free
//! slots) so that a rollback restores those too.
//!
//! # Ownership
//! A connection owns the tree rooted at its type: the compound nodes and the
//! variables reachable from the root *without* following `val` links. Trees
//! never share container nodes; sharing happens only through variable
//! bindings. [`TypeStore::clear`] relies on this to unbind exactly the
//! variables a connection owns.
//!
//! # Inference passes
//! Nodes allocated between [`TypeStore::begin_pass`] and
//! [`TypeStore::end_pass`] (let signatures, scheme instances) are scratch:
//! they live until the next pass begins, at which point their slots are
//! recycled. Variables created during a pass are named from a counter that
//! restarts with every pass, so re-inferring an unchanged workspace renders
//! the same names.

use std::collections::{HashMap, HashSet};

use ena::snapshot_vec::{Snapshot, SnapshotVec, SnapshotVecDelegate};

use crate::symbol::{StringInterner, Symbol};

pub mod display;
pub mod scheme;
pub mod unify;

pub use display::TyDisplay;
pub use scheme::{Scheme, TypeEnv};
pub use unify::UnifyError;

/// A handle to a node in a [`TypeStore`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TyId(u32);

impl TyId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The tag of a [`TypeExpr`], without any of its children.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Label {
    Int,
    Float,
    Bool,
    String,
    Var,
    List,
    Pair,
    Sum,
    Fun,
    Construct,
}

/// A single node of a type expression graph.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Float,
    Bool,
    String,
    /// A type variable, bound to `val` once it has been unified with
    /// something other than itself.
    Var {
        name: Symbol,
        val: Option<TyId>,
    },
    List(TyId),
    Pair(TyId, TyId),
    Sum(TyId, TyId),
    Fun(TyId, TyId),
    /// A user-defined record or variant type constructor.
    Construct {
        name: Symbol,
        args: Box<[TyId]>,
    },
}

impl TypeExpr {
    pub fn label(&self) -> Label {
        match self {
            TypeExpr::Int => Label::Int,
            TypeExpr::Float => Label::Float,
            TypeExpr::Bool => Label::Bool,
            TypeExpr::String => Label::String,
            TypeExpr::Var { .. } => Label::Var,
            TypeExpr::List(_) => Label::List,
            TypeExpr::Pair(..) => Label::Pair,
            TypeExpr::Sum(..) => Label::Sum,
            TypeExpr::Fun(..) => Label::Fun,
            TypeExpr::Construct { .. } => Label::Construct,
        }
    }

    #[must_use]
    pub fn is_var(&self) -> bool {
        matches!(self, TypeExpr::Var { .. })
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeExpr::Int | TypeExpr::Float | TypeExpr::Bool | TypeExpr::String
        )
    }

    /// Returns the structural children of this node in order. The value a
    /// variable is bound to is *not* a structural child.
    pub fn children(&self) -> Vec<TyId> {
        match self {
            TypeExpr::Int
            | TypeExpr::Float
            | TypeExpr::Bool
            | TypeExpr::String
            | TypeExpr::Var { .. } => Vec::new(),
            TypeExpr::List(elem) => vec![*elem],
            TypeExpr::Pair(a, b) | TypeExpr::Sum(a, b) | TypeExpr::Fun(a, b) => {
                vec![*a, *b]
            }
            TypeExpr::Construct { args, .. } => args.to_vec(),
        }
    }

    /// Rebuilds this node with its structural children replaced, in order,
    /// by `children`.
    fn with_children(&self, children: &[TyId]) -> TypeExpr {
        match self {
            TypeExpr::List(_) => TypeExpr::List(children[0]),
            TypeExpr::Pair(..) => TypeExpr::Pair(children[0], children[1]),
            TypeExpr::Sum(..) => TypeExpr::Sum(children[0], children[1]),
            TypeExpr::Fun(..) => TypeExpr::Fun(children[0], children[1]),
            TypeExpr::Construct { name, .. } => TypeExpr::Construct {
                name: *name,
                args: children.into(),
            },
            leaf => leaf.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TypeDelegate;

impl SnapshotVecDelegate for TypeDelegate {
    type Value = TypeExpr;
    type Undo = ();

    fn reverse(_values: &mut Vec<TypeExpr>, _action: ()) {}
}

/// An open snapshot of a [`TypeStore`]. It must be handed back to either
/// [`TypeStore::rollback_to`] or [`TypeStore::commit`].
#[must_use]
pub struct TypeSnapshot {
    nodes: Snapshot,
    log_len: usize,
}

/// A change to the side tables of a [`TypeStore`], recorded so that it can
/// be reverted on rollback.
#[derive(Debug)]
enum StoreUndo {
    Counter(u32),
    Taken(Symbol),
    PassCounter(u32),
    PassName(Symbol),
    FreePopped(TyId),
    ScratchPushed,
    PassBegun {
        scratch: Vec<TyId>,
        names: HashSet<Symbol>,
        counter: u32,
    },
}

/// The arena owning every type expression of a workspace.
pub struct TypeStore {
    nodes: SnapshotVec<TypeDelegate>,
    /// Type variable and constructor names.
    names: StringInterner,
    /// Names of variables owned by blocks, so that generated names never
    /// collide with them.
    taken: HashSet<Symbol>,
    counter: u32,
    /// Names handed out during the current (or last) inference pass.
    pass_names: HashSet<Symbol>,
    pass_counter: u32,
    in_pass: bool,
    /// Slots that can be reused by the next allocation.
    free: Vec<TyId>,
    /// Slots that become free when the next pass begins.
    scratch: Vec<TyId>,
    log: Vec<StoreUndo>,
    open: usize,
}

impl std::fmt::Debug for TypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeStore")
            .field("nodes", &self.nodes.len())
            .field("free", &self.free.len())
            .field("scratch", &self.scratch.len())
            .field("counter", &self.counter)
            .finish()
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        Self {
            nodes: SnapshotVec::new(),
            names: StringInterner::new(),
            taken: HashSet::new(),
            counter: 1,
            pass_names: HashSet::new(),
            pass_counter: 1,
            in_pass: false,
            free: Vec::new(),
            scratch: Vec::new(),
            log: Vec::new(),
            open: 0,
        }
    }

    /// The number of node slots in this store, including recycled ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn get(&self, id: TyId) -> &TypeExpr {
        self.nodes.get(id.index())
    }

    pub fn label(&self, id: TyId) -> Label {
        self.get(id).label()
    }

    /// Returns the binding of `id` if it is a bound variable.
    pub fn val(&self, id: TyId) -> Option<TyId> {
        match self.get(id) {
            TypeExpr::Var { val, .. } => *val,
            _ => None,
        }
    }

    /// Returns the name of the variable `id`, or `None` if `id` is not a
    /// variable.
    pub fn var_name(&self, id: TyId) -> Option<&str> {
        match self.get(id) {
            TypeExpr::Var { name, .. } => Some(self.names.name(*name)),
            _ => None,
        }
    }

    pub fn names(&self) -> &StringInterner {
        &self.names
    }

    fn push(&mut self, node: TypeExpr) -> TyId {
        let id = match self.free.pop() {
            Some(id) => {
                self.record(StoreUndo::FreePopped(id));
                self.nodes.set(id.index(), node);
                id
            }
            None => TyId(self.nodes.push(node) as u32),
        };

        if self.in_pass {
            self.scratch.push(id);
            self.record(StoreUndo::ScratchPushed);
        }
        id
    }

    fn record(&mut self, undo: StoreUndo) {
        if self.open > 0 {
            self.log.push(undo);
        }
    }

    fn revert(&mut self, undo: StoreUndo) {
        match undo {
            StoreUndo::Counter(counter) => self.counter = counter,
            StoreUndo::Taken(name) => {
                self.taken.remove(&name);
            }
            StoreUndo::PassCounter(counter) => self.pass_counter = counter,
            StoreUndo::PassName(name) => {
                self.pass_names.remove(&name);
            }
            StoreUndo::FreePopped(id) => self.free.push(id),
            StoreUndo::ScratchPushed => {
                self.scratch.pop();
            }
            StoreUndo::PassBegun {
                scratch,
                names,
                counter,
            } => {
                self.free.truncate(self.free.len() - scratch.len());
                self.scratch = scratch;
                self.pass_names = names;
                self.pass_counter = counter;
            }
        }
    }

    // CONSTRUCTORS

    pub fn int(&mut self) -> TyId {
        self.push(TypeExpr::Int)
    }

    pub fn float(&mut self) -> TyId {
        self.push(TypeExpr::Float)
    }

    pub fn bool(&mut self) -> TyId {
        self.push(TypeExpr::Bool)
    }

    pub fn string(&mut self) -> TyId {
        self.push(TypeExpr::String)
    }

    pub fn list(&mut self, elem: TyId) -> TyId {
        self.push(TypeExpr::List(elem))
    }

    pub fn pair(&mut self, first: TyId, second: TyId) -> TyId {
        self.push(TypeExpr::Pair(first, second))
    }

    pub fn sum(&mut self, left: TyId, right: TyId) -> TyId {
        self.push(TypeExpr::Sum(left, right))
    }

    pub fn fun(&mut self, param: TyId, ret: TyId) -> TyId {
        self.push(TypeExpr::Fun(param, ret))
    }

    pub fn construct(&mut self, name: &str, args: &[TyId]) -> TyId {
        let name = self.names.intern(name);
        self.push(TypeExpr::Construct {
            name,
            args: args.into(),
        })
    }

    /// Creates an unbound variable with an explicit name.
    pub fn tvar(&mut self, name: &str) -> TyId {
        let name = self.names.intern(name);
        if self.taken.insert(name) {
            self.record(StoreUndo::Taken(name));
        }
        self.push(TypeExpr::Var { name, val: None })
    }

    /// Creates an unbound variable with a generated name that is not used by
    /// any other live variable in this store.
    pub fn fresh_var(&mut self) -> TyId {
        let name = if self.in_pass {
            self.fresh_pass_name()
        } else {
            self.fresh_owned_name()
        };

        self.push(TypeExpr::Var { name, val: None })
    }

    fn fresh_owned_name(&mut self) -> Symbol {
        self.record(StoreUndo::Counter(self.counter));
        loop {
            let symbol = self.names.intern(&spreadsheet_column(self.counter));
            self.counter += 1;

            if !self.pass_names.contains(&symbol) && self.taken.insert(symbol) {
                self.record(StoreUndo::Taken(symbol));
                return symbol;
            }
        }
    }

    fn fresh_pass_name(&mut self) -> Symbol {
        self.record(StoreUndo::PassCounter(self.pass_counter));
        loop {
            let symbol = self.names.intern(&spreadsheet_column(self.pass_counter));
            self.pass_counter += 1;

            if !self.taken.contains(&symbol) && self.pass_names.insert(symbol) {
                self.record(StoreUndo::PassName(symbol));
                return symbol;
            }
        }
    }

    /// Builds the curried function type `t1 -> t2 -> ... -> r` from
    /// `[t1, t2, ..., r]`.
    ///
    /// # Panics
    /// Panics if fewer than two types are given.
    pub fn fun_type(&mut self, types: &[TyId]) -> TyId {
        let [params @ .., ret] = types else {
            panic!("a function type needs a parameter and a return type");
        };
        assert!(
            !params.is_empty(),
            "a function type needs a parameter and a return type"
        );

        params
            .iter()
            .rev()
            .fold(*ret, |acc, &param| self.fun(param, acc))
    }

    /// Splits a (dereferenced) curried function type into its parameter types
    /// followed by its final return type. Non-function types yield an empty
    /// vector.
    pub fn function_to_vec(&self, ty: TyId) -> Vec<TyId> {
        let mut ty = self.deref(ty);
        if !matches!(self.get(ty), TypeExpr::Fun(..)) {
            return Vec::new();
        }

        let mut parts = Vec::new();
        while let TypeExpr::Fun(param, ret) = self.get(ty) {
            parts.push(*param);
            ty = self.deref(*ret);
        }
        parts.push(ty);
        parts
    }

    // DEREFERENCING

    /// Follows variable bindings until reaching an unbound variable or a
    /// non-variable node.
    pub fn deref(&self, id: TyId) -> TyId {
        let mut current = id;
        while let TypeExpr::Var { val: Some(next), .. } = self.get(current) {
            current = *next;
        }
        current
    }

    /// Like [`deref`](Self::deref), but also points every variable on the
    /// walked chain directly at the result.
    pub(crate) fn find(&mut self, id: TyId) -> TyId {
        let root = self.deref(id);

        let mut current = id;
        while let TypeExpr::Var {
            name,
            val: Some(next),
        } = *self.get(current)
        {
            if next != root {
                self.nodes.set(
                    current.index(),
                    TypeExpr::Var {
                        name,
                        val: Some(root),
                    },
                );
            }
            current = next;
        }

        root
    }

    // BINDING

    /// Binds the unbound variable `var` to `target`.
    ///
    /// # Panics
    /// Panics if `var` is not an unbound variable.
    pub(crate) fn bind(&mut self, var: TyId, target: TyId) {
        match *self.get(var) {
            TypeExpr::Var { name, val: None } => {
                tracing::trace!(?var, ?target, "binding type variable");
                self.nodes.set(
                    var.index(),
                    TypeExpr::Var {
                        name,
                        val: Some(target),
                    },
                );
            }
            ref other => panic!("tried to bind {var:?}, which is {other:?}"),
        }
    }

    /// Resets the variable `var` to unbound. Non-variables are left as is.
    pub fn unbind(&mut self, var: TyId) {
        if let TypeExpr::Var {
            name,
            val: Some(_),
        } = *self.get(var)
        {
            self.nodes
                .set(var.index(), TypeExpr::Var { name, val: None });
        }
    }

    /// Unbinds every variable owned by the tree rooted at `root`, i.e. every
    /// variable reachable through structural children without following any
    /// variable binding.
    pub fn clear(&mut self, root: TyId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.get(id) {
                TypeExpr::Var { .. } => self.unbind(id),
                node => stack.extend(node.children()),
            }
        }
    }

    // QUERIES

    /// Returns `true` if a variable called `name` occurs anywhere in `ty`,
    /// including through variable bindings.
    pub fn occurs(&self, ty: TyId, name: &str) -> bool {
        let Some(name) = self.names.get(name) else {
            return false;
        };

        let mut stack = vec![ty];
        while let Some(id) = stack.pop() {
            match self.get(id) {
                TypeExpr::Var { name: n, val } => {
                    if *n == name {
                        return true;
                    }
                    stack.extend(*val);
                }
                node => stack.extend(node.children()),
            }
        }
        false
    }

    /// Returns `true` if the unbound variable `var` occurs in `ty`, looking
    /// through bound variables.
    pub fn occurs_var(&self, var: TyId, ty: TyId) -> bool {
        let mut stack = vec![ty];
        while let Some(id) = stack.pop() {
            let id = self.deref(id);
            if id == var {
                return true;
            }
            stack.extend(self.get(id).children());
        }
        false
    }

    /// Collects the unbound variables reachable from `ty` through
    /// dereferencing, in left-to-right order of first occurrence.
    pub fn tvars(&self, ty: TyId) -> Vec<TyId> {
        let mut seen = HashSet::new();
        let mut vars = Vec::new();
        let mut stack = vec![ty];

        while let Some(id) = stack.pop() {
            let id = self.deref(id);
            match self.get(id) {
                TypeExpr::Var { .. } => {
                    if seen.insert(id) {
                        vars.push(id);
                    }
                }
                node => stack.extend(node.children().into_iter().rev()),
            }
        }

        vars
    }

    /// Deep-copies `ty`. Every node reachable from `ty` (through bindings
    /// too) is copied exactly once, so that two references to the same
    /// original node point to the same copy afterwards.
    pub fn clone_type(&mut self, ty: TyId) -> TyId {
        let mut copies = HashMap::new();
        self.clone_with(ty, &mut copies)
    }

    fn clone_with(
        &mut self,
        id: TyId,
        copies: &mut HashMap<TyId, TyId>,
    ) -> TyId {
        if let Some(&copy) = copies.get(&id) {
            return copy;
        }

        let node = self.get(id).clone();
        let copy = match node {
            TypeExpr::Var { name, val } => {
                let val = val.map(|val| self.clone_with(val, copies));
                self.push(TypeExpr::Var { name, val })
            }
            node => {
                let children = node
                    .children()
                    .into_iter()
                    .map(|child| self.clone_with(child, copies))
                    .collect::<Vec<_>>();
                self.push(node.with_children(&children))
            }
        };

        copies.insert(id, copy);
        copy
    }

    // INFERENCE PASSES

    /// Starts an inference pass. The scratch nodes of the previous pass are
    /// recycled, so every type owned by a block must have been
    /// [cleared](Self::clear) beforehand.
    pub fn begin_pass(&mut self) {
        let scratch = std::mem::take(&mut self.scratch);
        self.free.extend(scratch.iter().copied());
        tracing::trace!(recycled = scratch.len(), "began inference pass");

        let names = std::mem::take(&mut self.pass_names);
        let counter = std::mem::replace(&mut self.pass_counter, 1);
        self.record(StoreUndo::PassBegun {
            scratch,
            names,
            counter,
        });
        self.in_pass = true;
    }

    pub fn end_pass(&mut self) {
        self.in_pass = false;
    }

    /// Hands the tree rooted at `root` back to the store. Its slots are
    /// recycled when the next inference pass begins.
    pub fn retire(&mut self, root: TyId) {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            stack.extend(self.get(id).children());
            self.scratch.push(id);
            self.record(StoreUndo::ScratchPushed);
        }
    }

    // SNAPSHOTS

    pub fn start_snapshot(&mut self) -> TypeSnapshot {
        self.open += 1;
        TypeSnapshot {
            nodes: self.nodes.start_snapshot(),
            log_len: self.log.len(),
        }
    }

    /// Undoes every binding, unbinding and allocation made since `snapshot`,
    /// along with the names handed out in the meantime.
    pub fn rollback_to(&mut self, snapshot: TypeSnapshot) {
        while self.log.len() > snapshot.log_len {
            if let Some(undo) = self.log.pop() {
                self.revert(undo);
            }
        }
        self.nodes.rollback_to(snapshot.nodes);
        self.open -= 1;
    }

    pub fn commit(&mut self, snapshot: TypeSnapshot) {
        self.nodes.commit(snapshot.nodes);
        self.open -= 1;
        if self.open == 0 {
            self.log.clear();
        }
    }
}

/// Returns the `n`th (1-based) spreadsheet column name: `A`, ..., `Z`, `AA`,
/// `AB`, and so on.
fn spreadsheet_column(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}
