//! The editing surface: blocks, their connections, and the type state that
//! follows them.
//!
//! Every structural edit is atomic. The edit is applied, every type owned by
//! every block is cleared, and each top block is re-inferred from scratch
//! inside a [`TypeStore`] snapshot. If inference fails the snapshot is rolled
//! back and the structural change is undone, so observers only ever see a
//! consistently typed workspace.
//!
//! Top blocks form a program in creation order. A variable block looks for
//! its declaration among its ancestors first and then among the statements
//! created before its top block; a constructor block only looks at
//! statements.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    binding::{BindingTable, TypedVariableValueReference},
    block::{Block, BlockKind, BlockSpec},
    infer::{TypeError, Typer},
    symbol::{StringInterner, Symbol},
    types::{TyId, TypeStore},
    unique::{BlockId, RefId, ValueId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no block with id {0:?}")]
    NoSuchBlock(BlockId),
    #[error("no variable with id {0:?}")]
    NoSuchValue(ValueId),
    #[error("{block:?} has no input named {input}")]
    NoSuchInput { block: BlockId, input: Box<str> },
    #[error("input {input} of {block:?} is already connected")]
    InputOccupied { block: BlockId, input: Box<str> },
    #[error("input {input} of {block:?} is not connected")]
    NotConnected { block: BlockId, input: Box<str> },
    #[error("{0:?} is already connected to another block")]
    AlreadyConnected(BlockId),
    #[error("connecting {child:?} to {parent:?} would create a cycle")]
    Cycle { parent: BlockId, child: BlockId },
    #[error("{0:?} is a statement and has no output")]
    NoOutput(BlockId),
    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type Result<T = ()> = std::result::Result<T, EditError>;

#[derive(Debug, Default)]
pub struct Workspace {
    store: TypeStore,
    bindings: BindingTable,
    interner: StringInterner,
    blocks: BTreeMap<BlockId, Block>,
    unify_orphans: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a workspace in which a variable block that has been moved out
    /// of the scope of its declaration keeps its resolution and still takes
    /// the declaration's type.
    pub fn with_unify_orphans(unify_orphans: bool) -> Self {
        Self {
            unify_orphans,
            ..Self::default()
        }
    }

    // ACCESSORS

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub(crate) fn store_mut(&mut self) -> &mut TypeStore {
        &mut self.store
    }

    pub fn unify_orphans(&self) -> bool {
        self.unify_orphans
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Blocks without a parent, in creation order.
    pub fn top_blocks(&self) -> Vec<BlockId> {
        self.blocks
            .values()
            .filter(|block| block.parent().is_none())
            .map(Block::id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The output type of `block`.
    pub fn type_of(&self, block: BlockId) -> Option<TyId> {
        self.blocks.get(&block).map(Block::output)
    }

    /// The type of the input `input` of `block`.
    pub fn input_type(&self, block: BlockId, input: &str) -> Option<TyId> {
        let block = self.blocks.get(&block)?;
        let index = block.input_index(input)?;
        Some(block.input(index).ty())
    }

    /// The name of the variable `value`.
    pub fn value_name(&self, value: ValueId) -> Option<&str> {
        let value = self.bindings.get_value_by_id(value)?;
        Some(self.interner.name(value.name()))
    }

    /// The name a variable block displays.
    pub fn reference_name(&self, reference: RefId) -> Option<&str> {
        let name = self.bindings.display_name(reference)?;
        Some(self.interner.name(name))
    }

    fn get(&self, id: BlockId) -> Result<&Block> {
        self.blocks.get(&id).ok_or(EditError::NoSuchBlock(id))
    }

    fn get_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks.get_mut(&id).ok_or(EditError::NoSuchBlock(id))
    }

    // EDITS

    /// Creates a new top block.
    pub fn new_block(&mut self, spec: BlockSpec) -> BlockId {
        let block = Block::build(spec, &mut self.store, &mut self.bindings, &mut self.interner);
        let id = block.id();
        tracing::debug!(?id, kind = %block.kind(), "created block");
        self.blocks.insert(id, block);
        id
    }

    /// Connects the output of `child` to the input `input` of `parent`.
    pub fn connect(&mut self, parent: BlockId, input: &str, child: BlockId) -> Result {
        let index = self.check_connection(parent, input, child)?;

        let snapshot = self.store.start_snapshot();
        self.attach(parent, index, child);

        if let Err(err) = self.reinfer() {
            tracing::debug!(?parent, input, ?child, %err, "rejected connection");
            self.store.rollback_to(snapshot);
            self.detach(parent, index);
            return Err(err.into());
        }

        self.store.commit(snapshot);
        tracing::debug!(?parent, input, ?child, "connected blocks");
        self.resolve_references();
        Ok(())
    }

    /// Returns `true` if [`connect`](Self::connect) would succeed with the
    /// same arguments. The workspace is left untouched.
    pub fn can_connect(&mut self, parent: BlockId, input: &str, child: BlockId) -> bool {
        let Ok(index) = self.check_connection(parent, input, child) else {
            return false;
        };

        let input_ty = self.blocks[&parent].input(index).ty();
        let output_ty = self.blocks[&child].output();
        if !self.store.able_to_unify(input_ty, output_ty) {
            return false;
        }

        let snapshot = self.store.start_snapshot();
        self.attach(parent, index, child);
        let result = self.reinfer();
        self.store.rollback_to(snapshot);
        self.detach(parent, index);

        result.is_ok()
    }

    /// Disconnects whatever is plugged into the input `input` of `parent` and
    /// returns it. The disconnected block becomes a top block.
    pub fn disconnect(&mut self, parent: BlockId, input: &str) -> Result<BlockId> {
        let block = self.get(parent)?;
        let index = block
            .input_index(input)
            .ok_or_else(|| EditError::NoSuchInput {
                block: parent,
                input: input.into(),
            })?;
        let child = block
            .input(index)
            .target()
            .ok_or_else(|| EditError::NotConnected {
                block: parent,
                input: input.into(),
            })?;

        let snapshot = self.store.start_snapshot();
        self.detach(parent, index);

        if let Err(err) = self.reinfer() {
            self.store.rollback_to(snapshot);
            self.attach(parent, index, child);
            return Err(err.into());
        }

        self.store.commit(snapshot);
        tracing::debug!(?parent, input, ?child, "disconnected blocks");
        self.resolve_references();
        Ok(child)
    }

    /// Removes `id` and every block connected beneath it, together with the
    /// variables they declare and the references they hold. References to
    /// removed variables elsewhere in the workspace become unresolved.
    pub fn dispose_block(&mut self, id: BlockId) -> Result {
        let block = self.get(id)?;
        if let Some((parent, index)) = block.parent() {
            self.detach(parent, index);
        }

        self.remove_tree(id);
        self.resolve_references();
        self.update_type_inference()?;
        Ok(())
    }

    /// Renames the variable `value`. References bound to it follow the new
    /// name.
    pub fn rename_value(&mut self, value: ValueId, name: &str) -> Result {
        let name = self.interner.intern(name);
        let old = self
            .bindings
            .get_value_mut(value)
            .ok_or(EditError::NoSuchValue(value))?;
        let previous = old.name();
        old.set_name(name);

        if let Err(err) = self.update_type_inference() {
            if let Some(value) = self.bindings.get_value_mut(value) {
                value.set_name(previous);
            }
            return Err(err.into());
        }

        self.resolve_references();
        Ok(())
    }

    /// Clears every type and re-infers every top block. On failure the types
    /// are left as they were before the call.
    pub fn update_type_inference(&mut self) -> std::result::Result<(), TypeError> {
        let snapshot = self.store.start_snapshot();
        match self.reinfer() {
            Ok(()) => {
                self.store.commit(snapshot);
                Ok(())
            }
            Err(err) => {
                self.store.rollback_to(snapshot);
                Err(err)
            }
        }
    }

    /// Resolves every unresolved reference to the nearest enclosing variable
    /// with the same name, and replaces resolved references that are no
    /// longer in scope of their variable with fresh ones.
    pub fn resolve_references(&mut self) {
        let var_blocks = self
            .blocks
            .values()
            .filter_map(|block| Some((block.id(), block.reference()?)))
            .collect::<Vec<_>>();

        for (block, reference) in var_blocks {
            let Some(name) = self.bindings.display_name(reference) else {
                continue;
            };
            let bound = self
                .bindings
                .get_reference_by_id(reference)
                .and_then(TypedVariableValueReference::bound_value);
            let found = self.lookup(block, name);

            let reference = match (bound, found) {
                (Some(bound), Some(found)) if bound == found => continue,
                (Some(_), None) if self.unify_orphans => continue,
                (Some(_), _) => self.recreate_reference(block, reference),
                (None, _) => reference,
            };

            if let Some(found) = found {
                self.bindings.set_bound_value(reference, found);
            }
        }
    }

    /// Removes every block, variable and reference, together with every type
    /// they own.
    pub fn clear(&mut self) {
        self.store = TypeStore::new();
        self.blocks.clear();
        self.bindings.clear();
        tracing::debug!("cleared workspace");
    }

    // INTERNALS

    fn check_connection(&self, parent: BlockId, input: &str, child: BlockId) -> Result<usize> {
        let block = self.get(parent)?;
        let child_block = self.get(child)?;

        let index = block
            .input_index(input)
            .ok_or_else(|| EditError::NoSuchInput {
                block: parent,
                input: input.into(),
            })?;

        if child_block.kind().is_statement() {
            return Err(EditError::NoOutput(child));
        }

        if block.input(index).target().is_some() {
            return Err(EditError::InputOccupied {
                block: parent,
                input: input.into(),
            });
        }

        if child_block.parent().is_some() {
            return Err(EditError::AlreadyConnected(child));
        }

        if self.is_ancestor_or_self(child, parent) {
            return Err(EditError::Cycle { parent, child });
        }

        Ok(index)
    }

    /// Returns `true` if `ancestor` is `block` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: BlockId, block: BlockId) -> bool {
        let mut current = Some(block);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.blocks.get(&id).and_then(Block::parent).map(|(p, _)| p);
        }
        false
    }

    /// Connects without any checks or inference.
    pub(crate) fn attach(&mut self, parent: BlockId, index: usize, child: BlockId) {
        if let Ok(block) = self.get_mut(parent) {
            block.set_target(index, Some(child));
        }
        if let Ok(block) = self.get_mut(child) {
            block.set_parent(Some((parent, index)));
        }
    }

    /// Like [`attach`](Self::attach), addressing the input by name.
    ///
    /// # Panics
    ///
    /// Panics if `parent` has no input called `input`.
    pub(crate) fn attach_input(&mut self, parent: BlockId, input: &str, child: BlockId) {
        match self.blocks.get(&parent).and_then(|block| block.input_index(input)) {
            Some(index) => self.attach(parent, index, child),
            None => panic!("{parent:?} has no input named {input}"),
        }
    }

    fn detach(&mut self, parent: BlockId, index: usize) {
        let Ok(block) = self.get_mut(parent) else {
            return;
        };
        let child = block.input(index).target();
        block.set_target(index, None);

        if let Some(child) = child.and_then(|child| self.blocks.get_mut(&child)) {
            child.set_parent(None);
        }
    }

    fn reinfer(&mut self) -> std::result::Result<(), TypeError> {
        for block in self.blocks.values() {
            for root in block.type_roots() {
                self.store.clear(root);
            }
        }

        let top_blocks = self.top_blocks();
        self.store.begin_pass();
        let result = Typer::new(
            &mut self.store,
            &self.blocks,
            &self.bindings,
            self.unify_orphans,
        )
        .infer_program(&top_blocks);
        self.store.end_pass();

        result
    }

    /// Walks from `block` to the root and returns the nearest variable called
    /// `name` that is visible in the input the walk came through. Failing
    /// that, returns the latest matching declaration of a statement created
    /// before the root.
    fn lookup(&self, block: BlockId, name: Symbol) -> Option<ValueId> {
        let constructor = matches!(
            self.blocks.get(&block)?.kind(),
            BlockKind::Construct { .. }
        );

        let mut current = block;
        while let Some((parent, index)) = self.blocks.get(&current)?.parent() {
            if !constructor {
                let parent_block = self.blocks.get(&parent)?;
                let input = parent_block.input(index).name();

                // later declarations shadow earlier ones
                let found = parent_block.values().into_iter().rev().find(|&value| {
                    self.bindings
                        .get_value_by_id(value)
                        .is_some_and(|v| v.name() == name && v.is_visible_in(input))
                });

                if found.is_some() {
                    return found;
                }
            }
            current = parent;
        }

        self.blocks
            .range(..current)
            .rev()
            .filter(|(_, top)| {
                matches!(top.kind(), BlockKind::Datatype { .. }) == constructor
            })
            .find_map(|(_, top)| {
                top.exports().into_iter().rev().find(|&value| {
                    self.bindings
                        .get_value_by_id(value)
                        .is_some_and(|v| v.name() == name)
                })
            })
    }

    /// Replaces the reference `old` of the variable block `block` with a
    /// fresh unresolved one carrying the same display name.
    fn recreate_reference(&mut self, block: BlockId, old: RefId) -> RefId {
        let name = self.bindings.display_name(old);
        let old = self.bindings.remove_reference(old);
        let name = name.unwrap_or(old.temp_name());

        let reference = TypedVariableValueReference::new(block, name);
        let id = reference.id();
        self.bindings.add_reference(reference);
        if let Some(block) = self.blocks.get_mut(&block) {
            block.set_reference(id);
        }

        tracing::trace!(?block, old = ?old.id(), new = ?id, "recreated reference");
        id
    }

    fn subtree(&self, root: BlockId) -> Vec<BlockId> {
        let mut ids = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(block) = self.blocks.get(&id) {
                ids.push(id);
                stack.extend(block.children());
            }
        }
        ids
    }

    /// Removes the (already detached) tree rooted at `root` without running
    /// inference. References elsewhere that were bound to a removed variable
    /// are replaced by unresolved ones.
    pub(crate) fn remove_tree(&mut self, root: BlockId) {
        let mut removed_values = Vec::new();

        for id in self.subtree(root) {
            let Some(block) = self.blocks.remove(&id) else {
                continue;
            };

            for ty in block.type_roots() {
                self.store.clear(ty);
                self.store.retire(ty);
            }
            if let Some(reference) = block.reference() {
                self.bindings.remove_reference(reference);
            }
            for value in block.values() {
                removed_values.push(self.bindings.remove_value(value));
            }

            tracing::debug!(?id, kind = %block.kind(), "disposed block");
        }

        for value in removed_values {
            for &reference in value.references() {
                let Some(block) = self
                    .bindings
                    .get_reference_by_id(reference)
                    .map(TypedVariableValueReference::block)
                else {
                    continue;
                };
                self.recreate_reference(block, reference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{EditError, Workspace};
    use crate::{
        block::{BlockKind, BlockSpec, CompareOp, ConstructorSpec, IntOp, PatternSpec, TypeSpec},
        types::Label,
        unique::BlockId,
    };

    fn var(ws: &mut Workspace, name: &str) -> BlockId {
        ws.new_block(BlockSpec::Var { name: name.into() })
    }

    fn let_block(ws: &mut Workspace, name: &str, args: &[&str], recursive: bool) -> BlockId {
        ws.new_block(BlockSpec::Let {
            var: name.into(),
            args: args.iter().map(|&arg| arg.into()).collect(),
            recursive,
        })
    }

    fn show(ws: &Workspace, block: BlockId) -> String {
        ws.store().display(ws.type_of(block).unwrap()).to_string()
    }

    fn show_anon(ws: &Workspace, block: BlockId) -> String {
        ws.store()
            .display_anonymous(ws.type_of(block).unwrap())
            .to_string()
    }

    fn is_resolved(ws: &Workspace, block: BlockId) -> bool {
        let reference = ws.block(block).unwrap().reference().unwrap();
        ws.bindings()
            .get_reference_by_id(reference)
            .unwrap()
            .is_resolved()
    }

    #[test]
    fn connecting_and_disconnecting_restores_a_free_variable() {
        let mut ws = Workspace::new();
        let let_ = let_block(&mut ws, "x", &[], false);
        let one = ws.new_block(BlockSpec::Int(1));

        ws.connect(let_, "EXP1", one).unwrap();
        let exp1 = ws.input_type(let_, "EXP1").unwrap();
        assert_eq!(ws.store().label(ws.store().deref(exp1)), Label::Int);

        ws.disconnect(let_, "EXP1").unwrap();
        let exp1 = ws.store().deref(exp1);
        assert_eq!(ws.store().label(exp1), Label::Var);
        assert_eq!(ws.store().val(exp1), None);
        assert_eq!(show(&ws, one), "INT");
    }

    #[test]
    fn rejected_connections_leave_the_workspace_unchanged() {
        let mut ws = Workspace::new();
        let add = ws.new_block(BlockSpec::IntArith(IntOp::Add));
        let text = ws.new_block(BlockSpec::Str("hi".into()));
        let len = ws.store().len();
        let shown = (show(&ws, add), show(&ws, text));

        assert!(!ws.can_connect(add, "A", text));
        assert_eq!(ws.store().len(), len);
        assert_eq!((show(&ws, add), show(&ws, text)), shown);

        let err = ws.connect(add, "A", text).unwrap_err();
        assert!(matches!(err, EditError::Type(_)), "{err:?}");
        assert_eq!(ws.block(add).unwrap().input(0).target(), None);
        assert_eq!(ws.block(text).unwrap().parent(), None);
        assert_eq!(ws.top_blocks(), vec![add, text]);
        assert_eq!((show(&ws, add), show(&ws, text)), shown);
    }

    #[test]
    fn checking_a_connection_leaves_rendered_types_alone() {
        fn build(ws: &mut Workspace) -> (BlockId, BlockId) {
            // let id x = x in id
            let let_ = let_block(ws, "id", &["x"], false);
            let x = var(ws, "x");
            ws.connect(let_, "EXP1", x).unwrap();
            (let_, var(ws, "id"))
        }

        let mut checked = Workspace::new();
        let mut plain = Workspace::new();
        let (let1, id1) = build(&mut checked);
        let (let2, id2) = build(&mut plain);

        assert!(checked.can_connect(let1, "EXP2", id1));
        assert!(checked.can_connect(let1, "EXP2", id1));
        assert_eq!(checked.store().len(), plain.store().len());

        checked.connect(let1, "EXP2", id1).unwrap();
        plain.connect(let2, "EXP2", id2).unwrap();
        assert_eq!(show(&checked, let1), show(&plain, let2));
        assert_eq!(checked.store().len(), plain.store().len());
    }

    #[test]
    fn checking_a_connection_does_not_connect() {
        let mut ws = Workspace::new();
        let cmp = ws.new_block(BlockSpec::Compare(CompareOp::Lt));
        let one = ws.new_block(BlockSpec::Int(1));
        let b = ws.input_type(cmp, "B").unwrap();

        assert!(ws.can_connect(cmp, "A", one));
        assert_eq!(ws.block(one).unwrap().parent(), None);
        assert_eq!(ws.store().label(ws.store().deref(b)), Label::Var);
    }

    #[test]
    fn structural_errors() {
        let mut ws = Workspace::new();
        let not = ws.new_block(BlockSpec::Not);
        let inner = ws.new_block(BlockSpec::Not);
        let t = ws.new_block(BlockSpec::Bool(true));

        assert_eq!(
            ws.connect(not, "B", t),
            Err(EditError::NoSuchInput {
                block: not,
                input: "B".into(),
            })
        );

        ws.connect(not, "A", inner).unwrap();
        assert_eq!(
            ws.connect(not, "A", t),
            Err(EditError::InputOccupied {
                block: not,
                input: "A".into(),
            })
        );

        let other = ws.new_block(BlockSpec::Not);
        assert_eq!(
            ws.connect(other, "A", inner),
            Err(EditError::AlreadyConnected(inner))
        );
        assert_eq!(
            ws.connect(inner, "A", not),
            Err(EditError::Cycle {
                parent: inner,
                child: not,
            })
        );
        assert_eq!(
            ws.connect(other, "A", other),
            Err(EditError::Cycle {
                parent: other,
                child: other,
            })
        );
        assert_eq!(
            ws.disconnect(inner, "A"),
            Err(EditError::NotConnected {
                block: inner,
                input: "A".into(),
            })
        );
    }

    #[test]
    fn connecting_an_ancestor_is_a_cycle() {
        let mut ws = Workspace::new();
        let outer = ws.new_block(BlockSpec::Not);
        let inner = ws.new_block(BlockSpec::Not);
        ws.connect(outer, "A", inner).unwrap();
        ws.disconnect(outer, "A").unwrap();
        ws.connect(inner, "A", outer).unwrap();

        let detached = ws.new_block(BlockSpec::Not);
        ws.connect(outer, "A", detached).unwrap();
        assert_eq!(
            ws.connect(detached, "A", inner),
            Err(EditError::Cycle {
                parent: detached,
                child: inner,
            })
        );
    }

    #[test]
    fn let_polymorphism() {
        // let id x = x in id
        let mut ws = Workspace::new();
        let let_ = let_block(&mut ws, "id", &["x"], false);
        let x = var(&mut ws, "x");
        let id = var(&mut ws, "id");

        ws.connect(let_, "EXP1", x).unwrap();
        ws.connect(let_, "EXP2", id).unwrap();

        assert_eq!(show_anon(&ws, let_), "? -> ?");
        assert!(is_resolved(&ws, x));
        assert!(is_resolved(&ws, id));

        // both uses of the generalized function are independent
        let pair = ws.new_block(BlockSpec::PairCreate);
        let app1 = ws.new_block(BlockSpec::LambdaApp);
        let app2 = ws.new_block(BlockSpec::LambdaApp);
        let id1 = var(&mut ws, "id");
        let one = ws.new_block(BlockSpec::Int(1));
        let t = ws.new_block(BlockSpec::Bool(true));

        ws.disconnect(let_, "EXP2").unwrap();
        ws.dispose_block(id).unwrap();
        ws.connect(app1, "FUN", id1).unwrap();
        ws.connect(app1, "ARG", one).unwrap();
        ws.connect(pair, "FIRST", app1).unwrap();
        ws.connect(let_, "EXP2", pair).unwrap();

        let id2 = var(&mut ws, "id");
        ws.connect(app2, "FUN", id2).unwrap();
        ws.connect(app2, "ARG", t).unwrap();
        ws.connect(pair, "SECOND", app2).unwrap();

        assert_eq!(show(&ws, let_), "PAIR[INT * BOOL]");
    }

    #[test]
    fn lambda_bound_variables_are_monomorphic() {
        // fun f -> (f 1, f true)
        let mut ws = Workspace::new();
        let lambda = ws.new_block(BlockSpec::Lambda { var: "f".into() });
        let pair = ws.new_block(BlockSpec::PairCreate);
        let app1 = ws.new_block(BlockSpec::LambdaApp);
        let app2 = ws.new_block(BlockSpec::LambdaApp);
        let f1 = var(&mut ws, "f");
        let f2 = var(&mut ws, "f");
        let one = ws.new_block(BlockSpec::Int(1));
        let t = ws.new_block(BlockSpec::Bool(true));

        ws.connect(app1, "FUN", f1).unwrap();
        ws.connect(app1, "ARG", one).unwrap();
        ws.connect(app2, "FUN", f2).unwrap();
        ws.connect(app2, "ARG", t).unwrap();
        ws.connect(pair, "FIRST", app1).unwrap();
        ws.connect(pair, "SECOND", app2).unwrap();
        ws.connect(lambda, "RETURN", pair).unwrap_err();

        assert_eq!(ws.block(pair).unwrap().parent(), None);
    }

    #[test]
    fn recursive_functions() {
        // let rec f n = f n in f
        let mut ws = Workspace::new();
        let let_ = let_block(&mut ws, "f", &["n"], true);
        let app = ws.new_block(BlockSpec::LambdaApp);
        let f = var(&mut ws, "f");
        let n = var(&mut ws, "n");
        let g = var(&mut ws, "f");

        ws.connect(app, "FUN", f).unwrap();
        ws.connect(app, "ARG", n).unwrap();
        ws.connect(let_, "EXP1", app).unwrap();
        ws.connect(let_, "EXP2", g).unwrap();

        assert!(is_resolved(&ws, f));
        assert_eq!(show_anon(&ws, let_), "? -> ?");
    }

    #[test]
    fn occurs_check_through_blocks() {
        // fun x -> x x
        let mut ws = Workspace::new();
        let lambda = ws.new_block(BlockSpec::Lambda { var: "x".into() });
        let app = ws.new_block(BlockSpec::LambdaApp);
        let x1 = var(&mut ws, "x");
        let x2 = var(&mut ws, "x");
        ws.connect(app, "FUN", x1).unwrap();
        ws.connect(app, "ARG", x2).unwrap();

        let err = ws.connect(lambda, "RETURN", app).unwrap_err();
        assert!(matches!(
            err,
            EditError::Type(crate::infer::TypeError {
                source: crate::types::UnifyError::Occurs { .. },
                ..
            })
        ));
    }

    #[test]
    fn references_fall_out_of_scope() {
        let mut ws = Workspace::new();
        let lambda = ws.new_block(BlockSpec::Lambda { var: "x".into() });
        let x = var(&mut ws, "x");
        ws.connect(lambda, "RETURN", x).unwrap();
        assert!(is_resolved(&ws, x));
        let before = ws.block(x).unwrap().reference().unwrap();

        ws.disconnect(lambda, "RETURN").unwrap();
        let after = ws.block(x).unwrap().reference().unwrap();
        assert_ne!(before, after);
        assert!(!is_resolved(&ws, x));
        assert_eq!(ws.reference_name(after), Some("x"));
        assert!(ws.bindings().get_reference_by_id(before).is_none());
    }

    #[test]
    fn orphans_keep_their_type_when_enabled() {
        let mut ws = Workspace::with_unify_orphans(true);
        let let_ = let_block(&mut ws, "x", &[], false);
        let one = ws.new_block(BlockSpec::Int(1));
        let x = var(&mut ws, "x");
        ws.connect(let_, "EXP1", one).unwrap();
        ws.connect(let_, "EXP2", x).unwrap();

        ws.disconnect(let_, "EXP2").unwrap();
        assert!(is_resolved(&ws, x));
        ws.update_type_inference().unwrap();
        assert_eq!(show(&ws, x), "INT");
    }

    #[test]
    fn orphans_instantiate_polymorphic_declarations() {
        let mut ws = Workspace::with_unify_orphans(true);
        let app = ws.new_block(BlockSpec::LambdaApp);
        let one = ws.new_block(BlockSpec::Int(1));

        // let id x = x in id
        let let_ = let_block(&mut ws, "id", &["x"], false);
        let x = var(&mut ws, "x");
        let id = var(&mut ws, "id");
        ws.connect(let_, "EXP1", x).unwrap();
        ws.connect(let_, "EXP2", id).unwrap();
        assert_eq!(show_anon(&ws, let_), "? -> ?");

        // (id 1) outside the let, with the orphan created before the let
        ws.disconnect(let_, "EXP2").unwrap();
        ws.connect(app, "FUN", id).unwrap();
        ws.connect(app, "ARG", one).unwrap();
        assert!(is_resolved(&ws, id));
        assert_eq!(show(&ws, app), "INT");

        let id2 = var(&mut ws, "id");
        ws.connect(let_, "EXP2", id2).unwrap();
        assert_eq!(show_anon(&ws, let_), "? -> ?");
        assert_eq!(show_anon(&ws, id), "INT -> INT");
    }

    #[test]
    fn disposing_a_declaration_unresolves_its_references() {
        let mut ws = Workspace::with_unify_orphans(true);
        let let_ = let_block(&mut ws, "x", &[], false);
        let x = var(&mut ws, "x");
        ws.connect(let_, "EXP2", x).unwrap();
        ws.disconnect(let_, "EXP2").unwrap();
        assert!(is_resolved(&ws, x));

        ws.dispose_block(let_).unwrap();
        assert!(!is_resolved(&ws, x));
        assert_eq!(ws.bindings().values().count(), 0);
        assert_eq!(ws.top_blocks(), vec![x]);
    }

    #[test]
    fn disposing_removes_the_whole_subtree() {
        let mut ws = Workspace::new();
        let lambda = ws.new_block(BlockSpec::Lambda { var: "x".into() });
        let x = var(&mut ws, "x");
        ws.connect(lambda, "RETURN", x).unwrap();

        ws.dispose_block(lambda).unwrap();
        assert!(ws.is_empty());
        assert!(ws.bindings().is_empty());
    }

    #[test]
    fn renaming_a_value_renames_its_references() {
        let mut ws = Workspace::new();
        let lambda = ws.new_block(BlockSpec::Lambda { var: "x".into() });
        let x = var(&mut ws, "x");
        ws.connect(lambda, "RETURN", x).unwrap();

        let BlockKind::Lambda { value } = *ws.block(lambda).unwrap().kind() else {
            panic!("expected a lambda block");
        };
        ws.rename_value(value, "y").unwrap();

        let reference = ws.block(x).unwrap().reference().unwrap();
        assert_eq!(ws.reference_name(reference), Some("y"));
        assert_eq!(ws.value_name(value), Some("y"));
        assert!(is_resolved(&ws, x));
    }

    #[test]
    fn match_arms_agree() {
        // match [] with [] -> 0 | h :: _ -> h
        let mut ws = Workspace::new();
        let m = ws.new_block(BlockSpec::Match {
            patterns: vec![
                PatternSpec::Nil,
                PatternSpec::Cons(
                    Box::new(PatternSpec::Var("h".into())),
                    Box::new(PatternSpec::Wildcard),
                ),
            ],
        });
        let nil = ws.new_block(BlockSpec::ListEmpty);
        let zero = ws.new_block(BlockSpec::Int(0));
        let h = var(&mut ws, "h");

        ws.connect(m, "INPUT", nil).unwrap();
        ws.connect(m, "OUTPUT0", zero).unwrap();
        ws.connect(m, "OUTPUT1", h).unwrap();

        assert_eq!(show(&ws, m), "INT");
        assert_eq!(show(&ws, nil), "LIST[INT]");
        assert!(is_resolved(&ws, h));
    }

    #[test]
    fn clear_removes_everything() {
        let mut ws = Workspace::new();
        let let_ = let_block(&mut ws, "x", &[], false);
        let one = ws.new_block(BlockSpec::Int(1));
        ws.connect(let_, "EXP1", one).unwrap();

        ws.clear();
        assert!(ws.is_empty());
        assert!(ws.bindings().is_empty());
        assert!(ws.store().is_empty());
    }

    #[test]
    fn repeated_edits_do_not_grow_the_store() {
        // let f x = 0 + 0 in f
        let mut ws = Workspace::new();
        let let_ = let_block(&mut ws, "f", &["x"], false);
        let add = ws.new_block(BlockSpec::IntArith(IntOp::Add));
        let f = var(&mut ws, "f");
        ws.connect(let_, "EXP1", add).unwrap();
        ws.connect(let_, "EXP2", f).unwrap();

        let len = ws.store().len();
        let shown = show(&ws, let_);
        assert_eq!(show_anon(&ws, let_), "? -> INT");

        for _ in 0..1000 {
            ws.disconnect(let_, "EXP2").unwrap();
            ws.connect(let_, "EXP2", f).unwrap();
        }

        assert_eq!(ws.store().len(), len);
        assert_eq!(show(&ws, let_), shown);
    }

    #[test]
    fn disposed_blocks_give_their_types_back() {
        let mut ws = Workspace::new();
        let build = |ws: &mut Workspace| {
            let let_ = let_block(ws, "f", &["x"], false);
            let x = var(ws, "x");
            ws.connect(let_, "EXP1", x).unwrap();
            let_
        };

        let first = build(&mut ws);
        ws.dispose_block(first).unwrap();
        let len = ws.store().len();

        for _ in 0..100 {
            let let_ = build(&mut ws);
            ws.dispose_block(let_).unwrap();
        }
        assert_eq!(ws.store().len(), len);
    }

    #[test]
    fn statements_are_visible_to_later_top_blocks() {
        let mut ws = Workspace::new();
        let early = var(&mut ws, "f");
        // let f x = x
        let stmt = ws.new_block(BlockSpec::LetStatement {
            var: "f".into(),
            args: vec!["x".into()],
            recursive: false,
        });
        let x = var(&mut ws, "x");
        ws.connect(stmt, "EXP1", x).unwrap();

        let late = var(&mut ws, "f");
        ws.resolve_references();
        ws.update_type_inference().unwrap();

        assert!(is_resolved(&ws, x));
        assert!(is_resolved(&ws, late));
        assert!(!is_resolved(&ws, early));
        assert_eq!(show_anon(&ws, stmt), "? -> ?");
        assert_eq!(show_anon(&ws, late), "? -> ?");
        assert_eq!(show_anon(&ws, early), "?");
    }

    #[test]
    fn statement_bindings_are_generalized() {
        // let id x = x;; (id 1, id true)
        let mut ws = Workspace::new();
        let stmt = ws.new_block(BlockSpec::LetStatement {
            var: "id".into(),
            args: vec!["x".into()],
            recursive: false,
        });
        let x = var(&mut ws, "x");
        ws.connect(stmt, "EXP1", x).unwrap();

        let pair = ws.new_block(BlockSpec::PairCreate);
        let app1 = ws.new_block(BlockSpec::LambdaApp);
        let app2 = ws.new_block(BlockSpec::LambdaApp);
        let id1 = var(&mut ws, "id");
        let id2 = var(&mut ws, "id");
        let one = ws.new_block(BlockSpec::Int(1));
        let t = ws.new_block(BlockSpec::Bool(true));
        ws.connect(app1, "FUN", id1).unwrap();
        ws.connect(app1, "ARG", one).unwrap();
        ws.connect(app2, "FUN", id2).unwrap();
        ws.connect(app2, "ARG", t).unwrap();
        ws.connect(pair, "FIRST", app1).unwrap();
        ws.connect(pair, "SECOND", app2).unwrap();

        assert_eq!(show(&ws, pair), "PAIR[INT * BOOL]");
        assert!(is_resolved(&ws, id1));
    }

    #[test]
    fn recursive_statements_see_themselves() {
        // let rec loop n = loop n
        let mut ws = Workspace::new();
        let stmt = ws.new_block(BlockSpec::LetStatement {
            var: "loop".into(),
            args: vec!["n".into()],
            recursive: true,
        });
        let app = ws.new_block(BlockSpec::LambdaApp);
        let f = var(&mut ws, "loop");
        let n = var(&mut ws, "n");
        ws.connect(app, "FUN", f).unwrap();
        ws.connect(app, "ARG", n).unwrap();
        ws.connect(stmt, "EXP1", app).unwrap();

        assert!(is_resolved(&ws, f));
        assert_eq!(show_anon(&ws, stmt), "? -> ?");
    }

    #[test]
    fn statements_cannot_be_plugged_in() {
        let mut ws = Workspace::new();
        let not = ws.new_block(BlockSpec::Not);
        let stmt = ws.new_block(BlockSpec::LetStatement {
            var: "b".into(),
            args: vec![],
            recursive: false,
        });

        assert!(!ws.can_connect(not, "A", stmt));
        assert_eq!(ws.connect(not, "A", stmt), Err(EditError::NoOutput(stmt)));
    }

    #[test]
    fn constructors_build_values_of_their_datatype() {
        // type shape = Dot | Circle of int
        let mut ws = Workspace::new();
        let decl = ws.new_block(BlockSpec::Datatype {
            name: "shape".into(),
            constructors: vec![
                ConstructorSpec {
                    name: "Dot".into(),
                    arg: None,
                },
                ConstructorSpec {
                    name: "Circle".into(),
                    arg: Some(TypeSpec::Int),
                },
            ],
        });
        let circle = ws.new_block(BlockSpec::Construct {
            name: "Circle".into(),
            arg: true,
        });
        let dot = ws.new_block(BlockSpec::Construct {
            name: "Dot".into(),
            arg: false,
        });
        let one = ws.new_block(BlockSpec::Int(1));
        let text = ws.new_block(BlockSpec::Str("r".into()));

        ws.connect(circle, "ARG", one).unwrap();
        assert!(is_resolved(&ws, circle));
        assert!(is_resolved(&ws, dot));
        assert_eq!(show(&ws, circle), "shape");
        assert_eq!(show(&ws, dot), "shape");
        assert_eq!(show(&ws, decl), "shape");

        ws.disconnect(circle, "ARG").unwrap();
        let err = ws.connect(circle, "ARG", text).unwrap_err();
        assert!(matches!(err, EditError::Type(_)), "{err:?}");
    }

    #[test]
    fn variables_do_not_see_constructors() {
        let mut ws = Workspace::new();
        ws.new_block(BlockSpec::Datatype {
            name: "t".into(),
            constructors: vec![ConstructorSpec {
                name: "A".into(),
                arg: None,
            }],
        });
        let a = var(&mut ws, "A");
        ws.resolve_references();

        assert!(!is_resolved(&ws, a));
    }

    #[test]
    fn disposing_a_datatype_unresolves_its_constructors() {
        let mut ws = Workspace::new();
        let decl = ws.new_block(BlockSpec::Datatype {
            name: "t".into(),
            constructors: vec![ConstructorSpec {
                name: "A".into(),
                arg: None,
            }],
        });
        let a = ws.new_block(BlockSpec::Construct {
            name: "A".into(),
            arg: false,
        });
        ws.resolve_references();
        assert!(is_resolved(&ws, a));

        ws.dispose_block(decl).unwrap();
        assert!(!is_resolved(&ws, a));
        assert_eq!(show_anon(&ws, a), "?");
    }
}
