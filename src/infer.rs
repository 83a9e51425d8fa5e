//! Type inference over block trees.
//!
//! Inference is a single top-down pass over one tree. Each block infers its
//! connected children first, unifying every child's output with the type of
//! the input it is plugged into, and then applies the rule of its own kind.
//! Variables are looked up by name in a [`TypeEnv`] threaded down the tree;
//! blocks that declare variables extend it for the inputs those variables
//! are visible in.
//!
//! A program is a sequence of trees inferred in order. Top-level `let`
//! statements and datatype declarations extend the environment of every
//! tree that comes after them.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::{
    binding::{BindingTable, TypedVariableValue},
    block::{Block, BlockKind, Pattern, PatternKind},
    symbol::Symbol,
    types::{Scheme, TyId, TypeEnv, TypeExpr, TypeStore, UnifyError},
    unique::{BlockId, RefId, ValueId},
};

/// A unification failure, attributed to the block whose rule caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type error in {block:?}: {source}")]
pub struct TypeError {
    pub block: BlockId,
    pub source: UnifyError,
}

pub type Result<T = ()> = std::result::Result<T, TypeError>;

/// Infers types for a set of blocks that share a [`TypeStore`] and a
/// [`BindingTable`].
pub struct Typer<'a> {
    store: &'a mut TypeStore,
    blocks: &'a BTreeMap<BlockId, Block>,
    bindings: &'a BindingTable,
    /// If set, a variable block whose name is not in scope but whose
    /// reference is resolved takes the type of the value it refers to.
    unify_orphans: bool,
    /// The schemes of the let-bound variables inferred so far.
    schemes: HashMap<ValueId, Scheme>,
    /// Constructors declared by the datatype blocks inferred so far.
    constructors: TypeEnv,
    /// Out-of-scope uses waiting for the whole program to be inferred: the
    /// block, the type its use site requires, and the value it refers to.
    orphans: Vec<(BlockId, TyId, ValueId)>,
}

impl<'a> Typer<'a> {
    pub fn new(
        store: &'a mut TypeStore,
        blocks: &'a BTreeMap<BlockId, Block>,
        bindings: &'a BindingTable,
        unify_orphans: bool,
    ) -> Self {
        Self {
            store,
            blocks,
            bindings,
            unify_orphans,
            schemes: HashMap::new(),
            constructors: TypeEnv::new(),
            orphans: Vec::new(),
        }
    }

    /// Infers the trees rooted at `roots`, in order. Each tree sees what the
    /// statements before it declare.
    pub fn infer_program(&mut self, roots: &[BlockId]) -> Result {
        let blocks = self.blocks;
        let mut toplevel = TypeEnv::new();

        for &root in roots {
            self.infer(root, &toplevel)?;

            match blocks[&root].kind() {
                BlockKind::LetStatement { value, .. } => {
                    if let Some(scheme) = self.schemes.get(value) {
                        toplevel.insert(self.value(*value).name(), scheme.clone());
                    }
                }
                BlockKind::Datatype { constructors, .. } => {
                    for ctor in constructors.iter() {
                        let ctor = self.value(ctor.value);
                        self.constructors
                            .insert(ctor.name(), Scheme::mono_type(ctor.ty()));
                    }
                }
                _ => {}
            }
        }

        self.infer_orphans()
    }

    /// Unifies every out-of-scope use with its declaration. A let-bound
    /// declaration is instantiated from its scheme, like any other use.
    fn infer_orphans(&mut self) -> Result {
        for (block, ty, value) in std::mem::take(&mut self.orphans) {
            let scheme = match self.schemes.get(&value) {
                Some(scheme) => scheme.clone(),
                None => Scheme::mono_type(self.value(value).ty()),
            };

            tracing::trace!(?block, ?value, "unifying out-of-scope use");
            scheme
                .unify_with(self.store, ty)
                .map_err(|source| TypeError { block, source })?;
        }
        Ok(())
    }

    fn infer(&mut self, id: BlockId, env: &TypeEnv) -> Result<TyId> {
        let blocks = self.blocks;
        let block = &blocks[&id];
        let out = block.output();

        tracing::trace!(?id, kind = %block.kind(), "inferring block");

        match block.kind() {
            BlockKind::Bool(_)
            | BlockKind::Int(_)
            | BlockKind::MaxInt
            | BlockKind::Float(_)
            | BlockKind::Infinity
            | BlockKind::Str(_)
            | BlockKind::ListEmpty => {}

            // inputs with fixed types
            BlockKind::IntArith(_)
            | BlockKind::FloatArith(_)
            | BlockKind::Concat
            | BlockKind::StringOfInt
            | BlockKind::Logic(_)
            | BlockKind::Not => self.infer_inputs(block, env)?,

            BlockKind::Compare(_) => {
                self.infer_inputs(block, env)?;
                self.unify(id, input_ty(block, 0), input_ty(block, 1))?;
            }

            BlockKind::Ternary => {
                self.infer_inputs(block, env)?;
                self.unify(id, input_ty(block, 1), out)?;
                self.unify(id, input_ty(block, 2), out)?;
            }

            BlockKind::ListCreate(_) => {
                self.infer_inputs(block, env)?;
                let [elem] = self.parts(out);
                for input in block.inputs() {
                    self.unify(id, input.ty(), elem)?;
                }
            }

            BlockKind::ListCons => {
                self.infer_inputs(block, env)?;
                let [elem] = self.parts(out);
                self.unify(id, input_ty(block, 0), elem)?;
                self.unify(id, input_ty(block, 1), out)?;
            }

            BlockKind::PairCreate => {
                self.infer_inputs(block, env)?;
                let [first, second] = self.parts(out);
                self.unify(id, input_ty(block, 0), first)?;
                self.unify(id, input_ty(block, 1), second)?;
            }

            BlockKind::PairFirst => {
                self.infer_inputs(block, env)?;
                let [first, _] = self.parts(input_ty(block, 0));
                self.unify(id, out, first)?;
            }

            BlockKind::PairSecond => {
                self.infer_inputs(block, env)?;
                let [_, second] = self.parts(input_ty(block, 0));
                self.unify(id, out, second)?;
            }

            BlockKind::Lambda { value } => {
                let value = self.value(*value);
                let [param, ret] = self.parts(out);
                self.unify(id, param, value.ty())?;

                let mut inner = env.clone();
                inner.insert(value.name(), Scheme::mono_type(value.ty()));
                self.infer_input(block, 0, &inner)?;
                self.unify(id, ret, input_ty(block, 0))?;
            }

            BlockKind::LambdaApp => {
                self.infer_inputs(block, env)?;
                let [param, ret] = self.parts(input_ty(block, 0));
                self.unify(id, input_ty(block, 1), param)?;
                self.unify(id, out, ret)?;
            }

            BlockKind::Let {
                value,
                args,
                recursive,
            } => {
                let (name, scheme) = self.infer_binding(block, *value, args, *recursive, env)?;

                let mut exp2_env = env.clone();
                exp2_env.insert(name, scheme);
                self.infer_input(block, 1, &exp2_env)?;
                self.unify(id, out, input_ty(block, 1))?;
            }

            BlockKind::LetStatement {
                value,
                args,
                recursive,
            } => {
                self.infer_binding(block, *value, args, *recursive, env)?;
                let var = self.value(*value).ty();
                self.unify(id, out, var)?;
            }

            BlockKind::Var { reference } => {
                let name = self.reference_name(id, *reference);
                match env.get(&name) {
                    Some(scheme) => scheme
                        .unify_with(self.store, out)
                        .map_err(|source| TypeError { block: id, source })?,
                    None => self.defer_orphan(id, out, *reference),
                }
            }

            // the declared types are fixed when the block is built
            BlockKind::Datatype { .. } => {}

            BlockKind::Construct { reference, arg } => {
                let use_site = if *arg {
                    self.infer_inputs(block, env)?;
                    self.store.fun(input_ty(block, 0), out)
                } else {
                    out
                };

                let name = self.reference_name(id, *reference);
                match self.constructors.get(&name).cloned() {
                    Some(scheme) => scheme
                        .unify_with(self.store, use_site)
                        .map_err(|source| TypeError { block: id, source })?,
                    None => self.defer_orphan(id, use_site, *reference),
                }
            }

            BlockKind::Match { patterns } => {
                self.infer_input(block, 0, env)?;
                let scrutinee = input_ty(block, 0);

                for (i, pattern) in patterns.iter().enumerate() {
                    self.infer_pattern(id, pattern)?;
                    self.unify(id, pattern.ty, scrutinee)?;

                    let mut arm_env = env.clone();
                    for value in pattern.values() {
                        let value = self.value(value);
                        arm_env.insert(value.name(), Scheme::mono_type(value.ty()));
                    }

                    self.infer_input(block, i + 1, &arm_env)?;
                    self.unify(id, input_ty(block, i + 1), out)?;
                }
            }
        }

        Ok(out)
    }

    /// Infers the `EXP1` of a `let` and generalizes the variable it binds.
    fn infer_binding(
        &mut self,
        block: &Block,
        value: ValueId,
        args: &[ValueId],
        recursive: bool,
        env: &TypeEnv,
    ) -> Result<(Symbol, Scheme)> {
        let id = block.id();
        let value = self.value(value);
        let var = value.ty();
        let exp1 = input_ty(block, 0);

        if args.is_empty() {
            self.unify(id, exp1, var)?;
        } else {
            let mut signature = args
                .iter()
                .map(|&arg| self.value(arg).ty())
                .collect::<Vec<_>>();
            signature.push(exp1);
            let fun = self.store.fun_type(&signature);
            self.unify(id, var, fun)?;
        }

        let mut exp1_env = env.clone();
        if recursive {
            exp1_env.insert(value.name(), Scheme::mono_type(var));
        }
        for &arg in args {
            let arg = self.value(arg);
            exp1_env.insert(arg.name(), Scheme::mono_type(arg.ty()));
        }
        self.infer_input(block, 0, &exp1_env)?;

        let var_deref = self.store.deref(var);
        let scheme = match self.store.get(var_deref) {
            TypeExpr::Fun(..) => Scheme::create(self.store, env, var),
            _ => Scheme::mono_type(var),
        };
        tracing::trace!(
            ?id,
            scheme = %scheme.display(self.store),
            "generalized let-bound variable"
        );

        self.schemes.insert(value.id(), scheme.clone());
        Ok((value.name(), scheme))
    }

    /// Records a use whose name is not in scope. It only gets a type if
    /// orphans are unified and its reference is still resolved.
    fn defer_orphan(&mut self, block: BlockId, ty: TyId, reference: RefId) {
        if !self.unify_orphans {
            return;
        }

        let bound = self
            .bindings
            .get_reference_by_id(reference)
            .and_then(|r| r.bound_value());
        if let Some(value) = bound {
            self.orphans.push((block, ty, value));
        }
    }

    fn reference_name(&self, block: BlockId, reference: RefId) -> Symbol {
        match self.bindings.display_name(reference) {
            Some(name) => name,
            None => panic!("{block:?} refers to the missing reference {reference:?}"),
        }
    }

    fn infer_inputs(&mut self, block: &Block, env: &TypeEnv) -> Result {
        for index in 0..block.inputs().len() {
            self.infer_input(block, index, env)?;
        }
        Ok(())
    }

    fn infer_input(&mut self, block: &Block, index: usize, env: &TypeEnv) -> Result {
        let input = block.input(index);
        if let Some(child) = input.target() {
            let child_ty = self.infer(child, env)?;
            self.unify(block.id(), input.ty(), child_ty)?;
        }
        Ok(())
    }

    fn infer_pattern(&mut self, block: BlockId, pattern: &Pattern) -> Result {
        match &pattern.kind {
            PatternKind::Cons(head, tail) => {
                let [elem] = self.parts(pattern.ty);
                self.infer_pattern(block, head)?;
                self.infer_pattern(block, tail)?;
                self.unify(block, head.ty, elem)?;
                self.unify(block, tail.ty, pattern.ty)
            }
            PatternKind::Pair(left, right) => {
                let [first, second] = self.parts(pattern.ty);
                self.infer_pattern(block, left)?;
                self.infer_pattern(block, right)?;
                self.unify(block, left.ty, first)?;
                self.unify(block, right.ty, second)
            }
            PatternKind::Wildcard
            | PatternKind::Var(_)
            | PatternKind::Int(_)
            | PatternKind::Bool(_)
            | PatternKind::Nil => Ok(()),
        }
    }

    fn unify(&mut self, block: BlockId, a: TyId, b: TyId) -> Result {
        self.store
            .unify(a, b)
            .map_err(|source| TypeError { block, source })
    }

    /// Returns the structural children of a type root built together with
    /// its block.
    fn parts<const N: usize>(&self, ty: TyId) -> [TyId; N] {
        match self.store.get(ty).children().try_into() {
            Ok(parts) => parts,
            Err(children) => panic!(
                "expected {N} children of {}, found {children:?}",
                self.store.display(ty)
            ),
        }
    }

    fn value(&self, id: ValueId) -> &'a TypedVariableValue {
        let bindings = self.bindings;
        match bindings.get_value_by_id(id) {
            Some(value) => value,
            None => panic!("{id:?} is declared by a block but missing from the value table"),
        }
    }
}

fn input_ty(block: &Block, index: usize) -> TyId {
    block.input(index).ty()
}
