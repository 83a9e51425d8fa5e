//! Generalized types.

use std::collections::{HashMap, HashSet};

use crate::symbol::Symbol;

use super::{TyId, TypeExpr, TypeStore, UnifyError};

/// A typing environment, mapping names in scope to their schemes.
pub type TypeEnv = HashMap<Symbol, Scheme>;

/// A type quantified over a (possibly empty) list of type variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    names: Vec<Symbol>,
    ty: TyId,
}

impl Scheme {
    /// Wraps `ty` without quantifying over anything.
    pub fn mono_type(ty: TyId) -> Self {
        Self {
            names: Vec::new(),
            ty,
        }
    }

    /// Generalizes `ty` over each of its unbound variables that is not free in
    /// some scheme of `env`.
    pub fn create<K>(store: &TypeStore, env: &HashMap<K, Scheme>, ty: TyId) -> Self {
        let env_names = env
            .values()
            .flat_map(|scheme| scheme.free_tvars(store))
            .filter_map(|var| var_symbol(store, var))
            .collect::<HashSet<_>>();

        let mut names = Vec::new();
        for var in store.tvars(ty) {
            if let Some(name) = var_symbol(store, var) {
                if !env_names.contains(&name) && !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        Self { names, ty }
    }

    pub fn names(&self) -> &[Symbol] {
        &self.names
    }

    pub fn ty(&self) -> TyId {
        self.ty
    }

    pub fn is_mono(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the unbound variables of the underlying type that are not
    /// quantified by this scheme.
    ///
    /// # Panics
    /// Panics if one of them turns out to be bound.
    pub fn free_tvars(&self, store: &TypeStore) -> Vec<TyId> {
        store
            .tvars(self.ty)
            .into_iter()
            .filter(|&var| match store.get(var) {
                TypeExpr::Var { name, val } => {
                    assert!(
                        val.is_none(),
                        "free type variable {} of a scheme is bound",
                        store.names().name(*name)
                    );
                    !self.names.contains(name)
                }
                other => panic!("expected a type variable, found {other:?}"),
            })
            .collect()
    }

    /// Returns a copy of the underlying type in which every quantified
    /// variable is replaced by a fresh variable. Occurrences of the same name
    /// are replaced by the same fresh variable.
    ///
    /// Free variables and primitive nodes are shared with the scheme's type;
    /// every other node is new. A monomorphic scheme instantiates to its own
    /// type.
    ///
    /// # Panics
    /// Panics if a quantified name survives the substitution.
    pub fn instantiate(&self, store: &mut TypeStore) -> TyId {
        if self.is_mono() {
            return self.ty;
        }

        let substitution = self
            .names
            .iter()
            .map(|&name| (name, store.fresh_var()))
            .collect::<HashMap<_, _>>();

        let ty = substitute(store, &substitution, self.ty);

        for &name in &self.names {
            let name = store.names().name(name);
            assert!(
                !store.occurs(ty, name),
                "quantified type variable {name} survived instantiation"
            );
        }

        ty
    }

    /// Instantiates this scheme and unifies the result with `ty`.
    pub fn unify_with(&self, store: &mut TypeStore, ty: TyId) -> Result<(), UnifyError> {
        let instance = self.instantiate(store);
        store.unify(instance, ty)
    }
}

fn var_symbol(store: &TypeStore, var: TyId) -> Option<Symbol> {
    match store.get(var) {
        TypeExpr::Var { name, .. } => Some(*name),
        _ => None,
    }
}

fn substitute(
    store: &mut TypeStore,
    substitution: &HashMap<Symbol, TyId>,
    ty: TyId,
) -> TyId {
    let ty = store.deref(ty);
    let node = store.get(ty).clone();

    match node {
        TypeExpr::Var { name, .. } => substitution.get(&name).copied().unwrap_or(ty),
        TypeExpr::Int | TypeExpr::Float | TypeExpr::Bool | TypeExpr::String => ty,
        TypeExpr::List(elem) => {
            let elem = substitute(store, substitution, elem);
            store.list(elem)
        }
        TypeExpr::Pair(a, b) => {
            let a = substitute(store, substitution, a);
            let b = substitute(store, substitution, b);
            store.pair(a, b)
        }
        TypeExpr::Sum(a, b) => {
            let a = substitute(store, substitution, a);
            let b = substitute(store, substitution, b);
            store.sum(a, b)
        }
        TypeExpr::Fun(a, b) => {
            let a = substitute(store, substitution, a);
            let b = substitute(store, substitution, b);
            store.fun(a, b)
        }
        TypeExpr::Construct { name, args } => {
            let args = args
                .iter()
                .map(|&arg| substitute(store, substitution, arg))
                .collect::<Vec<_>>();
            let name = store.names().name(name).to_owned();
            store.construct(&name, &args)
        }
    }
}
