//! Structural unification over a [`TypeStore`].

use thiserror::Error;

use super::{TyId, TypeExpr, TypeStore};

/// A failure to unify two types.
///
/// Both sides are rendered when the failure is detected, since the nodes
/// involved may be discarded by the rollback that follows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyError {
    #[error("cannot unify {left} with {right}")]
    Mismatch { left: String, right: String },
    #[error("infinite type: {var} occurs in {ty}")]
    Occurs { var: String, ty: String },
}

impl TypeStore {
    /// Makes `a` and `b` structurally equal by binding unbound variables.
    ///
    /// On failure every binding made during the attempt is undone, so the
    /// store is left exactly as it was.
    pub fn unify(&mut self, a: TyId, b: TyId) -> Result<(), UnifyError> {
        let snapshot = self.start_snapshot();
        match self.unify_nodes(a, b) {
            Ok(()) => {
                self.commit(snapshot);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(%err, "unification failed");
                self.rollback_to(snapshot);
                Err(err)
            }
        }
    }

    /// Returns `true` if `a` and `b` could be unified. The store is never
    /// modified, whatever the answer.
    pub fn able_to_unify(&mut self, a: TyId, b: TyId) -> bool {
        let snapshot = self.start_snapshot();
        let result = self.unify_nodes(a, b);
        self.rollback_to(snapshot);
        result.is_ok()
    }

    fn unify_nodes(&mut self, t1: TyId, t2: TyId) -> Result<(), UnifyError> {
        let t1 = self.find(t1);
        let t2 = self.find(t2);

        if t1 == t2 {
            return Ok(());
        }

        match (self.get(t1).clone(), self.get(t2).clone()) {
            // variable-anything & anything-variable
            (TypeExpr::Var { .. }, _) => self.unify_var_value(t1, t2),
            (_, TypeExpr::Var { .. }) => self.unify_var_value(t2, t1),

            // identical primitives
            (TypeExpr::Int, TypeExpr::Int)
            | (TypeExpr::Float, TypeExpr::Float)
            | (TypeExpr::Bool, TypeExpr::Bool)
            | (TypeExpr::String, TypeExpr::String) => Ok(()),

            (TypeExpr::List(e1), TypeExpr::List(e2)) => self.unify_nodes(e1, e2),

            // parameters before return types for functions
            (TypeExpr::Pair(l1, r1), TypeExpr::Pair(l2, r2))
            | (TypeExpr::Sum(l1, r1), TypeExpr::Sum(l2, r2))
            | (TypeExpr::Fun(l1, r1), TypeExpr::Fun(l2, r2)) => {
                self.unify_nodes(l1, l2)?;
                self.unify_nodes(r1, r2)
            }

            (
                TypeExpr::Construct { name: n1, args: a1 },
                TypeExpr::Construct { name: n2, args: a2 },
            ) if n1 == n2 && a1.len() == a2.len() => {
                for (&l, &r) in a1.iter().zip(a2.iter()) {
                    self.unify_nodes(l, r)?;
                }

                Ok(())
            }

            _ => Err(UnifyError::Mismatch {
                left: self.display(t1).to_string(),
                right: self.display(t2).to_string(),
            }),
        }
    }

    fn unify_var_value(&mut self, var: TyId, value: TyId) -> Result<(), UnifyError> {
        if self.occurs_var(var, value) {
            Err(UnifyError::Occurs {
                var: self.display(var).to_string(),
                ty: self.display(value).to_string(),
            })
        } else {
            self.bind(var, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::types::{Label, TyId, TypeStore, UnifyError};

    #[derive(Debug, Clone, Copy)]
    enum Prim {
        Int,
        Float,
        Bool,
        String,
    }

    impl Prim {
        fn build(self, store: &mut TypeStore) -> TyId {
            match self {
                Prim::Int => store.int(),
                Prim::Float => store.float(),
                Prim::Bool => store.bool(),
                Prim::String => store.string(),
            }
        }
    }

    fn prim() -> impl Strategy<Value = Prim> {
        prop_oneof![
            Just(Prim::Int),
            Just(Prim::Float),
            Just(Prim::Bool),
            Just(Prim::String),
        ]
    }

    /// A variable-free type shape, built on demand in a store.
    #[derive(Debug, Clone)]
    enum Shape {
        Prim(Prim),
        List(Box<Shape>),
        Pair(Box<Shape>, Box<Shape>),
        Fun(Box<Shape>, Box<Shape>),
    }

    impl Shape {
        fn build(&self, store: &mut TypeStore) -> TyId {
            match self {
                Shape::Prim(p) => p.build(store),
                Shape::List(elem) => {
                    let elem = elem.build(store);
                    store.list(elem)
                }
                Shape::Pair(a, b) => {
                    let a = a.build(store);
                    let b = b.build(store);
                    store.pair(a, b)
                }
                Shape::Fun(a, b) => {
                    let a = a.build(store);
                    let b = b.build(store);
                    store.fun(a, b)
                }
            }
        }
    }

    fn shape() -> impl Strategy<Value = Shape> {
        prim().prop_map(Shape::Prim).prop_recursive(4, 16, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|s| Shape::List(Box::new(s))),
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| Shape::Pair(Box::new(a), Box::new(b))),
                (inner.clone(), inner)
                    .prop_map(|(a, b)| Shape::Fun(Box::new(a), Box::new(b))),
            ]
        })
    }

    proptest! {
        #[test]
        fn primitives_unify_iff_labels_match(p in prim(), q in prim()) {
            let mut store = TypeStore::new();
            let a = p.build(&mut store);
            let b = q.build(&mut store);
            let before = store.len();

            let result = store.unify(a, b);
            prop_assert_eq!(result.is_ok(), store.label(a) == store.label(b));
            prop_assert_eq!(store.len(), before);
            prop_assert_eq!(store.deref(a), a);
            prop_assert_eq!(store.deref(b), b);
        }

        #[test]
        fn unbound_variable_binds_to_any_type(s in shape()) {
            let mut store = TypeStore::new();
            let v = store.fresh_var();
            let t = s.build(&mut store);

            prop_assert!(store.unify(v, t).is_ok());
            prop_assert_eq!(store.deref(v), t);
        }

        #[test]
        fn variable_never_unifies_with_a_type_containing_it(s in shape()) {
            let mut store = TypeStore::new();
            let v = store.fresh_var();
            let t = s.build(&mut store);
            let wrapped = store.pair(t, v);

            let result = store.unify(v, wrapped);
            prop_assert!(matches!(result, Err(UnifyError::Occurs { .. })), "{:?}", result);
            prop_assert_eq!(store.val(v), None);
        }

        #[test]
        fn probing_leaves_no_trace(s in shape(), r in shape()) {
            let mut store = TypeStore::new();
            let a = store.fresh_var();
            let b = store.fresh_var();
            let left = s.build(&mut store);
            let right = r.build(&mut store);
            let lhs = store.pair(left, a);
            let rhs = store.pair(b, right);

            let before = store.display(lhs).to_string();
            let len = store.len();
            let _ = store.able_to_unify(lhs, rhs);

            prop_assert_eq!(store.display(lhs).to_string(), before);
            prop_assert_eq!(store.len(), len);
            prop_assert_eq!(store.val(a), None);
            prop_assert_eq!(store.val(b), None);
        }
    }

    #[test]
    fn pair_of_variables_against_concrete_pair() {
        let mut store = TypeStore::new();
        let p = store.tvar("P");
        let q = store.tvar("Q");
        let vars = store.pair(p, q);
        let int = store.int();
        let bool = store.bool();
        let concrete = store.pair(int, bool);

        store.unify(vars, concrete).unwrap();

        assert_eq!(store.label(store.deref(p)), Label::Int);
        assert_eq!(store.label(store.deref(q)), Label::Bool);
    }

    #[test]
    fn list_occurs_check() {
        let mut store = TypeStore::new();
        let v = store.tvar("v");
        let list = store.list(v);

        assert_eq!(
            store.unify(v, list),
            Err(UnifyError::Occurs {
                var: "v".into(),
                ty: "LIST[v]".into(),
            })
        );
    }

    #[test]
    fn occurs_check_sees_through_bindings() {
        let mut store = TypeStore::new();
        let a = store.tvar("a");
        let b = store.tvar("b");
        let list = store.list(b);
        store.unify(b, a).unwrap();

        assert!(matches!(store.unify(a, list), Err(UnifyError::Occurs { .. })));
    }

    #[test]
    fn function_positions_are_not_interchangeable() {
        let mut store = TypeStore::new();
        let int = store.int();
        let bool = store.bool();
        let f = store.fun(int, bool);
        let g = store.fun(bool, int);

        assert_eq!(
            store.unify(f, g),
            Err(UnifyError::Mismatch {
                left: "INT".into(),
                right: "BOOL".into(),
            })
        );
    }

    #[test]
    fn failed_unification_rolls_back_partial_bindings() {
        let mut store = TypeStore::new();
        let a = store.tvar("a");
        let int = store.int();
        let bool = store.bool();
        let string = store.string();
        let lhs = store.pair(a, bool);
        let rhs = store.pair(int, string);

        assert!(store.unify(lhs, rhs).is_err());
        assert_eq!(store.val(a), None);
    }

    #[test]
    fn constructors_need_matching_names_and_arity() {
        let mut store = TypeStore::new();
        let int = store.int();
        let a = store.tvar("a");
        let opt_int = store.construct("option", &[int]);
        let opt_a = store.construct("option", &[a]);
        let other = store.construct("ref", &[int]);

        assert!(store.able_to_unify(opt_int, opt_a));
        assert_eq!(store.val(a), None);
        assert!(!store.able_to_unify(opt_int, other));

        store.unify(opt_a, opt_int).unwrap();
        assert_eq!(store.deref(a), int);
    }

    #[test]
    fn unify_compresses_variable_chains() {
        let mut store = TypeStore::new();
        let int = store.int();
        let a = store.tvar("a");
        let b = store.tvar("b");
        let c = store.tvar("c");
        store.unify(a, b).unwrap();
        store.unify(b, c).unwrap();
        store.unify(c, int).unwrap();

        store.unify(a, int).unwrap();
        assert_eq!(store.val(a), Some(int));
    }
}
