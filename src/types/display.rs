//! Human-readable renderings of types and schemes.

use std::fmt;

use super::{Scheme, TyId, TypeExpr, TypeStore};

/// A [`fmt::Display`] adapter for a type in a [`TypeStore`].
#[derive(Debug, Clone, Copy)]
pub struct TyDisplay<'a> {
    store: &'a TypeStore,
    ty: TyId,
    hide_names: bool,
}

impl TypeStore {
    /// Renders `ty`, printing unbound variables by name.
    pub fn display(&self, ty: TyId) -> TyDisplay<'_> {
        TyDisplay {
            store: self,
            ty,
            hide_names: false,
        }
    }

    /// Renders `ty`, printing every unbound variable as `?`. Two types with
    /// the same shape render identically regardless of variable identities.
    pub fn display_anonymous(&self, ty: TyId) -> TyDisplay<'_> {
        TyDisplay {
            store: self,
            ty,
            hide_names: true,
        }
    }
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_ty(self.ty, f)
    }
}

impl TyDisplay<'_> {
    fn child(&self, ty: TyId) -> Self {
        Self { ty, ..*self }
    }

    fn write_ty(&self, ty: TyId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store;
        match store.get(store.deref(ty)) {
            TypeExpr::Int => f.write_str("INT"),
            TypeExpr::Float => f.write_str("FLOAT"),
            TypeExpr::Bool => f.write_str("BOOL"),
            TypeExpr::String => f.write_str("STRING"),
            TypeExpr::Var { .. } if self.hide_names => f.write_str("?"),
            TypeExpr::Var { name, .. } => {
                f.write_str(store.names().name(*name))
            }
            TypeExpr::List(elem) => write!(f, "LIST[{}]", self.child(*elem)),
            TypeExpr::Pair(a, b) => {
                write!(f, "PAIR[{} * {}]", self.child(*a), self.child(*b))
            }
            TypeExpr::Sum(a, b) => {
                write!(f, "SUM[{} + {}]", self.child(*a), self.child(*b))
            }
            TypeExpr::Fun(param, ret) => {
                let param_is_fun = matches!(
                    store.get(store.deref(*param)),
                    TypeExpr::Fun(..)
                );

                if param_is_fun {
                    write!(f, "({}) -> {}", self.child(*param), self.child(*ret))
                } else {
                    write!(f, "{} -> {}", self.child(*param), self.child(*ret))
                }
            }
            TypeExpr::Construct { name, args } => {
                f.write_str(store.names().name(*name))?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "[{}", self.child(*first))?;
                    for arg in rest {
                        write!(f, ", {}", self.child(*arg))?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
        }
    }
}

/// A [`fmt::Display`] adapter for a [`Scheme`].
#[derive(Debug, Clone, Copy)]
pub struct SchemeDisplay<'a> {
    store: &'a TypeStore,
    scheme: &'a Scheme,
}

impl Scheme {
    pub fn display<'a>(&'a self, store: &'a TypeStore) -> SchemeDisplay<'a> {
        SchemeDisplay {
            store,
            scheme: self,
        }
    }
}

impl fmt::Display for SchemeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.scheme.names();
        if !names.is_empty() {
            f.write_str("∀")?;
            for name in names {
                write!(f, " {}", self.store.names().name(*name))?;
            }
            f.write_str(". ")?;
        }

        write!(f, "{}", self.store.display(self.scheme.ty()))
    }
}
