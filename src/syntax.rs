//! The TypedLang surface syntax accepted by the importer.

use crate::block::{CompareOp, ConstructorSpec, FloatOp, IntOp, LogicOp, PatternSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Int(IntOp),
    Float(FloatOp),
    Concat,
    Logic(LogicOp),
    Compare(CompareOp),
    Cons,
}

/// Functions that have a dedicated block when applied to an argument, unless
/// their name is bound by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Not,
    StringOfInt,
    Fst,
    Snd,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not" => Some(Builtin::Not),
            "string_of_int" => Some(Builtin::StringOfInt),
            "fst" => Some(Builtin::Fst),
            "snd" => Some(Builtin::Snd),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    MaxInt,
    Float(f64),
    Infinity,
    Str(String),
    Var(String),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A constructor, applied to its argument if it has one.
    Construct(String, Option<Box<Expr>>),
    /// `[]` when empty, `[a; b; ...]` otherwise.
    List(Vec<Expr>),
    Pair(Box<Expr>, Box<Expr>),
    Fun(String, Box<Expr>),
    App(Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Let {
        name: String,
        args: Vec<String>,
        recursive: bool,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<(PatternSpec, Expr)>,
    },
}

/// One `;;`-separated entry of a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Expr(Expr),
    /// A top-level `let` without `in`, visible to every later item.
    Let {
        name: String,
        args: Vec<String>,
        recursive: bool,
        value: Expr,
    },
    Type {
        name: String,
        constructors: Vec<ConstructorSpec>,
    },
}

impl Expr {
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}
