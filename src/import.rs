//! Importing TypedLang source text as blocks.
//!
//! An import either adds one top block per item of the program to the
//! workspace, fully resolved and typed, or fails and leaves the workspace as
//! it found it.
//!
//! `not`, `string_of_int`, `fst` and `snd` applied to an argument become
//! their dedicated blocks, except where the program binds the name itself.

use thiserror::Error;

use crate::{
    block::{BlockKind, BlockSpec, PatternSpec},
    infer::TypeError,
    syntax::{BinOp, Builtin, Expr, Item},
    unique::BlockId,
    workspace::Workspace,
};

pub mod parser;

pub use parser::{parse_program, SyntaxError};

/// The numeric codes reported for failed imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    Syntax = 1,
    UndefinedVariable = 4,
    TypeInference = 5,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code as u8
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("undefined variable: {}", .0.join(" "))]
    UndefinedVariable(Vec<String>),
    #[error(transparent)]
    TypeInference(#[from] TypeError),
}

impl ImportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ImportError::Syntax(_) => ErrorCode::Syntax,
            ImportError::UndefinedVariable(_) => ErrorCode::UndefinedVariable,
            ImportError::TypeInference(_) => ErrorCode::TypeInference,
        }
    }
}

/// Parses `source` and adds its items to `ws` as new top blocks, returned in
/// program order.
pub fn import(ws: &mut Workspace, source: &str) -> Result<Vec<BlockId>, ImportError> {
    let program = parse_program(source)?;
    tracing::debug!(items = program.len(), "parsed program");

    let snapshot = ws.store_mut().start_snapshot();
    let mut lowering = Lowering {
        ws: &mut *ws,
        created: Vec::new(),
        bound: Vec::new(),
    };
    let tops = program
        .iter()
        .map(|item| lowering.lower_item(item))
        .collect::<Vec<_>>();
    let created = lowering.created;

    ws.resolve_references();

    let undefined = undefined_variables(ws, &created);
    let result = if undefined.is_empty() {
        ws.update_type_inference()
            .map_err(ImportError::TypeInference)
    } else {
        Err(ImportError::UndefinedVariable(undefined))
    };

    match result {
        Ok(()) => {
            ws.store_mut().commit(snapshot);
            tracing::debug!(blocks = created.len(), "imported program");
            Ok(tops)
        }
        Err(err) => {
            tracing::debug!(code = u8::from(err.code()), %err, "import failed");
            for &top in &tops {
                ws.remove_tree(top);
            }
            ws.store_mut().rollback_to(snapshot);
            Err(err)
        }
    }
}

/// The names of the unresolved variable and constructor blocks among
/// `blocks`, in order of first appearance.
fn undefined_variables(ws: &Workspace, blocks: &[BlockId]) -> Vec<String> {
    let mut names = Vec::new();
    for &id in blocks {
        let reference = match ws.block(id).map(|block| block.kind()) {
            Some(BlockKind::Var { reference } | BlockKind::Construct { reference, .. }) => {
                reference
            }
            _ => continue,
        };
        let resolved = ws
            .bindings()
            .get_reference_by_id(*reference)
            .is_some_and(|reference| reference.is_resolved());
        if resolved {
            continue;
        }

        if let Some(name) = ws.reference_name(*reference) {
            if !names.iter().any(|n: &String| n == name) {
                names.push(String::from(name));
            }
        }
    }
    names
}

struct Lowering<'w> {
    ws: &'w mut Workspace,
    created: Vec<BlockId>,
    /// Names the program binds around the expression being lowered,
    /// innermost last.
    bound: Vec<String>,
}

impl Lowering<'_> {
    fn lower_item(&mut self, item: &Item) -> BlockId {
        match item {
            Item::Expr(expr) => self.lower(expr),
            Item::Let {
                name,
                args,
                recursive,
                value,
            } => {
                let spec = BlockSpec::LetStatement {
                    var: name.clone(),
                    args: args.clone(),
                    recursive: *recursive,
                };
                let id = self.block(spec, &[]);
                self.with_bound(binding_scope(name, args, *recursive), |this| {
                    this.connect(id, "EXP1", value)
                });
                // visible to every later item
                self.bound.push(name.clone());
                id
            }
            Item::Type { name, constructors } => {
                let spec = BlockSpec::Datatype {
                    name: name.clone(),
                    constructors: constructors.clone(),
                };
                self.block(spec, &[])
            }
        }
    }

    fn lower(&mut self, expr: &Expr) -> BlockId {
        match expr {
            Expr::Bool(b) => self.block(BlockSpec::Bool(*b), &[]),
            Expr::Int(n) => self.block(BlockSpec::Int(*n), &[]),
            Expr::MaxInt => self.block(BlockSpec::MaxInt, &[]),
            Expr::Float(x) => self.block(BlockSpec::Float(*x), &[]),
            Expr::Infinity => self.block(BlockSpec::Infinity, &[]),
            Expr::Str(s) => self.block(BlockSpec::Str(s.clone()), &[]),
            Expr::Var(name) => self.block(BlockSpec::Var { name: name.clone() }, &[]),

            Expr::Binary { op, lhs, rhs } => {
                let spec = match *op {
                    BinOp::Int(op) => BlockSpec::IntArith(op),
                    BinOp::Float(op) => BlockSpec::FloatArith(op),
                    BinOp::Concat => BlockSpec::Concat,
                    BinOp::Logic(op) => BlockSpec::Logic(op),
                    BinOp::Compare(op) => BlockSpec::Compare(op),
                    BinOp::Cons => {
                        let inputs = [("FIRST", &**lhs), ("REST", &**rhs)];
                        return self.block(BlockSpec::ListCons, &inputs);
                    }
                };
                self.block(spec, &[("A", &**lhs), ("B", &**rhs)])
            }

            Expr::Construct(name, arg) => {
                let spec = BlockSpec::Construct {
                    name: name.clone(),
                    arg: arg.is_some(),
                };
                match arg {
                    Some(arg) => self.block(spec, &[("ARG", &**arg)]),
                    None => self.block(spec, &[]),
                }
            }

            Expr::List(items) if items.is_empty() => self.block(BlockSpec::ListEmpty, &[]),
            Expr::List(items) => {
                let id = self.block(BlockSpec::ListCreate(items.len()), &[]);
                for (i, item) in items.iter().enumerate() {
                    self.connect(id, &format!("ADD{i}"), item);
                }
                id
            }

            Expr::Pair(first, second) => {
                self.block(BlockSpec::PairCreate, &[("FIRST", &**first), ("SECOND", &**second)])
            }
            Expr::Fun(var, body) => {
                let id = self.block(BlockSpec::Lambda { var: var.clone() }, &[]);
                self.with_bound([var.clone()], |this| this.connect(id, "RETURN", body));
                id
            }
            Expr::App(fun, arg) => {
                let builtin = match &**fun {
                    Expr::Var(name) if !self.is_bound(name) => Builtin::from_name(name),
                    _ => None,
                };
                match builtin {
                    Some(Builtin::Not) => self.block(BlockSpec::Not, &[("A", &**arg)]),
                    Some(Builtin::StringOfInt) => {
                        self.block(BlockSpec::StringOfInt, &[("PARAM", &**arg)])
                    }
                    Some(Builtin::Fst) => self.block(BlockSpec::PairFirst, &[("ARG", &**arg)]),
                    Some(Builtin::Snd) => self.block(BlockSpec::PairSecond, &[("ARG", &**arg)]),
                    None => {
                        self.block(BlockSpec::LambdaApp, &[("FUN", &**fun), ("ARG", &**arg)])
                    }
                }
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => self.block(
                BlockSpec::Ternary,
                &[("IF", &**cond), ("THEN", &**then), ("ELSE", &**otherwise)],
            ),

            Expr::Let {
                name,
                args,
                recursive,
                value,
                body,
            } => {
                let spec = BlockSpec::Let {
                    var: name.clone(),
                    args: args.clone(),
                    recursive: *recursive,
                };
                let id = self.block(spec, &[]);
                self.with_bound(binding_scope(name, args, *recursive), |this| {
                    this.connect(id, "EXP1", value)
                });
                self.with_bound([name.clone()], |this| this.connect(id, "EXP2", body));
                id
            }

            Expr::Match { scrutinee, arms } => {
                let spec = BlockSpec::Match {
                    patterns: arms.iter().map(|(pattern, _)| pattern.clone()).collect(),
                };
                let id = self.block(spec, &[("INPUT", &**scrutinee)]);
                for (i, (pattern, body)) in arms.iter().enumerate() {
                    let mut names = Vec::new();
                    pattern_names(pattern, &mut names);
                    self.with_bound(names, |this| this.connect(id, &format!("OUTPUT{i}"), body));
                }
                id
            }
        }
    }

    fn block(&mut self, spec: BlockSpec, inputs: &[(&str, &Expr)]) -> BlockId {
        let id = self.ws.new_block(spec);
        self.created.push(id);
        for &(input, child) in inputs {
            self.connect(id, input, child);
        }
        id
    }

    fn connect(&mut self, parent: BlockId, input: &str, child: &Expr) {
        let child = self.lower(child);
        self.ws.attach_input(parent, input, child);
    }

    fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|bound| bound == name)
    }

    fn with_bound<R>(
        &mut self,
        names: impl IntoIterator<Item = String>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let depth = self.bound.len();
        self.bound.extend(names);
        let result = f(self);
        self.bound.truncate(depth);
        result
    }
}

/// The names visible in the value of `let [rec] name args = ...`.
fn binding_scope(name: &str, args: &[String], recursive: bool) -> Vec<String> {
    let mut names = args.to_vec();
    if recursive {
        names.push(String::from(name));
    }
    names
}

fn pattern_names(pattern: &PatternSpec, names: &mut Vec<String>) {
    match pattern {
        PatternSpec::Var(name) => names.push(name.clone()),
        PatternSpec::Cons(a, b) | PatternSpec::Pair(a, b) => {
            pattern_names(a, names);
            pattern_names(b, names);
        }
        PatternSpec::Wildcard | PatternSpec::Int(_) | PatternSpec::Bool(_) | PatternSpec::Nil => {}
    }
}
