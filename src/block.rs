//! Headless blocks.
//!
//! A block is one node of a TypedLang expression tree. It has an output whose
//! type is determined by the block's kind, and a fixed list of named inputs,
//! each of which may be connected to the output of another block. Every type
//! a block needs (its output, its inputs, the variables it declares and the
//! patterns it matches against) is allocated once, when the block is built,
//! and owned by the block for its whole lifetime.
//!
//! Statement blocks (top-level `let` and datatype declarations) have no
//! usable output. They always stay at the top of the workspace, and what
//! they declare is visible to every top block created after them.

use std::fmt;

use crate::{
    binding::{BindingTable, TypedVariableValue, TypedVariableValueReference},
    symbol::StringInterner,
    types::{TyId, TypeStore},
    unique::{BlockId, RefId, ValueId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl IntOp {
    pub fn symbol(self) -> &'static str {
        match self {
            IntOp::Add => "+",
            IntOp::Sub => "-",
            IntOp::Mul => "*",
            IntOp::Div => "/",
        }
    }
}

impl FloatOp {
    pub fn symbol(self) -> &'static str {
        match self {
            FloatOp::Add => "+.",
            FloatOp::Sub => "-.",
            FloatOp::Mul => "*.",
            FloatOp::Div => "/.",
        }
    }
}

impl LogicOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

/// A pattern as written by a user, before any variables are declared.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSpec {
    Wildcard,
    Var(String),
    Int(i64),
    Bool(bool),
    Nil,
    Cons(Box<PatternSpec>, Box<PatternSpec>),
    Pair(Box<PatternSpec>, Box<PatternSpec>),
}

/// A pattern owned by a match block. Every node carries its own type.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub ty: TyId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Wildcard,
    Var(ValueId),
    Int(i64),
    Bool(bool),
    Nil,
    Cons(Box<Pattern>, Box<Pattern>),
    Pair(Box<Pattern>, Box<Pattern>),
}

impl Pattern {
    /// Calls `f` with this pattern and each of its sub-patterns, in
    /// pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&Pattern)) {
        f(self);
        match &self.kind {
            PatternKind::Cons(a, b) | PatternKind::Pair(a, b) => {
                a.walk(f);
                b.walk(f);
            }
            _ => {}
        }
    }

    /// Returns the variables this pattern declares, left to right.
    pub fn values(&self) -> Vec<ValueId> {
        let mut values = Vec::new();
        self.walk(&mut |pattern| {
            if let PatternKind::Var(value) = pattern.kind {
                values.push(value);
            }
        });
        values
    }
}

/// A type written in a declaration, such as the argument of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Int,
    Float,
    Bool,
    String,
    /// A datatype declared by a [`BlockSpec::Datatype`].
    Named(String),
    List(Box<TypeSpec>),
    Pair(Box<TypeSpec>, Box<TypeSpec>),
}

impl TypeSpec {
    fn build(&self, store: &mut TypeStore) -> TyId {
        match self {
            TypeSpec::Int => store.int(),
            TypeSpec::Float => store.float(),
            TypeSpec::Bool => store.bool(),
            TypeSpec::String => store.string(),
            TypeSpec::Named(name) => store.construct(name, &[]),
            TypeSpec::List(elem) => {
                let elem = elem.build(store);
                store.list(elem)
            }
            TypeSpec::Pair(first, second) => {
                let first = first.build(store);
                let second = second.build(store);
                store.pair(first, second)
            }
        }
    }
}

/// Prints the type as TypedLang source.
impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Int => f.write_str("int"),
            TypeSpec::Float => f.write_str("float"),
            TypeSpec::Bool => f.write_str("bool"),
            TypeSpec::String => f.write_str("string"),
            TypeSpec::Named(name) => f.write_str(name),
            TypeSpec::List(elem) if matches!(**elem, TypeSpec::Pair(..)) => {
                write!(f, "({elem}) list")
            }
            TypeSpec::List(elem) => write!(f, "{elem} list"),
            TypeSpec::Pair(first, second) => {
                match **first {
                    TypeSpec::Pair(..) => write!(f, "({first})")?,
                    _ => write!(f, "{first}")?,
                }
                match **second {
                    TypeSpec::Pair(..) => write!(f, " * ({second})"),
                    _ => write!(f, " * {second}"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorSpec {
    pub name: String,
    pub arg: Option<TypeSpec>,
}

/// A constructor declared by a datatype block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub value: ValueId,
    pub arg: Option<TypeSpec>,
}

/// A description of a block to be created in a
/// [`Workspace`](crate::workspace::Workspace).
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSpec {
    Bool(bool),
    Int(i64),
    MaxInt,
    Float(f64),
    Infinity,
    Str(String),
    IntArith(IntOp),
    FloatArith(FloatOp),
    Concat,
    StringOfInt,
    Logic(LogicOp),
    Not,
    Compare(CompareOp),
    Ternary,
    ListEmpty,
    ListCreate(usize),
    ListCons,
    PairCreate,
    PairFirst,
    PairSecond,
    Lambda {
        var: String,
    },
    LambdaApp,
    Let {
        var: String,
        args: Vec<String>,
        recursive: bool,
    },
    Var {
        name: String,
    },
    Match {
        patterns: Vec<PatternSpec>,
    },
    /// `let [rec] var args = EXP1` at the top level, without a body.
    LetStatement {
        var: String,
        args: Vec<String>,
        recursive: bool,
    },
    /// `type name = C1 | C2 of t | ...`.
    Datatype {
        name: String,
        constructors: Vec<ConstructorSpec>,
    },
    /// An application of the constructor `name`, with an `ARG` input if the
    /// constructor takes an argument.
    Construct {
        name: String,
        arg: bool,
    },
}

/// The kind of a block, carrying exactly what inference and code generation
/// need to know about it.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Bool(bool),
    Int(i64),
    MaxInt,
    Float(f64),
    Infinity,
    Str(Box<str>),
    IntArith(IntOp),
    FloatArith(FloatOp),
    Concat,
    StringOfInt,
    Logic(LogicOp),
    Not,
    Compare(CompareOp),
    Ternary,
    ListEmpty,
    ListCreate(usize),
    ListCons,
    PairCreate,
    PairFirst,
    PairSecond,
    Lambda {
        value: ValueId,
    },
    LambdaApp,
    Let {
        value: ValueId,
        args: Box<[ValueId]>,
        recursive: bool,
    },
    Var {
        reference: RefId,
    },
    Match {
        patterns: Box<[Pattern]>,
    },
    LetStatement {
        value: ValueId,
        args: Box<[ValueId]>,
        recursive: bool,
    },
    Datatype {
        name: Box<str>,
        constructors: Box<[Constructor]>,
    },
    Construct {
        reference: RefId,
        arg: bool,
    },
}

impl BlockKind {
    /// Returns `true` for blocks that cannot be plugged into an input.
    pub fn is_statement(&self) -> bool {
        matches!(self, BlockKind::LetStatement { .. } | BlockKind::Datatype { .. })
    }
}

/// A named, typed slot that another block's output can be plugged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    name: Box<str>,
    ty: TyId,
    target: Option<BlockId>,
}

impl Input {
    fn new(name: impl Into<Box<str>>, ty: TyId) -> Self {
        Self {
            name: name.into(),
            ty,
            target: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TyId {
        self.ty
    }

    /// The block connected to this input, if any.
    pub fn target(&self) -> Option<BlockId> {
        self.target
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    output: TyId,
    inputs: Vec<Input>,
    /// Types owned by this block that belong to neither its output nor its
    /// inputs: declared variables and pattern nodes.
    inner: Vec<TyId>,
    parent: Option<(BlockId, usize)>,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn output(&self) -> TyId {
        self.output
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn input(&self, index: usize) -> &Input {
        &self.inputs[index]
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input.name() == name)
    }

    /// The block and input index this block's output is connected to.
    pub fn parent(&self) -> Option<(BlockId, usize)> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<(BlockId, usize)>) {
        self.parent = parent;
    }

    pub(crate) fn set_target(&mut self, index: usize, target: Option<BlockId>) {
        self.inputs[index].target = target;
    }

    pub fn children(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.inputs.iter().filter_map(Input::target)
    }

    /// Every type tree this block owns.
    pub fn type_roots(&self) -> impl Iterator<Item = TyId> + '_ {
        std::iter::once(self.output)
            .chain(self.inputs.iter().map(Input::ty))
            .chain(self.inner.iter().copied())
    }

    /// The variables this block declares.
    pub fn values(&self) -> Vec<ValueId> {
        match &self.kind {
            BlockKind::Lambda { value } => vec![*value],
            BlockKind::Let { value, args, .. } | BlockKind::LetStatement { value, args, .. } => {
                std::iter::once(*value).chain(args.iter().copied()).collect()
            }
            BlockKind::Match { patterns } => {
                patterns.iter().flat_map(Pattern::values).collect()
            }
            BlockKind::Datatype { constructors, .. } => {
                constructors.iter().map(|ctor| ctor.value).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The variables this statement makes visible to later top blocks.
    pub fn exports(&self) -> Vec<ValueId> {
        match &self.kind {
            BlockKind::LetStatement { value, .. } => vec![*value],
            BlockKind::Datatype { constructors, .. } => {
                constructors.iter().map(|ctor| ctor.value).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn reference(&self) -> Option<RefId> {
        match self.kind {
            BlockKind::Var { reference } | BlockKind::Construct { reference, .. } => {
                Some(reference)
            }
            _ => None,
        }
    }

    pub(crate) fn set_reference(&mut self, new: RefId) {
        if let BlockKind::Var { reference } | BlockKind::Construct { reference, .. } =
            &mut self.kind
        {
            *reference = new;
        }
    }

    /// Builds a block from `spec`, allocating its types in `store` and
    /// registering its variables and references in `bindings`.
    pub(crate) fn build(
        spec: BlockSpec,
        store: &mut TypeStore,
        bindings: &mut BindingTable,
        interner: &mut StringInterner,
    ) -> Block {
        let id = BlockId::fresh();
        let mut inputs = Vec::new();
        let mut inner = Vec::new();

        let (kind, output) = match spec {
            BlockSpec::Bool(b) => (BlockKind::Bool(b), store.bool()),
            BlockSpec::Int(n) => (BlockKind::Int(n), store.int()),
            BlockSpec::MaxInt => (BlockKind::MaxInt, store.int()),
            BlockSpec::Float(x) => (BlockKind::Float(x), store.float()),
            BlockSpec::Infinity => (BlockKind::Infinity, store.float()),
            BlockSpec::Str(s) => (BlockKind::Str(s.into()), store.string()),
            BlockSpec::IntArith(op) => {
                binary_inputs(&mut inputs, store, TypeStore::int);
                (BlockKind::IntArith(op), store.int())
            }
            BlockSpec::FloatArith(op) => {
                binary_inputs(&mut inputs, store, TypeStore::float);
                (BlockKind::FloatArith(op), store.float())
            }
            BlockSpec::Concat => {
                binary_inputs(&mut inputs, store, TypeStore::string);
                (BlockKind::Concat, store.string())
            }
            BlockSpec::StringOfInt => {
                inputs.push(Input::new("PARAM", store.int()));
                (BlockKind::StringOfInt, store.string())
            }
            BlockSpec::Logic(op) => {
                binary_inputs(&mut inputs, store, TypeStore::bool);
                (BlockKind::Logic(op), store.bool())
            }
            BlockSpec::Not => {
                inputs.push(Input::new("A", store.bool()));
                (BlockKind::Not, store.bool())
            }
            BlockSpec::Compare(op) => {
                binary_inputs(&mut inputs, store, TypeStore::fresh_var);
                (BlockKind::Compare(op), store.bool())
            }
            BlockSpec::Ternary => {
                inputs.push(Input::new("IF", store.bool()));
                inputs.push(Input::new("THEN", store.fresh_var()));
                inputs.push(Input::new("ELSE", store.fresh_var()));
                (BlockKind::Ternary, store.fresh_var())
            }
            BlockSpec::ListEmpty => {
                let elem = store.fresh_var();
                (BlockKind::ListEmpty, store.list(elem))
            }
            BlockSpec::ListCreate(n) => {
                for i in 0..n {
                    inputs.push(Input::new(format!("ADD{i}"), store.fresh_var()));
                }
                let elem = store.fresh_var();
                (BlockKind::ListCreate(n), store.list(elem))
            }
            BlockSpec::ListCons => {
                inputs.push(Input::new("FIRST", store.fresh_var()));
                let rest = store.fresh_var();
                inputs.push(Input::new("REST", store.list(rest)));
                let elem = store.fresh_var();
                (BlockKind::ListCons, store.list(elem))
            }
            BlockSpec::PairCreate => {
                inputs.push(Input::new("FIRST", store.fresh_var()));
                inputs.push(Input::new("SECOND", store.fresh_var()));
                let (a, b) = (store.fresh_var(), store.fresh_var());
                (BlockKind::PairCreate, store.pair(a, b))
            }
            BlockSpec::PairFirst => {
                pair_input(&mut inputs, store);
                (BlockKind::PairFirst, store.fresh_var())
            }
            BlockSpec::PairSecond => {
                pair_input(&mut inputs, store);
                (BlockKind::PairSecond, store.fresh_var())
            }
            BlockSpec::Lambda { var } => {
                inputs.push(Input::new("RETURN", store.fresh_var()));
                let value = declare(id, &var, "VAR", &["RETURN"], store, bindings, interner);
                inner.push(bindings_ty(bindings, value));

                let (param, ret) = (store.fresh_var(), store.fresh_var());
                (BlockKind::Lambda { value }, store.fun(param, ret))
            }
            BlockSpec::LambdaApp => {
                let (param, ret) = (store.fresh_var(), store.fresh_var());
                inputs.push(Input::new("FUN", store.fun(param, ret)));
                inputs.push(Input::new("ARG", store.fresh_var()));
                (BlockKind::LambdaApp, store.fresh_var())
            }
            BlockSpec::Let {
                var,
                args,
                recursive,
            } => {
                inputs.push(Input::new("EXP1", store.fresh_var()));
                inputs.push(Input::new("EXP2", store.fresh_var()));

                let scope: &[&str] = if recursive {
                    &["EXP1", "EXP2"]
                } else {
                    &["EXP2"]
                };
                let value = declare(id, &var, "VAR", scope, store, bindings, interner);
                inner.push(bindings_ty(bindings, value));
                let args = declare_args(id, &args, &mut inner, store, bindings, interner);

                let kind = BlockKind::Let {
                    value,
                    args,
                    recursive,
                };
                (kind, store.fresh_var())
            }
            BlockSpec::LetStatement {
                var,
                args,
                recursive,
            } => {
                inputs.push(Input::new("EXP1", store.fresh_var()));

                let scope: &[&str] = if recursive { &["EXP1"] } else { &[] };
                let value = declare(id, &var, "VAR", scope, store, bindings, interner);
                inner.push(bindings_ty(bindings, value));
                let args = declare_args(id, &args, &mut inner, store, bindings, interner);

                let kind = BlockKind::LetStatement {
                    value,
                    args,
                    recursive,
                };
                (kind, store.fresh_var())
            }
            BlockSpec::Var { name } => {
                let reference = refer(id, &name, bindings, interner);
                (BlockKind::Var { reference }, store.fresh_var())
            }
            BlockSpec::Datatype { name, constructors } => {
                let constructors = constructors
                    .into_iter()
                    .enumerate()
                    .map(|(i, ctor)| {
                        let result = store.construct(&name, &[]);
                        let ty = match &ctor.arg {
                            Some(arg) => {
                                let arg = arg.build(store);
                                store.fun(arg, result)
                            }
                            None => result,
                        };
                        inner.push(ty);

                        let field = format!("CTR{i}");
                        let ctor_name = interner.intern(&ctor.name);
                        let value = TypedVariableValue::new(id, ty, &field, &[], ctor_name);
                        let value_id = value.id();
                        bindings.add_value(value);

                        Constructor {
                            value: value_id,
                            arg: ctor.arg,
                        }
                    })
                    .collect();

                let output = store.construct(&name, &[]);
                let kind = BlockKind::Datatype {
                    name: name.into(),
                    constructors,
                };
                (kind, output)
            }
            BlockSpec::Construct { name, arg } => {
                if arg {
                    inputs.push(Input::new("ARG", store.fresh_var()));
                }
                let reference = refer(id, &name, bindings, interner);
                (BlockKind::Construct { reference, arg }, store.fresh_var())
            }
            BlockSpec::Match { patterns } => {
                inputs.push(Input::new("INPUT", store.fresh_var()));

                let patterns = patterns
                    .iter()
                    .enumerate()
                    .map(|(i, spec)| {
                        let output = format!("OUTPUT{i}");
                        inputs.push(Input::new(output.as_str(), store.fresh_var()));

                        let mut builder = PatternBuilder {
                            block: id,
                            arm: i,
                            scope: &output,
                            next_var: 0,
                            store: &mut *store,
                            bindings: &mut *bindings,
                            interner: &mut *interner,
                        };
                        let pattern = builder.build(spec);
                        pattern.walk(&mut |node| inner.push(node.ty));
                        pattern
                    })
                    .collect();

                (BlockKind::Match { patterns }, store.fresh_var())
            }
        };

        Block {
            id,
            kind,
            output,
            inputs,
            inner,
            parent: None,
        }
    }
}

fn binary_inputs(
    inputs: &mut Vec<Input>,
    store: &mut TypeStore,
    mut ty: impl FnMut(&mut TypeStore) -> TyId,
) {
    inputs.push(Input::new("A", ty(store)));
    inputs.push(Input::new("B", ty(store)));
}

fn pair_input(inputs: &mut Vec<Input>, store: &mut TypeStore) {
    let (a, b) = (store.fresh_var(), store.fresh_var());
    inputs.push(Input::new("ARG", store.pair(a, b)));
}

fn declare(
    block: BlockId,
    name: &str,
    field_name: &str,
    scope: &[&str],
    store: &mut TypeStore,
    bindings: &mut BindingTable,
    interner: &mut StringInterner,
) -> ValueId {
    let name = interner.intern(name);
    let value = TypedVariableValue::new(block, store.fresh_var(), field_name, scope, name);
    let id = value.id();
    bindings.add_value(value);
    id
}

/// Declares the arguments of a `let`, visible in `EXP1`.
fn declare_args(
    block: BlockId,
    args: &[String],
    inner: &mut Vec<TyId>,
    store: &mut TypeStore,
    bindings: &mut BindingTable,
    interner: &mut StringInterner,
) -> Box<[ValueId]> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let field = format!("ARG{i}");
            let arg = declare(block, arg, &field, &["EXP1"], store, bindings, interner);
            inner.push(bindings_ty(bindings, arg));
            arg
        })
        .collect()
}

fn refer(
    block: BlockId,
    name: &str,
    bindings: &mut BindingTable,
    interner: &mut StringInterner,
) -> RefId {
    let reference = TypedVariableValueReference::new(block, interner.intern(name));
    let id = reference.id();
    bindings.add_reference(reference);
    id
}

fn bindings_ty(bindings: &BindingTable, value: ValueId) -> TyId {
    match bindings.get_value_by_id(value) {
        Some(value) => value.ty(),
        None => panic!("{value:?} was declared but is not in the value table"),
    }
}

struct PatternBuilder<'a> {
    block: BlockId,
    arm: usize,
    scope: &'a str,
    next_var: usize,
    store: &'a mut TypeStore,
    bindings: &'a mut BindingTable,
    interner: &'a mut StringInterner,
}

impl PatternBuilder<'_> {
    fn build(&mut self, spec: &PatternSpec) -> Pattern {
        match spec {
            PatternSpec::Wildcard => Pattern {
                kind: PatternKind::Wildcard,
                ty: self.store.fresh_var(),
            },
            PatternSpec::Var(name) => {
                let field = format!("PAT{}_{}", self.arm, self.next_var);
                self.next_var += 1;

                let value = declare(
                    self.block,
                    name,
                    &field,
                    &[self.scope],
                    self.store,
                    self.bindings,
                    self.interner,
                );
                let ty = bindings_ty(self.bindings, value);
                Pattern {
                    kind: PatternKind::Var(value),
                    ty,
                }
            }
            PatternSpec::Int(n) => Pattern {
                kind: PatternKind::Int(*n),
                ty: self.store.int(),
            },
            PatternSpec::Bool(b) => Pattern {
                kind: PatternKind::Bool(*b),
                ty: self.store.bool(),
            },
            PatternSpec::Nil => {
                let elem = self.store.fresh_var();
                Pattern {
                    kind: PatternKind::Nil,
                    ty: self.store.list(elem),
                }
            }
            PatternSpec::Cons(head, tail) => {
                let head = self.build(head);
                let tail = self.build(tail);
                let elem = self.store.fresh_var();
                Pattern {
                    kind: PatternKind::Cons(Box::new(head), Box::new(tail)),
                    ty: self.store.list(elem),
                }
            }
            PatternSpec::Pair(left, right) => {
                let left = self.build(left);
                let right = self.build(right);
                let (a, b) = (self.store.fresh_var(), self.store.fresh_var());
                Pattern {
                    kind: PatternKind::Pair(Box::new(left), Box::new(right)),
                    ty: self.store.pair(a, b),
                }
            }
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Bool(_) => "bool",
            BlockKind::Int(_) => "int",
            BlockKind::MaxInt => "max_int",
            BlockKind::Float(_) => "float",
            BlockKind::Infinity => "infinity",
            BlockKind::Str(_) => "string",
            BlockKind::IntArith(_) => "int_arithmetic",
            BlockKind::FloatArith(_) => "float_arithmetic",
            BlockKind::Concat => "concat_string",
            BlockKind::StringOfInt => "string_of_int",
            BlockKind::Logic(_) => "logic_operator",
            BlockKind::Not => "not_operator",
            BlockKind::Compare(_) => "logic_compare",
            BlockKind::Ternary => "logic_ternary",
            BlockKind::ListEmpty => "list_empty",
            BlockKind::ListCreate(_) => "list_create",
            BlockKind::ListCons => "list_cons",
            BlockKind::PairCreate => "pair_create",
            BlockKind::PairFirst => "pair_first",
            BlockKind::PairSecond => "pair_second",
            BlockKind::Lambda { .. } => "lambda",
            BlockKind::LambdaApp => "lambda_app",
            BlockKind::Let { .. } => "let",
            BlockKind::Var { .. } => "variables_get",
            BlockKind::Match { .. } => "match",
            BlockKind::LetStatement { .. } => "letstatement",
            BlockKind::Datatype { .. } => "defined_datatype",
            BlockKind::Construct { .. } => "create_construct",
        };
        f.write_str(name)
    }
}
