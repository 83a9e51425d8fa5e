//! Code generation.
//!
//! Block trees are printed back as TypedLang source with as few parentheses
//! as OCaml's precedence rules allow. The output of [`generate_program`]
//! re-imports to blocks of the same types.

use pretty::RcDoc;
use thiserror::Error;

use crate::{
    block::{Block, BlockKind, Constructor, FloatOp, IntOp, LogicOp, Pattern, PatternKind},
    config::GeneratorConfig,
    types::Label,
    unique::{BlockId, RefId, ValueId},
    workspace::Workspace,
};

type Doc = RcDoc<'static, ()>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("no block with id {0:?}")]
    NoSuchBlock(BlockId),
    #[error("input {input} of {block:?} is empty and its type {ty} has no default value")]
    UnresolvedHole {
        block: BlockId,
        input: Box<str>,
        ty: String,
    },
    #[error("{0:?} has no name")]
    UnnamedValue(ValueId),
    #[error("{0:?} has no name")]
    UnnamedReference(RefId),
}

pub type Result<T> = std::result::Result<T, GenError>;

/// Renders every top block of `ws`, in creation order, as one program.
pub fn generate_program(ws: &Workspace, config: &GeneratorConfig) -> Result<String> {
    let generator = Generator::new(ws, config);
    let exprs = ws
        .top_blocks()
        .into_iter()
        .map(|top| generator.render(top))
        .collect::<Result<Vec<_>>>()?;

    Ok(exprs.join(";;\n"))
}

/// Renders the tree rooted at `root`.
pub fn generate(ws: &Workspace, root: BlockId, config: &GeneratorConfig) -> Result<String> {
    Generator::new(ws, config).render(root)
}

/// How tightly an expression binds; later variants bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    /// `let`, `fun`, `if` and `match`, which extend as far right as they can.
    Open,
    Or,
    And,
    Compare,
    Concat,
    Cons,
    Add,
    Mul,
    App,
    Atom,
}

impl Prec {
    fn next(self) -> Prec {
        match self {
            Prec::Open => Prec::Or,
            Prec::Or => Prec::And,
            Prec::And => Prec::Compare,
            Prec::Compare => Prec::Concat,
            Prec::Concat => Prec::Cons,
            Prec::Cons => Prec::Add,
            Prec::Add => Prec::Mul,
            Prec::Mul => Prec::App,
            Prec::App | Prec::Atom => Prec::Atom,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Assoc {
    Left,
    Right,
}

pub struct Generator<'w> {
    ws: &'w Workspace,
    width: usize,
    indent: isize,
}

impl<'w> Generator<'w> {
    pub fn new(ws: &'w Workspace, config: &GeneratorConfig) -> Self {
        Self {
            ws,
            width: config.width,
            indent: config.indent,
        }
    }

    pub fn render(&self, root: BlockId) -> Result<String> {
        let doc = self.expr(root, Prec::Open)?;
        Ok(format!("{}", doc.pretty(self.width)))
    }

    fn expr(&self, id: BlockId, min: Prec) -> Result<Doc> {
        let block = self.ws.block(id).ok_or(GenError::NoSuchBlock(id))?;
        let (prec, doc) = self.layout(block)?;

        Ok(if prec < min { parens(doc) } else { doc })
    }

    fn layout(&self, block: &Block) -> Result<(Prec, Doc)> {
        Ok(match block.kind() {
            BlockKind::Bool(b) => (Prec::Atom, RcDoc::as_string(b)),
            BlockKind::Int(n) if *n < 0 => (Prec::Atom, RcDoc::as_string(format!("({n})"))),
            BlockKind::Int(n) => (Prec::Atom, RcDoc::as_string(n)),
            BlockKind::MaxInt => (Prec::Atom, RcDoc::text("max_int")),
            BlockKind::Float(x) => (Prec::Atom, RcDoc::as_string(float_literal(*x))),
            BlockKind::Infinity => (Prec::Atom, RcDoc::text("infinity")),
            BlockKind::Str(s) => (Prec::Atom, RcDoc::as_string(string_literal(s))),

            BlockKind::IntArith(op) => {
                let prec = match op {
                    IntOp::Add | IntOp::Sub => Prec::Add,
                    IntOp::Mul | IntOp::Div => Prec::Mul,
                };
                self.binary(block, op.symbol(), prec, Assoc::Left)?
            }
            BlockKind::FloatArith(op) => {
                let prec = match op {
                    FloatOp::Add | FloatOp::Sub => Prec::Add,
                    FloatOp::Mul | FloatOp::Div => Prec::Mul,
                };
                self.binary(block, op.symbol(), prec, Assoc::Left)?
            }
            BlockKind::Concat => self.binary(block, "^", Prec::Concat, Assoc::Right)?,
            BlockKind::Logic(op) => {
                let prec = match op {
                    LogicOp::And => Prec::And,
                    LogicOp::Or => Prec::Or,
                };
                self.binary(block, op.symbol(), prec, Assoc::Right)?
            }
            BlockKind::Compare(op) => {
                self.binary(block, op.symbol(), Prec::Compare, Assoc::Left)?
            }
            BlockKind::ListCons => self.binary(block, "::", Prec::Cons, Assoc::Right)?,

            BlockKind::Not => self.call(block, "not")?,
            BlockKind::StringOfInt => self.call(block, "string_of_int")?,
            BlockKind::PairFirst => self.call(block, "fst")?,
            BlockKind::PairSecond => self.call(block, "snd")?,

            BlockKind::Ternary => {
                let cond = self.input(block, 0, Prec::Open)?;
                let then = self.input(block, 1, Prec::Open)?;
                let otherwise = self.input(block, 2, Prec::Open)?;

                let doc = RcDoc::text("if ")
                    .append(cond)
                    .append(RcDoc::line())
                    .append("then")
                    .append(RcDoc::line().append(then).nest(self.indent))
                    .append(RcDoc::line())
                    .append("else")
                    .append(RcDoc::line().append(otherwise).nest(self.indent))
                    .group();
                (Prec::Open, doc)
            }

            BlockKind::ListEmpty => (Prec::Atom, RcDoc::text("[]")),
            BlockKind::ListCreate(n) => {
                let items = (0..*n)
                    .map(|i| self.input(block, i, Prec::Or))
                    .collect::<Result<Vec<_>>>()?;
                let sep = RcDoc::text(";").append(RcDoc::line());
                let doc = RcDoc::text("[")
                    .append(RcDoc::intersperse(items, sep).nest(1))
                    .append("]")
                    .group();
                (Prec::Atom, doc)
            }

            BlockKind::PairCreate => {
                let first = self.input(block, 0, Prec::Or)?;
                let second = self.input(block, 1, Prec::Or)?;
                let doc = RcDoc::text("(")
                    .append(first)
                    .append(",")
                    .append(RcDoc::line())
                    .append(second)
                    .nest(1)
                    .append(")")
                    .group();
                (Prec::Atom, doc)
            }

            BlockKind::Lambda { value } => {
                let body = self.input(block, 0, Prec::Open)?;
                let doc = RcDoc::text("fun ")
                    .append(self.value_name(*value)?)
                    .append(" ->")
                    .append(RcDoc::line().append(body).nest(self.indent))
                    .group();
                (Prec::Open, doc)
            }

            BlockKind::LambdaApp => {
                let fun = self.input(block, 0, Prec::App)?;
                let arg = self.input(block, 1, Prec::Atom)?;
                let doc = fun
                    .append(RcDoc::line().append(arg).nest(self.indent))
                    .group();
                (Prec::App, doc)
            }

            BlockKind::Let {
                value,
                args,
                recursive,
            } => {
                let exp2 = self.input(block, 1, Prec::Open)?;
                let binding = self
                    .binding(block, *value, args, *recursive)?
                    .append(RcDoc::line())
                    .append("in")
                    .group();
                (Prec::Open, binding.append(RcDoc::line()).append(exp2).group())
            }
            BlockKind::LetStatement {
                value,
                args,
                recursive,
            } => {
                let binding = self.binding(block, *value, args, *recursive)?;
                (Prec::Open, binding.group())
            }

            BlockKind::Var { reference } => (Prec::Atom, self.reference_name(*reference)?),

            BlockKind::Datatype { name, constructors } => {
                let constructors = constructors
                    .iter()
                    .map(|constructor| self.constructor(constructor))
                    .collect::<Result<Vec<_>>>()?;
                let sep = RcDoc::line().append("| ");
                let doc = RcDoc::text("type ")
                    .append(RcDoc::as_string(name))
                    .append(" =")
                    .append(
                        RcDoc::line()
                            .append(RcDoc::intersperse(constructors, sep))
                            .nest(self.indent),
                    )
                    .group();
                (Prec::Open, doc)
            }
            BlockKind::Construct { reference, arg } => {
                let name = self.reference_name(*reference)?;
                if *arg {
                    let arg = self.input(block, 0, Prec::Atom)?;
                    let doc = name.append(RcDoc::line().append(arg).nest(self.indent)).group();
                    (Prec::App, doc)
                } else {
                    (Prec::Atom, name)
                }
            }

            BlockKind::Match { patterns } => {
                let scrutinee = self.input(block, 0, Prec::Open)?;
                let mut doc = RcDoc::text("match ").append(scrutinee).append(" with");

                for (i, pattern) in patterns.iter().enumerate() {
                    // a trailing open form would swallow the arms after it
                    let min = if i + 1 < patterns.len() {
                        Prec::Or
                    } else {
                        Prec::Open
                    };
                    let body = self.input(block, i + 1, min)?;
                    let arm = RcDoc::text("| ")
                        .append(self.pattern(pattern, PatPrec::Pair)?)
                        .append(" ->")
                        .append(RcDoc::line().append(body).nest(self.indent))
                        .group();
                    doc = doc.append(RcDoc::line()).append(arm);
                }

                (Prec::Open, doc.group())
            }
        })
    }

    fn binary(
        &self,
        block: &Block,
        symbol: &'static str,
        prec: Prec,
        assoc: Assoc,
    ) -> Result<(Prec, Doc)> {
        let (lhs_min, rhs_min) = match assoc {
            Assoc::Left => (prec, prec.next()),
            Assoc::Right => (prec.next(), prec),
        };

        let lhs = self.input(block, 0, lhs_min)?;
        let rhs = self.input(block, 1, rhs_min)?;
        let doc = lhs
            .append(" ")
            .append(symbol)
            .append(RcDoc::line().append(rhs).nest(self.indent))
            .group();
        Ok((prec, doc))
    }

    /// `let [rec] name args = EXP1`, where `EXP1` is the first input.
    fn binding(
        &self,
        block: &Block,
        value: ValueId,
        args: &[ValueId],
        recursive: bool,
    ) -> Result<Doc> {
        let mut names = vec![self.value_name(value)?];
        for &arg in args {
            names.push(self.value_name(arg)?);
        }
        let keyword = if recursive { "let rec " } else { "let " };
        let exp1 = self.input(block, 0, Prec::Open)?;

        Ok(RcDoc::text(keyword)
            .append(RcDoc::intersperse(names, RcDoc::space()))
            .append(" =")
            .append(RcDoc::line().append(exp1).nest(self.indent)))
    }

    fn constructor(&self, constructor: &Constructor) -> Result<Doc> {
        let name = self.value_name(constructor.value)?;
        Ok(match &constructor.arg {
            Some(arg) => name.append(" of ").append(RcDoc::as_string(arg)),
            None => name,
        })
    }

    fn call(&self, block: &Block, function: &'static str) -> Result<(Prec, Doc)> {
        let arg = self.input(block, 0, Prec::Atom)?;
        let doc = RcDoc::text(function)
            .append(RcDoc::line().append(arg).nest(self.indent))
            .group();
        Ok((Prec::App, doc))
    }

    /// The expression plugged into the input at `index`, or a default value
    /// for an empty input of a type that has one.
    fn input(&self, block: &Block, index: usize, min: Prec) -> Result<Doc> {
        let input = block.input(index);
        if let Some(child) = input.target() {
            return self.expr(child, min);
        }

        let store = self.ws.store();
        let ty = store.deref(input.ty());
        let default = match store.label(ty) {
            Label::Int => "0",
            Label::Float => "0.0",
            Label::Bool => "false",
            Label::String => "\"\"",
            Label::List => "[]",
            Label::Var | Label::Pair | Label::Sum | Label::Fun | Label::Construct => {
                return Err(GenError::UnresolvedHole {
                    block: block.id(),
                    input: input.name().into(),
                    ty: store.display(ty).to_string(),
                });
            }
        };

        tracing::trace!(block = ?block.id(), input = input.name(), default, "filled empty input");
        Ok(RcDoc::text(default))
    }

    fn pattern(&self, pattern: &Pattern, min: PatPrec) -> Result<Doc> {
        let (prec, doc) = match &pattern.kind {
            PatternKind::Wildcard => (PatPrec::Atom, RcDoc::text("_")),
            PatternKind::Var(value) => (PatPrec::Atom, self.value_name(*value)?),
            PatternKind::Int(n) if *n < 0 => (PatPrec::Atom, RcDoc::as_string(format!("({n})"))),
            PatternKind::Int(n) => (PatPrec::Atom, RcDoc::as_string(n)),
            PatternKind::Bool(b) => (PatPrec::Atom, RcDoc::as_string(b)),
            PatternKind::Nil => (PatPrec::Atom, RcDoc::text("[]")),
            PatternKind::Cons(head, tail) => {
                let doc = self
                    .pattern(head, PatPrec::Atom)?
                    .append(" :: ")
                    .append(self.pattern(tail, PatPrec::Cons)?);
                (PatPrec::Cons, doc)
            }
            PatternKind::Pair(left, right) => {
                let doc = self
                    .pattern(left, PatPrec::Cons)?
                    .append(", ")
                    .append(self.pattern(right, PatPrec::Cons)?);
                (PatPrec::Pair, doc)
            }
        };

        Ok(if prec < min { parens(doc) } else { doc })
    }

    fn reference_name(&self, reference: RefId) -> Result<Doc> {
        let name = self
            .ws
            .reference_name(reference)
            .ok_or(GenError::UnnamedReference(reference))?;
        Ok(RcDoc::as_string(name))
    }

    fn value_name(&self, value: ValueId) -> Result<Doc> {
        let name = self
            .ws
            .value_name(value)
            .ok_or(GenError::UnnamedValue(value))?;
        Ok(RcDoc::as_string(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PatPrec {
    Pair,
    Cons,
    Atom,
}

fn parens(doc: Doc) -> Doc {
    RcDoc::text("(").append(doc.nest(1)).append(")")
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        String::from("(0.0 /. 0.0)")
    } else if x == f64::INFINITY {
        String::from("infinity")
    } else if x == f64::NEG_INFINITY {
        String::from("(0.0 -. infinity)")
    } else if x.is_sign_negative() {
        format!("({x:?})")
    } else {
        format!("{x:?}")
    }
}

fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{float_literal, generate, generate_program, string_literal, GenError};
    use crate::{
        block::{BlockSpec, FloatOp, IntOp},
        config::GeneratorConfig,
        import::import,
        workspace::Workspace,
    };

    fn regenerate(source: &str) -> String {
        let mut ws = Workspace::new();
        import(&mut ws, source).unwrap();
        generate_program(&ws, &GeneratorConfig::default()).unwrap()
    }

    fn types_of(source: &str) -> Vec<String> {
        let mut ws = Workspace::new();
        let tops = import(&mut ws, source).unwrap();
        tops.into_iter()
            .map(|top| {
                let ty = ws.type_of(top).unwrap();
                ws.store().display_anonymous(ty).to_string()
            })
            .collect()
    }

    #[test]
    fn canonical_sources_are_reproduced() {
        for source in [
            "let x = 1 in x",
            "1 + 2 * 3",
            "(1 + 2) * 3",
            "1 - (2 - 3)",
            "1 :: 2 :: []",
            "(1 :: []) :: []",
            "true || false && 1 < 2",
            "(true || false) && true",
            r#""a" ^ "b" ^ "c""#,
            "2.5 *. 4.0",
            "let f x y = x in f 1 (f 2 3)",
            "let rec f n = if n = 0 then 1 else n * f (n - 1) in f 5",
            "fun p -> (fst p, snd p)",
            "not (not true)",
            "string_of_int (-3)",
            "[1; 2; 3]",
            "fun l -> match l with | [] -> 0 | h :: _ -> h",
            "fun x -> (fun y -> y) x",
            "(-9223372036854775808)",
            "match 0 with | (-9223372036854775808) -> true | _ -> false",
            "let rec f x = f x;;\nf 1",
            "type shape = Dot | Rect of int * int | Poly of (int * int) list;;\nRect (1, 2) :: [Dot]",
            "let fst p = p + 1 in fst 2",
            "type t = A of t;;\nfun x -> A (A x)",
        ] {
            assert_eq!(regenerate(source), source);
        }
    }

    #[test]
    fn extreme_integers_reimport() {
        let mut ws = Workspace::new();
        let min = ws.new_block(BlockSpec::Int(i64::MIN));
        let generated = generate(&ws, min, &GeneratorConfig::default()).unwrap();
        assert_eq!(generated, "(-9223372036854775808)");
        assert_eq!(types_of(&generated), vec!["INT"]);
    }

    #[test]
    fn programs_join_top_blocks() {
        assert_eq!(regenerate("1;; true"), "1;;\ntrue");
    }

    #[test]
    fn nested_open_forms_are_parenthesized() {
        assert_eq!(
            regenerate("fun m -> match m with | 0 -> (match m with | _ -> 1) | _ -> 2"),
            "fun m -> match m with | 0 -> (match m with | _ -> 1) | _ -> 2"
        );
        assert_eq!(regenerate("1 + (let x = 2 in x)"), "1 + (let x = 2 in x)");
        assert_eq!(regenerate("(fun x -> x) 1"), "(fun x -> x) 1");
    }

    #[test]
    fn generated_code_reimports_to_the_same_types() {
        for source in [
            "let id x = x in (id 1, id \"s\")",
            "let rec len l = match l with [] -> 0 | _ :: t -> 1 + len t in len",
            "fun a b -> if a then b else b +. 1.0",
            "match (1, true) with a, b -> b",
        ] {
            let generated = regenerate(source);
            assert_eq!(types_of(&generated), types_of(source), "{generated}");
        }
    }

    #[test]
    fn empty_inputs_get_defaults() {
        let mut ws = Workspace::new();
        let add = ws.new_block(BlockSpec::IntArith(IntOp::Add));
        let mul = ws.new_block(BlockSpec::FloatArith(FloatOp::Mul));
        let config = GeneratorConfig::default();

        assert_eq!(generate(&ws, add, &config).unwrap(), "0 + 0");
        assert_eq!(generate(&ws, mul, &config).unwrap(), "0.0 *. 0.0");
    }

    #[test]
    fn untyped_holes_are_errors() {
        let mut ws = Workspace::new();
        let let_ = ws.new_block(BlockSpec::Let {
            var: "x".into(),
            args: vec![],
            recursive: false,
        });

        let err = generate(&ws, let_, &GeneratorConfig::default()).unwrap_err();
        assert!(
            matches!(&err, GenError::UnresolvedHole { block, input, .. } if *block == let_ && &**input == "EXP1"),
            "{err:?}"
        );
    }

    #[test]
    fn narrow_widths_break_lines() {
        let mut ws = Workspace::new();
        import(&mut ws, "let value = 1 + 2 + 3 in value").unwrap();
        let config = GeneratorConfig {
            width: 12,
            indent: 2,
        };

        let generated = generate_program(&ws, &config).unwrap();
        assert!(generated.contains('\n'), "{generated}");

        let mut reimported = Workspace::new();
        let tops = import(&mut reimported, &generated).unwrap();
        assert_eq!(tops.len(), 1);
    }

    #[test]
    fn literal_escapes() {
        assert_eq!(string_literal("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(-0.5), "(-0.5)");
        assert_eq!(float_literal(f64::INFINITY), "infinity");
    }
}
