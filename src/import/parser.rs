//! A hand-written [`winnow`] parser for the TypedLang subset.
//!
//! Every token parser consumes the whitespace and comments that follow it, so
//! only the very start of a program has to skip leading trivia. Binary
//! operators follow OCaml's precedence and associativity; the forms that
//! extend as far to the right as possible (`let`, `fun`, `if`, `match`) are
//! only accepted where a full expression is expected.
//!
//! A program item is an expression, a `type` declaration, or a `let` whose
//! `in` is left out.

use thiserror::Error;
use winnow::{
    ascii::{digit1, escaped_transform, multispace1},
    combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode, StrContext, StrContextValue},
    token::{one_of, take_till, take_until, take_while},
    PResult, Parser,
};

use crate::{
    block::{CompareOp, ConstructorSpec, FloatOp, IntOp, LogicOp, PatternSpec, TypeSpec},
    syntax::{BinOp, Expr, Item},
};

const BACKSLASH: char = '\\';
const DOUBLE_QUOTE: char = '"';

const KEYWORDS: &[&str] = &[
    "let", "rec", "in", "fun", "if", "then", "else", "match", "with", "true",
    "false", "max_int", "infinity", "type", "of",
];

/// A program that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct SyntaxError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parses a sequence of `;;`-separated items.
pub fn parse_program(source: &str) -> Result<Vec<Item>, SyntaxError> {
    let mut parser = preceded(
        ws,
        terminated(separated(1.., item, sym(";;")), opt(sym(";;"))),
    );

    parser.parse(source).map_err(|error| {
        let offset = error.offset();
        let (line, column) = line_and_column(source, offset);

        // keep only the first line of the rendered context
        let raw_message = error.inner().to_string();
        let message = match raw_message.split_once('\n') {
            Some((first, _)) => String::from(first),
            None if raw_message.is_empty() => String::from("unexpected input"),
            None => raw_message,
        };

        SyntaxError {
            offset,
            line,
            column,
            message,
        }
    })
}

fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |i| before.len() - i - 1) + 1;
    (line, column)
}

// TRIVIA & TOKENS

fn ws(input: &mut &str) -> PResult<()> {
    repeat(0.., alt((multispace1.void(), comment))).parse_next(input)
}

fn comment(input: &mut &str) -> PResult<()> {
    ("(*", take_until(0.., "*)"), "*)").void().parse_next(input)
}

fn lexeme<'s, O>(
    parser: impl Parser<&'s str, O, ContextError>,
) -> impl Parser<&'s str, O, ContextError> {
    terminated(parser, ws)
}

fn sym<'s>(symbol: &'static str) -> impl Parser<&'s str, &'s str, ContextError> {
    lexeme(symbol)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

fn keyword<'s>(kw: &'static str) -> impl Parser<&'s str, (), ContextError> {
    lexeme((kw, not(one_of(is_ident_char)))).void()
}

fn ident(input: &mut &str) -> PResult<String> {
    lexeme(take_while(1.., is_ident_char).verify(|name: &str| {
        let starts_lower = name.starts_with(|c: char| c.is_ascii_lowercase() || c == '_');
        starts_lower && name != "_" && !KEYWORDS.iter().any(|kw| *kw == name)
    }))
    .map(String::from)
    .context(StrContext::Label("identifier"))
    .parse_next(input)
}

fn ctor_ident(input: &mut &str) -> PResult<String> {
    lexeme(take_while(1.., is_ident_char).verify(|name: &str| {
        name.starts_with(|c: char| c.is_ascii_uppercase())
    }))
    .map(String::from)
    .context(StrContext::Label("constructor"))
    .parse_next(input)
}

// LITERALS

/// Recognizes an unsigned numeral and returns `true` if it is a float.
fn numeral(input: &mut &str) -> PResult<bool> {
    digit1.parse_next(input)?;
    let fraction = opt(preceded('.', take_while(0.., |c: char| c.is_ascii_digit())))
        .parse_next(input)?;
    let exponent = opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1))
        .parse_next(input)?;
    Ok(fraction.is_some() || exponent.is_some())
}

/// Parses a numeral, with a leading minus if `negative`. The sign is part of
/// the parsed text, so `-9223372036854775808` is in range.
fn number_literal(input: &mut &str, negative: bool) -> PResult<Expr> {
    let start = *input;
    if negative {
        '-'.parse_next(input)?;
    }
    let is_float = numeral.parse_next(input)?;

    let text = &start[..start.len() - input.len()];
    if is_float {
        text.parse::<f64>()
            .map(Expr::Float)
            .map_err(|_| ErrMode::Backtrack(ContextError::new()))
    } else {
        text.parse::<i64>()
            .map(Expr::Int)
            .map_err(|_| ErrMode::Cut(ContextError::new()))
    }
}

fn number(input: &mut &str) -> PResult<Expr> {
    number_literal(input, false)
}

fn signed_number(input: &mut &str) -> PResult<Expr> {
    number_literal(input, true)
}

fn string_contents(input: &mut &str) -> PResult<String> {
    escaped_transform(
        take_till(1.., |c| c == BACKSLASH || c == DOUBLE_QUOTE),
        BACKSLASH,
        alt((
            "\\".value("\\"), // BACKSLASH
            "\"".value("\""), // DOUBLE QUOTE
            "n".value("\n"),  // NEWLINE (LINE FEED)
            "r".value("\r"),  // CARRIAGE RETURN
            "t".value("\t"),  // HORIZONTAL TAB
        )),
    )
    .parse_next(input)
}

fn string_literal(input: &mut &str) -> PResult<String> {
    delimited(DOUBLE_QUOTE, string_contents, cut_err(DOUBLE_QUOTE))
        .context(StrContext::Expected(StrContextValue::CharLiteral('"')))
        .parse_next(input)
}

/// `(-5)` and `(-2.5)`: the only places a leading minus is accepted.
fn negative_number(input: &mut &str) -> PResult<Expr> {
    delimited(sym("("), lexeme(signed_number), sym(")")).parse_next(input)
}

// ITEMS

fn item(input: &mut &str) -> PResult<Item> {
    alt((type_item, let_item, expr.map(Item::Expr))).parse_next(input)
}

fn type_item(input: &mut &str) -> PResult<Item> {
    keyword("type").parse_next(input)?;
    let name = cut_err(ident).parse_next(input)?;
    cut_err(sym("=")).parse_next(input)?;
    opt(sym("|")).parse_next(input)?;
    let constructors = cut_err(separated(1.., constructor_decl, sym("|"))).parse_next(input)?;

    Ok(Item::Type { name, constructors })
}

fn constructor_decl(input: &mut &str) -> PResult<ConstructorSpec> {
    let name = ctor_ident.parse_next(input)?;
    let arg = opt(preceded(keyword("of"), cut_err(type_expr))).parse_next(input)?;
    Ok(ConstructorSpec { name, arg })
}

/// A `let` item, which is a plain `let` expression if it has an `in`.
fn let_item(input: &mut &str) -> PResult<Item> {
    let (name, args, recursive, value) = let_binding.parse_next(input)?;

    Ok(match opt(preceded(keyword("in"), cut_err(expr))).parse_next(input)? {
        Some(body) => Item::Expr(Expr::Let {
            name,
            args,
            recursive,
            value: Box::new(value),
            body: Box::new(body),
        }),
        None => Item::Let {
            name,
            args,
            recursive,
            value,
        },
    })
}

// TYPES

fn type_expr(input: &mut &str) -> PResult<TypeSpec> {
    let first = type_app.parse_next(input)?;
    match opt(preceded(sym("*"), cut_err(type_expr))).parse_next(input)? {
        Some(second) => Ok(TypeSpec::Pair(Box::new(first), Box::new(second))),
        None => Ok(first),
    }
}

fn type_app(input: &mut &str) -> PResult<TypeSpec> {
    let mut ty = type_atom.parse_next(input)?;
    while opt(keyword("list")).parse_next(input)?.is_some() {
        ty = TypeSpec::List(Box::new(ty));
    }
    Ok(ty)
}

fn type_atom(input: &mut &str) -> PResult<TypeSpec> {
    alt((
        keyword("int").value(TypeSpec::Int),
        keyword("float").value(TypeSpec::Float),
        keyword("bool").value(TypeSpec::Bool),
        keyword("string").value(TypeSpec::String),
        delimited(sym("("), type_expr, cut_err(sym(")"))),
        ident.map(TypeSpec::Named),
    ))
    .context(StrContext::Label("type"))
    .parse_next(input)
}

// EXPRESSIONS

fn expr(input: &mut &str) -> PResult<Expr> {
    alt((let_expr, fun_expr, if_expr, match_expr, or_expr))
        .context(StrContext::Label("expression"))
        .parse_next(input)
}

/// `let [rec] name args = value`, up to but excluding `in`.
fn let_binding(input: &mut &str) -> PResult<(String, Vec<String>, bool, Expr)> {
    keyword("let").parse_next(input)?;
    let recursive = opt(keyword("rec")).parse_next(input)?.is_some();
    let name = cut_err(ident).parse_next(input)?;
    let args: Vec<String> = repeat(0.., ident).parse_next(input)?;
    cut_err(sym("=")).parse_next(input)?;
    let value = cut_err(expr).parse_next(input)?;
    Ok((name, args, recursive, value))
}

fn let_expr(input: &mut &str) -> PResult<Expr> {
    let (name, args, recursive, value) = let_binding.parse_next(input)?;
    cut_err(keyword("in")).parse_next(input)?;
    let body = cut_err(expr).parse_next(input)?;

    Ok(Expr::Let {
        name,
        args,
        recursive,
        value: Box::new(value),
        body: Box::new(body),
    })
}

fn fun_expr(input: &mut &str) -> PResult<Expr> {
    keyword("fun").parse_next(input)?;
    let params: Vec<String> = cut_err(repeat(1.., ident)).parse_next(input)?;
    cut_err(sym("->")).parse_next(input)?;
    let body = cut_err(expr).parse_next(input)?;

    Ok(params
        .into_iter()
        .rev()
        .fold(body, |body, param| Expr::Fun(param, Box::new(body))))
}

fn if_expr(input: &mut &str) -> PResult<Expr> {
    keyword("if").parse_next(input)?;
    let cond = cut_err(expr).parse_next(input)?;
    cut_err(keyword("then")).parse_next(input)?;
    let then = cut_err(expr).parse_next(input)?;
    cut_err(keyword("else")).parse_next(input)?;
    let otherwise = cut_err(expr).parse_next(input)?;

    Ok(Expr::If {
        cond: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

fn match_expr(input: &mut &str) -> PResult<Expr> {
    keyword("match").parse_next(input)?;
    let scrutinee = cut_err(expr).parse_next(input)?;
    cut_err(keyword("with")).parse_next(input)?;
    opt(sym("|")).parse_next(input)?;
    let arms: Vec<(PatternSpec, Expr)> =
        cut_err(separated(1.., match_arm, sym("|"))).parse_next(input)?;

    Ok(Expr::Match {
        scrutinee: Box::new(scrutinee),
        arms,
    })
}

fn match_arm(input: &mut &str) -> PResult<(PatternSpec, Expr)> {
    let pattern = pattern.parse_next(input)?;
    cut_err(sym("->")).parse_next(input)?;
    let body = cut_err(expr).parse_next(input)?;
    Ok((pattern, body))
}

fn or_expr(input: &mut &str) -> PResult<Expr> {
    right_assoc(input, and_expr, sym("||").value(BinOp::Logic(LogicOp::Or)))
}

fn and_expr(input: &mut &str) -> PResult<Expr> {
    right_assoc(input, compare_expr, sym("&&").value(BinOp::Logic(LogicOp::And)))
}

fn compare_expr(input: &mut &str) -> PResult<Expr> {
    let op = lexeme(alt((
        "<>".value(CompareOp::Ne),
        "<=".value(CompareOp::Le),
        ">=".value(CompareOp::Ge),
        "=".value(CompareOp::Eq),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
    )))
    .map(BinOp::Compare);

    left_assoc(input, concat_expr, op)
}

fn concat_expr(input: &mut &str) -> PResult<Expr> {
    right_assoc(input, cons_expr, sym("^").value(BinOp::Concat))
}

fn cons_expr(input: &mut &str) -> PResult<Expr> {
    right_assoc(input, additive_expr, sym("::").value(BinOp::Cons))
}

fn additive_expr(input: &mut &str) -> PResult<Expr> {
    let op = lexeme(alt((
        "+.".value(BinOp::Float(FloatOp::Add)),
        "-.".value(BinOp::Float(FloatOp::Sub)),
        "+".value(BinOp::Int(IntOp::Add)),
        terminated("-", not('>')).value(BinOp::Int(IntOp::Sub)),
    )));

    left_assoc(input, multiplicative_expr, op)
}

fn multiplicative_expr(input: &mut &str) -> PResult<Expr> {
    let op = lexeme(alt((
        "*.".value(BinOp::Float(FloatOp::Mul)),
        "/.".value(BinOp::Float(FloatOp::Div)),
        "*".value(BinOp::Int(IntOp::Mul)),
        "/".value(BinOp::Int(IntOp::Div)),
    )));

    left_assoc(input, application, op)
}

fn left_assoc<'s>(
    input: &mut &'s str,
    mut operand: impl Parser<&'s str, Expr, ContextError>,
    mut op: impl Parser<&'s str, BinOp, ContextError>,
) -> PResult<Expr> {
    let mut lhs = operand.parse_next(input)?;
    while let Some(op) = opt(op.by_ref()).parse_next(input)? {
        let rhs = cut_err(operand.by_ref()).parse_next(input)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn right_assoc<'s>(
    input: &mut &'s str,
    mut operand: impl Parser<&'s str, Expr, ContextError>,
    mut op: impl Parser<&'s str, BinOp, ContextError>,
) -> PResult<Expr> {
    let first = operand.parse_next(input)?;
    let mut rest = Vec::new();
    while let Some(op) = opt(op.by_ref()).parse_next(input)? {
        rest.push((op, cut_err(operand.by_ref()).parse_next(input)?));
    }

    let Some((mut op, mut rhs)) = rest.pop() else {
        return Ok(first);
    };
    while let Some((prev_op, lhs)) = rest.pop() {
        rhs = Expr::binary(op, lhs, rhs);
        op = prev_op;
    }
    Ok(Expr::binary(op, first, rhs))
}

fn application(input: &mut &str) -> PResult<Expr> {
    let head = atom.parse_next(input)?;
    let mut args: Vec<Expr> = repeat(0.., atom).parse_next(input)?;

    // a constructor takes the first argument as its payload
    let head = match head {
        Expr::Construct(name, None) if !args.is_empty() => {
            Expr::Construct(name, Some(Box::new(args.remove(0))))
        }
        head => head,
    };

    Ok(args
        .into_iter()
        .fold(head, |f, arg| Expr::App(Box::new(f), Box::new(arg))))
}

fn atom(input: &mut &str) -> PResult<Expr> {
    alt((
        lexeme(number),
        lexeme(string_literal).map(Expr::Str),
        keyword("true").value(Expr::Bool(true)),
        keyword("false").value(Expr::Bool(false)),
        keyword("max_int").value(Expr::MaxInt),
        keyword("infinity").value(Expr::Infinity),
        list,
        negative_number,
        parenthesized,
        ident.map(Expr::Var),
        ctor_ident.map(|name| Expr::Construct(name, None)),
    ))
    .parse_next(input)
}

fn list(input: &mut &str) -> PResult<Expr> {
    delimited(
        sym("["),
        separated(0.., expr, sym(";")),
        (opt(sym(";")), cut_err(sym("]"))),
    )
    .map(Expr::List)
    .parse_next(input)
}

fn parenthesized(input: &mut &str) -> PResult<Expr> {
    sym("(").parse_next(input)?;
    let first = cut_err(expr).parse_next(input)?;
    let second = opt(preceded(sym(","), cut_err(expr))).parse_next(input)?;
    cut_err(sym(")")).parse_next(input)?;

    Ok(match second {
        Some(second) => Expr::Pair(Box::new(first), Box::new(second)),
        None => first,
    })
}

// PATTERNS

fn pattern(input: &mut &str) -> PResult<PatternSpec> {
    let first = cons_pattern.parse_next(input)?;
    match opt(preceded(sym(","), cut_err(cons_pattern))).parse_next(input)? {
        Some(second) => Ok(PatternSpec::Pair(Box::new(first), Box::new(second))),
        None => Ok(first),
    }
}

fn cons_pattern(input: &mut &str) -> PResult<PatternSpec> {
    let head = simple_pattern.parse_next(input)?;
    match opt(preceded(sym("::"), cut_err(cons_pattern))).parse_next(input)? {
        Some(tail) => Ok(PatternSpec::Cons(Box::new(head), Box::new(tail))),
        None => Ok(head),
    }
}

fn simple_pattern(input: &mut &str) -> PResult<PatternSpec> {
    alt((
        keyword("_").value(PatternSpec::Wildcard),
        lexeme(int_literal).map(PatternSpec::Int),
        delimited(sym("("), lexeme(negative_int_literal), sym(")")).map(PatternSpec::Int),
        keyword("true").value(PatternSpec::Bool(true)),
        keyword("false").value(PatternSpec::Bool(false)),
        (sym("["), sym("]")).value(PatternSpec::Nil),
        delimited(sym("("), pattern, cut_err(sym(")"))),
        ident.map(PatternSpec::Var),
    ))
    .context(StrContext::Label("pattern"))
    .parse_next(input)
}

fn int_literal(input: &mut &str) -> PResult<i64> {
    digit1.try_map(str::parse::<i64>).parse_next(input)
}

fn negative_int_literal(input: &mut &str) -> PResult<i64> {
    let start = *input;
    ('-', digit1).void().parse_next(input)?;
    let text = &start[..start.len() - input.len()];
    text.parse::<i64>()
        .map_err(|_| ErrMode::Cut(ContextError::new()))
}
