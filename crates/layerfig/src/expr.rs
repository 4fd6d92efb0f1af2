/*
 * expr.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A small, sandboxed expression language.
//!
//! Used by the `pyeval` evaluator to compute values at load time, typically
//! combined with nested placeholders: `${{pyeval.${{var.workers}} * 2}}`.
//!
//! The language has Python-like syntax and semantics for literals and
//! operators, and nothing else: there are no names, no function calls and no
//! attribute access, so an expression can only combine the values written in
//! it.
//!
//! - literals: integers, floats, strings (`'..'` or `".."`), `True`/`False`/`None`
//!   (also `true`/`false`/`null`), lists `[a, b]`, tuples `(a, b)` (which become
//!   sequences) and dicts `{'k': v}` with string keys
//! - arithmetic: `+ - * / // % **` with Python's floor-division and modulo rules
//! - comparisons: `== != < <= > >=`, chainable (`0 < x < 10`)
//! - logic: `and`, `or`, `not`, `a if cond else b`
//!
//! Integers are 64-bit; overflow is an error rather than a promotion. Strings
//! and lists built by `*` are capped at [`MAX_REPEAT_LEN`] bytes or items, and
//! expressions nest at most [`MAX_DEPTH`] levels deep.
//!
//! Inside a placeholder the argument ends at the first `}}`, so nested dicts
//! need a space between their closing braces: `{'a': {'b': 1} }`.

use layerfig_value::{ConfigMap, ConfigValue};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExprError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("Name '{name}' is not defined")]
    UndefinedName { name: String },

    #[error("Type error: {message}")]
    Type { message: String },

    #[error("Division by zero")]
    ZeroDivision,

    #[error("Integer overflow")]
    Overflow,
}

type ExprResult<T> = Result<T, ExprError>;

/// Largest string (in bytes) or list (in items) that repetition may produce.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

/// Deepest nesting of sub-expressions the parser accepts.
pub const MAX_DEPTH: usize = 200;

/// Parse and evaluate `source`.
pub fn evaluate(source: &str) -> ExprResult<ConfigValue> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;

    if let Some(token) = parser.peek() {
        return Err(ExprError::Syntax {
            message: format!("unexpected {}", token.kind.describe()),
            offset: token.offset,
        });
    }

    eval(&expr)
}

// Tokens

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Op(&'static str),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Int(i) => format!("number {}", i),
            TokenKind::Float(f) => format!("number {}", f),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Name(n) => format!("'{}'", n),
            TokenKind::Op(op) => format!("'{}'", op),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

/// Operators, longest first so that `**` wins over `*`.
const OPERATORS: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "(", ")", "[", "]",
    "{", "}", ",", ":",
];

fn tokenize(source: &str) -> ExprResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next_is_digit(&source[offset + 1..])) {
            let (kind, len) = lex_number(&source[offset..], offset)?;
            tokens.push(Token { kind, offset });
            while chars.peek().is_some_and(|&(i, _)| i < offset + len) {
                chars.next();
            }
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let text = lex_string(&mut chars, c, offset)?;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                offset,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut name = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Name(name),
                offset,
            });
            continue;
        }

        let rest = &source[offset..];
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            return Err(ExprError::Syntax {
                message: format!("unexpected character '{}'", c),
                offset,
            });
        };
        for _ in 0..op.len() {
            chars.next();
        }
        tokens.push(Token {
            kind: TokenKind::Op(*op),
            offset,
        });
    }

    Ok(tokens)
}

fn next_is_digit(rest: &str) -> bool {
    rest.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Lex a number at the start of `text`, returning the token and its byte length.
fn lex_number(text: &str, offset: usize) -> ExprResult<(TokenKind, usize)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut is_float = false;

    let digits = |from: usize| {
        let mut i = from;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
        i
    };

    end = digits(end);
    if end < bytes.len() && bytes[end] == b'.' {
        is_float = true;
        end = digits(end + 1);
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            is_float = true;
            end = digits(exp);
        }
    }

    let literal: String = text[..end].chars().filter(|c| *c != '_').collect();
    let invalid = || ExprError::Syntax {
        message: format!("invalid number literal '{}'", &text[..end]),
        offset,
    };

    let kind = if is_float {
        TokenKind::Float(literal.parse().map_err(|_| invalid())?)
    } else {
        match literal.parse::<i64>() {
            Ok(i) => TokenKind::Int(i),
            Err(_) if literal.bytes().all(|b| b.is_ascii_digit()) && !literal.is_empty() => {
                return Err(ExprError::Overflow);
            }
            Err(_) => return Err(invalid()),
        }
    };

    Ok((kind, end))
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    offset: usize,
) -> ExprResult<String> {
    let mut text = String::new();

    while let Some((_, c)) = chars.next() {
        match c {
            c if c == quote => return Ok(text),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, '0')) => text.push('\0'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, '\'')) => text.push('\''),
                Some((_, '"')) => text.push('"'),
                // unknown escapes are kept verbatim
                Some((_, other)) => {
                    text.push('\\');
                    text.push(other);
                }
                None => break,
            },
            c => text.push(c),
        }
    }

    Err(ExprError::Syntax {
        message: "unterminated string literal".to_string(),
        offset,
    })
}

// Syntax tree

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(ConfigValue),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Neg(Box<Expr>),
    Pos(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Depth of the tree under construction.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.offset + 1)
    }

    /// Go one level deeper, failing past [`MAX_DEPTH`].
    fn enter(&mut self) -> ExprResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::Syntax {
                message: format!("expression nested more than {} levels deep", MAX_DEPTH),
                offset: self.peek().map_or(self.end_offset(), |t| t.offset),
            });
        }
        Ok(())
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Op(o), .. }) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Name(n), .. }) if n == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> ExprResult<()> {
        if self.eat_op(op) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(token) => ExprError::Syntax {
                message: format!("expected '{}', found {}", op, token.kind.describe()),
                offset: token.offset,
            },
            None => ExprError::Syntax {
                message: format!("expected '{}', found end of input", op),
                offset: self.end_offset(),
            },
        })
    }

    fn expression(&mut self) -> ExprResult<Expr> {
        self.enter()?;
        let expr = self.conditional()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn conditional(&mut self) -> ExprResult<Expr> {
        let value = self.or_expr()?;

        if self.eat_keyword("if") {
            let condition = self.or_expr()?;
            if !self.eat_keyword("else") {
                return Err(ExprError::Syntax {
                    message: "expected 'else' in conditional expression".to_string(),
                    offset: self.peek().map_or(self.end_offset(), |t| t.offset),
                });
            }
            let otherwise = self.expression()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(value),
                otherwise: Box::new(otherwise),
            });
        }

        Ok(value)
    }

    // Each operator in a left-associative chain nests the tree one level.

    fn or_expr(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            self.enter()?;
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn and_expr(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.not_expr()?;
        while self.eat_keyword("and") {
            self.enter()?;
            let right = self.not_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn not_expr(&mut self) -> ExprResult<Expr> {
        if self.eat_keyword("not") {
            self.enter()?;
            let inner = self.not_expr()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ExprResult<Expr> {
        let first = self.sum()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op("==")) => CompareOp::Eq,
                Some(TokenKind::Op("!=")) => CompareOp::Ne,
                Some(TokenKind::Op("<")) => CompareOp::Lt,
                Some(TokenKind::Op("<=")) => CompareOp::Le,
                Some(TokenKind::Op(">")) => CompareOp::Gt,
                Some(TokenKind::Op(">=")) => CompareOp::Ge,
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.sum()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn sum(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.term()?;
        loop {
            let op = if self.eat_op("+") {
                BinaryOp::Add
            } else if self.eat_op("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            self.enter()?;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn term(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.factor()?;
        loop {
            let op = if self.eat_op("*") {
                BinaryOp::Mul
            } else if self.eat_op("//") {
                BinaryOp::FloorDiv
            } else if self.eat_op("/") {
                BinaryOp::Div
            } else if self.eat_op("%") {
                BinaryOp::Mod
            } else {
                break;
            };
            self.enter()?;
            let right = self.factor()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn factor(&mut self) -> ExprResult<Expr> {
        let wrap: fn(Box<Expr>) -> Expr = if self.eat_op("-") {
            Expr::Neg
        } else if self.eat_op("+") {
            Expr::Pos
        } else {
            return self.power();
        };

        self.enter()?;
        let inner = self.factor()?;
        self.depth -= 1;
        Ok(wrap(Box::new(inner)))
    }

    fn power(&mut self) -> ExprResult<Expr> {
        let base = self.atom()?;
        if self.eat_op("**") {
            // right-associative, and binds tighter than a unary minus on its left
            self.enter()?;
            let exponent = self.factor()?;
            self.depth -= 1;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    /// Comma-separated expressions up to `close`, allowing a trailing comma.
    fn items(&mut self, close: &str) -> ExprResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat_op(close) {
            items.push(self.expression()?);
            if !self.eat_op(",") {
                self.expect_op(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn atom(&mut self) -> ExprResult<Expr> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(ExprError::Syntax {
                message: "unexpected end of input".to_string(),
                offset: self.end_offset(),
            });
        };
        self.pos += 1;

        match token.kind {
            TokenKind::Int(i) => Ok(Expr::Literal(ConfigValue::Integer(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(ConfigValue::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(ConfigValue::String(s))),
            TokenKind::Name(name) => match name.as_str() {
                "True" | "true" => Ok(Expr::Literal(ConfigValue::Bool(true))),
                "False" | "false" => Ok(Expr::Literal(ConfigValue::Bool(false))),
                "None" | "null" => Ok(Expr::Literal(ConfigValue::Null)),
                _ => Err(ExprError::UndefinedName { name }),
            },
            TokenKind::Op("(") => {
                if self.eat_op(")") {
                    return Ok(Expr::List(Vec::new()));
                }
                let first = self.expression()?;
                if !self.eat_op(",") {
                    self.expect_op(")")?;
                    return Ok(first);
                }
                // a tuple
                let mut items = vec![first];
                items.extend(self.items(")")?);
                Ok(Expr::List(items))
            }
            TokenKind::Op("[") => Ok(Expr::List(self.items("]")?)),
            TokenKind::Op("{") => {
                let mut entries = Vec::new();
                while !self.eat_op("}") {
                    let key = self.expression()?;
                    self.expect_op(":")?;
                    let value = self.expression()?;
                    entries.push((key, value));
                    if !self.eat_op(",") {
                        self.expect_op("}")?;
                        break;
                    }
                }
                Ok(Expr::Dict(entries))
            }
            other => Err(ExprError::Syntax {
                message: format!("unexpected {}", other.describe()),
                offset: token.offset,
            }),
        }
    }
}

// Evaluation

fn eval(expr: &Expr) -> ExprResult<ConfigValue> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::List(items) => Ok(ConfigValue::Sequence(
            items.iter().map(eval).collect::<ExprResult<_>>()?,
        )),
        Expr::Dict(entries) => {
            let mut map = ConfigMap::new();
            for (key, value) in entries {
                let key = match eval(key)? {
                    ConfigValue::String(key) => key,
                    other => {
                        return Err(type_error(format!(
                            "dict keys must be strings, not {}",
                            other.type_name()
                        )));
                    }
                };
                // a repeated key keeps its first position and takes the last value
                map.insert(key, eval(value)?);
            }
            Ok(ConfigValue::Mapping(map))
        }
        Expr::Neg(inner) => match eval(inner)? {
            ConfigValue::Integer(i) => i
                .checked_neg()
                .map(ConfigValue::Integer)
                .ok_or(ExprError::Overflow),
            ConfigValue::Bool(b) => Ok(ConfigValue::Integer(-i64::from(b))),
            ConfigValue::Float(f) => Ok(ConfigValue::Float(-f)),
            other => Err(type_error(format!(
                "bad operand type for unary -: {}",
                other.type_name()
            ))),
        },
        Expr::Pos(inner) => match eval(inner)? {
            ConfigValue::Bool(b) => Ok(ConfigValue::Integer(i64::from(b))),
            value @ (ConfigValue::Integer(_) | ConfigValue::Float(_)) => Ok(value),
            other => Err(type_error(format!(
                "bad operand type for unary +: {}",
                other.type_name()
            ))),
        },
        Expr::Not(inner) => Ok(ConfigValue::Bool(!truthy(&eval(inner)?))),
        Expr::And(left, right) => {
            let left = eval(left)?;
            if truthy(&left) { eval(right) } else { Ok(left) }
        }
        Expr::Or(left, right) => {
            let left = eval(left)?;
            if truthy(&left) { Ok(left) } else { eval(right) }
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(&eval(condition)?) {
                eval(then)
            } else {
                eval(otherwise)
            }
        }
        Expr::Binary(op, left, right) => binary(*op, eval(left)?, eval(right)?),
        Expr::Compare(first, rest) => {
            let mut left = eval(first)?;
            for (op, right) in rest {
                let right = eval(right)?;
                if !compare(*op, &left, &right)? {
                    return Ok(ConfigValue::Bool(false));
                }
                left = right;
            }
            Ok(ConfigValue::Bool(true))
        }
    }
}

fn type_error(message: String) -> ExprError {
    ExprError::Type { message }
}

fn truthy(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Null => false,
        ConfigValue::Bool(b) => *b,
        ConfigValue::Integer(i) => *i != 0,
        ConfigValue::Float(f) => *f != 0.0,
        ConfigValue::String(s) => !s.is_empty(),
        ConfigValue::Sequence(items) => !items.is_empty(),
        ConfigValue::Mapping(entries) => !entries.is_empty(),
    }
}

/// Numeric view of a value; booleans count as integers.
enum Number {
    Int(i64),
    Float(f64),
}

fn number(value: &ConfigValue) -> Option<Number> {
    match value {
        ConfigValue::Bool(b) => Some(Number::Int(i64::from(*b))),
        ConfigValue::Integer(i) => Some(Number::Int(*i)),
        ConfigValue::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
    }
}

fn binary(op: BinaryOp, left: ConfigValue, right: ConfigValue) -> ExprResult<ConfigValue> {
    if let (Some(a), Some(b)) = (number(&left), number(&right)) {
        return match (a, b) {
            (Number::Int(a), Number::Int(b)) => int_binary(op, a, b),
            (a, b) => float_binary(op, as_float(a), as_float(b)),
        };
    }

    match (op, left, right) {
        (BinaryOp::Add, ConfigValue::String(a), ConfigValue::String(b)) => {
            Ok(ConfigValue::String(a + &b))
        }
        (BinaryOp::Add, ConfigValue::Sequence(mut a), ConfigValue::Sequence(b)) => {
            a.extend(b);
            Ok(ConfigValue::Sequence(a))
        }
        (BinaryOp::Mul, ConfigValue::String(s), count) | (BinaryOp::Mul, count, ConfigValue::String(s))
            if number(&count).is_some_and(|n| matches!(n, Number::Int(_))) =>
        {
            let times = repeat_count(s.len(), &count)?;
            Ok(ConfigValue::String(s.repeat(times)))
        }
        (BinaryOp::Mul, ConfigValue::Sequence(items), count)
        | (BinaryOp::Mul, count, ConfigValue::Sequence(items))
            if number(&count).is_some_and(|n| matches!(n, Number::Int(_))) =>
        {
            let times = repeat_count(items.len(), &count)?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(ConfigValue::Sequence(repeated))
        }
        (op, left, right) => Err(type_error(format!(
            "unsupported operand types for {}: {} and {}",
            symbol(op),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// How many times to repeat something of length `len`. Negative counts give
/// zero; results longer than [`MAX_REPEAT_LEN`] are an overflow.
fn repeat_count(len: usize, count: &ConfigValue) -> ExprResult<usize> {
    let times = match number(count) {
        Some(Number::Int(n)) => usize::try_from(n).unwrap_or(0),
        _ => 0,
    };
    if len == 0 {
        return Ok(0);
    }

    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(ExprError::Overflow),
    }
}

fn as_float(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> ExprResult<ConfigValue> {
    let int = |v: Option<i64>| v.map(ConfigValue::Integer).ok_or(ExprError::Overflow);

    match op {
        BinaryOp::Add => int(a.checked_add(b)),
        BinaryOp::Sub => int(a.checked_sub(b)),
        BinaryOp::Mul => int(a.checked_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(ExprError::ZeroDivision);
            }
            Ok(ConfigValue::Float(a as f64 / b as f64))
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(ExprError::ZeroDivision);
            }
            let q = a.checked_div(b).ok_or(ExprError::Overflow)?;
            // round toward negative infinity
            if a % b != 0 && ((a < 0) != (b < 0)) {
                int(q.checked_sub(1))
            } else {
                Ok(ConfigValue::Integer(q))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(ExprError::ZeroDivision);
            }
            let r = a.checked_rem(b).ok_or(ExprError::Overflow)?;
            // result takes the sign of the divisor
            if r != 0 && ((r < 0) != (b < 0)) {
                int(r.checked_add(b))
            } else {
                Ok(ConfigValue::Integer(r))
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(ExprError::ZeroDivision);
                }
                return Ok(ConfigValue::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| ExprError::Overflow)?;
            int(a.checked_pow(exp))
        }
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> ExprResult<ConfigValue> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::ZeroDivision);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExprError::ZeroDivision);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::ZeroDivision);
            }
            a - b * (a / b).floor()
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ExprError::ZeroDivision);
            }
            a.powf(b)
        }
    };
    Ok(ConfigValue::Float(value))
}

fn compare(op: CompareOp, left: &ConfigValue, right: &ConfigValue) -> ExprResult<bool> {
    match op {
        CompareOp::Eq => Ok(equals(left, right)),
        CompareOp::Ne => Ok(!equals(left, right)),
        _ => {
            let ordering = order(left, right).ok_or_else(|| {
                type_error(format!(
                    "'{}' not supported between {} and {}",
                    match op {
                        CompareOp::Lt => "<",
                        CompareOp::Le => "<=",
                        CompareOp::Gt => ">",
                        _ => ">=",
                    },
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn equals(left: &ConfigValue, right: &ConfigValue) -> bool {
    match (number(left), number(right)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
        (Some(a), Some(b)) => as_float(a) == as_float(b),
        _ => match (left, right) {
            (ConfigValue::Sequence(a), ConfigValue::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
            }
            (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| equals(x, y)))
            }
            _ => left == right,
        },
    }
}

fn order(left: &ConfigValue, right: &ConfigValue) -> Option<Ordering> {
    match (number(left), number(right)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => Some(a.cmp(&b)),
        (Some(a), Some(b)) => as_float(a).partial_cmp(&as_float(b)),
        _ => match (left, right) {
            (ConfigValue::String(a), ConfigValue::String(b)) => Some(a.cmp(b)),
            (ConfigValue::Sequence(a), ConfigValue::Sequence(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !equals(x, y) {
                        return order(x, y);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        },
    }
}
