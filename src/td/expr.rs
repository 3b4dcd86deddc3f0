// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Coefficient expressions.
//!
//! A small arithmetic language over `f64`, used for textual time-dependent
//! coefficients such as `"A * sin(w * t + phi)"`.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/" | "%") unary)*
//! unary   := ("-" | "+") unary | power
//! power   := primary (("**" | "^") unary)?
//! primary := number | name | name "(" args ")" | "(" sum ")"
//! ```
//!
//! Names resolve to `t`, then to the caller's arguments, then to the
//! constants `pi` and `e`. `%` is the floored modulo.

use logos::Logos;
use std::f64::consts;

use super::TdArgs;
use crate::error::{Error, Result};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("^")]
    Caret,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Built-in math function.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    apply: fn(&[f64]) -> f64,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl Builtin {
    fn lookup(name: &str) -> Option<Builtin> {
        type F = fn(&[f64]) -> f64;
        let (name, min_args, max_args, apply): (&'static str, usize, usize, F) = match name {
            "sin" => ("sin", 1, 1, |a| a[0].sin()),
            "cos" => ("cos", 1, 1, |a| a[0].cos()),
            "tan" => ("tan", 1, 1, |a| a[0].tan()),
            "arcsin" => ("arcsin", 1, 1, |a| a[0].asin()),
            "arccos" => ("arccos", 1, 1, |a| a[0].acos()),
            "arctan" => ("arctan", 1, 1, |a| a[0].atan()),
            "arctan2" => ("arctan2", 2, 2, |a| a[0].atan2(a[1])),
            "sinh" => ("sinh", 1, 1, |a| a[0].sinh()),
            "cosh" => ("cosh", 1, 1, |a| a[0].cosh()),
            "tanh" => ("tanh", 1, 1, |a| a[0].tanh()),
            "arcsinh" => ("arcsinh", 1, 1, |a| a[0].asinh()),
            "arccosh" => ("arccosh", 1, 1, |a| a[0].acosh()),
            "arctanh" => ("arctanh", 1, 1, |a| a[0].atanh()),
            "exp" => ("exp", 1, 1, |a| a[0].exp()),
            "expm1" => ("expm1", 1, 1, |a| a[0].exp_m1()),
            "log" => ("log", 1, 2, |a| match a {
                [x, base] => x.ln() / base.ln(),
                _ => a[0].ln(),
            }),
            "log10" => ("log10", 1, 1, |a| a[0].log10()),
            "log1p" => ("log1p", 1, 1, |a| a[0].ln_1p()),
            "sqrt" => ("sqrt", 1, 1, |a| a[0].sqrt()),
            "abs" => ("abs", 1, 1, |a| a[0].abs()),
            "fabs" => ("fabs", 1, 1, |a| a[0].abs()),
            "floor" => ("floor", 1, 1, |a| a[0].floor()),
            "ceil" => ("ceil", 1, 1, |a| a[0].ceil()),
            "trunc" => ("trunc", 1, 1, |a| a[0].trunc()),
            "hypot" => ("hypot", 2, 2, |a| a[0].hypot(a[1])),
            "copysign" => ("copysign", 2, 2, |a| a[0].copysign(a[1])),
            "fmod" => ("fmod", 2, 2, |a| a[0] % a[1]),
            "degrees" => ("degrees", 1, 1, |a| a[0].to_degrees()),
            "radians" => ("radians", 1, 1, |a| a[0].to_radians()),
            "ldexp" => ("ldexp", 2, 2, |a| a[0] * a[1].exp2()),
            "pow" => ("pow", 2, 2, |a| a[0].powf(a[1])),
            "min" => ("min", 1, usize::MAX, |a| a.iter().copied().fold(f64::INFINITY, f64::min)),
            "max" => ("max", 1, usize::MAX, |a| {
                a.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }),
            _ => return None,
        };
        Some(Builtin {
            name,
            min_args,
            max_args,
            apply,
        })
    }
}

/// Parsed expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Evaluate at time `t` with named arguments.
    pub fn eval(&self, t: f64, args: &TdArgs) -> Result<f64> {
        match self {
            Expr::Number(x) => Ok(*x),
            Expr::Var(name) => lookup_var(name, t, args),
            Expr::Neg(inner) => Ok(-inner.eval(t, args)?),
            Expr::Binary { op, left, right } => {
                let a = left.eval(t, args)?;
                let b = right.eval(t, args)?;
                binary(*op, a, b)
            }
            Expr::Call { func, args: params } => {
                let values = params
                    .iter()
                    .map(|p| p.eval(t, args))
                    .collect::<Result<Vec<_>>>()?;
                Ok((func.apply)(&values))
            }
        }
    }
}

fn lookup_var(name: &str, t: f64, args: &TdArgs) -> Result<f64> {
    if name == "t" {
        return Ok(t);
    }
    if let Some(&v) = args.get(name) {
        return Ok(v);
    }
    match name {
        "pi" => Ok(consts::PI),
        "e" => Ok(consts::E),
        _ => Err(Error::Expression(format!("unknown variable '{}'", name))),
    }
}

fn binary(op: BinOp, a: f64, b: f64) -> Result<f64> {
    match op {
        BinOp::Add => Ok(a + b),
        BinOp::Sub => Ok(a - b),
        BinOp::Mul => Ok(a * b),
        BinOp::Div if b == 0.0 => Err(Error::Expression("division by zero".into())),
        BinOp::Div => Ok(a / b),
        BinOp::Mod if b == 0.0 => Err(Error::Expression("modulo by zero".into())),
        BinOp::Mod => Ok(a - b * (a / b).floor()),
        BinOp::Pow => Ok(a.powf(b)),
    }
}

/// Parse an expression.
pub fn parse(src: &str) -> Result<Expr> {
    let tokens = Token::lexer(src)
        .spanned()
        .map(|(tok, span)| {
            tok.map(|t| (t, span.start)).map_err(|_| {
                Error::Expression(format!(
                    "unexpected '{}' at offset {} in '{}'",
                    &src[span.clone()],
                    span.start,
                    src
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_sum()?;
    if let Some((tok, at)) = parser.tokens.get(parser.pos) {
        return Err(parser.error(&format!("unexpected {:?} at offset {}", tok, at)));
    }
    Ok(expr)
}

/// Parse and evaluate in one step.
pub fn evaluate(src: &str, t: f64, args: &TdArgs) -> Result<f64> {
    parse(src)?.eval(t, args)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_sum(&mut self) -> Result<Expr> {
        let mut left = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_product()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_product(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::StarStar | Token::Caret)) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some((tok, _)) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error("unexpected end of expression"));
        };
        self.pos += 1;
        match tok {
            Token::Number(x) => Ok(Expr::Number(x)),
            Token::LParen => {
                let inner = self.parse_sum()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if matches!(self.peek(), Some(Token::LParen)) => {
                self.pos += 1;
                self.parse_call(&name)
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            other => Err(self.error(&format!("unexpected {:?}", other))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr> {
        let func = Builtin::lookup(name)
            .ok_or_else(|| self.error(&format!("unknown function '{}'", name)))?;

        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.parse_sum()?);
                match self.peek() {
                    Some(Token::Comma) => self.pos += 1,
                    Some(Token::RParen) => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error(&format!("unclosed call to '{}'", name))),
                }
            }
        }

        if args.len() < func.min_args || args.len() > func.max_args {
            return Err(self.error(&format!(
                "'{}' takes {} argument(s), got {}",
                func.name,
                arity_text(func.min_args, func.max_args),
                args.len()
            )));
        }
        Ok(Expr::Call { func, args })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.peek() {
            Some(tok) if tok == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(&format!("expected {:?}", expected))),
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::Expression(format!("{} in '{}'", msg, self.src))
    }
}

fn arity_text(min: usize, max: usize) -> String {
    if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("{} to {}", min, max)
    }
}
