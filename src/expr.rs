// Expression trees for differential-equation text
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::collections::BTreeSet;

/// The independent variable of every function in an equation.
pub const TIME_VAR: &str = "t";

/// Errors raised while reading equation text or lowering it to a rational expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A character outside the expression grammar.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Its byte offset.
        position: usize,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// A token in the wrong place.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken {
        /// The token text.
        found: String,
        /// Its byte offset.
        position: usize,
    },

    /// The text ended in the middle of an expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// More than one `=`.
    #[error("the equation contains more than one '='")]
    MultipleEquals,

    /// A `diff(...)` call that is not a time derivative of a function of `t`.
    #[error("malformed derivative: {0}")]
    InvalidDerivative(String),

    /// A call to a function other than the input or output.
    #[error("function '{0}' is neither the input nor the output")]
    UnknownFunction(String),

    /// A function applied to something other than `t`.
    #[error("functions must be applied to '{TIME_VAR}' only, found '{0}(...)'")]
    InvalidArgument(String),

    /// A reserved name used as a parameter.
    #[error("'{0}' is reserved and cannot be used as a parameter name")]
    ReservedSymbol(String),

    /// `t` outside a function argument.
    #[error("the time variable '{TIME_VAR}' may only appear as a function argument")]
    TimeOutsideFunction,

    /// A derivative above the configured maximum order.
    #[error("derivative of order {order} of '{function}' exceeds the supported maximum of {max}")]
    DerivativeOrderTooHigh {
        /// Name of the differentiated function.
        function: String,
        /// Order found.
        order: u32,
        /// Highest order allowed.
        max: u32,
    },

    /// An exponent that is not an integer constant.
    #[error("exponents must be integer constants")]
    NonIntegerExponent,

    /// Division by an expression that is identically zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// A node of the expression tree.
///
/// Subtraction is a `Sum` with a `Neg` operand and division a `Product` with a `Power` of `-1`,
/// so rewriting rules only need to look at a handful of shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A parameter or the time variable.
    Symbol(String),
    /// Sum of the operands.
    Sum(Vec<Expr>),
    /// Product of the operands.
    Product(Vec<Expr>),
    /// `base ^ exponent`.
    Power(Box<Expr>, Box<Expr>),
    /// Negation.
    Neg(Box<Expr>),
    /// Application of a named function, e.g. `y(t)`.
    Call {
        /// Function name.
        name: String,
        /// Arguments; only `t` is admissible.
        args: Vec<Expr>,
    },
    /// Time derivative of a function of `t`, e.g. `diff(y(t), t, 2)`.
    Derivative {
        /// Name of the differentiated function.
        function: String,
        /// Number of differentiations.
        order: u32,
    },
}

impl Expr {
    /// Rebuilds the tree bottom-up, replacing every node for which `f` returns `Some`.
    pub fn rewrite(&self, f: &impl Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        match self {
            Expr::Sum(items) => Expr::Sum(items.iter().map(|e| e.rewrite(f)).collect()),
            Expr::Product(items) => Expr::Product(items.iter().map(|e| e.rewrite(f)).collect()),
            Expr::Power(base, exp) => Expr::Power(Box::new(base.rewrite(f)), Box::new(exp.rewrite(f))),
            Expr::Neg(inner) => Expr::Neg(Box::new(inner.rewrite(f))),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: args.iter().map(|e| e.rewrite(f)).collect(),
            },
            leaf => leaf.clone(),
        }
    }

    /// Every bare symbol in the tree, including symbols used as function arguments.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Sum(items) | Expr::Product(items) | Expr::Call { args: items, .. } => {
                items.iter().for_each(|e| e.collect_symbols(out))
            }
            Expr::Power(base, exp) => {
                base.collect_symbols(out);
                exp.collect_symbols(out);
            }
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Number(_) | Expr::Derivative { .. } => {}
        }
    }

    /// True for `name(t)`.
    pub fn is_function_of_time(&self, function: &str) -> bool {
        matches!(self, Expr::Call { name, args }
            if name == function && matches!(args.as_slice(), [Expr::Symbol(t)] if t == TIME_VAR))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(x) => x.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Caret
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part, e.g. 1e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber(literal.clone()))?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
                continue;
            }
            ch => return Err(ParseError::UnexpectedCharacter { ch, position: i }),
        };
        tokens.push((token, start));
        i += 1;
    }
    Ok(tokens)
}

/// Parses one side of an equation.
///
/// Grammar, loosest binding first:
///
/// ```text
/// sum     := product (("+" | "-") product)*
/// product := unary (("*" | "/") unary)*
/// unary   := ("+" | "-") unary | power
/// power   := atom (("^" | "**") unary)?
/// atom    := number | ident | ident "(" args ")" | "(" sum ")"
/// ```
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.sum()?;
    match parser.peek() {
        None => Ok(expr),
        Some((token, position)) => Err(ParseError::UnexpectedToken {
            found: token.describe(),
            position: *position,
        }),
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<(Token, usize), ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().map(|(t, _)| t) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let (token, position) = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.describe(),
                position,
            })
        }
    }

    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut terms = vec![self.product()?];
        loop {
            if self.eat(&Token::Plus) {
                terms.push(self.product()?);
            } else if self.eat(&Token::Minus) {
                terms.push(Expr::Neg(Box::new(self.product()?)));
            } else {
                break;
            }
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::Sum(terms) })
    }

    fn product(&mut self) -> Result<Expr, ParseError> {
        let mut factors = vec![self.unary()?];
        loop {
            if self.eat(&Token::Star) {
                factors.push(self.unary()?);
            } else if self.eat(&Token::Slash) {
                let divisor = self.unary()?;
                factors.push(Expr::Power(Box::new(divisor), Box::new(Expr::Number(-1.0))));
            } else {
                break;
            }
        }
        Ok(if factors.len() == 1 { factors.remove(0) } else { Expr::Product(factors) })
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.atom()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Ok(Expr::Power(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let (token, position) = self.next()?;
        match token {
            Token::Number(x) => Ok(Expr::Number(x)),
            Token::LParen => {
                let inner = self.sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Symbol(name));
                }
                let args = self.arguments()?;
                if name == "diff" {
                    derivative(args)
                } else {
                    Ok(Expr::Call { name, args })
                }
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                position,
            }),
        }
    }

    /// Comma-separated arguments after an opening parenthesis, consuming the closing one.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.sum()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(args);
        }
    }
}

/// Interprets the arguments of `diff(f(t), t[, order])`, `diff(f(t), t, t, ...)` or a nested
/// `diff(diff(f(t), t), t)`.
fn derivative(args: Vec<Expr>) -> Result<Expr, ParseError> {
    let mut args = args.into_iter();
    let target = args
        .next()
        .ok_or_else(|| ParseError::InvalidDerivative("diff() needs a function of t".into()))?;

    let (function, base_order) = match &target {
        Expr::Derivative { function, order } => (function.clone(), *order),
        Expr::Call { name, .. } if target.is_function_of_time(name) => (name.clone(), 0),
        _ => {
            return Err(ParseError::InvalidDerivative(
                "only functions of t can be differentiated".into(),
            ))
        }
    };

    let rest: Vec<Expr> = args.collect();
    let order = match rest.as_slice() {
        [] => 1,
        [Expr::Symbol(v), Expr::Number(k)] if v == TIME_VAR => {
            if k.fract() != 0.0 || *k < 0.0 || *k > u32::MAX as f64 {
                return Err(ParseError::InvalidDerivative(format!(
                    "order must be a non-negative integer, found {k}"
                )));
            }
            *k as u32
        }
        vars if vars.iter().all(|v| matches!(v, Expr::Symbol(name) if name == TIME_VAR)) => {
            vars.len() as u32
        }
        _ => {
            return Err(ParseError::InvalidDerivative(format!(
                "derivatives must be taken with respect to '{TIME_VAR}'"
            )))
        }
    };

    let order = base_order.checked_add(order).ok_or_else(|| {
        ParseError::InvalidDerivative(format!("derivative order of '{function}' overflows"))
    })?;
    Ok(Expr::Derivative { function, order })
}
