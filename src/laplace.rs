// Laplace transformation of linear ordinary differential equations
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

use log::debug;

use crate::expr::{self, Expr, ParseError, TIME_VAR};
use crate::symbolic::{SymbolicExpression, LAPLACE_VAR};

// Placeholders for the transformed output and input. Parentheses can never appear in a
// parsed identifier, so these cannot collide with parameter names.
const OUTPUT_MARKER: &str = "Y(s)";
const INPUT_MARKER: &str = "U(s)";

/// Failure to turn an equation into a transfer function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LaplaceError {
    /// The equation text is malformed or not admissible.
    #[error("could not parse the equation: {0}")]
    Parse(#[from] ParseError),

    /// The transformed equation cannot be solved for `Y(s)/U(s)`.
    #[error("could not isolate the output in the s-domain: {0}")]
    Unsolvable(String),
}

/// A linear ODE together with the names of its input and output functions.
///
/// The equation reads `LHS = RHS`, e.g. `10*diff(y(t),t) + y(t) = 2*u(t)`. Without an `=` the
/// right-hand side is 0.
#[derive(Clone, Debug, PartialEq)]
pub struct OdeSpec {
    /// The equation text.
    pub equation: String,
    /// Name of the input function, e.g. `u`.
    pub input: String,
    /// Name of the output function, e.g. `y`.
    pub output: String,
}

impl OdeSpec {
    /// Bundles an equation with its input and output names.
    pub fn new(equation: impl Into<String>, input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            equation: equation.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// One rewriting rule: the `order`-th derivative of `function` becomes `s^order · marker`.
struct Rule<'a> {
    function: &'a str,
    order: u32,
    marker: &'static str,
}

impl Rule<'_> {
    fn matches(&self, e: &Expr) -> bool {
        match e {
            Expr::Derivative { function, order } => function == self.function && *order == self.order,
            // A zeroth derivative is the function itself
            _ => self.order == 0 && e.is_function_of_time(self.function),
        }
    }

    fn replacement(&self) -> Expr {
        let marker = Expr::Symbol(self.marker.to_string());
        match self.order {
            0 => marker,
            k => Expr::Product(vec![
                Expr::Power(
                    Box::new(Expr::Symbol(LAPLACE_VAR.to_string())),
                    Box::new(Expr::Number(k as f64)),
                ),
                marker,
            ]),
        }
    }

    fn apply(&self, e: &Expr) -> Expr {
        e.rewrite(&|node| self.matches(node).then(|| self.replacement()))
    }
}

/// Rules for both functions, highest order first so no derivative is mistaken for the bare
/// function.
fn rules<'a>(spec: &'a OdeSpec, max_order: u32) -> Vec<Rule<'a>> {
    let mut rules = Vec::new();
    for (function, marker) in [(spec.output.as_str(), OUTPUT_MARKER), (spec.input.as_str(), INPUT_MARKER)] {
        for order in (0..=max_order).rev() {
            rules.push(Rule {
                function,
                order,
                marker,
            });
        }
    }
    rules
}

/// Transforms the ODE into the plant transfer function `Y(s)/U(s)`.
///
/// Each derivative of order `k` of the output becomes `s^k·Y(s)` and of the input `s^k·U(s)`
/// (zero initial conditions). The transformed equation is solved for `Y(s)` and divided by
/// `U(s)`. Every symbol besides `s` in the result is a free physical parameter.
///
/// # Errors
/// - [`LaplaceError::Parse`] if the text is not a sum of admissible terms, including
///   derivatives above `max_order`.
/// - [`LaplaceError::Unsolvable`] if the transformed equation is not linear in the output and
///   input, or the output cannot be isolated.
pub fn transform(spec: &OdeSpec, max_order: u32) -> Result<SymbolicExpression, LaplaceError> {
    let input = spec.input.trim();
    let output = spec.output.trim();
    for name in [input, output] {
        if name == LAPLACE_VAR || name == TIME_VAR || name == "diff" {
            return Err(ParseError::ReservedSymbol(name.to_string()).into());
        }
    }
    if input == output {
        return Err(LaplaceError::Unsolvable(format!(
            "input and output are both named '{output}'"
        )));
    }
    let spec = OdeSpec::new(spec.equation.as_str(), input, output);

    let (lhs_text, rhs_text) = match spec.equation.split_once('=') {
        Some((_, rhs)) if rhs.contains('=') => return Err(ParseError::MultipleEquals.into()),
        Some((lhs, rhs)) => (lhs, rhs),
        None => (spec.equation.as_str(), "0"),
    };

    let rules = rules(&spec, max_order);
    let mut sides = Vec::with_capacity(2);
    for text in [lhs_text, rhs_text] {
        let parsed = expr::parse(text)?;
        if parsed.symbols().contains(LAPLACE_VAR) {
            return Err(ParseError::ReservedSymbol(LAPLACE_VAR.to_string()).into());
        }
        let transformed = rules.iter().fold(parsed, |e, rule| rule.apply(&e));
        sides.push(lower(&transformed, &spec, max_order)?);
    }

    let equation = sides[0].sub(&sides[1]);
    let transfer = solve(&equation)?;
    debug!("G(s) = {transfer}");
    Ok(transfer)
}

/// Converts a rewritten tree into a rational expression in `s`, the two markers and the free
/// parameters.
fn lower(e: &Expr, spec: &OdeSpec, max_order: u32) -> Result<SymbolicExpression, ParseError> {
    match e {
        Expr::Number(x) => Ok(SymbolicExpression::constant(*x)),
        Expr::Symbol(name) if name == TIME_VAR => Err(ParseError::TimeOutsideFunction),
        Expr::Symbol(name) => Ok(SymbolicExpression::symbol(name)),
        Expr::Sum(items) => items.iter().try_fold(SymbolicExpression::constant(0.0), |acc, item| {
            Ok(acc.add(&lower(item, spec, max_order)?))
        }),
        Expr::Product(items) => items.iter().try_fold(SymbolicExpression::constant(1.0), |acc, item| {
            Ok(acc.mul(&lower(item, spec, max_order)?))
        }),
        Expr::Neg(inner) => Ok(lower(inner, spec, max_order)?.neg()),
        Expr::Power(base, exponent) => {
            let exponent = lower(exponent, spec, max_order)?;
            let n = integer_value(&exponent).ok_or(ParseError::NonIntegerExponent)?;
            lower(base, spec, max_order)?
                .checked_powi(n)
                .ok_or(ParseError::DivisionByZero)
        }
        Expr::Call { name, .. } if name == &spec.input || name == &spec.output => {
            Err(ParseError::InvalidArgument(name.clone()))
        }
        Expr::Call { name, .. } => Err(ParseError::UnknownFunction(name.clone())),
        Expr::Derivative { function, order } if function == &spec.input || function == &spec.output => {
            Err(ParseError::DerivativeOrderTooHigh {
                function: function.clone(),
                order: *order,
                max: max_order,
            })
        }
        Expr::Derivative { function, .. } => Err(ParseError::UnknownFunction(function.clone())),
    }
}

fn integer_value(e: &SymbolicExpression) -> Option<i32> {
    let num = e.numerator().as_constant()?;
    let den = e.denominator().as_constant()?;
    let value = num / den;
    (value.fract() == 0.0 && value.abs() <= i32::MAX as f64).then_some(value as i32)
}

/// Solves `equation = 0` for `Y(s)/U(s)`.
///
/// The numerator must have the shape `A·Y + B·U` with `A`, `B` free of both markers, giving
/// `Y/U = -B/A`. The denominator is non-zero by construction and drops out.
fn solve(equation: &SymbolicExpression) -> Result<SymbolicExpression, LaplaceError> {
    let unsolvable = |reason: &str| LaplaceError::Unsolvable(reason.to_string());

    let den = equation.denominator();
    if den.contains(OUTPUT_MARKER) || den.contains(INPUT_MARKER) {
        return Err(unsolvable("the output or input appears in a denominator"));
    }

    let num = equation.numerator();
    if num.degree_in(OUTPUT_MARKER) > 1 || num.degree_in(INPUT_MARKER) > 1 {
        return Err(unsolvable("the equation is not linear in the output and input"));
    }
    let a = num.coefficient_of(OUTPUT_MARKER, 1);
    let rest = num.coefficient_of(OUTPUT_MARKER, 0);
    if a.contains(INPUT_MARKER) {
        return Err(unsolvable("the equation multiplies the output by the input"));
    }
    if a.is_zero() {
        return Err(unsolvable("the output does not appear in the equation"));
    }
    let b = rest.coefficient_of(INPUT_MARKER, 1);
    let c = rest.coefficient_of(INPUT_MARKER, 0);
    if !c.is_zero() {
        return Err(unsolvable(
            "the equation has terms that depend on neither the output nor the input",
        ));
    }

    let g = SymbolicExpression::new(b.scale(-1.0), a)
        .ok_or_else(|| unsolvable("the output coefficient vanishes"))?;
    Ok(g.reduced())
}
