// Rational functions over named symbols
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

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of the Laplace variable.
pub const LAPLACE_VAR: &str = "s";

/// A product of symbols raised to positive powers, e.g. `{R: 1, s: 2}` for `R·s²`.
/// The empty monomial is the constant 1.
pub type Monomial = BTreeMap<String, u32>;

/// Terms smaller than this fraction of the largest coefficient count as rounding residue when
/// dividing polynomials.
const CANCEL_TOLERANCE: f64 = 1e-9;

/// Bound on the number of quotient terms produced by one exact division.
const MAX_DIVISION_STEPS: usize = 10_000;

/// A sparse polynomial in any number of named symbols with real coefficients.
///
/// Terms are kept in a `BTreeMap` so iteration, printing and substitution are deterministic.
/// Terms with a coefficient of exactly zero are never stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiPoly {
    terms: BTreeMap<Monomial, f64>,
}

impl MultiPoly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    pub fn constant(c: f64) -> Self {
        let mut p = Self::zero();
        p.accumulate(Monomial::new(), c);
        p
    }

    /// The polynomial consisting of the single symbol `name`.
    pub fn symbol(name: &str) -> Self {
        let mut p = Self::zero();
        p.accumulate(Monomial::from([(name.to_string(), 1)]), 1.0);
        p
    }

    fn accumulate(&mut self, monomial: Monomial, coeff: f64) {
        let entry = self.terms.entry(monomial).or_insert(0.0);
        *entry += coeff;
        if *entry == 0.0 {
            self.terms.retain(|_, c| *c != 0.0);
        }
    }

    /// True if there are no terms.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the value of a polynomial without symbols.
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self.terms.get(&Monomial::new()).copied(),
            _ => None,
        }
    }

    /// Monomials with their coefficients, in monomial order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, c)| (m, *c))
    }

    /// Sum of two polynomials.
    pub fn add(&self, other: &MultiPoly) -> MultiPoly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.accumulate(m.clone(), *c);
        }
        out
    }

    /// Difference of two polynomials.
    pub fn sub(&self, other: &MultiPoly) -> MultiPoly {
        self.add(&other.scale(-1.0))
    }

    /// Multiplies every coefficient by `k`.
    pub fn scale(&self, k: f64) -> MultiPoly {
        let mut out = MultiPoly::zero();
        for (m, c) in &self.terms {
            out.accumulate(m.clone(), c * k);
        }
        out
    }

    /// Product of two polynomials.
    pub fn mul(&self, other: &MultiPoly) -> MultiPoly {
        let mut out = MultiPoly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                let mut m = ma.clone();
                for (sym, exp) in mb {
                    *m.entry(sym.clone()).or_insert(0) += exp;
                }
                out.accumulate(m, ca * cb);
            }
        }
        out
    }

    /// Repeated product; `p⁰ = 1`.
    pub fn pow(&self, exponent: u32) -> MultiPoly {
        (0..exponent).fold(MultiPoly::constant(1.0), |acc, _| acc.mul(self))
    }

    /// Highest power of `var` over all terms.
    pub fn degree_in(&self, var: &str) -> u32 {
        self.terms
            .keys()
            .map(|m| m.get(var).copied().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    /// True if some term involves `var`.
    pub fn contains(&self, var: &str) -> bool {
        self.terms.keys().any(|m| m.contains_key(var))
    }

    /// Collects the terms containing exactly `var^power` and strips `var` from them.
    pub fn coefficient_of(&self, var: &str, power: u32) -> MultiPoly {
        let mut out = MultiPoly::zero();
        for (m, c) in &self.terms {
            if m.get(var).copied().unwrap_or(0) == power {
                let mut m = m.clone();
                m.remove(var);
                out.accumulate(m, *c);
            }
        }
        out
    }

    /// Every symbol appearing in some term.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.terms.keys().flat_map(|m| m.keys().cloned()).collect()
    }

    /// Replaces every symbol found in `values` by its number.
    pub fn substitute(&self, values: &BTreeMap<String, f64>) -> MultiPoly {
        let mut out = MultiPoly::zero();
        for (m, c) in &self.terms {
            let mut coeff = *c;
            let mut rest = Monomial::new();
            for (sym, exp) in m {
                match values.get(sym) {
                    Some(v) => coeff *= v.powi(*exp as i32),
                    None => {
                        rest.insert(sym.clone(), *exp);
                    }
                }
            }
            out.accumulate(rest, coeff);
        }
        out
    }

    /// Descending coefficients of a polynomial whose only symbol is `var`.
    ///
    /// Returns `None` if any other symbol is present.
    pub fn univariate_coeffs(&self, var: &str) -> Option<Vec<f64>> {
        let degree = self.degree_in(var) as usize;
        let mut coeffs = vec![0.0; degree + 1];
        for (m, c) in &self.terms {
            if m.keys().any(|sym| sym != var) {
                return None;
            }
            let power = m.get(var).copied().unwrap_or(0) as usize;
            coeffs[degree - power] += c;
        }
        Some(coeffs)
    }

    /// The monomial dividing every term, i.e. the minimum power of each symbol.
    fn monomial_content(&self) -> Monomial {
        let mut terms = self.terms.keys();
        let Some(first) = terms.next() else {
            return Monomial::new();
        };
        let mut content = first.clone();
        for m in terms {
            content.retain(|sym, exp| match m.get(sym) {
                Some(e) => {
                    *exp = (*exp).min(*e);
                    true
                }
                None => false,
            });
        }
        content
    }

    fn divide_monomial(&self, divisor: &Monomial) -> MultiPoly {
        let mut out = MultiPoly::zero();
        for (m, c) in &self.terms {
            let mut m = m.clone();
            for (sym, exp) in divisor {
                if let Some(e) = m.get_mut(sym) {
                    *e -= exp;
                    if *e == 0 {
                        m.remove(sym);
                    }
                }
            }
            out.accumulate(m, *c);
        }
        out
    }

    fn max_abs_coeff(&self) -> f64 {
        self.terms.values().fold(0.0, |m, c| m.max(c.abs()))
    }

    fn cleaned(mut self, scale: f64) -> MultiPoly {
        let threshold = CANCEL_TOLERANCE * scale;
        self.terms.retain(|_, c| c.abs() > threshold);
        self
    }

    /// Largest term in lexicographic order over `vars`.
    fn leading_term(&self, vars: &[String]) -> Option<(&Monomial, f64)> {
        self.terms
            .iter()
            .max_by_key(|(m, _)| lex_key(m, vars))
            .map(|(m, c)| (m, *c))
    }

    /// Scales so that the lexicographically leading coefficient is 1.
    fn normalized(&self) -> MultiPoly {
        let vars: Vec<String> = self.symbols().into_iter().collect();
        match self.leading_term(&vars) {
            Some((_, lead)) => self.scale(1.0 / lead),
            None => self.clone(),
        }
    }

    /// Quotient of a division that leaves no remainder, up to rounding.
    ///
    /// Returns `None` if `divisor` is zero or does not divide `self`.
    pub fn exact_div(&self, divisor: &MultiPoly) -> Option<MultiPoly> {
        let vars: Vec<String> = self.symbols().union(&divisor.symbols()).cloned().collect();
        let (lead_m, lead_c) = divisor.leading_term(&vars)?;
        let scale = self.max_abs_coeff();
        let mut rem = self.clone();
        let mut quotient = MultiPoly::zero();
        for _ in 0..MAX_DIVISION_STEPS {
            rem = rem.cleaned(scale);
            let Some((m, c)) = rem.leading_term(&vars) else {
                return Some(quotient);
            };
            let mut factor = m.clone();
            for (sym, exp) in lead_m {
                match factor.get_mut(sym) {
                    Some(e) if *e >= *exp => {
                        *e -= exp;
                        if *e == 0 {
                            factor.remove(sym);
                        }
                    }
                    _ => return None,
                }
            }
            let top = m.clone();
            let term = MultiPoly {
                terms: BTreeMap::from([(factor, c / lead_c)]),
            };
            rem = rem.sub(&term.mul(divisor));
            rem.terms.remove(&top);
            quotient = quotient.add(&term);
        }
        None
    }

    /// Pseudo-remainder of `self` by `divisor`, both seen as polynomials in `var`.
    fn pseudo_rem(&self, divisor: &MultiPoly, var: &str) -> MultiPoly {
        let d = divisor.degree_in(var);
        if d == 0 {
            return MultiPoly::zero();
        }
        let lead = divisor.coefficient_of(var, d);
        let mut rem = self.clone();
        while !rem.is_zero() && rem.degree_in(var) >= d {
            let k = rem.degree_in(var);
            let coeff = rem.coefficient_of(var, k);
            let scaled = rem.mul(&lead);
            let scale = scaled.max_abs_coeff();
            rem = scaled.sub(&coeff.mul(&MultiPoly::symbol(var).pow(k - d)).mul(divisor));
            rem.terms.retain(|m, _| m.get(var).copied().unwrap_or(0) != k);
            rem = rem.cleaned(scale);
        }
        rem
    }

    /// GCD of the coefficients of `self` seen as a polynomial in `var`.
    fn content_in(&self, var: &str) -> Option<MultiPoly> {
        let mut content = MultiPoly::zero();
        for power in 0..=self.degree_in(var) {
            let coeff = self.coefficient_of(var, power);
            if coeff.is_zero() {
                continue;
            }
            content = content.try_gcd(&coeff)?;
            if content.as_constant().is_some() {
                return Some(MultiPoly::constant(1.0));
            }
        }
        Some(content)
    }

    /// Greatest common divisor up to a constant factor, with every symbol treated alike.
    ///
    /// Numeric content is ignored: two polynomials sharing only a constant factor have a GCD
    /// of 1. Rounding that prevents an exact division also yields 1.
    pub fn gcd(&self, other: &MultiPoly) -> MultiPoly {
        self.try_gcd(other)
            .map(|g| g.normalized())
            .unwrap_or_else(|| MultiPoly::constant(1.0))
    }

    // Recursive primitive remainder sequence on the first symbol in name order.
    fn try_gcd(&self, other: &MultiPoly) -> Option<MultiPoly> {
        if self.is_zero() {
            return Some(other.clone());
        }
        if other.is_zero() {
            return Some(self.clone());
        }
        let (self_symbols, other_symbols) = (self.symbols(), other.symbols());
        let Some(var) = self_symbols.union(&other_symbols).next().cloned() else {
            return Some(MultiPoly::constant(1.0));
        };
        match (self_symbols.contains(&var), other_symbols.contains(&var)) {
            (true, false) => self.content_in(&var)?.try_gcd(other),
            (false, true) => self.try_gcd(&other.content_in(&var)?),
            _ => {
                let (content_a, content_b) = (self.content_in(&var)?, other.content_in(&var)?);
                let mut a = self.exact_div(&content_a)?;
                let mut b = other.exact_div(&content_b)?;
                if a.degree_in(&var) < b.degree_in(&var) {
                    std::mem::swap(&mut a, &mut b);
                }
                let common = content_a.try_gcd(&content_b)?;
                let factor = loop {
                    let r = a.pseudo_rem(&b, &var);
                    if r.is_zero() {
                        break b;
                    }
                    if !r.contains(&var) {
                        break MultiPoly::constant(1.0);
                    }
                    let content = r.content_in(&var)?;
                    a = b;
                    b = r.exact_div(&content)?.normalized();
                };
                Some(common.mul(&factor))
            }
        }
    }

    /// Coefficient of the term printed first, used to fix the overall sign.
    fn leading_coefficient(&self) -> f64 {
        self.sorted_terms().first().map(|(_, c)| *c).unwrap_or(0.0)
    }

    /// Terms ordered by descending power of `s`, then descending total degree.
    fn sorted_terms(&self) -> Vec<(&Monomial, f64)> {
        let mut terms: Vec<_> = self.terms().collect();
        terms.sort_by_key(|(m, _)| {
            (
                Reverse(m.get(LAPLACE_VAR).copied().unwrap_or(0)),
                Reverse(m.values().sum::<u32>()),
                (*m).clone(),
            )
        });
        terms
    }
}

impl fmt::Display for MultiPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.sorted_terms();
        if terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (m, c)) in terms.into_iter().enumerate() {
            let factors: Vec<String> = m
                .iter()
                .map(|(sym, exp)| match exp {
                    1 => sym.clone(),
                    _ => format!("{sym}^{exp}"),
                })
                .collect();
            let magnitude = c.abs();
            let body = match (factors.is_empty(), magnitude == 1.0) {
                (true, _) => format!("{magnitude}"),
                (false, true) => factors.join("*"),
                (false, false) => format!("{magnitude}*{}", factors.join("*")),
            };
            match (i, c < 0.0) {
                (0, true) => write!(f, "-{body}")?,
                (0, false) => write!(f, "{body}")?,
                (_, true) => write!(f, " - {body}")?,
                (_, false) => write!(f, " + {body}")?,
            }
        }
        Ok(())
    }
}

/// A rational function `numerator / denominator` in the Laplace variable and any number of
/// physical-parameter symbols.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolicExpression {
    numerator: MultiPoly,
    denominator: MultiPoly,
}

impl SymbolicExpression {
    /// Builds `numerator / denominator`. Returns `None` if the denominator is zero.
    pub fn new(numerator: MultiPoly, denominator: MultiPoly) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// The polynomial `p` over 1.
    pub fn from_poly(p: MultiPoly) -> Self {
        Self {
            numerator: p,
            denominator: MultiPoly::constant(1.0),
        }
    }

    /// A constant expression.
    pub fn constant(c: f64) -> Self {
        Self::from_poly(MultiPoly::constant(c))
    }

    /// A single symbol.
    pub fn symbol(name: &str) -> Self {
        Self::from_poly(MultiPoly::symbol(name))
    }

    /// Numerator polynomial.
    pub fn numerator(&self) -> &MultiPoly {
        &self.numerator
    }

    /// Denominator polynomial; never zero.
    pub fn denominator(&self) -> &MultiPoly {
        &self.denominator
    }

    /// Sum; the denominator is shared when both are equal.
    pub fn add(&self, other: &SymbolicExpression) -> SymbolicExpression {
        if self.denominator == other.denominator {
            return Self {
                numerator: self.numerator.add(&other.numerator),
                denominator: self.denominator.clone(),
            };
        }
        Self {
            numerator: self
                .numerator
                .mul(&other.denominator)
                .add(&other.numerator.mul(&self.denominator)),
            denominator: self.denominator.mul(&other.denominator),
        }
    }

    /// Negation.
    pub fn neg(&self) -> SymbolicExpression {
        Self {
            numerator: self.numerator.scale(-1.0),
            denominator: self.denominator.clone(),
        }
    }

    /// Difference.
    pub fn sub(&self, other: &SymbolicExpression) -> SymbolicExpression {
        self.add(&other.neg())
    }

    /// Product, without cancellation.
    pub fn mul(&self, other: &SymbolicExpression) -> SymbolicExpression {
        Self {
            numerator: self.numerator.mul(&other.numerator),
            denominator: self.denominator.mul(&other.denominator),
        }
    }

    /// Returns `None` when dividing by zero.
    pub fn checked_div(&self, other: &SymbolicExpression) -> Option<SymbolicExpression> {
        Self::new(
            self.numerator.mul(&other.denominator),
            self.denominator.mul(&other.numerator),
        )
    }

    /// Integer power; negative exponents invert. Returns `None` for a negative power of zero.
    pub fn checked_powi(&self, exponent: i32) -> Option<SymbolicExpression> {
        let base = if exponent < 0 {
            Self::new(self.denominator.clone(), self.numerator.clone())?
        } else {
            self.clone()
        };
        let n = exponent.unsigned_abs();
        Some(Self {
            numerator: base.numerator.pow(n),
            denominator: base.denominator.pow(n),
        })
    }

    /// Symbols other than the Laplace variable, sorted by name.
    pub fn free_symbols(&self) -> Vec<String> {
        let mut symbols = self.numerator.symbols();
        symbols.extend(self.denominator.symbols());
        symbols.remove(LAPLACE_VAR);
        symbols.into_iter().collect()
    }

    /// Replaces every symbol found in `values`. The denominator may become zero.
    pub fn substitute(&self, values: &BTreeMap<String, f64>) -> SymbolicExpression {
        Self {
            numerator: self.numerator.substitute(values),
            denominator: self.denominator.substitute(values),
        }
    }

    /// Cancels every factor shared by numerator and denominator, including factors that involve
    /// physical parameters, then the integer content, and makes the leading denominator
    /// coefficient positive.
    ///
    /// `(τs + 1)/(τs + 1)` reduces to `1`, so `τ` is no longer a free symbol.
    pub fn reduced(&self) -> SymbolicExpression {
        let mut num = self.numerator.clone();
        let mut den = self.denominator.clone();

        if !num.is_zero() {
            let mut shared = den.monomial_content();
            let num_content = num.monomial_content();
            shared.retain(|sym, exp| match num_content.get(sym) {
                Some(e) => {
                    *exp = (*exp).min(*e);
                    true
                }
                None => false,
            });
            num = num.divide_monomial(&shared);
            den = den.divide_monomial(&shared);

            let common = num.gcd(&den);
            if common.as_constant().is_none() {
                if let (Some(n), Some(d)) = (num.exact_div(&common), den.exact_div(&common)) {
                    num = n;
                    den = d;
                }
            }

            if let Some(g) = integer_content(num.terms().chain(den.terms()).map(|(_, c)| c)) {
                num = num.scale(1.0 / g);
                den = den.scale(1.0 / g);
            }
        } else {
            den = MultiPoly::constant(1.0);
        }

        if den.leading_coefficient() < 0.0 {
            num = num.scale(-1.0);
            den = den.scale(-1.0);
        }

        Self {
            numerator: num,
            denominator: den,
        }
    }
}

impl fmt::Display for SymbolicExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_is_sum = self.numerator.terms.len() > 1;
        match self.denominator.as_constant() {
            Some(d) if d == 1.0 => write!(f, "{}", self.numerator),
            _ => {
                if num_is_sum {
                    write!(f, "({})", self.numerator)?;
                } else {
                    write!(f, "{}", self.numerator)?;
                }
                write!(f, "/({})", self.denominator)
            }
        }
    }
}

/// Greatest common divisor of a set of integer-valued coefficients, if it exceeds 1.
fn integer_content(coeffs: impl Iterator<Item = f64>) -> Option<f64> {
    const EXACT_LIMIT: f64 = 9.007_199_254_740_992e15;
    let mut g: u64 = 0;
    for c in coeffs {
        let c = c.abs();
        if c.fract() != 0.0 || c >= EXACT_LIMIT {
            return None;
        }
        g = gcd(g, c as u64);
    }
    (g > 1).then_some(g as f64)
}

fn lex_key(m: &Monomial, vars: &[String]) -> Vec<u32> {
    vars.iter().map(|v| m.get(v).copied().unwrap_or(0)).collect()
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
