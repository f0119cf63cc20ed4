// Transfer functions: construction, stability and feedback composition
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

use core::fmt;

use log::debug;
use nalgebra::Complex;

use crate::format;
use crate::poly::Polynomial;
use crate::symbolic::{SymbolicExpression, LAPLACE_VAR};

/// Remainders below this fraction of the dividend are treated as zero when cancelling common
/// factors.
const GCD_TOLERANCE: f64 = 1e-9;

/// Real parts within this multiple of machine epsilon, relative to the pole magnitude, are
/// rounding noise from the root finder and count as lying on the imaginary axis.
const AXIS_ROUNDING: f64 = 1e4 * f64::EPSILON;

/// Failure to build a transfer function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferFunctionError {
    /// The denominator vanishes identically.
    #[error("the denominator is the zero polynomial")]
    ZeroDenominator,

    /// The output list does not match the equation order.
    #[error("an order-{order} equation needs {expected} output coefficients, got {found}")]
    CoefficientCount {
        /// Declared order.
        order: usize,
        /// `order + 1`.
        expected: usize,
        /// Length of the output list.
        found: usize,
    },

    /// No input coefficients were given.
    #[error("the input coefficient list is empty")]
    EmptyInput,

    /// Symbols other than `s` are still present.
    #[error("parameters without a value: {}", .0.join(", "))]
    UnresolvedSymbols(Vec<String>),

    /// A coefficient token is not a finite number.
    #[error("'{0}' is not a valid coefficient")]
    InvalidCoefficient(String),

    /// The order is not a non-negative integer.
    #[error("'{0}' is not a valid equation order")]
    InvalidOrder(String),
}

/// A rational function `num(s) / den(s)` with real coefficients.
///
/// Both polynomials are stored highest power first. The denominator is never the zero
/// polynomial.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferFunction {
    num: Polynomial,
    den: Polynomial,
}

impl TransferFunction {
    /// Creates a transfer function from numerator and denominator coefficients, kept as given.
    ///
    /// # Returns
    /// - `Ok(tf)` if the denominator has a non-zero coefficient.
    /// - `Err(TransferFunctionError::ZeroDenominator)` otherwise.
    pub fn new(
        num: impl Into<Polynomial>,
        den: impl Into<Polynomial>,
    ) -> Result<Self, TransferFunctionError> {
        let den = den.into();
        if den.is_zero() {
            return Err(TransferFunctionError::ZeroDenominator);
        }
        Ok(Self::from_parts(num.into(), den))
    }

    /// Assembles a transfer function whose denominator is known to be non-zero.
    pub(crate) fn from_parts(num: Polynomial, den: Polynomial) -> Self {
        Self { num, den }
    }

    /// Builds the transfer function of a fully resolved symbolic expression in `s`.
    ///
    /// Leading zeros are dropped and common factors of numerator and denominator are
    /// cancelled, so e.g. `(s + 1)/(s² + 3s + 2)` becomes `1/(s + 2)`. The denominator is
    /// scaled to have a positive leading coefficient.
    ///
    /// # Errors
    /// - [`TransferFunctionError::UnresolvedSymbols`] if a parameter besides `s` is left.
    /// - [`TransferFunctionError::ZeroDenominator`] if the substituted denominator vanishes.
    pub fn from_symbolic(expr: &SymbolicExpression) -> Result<Self, TransferFunctionError> {
        let unresolved = || TransferFunctionError::UnresolvedSymbols(expr.free_symbols());
        let num = expr
            .numerator()
            .univariate_coeffs(LAPLACE_VAR)
            .ok_or_else(unresolved)?;
        let den = expr
            .denominator()
            .univariate_coeffs(LAPLACE_VAR)
            .ok_or_else(unresolved)?;

        let mut num = Polynomial::new(num).trimmed();
        let mut den = Polynomial::new(den).trimmed();
        if den.is_zero() {
            return Err(TransferFunctionError::ZeroDenominator);
        }

        if num.is_zero() {
            num = Polynomial::constant(0.0);
        } else {
            let common = num.gcd(&den, GCD_TOLERANCE);
            if common.degree() > 0 {
                debug!("cancelling common factor {:?}", common.coeffs());
                num = num.div_rem(&common).0;
                den = den.div_rem(&common).0;
            }
        }

        if den.leading() < 0.0 {
            num = num.scale(-1.0);
            den = den.scale(-1.0);
        }
        Ok(Self { num, den })
    }

    /// Builds the plant of `output(D)·y = input(D)·u` directly from its coefficient lists.
    ///
    /// The lists become numerator and denominator unchanged; no reduction is performed.
    ///
    /// # Errors
    /// - [`TransferFunctionError::CoefficientCount`] unless `output` has `order + 1` entries.
    /// - [`TransferFunctionError::EmptyInput`] if `input` is empty.
    /// - [`TransferFunctionError::ZeroDenominator`] if every output coefficient is zero.
    pub fn from_coefficients(
        order: usize,
        input: &[f64],
        output: &[f64],
    ) -> Result<Self, TransferFunctionError> {
        if output.len() != order + 1 {
            return Err(TransferFunctionError::CoefficientCount {
                order,
                expected: order + 1,
                found: output.len(),
            });
        }
        if input.is_empty() {
            return Err(TransferFunctionError::EmptyInput);
        }
        Self::new(input, output)
    }

    /// Numerator coefficients, highest power first.
    pub fn numerator(&self) -> &Polynomial {
        &self.num
    }

    /// Denominator coefficients, highest power first.
    pub fn denominator(&self) -> &Polynomial {
        &self.den
    }

    /// Roots of the denominator.
    pub fn poles(&self) -> Vec<Complex<f64>> {
        self.den.roots()
    }

    /// Roots of the numerator.
    pub fn zeros(&self) -> Vec<Complex<f64>> {
        self.num.roots()
    }

    /// Returns false iff some pole has a strictly positive real part.
    ///
    /// Poles on the imaginary axis count as stable. The comparison is strict up to the rounding
    /// of the computed roots: a real part below `1e4·ε·max(1, |p|)` is taken as zero.
    pub fn is_stable(&self) -> bool {
        let poles = self.poles();
        debug!("poles: {poles:?}");
        poles
            .iter()
            .all(|p| p.re <= AXIS_ROUNDING * p.norm().max(1.0))
    }

    /// Steady-state gain `G(0)`; infinite when there is a pole at the origin.
    pub fn dc_gain(&self) -> f64 {
        self.num.eval(0.0) / self.den.eval(0.0)
    }

    /// Evaluates `G(s)` at a complex frequency.
    pub fn eval(&self, s: Complex<f64>) -> Complex<f64> {
        self.num.eval_complex(s) / self.den.eval_complex(s)
    }

    /// True if the numerator degree does not exceed the denominator degree.
    pub fn is_proper(&self) -> bool {
        self.num.degree() <= self.den.degree()
    }

    /// The series connection `self · other`.
    pub fn series(&self, other: &TransferFunction) -> TransferFunction {
        Self {
            num: self.num.mul(&other.num),
            den: self.den.mul(&other.den),
        }
    }

    /// Closed loop `C·G / (1 + C·G)` of this plant under unity negative feedback with
    /// `controller` in the forward path.
    ///
    /// Only polynomial products and sums are formed; nothing is cancelled.
    ///
    /// # Errors
    /// [`TransferFunctionError::ZeroDenominator`] if `1 + C·G` is identically zero.
    pub fn feedback_unity(
        &self,
        controller: &TransferFunction,
    ) -> Result<TransferFunction, TransferFunctionError> {
        let open_loop = controller.series(self);
        let den = open_loop.den.add(&open_loop.num);
        Self::new(open_loop.num, den)
    }

    /// Response `G / (1 + C·G)` of the output to a disturbance entering at the plant input.
    ///
    /// # Errors
    /// [`TransferFunctionError::ZeroDenominator`] if `1 + C·G` is identically zero.
    pub fn disturbance_rejection(
        &self,
        controller: &TransferFunction,
    ) -> Result<TransferFunction, TransferFunctionError> {
        let num = self.num.mul(&controller.den);
        let den = controller
            .den
            .mul(&self.den)
            .add(&controller.num.mul(&self.num));
        Self::new(num, den)
    }
}

impl fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::fraction(self.num.coeffs(), self.den.coeffs()))
    }
}

/// Parses a whitespace-separated list of coefficients, e.g. `"1 -0,5 2"`.
///
/// Either `.` or `,` may be used as the decimal separator.
pub fn parse_coefficients(text: &str) -> Result<Vec<f64>, TransferFunctionError> {
    text.split_whitespace()
        .map(|token| {
            token
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|c| c.is_finite())
                .ok_or_else(|| TransferFunctionError::InvalidCoefficient(token.to_string()))
        })
        .collect()
}

/// Parses the order of a differential equation, a non-negative integer.
pub fn parse_order(text: &str) -> Result<usize, TransferFunctionError> {
    text.trim()
        .parse()
        .map_err(|_| TransferFunctionError::InvalidOrder(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_denominator() {
        assert_eq!(
            TransferFunction::new(vec![1.0], vec![0.0, 0.0]),
            Err(TransferFunctionError::ZeroDenominator)
        );
    }

    #[test]
    fn test_parse_coefficients() {
        assert_eq!(parse_coefficients(" 1 -0,5  2.25 "), Ok(vec![1.0, -0.5, 2.25]));
        assert_eq!(parse_coefficients(""), Ok(vec![]));
        assert_eq!(
            parse_coefficients("1 x"),
            Err(TransferFunctionError::InvalidCoefficient("x".to_string()))
        );
        assert!(parse_coefficients("inf").is_err());
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order(" 2\n"), Ok(2));
        assert_eq!(
            parse_order("-1"),
            Err(TransferFunctionError::InvalidOrder("-1".to_string()))
        );
    }

    #[test]
    fn test_display_uses_fraction_layout() {
        let tf = TransferFunction::new(vec![2.0], vec![10.0, 1.0]).unwrap();
        assert_eq!(tf.to_string(), "2\n――――――――\n10s¹ + 1");
    }
}
