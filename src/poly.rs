// Dense univariate polynomials with real coefficients
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

use nalgebra as na;
use num_traits::Zero;

use na::Complex;

/// A polynomial in one variable, stored as coefficients in descending power order.
///
/// Index 0 holds the coefficient of the highest power, so `[2.0, 0.0, 1.0]` is `2x² + 1`.
/// Leading zeros are kept as given; use [`Polynomial::trimmed`] to drop them. The leading
/// coefficient is never assumed to be 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial(Vec<f64>);

impl Polynomial {
    /// Creates a polynomial from descending coefficients. An empty list is the zero polynomial.
    pub fn new(coeffs: Vec<f64>) -> Self {
        if coeffs.is_empty() {
            Polynomial(vec![0.0])
        } else {
            Polynomial(coeffs)
        }
    }

    /// The constant polynomial `c`.
    pub fn constant(c: f64) -> Self {
        Polynomial(vec![c])
    }

    /// Returns the coefficients, highest power first.
    pub fn coeffs(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the polynomial, returning its coefficients.
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    /// Returns true if every coefficient is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    /// Returns a copy without leading zero coefficients. The zero polynomial trims to `[0.0]`.
    pub fn trimmed(&self) -> Self {
        self.trimmed_below(0.0)
    }

    /// Drops leading coefficients whose magnitude does not exceed `eps`.
    fn trimmed_below(&self, eps: f64) -> Self {
        match self.0.iter().position(|c| c.abs() > eps) {
            Some(first) => Polynomial(self.0[first..].to_vec()),
            None => Polynomial(vec![0.0]),
        }
    }

    /// Degree of the polynomial, ignoring leading zeros. The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.trimmed().0.len() - 1
    }

    /// First non-zero coefficient, or 0 for the zero polynomial.
    pub fn leading(&self) -> f64 {
        self.trimmed().0[0]
    }

    /// Multiplies every coefficient by `k`.
    pub fn scale(&self, k: f64) -> Self {
        Polynomial(self.0.iter().map(|c| c * k).collect())
    }

    /// Full product of two polynomials. No trimming is done, so the result has
    /// `len(a) + len(b) - 1` coefficients.
    pub fn mul(&self, other: &Polynomial) -> Self {
        let mut out = vec![0.0; self.0.len() + other.0.len() - 1];
        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in other.0.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial(out)
    }

    /// Sum of two polynomials, aligned on the constant term. The shorter operand is padded on
    /// the left.
    pub fn add(&self, other: &Polynomial) -> Self {
        let len = self.0.len().max(other.0.len());
        let mut out = vec![0.0; len];
        for (dst, src) in out[len - self.0.len()..].iter_mut().zip(&self.0) {
            *dst += src;
        }
        for (dst, src) in out[len - other.0.len()..].iter_mut().zip(&other.0) {
            *dst += src;
        }
        Polynomial(out)
    }

    /// Evaluates the polynomial at a real point using Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.0.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Evaluates the polynomial at a complex point using Horner's scheme.
    pub fn eval_complex(&self, z: Complex<f64>) -> Complex<f64> {
        self.0
            .iter()
            .fold(Complex::zero(), |acc, &c| acc * z + Complex::new(c, 0.0))
    }

    /// Computes all complex roots.
    ///
    /// Roots at the origin (trailing zero coefficients) are split off first. Degrees one and two
    /// are solved in closed form so that, e.g., `s² + 1` yields roots with a real part of exactly
    /// zero; higher degrees use the eigenvalues of the companion matrix.
    pub fn roots(&self) -> Vec<Complex<f64>> {
        let p = self.trimmed();
        if p.is_zero() {
            return Vec::new();
        }

        let trailing = p.0.iter().rev().take_while(|&&c| c == 0.0).count();
        let core = &p.0[..p.0.len() - trailing];
        let mut roots = vec![Complex::new(0.0, 0.0); trailing];

        match core.len() - 1 {
            0 => {}
            1 => roots.push(Complex::new(-core[1] / core[0], 0.0)),
            2 => roots.extend(quadratic_roots(core[0], core[1], core[2])),
            n => {
                let mut companion = na::DMatrix::<f64>::zeros(n, n);
                for j in 0..n {
                    companion[(0, j)] = -core[j + 1] / core[0];
                }
                for i in 1..n {
                    companion[(i, i - 1)] = 1.0;
                }
                roots.extend(companion.complex_eigenvalues().iter().copied());
            }
        }
        roots
    }

    /// Polynomial long division. Returns `(quotient, remainder)`.
    ///
    /// The divisor must not be the zero polynomial; dividing by zero returns `(0, self)`.
    pub fn div_rem(&self, divisor: &Polynomial) -> (Polynomial, Polynomial) {
        let num = self.trimmed();
        let den = divisor.trimmed();
        if den.is_zero() || num.0.len() < den.0.len() {
            return (Polynomial::constant(0.0), num);
        }

        let mut rem = num.0.clone();
        let lead = den.0[0];
        let q_len = num.0.len() - den.0.len() + 1;
        let mut quotient = vec![0.0; q_len];
        for i in 0..q_len {
            let factor = rem[i] / lead;
            quotient[i] = factor;
            for (j, d) in den.0.iter().enumerate() {
                rem[i + j] -= factor * d;
            }
        }
        let rem = rem[q_len..].to_vec();
        (Polynomial(quotient), Polynomial::new(rem))
    }

    /// Returns this polynomial divided by its leading coefficient.
    pub fn monic(&self) -> Self {
        let p = self.trimmed();
        let lead = p.0[0];
        if lead == 0.0 {
            return p;
        }
        p.scale(1.0 / lead)
    }

    /// Monic greatest common divisor, computed with the Euclidean algorithm.
    ///
    /// A remainder is treated as zero once all of its coefficients fall below `tolerance`
    /// relative to the largest coefficient of the current dividend.
    pub fn gcd(&self, other: &Polynomial, tolerance: f64) -> Polynomial {
        let mut a = self.monic();
        let mut b = other.monic();
        if a.0.len() < b.0.len() {
            core::mem::swap(&mut a, &mut b);
        }
        if b.is_zero() {
            return a;
        }

        loop {
            let (_, r) = a.div_rem(&b);
            let scale = a.0.iter().fold(1.0_f64, |m, c| m.max(c.abs()));
            let r = r.trimmed_below(tolerance * scale);
            if r.is_zero() {
                return b;
            }
            a = b;
            b = r.monic();
        }
    }
}

impl From<Vec<f64>> for Polynomial {
    fn from(coeffs: Vec<f64>) -> Self {
        Polynomial::new(coeffs)
    }
}

impl From<&[f64]> for Polynomial {
    fn from(coeffs: &[f64]) -> Self {
        Polynomial::new(coeffs.to_vec())
    }
}

/// Roots of `a x² + b x + c` using the cancellation-free form of the quadratic formula.
fn quadratic_roots(a: f64, b: f64, c: f64) -> [Complex<f64>; 2] {
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        let sign = if b >= 0.0 { 1.0 } else { -1.0 };
        let q = -0.5 * (b + sign * disc.sqrt());
        let r1 = q / a;
        let r2 = if q == 0.0 { 0.0 } else { c / q };
        [Complex::new(r1, 0.0), Complex::new(r2, 0.0)]
    } else {
        let re = -b / (2.0 * a);
        let im = ((-disc).sqrt() / (2.0 * a)).abs();
        [Complex::new(re, im), Complex::new(re, -im)]
    }
}
