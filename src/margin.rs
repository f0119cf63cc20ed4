// Gain margin and phase-crossover frequency
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
use nalgebra::Complex;

use crate::poly::Polynomial;
use crate::tf::TransferFunction;

/// Roots of the phase polynomial whose imaginary part is within this fraction of their
/// magnitude count as real frequencies.
const REAL_ROOT_TOLERANCE: f64 = 1e-8;

/// Gain margin of a loop and the frequency at which it is attained.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GainMargin {
    /// Factor by which the loop gain may grow before the closed loop reaches the stability
    /// boundary. Infinite when the phase never crosses −180°.
    pub gain: f64,
    /// Phase-crossover frequency at which `gain` is attained; NaN when there is none.
    pub frequency: f64,
}

/// Splits `p(jω)` into real and imaginary parts, each a real polynomial in `ω`.
fn split_on_imaginary_axis(p: &Polynomial) -> (Polynomial, Polynomial) {
    let n = p.coeffs().len();
    let mut re = vec![0.0; n];
    let mut im = vec![0.0; n];
    for (i, &c) in p.coeffs().iter().enumerate() {
        // jᵏ cycles through 1, j, −1, −j
        match (n - 1 - i) % 4 {
            0 => re[i] = c,
            1 => im[i] = c,
            2 => re[i] = -c,
            _ => im[i] = -c,
        }
    }
    (Polynomial::new(re), Polynomial::new(im))
}

/// Computes the gain margin of `tf` under unity negative feedback.
///
/// Phase crossovers are the frequencies `ω ≥ 0` at which `G(jω)` is real and negative. They are
/// found as the real roots of `Im{num(jω)·den(−jω)}`, which has the same sign as `Im{G(jω)}`.
/// The margin is the smallest `1/|G(jω)|` over all crossovers.
pub fn gain_margin(tf: &TransferFunction) -> GainMargin {
    let (num_re, num_im) = split_on_imaginary_axis(tf.numerator());
    let (den_re, den_im) = split_on_imaginary_axis(tf.denominator());
    // Im{(a + jb)(c − jd)} = bc − ad
    let phase = num_im.mul(&den_re).add(&num_re.mul(&den_im).scale(-1.0));

    let mut margin = GainMargin {
        gain: f64::INFINITY,
        frequency: f64::NAN,
    };
    if phase.trimmed().is_zero() {
        debug!("G(jω) is real at every frequency; no isolated phase crossover");
        return margin;
    }

    for root in phase.roots() {
        if root.im.abs() > REAL_ROOT_TOLERANCE * root.norm().max(1.0) {
            continue;
        }
        if root.re < -REAL_ROOT_TOLERANCE {
            continue;
        }
        let omega = root.re.max(0.0);
        let response = tf.eval(Complex::new(0.0, omega));
        if !(response.re < 0.0) {
            continue;
        }
        let gain = 1.0 / response.norm();
        debug!("phase crossover at ω = {omega}, |G| = {}", response.norm());
        if gain < margin.gain {
            margin = GainMargin {
                gain,
                frequency: omega,
            };
        }
    }
    margin
}
