// Unit-step response simulation of linear transfer functions
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
use nalgebra as na;

use crate::tf::TransferFunction;

/// Span of the default simulation grid.
pub const DEFAULT_FINAL_TIME: f64 = 75.0;

/// Number of samples in the default simulation grid.
pub const DEFAULT_SAMPLES: usize = 2000;

/// Failure to produce or accept a sampled response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// The simulated output overflowed or became NaN.
    #[error("the response became non-finite at sample {index}")]
    NonFinite {
        /// First sample that is not finite.
        index: usize,
    },

    /// The numerator degree exceeds the denominator degree.
    #[error("cannot simulate an improper transfer function (numerator degree {num} > denominator degree {den})")]
    Improper {
        /// Numerator degree.
        num: usize,
        /// Denominator degree.
        den: usize,
    },

    /// The grid span or sample count is invalid.
    #[error("a time grid needs a positive, finite final time and at least two samples (got {final_time}, {samples})")]
    InvalidGrid {
        /// The rejected span.
        final_time: f64,
        /// The rejected sample count.
        samples: usize,
    },

    /// Times and outputs do not form a valid trace.
    #[error("a step response needs strictly increasing times and one output per time, with at least two samples")]
    InvalidTrace,
}

/// Evenly spaced sample times `0, h, 2h, ..., final_time`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeGrid {
    final_time: f64,
    samples: usize,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            final_time: DEFAULT_FINAL_TIME,
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl TimeGrid {
    /// Creates a grid of `samples` points spanning `[0, final_time]`.
    ///
    /// # Returns
    /// - `Ok(grid)` if `final_time` is positive and finite and `samples >= 2`.
    /// - `Err(SimulationError::InvalidGrid)` otherwise.
    pub fn new(final_time: f64, samples: usize) -> Result<Self, SimulationError> {
        if !(final_time.is_finite() && final_time > 0.0) || samples < 2 {
            return Err(SimulationError::InvalidGrid {
                final_time,
                samples,
            });
        }
        Ok(Self {
            final_time,
            samples,
        })
    }

    /// Last sample time.
    pub fn final_time(&self) -> f64 {
        self.final_time
    }

    /// Number of samples, including both ends.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Spacing between consecutive samples.
    pub fn step(&self) -> f64 {
        self.final_time / (self.samples - 1) as f64
    }

    /// The sample times. The first is exactly 0 and the last exactly `final_time`.
    pub fn times(&self) -> Vec<f64> {
        let last = (self.samples - 1) as f64;
        (0..self.samples)
            .map(|i| self.final_time * i as f64 / last)
            .collect()
    }
}

/// A sampled response: output values paired with strictly increasing times.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResponse {
    time: Vec<f64>,
    output: Vec<f64>,
}

impl StepResponse {
    /// Pairs a time sequence with the output observed at each time.
    ///
    /// # Returns
    /// - `Ok(response)` if both have the same length of at least two and time strictly
    ///   increases.
    /// - `Err(SimulationError::InvalidTrace)` otherwise.
    pub fn new(time: Vec<f64>, output: Vec<f64>) -> Result<Self, SimulationError> {
        let increasing = time.windows(2).all(|w| w[1] > w[0]);
        if time.len() != output.len() || time.len() < 2 || !increasing {
            return Err(SimulationError::InvalidTrace);
        }
        Ok(Self { time, output })
    }

    /// Sample times.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Output at each sample time.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false for a constructed response.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The last output sample, taken as the steady-state value.
    pub fn final_value(&self) -> f64 {
        self.output[self.output.len() - 1]
    }

    /// Derivative of the output with respect to time.
    ///
    /// Interior points use second-order central differences that account for uneven spacing;
    /// the two end points use first-order one-sided differences.
    pub fn gradient(&self) -> Vec<f64> {
        let (t, y) = (&self.time, &self.output);
        let n = t.len();
        let mut grad = Vec::with_capacity(n);
        grad.push((y[1] - y[0]) / (t[1] - t[0]));
        for i in 1..n - 1 {
            let hs = t[i] - t[i - 1];
            let hd = t[i + 1] - t[i];
            grad.push(
                (hs * hs * y[i + 1] + (hd * hd - hs * hs) * y[i] - hd * hd * y[i - 1])
                    / (hs * hd * (hd + hs)),
            );
        }
        grad.push((y[n - 1] - y[n - 2]) / (t[n - 1] - t[n - 2]));
        grad
    }

    /// First time at which the output reaches `target`, linearly interpolated between samples.
    ///
    /// Returns `None` if the output never reaches it.
    pub fn time_to_reach(&self, target: f64) -> Option<f64> {
        let (t, y) = (&self.time, &self.output);
        if y[0] == target {
            return Some(t[0]);
        }
        (1..y.len()).find_map(|k| {
            let (lo, hi) = (y[k - 1] - target, y[k] - target);
            if lo * hi > 0.0 || y[k] == y[k - 1] {
                return None;
            }
            let fraction = lo / (lo - hi);
            Some(t[k - 1] + fraction * (t[k] - t[k - 1]))
        })
    }
}

/// Controllable canonical state-space realisation of a proper transfer function.
///
/// For `G(s) = (b₀sⁿ + ... + bₙ) / (sⁿ + a₁sⁿ⁻¹ + ... + aₙ)` (normalised so the denominator is
/// monic):
/// ┌    ┐   ┌                     ┐┌    ┐   ┌   ┐
/// │ x₁'│   │ -a₁  -a₂  ...  -aₙ  ││ x₁ │   │ 1 │
/// │ x₂'│ = │  1    0   ...   0   ││ x₂ │ + │ 0 │ u
/// │ ...│   │       ...           ││ ...│   │...│
/// │ xₙ'│   │  0   ...   1    0   ││ xₙ │   │ 0 │
/// └    ┘   └                     ┘└    ┘   └   ┘
///
/// y = [b₁ - a₁b₀  ...  bₙ - aₙb₀] x + b₀ u
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpace {
    a: na::DMatrix<f64>,
    b: na::DVector<f64>,
    c: na::DVector<f64>,
    d: f64,
}

impl StateSpace {
    /// Realises `tf` in controllable canonical form.
    ///
    /// # Errors
    /// [`SimulationError::Improper`] if the numerator degree exceeds the denominator degree.
    pub fn from_transfer_function(tf: &TransferFunction) -> Result<Self, SimulationError> {
        let num = tf.numerator().trimmed();
        let den = tf.denominator().trimmed();
        let n = den.degree();
        if !num.is_zero() && num.degree() > n {
            return Err(SimulationError::Improper {
                num: num.degree(),
                den: n,
            });
        }

        let lead = den.leading();
        let a: Vec<f64> = den.coeffs()[1..].iter().map(|c| c / lead).collect();
        let mut b = vec![0.0; n + 1 - num.coeffs().len()];
        b.extend(num.coeffs().iter().map(|c| c / lead));

        let d = b[0];
        let mut mat_a = na::DMatrix::zeros(n, n);
        for j in 0..n {
            mat_a[(0, j)] = -a[j];
        }
        for i in 1..n {
            mat_a[(i, i - 1)] = 1.0;
        }
        let mut vec_b = na::DVector::zeros(n);
        if n > 0 {
            vec_b[0] = 1.0;
        }
        let vec_c = na::DVector::from_iterator(n, (0..n).map(|i| b[i + 1] - a[i] * d));

        Ok(Self {
            a: mat_a,
            b: vec_b,
            c: vec_c,
            d,
        })
    }

    /// Number of states.
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// State derivative `x' = Ax + Bu`.
    pub fn f(&self, x: &na::DVector<f64>, u: f64) -> na::DVector<f64> {
        &self.a * x + &self.b * u
    }

    /// Output `y = Cx + Du`.
    pub fn h(&self, x: &na::DVector<f64>, u: f64) -> f64 {
        self.c.dot(x) + self.d * u
    }

    /// Exact zero-order-hold discretisation with sample period `dt`, returning `(Ad, Bd)`.
    ///
    /// Both come from the exponential of the augmented matrix `[[A, B], [0, 0]]·dt`.
    pub fn discretize(&self, dt: f64) -> (na::DMatrix<f64>, na::DVector<f64>) {
        let n = self.order();
        let mut augmented = na::DMatrix::zeros(n + 1, n + 1);
        augmented.view_mut((0, 0), (n, n)).copy_from(&(&self.a * dt));
        augmented.view_mut((0, n), (n, 1)).copy_from(&(&self.b * dt));
        let transition = augmented.exp();
        let ad = transition.view((0, 0), (n, n)).into_owned();
        let bd = transition.view((0, n), (n, 1)).column(0).into_owned();
        (ad, bd)
    }
}

/// Simulates the response of `tf` to a unit step applied at `t = 0`, sampled on `grid`.
///
/// The input is held constant between samples, so the discretisation is exact and stays
/// stable for stiff closed loops with very large gains.
///
/// # Errors
/// - [`SimulationError::Improper`] if `tf` has more zeros than poles.
/// - [`SimulationError::NonFinite`] if the output overflows.
pub fn step_response(
    tf: &TransferFunction,
    grid: &TimeGrid,
) -> Result<StepResponse, SimulationError> {
    let ss = StateSpace::from_transfer_function(tf)?;
    let time = grid.times();
    debug!(
        "simulating a {}-state system over {} samples up to t = {}",
        ss.order(),
        grid.samples(),
        grid.final_time()
    );

    let (ad, bd) = ss.discretize(grid.step());
    let mut x = na::DVector::zeros(ss.order());
    let mut output = Vec::with_capacity(time.len());
    for index in 0..time.len() {
        let y = ss.h(&x, 1.0);
        if !y.is_finite() {
            return Err(SimulationError::NonFinite { index });
        }
        output.push(y);
        x = &ad * &x + &bd;
    }
    StepResponse::new(time, output)
}
