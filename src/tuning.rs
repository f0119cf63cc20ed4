// Ziegler–Nichols tuning parameters and gain rules
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

use core::f64::consts::PI;
use core::fmt;

use crate::pid::{PidController, PidError};

/// Failure of a tuner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TuningError {
    /// The step response never rises steeply enough for a tangent.
    #[error("the steepest slope of the step response ({slope:e}) is below {threshold:e}; the reaction-curve method is inapplicable")]
    FlatResponse {
        /// Steepest slope found.
        slope: f64,
        /// Configured minimum.
        threshold: f64,
    },

    /// The 63 % level is never crossed.
    #[error("the step response never reaches {level}; the time constant cannot be read off")]
    LevelNotReached {
        /// Output level that was searched for.
        level: f64,
    },

    /// Proportional feedback cannot drive the loop to oscillation.
    #[error("the gain margin ({ku}) is not a finite value above 1; the ultimate-gain method is inapplicable")]
    InsufficientGainMargin {
        /// The gain margin.
        ku: f64,
    },

    /// No closed-loop pole at `Ku` lies on the imaginary axis.
    #[error("could not find the oscillation frequency of the closed loop at Ku = {ku:.3}")]
    UnresolvableFrequency {
        /// The ultimate gain.
        ku: f64,
    },

    /// The tuning rule produced a gain that is not finite.
    #[error(transparent)]
    Pid(#[from] PidError),
}

impl TuningError {
    /// True when the chosen method does not apply to the plant, as opposed to a numerical
    /// failure.
    pub fn is_inapplicable(&self) -> bool {
        matches!(
            self,
            TuningError::FlatResponse { .. } | TuningError::InsufficientGainMargin { .. }
        )
    }
}

/// Which identification experiment the tuner runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Method {
    /// Tangent at the steepest point of the open-loop step response.
    #[default]
    ReactionCurve,
    /// Gain margin and oscillation period at the stability boundary.
    UltimateGain,
}

/// Gain formulas for a reaction-curve process model.
///
/// Both share `Kp = 1.2·T/L` and differ in the integral and derivative gains.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ReactionCurveRule {
    /// `Ki = Kp/(2L)`, `Kd = Kp·0.5L`: the classic rule with `Ti = 2L`, `Td = 0.5L`.
    #[default]
    GainForm,
    /// `Ki = 2L`, `Kd = 0.5L`, taken as absolute gains.
    AbsoluteForm,
}

/// How the time constant `T` is read from the step response.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TimeConstantMethod {
    /// `T = K/m`, with `m` the steepest slope.
    #[default]
    Tangent,
    /// `T = t(0.63·K) − L`.
    SixtyThreePercent,
}

/// First-order-plus-delay approximation `K·e^(−Ls)/(Ts + 1)` of a plant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProcessModel {
    /// Static gain.
    pub k: f64,
    /// Apparent delay.
    pub l: f64,
    /// Time constant.
    pub t: f64,
}

/// Ultimate gain and period of a plant under proportional feedback.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UltimateGain {
    /// Proportional gain at which the loop reaches the stability boundary.
    pub ku: f64,
    /// Period of the resulting oscillation.
    pub pu: f64,
}

/// What a tuner identified, depending on the method.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TuningParameters {
    /// Result of the reaction-curve method.
    ReactionCurve(ProcessModel),
    /// Result of the ultimate-gain method.
    UltimateGain(UltimateGain),
}

/// Identified parameters together with the controller derived from them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tuning {
    /// The identified parameters.
    pub parameters: TuningParameters,
    /// Gains derived from them.
    pub controller: PidController,
}

impl ReactionCurveRule {
    /// Applies the rule to `model`.
    ///
    /// # Errors
    /// [`TuningError::Pid`] if a gain is not finite, e.g. for `L = 0`.
    pub fn gains(&self, model: &ProcessModel) -> Result<PidController, TuningError> {
        let ProcessModel { l, t, .. } = *model;
        let kp = 1.2 * t / l;
        let controller = match self {
            ReactionCurveRule::GainForm => PidController::new(kp, kp / (2.0 * l), kp * (0.5 * l))?,
            ReactionCurveRule::AbsoluteForm => PidController::new(kp, 2.0 * l, 0.5 * l)?,
        };
        Ok(controller)
    }
}

impl UltimateGain {
    /// Classic ultimate-gain rule: `Kp = 0.6·Ku`, `Ti = 0.5·Pu`, `Td = 0.125·Pu`.
    pub fn gains(&self) -> Result<PidController, TuningError> {
        let kp = 0.6 * self.ku;
        Ok(PidController::new(kp, kp / (0.5 * self.pu), kp * (0.125 * self.pu))?)
    }

    /// Ultimate gain with the period of an oscillation at `frequency` rad per time unit.
    pub fn from_frequency(ku: f64, frequency: f64) -> Self {
        UltimateGain {
            ku,
            pu: 2.0 * PI / frequency,
        }
    }
}

impl fmt::Display for TuningParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningParameters::ReactionCurve(m) => {
                write!(f, "K = {:.3} | L = {:.3} | T = {:.3}", m.k, m.l, m.t)
            }
            TuningParameters::UltimateGain(u) => {
                write!(f, "Ku = {:.3} | Pu = {:.3}", u.ku, u.pu)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rules_share_proportional_gain() {
        let model = ProcessModel {
            k: 2.0,
            l: 0.5,
            t: 4.0,
        };
        let gain_form = ReactionCurveRule::GainForm.gains(&model).unwrap();
        let absolute = ReactionCurveRule::AbsoluteForm.gains(&model).unwrap();
        assert_relative_eq!(gain_form.kp(), absolute.kp());
        assert_relative_eq!(absolute.ki(), 1.0);
        assert_relative_eq!(absolute.kd(), 0.25);
    }

    #[test]
    fn test_period_from_frequency() {
        let u = UltimateGain::from_frequency(8.0, PI);
        assert_relative_eq!(u.pu, 2.0);
    }

    #[test]
    fn test_display() {
        let p = TuningParameters::UltimateGain(UltimateGain { ku: 4.0, pu: 2.0 });
        assert_eq!(p.to_string(), "Ku = 4.000 | Pu = 2.000");
    }
}
