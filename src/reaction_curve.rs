// Reaction-curve identification from an open-loop step response
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

use log::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::sim::StepResponse;
use crate::tuning::{ProcessModel, TimeConstantMethod, Tuning, TuningError, TuningParameters};

/// Fraction of the final value at which the 63 % method reads off `L + T`.
const TIME_CONSTANT_LEVEL: f64 = 0.63;

/// Fits a first-order-plus-delay model to `response` using the tangent at its steepest point.
///
/// `K` is the last output sample. With `m` the largest slope, reached at `(t, y)`, the delay is
/// `L = t − y/m` and the time constant is `T = K/m` (or `t(0.63·K) − L` with
/// [`TimeConstantMethod::SixtyThreePercent`]). Non-positive estimates are raised to the
/// configured delay floor.
///
/// # Errors
/// - [`TuningError::FlatResponse`] if `m` is below the configured slope threshold.
/// - [`TuningError::LevelNotReached`] if the 63 % level is never crossed.
pub fn identify(
    response: &StepResponse,
    config: &AnalysisConfig,
) -> Result<ProcessModel, TuningError> {
    let k = response.final_value();
    let gradient = response.gradient();

    // First maximum wins on ties
    let (index, slope) = gradient
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, g)| {
            if g > best.1 {
                (i, g)
            } else {
                best
            }
        });
    if !(slope >= config.slope_threshold()) {
        return Err(TuningError::FlatResponse {
            slope,
            threshold: config.slope_threshold(),
        });
    }

    let t_inflection = response.time()[index];
    let y_inflection = response.output()[index];
    debug!("steepest slope {slope} at t = {t_inflection}, y = {y_inflection}");

    let raw_delay = t_inflection - y_inflection / slope;
    let raw_time_constant = match config.time_constant_method() {
        TimeConstantMethod::Tangent => k / slope,
        TimeConstantMethod::SixtyThreePercent => {
            let level = TIME_CONSTANT_LEVEL * k;
            let reached = response
                .time_to_reach(level)
                .ok_or(TuningError::LevelNotReached { level })?;
            reached - raw_delay
        }
    };

    let l = floored("delay L", raw_delay, config.delay_floor());
    let t = match config.time_constant_method() {
        TimeConstantMethod::Tangent => raw_time_constant,
        TimeConstantMethod::SixtyThreePercent => {
            floored("time constant T", raw_time_constant, config.delay_floor())
        }
    };
    Ok(ProcessModel { k, l, t })
}

fn floored(name: &str, value: f64, floor: f64) -> f64 {
    if value <= 0.0 {
        warn!("{name} estimated as {value:.3e}, raised to {floor:e}");
        floor
    } else {
        value
    }
}

/// Identifies the process model and applies the configured reaction-curve rule.
pub fn tune(response: &StepResponse, config: &AnalysisConfig) -> Result<Tuning, TuningError> {
    let model = identify(response, config)?;
    let controller = config.reaction_curve_rule().gains(&model)?;

    info!("Ziegler-Nichols reaction curve ({:?}):", config.reaction_curve_rule());
    info!("  Process gain (K): {:.3}", model.k);
    info!("  Delay (L): {:.3}", model.l);
    info!("  Time constant (T): {:.3}", model.t);
    info!("  Calculated Kp: {:.6}", controller.kp());
    info!("  Calculated Ki: {:.6}", controller.ki());
    info!("  Calculated Kd: {:.6}", controller.kd());

    Ok(Tuning {
        parameters: TuningParameters::ReactionCurve(model),
        controller,
    })
}
