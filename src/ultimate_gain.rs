// Ultimate-gain identification from the frequency response
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
use crate::margin::gain_margin;
use crate::tf::TransferFunction;
use crate::tuning::{Tuning, TuningError, TuningParameters, UltimateGain};

/// Finds the ultimate gain `Ku` and period `Pu` of `plant`.
///
/// `Ku` is the gain margin. The period comes from the phase-crossover frequency `wc` as
/// `Pu = 2π/wc`. When there is no positive crossover frequency, `wc` is instead read from the
/// closed-loop characteristic polynomial `den + Ku·num`: the first root within the configured
/// tolerance of the imaginary axis with a positive imaginary part.
///
/// # Errors
/// - [`TuningError::InsufficientGainMargin`] if `Ku` is not finite or `Ku ≤ 1`.
/// - [`TuningError::UnresolvableFrequency`] if the fallback finds no such root.
pub fn identify(
    plant: &TransferFunction,
    config: &AnalysisConfig,
) -> Result<UltimateGain, TuningError> {
    let margin = gain_margin(plant);
    let ku = margin.gain;
    debug!("gain margin {ku} at ω = {}", margin.frequency);
    if !ku.is_finite() || ku <= 1.0 {
        return Err(TuningError::InsufficientGainMargin { ku });
    }

    let mut wc = margin.frequency;
    if !(wc.is_finite() && wc > 0.0) {
        warn!("no positive phase-crossover frequency; searching the closed-loop poles at Ku = {ku:.3}");
        wc = oscillation_frequency(plant, ku, config.axis_tolerance())
            .ok_or(TuningError::UnresolvableFrequency { ku })?;
    }

    Ok(UltimateGain::from_frequency(ku, wc))
}

/// Frequency at which the unity-feedback loop around `plant` oscillates with gain `ku`.
///
/// Returns the imaginary part of the first root of `den + ku·num` whose real part is within
/// `tolerance` of zero and whose imaginary part is positive, or `None` if no root qualifies.
pub fn oscillation_frequency(plant: &TransferFunction, ku: f64, tolerance: f64) -> Option<f64> {
    let characteristic = plant.denominator().add(&plant.numerator().scale(ku));
    characteristic
        .roots()
        .into_iter()
        .find(|p| p.re.abs() < tolerance && p.im > 0.0)
        .map(|p| p.im)
}

/// Identifies `Ku`, `Pu` and applies the ultimate-gain rule.
pub fn tune(plant: &TransferFunction, config: &AnalysisConfig) -> Result<Tuning, TuningError> {
    let ultimate = identify(plant, config)?;
    let controller = ultimate.gains()?;

    info!("Ziegler-Nichols ultimate gain:");
    info!("  Ultimate gain (Ku): {:.3}", ultimate.ku);
    info!("  Ultimate period (Pu): {:.3}", ultimate.pu);
    info!("  Calculated Kp: {:.6}", controller.kp());
    info!("  Calculated Ki: {:.6}", controller.ki());
    info!("  Calculated Kd: {:.6}", controller.kd());

    Ok(Tuning {
        parameters: TuningParameters::UltimateGain(ultimate),
        controller,
    })
}
