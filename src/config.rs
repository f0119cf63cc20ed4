// Per-analysis configuration
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

use crate::sim::TimeGrid;
use crate::tuning::{Method, ReactionCurveRule, TimeConstantMethod};

/// Largest accepted value for [`AnalysisConfig::max_derivative_order`].
pub const MAX_DERIVATIVE_ORDER: u32 = 64;

/// A configuration value outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The simulated span is not positive and finite.
    #[error("final time must be positive and finite")]
    InvalidFinalTime,
    /// Fewer than two samples.
    #[error("the simulation needs at least two samples")]
    InvalidSampleCount,
    /// The delay floor is not positive and finite.
    #[error("delay floor must be positive and finite")]
    InvalidDelayFloor,
    /// The slope threshold is negative or not finite.
    #[error("slope threshold must be non-negative and finite")]
    InvalidSlopeThreshold,
    /// The axis tolerance is not positive and finite.
    #[error("axis tolerance must be positive and finite")]
    InvalidAxisTolerance,
    /// The highest derivative order exceeds [`MAX_DERIVATIVE_ORDER`].
    #[error("the highest derivative order may not exceed {MAX_DERIVATIVE_ORDER}")]
    InvalidDerivativeOrder,
}

/// Everything one analysis run can be tuned with.
///
/// Each run owns its configuration; nothing is read from global state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Sample times for every simulated response.
    /// Defaults to 2000 samples over 75 time units.
    grid: TimeGrid,

    /// Smallest delay `L` (and, for the 63 % method, time constant `T`) the reaction-curve
    /// tuner will use. Non-positive estimates are replaced by this value.
    /// Defaults to 1e-4.
    delay_floor: f64,

    /// Steepest slopes below this make the reaction-curve method inapplicable.
    /// Defaults to 1e-6.
    slope_threshold: f64,

    /// How close to the imaginary axis a closed-loop pole must lie for the ultimate-gain
    /// fallback to read an oscillation frequency from it.
    /// Defaults to 1e-5.
    axis_tolerance: f64,

    /// Highest derivative order recognised in an equation.
    /// Defaults to 10.
    max_derivative_order: u32,

    /// Which tuner runs. Defaults to the reaction curve.
    method: Method,

    /// Gain formulas applied to the reaction-curve process model.
    reaction_curve_rule: ReactionCurveRule,

    /// How the reaction-curve tuner estimates the time constant.
    time_constant_method: TimeConstantMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            grid: TimeGrid::default(),
            delay_floor: 1e-4,
            slope_threshold: 1e-6,
            axis_tolerance: 1e-5,
            max_derivative_order: 10,
            method: Method::default(),
            reaction_curve_rule: ReactionCurveRule::default(),
            time_constant_method: TimeConstantMethod::default(),
        }
    }
}

impl AnalysisConfig {
    /// Sample times shared by every simulated response.
    pub fn grid(&self) -> TimeGrid {
        self.grid
    }

    /// End of the simulated span.
    pub fn final_time(&self) -> f64 {
        self.grid.final_time()
    }

    /// Number of samples per response.
    pub fn samples(&self) -> usize {
        self.grid.samples()
    }

    /// Lower bound on the identified delay.
    pub fn delay_floor(&self) -> f64 {
        self.delay_floor
    }

    /// Smallest slope the reaction-curve tuner accepts.
    pub fn slope_threshold(&self) -> f64 {
        self.slope_threshold
    }

    /// Distance from the imaginary axis accepted by the ultimate-gain fallback.
    pub fn axis_tolerance(&self) -> f64 {
        self.axis_tolerance
    }

    /// Highest derivative order recognised in an equation.
    pub fn max_derivative_order(&self) -> u32 {
        self.max_derivative_order
    }

    /// The tuner to run.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Gain formulas for the reaction-curve tuner.
    pub fn reaction_curve_rule(&self) -> ReactionCurveRule {
        self.reaction_curve_rule
    }

    /// Time-constant estimate for the reaction-curve tuner.
    pub fn time_constant_method(&self) -> TimeConstantMethod {
        self.time_constant_method
    }

    /// Sets the span of the simulation grid, keeping the sample count.
    ///
    /// # Returns
    /// - `Ok(())` if the time was set successfully.
    /// - `Err(ConfigError::InvalidFinalTime)` if `final_time` is not positive and finite; the
    ///   old value is kept.
    pub fn set_final_time(&mut self, final_time: f64) -> Result<(), ConfigError> {
        self.grid = TimeGrid::new(final_time, self.grid.samples())
            .map_err(|_| ConfigError::InvalidFinalTime)?;
        Ok(())
    }

    /// Sets the number of simulation samples, keeping the span.
    ///
    /// # Returns
    /// - `Ok(())` if the count was set successfully.
    /// - `Err(ConfigError::InvalidSampleCount)` if `samples < 2`; the old value is kept.
    pub fn set_samples(&mut self, samples: usize) -> Result<(), ConfigError> {
        self.grid = TimeGrid::new(self.grid.final_time(), samples)
            .map_err(|_| ConfigError::InvalidSampleCount)?;
        Ok(())
    }

    /// Sets the delay floor.
    ///
    /// # Returns
    /// - `Ok(())` if the floor was set successfully.
    /// - `Err(ConfigError::InvalidDelayFloor)` if it is not positive and finite.
    pub fn set_delay_floor(&mut self, delay_floor: f64) -> Result<(), ConfigError> {
        if delay_floor <= 0.0 || !delay_floor.is_finite() {
            return Err(ConfigError::InvalidDelayFloor);
        }
        self.delay_floor = delay_floor;
        Ok(())
    }

    /// Sets the slope threshold.
    ///
    /// # Returns
    /// - `Ok(())` if the threshold was set successfully.
    /// - `Err(ConfigError::InvalidSlopeThreshold)` if it is negative or not finite.
    pub fn set_slope_threshold(&mut self, slope_threshold: f64) -> Result<(), ConfigError> {
        if slope_threshold < 0.0 || !slope_threshold.is_finite() {
            return Err(ConfigError::InvalidSlopeThreshold);
        }
        self.slope_threshold = slope_threshold;
        Ok(())
    }

    /// Sets the axis tolerance.
    ///
    /// # Returns
    /// - `Ok(())` if the tolerance was set successfully.
    /// - `Err(ConfigError::InvalidAxisTolerance)` if it is not positive and finite.
    pub fn set_axis_tolerance(&mut self, axis_tolerance: f64) -> Result<(), ConfigError> {
        if axis_tolerance <= 0.0 || !axis_tolerance.is_finite() {
            return Err(ConfigError::InvalidAxisTolerance);
        }
        self.axis_tolerance = axis_tolerance;
        Ok(())
    }

    /// Sets the highest derivative order recognised in an equation.
    ///
    /// # Returns
    /// - `Ok(())` if the order was set successfully.
    /// - `Err(ConfigError::InvalidDerivativeOrder)` if it exceeds [`MAX_DERIVATIVE_ORDER`].
    pub fn set_max_derivative_order(
        &mut self,
        max_derivative_order: u32,
    ) -> Result<(), ConfigError> {
        if max_derivative_order > MAX_DERIVATIVE_ORDER {
            return Err(ConfigError::InvalidDerivativeOrder);
        }
        self.max_derivative_order = max_derivative_order;
        Ok(())
    }

    /// Selects the tuner.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Selects the reaction-curve gain formulas.
    pub fn set_reaction_curve_rule(&mut self, rule: ReactionCurveRule) {
        self.reaction_curve_rule = rule;
    }

    /// Selects the reaction-curve time-constant estimate.
    pub fn set_time_constant_method(&mut self, time_constant_method: TimeConstantMethod) {
        self.time_constant_method = time_constant_method;
    }
}

/// Collects configuration values and validates them all at once in [`build`](Self::build).
#[derive(Copy, Clone, Debug)]
pub struct AnalysisConfigBuilder {
    final_time: f64,
    samples: usize,
    delay_floor: f64,
    slope_threshold: f64,
    axis_tolerance: f64,
    max_derivative_order: u32,
    method: Method,
    reaction_curve_rule: ReactionCurveRule,
    time_constant_method: TimeConstantMethod,
}

impl Default for AnalysisConfigBuilder {
    fn default() -> Self {
        let config = AnalysisConfig::default();
        AnalysisConfigBuilder {
            final_time: config.final_time(),
            samples: config.samples(),
            delay_floor: config.delay_floor,
            slope_threshold: config.slope_threshold,
            axis_tolerance: config.axis_tolerance,
            max_derivative_order: config.max_derivative_order,
            method: config.method,
            reaction_curve_rule: config.reaction_curve_rule,
            time_constant_method: config.time_constant_method,
        }
    }
}

impl AnalysisConfigBuilder {
    /// See [`AnalysisConfig::set_final_time`].
    pub fn final_time(mut self, final_time: f64) -> Self {
        self.final_time = final_time;
        self
    }

    /// See [`AnalysisConfig::set_samples`].
    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// See [`AnalysisConfig::set_delay_floor`].
    pub fn delay_floor(mut self, delay_floor: f64) -> Self {
        self.delay_floor = delay_floor;
        self
    }

    /// See [`AnalysisConfig::set_slope_threshold`].
    pub fn slope_threshold(mut self, slope_threshold: f64) -> Self {
        self.slope_threshold = slope_threshold;
        self
    }

    /// See [`AnalysisConfig::set_axis_tolerance`].
    pub fn axis_tolerance(mut self, axis_tolerance: f64) -> Self {
        self.axis_tolerance = axis_tolerance;
        self
    }

    /// See [`AnalysisConfig::set_max_derivative_order`].
    pub fn max_derivative_order(mut self, max_derivative_order: u32) -> Self {
        self.max_derivative_order = max_derivative_order;
        self
    }

    /// See [`AnalysisConfig::set_method`].
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// See [`AnalysisConfig::set_reaction_curve_rule`].
    pub fn reaction_curve_rule(mut self, rule: ReactionCurveRule) -> Self {
        self.reaction_curve_rule = rule;
        self
    }

    /// See [`AnalysisConfig::set_time_constant_method`].
    pub fn time_constant_method(mut self, time_constant_method: TimeConstantMethod) -> Self {
        self.time_constant_method = time_constant_method;
        self
    }

    /// Validates every field, reporting the first invalid one.
    pub fn build(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = AnalysisConfig::default();
        config.set_final_time(self.final_time)?;
        config.set_samples(self.samples)?;
        config.set_delay_floor(self.delay_floor)?;
        config.set_slope_threshold(self.slope_threshold)?;
        config.set_axis_tolerance(self.axis_tolerance)?;
        config.set_max_derivative_order(self.max_derivative_order)?;
        config.set_method(self.method);
        config.set_reaction_curve_rule(self.reaction_curve_rule);
        config.set_time_constant_method(self.time_constant_method);
        Ok(config)
    }
}
