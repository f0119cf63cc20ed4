// The analysis pipeline: plant, stability, tuning and closed-loop responses
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

use log::info;
use nalgebra::Complex;

use crate::config::AnalysisConfig;
use crate::laplace::{self, LaplaceError, OdeSpec};
use crate::params::{self, ResolveError, ValueProvider};
use crate::pid::PidController;
use crate::reaction_curve;
use crate::sim::{self, SimulationError, StepResponse};
use crate::symbolic::SymbolicExpression;
use crate::tf::{self, TransferFunction, TransferFunctionError};
use crate::tuning::{Method, Tuning, TuningError, TuningParameters};
use crate::ultimate_gain;

/// The first stage of an analysis run that failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// The equation could not be transformed.
    #[error(transparent)]
    Laplace(#[from] LaplaceError),

    /// A parameter value was declined or malformed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The plant or a closed loop could not be built.
    #[error(transparent)]
    TransferFunction(#[from] TransferFunctionError),

    /// A plant pole has a positive real part; no tuner was run.
    #[error("the open-loop system is unstable; poles: {}", format_poles(.poles))]
    Unstable {
        /// Every pole of the plant.
        poles: Vec<Complex<f64>>,
    },

    /// The selected tuner failed.
    #[error(transparent)]
    Tuning(#[from] TuningError),

    /// A response could not be simulated.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

fn format_poles(poles: &[Complex<f64>]) -> String {
    poles
        .iter()
        .map(|p| format!("{:.4}{:+.4}j", p.re, p.im))
        .collect::<Vec<_>>()
        .join(", ")
}

/// How the plant is given: as a differential equation or as the coefficient lists of one.
#[derive(Clone, Debug, PartialEq)]
pub enum SystemDefinition {
    /// A linear ODE, possibly with free physical parameters.
    Equation(OdeSpec),
    /// `output[0]·y⁽ⁿ⁾ + ... + output[n]·y = input[0]·u⁽ᵐ⁾ + ... + input[m]·u` with `n = order`.
    Coefficients {
        /// Order `n` of the equation.
        order: usize,
        /// Input coefficients, highest derivative first.
        input: Vec<f64>,
        /// Output coefficients, highest derivative first.
        output: Vec<f64>,
    },
}

impl SystemDefinition {
    /// A differential equation with the names of its input and output functions.
    pub fn equation(
        equation: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        SystemDefinition::Equation(OdeSpec::new(equation, input, output))
    }

    /// Reads the coefficient form from text: an order and two whitespace-separated lists.
    pub fn from_coefficient_text(
        order: &str,
        input: &str,
        output: &str,
    ) -> Result<Self, TransferFunctionError> {
        Ok(SystemDefinition::Coefficients {
            order: tf::parse_order(order)?,
            input: tf::parse_coefficients(input)?,
            output: tf::parse_coefficients(output)?,
        })
    }
}

/// Everything computed by one successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    symbolic_plant: Option<SymbolicExpression>,
    plant: TransferFunction,
    poles: Vec<Complex<f64>>,
    tuning: Tuning,
    controller_tf: TransferFunction,
    closed_loop: TransferFunction,
    disturbance_rejection: TransferFunction,
    open_loop_response: StepResponse,
    closed_loop_response: StepResponse,
    disturbance_response: StepResponse,
}

impl Analysis {
    /// The plant before parameter substitution. `None` for the coefficient form.
    pub fn symbolic_plant(&self) -> Option<&SymbolicExpression> {
        self.symbolic_plant.as_ref()
    }

    /// The numeric plant `G(s)` every later stage works on.
    pub fn plant(&self) -> &TransferFunction {
        &self.plant
    }

    /// Poles of the plant.
    pub fn poles(&self) -> &[Complex<f64>] {
        &self.poles
    }

    /// Identified parameters and the tuned controller.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// The parameters the tuner identified.
    pub fn parameters(&self) -> &TuningParameters {
        &self.tuning.parameters
    }

    /// The tuned PID gains.
    pub fn controller(&self) -> &PidController {
        &self.tuning.controller
    }

    /// `C(s) = (Kd·s² + Kp·s + Ki)/s`.
    pub fn controller_transfer_function(&self) -> &TransferFunction {
        &self.controller_tf
    }

    /// `C·G/(1 + C·G)`.
    pub fn closed_loop(&self) -> &TransferFunction {
        &self.closed_loop
    }

    /// `G/(1 + C·G)`.
    pub fn disturbance_rejection(&self) -> &TransferFunction {
        &self.disturbance_rejection
    }

    /// Step response of the plant alone.
    pub fn open_loop_response(&self) -> &StepResponse {
        &self.open_loop_response
    }

    /// Step response of the unity-feedback loop to its reference.
    pub fn closed_loop_response(&self) -> &StepResponse {
        &self.closed_loop_response
    }

    /// Output response to a unit step disturbance at the plant input.
    pub fn disturbance_response(&self) -> &StepResponse {
        &self.disturbance_response
    }
}

/// Runs the full pipeline with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Creates an analyzer that runs with `config`.
    pub fn new(config: AnalysisConfig) -> Self {
        Analyzer { config }
    }

    /// The configuration every run uses.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Derives the plant, checks that it is stable, tunes a PID controller for it and simulates
    /// the open loop, the closed loop and the rejection of an input disturbance.
    ///
    /// `provider` is asked once for every free parameter of an equation, in lexicographic order.
    /// The run stops at the first failing stage.
    ///
    /// # Errors
    /// Any stage error, or [`AnalysisError::Unstable`] if a plant pole has a positive real
    /// part. No tuner runs on an unstable plant.
    pub fn run<P>(
        &self,
        definition: &SystemDefinition,
        provider: &mut P,
    ) -> Result<Analysis, AnalysisError>
    where
        P: ValueProvider + ?Sized,
    {
        let (symbolic_plant, plant) = match definition {
            SystemDefinition::Equation(spec) => {
                let symbolic = laplace::transform(spec, self.config.max_derivative_order())?;
                info!("symbolic plant: G(s) = {symbolic}");
                let resolved = params::resolve(&symbolic, provider)?;
                let plant = TransferFunction::from_symbolic(&resolved)?;
                (Some(symbolic), plant)
            }
            SystemDefinition::Coefficients {
                order,
                input,
                output,
            } => (
                None,
                TransferFunction::from_coefficients(*order, input, output)?,
            ),
        };
        info!("plant:\n{plant}");

        let poles = plant.poles();
        if !plant.is_stable() {
            return Err(AnalysisError::Unstable { poles });
        }

        let grid = self.config.grid();
        let open_loop_response = sim::step_response(&plant, &grid)?;
        let tuning = match self.config.method() {
            Method::ReactionCurve => reaction_curve::tune(&open_loop_response, &self.config)?,
            Method::UltimateGain => ultimate_gain::tune(&plant, &self.config)?,
        };
        info!("{}", tuning.parameters);
        info!("{}", tuning.controller);

        let controller_tf = tuning.controller.transfer_function();
        let closed_loop = plant.feedback_unity(&controller_tf)?;
        let disturbance_rejection = plant.disturbance_rejection(&controller_tf)?;
        let closed_loop_response = sim::step_response(&closed_loop, &grid)?;
        let disturbance_response = sim::step_response(&disturbance_rejection, &grid)?;

        Ok(Analysis {
            symbolic_plant,
            plant,
            poles,
            tuning,
            controller_tf,
            closed_loop,
            disturbance_rejection,
            open_loop_response,
            closed_loop_response,
            disturbance_response,
        })
    }
}
