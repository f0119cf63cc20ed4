#![warn(missing_docs)]
//! # PID Auto-Tuning Library
//!
//! This library derives the transfer function of a linear process from its differential
//! equation and tunes a PID controller for it with the classic Ziegler–Nichols rules.
//!
//! ## Features
//!
//! - Symbolic Laplace transformation of equations such as
//!   `m*diff(y(t), t, 2) + c*diff(y(t), t) + k*y(t) = u(t)`, keeping physical parameters as
//!   symbols until a value is supplied for each.
//! - A plant can also be given directly as the coefficient lists of its equation.
//! - Stability check on the open-loop poles. Tuning is never attempted on an unstable plant.
//! - Two tuners:
//!   - Reaction curve: tangent at the steepest point of the simulated step response.
//!   - Ultimate gain: gain margin and phase-crossover frequency, with a fallback on the
//!     closed-loop characteristic polynomial.
//! - Unity-feedback closed loop and input-disturbance rejection, each simulated with an exact
//!   zero-order-hold discretisation.
//!
//! ## Usage
//!
//! ```rust
//! use pid_autotune::analysis::{Analyzer, SystemDefinition};
//! use pid_autotune::params::MapProvider;
//!
//! let system = SystemDefinition::equation("tau*diff(y(t), t) + y(t) = k*u(t)", "u", "y");
//!
//! // One value per free parameter; either decimal separator is accepted
//! let mut provider = MapProvider::new().with("k", "2").with("tau", "10,0");
//!
//! let analysis = Analyzer::default().run(&system, &mut provider)?;
//! assert_eq!(analysis.plant().numerator().coeffs(), &[2.0]);
//! assert_eq!(analysis.plant().denominator().coeffs(), &[10.0, 1.0]);
//!
//! let (kp, ki, kd) = analysis.controller().gains();
//! assert!(kp.is_finite() && ki.is_finite() && kd.is_finite());
//! # Ok::<(), pid_autotune::analysis::AnalysisError>(())
//! ```
//!
//! Values can also come from a closure, e.g. one that prompts on a terminal. Returning `None`
//! cancels the analysis:
//!
//! ```rust
//! use pid_autotune::analysis::{AnalysisError, Analyzer, SystemDefinition};
//! use pid_autotune::params::ResolveError;
//!
//! let system = SystemDefinition::equation("diff(y(t), t) + a*y(t) = b*u(t)", "u", "y");
//! let mut provider = |symbol: &str| (symbol == "a").then(|| "1".to_string());
//!
//! let result = Analyzer::default().run(&system, &mut provider);
//! assert!(matches!(
//!     result,
//!     Err(AnalysisError::Resolve(ResolveError::Cancelled { .. }))
//! ));
//! ```
//!
//! ## License
//!
//! MIT

/// The analysis pipeline tying every stage together.
pub mod analysis;

/// Configuration of an analysis run.
pub mod config;

/// Expression trees and the equation parser.
pub mod expr;

/// Plain-text rendering of transfer functions.
pub mod format;

/// Laplace transformation of linear differential equations.
pub mod laplace;

/// Gain margin of a transfer function.
pub mod margin;

/// Values for free physical parameters.
pub mod params;

/// PID controller gains.
pub mod pid;

/// Univariate polynomials with real coefficients.
pub mod poly;

/// Reaction-curve tuning.
pub mod reaction_curve;

/// Step-response simulation.
pub mod sim;

/// Multivariate rational expressions.
pub mod symbolic;

/// Transfer functions.
pub mod tf;

/// Tuning parameters and Ziegler–Nichols gain rules.
pub mod tuning;

/// Ultimate-gain tuning.
pub mod ultimate_gain;

pub use analysis::{Analysis, AnalysisError, Analyzer, SystemDefinition};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use pid::PidController;
pub use tf::TransferFunction;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
