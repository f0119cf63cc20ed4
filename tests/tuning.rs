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

use fixtures::plants;

use core::f64::consts::PI;

use approx::assert_relative_eq;

use pid_autotune::config::{AnalysisConfig, AnalysisConfigBuilder};
use pid_autotune::margin::gain_margin;
use pid_autotune::sim::{self, StepResponse, TimeGrid};
use pid_autotune::tf::TransferFunction;
use pid_autotune::tuning::{
    ProcessModel, ReactionCurveRule, TimeConstantMethod, TuningError, TuningParameters,
    UltimateGain,
};
use pid_autotune::{reaction_curve, ultimate_gain};

mod test_gain_rules {

    use super::*;

    #[test]
    fn test_reaction_curve_textbook_values() {
        let model = ProcessModel {
            k: 1.0,
            l: 1.0,
            t: 5.0,
        };
        let pid = ReactionCurveRule::GainForm.gains(&model).unwrap();
        assert_relative_eq!(pid.kp(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(pid.ki(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(pid.kd(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reaction_curve_absolute_form() {
        let model = ProcessModel {
            k: 1.0,
            l: 1.0,
            t: 5.0,
        };
        let pid = ReactionCurveRule::AbsoluteForm.gains(&model).unwrap();
        assert_relative_eq!(pid.kp(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(pid.ki(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(pid.kd(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_ultimate_gain_textbook_values() {
        let pid = UltimateGain { ku: 4.0, pu: 2.0 }.gains().unwrap();
        assert_relative_eq!(pid.kp(), 2.4, epsilon = 1e-12);
        assert_relative_eq!(pid.ki(), 2.4, epsilon = 1e-12);
        assert_relative_eq!(pid.kd(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_gains_are_rejected() {
        let model = ProcessModel {
            k: 1.0,
            l: 0.0,
            t: 5.0,
        };
        assert!(matches!(
            ReactionCurveRule::GainForm.gains(&model),
            Err(TuningError::Pid(_))
        ));
    }
}

mod test_reaction_curve {

    use super::*;

    #[test]
    fn test_recovers_delayed_first_order_model() {
        let response = plants::delayed_first_order_trace(1.0, 1.0, 5.0);
        let tuning = reaction_curve::tune(&response, &AnalysisConfig::default()).unwrap();

        let TuningParameters::ReactionCurve(model) = tuning.parameters else {
            panic!("expected reaction-curve parameters");
        };
        assert_relative_eq!(model.k, 1.0, epsilon = 1e-6);
        assert_relative_eq!(model.l, 1.0, epsilon = 1e-3);
        assert_relative_eq!(model.t, 5.0, epsilon = 1e-2);
        assert_relative_eq!(tuning.controller.kp(), 6.0, epsilon = 2e-2);
    }

    #[test]
    fn test_delay_is_floored_for_first_order_plant() {
        let config = AnalysisConfig::default();
        let response = sim::step_response(&plants::first_order(2.0, 10.0), &config.grid()).unwrap();
        let model = reaction_curve::identify(&response, &config).unwrap();

        assert_eq!(model.l, config.delay_floor());
        assert_relative_eq!(model.k, 2.0, epsilon = 1e-2);
        assert_relative_eq!(model.t, 10.0, epsilon = 5e-2);
    }

    #[test]
    fn test_sixty_three_percent_time_constant() {
        let config = AnalysisConfigBuilder::default()
            .time_constant_method(TimeConstantMethod::SixtyThreePercent)
            .build()
            .unwrap();
        let response = sim::step_response(&plants::first_order(2.0, 10.0), &config.grid()).unwrap();
        let model = reaction_curve::identify(&response, &config).unwrap();

        // L is 0 before flooring, so T is read directly at 63 % of the final value
        assert_eq!(model.l, config.delay_floor());
        assert_relative_eq!(model.t, 9.933, epsilon = 5e-3);
    }

    #[test]
    fn test_configured_floor() {
        let config = AnalysisConfigBuilder::default()
            .delay_floor(0.01)
            .build()
            .unwrap();
        let response = sim::step_response(&plants::first_order(1.0, 1.0), &config.grid()).unwrap();
        let tuning = reaction_curve::tune(&response, &config).unwrap();
        let TuningParameters::ReactionCurve(model) = tuning.parameters else {
            panic!("expected reaction-curve parameters");
        };
        assert_eq!(model.l, 0.01);
    }

    #[test]
    fn test_flat_response_is_inapplicable() {
        let time = TimeGrid::new(10.0, 11).unwrap().times();
        let response = StepResponse::new(time, vec![0.5; 11]).unwrap();
        let err = reaction_curve::identify(&response, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, TuningError::FlatResponse { .. }));
        assert!(err.is_inapplicable());
    }

    #[test]
    fn test_falling_response_is_inapplicable() {
        let config = AnalysisConfig::default();
        let response = sim::step_response(&plants::first_order(-1.0, 2.0), &config.grid()).unwrap();
        assert!(matches!(
            reaction_curve::tune(&response, &config),
            Err(TuningError::FlatResponse { .. })
        ));
    }
}

mod test_gain_margin {

    use super::*;

    #[test]
    fn test_triple_lag() {
        let margin = gain_margin(&plants::triple_lag());
        assert_relative_eq!(margin.gain, 8.0, epsilon = 1e-9);
        assert_relative_eq!(margin.frequency, 3.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_scaled_plant() {
        // Doubling the loop gain halves the margin
        let plant = TransferFunction::new(vec![2.0], vec![1.0, 3.0, 3.0, 1.0]).unwrap();
        assert_relative_eq!(gain_margin(&plant).gain, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_order_has_no_phase_crossover() {
        let margin = gain_margin(&plants::first_order(2.0, 10.0));
        assert!(margin.gain.is_infinite());
        assert!(margin.frequency.is_nan());
    }

    #[test]
    fn test_second_order_has_no_phase_crossover() {
        let margin = gain_margin(&plants::two_lags());
        assert!(margin.gain.is_infinite());
    }
}

mod test_ultimate_gain {

    use super::*;

    #[test]
    fn test_triple_lag() {
        let tuning = ultimate_gain::tune(&plants::triple_lag(), &AnalysisConfig::default()).unwrap();
        let TuningParameters::UltimateGain(ultimate) = tuning.parameters else {
            panic!("expected ultimate-gain parameters");
        };
        assert_relative_eq!(ultimate.ku, 8.0, epsilon = 1e-9);
        assert_relative_eq!(ultimate.pu, 2.0 * PI / 3.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(tuning.controller.kp(), 4.8, epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_margin_is_inapplicable() {
        let err = ultimate_gain::identify(&plants::first_order(2.0, 10.0), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, TuningError::InsufficientGainMargin { ku } if ku.is_infinite()));
        assert!(err.is_inapplicable());

        // Ku = 0.5
        let plant = TransferFunction::new(vec![16.0], vec![1.0, 3.0, 3.0, 1.0]).unwrap();
        assert!(matches!(
            ultimate_gain::identify(&plant, &AnalysisConfig::default()),
            Err(TuningError::InsufficientGainMargin { .. })
        ));
    }

    #[test]
    fn test_oscillation_frequency_on_the_stability_boundary() {
        // 0.5/(s + 1)³ at Ku = 16: s³ + 3s² + 3s + 9 = (s + 3)(s² + 3)
        let plant = TransferFunction::new(vec![0.5], vec![1.0, 3.0, 3.0, 1.0]).unwrap();
        let tolerance = AnalysisConfig::default().axis_tolerance();
        let wc = ultimate_gain::oscillation_frequency(&plant, 16.0, tolerance).unwrap();
        assert_relative_eq!(wc, 3.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_oscillation_frequency_off_the_boundary() {
        let plant = TransferFunction::new(vec![0.5], vec![1.0, 3.0, 3.0, 1.0]).unwrap();
        let tolerance = AnalysisConfig::default().axis_tolerance();

        // Below and above Ku the complex pair sits off the imaginary axis
        assert_eq!(ultimate_gain::oscillation_frequency(&plant, 8.0, tolerance), None);
        assert_eq!(ultimate_gain::oscillation_frequency(&plant, 24.0, tolerance), None);
        // A first-order loop only has a real pole
        assert_eq!(
            ultimate_gain::oscillation_frequency(&plants::first_order(2.0, 10.0), 5.0, tolerance),
            None
        );
    }

    #[test]
    fn test_crossover_at_zero_frequency_falls_back() {
        // G(0) = -0.5 gives Ku = 2 at ω = 0. The closed loop at Ku has its only pole at the
        // origin, so no oscillation frequency can be found.
        let plant = TransferFunction::new(vec![-0.5], vec![1.0, 1.0]).unwrap();
        let err = ultimate_gain::identify(&plant, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, TuningError::UnresolvableFrequency { ku } if ku == 2.0));
        assert!(!err.is_inapplicable());
    }
}
