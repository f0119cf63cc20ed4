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

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use nalgebra::Complex;

use pid_autotune::laplace::{transform, OdeSpec};
use pid_autotune::pid::PidController;
use pid_autotune::tf::{TransferFunction, TransferFunctionError};

mod test_builder {

    use super::*;

    #[test]
    fn test_coefficient_lists_are_kept_unchanged() {
        let cases: [(usize, &[f64], &[f64]); 3] = [
            (1, &[2.0], &[10.0, 1.0]),
            (2, &[1.0, 1.0], &[1.0, 3.0, 2.0]),
            // Leading zeros and common factors survive in this mode
            (2, &[0.0, 2.0, 2.0], &[2.0, 4.0, 2.0]),
        ];
        for (order, input, output) in cases {
            let tf = TransferFunction::from_coefficients(order, input, output).unwrap();
            assert_eq!(tf.numerator().coeffs(), input);
            assert_eq!(tf.denominator().coeffs(), output);
            assert_eq!(tf.denominator().coeffs().len(), output.len());
        }
    }

    #[test]
    fn test_coefficient_count_must_match_order() {
        assert_eq!(
            TransferFunction::from_coefficients(2, &[1.0], &[1.0, 3.0]),
            Err(TransferFunctionError::CoefficientCount {
                order: 2,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            TransferFunction::from_coefficients(1, &[], &[1.0, 1.0]),
            Err(TransferFunctionError::EmptyInput)
        );
        assert_eq!(
            TransferFunction::from_coefficients(1, &[1.0], &[0.0, 0.0]),
            Err(TransferFunctionError::ZeroDenominator)
        );
    }

    #[test]
    fn test_symbolic_plant_with_values() {
        let g = transform(
            &OdeSpec::new("m*diff(y(t),t) + b*y(t) = k*u(t)", "u", "y"),
            10,
        )
        .unwrap();
        let values = BTreeMap::from([
            ("b".to_string(), 0.5),
            ("k".to_string(), 3.0),
            ("m".to_string(), 2.0),
        ]);
        let tf = TransferFunction::from_symbolic(&g.substitute(&values)).unwrap();
        assert_eq!(tf.numerator().coeffs(), &[3.0]);
        assert_eq!(tf.denominator().coeffs(), &[2.0, 0.5]);
    }

    #[test]
    fn test_symbolic_plant_cancels_common_factors() {
        // (s + 1) / ((s + 1)(s + 2))
        let g = transform(
            &OdeSpec::new(
                "diff(y(t),t,2) + 3*diff(y(t),t) + 2*y(t) = diff(u(t),t) + u(t)",
                "u",
                "y",
            ),
            10,
        )
        .unwrap();
        let tf = TransferFunction::from_symbolic(&g).unwrap();
        assert_eq!(tf.numerator().coeffs(), &[1.0]);
        assert_eq!(tf.denominator().coeffs(), &[1.0, 2.0]);
    }

    #[test]
    fn test_symbolic_plant_needs_every_value() {
        let g = transform(
            &OdeSpec::new("m*diff(y(t),t) + b*y(t) = u(t)", "u", "y"),
            10,
        )
        .unwrap();
        assert_eq!(
            TransferFunction::from_symbolic(&g),
            Err(TransferFunctionError::UnresolvedSymbols(vec![
                "b".to_string(),
                "m".to_string()
            ]))
        );
    }

    #[test]
    fn test_symbolic_plant_with_vanishing_denominator() {
        let g = transform(
            &OdeSpec::new("m*diff(y(t),t) + b*y(t) = u(t)", "u", "y"),
            10,
        )
        .unwrap();
        let values = BTreeMap::from([("b".to_string(), 0.0), ("m".to_string(), 0.0)]);
        assert_eq!(
            TransferFunction::from_symbolic(&g.substitute(&values)),
            Err(TransferFunctionError::ZeroDenominator)
        );
    }

    #[test]
    fn test_display() {
        let tf = TransferFunction::new(vec![1.0, -0.5], vec![2.0, 0.0, 1.0]).unwrap();
        assert_eq!(tf.to_string(), "s¹ - 0.5\n――――――――\n2s² + 1");
    }
}

mod test_stability {

    use super::*;

    #[test]
    fn test_left_half_plane_pole_is_stable() {
        let tf = TransferFunction::new(vec![1.0], vec![1.0, 3.0]).unwrap();
        assert!(tf.is_stable());
        assert_relative_eq!(tf.poles()[0].re, -3.0);
    }

    #[test]
    fn test_right_half_plane_pole_is_unstable() {
        let tf = TransferFunction::new(vec![1.0], vec![1.0, -3.0]).unwrap();
        assert!(!tf.is_stable());
        assert_relative_eq!(tf.poles()[0].re, 3.0);
    }

    #[test]
    fn test_poles_on_the_imaginary_axis_are_not_flagged() {
        // s² + 1 and an integrator
        assert!(TransferFunction::new(vec![1.0], vec![1.0, 0.0, 1.0])
            .unwrap()
            .is_stable());
        assert!(TransferFunction::new(vec![1.0], vec![1.0, 0.0])
            .unwrap()
            .is_stable());
    }

    #[test]
    fn test_imaginary_axis_pair_in_higher_order_plants() {
        // (s² + 1)(s + 1), (s² + 4)(2s + 1) and (s² + 4)(s + 2)
        for den in [[1.0, 1.0, 1.0, 1.0], [2.0, 1.0, 8.0, 4.0], [1.0, 2.0, 4.0, 8.0]] {
            let tf = TransferFunction::new(vec![1.0], den.to_vec()).unwrap();
            assert!(tf.is_stable(), "{den:?} has poles {:?}", tf.poles());
        }
    }

    #[test]
    fn test_small_positive_pole_is_unstable() {
        // (s - 1e-6)(s + 1)
        let tf = TransferFunction::new(vec![1.0], vec![1.0, 1.0 - 1e-6, -1e-6]).unwrap();
        assert!(!tf.is_stable());
    }

    #[test]
    fn test_higher_order_poles() {
        // (s + 1)(s + 2)(s - 0.5)(s + 4)
        let den = [1.0, 6.5, 10.5, 1.0, -4.0];
        let tf = TransferFunction::new(vec![1.0], den.to_vec()).unwrap();
        assert!(!tf.is_stable());

        let mut re: Vec<f64> = tf.poles().iter().map(|p| p.re).collect();
        re.sort_by(f64::total_cmp);
        for (got, want) in re.iter().zip([-4.0, -2.0, -1.0, 0.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zeros_and_gain() {
        let tf = TransferFunction::new(vec![2.0, 4.0], vec![1.0, 3.0, 2.0]).unwrap();
        assert_relative_eq!(tf.zeros()[0].re, -2.0);
        assert_relative_eq!(tf.dc_gain(), 2.0);
        assert!(tf.is_proper());

        let at_j = tf.eval(Complex::new(0.0, 1.0));
        // (4 + 2j) / (1 + 3j)
        assert_relative_eq!(at_j.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(at_j.im, -1.0, epsilon = 1e-12);
    }
}

mod test_closed_loop {

    use super::*;

    #[test]
    fn test_unity_feedback_with_unit_controller() {
        let g = TransferFunction::new(vec![1.0], vec![1.0, 1.0]).unwrap();
        let c = TransferFunction::new(vec![1.0], vec![1.0]).unwrap();
        let closed = g.feedback_unity(&c).unwrap();
        assert_eq!(closed, TransferFunction::new(vec![1.0], vec![1.0, 2.0]).unwrap());
    }

    #[test]
    fn test_pid_closed_loop_polynomials() {
        let g = plants::first_order(2.0, 10.0);
        let pid = PidController::new(3.0, 0.5, 0.25).unwrap();
        let c = pid.transfer_function();

        let closed = g.feedback_unity(&c).unwrap();
        // C·G = 2(0.25s² + 3s + 0.5) / (10s² + s)
        assert_eq!(closed.numerator().coeffs(), &[0.5, 6.0, 1.0]);
        assert_eq!(closed.denominator().coeffs(), &[10.5, 7.0, 1.0]);

        let disturbance = g.disturbance_rejection(&c).unwrap();
        assert_eq!(disturbance.numerator().coeffs(), &[2.0, 0.0]);
        assert_eq!(disturbance.denominator().coeffs(), &[10.5, 7.0, 1.0]);
    }

    #[test]
    fn test_series_multiplies_polynomials() {
        let g = plants::first_order(1.0, 1.0);
        let h = g.series(&g);
        assert_eq!(h.numerator().coeffs(), &[1.0]);
        assert_eq!(h.denominator().coeffs(), &[1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_degenerate_loop() {
        // 1 + C·G vanishes for G = -1, C = 1
        let g = TransferFunction::new(vec![-1.0], vec![1.0]).unwrap();
        let c = TransferFunction::new(vec![1.0], vec![1.0]).unwrap();
        assert_eq!(
            g.feedback_unity(&c),
            Err(TransferFunctionError::ZeroDenominator)
        );
    }
}
