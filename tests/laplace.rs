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

use fixtures::equations;

use pid_autotune::expr::ParseError;
use pid_autotune::laplace::{transform, LaplaceError, OdeSpec};
use pid_autotune::symbolic::{SymbolicExpression, LAPLACE_VAR};

const MAX_ORDER: u32 = 10;

fn plant(equation: &str) -> Result<SymbolicExpression, LaplaceError> {
    transform(&OdeSpec::new(equation, "u", "y"), MAX_ORDER)
}

/// Numerator and denominator coefficients of a parameter-free plant.
fn coefficients(g: &SymbolicExpression) -> (Vec<f64>, Vec<f64>) {
    (
        g.numerator().univariate_coeffs(LAPLACE_VAR).unwrap(),
        g.denominator().univariate_coeffs(LAPLACE_VAR).unwrap(),
    )
}

mod test_transform {

    use super::*;

    #[test]
    fn test_first_order_without_parameters() {
        let g = plant(equations::FIRST_ORDER).unwrap();
        assert!(g.free_symbols().is_empty());
        assert_eq!(coefficients(&g), (vec![2.0], vec![10.0, 1.0]));
    }

    #[test]
    fn test_missing_right_hand_side_is_zero() {
        let g = plant("diff(y(t),t) + y(t) - u(t)").unwrap();
        assert_eq!(coefficients(&g), (vec![1.0], vec![1.0, 1.0]));
    }

    #[test]
    fn test_input_derivatives_form_the_numerator() {
        let g = plant("diff(y(t),t,2) + 3*diff(y(t),t) + 2*y(t) = 4*diff(u(t),t) + u(t)").unwrap();
        assert_eq!(coefficients(&g), (vec![4.0, 1.0], vec![1.0, 3.0, 2.0]));
    }

    #[test]
    fn test_output_terms_on_both_sides() {
        // 2y' = u - y
        let g = plant("2*diff(y(t),t) = u(t) - y(t)").unwrap();
        assert_eq!(coefficients(&g), (vec![1.0], vec![2.0, 1.0]));
    }

    #[test]
    fn test_static_gain() {
        let g = plant("y(t) = 2*u(t)").unwrap();
        assert_eq!(coefficients(&g), (vec![2.0], vec![1.0]));
    }

    #[test]
    fn test_cancelled_parameter_is_not_free() {
        let g = plant("tau*diff(y(t),t) + y(t) = tau*diff(u(t),t) + u(t)").unwrap();
        assert!(g.free_symbols().is_empty());
        assert_eq!(coefficients(&g), (vec![1.0], vec![1.0]));

        let g = plant("(k+1)*diff(y(t),t) + (k+1)*y(t) = (k+1)*u(t)").unwrap();
        assert!(g.free_symbols().is_empty());
        assert_eq!(coefficients(&g), (vec![1.0], vec![1.0, 1.0]));
    }

    #[test]
    fn test_common_parametric_factor_is_cancelled() {
        // (m·s + c)·Y = (m·s + c)·k·U
        let g = plant("m*diff(y(t),t) + c*y(t) = k*m*diff(u(t),t) + k*c*u(t)").unwrap();
        assert_eq!(g.free_symbols(), vec!["k"]);
        assert_eq!(g.to_string(), "k");
    }

    #[test]
    fn test_derivative_notations_agree() {
        let counted = plant("diff(y(t),t,3) + y(t) = u(t)").unwrap();
        let repeated = plant("diff(y(t),t,t,t) + y(t) = u(t)").unwrap();
        let nested = plant("diff(diff(y(t),t),t,2) + y(t) = u(t)").unwrap();
        assert_eq!(counted, repeated);
        assert_eq!(counted, nested);
        assert_eq!(coefficients(&counted), (vec![1.0], vec![1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_parameters_are_free_symbols() {
        let g = plant(equations::MASS_SPRING_DAMPER).unwrap();
        assert_eq!(g.free_symbols(), vec!["c", "k", "m"]);
    }

    #[test]
    fn test_custom_input_and_output_names() {
        let spec = OdeSpec::new("mass*diff(x(t),t,2) + k*x(t) = F(t)", "F", "x");
        let g = transform(&spec, MAX_ORDER).unwrap();
        assert_eq!(g.free_symbols(), vec!["k", "mass"]);
    }

    #[test]
    fn test_highest_supported_order() {
        let g = plant("diff(y(t),t,10) + y(t) = u(t)").unwrap();
        let (_, den) = coefficients(&g);
        assert_eq!(den.len(), 11);
    }
}

mod test_transform_errors {

    use super::*;

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            plant("diff(y(t),t) + y(t) = v(t)"),
            Err(LaplaceError::Parse(ParseError::UnknownFunction("v".into())))
        );
    }

    #[test]
    fn test_bare_time_symbol() {
        assert_eq!(
            plant("y(t) + t = u(t)"),
            Err(LaplaceError::Parse(ParseError::TimeOutsideFunction))
        );
    }

    #[test]
    fn test_derivative_order_above_maximum() {
        assert_eq!(
            plant("diff(y(t),t,11) + y(t) = u(t)"),
            Err(LaplaceError::Parse(ParseError::DerivativeOrderTooHigh {
                function: "y".into(),
                order: 11,
                max: MAX_ORDER,
            }))
        );
    }

    #[test]
    fn test_nested_derivative_order_overflow() {
        assert!(matches!(
            plant("diff(diff(y(t),t,4294967295),t) = u(t)"),
            Err(LaplaceError::Parse(ParseError::InvalidDerivative(_)))
        ));
    }

    #[test]
    fn test_function_applied_to_something_else() {
        assert_eq!(
            plant("y(2) = u(t)"),
            Err(LaplaceError::Parse(ParseError::InvalidArgument("y".into())))
        );
    }

    #[test]
    fn test_reserved_names() {
        assert_eq!(
            plant("s*y(t) = u(t)"),
            Err(LaplaceError::Parse(ParseError::ReservedSymbol("s".into())))
        );
        assert_eq!(
            transform(&OdeSpec::new("y(t) = t(t)", "t", "y"), MAX_ORDER),
            Err(LaplaceError::Parse(ParseError::ReservedSymbol("t".into())))
        );
    }

    #[test]
    fn test_more_than_one_equals_sign() {
        assert_eq!(
            plant("y(t) = u(t) = 0"),
            Err(LaplaceError::Parse(ParseError::MultipleEquals))
        );
    }

    #[test]
    fn test_malformed_text() {
        assert!(matches!(plant("y(t) + = u(t)"), Err(LaplaceError::Parse(_))));
        assert!(matches!(plant("y(t) = u(t"), Err(LaplaceError::Parse(_))));
    }

    #[test]
    fn test_unsolvable_equations() {
        for equation in [
            // Not linear in the output
            "y(t)^2 = u(t)",
            // Output multiplied by the input
            "y(t)*u(t) = u(t)",
            // Output missing
            "diff(u(t),t) = u(t)",
            // Forcing term independent of both
            "y(t) = u(t) + 1",
            // Output in a denominator
            "1/y(t) = u(t)",
        ] {
            assert!(
                matches!(plant(equation), Err(LaplaceError::Unsolvable(_))),
                "{equation} should be unsolvable"
            );
        }
    }

    #[test]
    fn test_input_and_output_must_differ() {
        let spec = OdeSpec::new("diff(y(t),t) + y(t) = y(t)", "y", "y");
        assert!(matches!(
            transform(&spec, MAX_ORDER),
            Err(LaplaceError::Unsolvable(_))
        ));
    }
}
