// Plain-text rendering of polynomial fractions
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

const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Coefficients with a smaller magnitude are not printed.
const NEGLIGIBLE: f64 = 1e-12;

/// Renders `num / den` as three lines: numerator, a rule of `―` as wide as the longer
/// polynomial, and denominator.
///
/// ```
/// use pid_autotune::format::fraction;
///
/// assert_eq!(fraction(&[2.0], &[10.0, 1.0]), "2\n――――――――\n10s¹ + 1");
/// ```
pub fn fraction(num: &[f64], den: &[f64]) -> String {
    let num = polynomial(num);
    let den = polynomial(den);
    let width = num.chars().count().max(den.chars().count());
    let rule: String = "―".repeat(width);
    format!("{num}\n{rule}\n{den}")
}

/// Renders a descending coefficient list, e.g. `[1, -0.5, 0, 3]` as `s³ - 0.5s² + 3`.
pub fn polynomial(coeffs: &[f64]) -> String {
    let max_degree = coeffs.len().saturating_sub(1);
    let terms: Vec<String> = coeffs
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| term(c, max_degree - i))
        .collect();

    let Some((first, rest)) = terms.split_first() else {
        return "0".to_string();
    };
    let mut out = first.clone();
    for t in rest {
        match t.strip_prefix('-') {
            Some(magnitude) => {
                out.push_str(" - ");
                out.push_str(magnitude);
            }
            None => {
                out.push_str(" + ");
                out.push_str(t);
            }
        }
    }
    out
}

fn term(coeff: f64, degree: usize) -> Option<String> {
    if coeff.abs() < NEGLIGIBLE {
        return None;
    }
    let sign = if coeff < 0.0 { "-" } else { "" };
    // Unit coefficients are implied, except on the constant term
    let magnitude = if coeff.abs() != 1.0 || degree == 0 {
        format_g(coeff.abs(), 3)
    } else {
        String::new()
    };
    let var = if degree > 0 {
        format!("s{}", superscript(degree))
    } else {
        String::new()
    };
    Some(format!("{sign}{magnitude}{var}"))
}

fn superscript(n: usize) -> String {
    n.to_string()
        .chars()
        .filter_map(|d| d.to_digit(10).map(|d| SUPERSCRIPTS[d as usize]))
        .collect()
}

/// Formats like C's `%.{precision}g`: `precision` significant digits, trailing zeros removed,
/// scientific notation when the decimal exponent is below -4 or at least `precision`.
pub fn format_g(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let precision = precision.max(1);
    // Round first so that e.g. 999.7 is classified by its rounded exponent
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
