// Numeric values for the physical parameters of a symbolic transfer function
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

use std::collections::{BTreeMap, HashMap, VecDeque};

use log::debug;

use crate::symbolic::SymbolicExpression;

/// Failure to obtain a value for every free parameter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// The provider declined to answer.
    #[error("analysis cancelled: no value was supplied for '{symbol}'")]
    Cancelled {
        /// The parameter that was being asked for.
        symbol: String,
    },

    /// The answer is not a finite number.
    #[error("'{value}' is not a valid number for '{symbol}'")]
    Format {
        /// The parameter that was being asked for.
        symbol: String,
        /// The text supplied for it.
        value: String,
    },
}

/// A source of parameter values, asked once per free symbol.
///
/// Returning `None` declines to answer and cancels the analysis. The call may block, e.g. on a
/// prompt.
pub trait ValueProvider {
    /// Returns the text of a value for `symbol`, or `None` to cancel.
    fn provide(&mut self, symbol: &str) -> Option<String>;
}

impl<F> ValueProvider for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn provide(&mut self, symbol: &str) -> Option<String> {
        self(symbol)
    }
}

/// Answers from a fixed table; unknown symbols cancel.
#[derive(Clone, Debug, Default)]
pub struct MapProvider(HashMap<String, String>);

impl MapProvider {
    /// An empty table; every question cancels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the answer for `symbol`.
    pub fn with(mut self, symbol: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(symbol.into(), value.into());
        self
    }
}

impl ValueProvider for MapProvider {
    fn provide(&mut self, symbol: &str) -> Option<String> {
        self.0.get(symbol).cloned()
    }
}

/// Hands out answers in order regardless of the symbol asked for, then cancels.
#[derive(Clone, Debug, Default)]
pub struct SequenceProvider(VecDeque<String>);

impl SequenceProvider {
    /// Queues `answers` in the order they will be handed out.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(answers.into_iter().map(Into::into).collect())
    }
}

impl ValueProvider for SequenceProvider {
    fn provide(&mut self, _symbol: &str) -> Option<String> {
        self.0.pop_front()
    }
}

/// Provider for expressions known to have no free parameters; cancels if asked anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoParameters;

impl ValueProvider for NoParameters {
    fn provide(&mut self, _symbol: &str) -> Option<String> {
        None
    }
}

/// Parses a decimal number written with either `.` or `,` as the decimal separator.
///
/// # Errors
/// [`ResolveError::Format`] if the text is not a finite real number.
pub fn parse_value(symbol: &str, text: &str) -> Result<f64, ResolveError> {
    let format_error = || ResolveError::Format {
        symbol: symbol.to_string(),
        value: text.to_string(),
    };
    let value = text
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| format_error())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format_error())
    }
}

/// Asks `provider` for every free symbol of `expr`, in lexicographic order, and substitutes the
/// answers.
///
/// Nothing is substituted unless every symbol receives a value.
///
/// # Errors
/// - [`ResolveError::Cancelled`] as soon as the provider declines.
/// - [`ResolveError::Format`] if an answer is not a number.
pub fn resolve<P>(expr: &SymbolicExpression, provider: &mut P) -> Result<SymbolicExpression, ResolveError>
where
    P: ValueProvider + ?Sized,
{
    let mut values = BTreeMap::new();
    for symbol in expr.free_symbols() {
        let text = provider.provide(&symbol).ok_or_else(|| ResolveError::Cancelled {
            symbol: symbol.clone(),
        })?;
        let value = parse_value(&symbol, &text)?;
        debug!("{symbol} = {value}");
        values.insert(symbol, value);
    }
    Ok(expr.substitute(&values))
}
