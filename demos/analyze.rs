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

//! Analyses an equation given on the command line, prompting for its parameters.
//!
//! ```text
//! analyze [--ultimate-gain] [EQUATION [INPUT [OUTPUT]]]
//! ```

use std::io::{self, BufRead, Write};

use log::{Level, LevelFilter, Log, Metadata, Record};

use pid_autotune::analysis::{Analysis, Analyzer, SystemDefinition};
use pid_autotune::config::AnalysisConfigBuilder;
use pid_autotune::sim::StepResponse;
use pid_autotune::tuning::Method;

const DEFAULT_EQUATION: &str = "m*diff(y(t),t,2) + c*diff(y(t),t) + k*y(t) = u(t)";

/// Number of rows printed per step response.
const PRINTED_SAMPLES: usize = 16;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Asks for `symbol` on stdin. End of input cancels.
fn prompt(symbol: &str) -> Option<String> {
    print!("{symbol} = ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

fn print_response(title: &str, response: &StepResponse) {
    println!("\n{title}");
    let stride = (response.len() / PRINTED_SAMPLES).max(1);
    for (t, y) in response
        .time()
        .iter()
        .zip(response.output())
        .step_by(stride)
    {
        println!("  t = {t:8.3}   y = {y:10.5}");
    }
}

fn report(analysis: &Analysis) {
    if let Some(symbolic) = analysis.symbolic_plant() {
        println!("\nG(s) = {symbolic}");
    }
    println!("\nPlant:\n{}", analysis.plant());
    println!("\n{}", analysis.parameters());
    println!("{}", analysis.controller());
    println!("\nClosed loop:\n{}", analysis.closed_loop());
    println!("\nDisturbance rejection:\n{}", analysis.disturbance_rejection());

    print_response("Open-loop step response", analysis.open_loop_response());
    print_response("Closed-loop step response", analysis.closed_loop_response());
    print_response("Disturbance step response", analysis.disturbance_response());
}

fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let method = match args.iter().position(|a| a == "--ultimate-gain") {
        Some(i) => {
            args.remove(i);
            Method::UltimateGain
        }
        None => Method::ReactionCurve,
    };
    let mut args = args.into_iter();
    let equation = args.next().unwrap_or_else(|| DEFAULT_EQUATION.to_string());
    let input = args.next().unwrap_or_else(|| "u".to_string());
    let output = args.next().unwrap_or_else(|| "y".to_string());

    let config = match AnalysisConfigBuilder::default().method(method).build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    println!("{equation}");
    let system = SystemDefinition::equation(equation, input, output);
    let mut provider = prompt;
    match Analyzer::new(config).run(&system, &mut provider) {
        Ok(analysis) => report(&analysis),
        Err(e) => {
            eprintln!("analysis failed: {e}");
            std::process::exit(1);
        }
    }
}
