// Three-term controller gains and their transfer function
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

use core::fmt;

use crate::tf::TransferFunction;

/// A gain that is NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PidError {
    /// `Kp` is not finite.
    #[error("proportional gain must be finite")]
    InvalidProportionalGain,
    /// `Ki` is not finite.
    #[error("integral gain must be finite")]
    InvalidIntegralGain,
    /// `Kd` is not finite.
    #[error("derivative gain must be finite")]
    InvalidDerivativeGain,
}

/// An ideal parallel PID controller, `C(s) = Kp + Ki/s + Kd·s`.
///
/// Gains come straight from a tuning rule, so their sign is not restricted; they only have to
/// be finite.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidController {
    /// Proportional gain coefficient.
    kp: f64,

    /// Integral gain coefficient.
    ki: f64,

    /// Derivative gain coefficient.
    kd: f64,
}

impl PidController {
    /// Creates a controller from its three gains.
    ///
    /// # Returns
    /// - `Ok(controller)` if every gain is finite.
    /// - `Err(PidError)` naming the first non-finite gain.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Result<Self, PidError> {
        let mut pid = PidController {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
        };
        pid.set_gains(kp, ki, kd)?;
        Ok(pid)
    }

    /// Returns the proportional gain.
    pub fn kp(&self) -> f64 {
        self.kp
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> f64 {
        self.ki
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Convenience method that returns the proportional, integral, and derivative gains together as a tuple.
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    /// Sets the proportional gain. Fails, leaving the gain unchanged, if `kp` is not finite.
    pub fn set_kp(&mut self, kp: f64) -> Result<(), PidError> {
        if !kp.is_finite() {
            return Err(PidError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the integral gain. Fails, leaving the gain unchanged, if `ki` is not finite.
    pub fn set_ki(&mut self, ki: f64) -> Result<(), PidError> {
        if !ki.is_finite() {
            return Err(PidError::InvalidIntegralGain);
        }
        self.ki = ki;
        Ok(())
    }

    /// Sets the derivative gain. Fails, leaving the gain unchanged, if `kd` is not finite.
    pub fn set_kd(&mut self, kd: f64) -> Result<(), PidError> {
        if !kd.is_finite() {
            return Err(PidError::InvalidDerivativeGain);
        }
        self.kd = kd;
        Ok(())
    }

    /// Convenience method to set the proportional, integral, and derivative gains together
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) -> Result<(), PidError> {
        self.set_kp(kp)?;
        self.set_ki(ki)?;
        self.set_kd(kd)
    }

    /// The controller as a transfer function, `(Kd·s² + Kp·s + Ki) / s`.
    pub fn transfer_function(&self) -> TransferFunction {
        TransferFunction::from_parts(vec![self.kd, self.kp, self.ki].into(), vec![1.0, 0.0].into())
    }
}

impl fmt::Display for PidController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID(s) = ({:.4})s² + ({:.4})s + ({:.4}) / s",
            self.kd, self.kp, self.ki
        )
    }
}
