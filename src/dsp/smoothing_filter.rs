//! one pole smoother used for the tuner cents readout and for parameter
//! ramps in the preprocessor.
use num::{Float, FromPrimitive, Zero};
use std::fmt::{self, Display};

use crate::utils::get_coef;

pub struct SmoothingFilter<T> {
    coef: T,
    last_output: T,
}

impl<T: Float + FromPrimitive> SmoothingFilter<T> {
    /// coefficient derived from a time constant in seconds at a given
    /// update rate (samples or frames per second)
    pub fn build(time_const: T, rate: T) -> SmoothingFilter<T> {
        SmoothingFilter {
            coef: get_coef(time_const, rate),
            last_output: Zero::zero(),
        }
    }

    /// fixed per-update blend factor (e.g. 0.2 for the cents smoother)
    pub fn from_alpha(alpha: T) -> SmoothingFilter<T> {
        SmoothingFilter {
            coef: alpha,
            last_output: Zero::zero(),
        }
    }

    pub fn get(&mut self, input: T) -> T {
        let one = T::from_i32(1).unwrap();
        self.last_output = input * self.coef + (one - self.coef) * self.last_output;
        self.last_output
    }
    pub fn get_last_output(&self) -> T {
        self.last_output
    }
    /// snap the filter to a value, bypassing the ramp.  Used when the tuner
    /// locks onto a new target and the old reading is meaningless.
    pub fn reset_to(&mut self, value: T) -> () {
        self.last_output = value;
    }
    /// pull the output toward zero by a factor without new input.  Used on
    /// silent frames so the needle relaxes toward center.
    pub fn decay(&mut self, factor: T) -> T {
        self.last_output = self.last_output * factor;
        self.last_output
    }
}

impl<T: Float + FromPrimitive + Display> Display for SmoothingFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ coef: {}, last_output: {} }}",
            self.coef, self.last_output
        )
    }
}
