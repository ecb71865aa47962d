use crate::error::ResolutionError;
use crate::types::ResolvedCallable;
use num_traits::{One, Zero};
use std::collections::HashMap;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

/// A number system the rewritten expressions can be evaluated in.
///
/// Implementors only provide arithmetic and [`Algebra::chain`]; every
/// elementary function is derived from its value and first two derivatives
/// at the real part.
pub trait Algebra:
    Copy
    + Debug
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// A value with zero infinitesimal parts.
    fn constant(value: f64) -> Self;

    /// The differentiation variable at `value`.
    fn seed(value: f64) -> Self;

    fn real(&self) -> f64;

    /// True when every infinitesimal part is zero.
    fn is_constant(&self) -> bool;

    /// Applies a scalar function with value `f`, first derivative `df` and
    /// second derivative `d2f` at `self.real()`.
    fn chain(self, f: f64, df: f64, d2f: f64) -> Self;

    fn inv(self) -> Self {
        let a = self.real();
        self.chain(1.0 / a, -1.0 / (a * a), 2.0 / (a * a * a))
    }

    fn abs(self) -> Self {
        let a = self.real();
        self.chain(a.abs(), a.signum(), 0.0)
    }

    fn acos(self) -> Self {
        let a = self.real();
        let s = 1.0 - a * a;
        self.chain(a.acos(), -1.0 / s.sqrt(), -a / (s * s.sqrt()))
    }

    fn acosh(self) -> Self {
        let a = self.real();
        let s = a * a - 1.0;
        self.chain(a.acosh(), 1.0 / s.sqrt(), -a / (s * s.sqrt()))
    }

    fn asin(self) -> Self {
        let a = self.real();
        let s = 1.0 - a * a;
        self.chain(a.asin(), 1.0 / s.sqrt(), a / (s * s.sqrt()))
    }

    fn asinh(self) -> Self {
        let a = self.real();
        let s = a * a + 1.0;
        self.chain(a.asinh(), 1.0 / s.sqrt(), -a / (s * s.sqrt()))
    }

    fn atan(self) -> Self {
        let a = self.real();
        let s = 1.0 + a * a;
        self.chain(a.atan(), 1.0 / s, -2.0 * a / (s * s))
    }

    fn atanh(self) -> Self {
        let a = self.real();
        let s = 1.0 - a * a;
        self.chain(a.atanh(), 1.0 / s, 2.0 * a / (s * s))
    }

    fn cos(self) -> Self {
        let a = self.real();
        self.chain(a.cos(), -a.sin(), -a.cos())
    }

    fn cosh(self) -> Self {
        let a = self.real();
        self.chain(a.cosh(), a.sinh(), a.cosh())
    }

    fn exp(self) -> Self {
        let e = self.real().exp();
        self.chain(e, e, e)
    }

    fn log(self) -> Self {
        let a = self.real();
        self.chain(a.ln(), 1.0 / a, -1.0 / (a * a))
    }

    fn sin(self) -> Self {
        let a = self.real();
        self.chain(a.sin(), a.cos(), -a.sin())
    }

    fn sinh(self) -> Self {
        let a = self.real();
        self.chain(a.sinh(), a.cosh(), a.sinh())
    }

    fn sqrt(self) -> Self {
        let a = self.real();
        let s = a.sqrt();
        self.chain(s, 0.5 / s, -0.25 / (a * s))
    }

    fn tan(self) -> Self {
        let t = self.real().tan();
        let sec2 = 1.0 + t * t;
        self.chain(t, sec2, 2.0 * t * sec2)
    }

    fn tanh(self) -> Self {
        let t = self.real().tanh();
        let sech2 = 1.0 - t * t;
        self.chain(t, sech2, -2.0 * t * sech2)
    }

    /// `self ^ exponent`. A constant exponent uses the power rule so negative
    /// bases stay finite; otherwise `exp(exponent * ln(self))`.
    fn pow(self, exponent: Self) -> Self {
        if exponent.is_constant() {
            let a = self.real();
            let n = exponent.real();
            return self.chain(
                a.powf(n),
                n * a.powf(n - 1.0),
                n * (n - 1.0) * a.powf(n - 2.0),
            );
        }
        (exponent * self.log()).exp()
    }
}

/// Source collaborator: turns an import path and a function or
/// `Type.method` name into a resolved callable.
pub trait Resolve {
    fn resolve(&self, path: &str, name: &str) -> Result<ResolvedCallable, ResolutionError>;

    /// Named constants of the module at `path`, used when evaluating a
    /// generated derivative that refers to them.
    fn constants(&self, _path: &str) -> Result<HashMap<String, f64>, ResolutionError> {
        Ok(HashMap::new())
    }
}

impl<R: Resolve + ?Sized> Resolve for &R {
    fn resolve(&self, path: &str, name: &str) -> Result<ResolvedCallable, ResolutionError> {
        (**self).resolve(path, name)
    }

    fn constants(&self, path: &str) -> Result<HashMap<String, f64>, ResolutionError> {
        (**self).constants(path)
    }
}
