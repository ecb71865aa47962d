use crate::traits::Algebra;
use num_traits::{One, Zero};
use std::ops::{Add, Mul, Neg, Sub};

/// Dual number for first derivatives.
/// real: real part
/// emag: coefficient of the infinitesimal (ε² = 0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Dual {
    pub real: f64,
    pub emag: f64,
}

impl Dual {
    pub fn new(real: f64, emag: f64) -> Self {
        Self { real, emag }
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.real == 0.0 && self.emag == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.real + rhs.real, self.emag + rhs.emag)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.real - rhs.real, self.emag - rhs.emag)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.real * rhs.real,
            self.real * rhs.emag + self.emag * rhs.real,
        )
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.real, -self.emag)
    }
}

impl Algebra for Dual {
    fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }
    fn seed(value: f64) -> Self {
        Self::new(value, 1.0)
    }
    fn real(&self) -> f64 {
        self.real
    }
    fn is_constant(&self) -> bool {
        self.emag == 0.0
    }
    fn chain(self, f: f64, df: f64, _d2f: f64) -> Self {
        Self::new(f, df * self.emag)
    }
}

/// Hyperdual number for exact second derivatives.
///
/// Two independent infinitesimals with ε1² = ε2² = 0 and ε1ε2 ≠ 0. Seeding
/// both with 1 leaves f'(x) in `e1mag` (and `e2mag`) and f''(x) in
/// `e1e2mag`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HyperDual {
    pub real: f64,
    pub e1mag: f64,
    pub e2mag: f64,
    pub e1e2mag: f64,
}

impl HyperDual {
    pub fn new(real: f64, e1mag: f64, e2mag: f64, e1e2mag: f64) -> Self {
        Self {
            real,
            e1mag,
            e2mag,
            e1e2mag,
        }
    }
}

impl Zero for HyperDual {
    fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.real == 0.0 && self.is_constant()
    }
}

impl One for HyperDual {
    fn one() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl Add for HyperDual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.real + rhs.real,
            self.e1mag + rhs.e1mag,
            self.e2mag + rhs.e2mag,
            self.e1e2mag + rhs.e1e2mag,
        )
    }
}

impl Sub for HyperDual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.real - rhs.real,
            self.e1mag - rhs.e1mag,
            self.e2mag - rhs.e2mag,
            self.e1e2mag - rhs.e1e2mag,
        )
    }
}

impl Mul for HyperDual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.real * rhs.real,
            self.real * rhs.e1mag + self.e1mag * rhs.real,
            self.real * rhs.e2mag + self.e2mag * rhs.real,
            self.real * rhs.e1e2mag
                + self.e1mag * rhs.e2mag
                + self.e2mag * rhs.e1mag
                + self.e1e2mag * rhs.real,
        )
    }
}

impl Neg for HyperDual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.real, -self.e1mag, -self.e2mag, -self.e1e2mag)
    }
}

impl Algebra for HyperDual {
    fn constant(value: f64) -> Self {
        Self::new(value, 0.0, 0.0, 0.0)
    }
    fn seed(value: f64) -> Self {
        Self::new(value, 1.0, 1.0, 0.0)
    }
    fn real(&self) -> f64 {
        self.real
    }
    fn is_constant(&self) -> bool {
        self.e1mag == 0.0 && self.e2mag == 0.0 && self.e1e2mag == 0.0
    }
    fn chain(self, f: f64, df: f64, d2f: f64) -> Self {
        Self::new(
            f,
            df * self.e1mag,
            df * self.e2mag,
            df * self.e1e2mag + d2f * self.e1mag * self.e2mag,
        )
    }
}
