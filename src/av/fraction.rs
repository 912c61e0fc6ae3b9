use crate::error::{Result, VdkError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Exact rational value, used for durations and frame rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub num: u64,
    pub den: u64,
}

impl Fraction {
    pub const fn new(num: u64, den: u64) -> Self {
        Self { num, den }
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// True if `ticks / timescale` is strictly greater than this value.
    ///
    /// Compared by cross-multiplication in 128 bits, no floating point.
    pub fn exceeded_by(&self, ticks: u64, timescale: u32) -> bool {
        (ticks as u128) * (self.den as u128) > (self.num as u128) * (timescale as u128)
    }

    /// This value expressed in `timescale` ticks, rounded down.
    pub fn to_ticks(&self, timescale: u32) -> u64 {
        if self.den == 0 {
            return 0;
        }
        ((self.num as u128) * (timescale as u128) / (self.den as u128)) as u64
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self { num: 0, den: 1 }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Fraction {
    type Err = VdkError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let fraction = match s.split_once('/') {
            Some((num, den)) => Fraction::new(num.trim().parse()?, den.trim().parse()?),
            None => Fraction::new(s.parse()?, 1),
        };
        if fraction.den == 0 {
            return Err(VdkError::Config(format!("zero denominator in '{}'", s)));
        }
        Ok(fraction)
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Whole(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Whole(n) => Ok(Fraction::new(n, 1)),
        }
    }
}
