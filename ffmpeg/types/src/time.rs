/*!
    Timestamp and time-base types.
*/

use std::fmt;

/**
    A rational number, used for time bases and frame rates.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the reciprocal. A frame rate of 30/1 gives a time base of 1/30.
    */
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Returns true if both terms are positive.
    */
    pub const fn is_valid(self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/**
    Presentation or decode timestamp in units of some time base.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert this timestamp from one time base to another.

        Rounds to the nearest unit, halfway cases away from zero. Returns the
        timestamp unchanged if either time base is degenerate.
    */
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(rescale(self.0, from, to))
    }
}

/**
    Duration in units of some time base.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(rescale(self.0, from, to))
    }
}

fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    if from == to || !from.is_valid() || !to.is_valid() {
        return value;
    }

    // value * from.num / from.den expressed in units of to.num / to.den
    let num = i128::from(value) * i128::from(from.num) * i128::from(to.den);
    let den = i128::from(from.den) * i128::from(to.num);
    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };

    rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
