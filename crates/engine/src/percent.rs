use std::{fmt, str::FromStr};

use crate::{EngineError, MoneyCents};

/// Scale factor between raw units and whole percents (4 implied decimals).
const E4: i64 = 10_000;

/// Fixed-point percentage with **4 implied decimal places**.
///
/// The raw value counts ten-thousandths of a percent, so `33.3333%` is stored
/// as `333_333` and `100.0000%` as `1_000_000`. Percentage-sum validation is
/// plain integer equality at this scale: there is no tolerance band, and no
/// floating-point value ever enters the comparison.
///
/// ```rust
/// use engine::Percent;
///
/// let third = Percent::from_e4(33_3333);
/// assert_eq!(third.to_string(), "33.3333%");
/// assert_eq!("33.3333".parse::<Percent>().unwrap(), third);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    /// Exactly `100.0000%`, the required sum of a percentage split.
    pub const ONE_HUNDRED: Percent = Percent(100 * E4);

    /// Creates a percentage from raw ten-thousandths of a percent.
    #[must_use]
    pub const fn from_e4(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value in ten-thousandths of a percent.
    #[must_use]
    pub const fn e4(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Percent) -> Option<Percent> {
        self.0.checked_add(rhs.0).map(Percent)
    }

    /// This percentage of `total`, rounded to cents with **round-half-up**
    /// (ties away from zero).
    ///
    /// The multiplication runs in 128-bit so the intermediate product cannot
    /// overflow; `None` is returned only if the final amount does not fit in
    /// cents.
    #[must_use]
    pub fn share_of(self, total: MoneyCents) -> Option<MoneyCents> {
        // total * (pct_e4 / 10^4) / 100 == total * pct_e4 / 10^6
        const SCALE: i128 = 1_000_000;
        let product = i128::from(total.cents()) * i128::from(self.0);
        let mut cents = product / SCALE;
        if (product % SCALE).unsigned_abs() * 2 >= SCALE.unsigned_abs() {
            cents += product.signum();
        }
        i64::try_from(cents).ok().map(MoneyCents::new)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:04}%", abs / E4 as u64, abs % E4 as u64)
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    /// Parses a decimal percentage string (at most 4 fractional digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid percentage: {s}"));

        let trimmed = s.trim().trim_end_matches('%');
        let (sign, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (-1i64, stripped),
            None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest, ""),
        };
        if units_str.is_empty()
            || !units_str.bytes().all(|b| b.is_ascii_digit())
            || !frac_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_str.len() > 4 {
            return Err(EngineError::InvalidAmount(
                "too many decimals in percentage".to_string(),
            ));
        }

        let units: i64 = units_str.parse().map_err(|_| invalid())?;
        let mut frac: i64 = if frac_str.is_empty() {
            0
        } else {
            frac_str.parse().map_err(|_| invalid())?
        };
        for _ in frac_str.len()..4 {
            frac *= 10;
        }

        let value = units
            .checked_mul(E4)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(invalid)?;
        Ok(Percent(sign * value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_four_decimals() {
        assert_eq!(Percent::from_e4(33_3333).to_string(), "33.3333%");
        assert_eq!(Percent::ONE_HUNDRED.to_string(), "100.0000%");
        assert_eq!(Percent::from_e4(1).to_string(), "0.0001%");
    }

    #[test]
    fn parse_round_trips() {
        assert_eq!("33.3333".parse::<Percent>().unwrap().e4(), 33_3333);
        assert_eq!("1".parse::<Percent>().unwrap().e4(), 1_0000);
        assert_eq!("99.99".parse::<Percent>().unwrap().e4(), 99_9900);
        assert!("33.33333".parse::<Percent>().is_err());
        assert!("".parse::<Percent>().is_err());
    }

    #[test]
    fn share_of_rounds_half_up() {
        let total = MoneyCents::new(100_00);
        // 33.3333% of 100.00 = 33.3333 → 33.33
        assert_eq!(
            Percent::from_e4(33_3333).share_of(total),
            Some(MoneyCents::new(33_33))
        );
        // 0.005% of 100.00 = 0.005 → 0.01 (half rounds up)
        assert_eq!(
            Percent::from_e4(50).share_of(total),
            Some(MoneyCents::new(1))
        );
        // 0.004% of 100.00 = 0.004 → 0.00
        assert_eq!(
            Percent::from_e4(40).share_of(total),
            Some(MoneyCents::new(0))
        );
    }

    #[test]
    fn share_of_whole_total_is_identity() {
        let total = MoneyCents::new(12_345);
        assert_eq!(Percent::ONE_HUNDRED.share_of(total), Some(total));
    }
}
