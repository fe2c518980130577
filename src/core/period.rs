//! ISO-8601 date-based periods (`P1Y2M3D`, `P6M`, `-P2W`)

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{Result, SearchError};

static PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([-+]?)P(?:([-+]?[0-9]+)Y)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)W)?(?:([-+]?[0-9]+)D)?$",
    )
    .expect("period pattern is valid")
});

/// A date-based amount of time. Equality is component-wise, so `P12M` and
/// `P1Y` are different periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Period {
    pub const ZERO: Period = Period {
        years: 0,
        months: 0,
        days: 0,
    };

    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Months in this period with years folded in; days are ignored
    pub const fn total_months(&self) -> i64 {
        self.years as i64 * 12 + self.months as i64
    }

    /// Parse an ISO-8601 period. Weeks are folded into days.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |message: &str| SearchError::coercion(format!("\"{text}\""), "Period", message);

        let captures = PERIOD_PATTERN
            .captures(text.trim())
            .ok_or_else(|| invalid("expected an ISO-8601 period such as P1Y2M3D"))?;

        if (2..=5).all(|i| captures.get(i).is_none()) {
            return Err(invalid("a period needs at least one component"));
        }

        let component = |index: usize| -> Result<i32> {
            captures
                .get(index)
                .map(|m| m.as_str().parse::<i32>())
                .transpose()
                .map(|v| v.unwrap_or(0))
                .map_err(|_| invalid("period component out of range"))
        };

        let negative = captures.get(1).is_some_and(|m| m.as_str() == "-");
        let signed = |value: i32| -> Result<i32> {
            if negative {
                value
                    .checked_neg()
                    .ok_or_else(|| invalid("period component out of range"))
            } else {
                Ok(value)
            }
        };
        let weeks = component(4)?;
        let plain_days = component(5)?;
        let days = weeks
            .checked_mul(7)
            .and_then(|w| w.checked_add(plain_days))
            .ok_or_else(|| invalid("period component out of range"))?;

        Ok(Self {
            years: signed(component(2)?)?,
            months: signed(component(3)?)?,
            days: signed(days)?,
        })
    }
}

impl FromStr for Period {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "P0D");
        }
        write!(f, "P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("P6M", Period::new(0, 6, 0))]
    #[case("P1Y2M3D", Period::new(1, 2, 3))]
    #[case("P2W", Period::new(0, 0, 14))]
    #[case("P1W3D", Period::new(0, 0, 10))]
    #[case("-P1Y", Period::new(-1, 0, 0))]
    #[case("p-3d", Period::new(0, 0, -3))]
    fn test_parse(#[case] input: &str, #[case] expected: Period) {
        assert_eq!(Period::parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("P")]
    #[case("6M")]
    #[case("PT5H")]
    #[case("P99999999999Y")]
    #[case("-P-2147483648Y")]
    #[case("-P-2147483648D")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(matches!(
            Period::parse(input),
            Err(SearchError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_component_wise_equality() {
        assert_ne!(Period::parse("P12M").unwrap(), Period::parse("P1Y").unwrap());
        assert_eq!(
            Period::parse("P12M").unwrap().total_months(),
            Period::parse("P1Y").unwrap().total_months()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::new(1, 0, 5).to_string(), "P1Y5D");
        assert_eq!(Period::ZERO.to_string(), "P0D");
    }
}
