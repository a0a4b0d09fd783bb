use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// How sub-cent digits are reduced when a value is brought to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Ties move away from zero (1.005 -> 1.01, -1.005 -> -1.01).
    #[default]
    HalfUp,
    /// Ties move to the even cent (2.665 -> 2.66, 2.675 -> 2.68).
    Bankers,
    /// Extra digits are dropped (toward zero).
    Truncate,
}

impl RoundingMode {
    pub fn from_env_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "half-up" | "half_up" | "halfup" => Some(Self::HalfUp),
            "bankers" | "half-even" | "half_even" => Some(Self::Bankers),
            "truncate" => Some(Self::Truncate),
            _ => None,
        }
    }
}

static ROUNDING_MODE: OnceCell<RoundingMode> = OnceCell::new();

/// Reads `MONEY_ROUNDING` once per process. Later calls return the mode chosen first.
pub fn init_rounding_mode_from_env() -> RoundingMode {
    *ROUNDING_MODE.get_or_init(|| match std::env::var("MONEY_ROUNDING") {
        Ok(raw) => RoundingMode::from_env_value(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "Unknown MONEY_ROUNDING value; falling back to half-up");
            RoundingMode::HalfUp
        }),
        Err(_) => RoundingMode::HalfUp,
    })
}

pub fn rounding_mode() -> RoundingMode {
    init_rounding_mode_from_env()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

// Rounds `value * 100` to an integral BigDecimal according to `mode`.
fn round_to_cents(value: &BigDecimal, mode: RoundingMode) -> BigDecimal {
    let zero = BigDecimal::from(0);
    let scaled = value.clone() * BigDecimal::from(100);
    // with_scale(0) drops digits toward zero.
    let truncated = scaled.with_scale(0);
    let remainder = (scaled.clone() - truncated.clone()).abs();
    if remainder == zero || mode == RoundingMode::Truncate {
        return truncated;
    }
    let step = if scaled < zero { BigDecimal::from(-1) } else { BigDecimal::from(1) };
    let twice = remainder * BigDecimal::from(2);
    let away = match twice.cmp(&BigDecimal::from(1)) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match mode {
            RoundingMode::HalfUp => true,
            RoundingMode::Bankers => truncated.to_i128().map(|c| c % 2 != 0).unwrap_or(false),
            RoundingMode::Truncate => false,
        },
    };
    if away { truncated + step } else { truncated }
}

/// Round a monetary value to 2 decimal places with an explicit mode.
pub fn round_with(value: &BigDecimal, mode: RoundingMode) -> BigDecimal {
    (round_to_cents(value, mode) / BigDecimal::from(100)).with_scale(2)
}

/// Normalize a monetary value to 2 decimal places using the process rounding mode.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    round_with(value, rounding_mode())
}

/// Fixed-point amount in minor units (cents).
///
/// Equality is exact on cents, so two amounts that print the same always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "AmountRepr")]
pub struct Money {
    cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn from_major(units: i64) -> Result<Self, MoneyError> {
        units
            .checked_mul(100)
            .map(Self::from_cents)
            .ok_or_else(|| MoneyError::OutOfRange(units.to_string()))
    }

    pub const fn as_cents(&self) -> i64 {
        self.cents
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Converts an arbitrary-scale decimal, rounding with the process mode.
    pub fn from_decimal(value: &BigDecimal) -> Result<Self, MoneyError> {
        Self::from_decimal_with(value, rounding_mode())
    }

    pub fn from_decimal_with(value: &BigDecimal, mode: RoundingMode) -> Result<Self, MoneyError> {
        round_to_cents(value, mode)
            .to_i64()
            .map(Self::from_cents)
            .ok_or_else(|| MoneyError::OutOfRange(value.to_string()))
    }

    /// Parses a plain decimal string in major units (`"1000"`, `"1234.56"`, `"-3.5"`).
    ///
    /// Grouping separators are not accepted here; callers strip them first.
    pub fn parse_major(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits, None),
        };
        let well_formed = !int_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
        if !well_formed {
            return Err(MoneyError::Invalid(raw.to_string()));
        }
        let decimal =
            BigDecimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(raw.to_string()))?;
        let money = Self::from_decimal(&decimal)?;
        debug!(input = trimmed, cents = money.cents, "Parsed major-unit amount");
        Ok(money)
    }

    pub fn to_decimal(&self) -> BigDecimal {
        (BigDecimal::from(self.cents) / BigDecimal::from(100)).with_scale(2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_major(s)
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

impl TryFrom<&BigDecimal> for Money {
    type Error = MoneyError;
    fn try_from(value: &BigDecimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

// Wire shape: "1234.56" or a whole number of major units.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Units(i64),
}

impl TryFrom<AmountRepr> for Money {
    type Error = MoneyError;
    fn try_from(value: AmountRepr) -> Result<Self, Self::Error> {
        match value {
            AmountRepr::Text(s) => Self::parse_major(&s),
            AmountRepr::Units(units) => Self::from_major(units),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn rounding_mode_is_read_once() {
        let first = init_rounding_mode_from_env();
        assert_eq!(rounding_mode(), first);
        assert_eq!(init_rounding_mode_from_env(), first);
    }

    #[test]
    fn env_values_map_to_modes() {
        assert_eq!(RoundingMode::from_env_value(" Half-Up "), Some(RoundingMode::HalfUp));
        assert_eq!(RoundingMode::from_env_value("bankers"), Some(RoundingMode::Bankers));
        assert_eq!(RoundingMode::from_env_value("TRUNCATE"), Some(RoundingMode::Truncate));
        assert_eq!(RoundingMode::from_env_value("ceil"), None);
    }

    #[test]
    fn half_up_moves_ties_away_from_zero() {
        assert_eq!(round_with(&dec("1.005"), RoundingMode::HalfUp).to_string(), "1.01");
        assert_eq!(round_with(&dec("-1.005"), RoundingMode::HalfUp).to_string(), "-1.01");
        assert_eq!(round_with(&dec("12.3449"), RoundingMode::HalfUp).to_string(), "12.34");
    }

    #[test]
    fn bankers_prefers_even_cent() {
        assert_eq!(round_with(&dec("2.665"), RoundingMode::Bankers).to_string(), "2.66");
        assert_eq!(round_with(&dec("2.675"), RoundingMode::Bankers).to_string(), "2.68");
        assert_eq!(round_with(&dec("2.6651"), RoundingMode::Bankers).to_string(), "2.67");
    }

    #[test]
    fn truncate_drops_extra_digits() {
        assert_eq!(round_with(&dec("12.3456"), RoundingMode::Truncate).to_string(), "12.34");
        assert_eq!(round_with(&dec("-12.3456"), RoundingMode::Truncate).to_string(), "-12.34");
    }

    #[test]
    fn parse_major_accepts_plain_decimals() {
        assert_eq!(Money::parse_major("1000").unwrap(), Money::from_cents(100_000));
        assert_eq!(Money::parse_major("1234.56").unwrap(), Money::from_cents(123_456));
        assert_eq!(Money::parse_major("0.5").unwrap(), Money::from_cents(50));
        assert_eq!(Money::parse_major("-3.25").unwrap(), Money::from_cents(-325));
    }

    #[test]
    fn parse_major_rejects_garbage() {
        for raw in ["", "1,000", "abc", "1.", ".5", "1e3", "--1", "12.3.4"] {
            assert!(
                matches!(Money::parse_major(raw), Err(MoneyError::Invalid(_))),
                "expected invalid for {raw:?}"
            );
        }
    }

    #[test]
    fn parse_major_reports_overflow() {
        let err = Money::parse_major("999999999999999999999999").unwrap_err();
        assert!(matches!(err, MoneyError::OutOfRange(_)));
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(50_000).to_string(), "500.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1_050).to_string(), "-10.50");
    }

    #[test]
    fn equal_regardless_of_written_scale() {
        assert_eq!(Money::parse_major("1000.00").unwrap(), Money::from_major(1000).unwrap());
    }

    #[test]
    fn serde_uses_string_and_accepts_units() {
        let json = serde_json::to_string(&Money::from_cents(123_456)).unwrap();
        assert_eq!(json, "\"1234.56\"");
        let from_text: Money = serde_json::from_str("\"500\"").unwrap();
        let from_units: Money = serde_json::from_str("500").unwrap();
        assert_eq!(from_text, from_units);
    }

    #[test]
    fn decimal_round_trip_keeps_scale() {
        assert_eq!(Money::from_cents(100).to_decimal().to_string(), "1.00");
    }
}
