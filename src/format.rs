//! Display formatting for asset fields.
//!
//! Every numeric field arrives from CoinCap as a decimal string. Parsing and
//! arithmetic stay in `BigDecimal` so repeated price and percentage
//! conversions do not drift, and rounding is always half-up.

use bigdecimal::{BigDecimal, One, RoundingMode, Zero};
use std::error;
use std::fmt;
use std::str::FromStr;

pub const INFINITY_SYMBOL: &str = "∞";
pub const INVALID_MARKER: &str = "N/A";

const MAX_SIGNIFICANT_DIGITS: usize = 8;
const SMALL_PRICE_THRESHOLD: &str = "0.0005";
// Bounds on parsed input; anything larger is not a market figure and would
// make rounding and digit expansion arbitrarily expensive.
const MAX_INPUT_DIGITS: usize = 64;
const MAX_INPUT_EXPONENT: i64 = 64;

/// The currency prices are displayed in. `rate_usd` is the CoinCap `rateUsd`
/// of `symbol`, and USD amounts are divided by it. `sign` is the glyph the
/// rate listing supplies (CoinCap `currencySymbol`), if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Currency {
    pub rate_usd: BigDecimal,
    pub symbol: String,
    pub sign: Option<String>,
}

impl Currency {
    pub fn usd() -> Self {
        Self {
            rate_usd: BigDecimal::one(),
            symbol: "USD".to_string(),
            sign: Some("$".to_string()),
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvalidValue {
    raw: String,
}

impl InvalidValue {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid numeric value: '{}'", self.raw)
    }
}

impl error::Error for InvalidValue {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

/// A 24h change rounded to two decimals, tagged with its sign for styling.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub percent: BigDecimal,
    pub polarity: Polarity,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", plain_string(&self.percent))
    }
}

pub fn format_price(raw: &str, currency: &Currency) -> Result<String, InvalidValue> {
    let value = parse_decimal(raw)?;
    if currency.rate_usd.is_zero() {
        return Err(InvalidValue::new(raw));
    }

    let price = &value / &currency.rate_usd;
    let rounded = round_half_up(&price, price_scale(&price));
    let significant = round_significant(&rounded, MAX_SIGNIFICANT_DIGITS);

    Ok(currency_string(&significant, currency))
}

pub fn format_supply(
    supply: &str,
    max: Option<&str>,
    as_percent: bool,
) -> Result<String, InvalidValue> {
    let max = max.filter(|m| !m.trim().is_empty());

    if !as_percent {
        let supply = round_half_up(&parse_decimal(supply)?, 0);
        let max = match max {
            Some(max) => plain_string(&round_half_up(&parse_decimal(max)?, 0)),
            None => INFINITY_SYMBOL.to_string(),
        };
        return Ok(format!("{}/{}", plain_string(&supply), max));
    }

    let max = match max {
        Some(max) => parse_decimal(max)?,
        None => return Ok(INFINITY_SYMBOL.to_string()),
    };
    let supply = parse_decimal(supply)?;

    // supply / 0 has no finite ratio; such assets are shown as fully issued.
    if max.is_zero() {
        return Ok("100%".to_string());
    }

    let percent = round_half_up(&(&supply * BigDecimal::from(100) / &max), 2);
    Ok(format!("{}%", plain_string(&percent)))
}

pub fn format_changes(raw: &str) -> Result<Change, InvalidValue> {
    let percent = round_half_up(&parse_decimal(raw)?, 2);
    let polarity = if percent < BigDecimal::zero() {
        Polarity::Negative
    } else {
        Polarity::Positive
    };

    Ok(Change { percent, polarity })
}

pub fn parse_decimal(raw: &str) -> Result<BigDecimal, InvalidValue> {
    let value = BigDecimal::from_str(raw.trim()).map_err(|_| InvalidValue::new(raw))?;

    let (int_val, scale) = value.as_bigint_and_exponent();
    let digits = int_val.to_string().trim_start_matches('-').len();
    if digits > MAX_INPUT_DIGITS || scale.abs() > MAX_INPUT_EXPONENT {
        return Err(InvalidValue::new(raw));
    }
    Ok(value)
}

fn price_scale(price: &BigDecimal) -> i64 {
    let small = BigDecimal::from_str(SMALL_PRICE_THRESHOLD).unwrap_or_else(|_| BigDecimal::zero());

    if *price > BigDecimal::one() {
        2
    } else if *price > small {
        4
    } else {
        8
    }
}

fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    value.with_scale_round(scale, RoundingMode::HalfUp)
}

fn round_significant(value: &BigDecimal, digits: usize) -> BigDecimal {
    if value.is_zero() {
        return BigDecimal::zero();
    }

    let (int_val, scale) = value.as_bigint_and_exponent();
    let len = int_val.to_string().trim_start_matches('-').len();
    if len <= digits {
        return value.clone();
    }

    round_half_up(value, scale - (len - digits) as i64)
}

/// Splits into sign, integer digits and fractional digits with trailing
/// zeros removed. Never goes through scientific notation.
fn decimal_parts(value: &BigDecimal) -> (bool, String, String) {
    let (int_val, scale) = value.as_bigint_and_exponent();
    let raw = int_val.to_string();
    let (mut negative, digits) = match raw.strip_prefix('-') {
        Some(digits) => (true, digits.to_string()),
        None => (false, raw),
    };

    let (int_part, frac_part) = if scale <= 0 {
        (format!("{}{}", digits, "0".repeat(scale.unsigned_abs() as usize)), String::new())
    } else {
        let scale = scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        (int_part.to_string(), frac_part.to_string())
    };

    let frac_part = frac_part.trim_end_matches('0').to_string();
    let int_part = match int_part.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    };
    if int_part == "0" && frac_part.is_empty() {
        negative = false;
    }

    (negative, int_part, frac_part)
}

fn join_parts(int_part: &str, frac_part: &str) -> String {
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

fn plain_string(value: &BigDecimal) -> String {
    let (negative, int_part, frac_part) = decimal_parts(value);
    let sign = if negative { "-" } else { "" };
    format!("{}{}", sign, join_parts(&int_part, &frac_part))
}

fn group_thousands(int_part: &str) -> String {
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn currency_prefix(currency: &Currency) -> String {
    if let Some(sign) = currency.sign.as_deref().map(str::trim) {
        if !sign.is_empty() {
            return sign.to_string();
        }
    }

    let code = currency.symbol.as_str();
    let glyph = match code.to_ascii_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "INR" => "₹",
        "KRW" => "₩",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        "BRL" => "R$",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "MXN" => "MX$",
        "TWD" => "NT$",
        _ => return format!("{}\u{a0}", code),
    };
    glyph.to_string()
}

fn currency_string(value: &BigDecimal, currency: &Currency) -> String {
    let (negative, int_part, frac_part) = decimal_parts(value);
    let sign = if negative { "-" } else { "" };

    format!(
        "{}{}{}",
        sign,
        currency_prefix(currency),
        join_parts(&group_thousands(&int_part), &frac_part)
    )
}
