use crate::coincap::model::Rate;
use crate::format::{parse_decimal, Currency};
use bigdecimal::Zero;
use std::error;
use std::fmt;
use tracing::debug;

/// Input that resets the selection to USD.
pub const DEFAULT_SELECTION: &str = "default";

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionError {
    NoMatchingRate(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SelectionError::NoMatchingRate(ref symbol) => {
                write!(f, "No fiat rate matches '{}'", symbol)
            }
        }
    }
}

impl error::Error for SelectionError {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurrencySelection {
    current: Currency,
}

impl CurrencySelection {
    pub fn current(&self) -> &Currency {
        &self.current
    }

    /// Switches the display currency. A failed lookup keeps the previous
    /// selection.
    pub fn select(&mut self, input: &str, rates: &[Rate]) -> Result<&Currency, SelectionError> {
        let input = input.trim();
        if input.eq_ignore_ascii_case(DEFAULT_SELECTION) {
            self.current = Currency::usd();
            return Ok(&self.current);
        }

        let currency = rates
            .iter()
            .filter(|rate| rate.is_fiat() && rate.symbol.eq_ignore_ascii_case(input))
            .find_map(|rate| match parse_decimal(&rate.rate_usd) {
                Ok(rate_usd) if !rate_usd.is_zero() => Some(Currency {
                    rate_usd,
                    symbol: rate.symbol.clone(),
                    sign: rate.currency_symbol.clone(),
                }),
                _ => {
                    debug!("Skipping fiat rate {} with unusable rateUsd '{}'", rate.symbol, rate.rate_usd);
                    None
                }
            })
            .ok_or_else(|| SelectionError::NoMatchingRate(input.to_string()))?;

        self.current = currency;
        Ok(&self.current)
    }
}

/// Symbols that can be picked as display currency: USD first, then every
/// other fiat rate in listing order.
pub fn selectable_symbols(rates: &[Rate]) -> Vec<String> {
    let mut symbols = vec!["USD".to_string()];
    for rate in rates.iter().filter(|rate| rate.is_fiat()) {
        if !symbols.iter().any(|s| s.eq_ignore_ascii_case(&rate.symbol)) {
            symbols.push(rate.symbol.clone());
        }
    }
    symbols
}
