use std::error;
use std::fmt;

#[derive(Debug)]
pub enum MarketError {
    HttpRequest(reqwest::Error),
    HttpStatus(u16),
    JsonParse(serde_json::Error),
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MarketError::HttpRequest(ref err) => write!(f, "HTTP Request Error: {}", err),
            MarketError::HttpStatus(code) => write!(f, "HTTP Status Error: {}", code),
            MarketError::JsonParse(ref err) => write!(f, "JSON Parse Error: {}", err),
        }
    }
}

impl error::Error for MarketError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            MarketError::HttpRequest(ref err) => Some(err),
            MarketError::JsonParse(ref err) => Some(err),
            MarketError::HttpStatus(_) => None,
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> MarketError {
        MarketError::HttpRequest(err)
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> MarketError {
        MarketError::JsonParse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_status_error() {
        let err = MarketError::HttpStatus(503);
        assert_eq!("HTTP Status Error: 503", format!("{}", err));
        assert!(error::Error::source(&err).is_none());
    }

    #[test]
    fn test_json_error_has_source() {
        let err: MarketError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(error::Error::source(&err).is_some());
        assert!(format!("{}", err).starts_with("JSON Parse Error: "));
    }
}
