use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Every CoinCap collection endpoint wraps its payload as `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(deserialize_with = "rank_from_value")]
    pub rank: u32,
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub explorer: Option<String>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub price_usd: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub market_cap_usd: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub supply: String,
    #[serde(default)]
    pub max_supply: Option<String>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub volume_usd24_hr: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub change_percent24_hr: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Fiat,
    Crypto,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub currency_symbol: Option<String>,
    #[serde(rename = "type")]
    pub rate_type: RateType,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub rate_usd: String,
}

impl Rate {
    pub fn is_fiat(&self) -> bool {
        self.rate_type == RateType::Fiat
    }
}

// CoinCap sends the rank as a string ("1"); numbers are taken as well.
// Going through `Value` keeps this working under `arbitrary_precision`.
fn rank_from_value<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| D::Error::custom(format!("invalid rank '{}': {}", s, e))),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid rank {}", n))),
        other => Err(D::Error::custom(format!("invalid rank {}", other))),
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSETS_BODY: &str = r#"{
        "data": [
            {
                "id": "bitcoin",
                "rank": "1",
                "symbol": "BTC",
                "name": "Bitcoin",
                "supply": "19000000.0000000000000000",
                "maxSupply": "21000000.0000000000000000",
                "marketCapUsd": "1234567890123.4567",
                "volumeUsd24Hr": "9876543210.12",
                "priceUsd": "64977.1234567",
                "changePercent24Hr": "-1.2345",
                "vwap24Hr": "65000.1",
                "explorer": "https://blockchain.info/"
            },
            {
                "id": "tether",
                "rank": 3,
                "symbol": "USDT",
                "name": "Tether",
                "supply": "110000000000",
                "maxSupply": null,
                "marketCapUsd": "110000000000",
                "volumeUsd24Hr": "40000000000",
                "priceUsd": "1.0001",
                "changePercent24Hr": null,
                "explorer": null
            }
        ],
        "timestamp": 1700000000000
    }"#;

    #[test]
    fn test_parse_assets_envelope() {
        let envelope: Envelope<Asset> = serde_json::from_str(ASSETS_BODY).unwrap();
        assert_eq!(2, envelope.data.len());

        let btc = &envelope.data[0];
        assert_eq!(1, btc.rank);
        assert_eq!("BTC", btc.symbol);
        assert_eq!(Some("21000000.0000000000000000".to_string()), btc.max_supply);
        assert_eq!("-1.2345", btc.change_percent24_hr);
        assert_eq!("9876543210.12", btc.volume_usd24_hr);

        let usdt = &envelope.data[1];
        assert_eq!(3, usdt.rank);
        assert_eq!(None, usdt.max_supply);
        assert_eq!(None, usdt.explorer);
        assert_eq!("", usdt.change_percent24_hr);
    }

    #[test]
    fn test_parse_rates_envelope() {
        let body = r#"{"data":[
            {"id":"euro","symbol":"EUR","currencySymbol":"€","type":"fiat","rateUsd":"1.0812"},
            {"id":"ethereum","symbol":"ETH","currencySymbol":null,"type":"crypto","rateUsd":"1800.5"}
        ]}"#;
        let envelope: Envelope<Rate> = serde_json::from_str(body).unwrap();

        assert!(envelope.data[0].is_fiat());
        assert_eq!(Some("€".to_string()), envelope.data[0].currency_symbol);
        assert_eq!(RateType::Crypto, envelope.data[1].rate_type);
        assert_eq!("1800.5", envelope.data[1].rate_usd);
    }

    #[test]
    fn test_reject_bad_rank() {
        let body = r#"{"data":[{"id":"x","rank":"first","symbol":"X","name":"X"}]}"#;
        assert!(serde_json::from_str::<Envelope<Asset>>(body).is_err());
    }
}
