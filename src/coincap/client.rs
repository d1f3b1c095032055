use crate::coincap::error::MarketError;
use crate::coincap::model::{Asset, Envelope, Rate};
use reqwest::header;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.coincap.io/v2/";

/// Query parameters for the `assets` collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl AssetQuery {
    pub fn search(term: &str) -> Self {
        Self {
            search: Some(term.to_string()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(term) = self.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                params.push(("search", term.to_string()));
            }
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Anything that can hand out the asset and rate listings.
pub trait MarketSource {
    fn fetch_assets_list(
        &self,
        query: &AssetQuery,
    ) -> impl Future<Output = Result<Vec<Asset>, MarketError>> + Send;

    fn fetch_rates_list(&self) -> impl Future<Output = Result<Vec<Rate>, MarketError>> + Send;
}

#[derive(Clone, Debug)]
pub struct MarketClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MarketClient {
    pub fn new(base_url: &str) -> Result<Self, MarketError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<T>, MarketError> {
        let url = format!("{}{}", self.base_url, collection);
        debug!("Sending request to {} with params {:?}", url, params);

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("CoinCap API answered {} for {}", status, collection);
            return Err(MarketError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(body.as_str())?;
        debug!("Got {} {} from CoinCap API", envelope.data.len(), collection);

        Ok(envelope.data)
    }
}

impl MarketSource for MarketClient {
    #[instrument(skip(self))]
    async fn fetch_assets_list(&self, query: &AssetQuery) -> Result<Vec<Asset>, MarketError> {
        self.get_collection("assets", &query.to_params()).await
    }

    #[instrument(skip(self))]
    async fn fetch_rates_list(&self) -> Result<Vec<Rate>, MarketError> {
        self.get_collection("rates", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers a single request with a canned response and hands back the
    /// request line it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{}/", addr), handle)
    }

    #[test]
    fn test_query_params() {
        assert!(AssetQuery::default().to_params().is_empty());
        assert!(AssetQuery::search("   ").to_params().is_empty());
        assert_eq!(
            vec![("search", "doge".to_string()), ("limit", "50".to_string())],
            AssetQuery::search(" doge ").with_limit(Some(50)).to_params()
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = MarketClient::new("http://localhost:8080/v2").unwrap();
        assert_eq!("http://localhost:8080/v2/", client.base_url());

        let client = MarketClient::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(DEFAULT_BASE_URL, client.base_url());
    }

    #[tokio::test]
    async fn test_fetch_assets_list() {
        let body = r#"{"data":[{"id":"dogecoin","rank":"9","symbol":"DOGE","name":"Dogecoin","supply":"140000000000","maxSupply":null,"marketCapUsd":"14000000000","volumeUsd24Hr":"500000000","priceUsd":"0.1","changePercent24Hr":"2.5","explorer":null}],"timestamp":1}"#;
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let client = MarketClient::new(&base_url).unwrap();

        let query = AssetQuery::search("doge").with_limit(Some(5));
        let assets = client.fetch_assets_list(&query).await.unwrap();

        assert_eq!(1, assets.len());
        assert_eq!(9, assets[0].rank);
        assert_eq!("DOGE", assets[0].symbol);
        assert_eq!("GET /assets?search=doge&limit=5 HTTP/1.1", server.await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_rates_list() {
        let body = r#"{"data":[{"id":"euro","symbol":"EUR","currencySymbol":"€","type":"fiat","rateUsd":"1.08"}]}"#;
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let client = MarketClient::new(&base_url).unwrap();

        let rates = client.fetch_rates_list().await.unwrap();
        assert_eq!(1, rates.len());
        assert!(rates[0].is_fiat());
        assert_eq!("GET /rates HTTP/1.1", server.await.unwrap());
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let client = MarketClient::new(&base_url).unwrap();

        let err = client.fetch_rates_list().await.unwrap_err();
        assert!(matches!(err, MarketError::HttpStatus(500)), "got {}", err);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", r#"{"items":[]}"#).await;
        let client = MarketClient::new(&base_url).unwrap();

        let err = client.fetch_assets_list(&AssetQuery::default()).await.unwrap_err();
        assert!(matches!(err, MarketError::JsonParse(_)), "got {}", err);
        server.await.unwrap();
    }
}
