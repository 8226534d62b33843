//! Bybit v5 REST client for OHLCV candles
//!
//! Every request goes through one shared HTTP session and one rate limiter,
//! so concurrent `fetch_many` calls stay under the configured request rate.
//! Transient failures are retried with exponential backoff.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::data::{Candle, CandleSeries, Timeframe};
use crate::exchange::{DataFetchError, MarketDataSource, RateLimiter};

/// Bybit API base URLs
pub mod endpoints {
    /// Main API endpoint
    pub const MAINNET: &str = "https://api.bybit.com";
    /// Testnet API endpoint
    pub const TESTNET: &str = "https://api-testnet.bybit.com";
}

/// Largest `limit` the kline endpoint accepts
pub const MAX_KLINE_LIMIT: u32 = 1000;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct BybitConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Per-request timeout. A timed out request fails alone.
    pub timeout: Duration,
    pub min_request_interval: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub recv_window_ms: u64,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: endpoints::MAINNET.to_string(),
            api_key: None,
            api_secret: None,
            timeout: Duration::from_secs(10),
            min_request_interval: Duration::from_millis(100),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            recv_window_ms: 5000,
        }
    }
}

impl BybitConfig {
    pub fn from_shared(config: &shared::Config) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());
        Self {
            base_url: config.bybit_base_url.clone(),
            api_key: non_empty(&config.bybit_api_key),
            api_secret: non_empty(&config.bybit_api_secret),
            timeout: Duration::from_secs(config.request_timeout_secs),
            min_request_interval: Duration::from_millis(config.rate_limit_ms),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

/// Bybit API client
#[derive(Debug)]
pub struct BybitClient {
    client: Client,
    config: BybitConfig,
    limiter: RateLimiter,
}

/// Generic API response wrapper
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: Option<T>,
}

/// Kline (candlestick) response
#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}

impl BybitClient {
    pub fn new(config: BybitConfig) -> Result<Self, DataFetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DataFetchError::Http)?;
        let limiter = RateLimiter::new(config.min_request_interval);
        info!(
            "Bybit client ready ({}, signed: {})",
            config.base_url,
            config.api_key.is_some() && config.api_secret.is_some()
        );
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// Release the HTTP session. Dropping the client does the same; this
    /// makes the end of its scope explicit at call sites.
    pub fn close(self) {
        info!("Closing Bybit client");
    }

    async fn get_klines_once(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>, DataFetchError> {
        let query = format!(
            "category=spot&symbol={}&interval={}&limit={}",
            symbol,
            timeframe.to_bybit_interval(),
            limit
        );
        let url = format!(
            "{}/v5/market/kline?{}",
            self.config.base_url.trim_end_matches('/'),
            query
        );

        self.limiter.acquire().await;
        debug!("Fetching klines: {}", url);

        let mut request = self.client.get(&url);
        if let (Some(key), Some(secret)) = (&self.config.api_key, &self.config.api_secret) {
            let timestamp = Utc::now().timestamp_millis();
            let signature = sign_request(secret, key, timestamp, self.config.recv_window_ms, &query)?;
            request = request
                .header("X-BAPI-API-KEY", key)
                .header("X-BAPI-TIMESTAMP", timestamp.to_string())
                .header("X-BAPI-RECV-WINDOW", self.config.recv_window_ms.to_string())
                .header("X-BAPI-SIGN", signature);
        }

        let response = request.send().await.map_err(DataFetchError::from_transport)?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DataFetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(DataFetchError::Status(status.as_u16()));
        }
        let body = response.text().await.map_err(DataFetchError::from_transport)?;
        parse_kline_response(&body)
    }
}

#[async_trait]
impl MarketDataSource for BybitClient {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>, DataFetchError> {
        if limit == 0 {
            return Err(DataFetchError::InvalidParams("limit must be positive".into()));
        }
        let symbol = normalize_symbol(symbol)?;
        let limit = limit.min(MAX_KLINE_LIMIT);

        let mut attempt = 0u32;
        loop {
            match self.get_klines_once(&symbol, timeframe, limit).await {
                Ok(candles) => {
                    let mut series = CandleSeries::from_vec(candles);
                    series.truncate_front(limit as usize);
                    info!("Fetched {} {} candles for {}", series.len(), timeframe, symbol);
                    return Ok(series.into_vec());
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    warn!(
                        "Fetching {} failed ({}), retry {}/{} in {:?}",
                        symbol, err, attempt, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parse a `/v5/market/kline` body into candles, oldest first.
pub fn parse_kline_response(body: &str) -> Result<Vec<Candle>, DataFetchError> {
    let response: ApiResponse<KlineResult> =
        serde_json::from_str(body).map_err(|e| DataFetchError::Parse(e.to_string()))?;

    if response.ret_code != 0 {
        return Err(DataFetchError::from_ret_code(response.ret_code, response.ret_msg));
    }

    let result = response
        .result
        .ok_or_else(|| DataFetchError::Parse("No result in response".to_string()))?;

    let mut candles = Vec::with_capacity(result.list.len());
    for item in &result.list {
        candles.push(parse_kline_row(item)?);
    }
    // Bybit returns data in descending order
    candles.reverse();
    Ok(candles)
}

fn parse_kline_row(item: &[String]) -> Result<Candle, DataFetchError> {
    if item.len() < 6 {
        return Err(DataFetchError::Parse(format!("short kline row: {:?}", item)));
    }
    let number = |idx: usize| -> Result<f64, DataFetchError> {
        item[idx]
            .parse::<f64>()
            .map_err(|_| DataFetchError::Parse(format!("bad number {:?} in kline row", item[idx])))
    };
    let timestamp_ms: i64 = item[0]
        .parse()
        .map_err(|_| DataFetchError::Parse(format!("bad timestamp {:?}", item[0])))?;
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| DataFetchError::Parse(format!("timestamp out of range: {}", timestamp_ms)))?;

    Ok(Candle::new(
        timestamp,
        number(1)?,
        number(2)?,
        number(3)?,
        number(4)?,
        number(5)?,
    ))
}

/// "btc/usdt" -> "BTCUSDT"
pub fn normalize_symbol(symbol: &str) -> Result<String, DataFetchError> {
    let normalized: String = symbol
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '-')
        .collect::<String>()
        .to_uppercase();
    if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DataFetchError::InvalidParams(format!("invalid symbol: {:?}", symbol)));
    }
    Ok(normalized)
}

/// HMAC-SHA256 signature of a Bybit v5 GET request
fn sign_request(
    secret: &str,
    api_key: &str,
    timestamp_ms: i64,
    recv_window_ms: u64,
    query: &str,
) -> Result<String, DataFetchError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DataFetchError::Auth(e.to_string()))?;
    mac.update(format!("{}{}{}{}", timestamp_ms, api_key, recv_window_ms, query).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const KLINE_BODY: &str = r#"{
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "category": "spot",
            "symbol": "BTCUSDT",
            "list": [
                ["1700003600000", "101.0", "103.0", "100.5", "102.0", "12.5", "1270.0"],
                ["1700000000000", "100.0", "101.5", "99.0", "101.0", "10.0", "1005.0"]
            ]
        },
        "time": 1700003700000
    }"#;

    #[test]
    fn parses_klines_oldest_first() {
        let candles = parse_kline_response(KLINE_BODY).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[1].high, 103.0);
        assert_eq!(candles[1].volume, 12.5);
    }

    #[test]
    fn api_errors_surface_as_fetch_errors() {
        let body = r#"{"retCode": 10006, "retMsg": "Too many visits!", "result": {}}"#;
        assert!(matches!(parse_kline_response(body), Err(DataFetchError::RateLimited)));

        let body = r#"{"retCode": 10001, "retMsg": "Not supported symbols", "result": {}}"#;
        assert!(matches!(
            parse_kline_response(body),
            Err(DataFetchError::InvalidParams(_))
        ));
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let body = r#"{"retCode": 0, "retMsg": "OK", "result": {"list": [["1700000000000", "abc", "1", "1", "1", "1"]]}}"#;
        assert!(matches!(parse_kline_response(body), Err(DataFetchError::Parse(_))));
        assert!(matches!(parse_kline_response("<html>"), Err(DataFetchError::Parse(_))));
    }

    #[test]
    fn symbols_are_normalized() {
        assert_eq!(normalize_symbol("btc/usdt").unwrap(), "BTCUSDT");
        assert_eq!(normalize_symbol(" ETHUSDT ").unwrap(), "ETHUSDT");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("BTC USDT").is_err());
    }

    #[test]
    fn signature_matches_reference() {
        let signature = sign_request(
            "test-secret",
            "test-key",
            1_700_000_000_000,
            5000,
            "category=spot&symbol=BTCUSDT&interval=60&limit=2",
        )
        .unwrap();
        assert_eq!(
            signature,
            "53c3f03b2bcf8b2ce69d68b7ea223f7842d384611e2afcfd66e9e37141186245"
        );
    }

    #[tokio::test]
    async fn zero_limit_is_rejected_before_any_request() {
        let client = BybitClient::new(BybitConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BybitConfig::default()
        })
        .unwrap();
        let err = client.fetch("BTCUSDT", Timeframe::H1, 0).await.unwrap_err();
        assert!(matches!(err, DataFetchError::InvalidParams(_)));
        client.close();
    }

    /// Local HTTP server answering the n-th connection with `replies[n]`
    /// (the last reply repeats). Returns its base url and the request count.
    async fn stub_server(replies: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = replies[n.min(replies.len() - 1)];

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (url, hits)
    }

    fn stub_client(base_url: String, max_retries: u32) -> BybitClient {
        BybitClient::new(BybitConfig {
            base_url,
            timeout: Duration::from_millis(500),
            min_request_interval: Duration::ZERO,
            max_retries,
            retry_backoff: Duration::from_millis(10),
            ..BybitConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (url, hits) = stub_server(vec![(503, ""), (503, ""), (200, KLINE_BODY)]).await;
        let client = stub_client(url, 3);

        let candles = client.fetch("BTCUSDT", Timeframe::H1, 2).await.unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn status_error_surfaces_without_retries() {
        let (url, hits) = stub_server(vec![(503, "")]).await;
        let client = stub_client(url, 0);

        let err = client.fetch("BTCUSDT", Timeframe::H1, 2).await.unwrap_err();
        assert!(matches!(err, DataFetchError::Status(503)), "got {:?}", err);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let (url, hits) = stub_server(vec![(429, "")]).await;
        let client = stub_client(url, 1);

        let err = client.fetch("BTCUSDT", Timeframe::H1, 2).await.unwrap_err();
        assert!(matches!(err, DataFetchError::RateLimited), "got {:?}", err);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        // accept and hold connections without ever answering
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let client = BybitClient::new(BybitConfig {
            base_url: url,
            timeout: Duration::from_millis(200),
            min_request_interval: Duration::ZERO,
            max_retries: 0,
            ..BybitConfig::default()
        })
        .unwrap();

        let started = std::time::Instant::now();
        let err = client.fetch("BTCUSDT", Timeframe::H1, 2).await.unwrap_err();
        assert!(matches!(err, DataFetchError::Timeout), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
