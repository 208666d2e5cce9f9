//! Yahoo Finance chart API integration (daily OHLCV).

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::MarketDataSource;
use crate::domain::{Bar, FetchConfig, UserSelection};
use crate::error::PipelineError;

const CHART_PATH: &str = "v8/finance/chart";
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; stock-dash/", env!("CARGO_PKG_VERSION"), ")");

/// Yahoo's error code for unknown or delisted symbols.
const NOT_FOUND_CODE: &str = "Not Found";

pub struct YahooClient {
    client: Client,
    config: FetchConfig,
}

impl YahooClient {
    pub fn new(config: FetchConfig) -> Result<Self, PipelineError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PipelineError::unavailable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/{CHART_PATH}/{ticker}", self.config.base_url.trim_end_matches('/'))
    }

    fn request_once(&self, selection: &UserSelection) -> Result<Vec<Bar>, Attempt> {
        let resp = self
            .client
            .get(self.chart_url(&selection.ticker))
            .query(&query_params(selection))
            .send()
            .map_err(|e| Attempt::Retryable(format!("Yahoo request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| Attempt::Retryable(format!("Failed to read Yahoo response: {e}")))?;

        if status.is_server_error() {
            return Err(Attempt::Retryable(format!("Yahoo request failed with status {status}.")));
        }

        // Unknown symbols come back as 404 with a structured error body, which
        // `parse_chart_response` turns into an empty series.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(Attempt::Fatal(PipelineError::unavailable(format!(
                "Yahoo request failed with status {status}."
            ))));
        }

        parse_chart_response(&body).map_err(Attempt::Fatal)
    }
}

impl MarketDataSource for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch_daily(&self, selection: &UserSelection) -> Result<Vec<Bar>, PipelineError> {
        let attempts = self.config.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.request_once(selection) {
                Ok(bars) => return Ok(bars),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retryable(msg)) if attempt < attempts => {
                    let wait = self.config.retry_backoff * attempt;
                    warn!(attempt, attempts, ?wait, "{msg}; retrying");
                    std::thread::sleep(wait);
                    attempt += 1;
                }
                Err(Attempt::Retryable(msg)) => return Err(PipelineError::DataUnavailable(msg)),
            }
        }
    }
}

enum Attempt {
    /// Transport errors and 5xx responses.
    Retryable(String),
    Fatal(PipelineError),
}

/// Query parameters for a daily chart request covering `[start, end]`.
///
/// `period2` is exclusive on Yahoo's side, so it points at the start of the
/// day after `end`.
fn query_params(selection: &UserSelection) -> [(&'static str, String); 4] {
    let end_exclusive = selection
        .end
        .checked_add_days(Days::new(1))
        .unwrap_or(selection.end);
    [
        ("period1", unix_midnight(selection.start).to_string()),
        ("period2", unix_midnight(end_exclusive).to_string()),
        ("interval", "1d".to_string()),
        ("events", "history".to_string()),
    ]
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Parse a `/v8/finance/chart` response body into bars.
///
/// - `chart.error.code == "Not Found"` yields an empty vector
/// - rows with a `null` in any OHLCV field are skipped
/// - anything structurally unexpected is `DataUnavailable`
pub fn parse_chart_response(body: &str) -> Result<Vec<Bar>, PipelineError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| PipelineError::unavailable(format!("Failed to parse Yahoo response: {e}")))?;

    if let Some(err) = envelope.chart.error {
        if err.code == NOT_FOUND_CODE {
            debug!(description = ?err.description, "symbol not found; treating as empty");
            return Ok(Vec::new());
        }
        return Err(PipelineError::unavailable(format!(
            "Yahoo error {}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        if result.timestamp.is_empty() {
            return Ok(Vec::new());
        }
        return Err(PipelineError::unavailable("Yahoo response has timestamps but no quotes."));
    };

    let offset = result.meta.gmtoffset;
    let mut out = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let date = ts
            .checked_add(offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| PipelineError::unavailable(format!("Invalid Yahoo timestamp {ts}.")))?;

        let row = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            skipped += 1;
            continue;
        };

        out.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: volume.max(0.0).round() as u64,
        });
    }

    if skipped > 0 {
        warn!(skipped, "dropped Yahoo rows with missing values");
    }

    Ok(out)
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (e.g. -18000 for New York in winter).
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    const NOT_FOUND_BODY: &str =
        r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
    const ONE_DAY_BODY: &str = r#"{"chart":{"result":[{
        "meta":{"gmtoffset":-18000},
        "timestamp":[1672756200],
        "indicators":{"quote":[{
            "open":[130.28],"high":[130.90],"low":[124.17],"close":[125.07],"volume":[112117500]
        }]}
    }],"error":null}}"#;

    /// Local HTTP server answering each request with the next canned
    /// `(status, body)`; the last one repeats. Returns the base URL and a hit
    /// counter.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }

                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
            }
        });

        (base_url, hits)
    }

    fn client(base_url: String, retries: u32) -> YahooClient {
        YahooClient::new(FetchConfig {
            base_url,
            timeout: Some(Duration::from_secs(5)),
            retries,
            retry_backoff: Duration::from_millis(1),
        })
        .unwrap()
    }

    fn aapl() -> UserSelection {
        UserSelection::new("AAPL", d(2023, 1, 1), d(2023, 1, 10))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period2_is_day_after_end() {
        let sel = UserSelection::new("AAPL", d(2023, 1, 1), d(2023, 1, 10));
        let params = query_params(&sel);
        assert_eq!(params[0], ("period1", "1672531200".to_string()));
        assert_eq!(params[1], ("period2", "1673395200".to_string()));
        assert_eq!(params[2].1, "1d");
    }

    #[test]
    fn chart_url_tolerates_trailing_slash() {
        let client = YahooClient::new(FetchConfig {
            base_url: "http://localhost:9/".to_string(),
            ..FetchConfig::default()
        })
        .unwrap();
        assert_eq!(client.chart_url("MSFT"), "http://localhost:9/v8/finance/chart/MSFT");
    }

    #[test]
    fn not_found_is_empty() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart_response(body).unwrap().is_empty());
    }

    #[test]
    fn other_api_errors_are_unavailable() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(
            parse_chart_response(body),
            Err(PipelineError::DataUnavailable(_))
        ));
    }

    #[test]
    fn malformed_body_is_unavailable() {
        assert!(matches!(
            parse_chart_response("<html>rate limited</html>"),
            Err(PipelineError::DataUnavailable(_))
        ));
    }

    #[test]
    fn empty_range_has_no_timestamps() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart_response(body).unwrap().is_empty());
    }

    #[test]
    fn null_rows_are_skipped_and_offset_applied() {
        // 2023-01-03 14:30 UTC and 2023-01-04 14:30 UTC; the second row has a null close.
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000},
            "timestamp":[1672756200,1672842600],
            "indicators":{"quote":[{
                "open":[130.28,126.89],
                "high":[130.90,128.66],
                "low":[124.17,125.08],
                "close":[125.07,null],
                "volume":[112117500,89113600]
            }]}
        }],"error":null}}"#;
        let bars = parse_chart_response(body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d(2023, 1, 3));
        assert_eq!(bars[0].volume, 112_117_500);
        assert!((bars[0].close - 125.07).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_timestamp_is_unavailable() {
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":3600},
            "timestamp":[9223372036854775000],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[1]}]}
        }],"error":null}}"#;
        match parse_chart_response(body) {
            Err(PipelineError::DataUnavailable(msg)) => assert!(msg.contains("Invalid Yahoo timestamp")),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_retried_until_attempts_run_out() {
        let (base_url, hits) = serve(vec![(500, "{}")]);
        let err = client(base_url, 2).fetch_daily(&aapl()).unwrap_err();

        assert!(matches!(&err, PipelineError::DataUnavailable(msg) if msg.contains("500")));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_recovers_after_a_server_error() {
        let (base_url, hits) = serve(vec![(503, "{}"), (200, ONE_DAY_BODY)]);
        let bars = client(base_url, 1).fetch_daily(&aapl()).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d(2023, 1, 3));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_symbol_404_is_an_empty_series() {
        let (base_url, hits) = serve(vec![(404, NOT_FOUND_BODY)]);
        let bars = client(base_url, 2).fetch_daily(&aapl()).unwrap();

        assert!(bars.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_statuses_fail_without_retry() {
        let (base_url, hits) = serve(vec![(429, r#"{"error":"Too Many Requests"}"#)]);
        let err = client(base_url, 2).fetch_daily(&aapl()).unwrap_err();

        assert!(matches!(&err, PipelineError::DataUnavailable(msg) if msg.contains("429")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
