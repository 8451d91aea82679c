//! HTTP adapter for the WealthLog REST API.
//!
//! `GET {base}/trade?accountId=&tradeType=` and `GET {base}/account`, sent
//! with the session's bearer token when it has one. No retries.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;

use crate::adapters::wire::{WireAccount, WireTrade};
use crate::domain::account::Account;
use crate::domain::config_validation::resolve_timeout_secs;
use crate::domain::error::WealthlogError;
use crate::domain::session::SessionContext;
use crate::domain::trade::{Trade, TradeType};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::{AccountPort, TradePort};

pub struct RestAdapter {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl RestAdapter {
    pub fn new(
        base_url: &str,
        session: SessionContext,
        timeout: Duration,
    ) -> Result<Self, WealthlogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WealthlogError::Fetch {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn from_config(
        config: &dyn ConfigPort,
        session: SessionContext,
    ) -> Result<Self, WealthlogError> {
        let base_url =
            config
                .get_trimmed("api", "base_url")
                .ok_or_else(|| WealthlogError::ConfigMissing {
                    section: "api".into(),
                    key: "base_url".into(),
                })?;
        let timeout = Duration::from_secs(resolve_timeout_secs(config)?);
        Self::new(&base_url, session, timeout)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.authorization_header() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, WealthlogError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| WealthlogError::Fetch {
                reason: e.to_string(),
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(WealthlogError::Unauthorized),
            status if !status.is_success() => Err(WealthlogError::Fetch {
                reason: format!("{} returned {status}", response.url()),
            }),
            _ => response.json::<T>().map_err(|e| WealthlogError::Fetch {
                reason: format!("malformed response: {e}"),
            }),
        }
    }
}

impl TradePort for RestAdapter {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError> {
        let url = format!("{}/trade", self.base_url);
        tracing::debug!(%url, account_id, %trade_type, "Fetching trades");

        let request = self.client.get(&url).query(&[
            ("accountId", account_id),
            ("tradeType", trade_type.as_query_str()),
        ]);
        let wire: Vec<WireTrade> = self.get_json(request)?;
        wire.into_iter().map(WireTrade::into_trade).collect()
    }
}

impl AccountPort for RestAdapter {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError> {
        let url = format!("{}/account", self.base_url);
        tracing::debug!(%url, "Fetching accounts");

        let wire: Vec<WireAccount> = self.get_json(self.client.get(&url))?;
        wire.into_iter().map(WireAccount::into_account).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountType;
    use rust_decimal_macros::dec;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves one canned response on an ephemeral port and hands back the raw
    /// request head it received.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });

        (base_url, handle)
    }

    fn adapter(base_url: &str, session: SessionContext) -> RestAdapter {
        RestAdapter::new(base_url, session, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn fetch_trades_sends_bearer_token_and_query() {
        let body = r#"[{"id": 5, "instrument": "EURUSD", "direction": "Short",
            "fees": "1.5", "executedAt": "2024-01-01T00:00:00Z",
            "gain": {"amount": "20"}}]"#;
        let (base_url, server) = serve_once("200 OK", body);

        let trades = adapter(&base_url, SessionContext::with_token("tok"))
            .fetch_trades("42", TradeType::Fx)
            .unwrap();
        let request = server.join().unwrap();

        let request_line = request.lines().next().unwrap();
        assert_eq!(request_line, "GET /trade?accountId=42&tradeType=FX HTTP/1.1");
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok\r\n"));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "5");
        assert_eq!(trades[0].fees, dec!(1.5));
        assert_eq!(trades[0].gain.amount, Some(dec!(20)));
    }

    #[test]
    fn anonymous_list_accounts_sends_no_authorization() {
        let body = r#"[{"id": 3, "name": "Coins", "accountType": "CRYPTO",
            "balance": 250.5, "currency": "USD"}]"#;
        let (base_url, server) = serve_once("200 OK", body);

        let accounts = adapter(&base_url, SessionContext::anonymous())
            .list_accounts()
            .unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /account HTTP/1.1"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
        assert_eq!(accounts[0].id, "3");
        assert_eq!(accounts[0].account_type, AccountType::Crypto);
        assert_eq!(accounts[0].balance, Some(dec!(250.5)));
    }

    #[test]
    fn status_401_is_unauthorized() {
        let (base_url, server) = serve_once("401 Unauthorized", "");
        let result = adapter(&base_url, SessionContext::with_token("expired"))
            .fetch_trades("1", TradeType::Stocks);
        server.join().unwrap();
        assert!(matches!(result, Err(WealthlogError::Unauthorized)));
    }

    #[test]
    fn status_500_is_a_fetch_error() {
        let (base_url, server) = serve_once("500 Internal Server Error", "");
        let result = adapter(&base_url, SessionContext::anonymous()).list_accounts();
        server.join().unwrap();
        match result {
            Err(WealthlogError::Fetch { reason }) => assert!(reason.contains("500")),
            other => panic!("expected Fetch error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_fetch_error() {
        let (base_url, server) = serve_once("200 OK", "not json");
        let result = adapter(&base_url, SessionContext::anonymous()).fetch_trades("1", TradeType::Crypto);
        server.join().unwrap();
        match result {
            Err(WealthlogError::Fetch { reason }) => assert!(reason.starts_with("malformed response")),
            other => panic!("expected Fetch error, got {other:?}"),
        }
    }

    struct ApiConfig(Option<&'static str>);

    impl ConfigPort for ApiConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            match (section, key) {
                ("api", "base_url") => self.0.map(String::from),
                _ => None,
            }
        }
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let adapter = RestAdapter::from_config(
            &ApiConfig(Some("http://localhost:5000/api/")),
            SessionContext::anonymous(),
        )
        .unwrap();
        assert_eq!(adapter.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn missing_base_url() {
        let result = RestAdapter::from_config(&ApiConfig(None), SessionContext::anonymous());
        assert!(matches!(
            result,
            Err(WealthlogError::ConfigMissing { key, .. }) if key == "base_url"
        ));
    }

    #[test]
    fn keeps_session() {
        let adapter = RestAdapter::from_config(
            &ApiConfig(Some("http://localhost:5000")),
            SessionContext::with_token("tok"),
        )
        .unwrap();
        assert!(adapter.session().is_authenticated());
    }
}
