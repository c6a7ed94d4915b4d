//! HTTP remote mirror.
//!
//! Transactions are posted as JSON to `{base_url}/transactions`, with the
//! environment id in the `x-env-id` header. The remote keeps one collection
//! per environment.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::{EngineError, RemoteFilter, RemoteMirror, ResultEngine, Transaction, format_date};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{error::Result, settings::Remote};

const ENV_HEADER: &str = "x-env-id";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecord {
    #[serde(flatten)]
    transaction: Transaction,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub(crate) struct HttpMirror {
    client: Client,
    base_url: String,
}

impl HttpMirror {
    pub(crate) fn new(remote: &Remote) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: remote.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn network(err: reqwest::Error) -> EngineError {
    EngineError::Remote(format!("network error: {err}"))
}

async fn ensure_success(resp: Response) -> ResultEngine<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(err) => err.error,
        Err(_) => "server error".to_string(),
    };
    Err(EngineError::Remote(format!("{status}: {message}")))
}

#[async_trait]
impl RemoteMirror for HttpMirror {
    async fn append(&self, env_id: &str, transaction: &Transaction) -> ResultEngine<()> {
        let resp = self
            .client
            .post(self.url("/transactions"))
            .header(ENV_HEADER, env_id)
            .json(&RemoteRecord {
                transaction: transaction.clone(),
                updated_at: Utc::now(),
            })
            .send()
            .await
            .map_err(network)?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn fetch(&self, env_id: &str, filter: RemoteFilter) -> ResultEngine<Vec<Transaction>> {
        let mut request = self
            .client
            .get(self.url("/transactions"))
            .header(ENV_HEADER, env_id);
        if let Some(since) = filter.since {
            request = request.query(&[("since", format_date(since))]);
        }

        let resp = request.send().await.map_err(network)?;
        let resp = ensure_success(resp).await?;
        resp.json::<Vec<Transaction>>().await.map_err(network)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use engine::{Money, Tag};

    use super::*;

    fn mirror(base_url: &str) -> HttpMirror {
        HttpMirror::new(&Remote {
            base_url: base_url.to_string(),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(
            mirror("http://127.0.0.1:3000/").url("/transactions"),
            "http://127.0.0.1:3000/transactions"
        );
        assert_eq!(
            mirror("http://127.0.0.1:3000/api").url("transactions"),
            "http://127.0.0.1:3000/api/transactions"
        );
    }

    #[test]
    fn record_flattens_transaction() {
        let tx = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 6, 18).unwrap(),
            Money::from(5),
            vec![Tag::Optional],
            None,
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(RemoteRecord {
            transaction: tx.clone(),
            updated_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["id"], tx.id);
        assert_eq!(json["date"], "2025-06-18");
        assert!(json.get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn unreachable_remote_is_a_remote_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let err = mirror("http://127.0.0.1:9")
            .fetch("env", RemoteFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Remote(_)));
    }
}
