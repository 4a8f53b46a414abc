//! Relatedness oracle: a numeric relatedness for two concepts.
//!
//! [`ConceptNetOracle`] talks to the ConceptNet `/relatedness` endpoint.
//! [`PacedOracle`] wraps any oracle and holds every call to the pacer's
//! schedule, since the public API rate-limits aggressively.

use crate::config::{OracleConfig, http_client};
use crate::drift::pacing::Pacer;
use crate::error::OracleError;
use crate::models::Language;
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Returns the relatedness of two terms in (possibly different) languages.
pub trait RelatednessOracle {
    async fn relatedness(
        &self,
        language1: Language,
        term1: &str,
        language2: Language,
        term2: &str,
    ) -> Result<f64, OracleError>;
}

/// ConceptNet node path for `term`, e.g. `/c/en/ice_cream`.
pub fn concept_path(language: Language, term: &str) -> String {
    let joined = term.split_whitespace().collect::<Vec<_>>().join("_");
    format!("/c/{}/{}", language.code(), joined.to_lowercase())
}

/// Client for the ConceptNet relatedness API.
#[derive(Debug, Clone)]
pub struct ConceptNetOracle {
    client: Client,
    base_url: String,
}

impl ConceptNetOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            client: http_client(&config.user_agent, config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn relatedness_url(&self, node1: &str, node2: &str) -> String {
        format!(
            "{}/relatedness?node1={}&node2={}",
            self.base_url,
            urlencoding::encode(node1),
            urlencoding::encode(node2)
        )
    }
}

impl RelatednessOracle for ConceptNetOracle {
    #[instrument(level = "debug", skip_all, fields(%term1, %term2))]
    async fn relatedness(
        &self,
        language1: Language,
        term1: &str,
        language2: Language,
        term2: &str,
    ) -> Result<f64, OracleError> {
        let url = self.relatedness_url(&concept_path(language1, term1), &concept_path(language2, term2));
        let t0 = Instant::now();
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), %url, "Oracle returned error status");
            return Err(OracleError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.text().await?;
        let json: serde_json::Value = serde_json::from_str(&body)?;
        let value = json
            .get("value")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| OracleError::MissingValue(truncate_for_log(&body, 200)))?;
        debug!(value, elapsed_ms = t0.elapsed().as_millis() as u64, "Relatedness");
        Ok(value)
    }
}

/// Decorator that paces every call to the inner oracle.
pub struct PacedOracle<O, P> {
    inner: O,
    pacer: P,
}

impl<O, P> PacedOracle<O, P>
where
    O: RelatednessOracle,
    P: Pacer,
{
    pub fn new(inner: O, pacer: P) -> Self {
        Self { inner, pacer }
    }
}

impl<O, P> fmt::Debug for PacedOracle<O, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacedOracle").finish_non_exhaustive()
    }
}

impl<O, P> RelatednessOracle for PacedOracle<O, P>
where
    O: RelatednessOracle,
    P: Pacer,
{
    async fn relatedness(
        &self,
        language1: Language,
        term1: &str,
        language2: Language,
        term2: &str,
    ) -> Result<f64, OracleError> {
        self.pacer.wait().await;
        self.inner.relatedness(language1, term1, language2, term2).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::pacing::MinIntervalPacer;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oracle(server: &MockServer) -> ConceptNetOracle {
        ConceptNetOracle::new(&OracleConfig {
            base_url: server.uri(),
            ..OracleConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_concept_path() {
        assert_eq!(concept_path(Language::En, "dog"), "/c/en/dog");
        assert_eq!(concept_path(Language::Fr, "Union  africaine"), "/c/fr/union_africaine");
    }

    #[tokio::test]
    async fn test_relatedness_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/relatedness"))
            .and(query_param("node1", "/c/en/dog"))
            .and(query_param("node2", "/c/fr/chien"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "@id": "/relatedness?node1=/c/en/dog&node2=/c/fr/chien",
                "value": 0.83
            })))
            .expect(1)
            .mount(&server)
            .await;

        let v = oracle(&server)
            .relatedness(Language::En, "dog", Language::Fr, "chien")
            .await
            .unwrap();
        assert!((v - 0.83).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_missing_value_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "nope"})))
            .mount(&server)
            .await;
        let err = oracle(&server)
            .relatedness(Language::En, "a", Language::En, "b")
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::MissingValue(_)));
    }

    #[tokio::test]
    async fn test_error_status_and_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("node1", "/c/en/limit"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("node1", "/c/en/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let o = oracle(&server);
        let err = o.relatedness(Language::En, "limit", Language::En, "x").await.unwrap_err();
        assert!(matches!(err, OracleError::Status { status: 429, .. }));
        let err = o.relatedness(Language::En, "garbage", Language::En, "x").await.unwrap_err();
        assert!(matches!(err, OracleError::Json(_)));
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "drift-research/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 0.1})))
            .expect(1)
            .mount(&server)
            .await;

        let o = ConceptNetOracle::new(&OracleConfig {
            base_url: server.uri(),
            user_agent: "drift-research/1.0".into(),
            ..OracleConfig::default()
        })
        .unwrap();
        let v = o.relatedness(Language::En, "a", Language::En, "b").await.unwrap();
        assert_eq!(v, 0.1);
    }

    /// Records the paused-clock instant of every call.
    #[derive(Default)]
    struct StampingOracle {
        stamps: Mutex<Vec<(String, tokio::time::Instant)>>,
    }

    impl RelatednessOracle for StampingOracle {
        async fn relatedness(&self, _: Language, term1: &str, _: Language, _: &str) -> Result<f64, OracleError> {
            self.stamps.lock().unwrap().push((term1.to_string(), tokio::time::Instant::now()));
            Ok(0.5)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_oracle_spaces_inner_calls() {
        let paced = PacedOracle::new(StampingOracle::default(), MinIntervalPacer::new(Duration::from_secs(2)));
        let t0 = tokio::time::Instant::now();
        for term in ["a", "b", "c"] {
            let v = paced.relatedness(Language::En, term, Language::Fr, "x").await.unwrap();
            assert_eq!(v, 0.5);
        }

        let stamps = paced.inner.stamps.lock().unwrap();
        let offsets: Vec<(&str, Duration)> = stamps.iter().map(|(t, at)| (t.as_str(), *at - t0)).collect();
        assert_eq!(
            offsets,
            vec![
                ("a", Duration::ZERO),
                ("b", Duration::from_secs(2)),
                ("c", Duration::from_secs(4)),
            ]
        );
    }
}
