//! REST client for the hosted backend.
//!
//! Tables are exposed under `{project_url}/rest/v1/{table}`. Reads are `GET`
//! with the select list, `col=eq.value` filters and `order=col.desc` in the
//! query string; inserts are `POST`, updates `PATCH` with the same filters.
//! Every request carries the project's anon key, and the user's access token
//! when signed in so row-level security sees the right identity.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::AayojanaConfig;
use crate::error::{AayojanaError, AayojanaResult};
use crate::remote::{Direction, Operation, Query, RemoteError, RemoteStore};

const REST_PATH: &str = "rest/v1/";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: Url,
}

impl RestStore {
    pub fn new(config: &AayojanaConfig) -> AayojanaResult<Self> {
        config.validate()?;

        let base_url = rest_base_url(&config.project_url)?;
        let bearer = config.access_token.as_deref().unwrap_or(&config.anon_key);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.anon_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {bearer}"))?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout()?)
            .build()
            .map_err(|e| AayojanaError::Transport(e.to_string()))?;

        Ok(RestStore { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, query: &Query) -> Result<Url, RemoteError> {
        let mut url = self
            .base_url
            .join(query.table.name())
            .map_err(|e| RemoteError::new(e.to_string()).with_code("url"))?;
        url.query_pairs_mut().extend_pairs(query_pairs(query));
        Ok(url)
    }

    fn request(&self, query: &Query) -> Result<reqwest::RequestBuilder, RemoteError> {
        let url = self.url_for(query)?;

        let request = match &query.operation {
            Operation::Select => self.http.get(url),
            Operation::Insert(row) => self
                .http
                .post(url)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(row),
            Operation::Update(patch) => self
                .http
                .patch(url)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(patch),
        };

        Ok(if query.single {
            request.header(ACCEPT, SINGLE_OBJECT)
        } else {
            request
        })
    }
}

impl RemoteStore for RestStore {
    async fn execute(&self, query: &Query) -> Result<Value, RemoteError> {
        tracing::debug!(table = %query.table, select = %query.select_clause(), "remote query");

        let resp = self
            .request(query)?
            .send()
            .await
            .map_err(|e| RemoteError::new(format!("Request failed: {e}")).with_code("transport"))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| {
                RemoteError::new(format!("Could not read response: {e}")).with_code("transport")
            })?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| {
            RemoteError::new(format!("Failed to parse response: {e}")).with_code("decode")
        })
    }
}

fn header_value(value: &str) -> AayojanaResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AayojanaError::Config("API keys must be plain ASCII".into()))
}

/// `https://xyz.example.co` becomes `https://xyz.example.co/rest/v1/`.
pub(crate) fn rest_base_url(project_url: &str) -> AayojanaResult<Url> {
    let mut project = project_url.trim().to_string();
    if !project.ends_with('/') {
        project.push('/');
    }

    Url::parse(&project)
        .and_then(|url| url.join(REST_PATH))
        .map_err(|e| AayojanaError::Config(format!("Invalid project_url '{project_url}': {e}")))
}

/// Query-string parameters for a query, in the backend's filter syntax.
pub(crate) fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if matches!(query.operation, Operation::Select) || !query.columns.is_empty() {
        pairs.push(("select".to_string(), query.select_clause()));
    }

    for filter in &query.filters {
        let value = match &filter.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        pairs.push((filter.column.clone(), format!("eq.{value}")));
    }

    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    pairs
}

fn error_from_body(status: reqwest::StatusCode, body: &[u8]) -> RemoteError {
    serde_json::from_slice::<RemoteError>(body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(body);
        let message = if text.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", text.trim())
        };
        RemoteError::new(message).with_code(status.as_u16().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Table;
    use serde_json::json;

    #[test]
    fn base_url_appends_rest_path() {
        let url = rest_base_url("https://abc.backend.example").unwrap();
        assert_eq!(url.as_str(), "https://abc.backend.example/rest/v1/");

        let url = rest_base_url("https://abc.backend.example/").unwrap();
        assert_eq!(url.as_str(), "https://abc.backend.example/rest/v1/");

        assert!(rest_base_url("not a url").is_err());
    }

    #[test]
    fn select_pairs_use_filter_syntax() {
        let query = Query::from(Table::EventAttendances)
            .embed(Table::Events, "event_id", &["id", "title"])
            .eq("user_id", "u1")
            .order("registered_at", Direction::Descending);

        assert_eq!(
            query_pairs(&query),
            vec![
                ("select".to_string(), "*,events(id,title)".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
                ("order".to_string(), "registered_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn mutations_without_columns_skip_select() {
        let query = Query::update(Table::EventRatings, json!({"rating": 4}))
            .unwrap()
            .eq("id", 7);

        assert_eq!(
            query_pairs(&query),
            vec![("id".to_string(), "eq.7".to_string())]
        );
    }

    #[test]
    fn error_bodies_become_remote_errors() {
        let body = br#"{"message":"permission denied","code":"42501","hint":null}"#;
        let err = error_from_body(reqwest::StatusCode::FORBIDDEN, body);
        assert_eq!(err.message, "permission denied");
        assert_eq!(err.code.as_deref(), Some("42501"));

        let err = error_from_body(reqwest::StatusCode::BAD_GATEWAY, b"");
        assert_eq!(err.code.as_deref(), Some("502"));
    }
}
