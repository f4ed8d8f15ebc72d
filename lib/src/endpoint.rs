//! A connection to a single triplestore repository: builds SPARQL query and update
//! requests, keeps the authorization state, and routes responses through
//! [`transform::apply`].

use crate::bindings::ResponseShape;
use crate::config::{EndpointConfig, Triplestore};
use crate::consts::{FORM_CONTENT_TYPE, QLEVER_RESULTS_ACCEPT, SPARQL_RESULTS_ACCEPT};
use crate::delimited::DelimitedOptions;
use crate::errors::RequestError;
use crate::prefix::PrefixMap;
use crate::transform::{self, QueryOutput, Transform, TransformOptions, TriplesOutput};
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use reqwest::blocking::{Client, Request, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const GRAPHDB_PASSWORD_HEADER: &str = "X-GraphDB-Password";

/// Per-call overrides for [`Endpoint::query`]. Unset fields fall back to the endpoint
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub transform: Option<Transform>,
    pub use_qlever_bindings: Option<bool>,
    pub drop_prefixes: bool,
    pub replace_prefixes: bool,
    pub delimited: Option<DelimitedOptions>,
}

impl QueryOptions {
    pub fn with_transform(transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..Default::default()
        }
    }
}

/// Outcome of a successful SPARQL update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponse {
    pub success: bool,
    pub status: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

pub struct Endpoint {
    config: EndpointConfig,
    client: Client,
    authorization: Option<String>,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!(
            "Created {} endpoint for {}",
            config.triplestore,
            config.query_url()
        );
        Ok(Self {
            config,
            client,
            authorization: None,
        })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn repository(&self) -> Option<&str> {
        self.config.repository.as_deref()
    }

    pub fn triplestore(&self) -> Triplestore {
        self.config.triplestore
    }

    pub fn query_url(&self) -> String {
        self.config.query_url()
    }

    pub fn update_url(&self) -> String {
        self.config.update_url()
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.config.prefixes
    }

    pub fn set_prefixes(&mut self, prefixes: PrefixMap) {
        self.config.prefixes = prefixes;
    }

    pub fn default_context(&self) -> Option<&str> {
        self.config.default_context.as_deref()
    }

    pub fn set_default_context(&mut self, context: Option<String>) {
        self.config.default_context = context;
    }

    pub fn version(&self) -> f64 {
        self.config.version
    }

    pub fn api_type(&self) -> &str {
        &self.config.api_type
    }

    /// The `Authorization` header value sent with every request, if a token is held.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Uses `token` as a bearer token for subsequent requests.
    pub fn set_access_token(&mut self, token: &str) {
        self.authorization = Some(format!("Bearer {}", token));
    }

    pub fn logout(&mut self) {
        debug!("Discarding authorization for {}", self.config.base_url);
        self.authorization = None;
    }

    /// Obtains a token from the server and uses it for subsequent requests. Only GraphDB
    /// and Stardog expose a login service. On failure any previous token is discarded.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.authorization = None;
        let request = self.login_request(username, password)?;
        let response = self.client.execute(request)?;
        let response = check_status(response)?;
        let token = match self.config.triplestore {
            Triplestore::GraphDb => response
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Login response carries no authorization header"))?,
            _ => {
                let body: TokenResponse = response.json()?;
                format!("Bearer {}", body.token)
            }
        };
        info!("Logged in to {} as {}", self.config.base_url, username);
        self.authorization = Some(token);
        Ok(())
    }

    pub(crate) fn login_request(&self, username: &str, password: &str) -> Result<Request> {
        let base = self.config.base_url.trim_end_matches('/');
        let request = match self.config.triplestore {
            Triplestore::GraphDb => self
                .client
                .post(format!("{}/rest/login/{}", base, username))
                .header(GRAPHDB_PASSWORD_HEADER, password),
            Triplestore::Stardog => self
                .client
                .get(format!("{}/admin/token", base))
                .basic_auth(username, Some(password)),
            other => return Err(anyhow!("Login is not supported by {}", other)),
        };
        Ok(request.build()?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.authorization {
            return request.header(AUTHORIZATION, token);
        }
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => request.basic_auth(username, Some(password)),
            _ => request,
        }
    }

    fn form_request(&self, url: String, field: &str, sparql: &str, accept: &str) -> Result<Request> {
        let body = format!("{}{}", self.config.prefixes.to_sparql(), sparql);
        debug!("Sending to {}:\n{}", url, body);
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(field, &body)
            .finish();
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, accept)
            .body(form);
        Ok(self.authorize(request).build()?)
    }

    fn use_qlever_bindings(&self, options: &QueryOptions) -> bool {
        self.config.triplestore == Triplestore::Qlever
            && options
                .use_qlever_bindings
                .unwrap_or(self.config.use_qlever_bindings)
    }

    pub fn query_request(&self, sparql: &str, options: &QueryOptions) -> Result<Request> {
        let accept = if self.use_qlever_bindings(options) {
            QLEVER_RESULTS_ACCEPT
        } else {
            SPARQL_RESULTS_ACCEPT
        };
        self.form_request(self.query_url(), "query", sparql, accept)
    }

    pub fn update_request(&self, sparql: &str) -> Result<Request> {
        self.form_request(self.update_url(), "update", sparql, SPARQL_RESULTS_ACCEPT)
    }

    /// Runs a SPARQL query, prepending the registered prefixes, and transforms the
    /// response. JSON object payloads go through [`transform::apply`]; anything else
    /// (e.g. N-Triples from a CONSTRUCT) is returned as [`QueryOutput::Triples`].
    pub fn query(&self, sparql: &str, options: &QueryOptions) -> Result<QueryOutput> {
        let request = self.query_request(sparql, options)?;
        let response = check_status(self.client.execute(request)?)?;
        let status = response.status().as_u16();
        let text = response.text()?;

        let payload = match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => value,
            _ => {
                debug!("Response is not a JSON object, returning it as triples");
                return Ok(QueryOutput::Triples(TriplesOutput::new(text, status)));
            }
        };

        let shape = if self.use_qlever_bindings(options) {
            ResponseShape::Qlever
        } else {
            ResponseShape::Sparql
        };
        let transform_options = TransformOptions {
            transform: options.transform.unwrap_or(self.config.transform),
            drop_prefixes: options.drop_prefixes,
            replace_prefixes: options.replace_prefixes,
            delimited: options.delimited.clone(),
        };
        let output = transform::apply(payload, shape, &transform_options, &self.config.prefixes)?;
        Ok(output)
    }

    /// Runs a SPARQL update, prepending the registered prefixes.
    pub fn update(&self, sparql: &str) -> Result<UpdateResponse> {
        let request = self.update_request(sparql)?;
        let response = check_status(self.client.execute(request)?)?;
        Ok(UpdateResponse {
            success: true,
            status: response.status().as_u16(),
            message: "Ok".to_string(),
        })
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .ok()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
    warn!("Triplestore answered {}: {}", status, message);
    Err(anyhow!(RequestError {
        status: status.as_u16(),
        message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PREFIX_OWL;
    use std::collections::HashMap;

    fn endpoint(triplestore: Triplestore) -> Endpoint {
        let config = EndpointConfig::builder()
            .base_url("http://localhost:7200")
            .repository("Test")
            .triplestore(triplestore)
            .prefixes([PREFIX_OWL].into_iter().collect::<PrefixMap>())
            .build()
            .unwrap();
        Endpoint::new(config).unwrap()
    }

    fn form(request: &Request) -> HashMap<String, String> {
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    fn header<'a>(request: &'a Request, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_query_request() {
        let ep = endpoint(Triplestore::GraphDb);
        let request = ep
            .query_request("SELECT * WHERE { ?s ?p ?o }", &QueryOptions::default())
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:7200/repositories/Test");
        assert_eq!(header(&request, CONTENT_TYPE), Some(FORM_CONTENT_TYPE));
        assert_eq!(header(&request, ACCEPT), Some(SPARQL_RESULTS_ACCEPT));
        assert!(header(&request, AUTHORIZATION).is_none());
        assert_eq!(
            form(&request)["query"],
            "PREFIX owl: <http://www.w3.org/2002/07/owl#>\nSELECT * WHERE { ?s ?p ?o }"
        );
    }

    #[test]
    fn test_update_request() {
        let ep = endpoint(Triplestore::Fuseki);
        let request = ep.update_request("CLEAR ALL").unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:7200/Test/update");
        let form = form(&request);
        assert!(form["update"].ends_with("CLEAR ALL"));
        assert!(!form.contains_key("query"));
    }

    #[test]
    fn test_qlever_accept_header() {
        let config = EndpointConfig::builder()
            .base_url("http://localhost:7001")
            .triplestore(Triplestore::Qlever)
            .build()
            .unwrap();
        let ep = Endpoint::new(config).unwrap();
        let plain = ep.query_request("SELECT", &QueryOptions::default()).unwrap();
        assert_eq!(plain.url().as_str(), "http://localhost:7001/");
        assert_eq!(header(&plain, ACCEPT), Some(SPARQL_RESULTS_ACCEPT));

        let options = QueryOptions {
            use_qlever_bindings: Some(true),
            ..Default::default()
        };
        let columnar = ep.query_request("SELECT", &options).unwrap();
        assert_eq!(header(&columnar, ACCEPT), Some(QLEVER_RESULTS_ACCEPT));

        // only honored for qlever
        let graphdb = endpoint(Triplestore::GraphDb);
        let request = graphdb.query_request("SELECT", &options).unwrap();
        assert_eq!(header(&request, ACCEPT), Some(SPARQL_RESULTS_ACCEPT));
    }

    #[test]
    fn test_authorization() {
        let config = EndpointConfig::builder()
            .base_url("http://localhost:7200")
            .repository("Test")
            .username("admin")
            .password("root")
            .build()
            .unwrap();
        let mut ep = Endpoint::new(config).unwrap();
        let request = ep.query_request("ASK {}", &QueryOptions::default()).unwrap();
        assert_eq!(
            header(&request, AUTHORIZATION),
            Some("Basic YWRtaW46cm9vdA==")
        );

        ep.set_access_token("abc");
        assert_eq!(ep.authorization(), Some("Bearer abc"));
        let request = ep.query_request("ASK {}", &QueryOptions::default()).unwrap();
        assert_eq!(header(&request, AUTHORIZATION), Some("Bearer abc"));

        ep.logout();
        assert!(ep.authorization().is_none());
        let request = ep.update_request("CLEAR ALL").unwrap();
        assert_eq!(
            header(&request, AUTHORIZATION),
            Some("Basic YWRtaW46cm9vdA==")
        );
    }

    #[test]
    fn test_login_requests() {
        let graphdb = endpoint(Triplestore::GraphDb);
        let request = graphdb.login_request("admin", "secret").unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:7200/rest/login/admin");
        assert_eq!(header(&request, GRAPHDB_PASSWORD_HEADER), Some("secret"));

        let stardog = endpoint(Triplestore::Stardog);
        let request = stardog.login_request("admin", "admin").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "http://localhost:7200/admin/token");
        assert_eq!(header(&request, AUTHORIZATION), Some("Basic YWRtaW46YWRtaW4="));

        assert!(endpoint(Triplestore::Fuseki).login_request("a", "b").is_err());
    }

    #[test]
    fn test_accessors() {
        let mut ep = endpoint(Triplestore::Stardog);
        assert_eq!(ep.triplestore(), Triplestore::Stardog);
        assert_eq!(ep.query_url(), "http://localhost:7200/Test/query");
        assert_eq!(ep.version(), 10.2);
        assert_eq!(ep.api_type(), "workbench");
        assert!(ep.default_context().is_none());
        ep.set_default_context(Some("http://example.org/graph".to_string()));
        assert_eq!(ep.default_context(), Some("http://example.org/graph"));
        ep.set_prefixes(PrefixMap::new());
        assert!(ep.prefixes().is_empty());
        let request = ep.query_request("ASK {}", &QueryOptions::default()).unwrap();
        assert_eq!(form(&request)["query"], "ASK {}");
    }
}
