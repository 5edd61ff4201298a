//! The Nomad HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::Method;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pool::HostPool;
use crate::request::{Body, RequestOptions};
use crate::response::ResponseEnvelope;
use crate::{retry, tls};

/// Redirect hops followed before a call fails.
pub const MAX_REDIRECTS: usize = 5;

/// Header carrying the ACL token.
pub const TOKEN_HEADER: &str = "X-Nomad-Token";

/// Client for a Nomad agent's HTTP API.
///
/// Cheap to clone; clones share the connection pool and the slot limits.
#[derive(Debug, Clone)]
pub struct NomadClient {
    shared: Arc<OnceCell<reqwest::Client>>,
    config: Arc<ClientConfig>,
    pool: Arc<HostPool>,
}

impl NomadClient {
    /// Create a client for the given configuration.
    ///
    /// With a TLS server name set on an https address, the configured host
    /// is resolved on the first call rather than here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let target = Target::new(&config)?;
        let http = build_http_client(&config, None)?;
        let shared = if target.pinned_name().is_some() {
            OnceCell::new()
        } else {
            OnceCell::new_with(Some(http))
        };
        debug!(address = %config.address, pool_size = config.pool_size, "Created Nomad client");
        Ok(Self {
            shared: Arc::new(shared),
            pool: Arc::new(HostPool::new(config.pool_size)),
            config: Arc::new(config),
        })
    }

    /// Create a client configured from `NOMAD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the connection slot pool.
    pub fn pool(&self) -> &HostPool {
        &self.pool
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, Body::None, &RequestOptions::default())
            .await
    }

    pub async fn put(&self, path: &str, body: impl Into<Body>) -> Result<Value> {
        self.execute(Method::PUT, path, body.into(), &RequestOptions::default())
            .await
    }

    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Result<Value> {
        self.execute(Method::POST, path, body.into(), &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, Body::None, &RequestOptions::default())
            .await
    }

    /// Issue `method` against `path` (which may carry a query string) and
    /// return the parsed JSON body.
    ///
    /// Redirects are followed with the same verb and body. Server errors are
    /// retried per the effective retry policy; every other failure surfaces
    /// immediately.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Body,
        options: &RequestOptions,
    ) -> Result<Value> {
        let effective = options.merge(&self.config);
        let target = Target::new(&effective)?;
        let http = if options.needs_dedicated_client() {
            connect(&effective, &target).await?
        } else {
            self.shared
                .get_or_try_init(|| connect(&self.config, &target))
                .await?
                .clone()
        };

        let url = target.base.join(path).map_err(|e| {
            Error::connection(origin(&target.configured), format!("invalid path `{path}': {e}"))
        })?;

        let (http, effective, target, method, url, body) =
            (&http, &effective, &target, &method, &url, &body);
        retry::run(&effective.retry, move |_| {
            self.exchange(http, effective, options, target, method, url.clone(), body)
        })
        .await
    }

    /// One logical attempt, following redirects.
    ///
    /// The token and extra headers only go to the origin the call started
    /// on; hops to other origins are sent without them.
    #[allow(clippy::too_many_arguments)]
    async fn exchange(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
        options: &RequestOptions,
        target: &Target,
        method: &Method,
        mut url: Url,
        body: &Body,
    ) -> Result<Value> {
        let first = url.origin();
        let mut hops = 0;
        loop {
            let address = target.reported(&url);
            let credentials = url.origin() == first;
            let response = self
                .send(http, config, options, method, &url, &address, credentials, body)
                .await?;

            if let Some(location) = response.location() {
                if hops >= MAX_REDIRECTS {
                    warn!(%url, hops, "Too many redirects");
                    return Err(Error::connection(
                        address,
                        format!("too many redirects (more than {MAX_REDIRECTS})"),
                    ));
                }
                let next = url
                    .join(location)
                    .map_err(|e| Error::connection(&address, format!("invalid redirect `{location}': {e}")))?;
                debug!(from = %url, to = %next, status = %response.status, "Following redirect");
                url = next;
                hops += 1;
                continue;
            }

            return response.into_result(&address).inspect_err(|e| {
                warn!(%method, %url, status = ?e.status_code(), "Request failed");
            });
        }
    }

    /// A single HTTP exchange holding one connection slot.
    #[allow(clippy::too_many_arguments)]
    async fn send(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
        options: &RequestOptions,
        method: &Method,
        url: &Url,
        address: &str,
        credentials: bool,
        body: &Body,
    ) -> Result<ResponseEnvelope> {
        let _slot = self
            .pool
            .checkout(&host_key(url), address, config.effective_open_timeout())
            .await?;

        debug!(%method, %url, credentials, "Sending request");
        let mut request = http.request(method.clone(), url.clone());
        if credentials {
            if let Some(token) = &config.token {
                request = request.header(TOKEN_HEADER, token);
            }
            for (name, value) in &options.headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        if let Some(bytes) = body.to_bytes() {
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }
        if let Some(timeout) = config.effective_read_timeout() {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "Connection failed");
            Error::connection(address, describe(&e))
        })?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::connection(address, describe(&e)))?;

        Ok(ResponseEnvelope::new(status, headers, bytes))
    }
}

/// Where the calls of one configuration go.
///
/// With a TLS server name on an https address, requests are addressed to
/// that name and connections are pinned to the configured host.
#[derive(Debug)]
struct Target {
    configured: Url,
    base: Url,
}

impl Target {
    fn new(config: &ClientConfig) -> Result<Self> {
        let configured = Url::parse(&config.address)
            .map_err(|e| Error::InvalidConfig(format!("invalid address `{}': {e}", config.address)))?;
        let mut base = configured.clone();
        if let Some(name) = &config.tls.server_name
            && base.scheme() == "https"
        {
            base.set_host(Some(name))
                .map_err(|e| Error::InvalidConfig(format!("invalid server name `{name}': {e}")))?;
        }
        Ok(Self { configured, base })
    }

    /// The server name requests carry, when it differs from the configured host.
    fn pinned_name(&self) -> Option<&str> {
        if self.base.host() == self.configured.host() {
            None
        } else {
            self.base.host_str()
        }
    }

    async fn pinned_addrs(&self) -> Result<Vec<SocketAddr>> {
        let port = self.configured.port_or_known_default().unwrap_or(443);
        match self.configured.host() {
            Some(Host::Ipv4(ip)) => Ok(vec![SocketAddr::new(ip.into(), port)]),
            Some(Host::Ipv6(ip)) => Ok(vec![SocketAddr::new(ip.into(), port)]),
            Some(Host::Domain(host)) => tokio::net::lookup_host((host, port))
                .await
                .map(|addrs| addrs.collect())
                .map_err(|e| {
                    Error::connection(origin(&self.configured), format!("cannot resolve {host}: {e}"))
                }),
            None => Ok(Vec::new()),
        }
    }

    /// Address named in errors for `url`: the configured one while the
    /// call stays on the pinned server.
    fn reported(&self, url: &Url) -> String {
        if url.origin() == self.base.origin() {
            origin(&self.configured)
        } else {
            origin(url)
        }
    }
}

/// Build the HTTP stack for `config`, pinned per `target`.
async fn connect(config: &ClientConfig, target: &Target) -> Result<reqwest::Client> {
    match target.pinned_name() {
        Some(name) => {
            let addrs = target.pinned_addrs().await?;
            debug!(server_name = name, ?addrs, "Pinning TLS server name");
            build_http_client(config, Some((name, &addrs)))
        }
        None => build_http_client(config, None),
    }
}

fn build_http_client(
    config: &ClientConfig,
    pin: Option<(&str, &[SocketAddr])>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(config.pool_size)
        .user_agent(&config.user_agent);

    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }

    builder = tls::configure(builder, &config.tls)?;

    if let Some((name, addrs)) = pin {
        builder = builder.resolve_to_addrs(name, addrs);
    }

    if let Some(proxy) = &config.proxy {
        let mut route = reqwest::Proxy::all(proxy.url())
            .map_err(|e| Error::InvalidConfig(format!("invalid proxy `{}': {e}", proxy.url())))?;
        if let Some(username) = &proxy.username {
            route = route.basic_auth(username, proxy.password.as_deref().unwrap_or_default());
        }
        builder = builder.proxy(route);
    }

    builder
        .build()
        .map_err(|e| Error::InvalidConfig(describe(&e)))
}

/// `scheme://host[:port]` of a URL.
fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

/// Render an error together with its sources.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = NomadClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.config().address, "http://127.0.0.1:4646");
        assert_eq!(client.pool().size(), 16);
    }

    #[test]
    fn test_invalid_address() {
        let config = ClientConfig::builder().address("not a url").build();
        assert!(matches!(NomadClient::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_server_name_rewrites_https_host() {
        let config = ClientConfig::builder()
            .address("https://127.0.0.1:4646")
            .server_name("server.global.nomad")
            .build();
        let target = Target::new(&config).unwrap();
        assert_eq!(target.base.as_str(), "https://server.global.nomad:4646/");
        assert_eq!(target.pinned_name(), Some("server.global.nomad"));

        let url = target.base.join("/v1/jobs").unwrap();
        assert_eq!(target.reported(&url), "https://127.0.0.1:4646");
        let elsewhere = Url::parse("https://10.0.0.2:4646/v1/jobs").unwrap();
        assert_eq!(target.reported(&elsewhere), "https://10.0.0.2:4646");

        let config = ClientConfig::builder()
            .address("http://127.0.0.1:4646")
            .server_name("server.global.nomad")
            .build();
        let target = Target::new(&config).unwrap();
        assert_eq!(target.base.host_str(), Some("127.0.0.1"));
        assert_eq!(target.pinned_name(), None);
    }

    #[tokio::test]
    async fn test_pinned_addresses_skip_lookup_for_ip_hosts() {
        let config = ClientConfig::builder()
            .address("https://[::1]:4646")
            .server_name("server.global.nomad")
            .build();
        let target = Target::new(&config).unwrap();
        let addrs = target.pinned_addrs().await.unwrap();
        assert_eq!(addrs, vec!["[::1]:4646".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_host_key_and_origin() {
        let url = Url::parse("https://nomad.example/v1/jobs").unwrap();
        assert_eq!(host_key(&url), "nomad.example:443");
        assert_eq!(origin(&url), "https://nomad.example");
    }

    #[test]
    fn test_proxy_credentials() {
        let mut proxy = crate::ProxySettings::new("127.0.0.1");
        proxy.port = Some(3128);
        proxy.username = Some("ops".into());
        let config = ClientConfig::builder().proxy(proxy).build();
        assert!(NomadClient::new(config).is_ok());
    }
}
