// src/core/fuzzer.rs

use crate::core::error::{ProbeError, ScanError};
use crate::core::models::{Options, ProbeResult};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Performs the HTTP requests of a run.
///
/// Implementations are shared by every worker and must be safe for concurrent use.
#[async_trait]
pub trait Fuzzer: Send + Sync {
    /// Requests `path` from `ip` with `host` as the `Host` header.
    async fn probe(&self, ip: &str, host: &str, path: &str) -> Result<ProbeResult, ProbeError>;

    /// Requests `path` from wherever `host` publicly resolves to.
    async fn probe_public(&self, host: &str, path: &str) -> Result<ProbeResult, ProbeError>;
}

/// Resolves candidate hostnames through normal DNS for verify mode.
#[async_trait]
pub trait PublicResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<IpAddr, ProbeError>;
}

/// DNS resolution through `hickory-resolver`.
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PublicResolver for HickoryResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, ProbeError> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => {
                let addr = lookup.iter().next().ok_or_else(|| ProbeError::Unresolvable {
                    host: host.to_string(),
                })?;
                debug!(host, %addr, "Resolved public address.");
                Ok(addr)
            }
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!(host, "No public DNS record.");
                Err(ProbeError::Unresolvable { host: host.to_string() })
            }
            Err(e) => Err(ProbeError::Transport(format!("resolving {} failed: {}", host, e))),
        }
    }
}

/// Fixed hostname to address table. Unknown names are unresolvable.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, host: &str, addr: IpAddr) -> Self {
        self.entries.insert(host.to_ascii_lowercase(), addr);
        self
    }
}

#[async_trait]
impl PublicResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, ProbeError> {
        self.entries
            .get(&host.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ProbeError::Unresolvable { host: host.to_string() })
    }
}

/// `reqwest` backed fuzzer. The client is configured once from `Options`
/// and reused for every request of the run.
pub struct HttpFuzzer {
    client: reqwest::Client,
    scheme: &'static str,
    port: u16,
    resolver: Arc<dyn PublicResolver>,
}

impl HttpFuzzer {
    pub fn new(options: &Options) -> Result<Self, ScanError> {
        // Targets are addressed by IP, so certificates never match the URL.
        let mut builder = reqwest::Client::builder()
            .user_agent("VanguardVhost/0.1")
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .default_headers(parse_headers(&options.headers)?);

        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            scheme: options.scheme(),
            port: options.effective_port(),
            resolver: Arc::new(HickoryResolver::new()),
        })
    }

    /// Replaces the resolver used by `probe_public`.
    pub fn with_resolver(mut self, resolver: Arc<dyn PublicResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// URL addressing `ip` directly, e.g. `http://10.0.0.1:8080/admin`.
    pub fn target_url(&self, ip: &str, path: &str) -> Result<Url, ProbeError> {
        let host = match ip.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
            _ => ip.to_string(),
        };
        let path = if path.starts_with('/') { path.to_string() } else { format!("/{}", path) };
        let raw = format!("{}://{}:{}{}", self.scheme, host, self.port, path);
        Url::parse(&raw).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

#[async_trait]
impl Fuzzer for HttpFuzzer {
    async fn probe(&self, ip: &str, host: &str, path: &str) -> Result<ProbeResult, ProbeError> {
        let url = self.target_url(ip, path)?;
        debug!(url = %url, host, "Sending probe.");

        let response = self
            .client
            .get(url.clone())
            .header(HOST, host)
            .send()
            .await
            .map_err(|source| ProbeError::Request { url: url.to_string(), source })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| ProbeError::Body { status, source })?;

        debug!(url = %url, host, status, bytes = body.len(), "Probe answered.");
        Ok(ProbeResult {
            status,
            content_length: body.len() as u64,
            body,
            headers,
        })
    }

    async fn probe_public(&self, host: &str, path: &str) -> Result<ProbeResult, ProbeError> {
        let addr = self.resolver.resolve(host).await?;
        self.probe(&addr.to_string(), host, path).await
    }
}

/// Parses `Name: value` strings into a header map. A `Host` entry is
/// dropped because every probe sets its own.
pub fn parse_headers(raw: &[String]) -> Result<HeaderMap, ScanError> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ScanError::InvalidHeader(line.clone()))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ScanError::InvalidHeader(line.clone()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| ScanError::InvalidHeader(line.clone()))?;

        if name == HOST {
            warn!(header = %line, "Ignoring user supplied Host header.");
            continue;
        }
        headers.append(name, value);
    }
    Ok(headers)
}
