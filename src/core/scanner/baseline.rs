// src/core/scanner/baseline.rs

use crate::core::error::ScanError;
use crate::core::fuzzer::Fuzzer;
use crate::core::models::ProbeResult;
use tracing::debug;
use uuid::Uuid;

/// A hostname no server can have configured.
pub fn baseline_host() -> String {
    Uuid::new_v4().to_string()
}

/// Probes `ip` and `path` with a random hostname to learn what an
/// unconfigured vhost looks like there.
pub async fn acquire_baseline(
    fuzzer: &dyn Fuzzer,
    ip: &str,
    path: &str,
) -> Result<ProbeResult, ScanError> {
    let host = baseline_host();
    debug!(ip, path, host = %host, "Obtaining baseline.");

    let baseline = fuzzer
        .probe(ip, &host, path)
        .await
        .map_err(|source| ScanError::Baseline {
            ip: ip.to_string(),
            path: path.to_string(),
            source,
        })?;

    debug!(ip, path, status = baseline.status, length = baseline.content_length, "Baseline obtained.");
    Ok(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_hosts_are_unique() {
        let a = baseline_host();
        let b = baseline_host();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
