//! Best-effort connectivity probes for remote entry artifacts.
//!
//! DESIGN
//! ======
//! Diagnostics only explain failures; they never feed back into route
//! aggregation or component resolution. A probe fetches one URL, records
//! reachability, status, and whether the body carries a remote-entry marker,
//! and produces remediation hints for whoever reads the log.
//!
//! ERROR HANDLING
//! ==============
//! Probes never fail. Transport errors land in `ProbeResult::error`.

use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};

/// Conventional locations of a remote entry artifact, tried in this order.
pub const ENTRY_SUFFIXES: [&str; 4] = [
    "/assets/remoteEntry.js",
    "/remoteEntry.js",
    "/dist/remoteEntry.js",
    "/dist/assets/remoteEntry.js",
];

/// Substrings that identify a remote entry artifact.
pub const DEFAULT_MARKERS: [&str; 2] = ["__federation", "webpackJsonp"];

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// RESULTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub accessible: bool,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub size: Option<usize>,
    pub contains_expected_marker: bool,
    pub error: Option<String>,
}

impl ProbeResult {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            accessible: false,
            status_code: None,
            content_type: None,
            size: None,
            contains_expected_marker: false,
            error: None,
        }
    }

    /// Reachable and carrying the expected marker.
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.accessible && self.contains_expected_marker
    }

    /// Remediation hints for this outcome. Empty when the probe is healthy.
    #[must_use]
    pub fn hints(&self) -> Vec<&'static str> {
        if self.is_working() {
            return Vec::new();
        }
        if self.accessible {
            return vec![
                "the file is reachable but does not look like a remote entry artifact",
                "check the remote's build output and the configured entry path",
            ];
        }
        let error = self.error.as_deref().unwrap_or_default();
        if self.status_code == Some(404) {
            vec![
                "verify the remote app is deployed",
                "check whether the entry artifact lives under /assets/ or at the root",
                "try the alternate URLs listed in this report",
            ]
        } else if error.contains("CORS") {
            vec![
                "serve the shell and the remote from compatible origins",
                "make sure both use the same scheme (https)",
            ]
        } else if self.status_code.is_none() {
            vec![
                "check network connectivity from the shell host",
                "verify the URL is correct",
                "try fetching the URL directly",
            ]
        } else {
            vec!["the remote answered with an error status; check its server logs"]
        }
    }
}

/// Report for one remote: primary probe, hints, and alternates.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteProbeReport {
    pub remote: String,
    pub probe: ProbeResult,
    pub hints: Vec<&'static str>,
    /// Candidate URLs to try, only when the primary probe failed.
    pub alternates: Vec<String>,
}

// =============================================================================
// PROBE CLIENT
// =============================================================================

pub struct RemoteDiagnostics {
    http: reqwest::Client,
    markers: Vec<String>,
}

impl RemoteDiagnostics {
    /// Build a probe client with the default markers and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, DiagnosticsError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS))
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DiagnosticsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiagnosticsError::HttpClientBuild(e.to_string()))?;
        Ok(Self::from_client(http))
    }

    #[must_use]
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http, markers: DEFAULT_MARKERS.iter().map(ToString::to_string).collect() }
    }

    #[must_use]
    pub fn with_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = markers;
        self
    }

    /// Fetch `url` and classify the outcome.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let mut result = ProbeResult::new(url);

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        };

        let status = response.status();
        result.status_code = Some(status.as_u16());
        result.content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        if !status.is_success() {
            result.error = Some(format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("")));
            return result;
        }

        match response.text().await {
            Ok(body) => {
                result.accessible = true;
                result.size = Some(body.len());
                result.contains_expected_marker = self.markers.iter().any(|m| body.contains(m.as_str()));
                if !result.contains_expected_marker {
                    result.error = Some("file does not appear to be a remote entry artifact".to_string());
                }
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        result
    }

    /// Try each conventional suffix under `base_url` in order and return the
    /// first that is reachable and carries a marker.
    pub async fn find_working_variant(&self, base_url: &str) -> Option<String> {
        for url in suggest_entry_urls(base_url) {
            let result = self.probe(&url).await;
            if result.is_working() {
                info!(base_url, url = %url, "found working remote entry");
                return Some(url);
            }
        }
        warn!(base_url, "no working remote entry found");
        None
    }

    /// Probe each `(remote, entry_url)` pair and log a grouped report.
    pub async fn diagnose_all(&self, remotes: &[(String, String)]) -> Vec<RemoteProbeReport> {
        let mut reports = Vec::with_capacity(remotes.len());
        for (remote, url) in remotes {
            let span = info_span!("remote_diagnostics", remote = %remote);
            let report = self.diagnose(remote, url).instrument(span).await;
            reports.push(report);
        }
        reports
    }

    async fn diagnose(&self, remote: &str, url: &str) -> RemoteProbeReport {
        let probe = self.probe(url).await;
        let hints = probe.hints();
        let alternates = if probe.accessible {
            Vec::new()
        } else {
            suggest_entry_urls(&base_of(url))
                .into_iter()
                .filter(|candidate| candidate != url)
                .collect()
        };

        if probe.is_working() {
            info!(url, size = probe.size, content_type = probe.content_type.as_deref(), "remote entry accessible");
        } else if probe.accessible {
            warn!(url, hints = ?hints, "remote entry reachable but marker missing");
        } else {
            error!(
                url,
                status = probe.status_code,
                error = probe.error.as_deref().unwrap_or_default(),
                hints = ?hints,
                alternates = ?alternates,
                "remote entry not accessible"
            );
        }

        RemoteProbeReport { remote: remote.to_string(), probe, hints, alternates }
    }
}

// =============================================================================
// URL HELPERS
// =============================================================================

/// Candidate entry URLs under `base_url`, in probe order.
#[must_use]
pub fn suggest_entry_urls(base_url: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    ENTRY_SUFFIXES.iter().map(|suffix| format!("{base}{suffix}")).collect()
}

/// Strip a known entry suffix from `url`, leaving the remote's base URL.
#[must_use]
pub fn base_of(url: &str) -> String {
    let mut suffixes = ENTRY_SUFFIXES;
    suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
    suffixes
        .iter()
        .find_map(|suffix| url.strip_suffix(suffix))
        .unwrap_or(url)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod tests;
