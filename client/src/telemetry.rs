//! Fetch counters. Compiled to no-ops without the `telemetry` feature.

use crate::error::FetchErrorKind;

#[cfg(feature = "telemetry")]
const ATTEMPTS: &str = "patternscan_fetch_attempts_total";
#[cfg(feature = "telemetry")]
const RETRIES: &str = "patternscan_fetch_retries_total";
#[cfg(feature = "telemetry")]
const FAILURES: &str = "patternscan_fetch_failures_total";

#[cfg(feature = "telemetry")]
pub(crate) fn record_attempt() {
    metrics::counter!(ATTEMPTS).increment(1);
}

#[cfg(feature = "telemetry")]
pub(crate) fn record_retry(kind: FetchErrorKind) {
    metrics::counter!(RETRIES, "kind" => kind.as_ref().to_string()).increment(1);
}

#[cfg(feature = "telemetry")]
pub(crate) fn record_failure(kind: FetchErrorKind) {
    metrics::counter!(FAILURES, "kind" => kind.as_ref().to_string()).increment(1);
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn record_attempt() {}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn record_retry(_kind: FetchErrorKind) {}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn record_failure(_kind: FetchErrorKind) {}
