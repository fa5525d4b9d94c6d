//! Pure message composition: no I/O, no state, same input same output.

use crate::probe::{PingOutcome, PingResult};

const PARTIAL_OUTAGE: &str = "is suffering a partial outage";
const FULL_OUTAGE: &str = "is completely down";
const ALL_OPERATIONAL: &str = "All services operational.";

/// Friendly text for a status code. Unmapped codes get the fallback line
/// rather than a bare number.
#[must_use]
pub fn describe_status(code: u16) -> &'static str {
    match code {
        200 => "Ok",
        202 => "Accepted",
        301 => "Moved Permamently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        410 => "Gone, reduced to atoms",
        418 => "I am a teapot 🫖",
        429 => "Too many requests",
        500 => "Internal server error",
        502 => "Bad gateway",
        503 => "Service Unavailable",
        504 | 408 | 524 => "Timeout",
        521 => "Web server is down",
        522 => "Connection timed out",
        523 => "Origin is unreachable",
        525 => "Handshake failed",
        526 => "Invalid certificate (oh oh!)",
        _ => "I don't know how to handle that code, so here is this message instead.",
    }
}

/// One report line for one service.
#[must_use]
pub fn service_line(result: &PingResult) -> String {
    match result.outcome {
        PingOutcome::TimedOut => format!("{}: Response timed out.", result.name),
        PingOutcome::Responded { status, elapsed_ms } => format!(
            "{}: {} (took {elapsed_ms}ms)",
            result.name,
            describe_status(status)
        ),
    }
}

/// The headline: full outage when every service fails, partial outage (with
/// the up/total fraction) once the failure count reaches `threshold`,
/// all-operational otherwise.
#[must_use]
pub fn outage_line(total: usize, failing: usize, threshold: usize, site_name: &str) -> String {
    if failing >= total {
        format!("{site_name} {FULL_OUTAGE}")
    } else if failing >= threshold {
        format!("{site_name} {PARTIAL_OUTAGE} ({}/{total})", total - failing)
    } else {
        ALL_OPERATIONAL.to_string()
    }
}

/// Assembles the full post: headline, one line per service in order, then
/// the hashtag line (omitted when no hashtags are configured).
#[must_use]
pub fn compose_message(
    site_name: &str,
    threshold: usize,
    hashtags: &[String],
    results: &[PingResult],
) -> String {
    let failing = results.iter().filter(|r| r.is_failing()).count();

    let mut lines = Vec::with_capacity(results.len() + 2);
    lines.push(outage_line(results.len(), failing, threshold, site_name));
    lines.extend(results.iter().map(service_line));
    if !hashtags.is_empty() {
        lines.push(hashtags.join(" "));
    }
    lines.join("\n")
}
