// src/config/interval.rs

//! Parsing of `sync_delay` style intervals (`"30s"`, `"5m"`, `"2h"`).

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([smh])$").expect("interval regex is valid"));

/// Parse an interval of the form `<digits><unit>` where unit is `s`, `m` or `h`.
///
/// No whitespace, signs, decimals or upper-case units are accepted.
pub fn parse_interval(interval: &str) -> Result<Duration, String> {
    let caps = INTERVAL_RE.captures(interval).ok_or_else(|| {
        format!("interval string does not match format (i.e 1s, 3m, 5h): {interval:?}")
    })?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|_| format!("interval value out of range: {interval:?}"))?;

    let multiplier = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => return Err(format!("invalid time unit: {other}")),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("interval value out of range: {interval:?}"))
}
