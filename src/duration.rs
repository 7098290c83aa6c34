//! Broadcast duration strings (`PT1H2M3S`) as reported by `contentDetails`.

const UNITS: [(char, u64); 3] = [('H', 3600), ('M', 60), ('S', 1)];

/// Converts `PT[nH][nM][nS]` into total seconds.
///
/// Components are optional but must appear in hours, minutes, seconds order.
/// Anything else (missing prefix, reordered or repeated units, a unit without
/// digits, trailing characters, overflow) yields `None`. `"PT"` is zero.
pub fn parse_duration(value: &str) -> Option<u64> {
    let mut rest = value.strip_prefix("PT")?;
    let mut total: u64 = 0;

    for (unit, factor) in UNITS {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            continue;
        }
        let (number, tail) = rest.split_at(digits);
        let Some(tail) = tail.strip_prefix(unit) else {
            continue;
        };
        let amount: u64 = number.parse().ok()?;
        total = total.checked_add(amount.checked_mul(factor)?)?;
        rest = tail;
    }

    rest.is_empty().then_some(total)
}

/// Same as [`parse_duration`] but passes a missing value through.
pub fn duration_seconds(value: Option<&str>) -> Option<u64> {
    value.and_then(parse_duration)
}

/// Renders durations as `H:MM:SS` or `M:SS` for short clips.
pub fn format_duration(duration: u64) -> String {
    let hours = duration / 3600;
    let minutes = (duration % 3600) / 60;
    let seconds = duration % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
