//! Timezone label resolution.
//!
//! Requests name zones loosely: IANA identifiers, abbreviations ("PST"),
//! airport codes ("LHR") or city names ("new york"). Labels resolve through
//! a static alias table, then chrono-tz. Nothing here ever fails: an
//! unknown label resolves to the caller's fallback zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Static alias table: lowercase label → IANA identifier.
static ALIASES: &[(&str, &str)] = &[
    // Abbreviations
    ("utc", "UTC"),
    ("gmt", "Etc/GMT"),
    ("z", "UTC"),
    ("pt", "America/Los_Angeles"),
    ("pst", "America/Los_Angeles"),
    ("pdt", "America/Los_Angeles"),
    ("mt", "America/Denver"),
    ("mst", "America/Denver"),
    ("mdt", "America/Denver"),
    ("ct", "America/Chicago"),
    ("cst", "America/Chicago"),
    ("cdt", "America/Chicago"),
    ("et", "America/New_York"),
    ("est", "America/New_York"),
    ("edt", "America/New_York"),
    ("bst", "Europe/London"),
    ("cet", "Europe/Paris"),
    ("cest", "Europe/Paris"),
    ("eet", "Europe/Athens"),
    ("ist", "Asia/Kolkata"),
    ("sgt", "Asia/Singapore"),
    ("jst", "Asia/Tokyo"),
    ("kst", "Asia/Seoul"),
    ("aest", "Australia/Sydney"),
    ("aedt", "Australia/Sydney"),
    // Airports
    ("sfo", "America/Los_Angeles"),
    ("lax", "America/Los_Angeles"),
    ("sea", "America/Los_Angeles"),
    ("yvr", "America/Vancouver"),
    ("den", "America/Denver"),
    ("ord", "America/Chicago"),
    ("dfw", "America/Chicago"),
    ("aus", "America/Chicago"),
    ("jfk", "America/New_York"),
    ("ewr", "America/New_York"),
    ("lga", "America/New_York"),
    ("bos", "America/New_York"),
    ("atl", "America/New_York"),
    ("mia", "America/New_York"),
    ("iad", "America/New_York"),
    ("yyz", "America/Toronto"),
    ("mex", "America/Mexico_City"),
    ("gru", "America/Sao_Paulo"),
    ("lhr", "Europe/London"),
    ("lgw", "Europe/London"),
    ("dub", "Europe/Dublin"),
    ("cdg", "Europe/Paris"),
    ("ams", "Europe/Amsterdam"),
    ("fra", "Europe/Berlin"),
    ("muc", "Europe/Berlin"),
    ("zrh", "Europe/Zurich"),
    ("mad", "Europe/Madrid"),
    ("fco", "Europe/Rome"),
    ("arn", "Europe/Stockholm"),
    ("dxb", "Asia/Dubai"),
    ("bom", "Asia/Kolkata"),
    ("del", "Asia/Kolkata"),
    ("blr", "Asia/Kolkata"),
    ("sin", "Asia/Singapore"),
    ("hkg", "Asia/Hong_Kong"),
    ("pvg", "Asia/Shanghai"),
    ("icn", "Asia/Seoul"),
    ("nrt", "Asia/Tokyo"),
    ("hnd", "Asia/Tokyo"),
    ("syd", "Australia/Sydney"),
    ("mel", "Australia/Melbourne"),
    ("akl", "Pacific/Auckland"),
    // Cities
    ("san francisco", "America/Los_Angeles"),
    ("los angeles", "America/Los_Angeles"),
    ("seattle", "America/Los_Angeles"),
    ("denver", "America/Denver"),
    ("chicago", "America/Chicago"),
    ("austin", "America/Chicago"),
    ("new york", "America/New_York"),
    ("nyc", "America/New_York"),
    ("boston", "America/New_York"),
    ("toronto", "America/Toronto"),
    ("london", "Europe/London"),
    ("dublin", "Europe/Dublin"),
    ("paris", "Europe/Paris"),
    ("berlin", "Europe/Berlin"),
    ("amsterdam", "Europe/Amsterdam"),
    ("zurich", "Europe/Zurich"),
    ("madrid", "Europe/Madrid"),
    ("dubai", "Asia/Dubai"),
    ("mumbai", "Asia/Kolkata"),
    ("bangalore", "Asia/Kolkata"),
    ("bengaluru", "Asia/Kolkata"),
    ("singapore", "Asia/Singapore"),
    ("hong kong", "Asia/Hong_Kong"),
    ("shanghai", "Asia/Shanghai"),
    ("seoul", "Asia/Seoul"),
    ("tokyo", "Asia/Tokyo"),
    ("sydney", "Australia/Sydney"),
    ("melbourne", "Australia/Melbourne"),
    ("auckland", "Pacific/Auckland"),
];

/// Resolve a timezone label, or `None` if nothing matches.
pub fn resolve_timezone(label: &str) -> Option<Tz> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Aliases win over chrono-tz so "EST" means New York, not fixed UTC-5.
    let key = trimmed.to_ascii_lowercase().replace('_', " ");
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .and_then(|(_, iana)| iana.parse::<Tz>().ok())
        .or_else(|| trimmed.parse::<Tz>().ok())
}

/// Resolve `label`, falling back to `fallback` (and then UTC) with a warning.
pub fn resolve_or_default(label: &str, fallback: &str) -> Tz {
    resolve_timezone(label).unwrap_or_else(|| {
        warn!(label, fallback, "unresolvable timezone, using fallback");
        resolve_timezone(fallback).unwrap_or(Tz::UTC)
    })
}

/// Human-readable local time of `instant` in `tz`, e.g. `Mon 16 Mar 09:00 EDT`.
pub fn local_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%a %d %b %H:%M %Z")
        .to_string()
}
