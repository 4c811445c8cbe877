//! String format predicates used by structural validation.

use regex::Regex;
use std::sync::LazyLock;

static HOSTNAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("hostname pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+(\.[0-9]+)?(ns|us|µs|ms|s|m|h))+$").expect("duration pattern is valid")
});

const MAX_HOSTNAME_LENGTH: usize = 253;

const CRON_MACROS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

const MONTH_NAMES: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const DAY_NAMES: &[&str] = &["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// One of the five fields of a cron expression.
struct CronField {
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// Value of the first entry in `names`.
    first_name_value: u32,
}

const CRON_FIELDS: [CronField; 5] = [
    // minute
    CronField {
        min: 0,
        max: 59,
        names: &[],
        first_name_value: 0,
    },
    // hour
    CronField {
        min: 0,
        max: 23,
        names: &[],
        first_name_value: 0,
    },
    // day of month
    CronField {
        min: 1,
        max: 31,
        names: &[],
        first_name_value: 0,
    },
    // month
    CronField {
        min: 1,
        max: 12,
        names: MONTH_NAMES,
        first_name_value: 1,
    },
    // day of week, 7 is Sunday again
    CronField {
        min: 0,
        max: 7,
        names: DAY_NAMES,
        first_name_value: 0,
    },
];

/// RFC 1123 hostname: dot-separated labels of letters, digits and hyphens.
pub fn is_hostname(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_HOSTNAME_LENGTH
        && value.split('.').all(|label| HOSTNAME_LABEL.is_match(label))
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// A non-empty path without control characters.
pub fn is_file_path(value: &str) -> bool {
    !value.trim().is_empty() && !value.chars().any(char::is_control)
}

/// An absolute URL with a host, such as a package index.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

/// A five-field cron expression or one of the `@` shorthands.
///
/// Fields accept `*`, numbers, ranges (`1-5`), steps (`*/15`, `0-30/5`)
/// and comma-separated lists. Month and weekday fields also accept
/// three-letter names.
pub fn is_cron(value: &str) -> bool {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("@every ") {
        return DURATION.is_match(rest.trim());
    }
    if value.starts_with('@') {
        return CRON_MACROS.contains(&value);
    }

    let fields: Vec<&str> = value.split_whitespace().collect();
    fields.len() == CRON_FIELDS.len()
        && fields
            .iter()
            .zip(CRON_FIELDS.iter())
            .all(|(text, field)| text.split(',').all(|item| is_cron_item(item, field)))
}

fn is_cron_item(item: &str, field: &CronField) -> bool {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };

    if let Some(step) = step {
        match step.parse::<u32>() {
            Ok(step) if step > 0 => {}
            _ => return false,
        }
    }

    if range == "*" {
        return true;
    }

    match range.split_once('-') {
        Some((start, end)) => match (cron_value(start, field), cron_value(end, field)) {
            (Some(start), Some(end)) => start <= end,
            _ => false,
        },
        None => cron_value(range, field).is_some(),
    }
}

fn cron_value(text: &str, field: &CronField) -> Option<u32> {
    let value = match text.parse::<u32>() {
        Ok(value) => value,
        Err(_) => {
            let lower = text.to_ascii_lowercase();
            let index = field.names.iter().position(|name| *name == lower)?;
            index as u32 + field.first_name_value
        }
    };
    (field.min..=field.max).contains(&value).then_some(value)
}

#[cfg(test)]
#[path = "formats_tests.rs"]
mod tests;
