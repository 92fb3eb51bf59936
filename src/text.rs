use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

lazy_static! {
    // Applied to normalized labels, so "Día", "DIA" and "dia" all read as "dia".
    static ref DAY_WORD: Regex = Regex::new(r"(?:dia|day)\s*([0-9]+)").unwrap();
    static ref LONE_DIGIT: Regex = Regex::new(r"\b([0-9])\b").unwrap();
}

/// Case-folded, diacritic-stripped form of `s`. Stored names and live search
/// input both go through here so that matching is symmetric.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Extracts the trip day from a folder label such as "Día 3 - Seceda" or
/// "Etapa 2". Returns `None` when the label carries no recognizable marker.
pub fn day_from_label(label: &str) -> Option<u32> {
    let label = normalize(label);
    [&*DAY_WORD, &*LONE_DIGIT].iter().find_map(|pattern| {
        pattern
            .captures(&label)
            .and_then(|c| c.get(1))
            .map(|m| parse_day_number(m.as_str()))
    })
}

// The captures are ASCII digits, so parsing only fails on overflow.
fn parse_day_number(digits: &str) -> u32 {
    digits.parse::<u32>().unwrap_or_else(|_| {
        warn!("day number {digits} is out of range, using {}", u32::MAX);
        u32::MAX
    })
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
