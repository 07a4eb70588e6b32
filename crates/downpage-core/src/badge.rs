//! Flat shields-style SVG badges.

const LABEL_COLOR: &str = "#555";
const RELEASE_COLOR: &str = "#007ec6";
const DOWNLOADS_COLOR: &str = "#4c1";

// Average advance of an 11px Verdana glyph, in pixels
const CHAR_WIDTH: f64 = 6.5;
const PADDING: u32 = 10;

/// "release | v1.2.0"
pub fn release_badge(tag: &str) -> String {
    render("release", tag, RELEASE_COLOR)
}

/// "downloads | 1.2K"
pub fn downloads_badge(count: u64) -> String {
    render("downloads", &format_download_count(count), DOWNLOADS_COLOR)
}

/// Compact count: `999`, `1.2K`, `3.4M`.
pub fn format_download_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{}M", tenths(count, 100_000))
    } else if count >= 1_000 {
        format!("{}K", tenths(count, 100))
    } else {
        count.to_string()
    }
}

/// Human-readable byte size: `0 B`, `512 B`, `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    format!("{} {}", rounded, UNITS[unit])
}

// `count / per_tenth / 10` rounded half up, without a trailing ".0"
fn tenths(count: u64, per_tenth: u64) -> String {
    let tenths = (count + per_tenth / 2) / per_tenth;
    if tenths % 10 == 0 {
        (tenths / 10).to_string()
    } else {
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

fn text_width(text: &str) -> u32 {
    (text.chars().count() as f64 * CHAR_WIDTH).ceil() as u32 + PADDING
}

fn render(label: &str, message: &str, color: &str) -> String {
    let label_width = text_width(label);
    let message_width = text_width(message);
    let width = label_width + message_width;
    let label_x = label_width * 5;
    let message_x = (label_width * 10) + message_width * 5;
    let label = escape_xml(label);
    let message = escape_xml(message);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="20" role="img" aria-label="{label}: {message}"><title>{label}: {message}</title><linearGradient id="s" x2="0" y2="100%"><stop offset="0" stop-color="#bbb" stop-opacity=".1"/><stop offset="1" stop-opacity=".1"/></linearGradient><clipPath id="r"><rect width="{width}" height="20" rx="3" fill="#fff"/></clipPath><g clip-path="url(#r)"><rect width="{label_width}" height="20" fill="{label_color}"/><rect x="{label_width}" width="{message_width}" height="20" fill="{color}"/><rect width="{width}" height="20" fill="url(#s)"/></g><g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="110"><text x="{label_x}" y="140" transform="scale(.1)" fill="#fff">{label}</text><text x="{message_x}" y="140" transform="scale(.1)" fill="#fff">{message}</text></g></svg>"##,
        width = width,
        label = label,
        message = message,
        label_width = label_width,
        message_width = message_width,
        label_color = LABEL_COLOR,
        color = color,
        label_x = label_x,
        message_x = message_x,
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
