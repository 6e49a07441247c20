//! Utility functions for naming, size formatting and filename handling

/// Extension used when a display name has none
const DEFAULT_EXTENSION: &str = ".mp4";

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Format a byte count with binary unit thresholds
///
/// Bytes are printed as an integer, KB and MB with one decimal, GB with two.
///
/// # Examples
///
/// ```
/// use reelzip::utils::format_size;
///
/// assert_eq!(format_size(1023), "1023 B");
/// assert_eq!(format_size(1024), "1.0 KB");
/// assert_eq!(format_size(1_073_741_824), "1.00 GB");
/// ```
pub fn format_size(bytes: u64) -> String {
    match bytes {
        b if b >= GIB => format!("{:.2} GB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.1} MB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KB", b as f64 / KIB as f64),
        b => format!("{} B", b),
    }
}

/// Split a display name into stem and extension (extension keeps its dot)
///
/// Names without an extension get `.mp4`. A leading dot (`.hidden`) is
/// treated as part of the stem.
pub fn split_display_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => (&name[..pos], &name[pos..]),
        _ => (name, DEFAULT_EXTENSION),
    }
}

/// Archive entry name for the item at `index` (0-based)
///
/// The ordinal prefix keeps names unique and sorted in collection order
/// even when display names repeat.
///
/// # Examples
///
/// ```
/// use reelzip::utils::archive_entry_name;
///
/// assert_eq!(archive_entry_name(0, "intro.webm"), "01_intro.webm");
/// assert_eq!(archive_entry_name(11, "clip"), "12_clip.mp4");
/// ```
pub fn archive_entry_name(index: usize, display_name: &str) -> String {
    let cleaned = sanitize_filename(display_name);
    let (stem, ext) = split_display_name(&cleaned);
    format!("{:02}_{}{}", index + 1, stem, ext)
}

/// Strip characters that would let a name escape its directory or break headers
///
/// Path separators, control characters and quotes are replaced with `_`.
/// The result may be empty; callers pick their own fallback.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // ".." alone would still be a parent reference inside a zip
    if replaced.chars().all(|c| c == '.') {
        replaced.replace('.', "_")
    } else {
        replaced
    }
}

/// Derive a display name from a URL's last path segment, without query string
///
/// Falls back to `video_<n>.mp4` (1-based) when the segment is empty.
pub fn filename_from_url(raw_url: &str, index: usize) -> String {
    let without_query = raw_url.split(['?', '#']).next().unwrap_or_default();
    let last = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    // The host itself is not a filename
    let is_host_only = without_query
        .split("://")
        .nth(1)
        .is_some_and(|rest| !rest.trim_end_matches('/').contains('/'));

    let decoded = urlencoding::decode(last)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last.to_string());
    let cleaned = sanitize_filename(&decoded);

    if cleaned.is_empty() || is_host_only {
        format!("video_{}.mp4", index + 1)
    } else {
        cleaned
    }
}

/// Build a `Content-Disposition: attachment` value for `filename`
///
/// Includes an RFC 5987 `filename*` parameter so non-ASCII names survive.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_tier_boundaries() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_575), "1024.0 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(10 * 1_048_576), "10.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(5 * 1_073_741_824 + 536_870_912), "5.50 GB");
    }

    #[test]
    fn split_display_name_cases() {
        assert_eq!(split_display_name("clip.mkv"), ("clip", ".mkv"));
        assert_eq!(split_display_name("a.b.mp4"), ("a.b", ".mp4"));
        assert_eq!(split_display_name("noext"), ("noext", ".mp4"));
        assert_eq!(split_display_name(".hidden"), (".hidden", ".mp4"));
        assert_eq!(split_display_name("trailing."), ("trailing.", ".mp4"));
    }

    #[test]
    fn entry_names_are_distinct_for_repeated_display_names() {
        let names: Vec<String> = (0..120)
            .map(|i| archive_entry_name(i, "video.mp4"))
            .collect();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[0], "01_video.mp4");
        assert_eq!(names[99], "100_video.mp4");
    }

    #[test]
    fn entry_names_cannot_traverse() {
        let name = archive_entry_name(0, "../../etc/passwd");
        assert!(!name.contains('/'));
        assert_eq!(archive_entry_name(2, ".."), "03___.mp4");
    }

    #[test]
    fn filename_from_url_takes_last_segment() {
        assert_eq!(
            filename_from_url("https://cdn.test/media/clip%20one.mp4?sig=abc", 0),
            "clip one.mp4"
        );
        assert_eq!(filename_from_url("https://cdn.test/v/trailer", 0), "trailer");
    }

    #[test]
    fn filename_from_url_falls_back_to_ordinal() {
        assert_eq!(filename_from_url("https://cdn.test/", 2), "video_3.mp4");
        assert_eq!(filename_from_url("https://cdn.test", 0), "video_1.mp4");
        assert_eq!(filename_from_url("https://cdn.test/a/?x=1", 4), "a");
    }

    #[test]
    fn disposition_escapes_quotes_and_unicode() {
        let value = attachment_disposition("çekim.mp4");
        assert!(value.starts_with("attachment; filename=\"_ekim.mp4\""));
        assert!(value.contains("filename*=UTF-8''%C3%A7ekim.mp4"));

        let quoted = attachment_disposition("a\"b.mp4");
        assert!(quoted.starts_with("attachment; filename=\"a_b.mp4\""));
    }
}
