use crate::url::NormalizedUrl;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Upper bound on a derived base name, before any collision suffix
pub const MAX_NAME_LEN: usize = 120;

const MAX_TITLE_LEN: usize = 80;
const MAX_SEGMENT_LEN: usize = 40;
const FALLBACK_NAME: &str = "untitled";

/// Letters that carry no canonical decomposition and need an explicit fold
const ASCII_FOLDS: &[(char, &str)] = &[
    ('ı', "i"),
    ('ß', "ss"),
    ('ẞ', "SS"),
    ('ø', "o"),
    ('Ø', "O"),
    ('æ', "ae"),
    ('Æ', "AE"),
    ('œ', "oe"),
    ('Œ', "OE"),
    ('ł', "l"),
    ('Ł', "L"),
    ('đ', "d"),
    ('Đ', "D"),
    ('ð', "d"),
    ('Ð', "D"),
    ('þ', "th"),
    ('Þ', "Th"),
    ('ħ', "h"),
    ('Ħ', "H"),
    ('ŋ', "n"),
    ('Ŋ', "N"),
];

/// Derives a stable, filesystem-safe base name from a page title and URL
///
/// # Naming Steps
///
/// 1. Take the last non-empty path segment (extension removed, lowercased),
///    or the host when the path is root
/// 2. Take the title, falling back to the segment when the title is empty
/// 3. Transliterate non-ASCII letters to ASCII
/// 4. Replace everything outside `[A-Za-z0-9_-]` with `_` and collapse runs
/// 5. Join as `{Title}_{segment}` and bound the length
///
/// # Examples
///
/// ```
/// use site_folio::naming::derive_name;
/// use site_folio::url::normalize;
///
/// let url = normalize("https://example.com/company/about", None).unwrap();
/// assert_eq!(derive_name("Hakkımızda", &url), "Hakkimizda_about");
/// ```
pub fn derive_name(title: &str, url: &NormalizedUrl) -> String {
    let segment = truncate(&sanitize(&url_segment(url)), MAX_SEGMENT_LEN);
    let title = truncate(&sanitize(&transliterate(title.trim())), MAX_TITLE_LEN);

    let joined = match (title.is_empty(), segment.is_empty()) {
        (true, true) => String::new(),
        (true, false) => segment,
        (false, true) => title,
        (false, false) => format!("{}_{}", title, segment),
    };

    let name = truncate(&joined, MAX_NAME_LEN);
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// Maps non-ASCII letters to their closest ASCII spelling
///
/// Characters with a canonical decomposition lose their combining marks
/// (`ş` → `s`, `é` → `e`); a small fold table covers letters that do not
/// decompose (`ı` → `i`, `ß` → `ss`). Anything else is passed through for
/// the sanitizer to replace.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }

        if let Some((_, folded)) = ASCII_FOLDS.iter().find(|(from, _)| *from == c) {
            out.push_str(folded);
            continue;
        }

        let base: String = std::iter::once(c)
            .nfd()
            .filter(|d| !is_combining_mark(*d))
            .collect();

        if !base.is_empty() && base.is_ascii() {
            out.push_str(&base);
        } else {
            out.push(c);
        }
    }

    out
}

/// Returns the last non-empty path segment, or the host for root paths
fn url_segment(url: &NormalizedUrl) -> String {
    let last = url
        .as_url()
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string());

    match last {
        Some(raw) => {
            let decoded = urlencoding::decode(&raw)
                .map(|d| d.into_owned())
                .unwrap_or(raw);
            let stem = strip_extension(&decoded);
            transliterate(stem).to_lowercase()
        }
        None => url.host_key(),
    }
}

/// Removes a trailing file extension (`guide.html` → `guide`)
fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    }
}

/// Replaces disallowed characters with `_`, collapsing and trimming runs
fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }

    out.trim_matches('_').to_string()
}

/// Bounds an ASCII name to `max` characters without a dangling separator
fn truncate(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    name[..max].trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize;

    fn url(raw: &str) -> NormalizedUrl {
        normalize(raw, None).unwrap()
    }

    fn is_safe(name: &str) -> bool {
        name.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    #[test]
    fn test_turkish_title_is_transliterated() {
        let name = derive_name("Hakkımızda", &url("https://example.com.tr/kurumsal/about"));
        assert!(name.is_ascii());
        assert!(is_safe(&name));
        assert!(name.contains("Hakkimizda"));
        assert!(name.contains("about"));
        assert_eq!(name, "Hakkimizda_about");
    }

    #[test]
    fn test_title_and_segment_joined() {
        let name = derive_name("Our Team", &url("https://example.com/people/team/"));
        assert_eq!(name, "Our_Team_team");
    }

    #[test]
    fn test_punctuation_collapsed() {
        let name = derive_name("  About us | Example -- Corp!!  ", &url("https://example.com/about"));
        assert_eq!(name, "About_us_Example_--_Corp_about");
        assert!(is_safe(&name));
    }

    #[test]
    fn test_title_matching_segment_still_joined() {
        assert_eq!(
            derive_name("About", &url("https://example.com/about")),
            "About_about"
        );
        assert_eq!(
            derive_name("guide", &url("https://example.com/docs/guide.html")),
            "guide_guide"
        );
    }

    #[test]
    fn test_root_path_falls_back_to_host() {
        let name = derive_name("Home", &url("https://example.com/"));
        assert_eq!(name, "Home_example_com");
    }

    #[test]
    fn test_empty_title_falls_back_to_segment() {
        let name = derive_name("   ", &url("https://example.com/docs/install"));
        assert_eq!(name, "install");
    }

    #[test]
    fn test_extension_removed_and_lowercased() {
        let name = derive_name("Guide", &url("https://example.com/Docs/Setup.HTML"));
        assert_eq!(name, "Guide_setup");
    }

    #[test]
    fn test_percent_encoded_segment_decoded() {
        let name = derive_name("Kurumsal", &url("https://example.com/hakk%C4%B1m%C4%B1zda"));
        assert_eq!(name, "Kurumsal_hakkimizda");
    }

    #[test]
    fn test_unmappable_characters_replaced() {
        let name = derive_name("東京 Guide ✓", &url("https://example.com/tokyo"));
        assert_eq!(name, "Guide_tokyo");
        assert!(is_safe(&name));
    }

    #[test]
    fn test_fully_unmappable_title_uses_segment() {
        let name = derive_name("東京", &url("https://example.com/tokyo"));
        assert_eq!(name, "tokyo");
    }

    #[test]
    fn test_length_is_bounded() {
        let long_title = "word ".repeat(100);
        let long_segment = "s".repeat(200);
        let name = derive_name(
            &long_title,
            &url(&format!("https://example.com/{}", long_segment)),
        );
        assert!(name.len() <= MAX_NAME_LEN);
        assert!(!name.ends_with('_'));
        assert!(is_safe(&name));
    }

    #[test]
    fn test_deterministic() {
        let u = url("https://example.com/a/b");
        assert_eq!(derive_name("Title", &u), derive_name("Title", &u));
    }

    #[test]
    fn test_transliterate_common_letters() {
        assert_eq!(transliterate("İstanbul Şişli Göztepe Çağ"), "Istanbul Sisli Goztepe Cag");
        assert_eq!(transliterate("Straße Ørsted Æsir"), "Strasse Orsted AEsir");
        assert_eq!(transliterate("café naïve"), "cafe naive");
    }
}
