//! Content sanitization.
//!
//! Strips dangerous markup from free-text payloads before they reach the
//! cache or the backing store. Pattern removal runs to a fixed point, so
//! payloads that try to reassemble a tag out of a stripped inner tag
//! (`<scr<script>ipt>`) are fully dismantled and sanitization is
//! idempotent: `sanitize(sanitize(x)) == sanitize(x)`.

use mnemo_core::constants::MAX_CONTENT_LENGTH;
use mnemo_core::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

/// How the content should be interpreted, which picks the extra
/// sanitization applied on top of the dangerous-pattern strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Html,
    Json,
}

impl ContentKind {
    /// Map a free-form kind string onto a sanitization mode. Anything
    /// that is not html or json is treated as plain text.
    pub fn parse(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "html" => ContentKind::Html,
            "json" => ContentKind::Json,
            _ => ContentKind::Text,
        }
    }
}

static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script[^>]*>.*?</script>",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=[^>\s]*",
        r"(?is)<iframe[^>]*>.*?</iframe>",
        r"(?is)<object[^>]*>.*?</object>",
        r"(?is)<embed[^>]*>.*?</embed>",
        r"(?i)<link[^>]*>",
        r"(?i)<meta[^>]*>",
        r"(?is)<style[^>]*>.*?</style>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern compiles"))
    .collect()
});

static ALL_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static pattern compiles"));

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("static pattern compiles"));

/// Upper bound on fixed-point iterations. Each pass can only shrink the
/// input, so this is never reached on real payloads.
const MAX_STRIP_PASSES: usize = 16;

/// Strip dangerous markup to a fixed point. Removal itself can splice a
/// new pattern together out of the surrounding text (nested tags, tags
/// inside a `javascript:` scheme), so the pass repeats until the input
/// stops changing. For HTML the remaining-tag strip runs inside the same
/// loop for the same reason.
fn strip_dangerous(text: &str, strip_all_tags: bool) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_STRIP_PASSES {
        let mut next = current.clone();
        for pattern in DANGEROUS_PATTERNS.iter() {
            next = pattern.replace_all(&next, "").into_owned();
        }
        if strip_all_tags {
            next = ALL_TAGS.replace_all(&next, "").into_owned();
        }
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Sanitize free-text content.
///
/// Rejects oversized payloads, removes control characters, strips
/// dangerous markup, applies kind-specific handling (`Html` strips all
/// remaining tags, `Json` must parse), and trims.
pub fn sanitize_content(content: &str, kind: ContentKind) -> Result<String, ValidationError> {
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "content".to_string(),
            len: content.len(),
            max: MAX_CONTENT_LENGTH,
        });
    }

    // Control characters first: a `java\x00script:` payload must not
    // reassemble after the pattern pass.
    let cleaned = CONTROL_CHARS.replace_all(content, "");

    let sanitized = strip_dangerous(&cleaned, kind == ContentKind::Html);

    if kind == ContentKind::Json {
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&sanitized) {
            return Err(ValidationError::InvalidJson {
                reason: e.to_string(),
            });
        }
    }

    Ok(sanitized.trim().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
