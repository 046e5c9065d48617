use url::Url;

/// Query parameters that carry tracking state rather than content identity.
/// Keys are matched case-insensitively.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "utm_cid",
    "utm_reader",
    "utm_name",
    "utm_pubreferrer",
    "fbclid",
    "gclid",
    "gclsrc",
    "dclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "ref",
    "ref_src",
    "ref_url",
    "_ga",
    "_gl",
    "ncid",
    "sr_share",
    "igshid",
    "twclid",
];

fn is_tracking_param(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&lowered.as_str())
}

/// Canonicalize a URL into the identity key used for deduplication.
///
/// Lowercases scheme and host, strips tracking parameters and the fragment,
/// and removes a single trailing slash from the path (unless the path is
/// exactly `/`). Returns the empty string for empty input and the original
/// string unchanged if the URL does not parse.
pub fn canonicalize_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };

    // Parameters with empty values are dropped along with tracking keys;
    // relative order of survivors is preserved.
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, v)| !v.is_empty() && !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = parsed.query_pairs_mut();
        serializer.clear();
        for (k, v) in &kept {
            serializer.append_pair(k, v);
        }
        drop(serializer);
    }

    parsed.set_fragment(None);

    let path = parsed.path().to_string();
    if path != "/" && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}

/// Validate an image URL candidate.
///
/// Rejects anything that is not absolute HTTP(S). URLs with a recognized
/// image extension or an upload/CDN-style path segment are preferred, but a
/// syntactically valid HTTP(S) URL is never hard-rejected since many image
/// services use dynamic paths.
pub fn clean_image_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    let path = parsed.path().to_ascii_lowercase();

    const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return Some(trimmed.to_string());
    }

    const MEDIA_PATH_KEYWORDS: &[&str] = &["wp-content", "uploads", "images", "img", "media", "cdn"];
    if MEDIA_PATH_KEYWORDS.iter().any(|kw| path.contains(kw)) {
        return Some(trimmed.to_string());
    }

    // Might be a dynamic image service; accept best-effort.
    Some(trimmed.to_string())
}
