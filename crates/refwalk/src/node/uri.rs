//! Reference target URIs
//!
//! A `$ref` value is split into a document part and a fragment. The
//! document part is resolved against the URI of the document the reference
//! was found in. Absolute URIs go through `url`; plain relative paths
//! (`specs/root.yaml`) are joined lexically so local files work without a
//! `file://` scheme.

use url::Url;

/// Split a reference into `(document, fragment)` at the first `#`.
///
/// The fragment excludes the `#`; a missing fragment is empty.
pub fn split(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((document, fragment)) => (document, fragment),
        None => (reference, ""),
    }
}

/// Strip any fragment from a URI.
pub fn strip_fragment(uri: &str) -> &str {
    split(uri).0
}

/// Resolve the document part of `reference` against `base`.
///
/// An empty document part designates the base document itself.
pub fn resolve(base: &str, reference: &str) -> String {
    let base = strip_fragment(base);
    let (document, _) = split(reference);
    if document.is_empty() {
        return base.to_string();
    }
    if Url::parse(document).is_ok() {
        return document.to_string();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(document) {
            return joined.to_string();
        }
        return document.to_string();
    }
    if document.starts_with('/') {
        return normalize(document);
    }
    let directory = match base.rfind('/') {
        Some(i) => &base[..=i],
        None => "",
    };
    normalize(&format!("{}{}", directory, document))
}

/// The `uri#pointer` key identifying one reference target.
pub fn target_key(document: &str, fragment: &str) -> String {
    format!("{}#{}", document, fragment)
}

fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
