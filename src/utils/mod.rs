//! Utility functions and helpers.

pub mod fingerprint;
pub mod http;

pub use fingerprint::fingerprint;

/// Make a product link absolute.
///
/// Links that already start with `http` are returned untouched. Anything else
/// is appended to `origin` (scheme and host, no trailing slash), with a `/`
/// inserted when the link does not start with one.
pub fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}
