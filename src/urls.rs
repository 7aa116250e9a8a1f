//! Small URL helpers shared by the URL builder and providers.
//!
//! All functions are pure string manipulation; nothing here resolves or
//! fetches anything.

use url::Url;
use url::form_urlencoded;

/// True when `input` starts with a scheme followed by `:/` or `:\`
/// (`https://cdn/a.jpg`, `s3://bucket/a.jpg`). `data:` URIs and
/// protocol-relative `//host` paths are not considered absolute here.
pub fn has_protocol(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };
    scheme.len() >= 2
        && scheme
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        && (rest.starts_with('/') || rest.starts_with('\\'))
}

pub fn with_leading_slash(input: &str) -> String {
    if input.starts_with('/') {
        input.to_string()
    } else {
        format!("/{input}")
    }
}

pub fn with_trailing_slash(input: &str) -> String {
    if input.ends_with('/') {
        input.to_string()
    } else {
        format!("{input}/")
    }
}

pub fn without_leading_slash(input: &str) -> &str {
    input.strip_prefix('/').unwrap_or(input)
}

/// Join URL segments with exactly one `/` between them.
///
/// Empty segments and bare `/` segments are skipped; a leading `./` on a
/// segment is dropped. The first kept segment is used verbatim, so
/// `join_url(&["https://cdn", "/a.jpg"])` keeps the origin intact.
pub fn join_url(segments: &[&str]) -> String {
    let mut url = String::new();
    for segment in segments.iter().filter(|s| !s.is_empty() && **s != "/") {
        if url.is_empty() {
            url = (*segment).to_string();
        } else {
            let segment = segment.strip_prefix("./").unwrap_or(segment);
            url = with_trailing_slash(&url) + without_leading_slash(segment);
        }
    }
    url
}

fn keep_in_path(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b'/'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b':'
                | b'@'
                | b'%'
        )
}

/// Percent-encode characters that are not valid in a URL path.
/// Slashes and existing `%XX` escapes are kept.
pub fn encode_path(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if keep_in_path(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Like [`encode_path`] but also escapes `/`, for single path segments.
pub fn encode_param(input: &str) -> String {
    encode_path(input).replace('/', "%2F")
}

/// Serialize query pairs as `application/x-www-form-urlencoded`.
pub fn stringify_query(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Host (with port, if any) of an absolute URL.
pub fn host_of(input: &str) -> Option<String> {
    let parsed = Url::parse(input).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Normalize a configured domain (`example.com`, `https://example.com/x`)
/// to its host. Inputs without a scheme are read as `http://`.
pub fn normalize_domain(domain: &str) -> Option<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }
    if domain.starts_with("http") {
        host_of(domain)
    } else {
        host_of(&format!("http://{domain}"))
    }
}

/// Lowercased file extension of a source path, ignoring query and fragment.
pub fn file_extension(src: &str) -> Option<String> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_detection() {
        assert!(has_protocol("https://example.com/a.jpg"));
        assert!(has_protocol("http://example.com"));
        assert!(has_protocol("s3://bucket/key"));
        assert!(!has_protocol("/images/a.jpg"));
        assert!(!has_protocol("images/a.jpg"));
        assert!(!has_protocol("data:image/png;base64,AAAA"));
        assert!(!has_protocol("//cdn.example.com/a.jpg"));
        assert!(!has_protocol("c:/windows"));
    }

    #[test]
    fn join_inserts_single_slashes() {
        assert_eq!(join_url(&["/_ipx", "w_100", "/a.jpg"]), "/_ipx/w_100/a.jpg");
        assert_eq!(join_url(&["https://cdn/", "/v7/", "a.jpg"]), "https://cdn/v7/a.jpg");
        assert_eq!(join_url(&["", "/a.jpg"]), "/a.jpg");
        assert_eq!(join_url(&["/", "a.jpg"]), "a.jpg");
        assert_eq!(join_url(&["base", "./a.jpg"]), "base/a.jpg");
        assert_eq!(join_url(&[]), "");
    }

    #[test]
    fn path_encoding_keeps_slashes() {
        assert_eq!(encode_path("/my photos/a b.jpg"), "/my%20photos/a%20b.jpg");
        assert_eq!(encode_path("/already%20encoded"), "/already%20encoded");
        assert_eq!(encode_param("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn query_serialization_escapes_values() {
        assert_eq!(
            stringify_query(&[("url", "/a b.jpg"), ("w", "640")]),
            "url=%2Fa+b.jpg&w=640"
        );
    }

    #[test]
    fn domains_normalize_to_hosts() {
        assert_eq!(normalize_domain("example.com").as_deref(), Some("example.com"));
        assert_eq!(
            normalize_domain("https://images.example.com/path").as_deref(),
            Some("images.example.com")
        );
        assert_eq!(
            normalize_domain("localhost:3000").as_deref(),
            Some("localhost:3000")
        );
        assert_eq!(normalize_domain("  "), None);
    }

    #[test]
    fn extensions() {
        assert_eq!(file_extension("/a/b.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("https://x.com/c.svg?v=2").as_deref(), Some("svg"));
        assert_eq!(file_extension("/a/noext"), None);
        assert_eq!(file_extension("/a/.hidden"), None);
    }
}
