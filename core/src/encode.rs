//! URL joining and parameter encoding.

use url::form_urlencoded;

/// Join `base` and `relative` with exactly one `/` between them.
pub fn join(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Percent-encode a single path segment such as a username or repo name.
pub fn path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Encode pairs as a query string, keeping their order.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Encode pairs as an `application/x-www-form-urlencoded` body.
pub fn encode_form(pairs: &[(String, String)]) -> String {
    encode_query(pairs)
}

/// Decode a query string or form body back into pairs.
pub fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_inserts_single_slash() {
        assert_eq!(join("http://h/api/v1", "user/repos"), "http://h/api/v1/user/repos");
        assert_eq!(join("http://h/api/v1/", "/user/repos"), "http://h/api/v1/user/repos");
        assert_eq!(join("http://h/api/v1//", "//user/repos"), "http://h/api/v1/user/repos");
        assert_eq!(join("http://h/api/v1", "/user/repos"), "http://h/api/v1/user/repos");
    }

    #[test]
    fn path_segment_escapes_reserved_characters() {
        assert_eq!(path_segment("plain-name_1"), "plain-name_1");
        assert_eq!(path_segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn encode_query_preserves_order_and_escapes() {
        let pairs = vec![
            ("q".to_string(), "key word".to_string()),
            ("limit".to_string(), "4".to_string()),
            ("token".to_string(), "a=b&c".to_string()),
        ];
        let encoded = encode_query(&pairs);
        assert_eq!(encoded, "q=key+word&limit=4&token=a%3Db%26c");
        assert_eq!(decode_pairs(&encoded), pairs);
    }

    #[test]
    fn encode_empty_is_empty() {
        assert_eq!(encode_form(&[]), "");
    }
}
