//! Canonical form encoding of payloads and query strings.
//!
//! Both ends of a signed exchange run their data through these functions, so
//! the output must be byte-identical for semantically equal input:
//!
//! ```text
//! keys sorted ascending, values per key sorted ascending,
//! key=value pairs joined with '&', multi-valued keys repeated,
//! bytes outside [A-Za-z0-9_.-] percent-encoded, space as '+'
//! ```

use crate::{
    constants::{CLIENT_ID_PARAM_NAME, SIGNATURE_PARAM_NAME},
    models::payload::FormData,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Bytes left untouched by form encoding: ASCII alphanumerics and `_.-`.
///
/// `~` is escaped as `%7E`.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

/// Percent-encode a key or value for a form body, with space as `+`.
///
/// # Examples
///
/// ```
/// use request_signer::utils::encoding::quote_plus;
///
/// assert_eq!(quote_plus("Mr. Test"), "Mr.+Test");
/// assert_eq!(quote_plus("a&b=c"), "a%26b%3Dc");
/// ```
pub fn quote_plus(input: &str) -> String {
    input
        .split(' ')
        .map(|part| utf8_percent_encode(part, FORM_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Canonically encode form data, dropping the signature field.
///
/// Returns the empty string for empty data; the signer always appends the
/// result, so there is no "absent" encoding.
pub fn encode_form(data: &FormData) -> String {
    let mut fields = data.canonical();
    fields.remove(SIGNATURE_PARAM_NAME);
    encode_fields(&fields)
}

/// Canonically encode a request payload for signing.
///
/// Like [`encode_form`], but the client-id field is dropped as well: it is
/// authenticated through the URL, never through the body.
pub fn encode_payload(data: &FormData) -> String {
    let mut fields = data.canonical();
    fields.remove(SIGNATURE_PARAM_NAME);
    fields.remove(CLIENT_ID_PARAM_NAME);
    encode_fields(&fields)
}

fn encode_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    let mut pairs = Vec::new();
    for (key, values) in fields {
        let key = quote_plus(key);
        for value in values {
            pairs.push(format!("{key}={}", quote_plus(value)));
        }
    }
    pairs.join("&")
}

/// Canonicalize a raw query string.
///
/// Pairs are form-decoded, pairs with an empty value are dropped, the
/// signature parameter is removed and the rest is re-encoded canonically.
/// The client-id parameter stays: it is part of what the client signed.
pub fn canonical_query(query: &str) -> String {
    let data: FormData = query_pairs(query)
        .filter(|(_, value)| !value.is_empty())
        .collect();
    encode_form(&data)
}

/// Form-decoded `(key, value)` pairs of a raw query.
///
/// Pairs are separated by `&` or `;`. A segment without `=` is skipped.
pub fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .split(['&', ';'])
        .filter(|segment| segment.contains('='))
        .filter_map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
        })
}

/// Split a URL into its path and raw query.
///
/// A leading `scheme://authority` is dropped and so is any fragment. The
/// path is returned verbatim.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(head, _)| head);

    let rest = match url.find("://") {
        Some(idx) if !url[..idx].contains(['/', '?']) => {
            let after_scheme = &url[idx + 3..];
            after_scheme
                .find(['/', '?'])
                .map_or("", |start| &after_scheme[start..])
        }
        _ => url,
    };

    rest.split_once('?').unwrap_or((rest, ""))
}

/// The URL as it is signed: path, `?`, canonical query.
pub fn signable_url(url: &str) -> String {
    let (path, query) = split_url(url);
    format!("{path}?{}", canonical_query(query))
}

/// Remove every occurrence of the query parameter `name`, leaving the other
/// parameters in place and in order.
pub fn strip_query_param(url: &str, name: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            form_urlencoded::parse(pair.as_bytes())
                .next()
                .is_none_or(|(key, _)| key != name)
        })
        .collect();

    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", kept.join("&"))
    }
}

/// Percent-decode a URL without touching `+`.
pub fn unquote(url: &str) -> String {
    percent_decode_str(url).decode_utf8_lossy().into_owned()
}

/// Append `pair` to the URL's query string.
pub fn append_query(url: &mut String, pair: &str) {
    if pair.is_empty() {
        return;
    }
    match url.find('?') {
        None => url.push('?'),
        Some(idx) if idx + 1 == url.len() || url.ends_with('&') => {}
        Some(_) => url.push('&'),
    }
    url.push_str(pair);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_encodes_sorted_by_keys() {
        let payload = HashMap::from([("one", "first one"), ("two", "2"), ("three", "3"), ("four", "4")]);
        assert_eq!(
            encode_form(&payload.into()),
            "four=4&one=first+one&three=3&two=2"
        );
    }

    #[test]
    fn test_encodes_sorted_by_keys_and_values() {
        let mut payload = FormData::from(vec![("one", "1"), ("two", "2"), ("three", "3")]);
        payload.append("four", vec!["8", "4", "0"]);
        assert_eq!(
            encode_form(&payload),
            "four=0&four=4&four=8&one=1&three=3&two=2"
        );
    }

    #[test]
    fn test_encodes_repeated_pairs_as_one_sorted_list() {
        let payload = FormData::from(vec![("one", "1"), ("two", "two"), ("two", "2"), ("two", "dos")]);
        assert_eq!(encode_form(&payload), "one=1&two=2&two=dos&two=two");
    }

    #[test]
    fn test_empty_list_value_is_omitted() {
        let payload = FormData::new()
            .with("a", "1")
            .with("b", Vec::<String>::new())
            .with("c", "asdf");
        assert_eq!(encode_form(&payload), "a=1&c=asdf");
    }

    #[test]
    fn test_encode_form_drops_signature_field() {
        let payload = FormData::from(vec![("__signature", "x"), ("a", "1")]);
        assert_eq!(encode_form(&payload), "a=1");
    }

    #[test]
    fn test_encode_payload_drops_client_id_too() {
        let payload = FormData::from(vec![("__signature", "x"), ("__client_id", "c"), ("a", "1")]);
        assert_eq!(encode_payload(&payload), "a=1");
        assert_eq!(encode_form(&payload), "__client_id=c&a=1");
    }

    #[test]
    fn test_quote_plus_escapes_reserved_bytes() {
        assert_eq!(quote_plus("test@example.com"), "test%40example.com");
        assert_eq!(quote_plus("a~b_c-d.e"), "a%7Eb_c-d.e");
        assert_eq!(quote_plus("100%"), "100%25");
        assert_eq!(quote_plus("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn test_canonical_query_sorts_and_drops_blanks() {
        assert_eq!(
            canonical_query("username=test%2C&__client_id=apps&empty=&__signature=abc%3D"),
            "__client_id=apps&username=test%2C"
        );
        assert_eq!(canonical_query(""), "");
    }

    #[test]
    fn test_canonical_query_accepts_semicolon_separators() {
        assert_eq!(canonical_query("b=2;a=1"), "a=1&b=2");
        assert_eq!(canonical_query("c=3&b=2;a=1;flag&d=x%7Ey"), "a=1&b=2&c=3&d=x%7Ey");
        assert_eq!(
            query_pairs("a=1;b=x+y&c").collect::<Vec<_>>(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x y".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_url_variants() {
        assert_eq!(
            split_url("http://www.example.com/accounts/user/add/"),
            ("/accounts/user/add/", "")
        );
        assert_eq!(split_url("https://host:8443?x=1"), ("", "x=1"));
        assert_eq!(split_url("/my/path/?a=1#frag"), ("/my/path/", "a=1"));
        assert_eq!(split_url("www.myurl.com?a=1"), ("www.myurl.com", "a=1"));
        assert_eq!(
            split_url("/next?redirect=http://other/"),
            ("/next", "redirect=http://other/")
        );
    }

    #[test]
    fn test_signable_url_keeps_client_id_and_drops_signature() {
        assert_eq!(
            signable_url("/my/path/?__client_id=apps-testclient&__signature=abc"),
            "/my/path/?__client_id=apps-testclient"
        );
        assert_eq!(
            signable_url("http://www.example.com/accounts/user/add/"),
            "/accounts/user/add/?"
        );
    }

    #[test]
    fn test_strip_query_param_any_position() {
        assert_eq!(
            strip_query_param("/p/?__signature=abc&a=1&b=2", "__signature"),
            "/p/?a=1&b=2"
        );
        assert_eq!(
            strip_query_param("/p/?a=1&__signature=abc&b=2", "__signature"),
            "/p/?a=1&b=2"
        );
        assert_eq!(strip_query_param("/p/?__signature=abc", "__signature"), "/p/");
        assert_eq!(strip_query_param("/p/", "__signature"), "/p/");
    }

    #[test]
    fn test_unquote_leaves_plus_alone() {
        assert_eq!(unquote("/test/a%20b%20c/?u=a+b"), "/test/a b c/?u=a+b");
    }

    #[test]
    fn test_append_query() {
        let mut url = "http://example.com/my/url".to_string();
        append_query(&mut url, "a=1");
        append_query(&mut url, "b=2");
        append_query(&mut url, "");
        assert_eq!(url, "http://example.com/my/url?a=1&b=2");

        let mut trailing = "/p/?".to_string();
        append_query(&mut trailing, "a=1");
        assert_eq!(trailing, "/p/?a=1");
    }
}
