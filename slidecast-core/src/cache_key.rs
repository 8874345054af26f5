//! Canonical URL identity.
//!
//! URLs are normalized by stripping tracking query parameters, then hashed
//! with a 32-bit rolling hash (`h = h * 31 + unit` over UTF-16 code units,
//! wrapped after every step) rendered in base 36. The result matches keys
//! produced by other clients of the same content API.

use slidecast_model::QueryKey;
use url::Url;

/// Query parameters that never change the addressed resource.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "ref", "referrer"];
const TRACKING_PREFIX: &str = "utm_";

pub fn is_tracking_param(name: &str) -> bool {
    name.starts_with(TRACKING_PREFIX) || TRACKING_PARAMS.contains(&name)
}

/// Parse `raw` as an absolute URL and strip tracking parameters.
///
/// Remaining parameters are re-serialized in form-urlencoded form and an
/// empty query is dropped, so the output is a fixed point.
pub fn try_normalize(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !is_tracking_param(name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(url.into())
}

/// Normalized form of `raw`, or `raw` unchanged when it does not parse.
pub fn normalize(raw: &str) -> String {
    try_normalize(raw).unwrap_or_else(|_| raw.to_string())
}

/// Stable short key for a URL.
pub fn cache_key(raw: &str) -> String {
    hash_to_key(rolling_hash(&normalize(raw)))
}

/// Whether two URLs address the same resource once tracking parameters are
/// ignored. Falls back to plain string equality for unparseable input.
pub fn same_resource(a: &str, b: &str) -> bool {
    match (try_normalize(a), try_normalize(b)) {
        (Ok(a_norm), Ok(b_norm)) => a_norm == b_norm,
        _ => a == b,
    }
}

/// Key for a structured response cache entry.
pub fn query_cache_key(key: &QueryKey) -> String {
    hash_to_key(rolling_hash(&key.render()))
}

/// `h = h * 31 + unit` with 32-bit signed wraparound after every step.
pub fn rolling_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

fn hash_to_key(hash: i32) -> String {
    // i32::MIN has no positive i32 counterpart; widen first.
    to_base36(i64::from(hash).unsigned_abs())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_model::ResourceKind;

    #[test]
    fn tracking_params_do_not_change_the_key() {
        assert_eq!(
            cache_key("https://x.com/p?utm_source=y"),
            cache_key("https://x.com/p")
        );
        assert_eq!(
            cache_key("https://x.com/p?fbclid=1&id=7&gclid=2"),
            cache_key("https://x.com/p?id=7&ref=home")
        );
    }

    #[test]
    fn normalize_strips_exactly_tracking_params() {
        assert_eq!(
            normalize(
                "https://cdn.example/img.jpg?utm_medium=social&w=300&referrer=feed&refresh=1"
            ),
            "https://cdn.example/img.jpg?w=300&refresh=1"
        );
        assert_eq!(normalize("https://x.com/p?"), "https://x.com/p");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "https://x.com/p?utm_source=y",
            "https://x.com/a b?q=hello world&utm_x=1",
            "HTTPS://X.COM:443/Path?b=2&a=1#frag",
            "not a url",
            "https://x.com/p?tag=%E2%9C%93",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input}");
        }
    }

    #[test]
    fn malformed_urls_pass_through() {
        assert_eq!(normalize("/relative/path.png"), "/relative/path.png");
        assert_eq!(normalize(""), "");
        assert!(try_normalize("::::").is_err());
        assert_eq!(cache_key("not a url"), hash_to_key(rolling_hash("not a url")));
    }

    #[test]
    fn rolling_hash_wraps_at_32_bits() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        assert_eq!(rolling_hash("hello"), 99_162_322);
        assert_eq!(rolling_hash("polygenelubricants"), i32::MIN);
        assert_eq!(rolling_hash("https://x.com/p"), -250_397_507);
    }

    #[test]
    fn keys_render_absolute_value_in_base36() {
        assert_eq!(hash_to_key(0), "0");
        assert_eq!(hash_to_key(97), "2p");
        assert_eq!(hash_to_key(i32::MIN), "zik0zk");
        assert_eq!(cache_key("https://x.com/p"), "452vyb");
        // Astral characters hash as two UTF-16 code units.
        assert_eq!(hash_to_key(rolling_hash("héllo😀")), "4tl8kx");
    }

    #[test]
    fn cache_key_is_stable_across_calls() {
        let url = "https://cdn.example/v.mp4?utm_campaign=z";
        let first = cache_key(url);
        for _ in 0..3 {
            assert_eq!(cache_key(url), first);
        }
    }

    #[test]
    fn same_resource_compares_normalized_forms() {
        assert!(same_resource(
            "https://x.com/p?utm_source=a",
            "https://x.com/p?fbclid=b"
        ));
        assert!(!same_resource("https://x.com/p", "https://x.com/q"));
        assert!(same_resource("garbage", "garbage"));
        assert!(!same_resource("garbage", "https://x.com/p"));
    }

    #[test]
    fn query_keys_hash_their_rendered_form() {
        let key = QueryKey::new("api", ResourceKind::Posts).with_param("page", 1);
        assert_eq!(
            query_cache_key(&key),
            hash_to_key(rolling_hash("api:posts:page=1"))
        );
    }
}
