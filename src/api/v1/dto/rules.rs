// Field checks shared by several request DTOs.
use url::Url;

pub fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let n = value.chars().count();
    (min..=max).contains(&n)
}

/// Shape check only: `local@domain.tld`, no whitespace, at most 254 bytes.
pub fn is_email(value: &str) -> bool {
    if value.len() > 254 || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
        && !domain.ends_with('.')
}

/// Empty (clear the field) or an absolute http(s) URL.
pub fn is_empty_or_http_url(value: &str) -> bool {
    value.is_empty()
        || Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
