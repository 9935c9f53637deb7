//! Process-lifetime cookie jar for a single target host
//!
//! Cookies are kept as plain name/value pairs in first-seen order. There is
//! no expiry, domain or path tracking; the crawler only ever talks to one
//! host and the jar dies with the process.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    /// Parse the leading `name=value` pair of a `Set-Cookie` directive.
    ///
    /// Attributes after the first `;` are ignored. Returns `None` for
    /// directives without `=` or with an empty name or value.
    pub fn parse(directive: &str) -> Option<Self> {
        let pair = directive.split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct CookieStore {
    cookies: Vec<Cookie>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every well-formed cookie found in the given `Set-Cookie` values.
    /// Returns how many pairs were accepted.
    pub fn observe<'a, I>(&mut self, set_cookie_values: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut accepted = 0;
        for directive in set_cookie_values {
            match Cookie::parse(directive) {
                Some(cookie) => {
                    self.upsert(cookie);
                    accepted += 1;
                }
                None => log::debug!("Ignoring malformed cookie directive: {:?}", directive),
            }
        }
        accepted
    }

    fn upsert(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => existing.value = cookie.value,
            None => self.cookies.push(cookie),
        }
    }

    /// Serialize the jar as a `Cookie` request header value.
    pub fn attach(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_attributes() {
        let cookie = Cookie::parse("cf_clearance=abc123; Path=/; HttpOnly; Secure").unwrap();
        assert_eq!(cookie.name, "cf_clearance");
        assert_eq!(cookie.value, "abc123");
    }

    #[test]
    fn test_parse_splits_on_first_equals_and_trims() {
        let cookie = Cookie::parse("  token = a=b=c ; Max-Age=3600").unwrap();
        assert_eq!(cookie.name, "token");
        assert_eq!(cookie.value, "a=b=c");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Cookie::parse("").is_none());
        assert!(Cookie::parse("no-equals-sign").is_none());
        assert!(Cookie::parse("=value").is_none());
        assert!(Cookie::parse("name=").is_none());
        assert!(Cookie::parse("   ;Path=/").is_none());
    }

    #[test]
    fn test_empty_store_attaches_nothing() {
        let store = CookieStore::new();
        assert!(store.is_empty());
        assert_eq!(store.attach(), None);
    }

    #[test]
    fn test_attach_after_observe_uses_latest_value_once() {
        let mut store = CookieStore::new();
        store.observe(["session=one; Path=/", "__cf_bm=xyz; HttpOnly"]);
        store.observe(["session=two", "garbage", "lang=en"]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("session"), Some("two"));
        assert_eq!(
            store.attach().as_deref(),
            Some("session=two; __cf_bm=xyz; lang=en")
        );
    }

    #[test]
    fn test_observe_counts_accepted_pairs() {
        let mut store = CookieStore::new();
        let accepted = store.observe(["a=1", "broken", "b=2; Secure", "=x"]);
        assert_eq!(accepted, 2);
    }
}
