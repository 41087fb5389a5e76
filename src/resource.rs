//! Resource URL validation
//!
//! A resource URL is accepted when it has a network location and that
//! location contains one of the supported hosts. The match is a
//! case-sensitive substring test on the raw network location, so
//! `music.youtube.com` and `www.youtube.com:443` are accepted while
//! `YOUTUBE.COM` is not.

use std::fmt;

/// Hosts a resource URL must mention in its network location.
pub const ALLOWED_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Validated resource URL.
///
/// # Examples
///
/// ```
/// use audiophile_dl::resource::ResourceUrl;
///
/// let url = ResourceUrl::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(url.netloc(), "youtu.be");
/// assert!(ResourceUrl::parse("youtube.com/watch?v=x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl {
    raw: String,
    netloc_range: (usize, usize),
}

impl ResourceUrl {
    /// Validate and wrap a URL. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::Empty`] for blank input, [`UrlError::MissingNetloc`]
    /// when no `//host` component is present and [`UrlError::UnsupportedHost`]
    /// when the host is not one of [`ALLOWED_HOSTS`].
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(UrlError::Empty);
        }

        let (start, end) = netloc_bounds(raw).ok_or(UrlError::MissingNetloc)?;
        let netloc = &raw[start..end];
        if netloc.is_empty() {
            return Err(UrlError::MissingNetloc);
        }

        if !ALLOWED_HOSTS.iter().any(|host| netloc.contains(host)) {
            return Err(UrlError::UnsupportedHost(netloc.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            netloc_range: (start, end),
        })
    }

    /// Full URL as entered (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Network location (`host[:port]`, with userinfo if any).
    pub fn netloc(&self) -> &str {
        &self.raw[self.netloc_range.0..self.netloc_range.1]
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for ResourceUrl {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Byte bounds of the network location, if the URL has one.
///
/// A scheme is recognised only when it is a letter followed by letters,
/// digits, `+`, `-` or `.`. The network location follows `//` and runs to
/// the first `/`, `?` or `#`.
fn netloc_bounds(url: &str) -> Option<(usize, usize)> {
    let after_scheme = match url.find(':') {
        Some(colon) if is_scheme(&url[..colon]) => colon + 1,
        _ => 0,
    };

    let rest = &url[after_scheme..];
    if !rest.starts_with("//") {
        return None;
    }

    let start = after_scheme + 2;
    let len = url[start..]
        .find(['/', '?', '#'])
        .unwrap_or(url.len() - start);
    Some((start, start + len))
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// URL validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    /// Nothing was entered
    #[error("no URL given")]
    Empty,

    /// No `//host` component
    #[error("URL has no network location")]
    MissingNetloc,

    /// Host is not a supported video site
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),
}
