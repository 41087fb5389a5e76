//! Resource URL validation against the supported host list

use audiophile_dl::resource::{ResourceUrl, UrlError, ALLOWED_HOSTS};

#[test]
fn accepts_every_supported_host() {
    for host in ALLOWED_HOSTS {
        let url = format!("https://{host}/watch?v=abc");
        let parsed = ResourceUrl::parse(&url).unwrap();
        assert_eq!(parsed.netloc(), host);
    }
}

#[test]
fn accepts_common_url_shapes() {
    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1",
        "http://m.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ?t=42",
        "https://www.youtube.com/playlist?list=PLx",
        "  https://youtu.be/dQw4w9WgXcQ  ",
        "//youtube.com/watch?v=x",
    ] {
        assert!(ResourceUrl::parse(url).is_ok(), "{url} should be accepted");
    }
}

#[test]
fn substring_match_on_netloc() {
    // substring semantics: subdomains and ports pass
    assert!(ResourceUrl::parse("https://music.youtube.com/watch?v=x").is_ok());
    assert!(ResourceUrl::parse("https://www.youtube.com:443/watch?v=x").is_ok());
    // case-sensitive
    assert!(matches!(
        ResourceUrl::parse("https://WWW.YOUTUBE.COM/watch?v=x"),
        Err(UrlError::UnsupportedHost(_))
    ));
}

#[test]
fn rejects_missing_network_location() {
    for url in ["youtube.com/watch?v=x", "www.youtube.com", "mailto:youtube.com", "https:///watch"] {
        assert_eq!(ResourceUrl::parse(url), Err(UrlError::MissingNetloc), "{url}");
    }
    assert_eq!(ResourceUrl::parse("   "), Err(UrlError::Empty));
}

#[test]
fn rejects_other_hosts() {
    for url in ["https://vimeo.com/1", "https://example.com/youtube.com", "ftp://example.org/x"] {
        assert!(matches!(ResourceUrl::parse(url), Err(UrlError::UnsupportedHost(_))), "{url}");
    }
}
