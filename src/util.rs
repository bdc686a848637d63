/// Lowercase a name into a URL/file-safe slug: runs of anything that is not
/// alphanumeric become single dashes, with no leading or trailing dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Join a relative href against `origin` (`scheme://host`), preserving the
/// scheme delimiter. Hrefs that already carry `http` pass through verbatim.
/// Slash runs are collapsed in the host+path part only, so the result always
/// contains exactly one `://`.
pub fn absolutize(origin: &str, href: &str) -> String {
    if href.contains("http") {
        return href.to_string();
    }

    let (scheme, host) = match origin.split_once("://") {
        Some(parts) => parts,
        None => ("", origin),
    };

    let joined = format!("{}/{}", host, href);
    let mut path = String::with_capacity(joined.len());
    let mut last_slash = false;
    for c in joined.chars() {
        if c == '/' {
            if !last_slash {
                path.push(c);
            }
            last_slash = true;
        } else {
            last_slash = false;
            path.push(c);
        }
    }

    if scheme.is_empty() {
        path
    } else {
        format!("{}://{}", scheme, path)
    }
}

/// Derive `scheme://host` from a page URL, for absolutizing relative hrefs.
/// The host keeps its port when one is present.
pub fn domain_origin(page_url: &str) -> String {
    match url::Url::parse(page_url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            }
        }
        Err(_) => String::new(),
    }
}
