/// Which browser origins may call the API cross-origin.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    wildcard_domain: String,
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// `wildcard_domain` is a static-hosting domain such as `pages.dev`; any
    /// `https` subdomain of it is accepted. `allowed` is matched exactly.
    pub fn new(wildcard_domain: impl Into<String>, allowed: Vec<String>) -> Self {
        let wildcard_domain = wildcard_domain.into();
        Self {
            wildcard_domain: wildcard_domain.trim_start_matches('.').to_ascii_lowercase(),
            allowed: allowed
                .into_iter()
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        is_localhost(origin) || self.is_wildcard_subdomain(origin) || self.is_listed(origin)
    }

    fn is_wildcard_subdomain(&self, origin: &str) -> bool {
        if self.wildcard_domain.is_empty() {
            return false;
        }
        let Some(host) = origin.strip_prefix("https://") else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let Some(subdomain) = host.strip_suffix(&self.wildcard_domain) else {
            return false;
        };
        let Some(subdomain) = subdomain.strip_suffix('.') else {
            return false;
        };
        !subdomain.is_empty()
            && subdomain
                .split('.')
                .all(|label| !label.is_empty() && label.chars().all(is_host_char))
    }

    fn is_listed(&self, origin: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == origin)
    }
}

fn is_localhost(origin: &str) -> bool {
    let Some(rest) = origin.strip_prefix("http://localhost") else {
        return false;
    };
    match rest.strip_prefix(':') {
        Some(port) => !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()),
        None => rest.is_empty(),
    }
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}
