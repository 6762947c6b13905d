//! Navigation policy for the rendering surface.

use url::Url;

use crate::config::HostConfig;

/// What to do with a navigation the surface is about to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the surface load it.
    Allow,
    /// Cancel it and hand the URL to the host's handler.
    Intercept(String),
}

/// Decides which navigations stay inside the surface.
#[derive(Debug, Clone, Default)]
pub struct NavigationPolicy {
    intercepted_hosts: Vec<String>,
}

impl NavigationPolicy {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            intercepted_hosts: hosts
                .into_iter()
                .map(|h| {
                    let h: String = h.into();
                    h.trim().trim_start_matches('.').to_ascii_lowercase()
                })
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.intercepted_hosts.iter().map(String::as_str))
    }

    /// Whether a URL points at an intercepted host or one of its subdomains.
    pub fn is_intercepted(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.intercepted_hosts.iter().any(|intercepted| {
            host == *intercepted
                || host
                    .strip_suffix(intercepted.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Decide on an in-frame navigation. Unparsable URLs are left to the surface.
    pub fn decide(&self, url: &str) -> NavigationDecision {
        match Url::parse(url) {
            Ok(parsed) if self.is_intercepted(&parsed) => {
                NavigationDecision::Intercept(url.to_string())
            }
            _ => NavigationDecision::Allow,
        }
    }

    /// Decide on a request to open a new window. These never load in the surface.
    pub fn decide_new_window(&self, url: &str) -> NavigationDecision {
        NavigationDecision::Intercept(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NavigationPolicy {
        NavigationPolicy::from_config(&HostConfig::default())
    }

    #[test]
    fn test_intercepts_default_hosts() {
        let policy = policy();
        for url in [
            "https://t.me/durov",
            "http://telegram.me/joinchat/abc",
            "https://telegram.dog/bot",
            "https://telegra.ph/Some-Article-01-01",
            "https://T.ME/upper",
        ] {
            assert_eq!(
                policy.decide(url),
                NavigationDecision::Intercept(url.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn test_intercepts_subdomains() {
        assert!(matches!(
            policy().decide("https://channel.t.me/post"),
            NavigationDecision::Intercept(_)
        ));
    }

    #[test]
    fn test_allows_lookalike_hosts() {
        let policy = policy();
        for url in [
            "https://shop.example/app",
            "https://bot.me/x",
            "https://notelegra.ph/x",
            "https://t.me.example.com/",
            "about:blank",
            "not a url",
        ] {
            assert_eq!(policy.decide(url), NavigationDecision::Allow, "{url}");
        }
    }

    #[test]
    fn test_new_window_always_intercepted() {
        assert_eq!(
            policy().decide_new_window("https://shop.example/terms"),
            NavigationDecision::Intercept("https://shop.example/terms".to_string())
        );
    }

    #[test]
    fn test_custom_hosts_normalized() {
        let policy = NavigationPolicy::new([" .Example.ORG ", ""]);
        assert!(matches!(
            policy.decide("https://docs.example.org/"),
            NavigationDecision::Intercept(_)
        ));
        assert_eq!(policy.decide("https://t.me/x"), NavigationDecision::Allow);
    }
}
