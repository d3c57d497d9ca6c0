use regex::Regex;
use crate::{Error, Result};

/// Maps a request path to a stream path.
///
/// Accepts `/<prefix>/<path>.flv`, `/<path>.flv`, `/<prefix>/<path>` and
/// `/<path>`; all four name the same stream.
#[derive(Debug, Clone)]
pub struct PathResolver {
    pattern: Regex,
}

impl PathResolver {
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = prefix.trim_matches('/');
        let source = if prefix.is_empty() {
            r"^/(?:(.+)\.flv|(.+))$".to_string()
        } else {
            format!(r"^/(?:{}/)?(?:(.+)\.flv|(.+))$", regex::escape(prefix))
        };
        let pattern = Regex::new(&source)
            .map_err(|e| Error::config(format!("Invalid path prefix '{}': {}", prefix, e)))?;
        Ok(PathResolver { pattern })
    }

    /// Stream path for `target`, or `None` when it names no stream
    pub fn resolve(&self, target: &str) -> Option<String> {
        // Query string is not part of the stream path
        let path = target.split('?').next().unwrap_or_default();
        let captures = self.pattern.captures(path)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_suffix_are_optional() {
        let resolver = PathResolver::new("hdl").unwrap();
        assert_eq!(resolver.resolve("/hdl/live/cam1.flv").as_deref(), Some("live/cam1"));
        assert_eq!(resolver.resolve("/live/cam1.flv").as_deref(), Some("live/cam1"));
        assert_eq!(resolver.resolve("/hdl/live/cam1").as_deref(), Some("live/cam1"));
        assert_eq!(resolver.resolve("/live/cam1").as_deref(), Some("live/cam1"));
    }

    #[test]
    fn test_no_match() {
        let resolver = PathResolver::new("hdl").unwrap();
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("/"), None);
        assert_eq!(resolver.resolve("live/cam1"), None);
        assert_eq!(resolver.resolve("/a\nb"), None);
    }

    #[test]
    fn test_query_ignored() {
        let resolver = PathResolver::new("hdl").unwrap();
        assert_eq!(resolver.resolve("/hdl/cam1.flv?token=x").as_deref(), Some("cam1"));
    }

    #[test]
    fn test_bare_prefix_and_extension() {
        let resolver = PathResolver::new("hdl").unwrap();
        // Nothing after the prefix: the prefix itself is the stream path
        assert_eq!(resolver.resolve("/hdl/").as_deref(), Some("hdl/"));
        assert_eq!(resolver.resolve("/hdl").as_deref(), Some("hdl"));
        assert_eq!(resolver.resolve("/.flv").as_deref(), Some(".flv"));
    }

    #[test]
    fn test_custom_prefix() {
        let resolver = PathResolver::new("live").unwrap();
        assert_eq!(resolver.resolve("/live/a.flv").as_deref(), Some("a"));
        assert_eq!(resolver.resolve("/hdl/a.flv").as_deref(), Some("hdl/a"));
    }
}
