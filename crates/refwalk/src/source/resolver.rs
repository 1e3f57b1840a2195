//! Document resolvers

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::Resolver;
use crate::error::ResolveError;

// ═══════════════════════════════════════════════════════════════════════
// In-memory documents
// ═══════════════════════════════════════════════════════════════════════

/// Serves documents registered in memory and counts fetches per URI.
///
/// # Example
///
/// ```
/// use refwalk::{MemoryResolver, Resolver};
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = MemoryResolver::new().with_document("other.json", r#"{"y": 1}"#);
/// assert_eq!(resolver.resolve("other.json").await.unwrap(), r#"{"y": 1}"#);
/// assert_eq!(resolver.fetch_count("other.json"), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryResolver {
    documents: DashMap<String, String>,
    fetches: DashMap<String, usize>,
}

impl MemoryResolver {
    /// Create a resolver with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document (builder pattern)
    pub fn with_document(self, uri: impl Into<String>, raw: impl Into<String>) -> Self {
        self.insert(uri, raw);
        self
    }

    /// Register or replace a document.
    pub fn insert(&self, uri: impl Into<String>, raw: impl Into<String>) {
        self.documents.insert(uri.into(), raw.into());
    }

    /// How many times `uri` was requested.
    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetches.get(uri).map(|count| *count).unwrap_or(0)
    }

    /// Requests across all URIs.
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl Resolver for MemoryResolver {
    async fn resolve(&self, uri: &str) -> Result<String, ResolveError> {
        *self.fetches.entry(uri.to_string()).or_insert(0) += 1;
        self.documents
            .get(uri)
            .map(|raw| raw.value().clone())
            .ok_or_else(|| ResolveError::NotFound {
                uri: uri.to_string(),
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Filesystem
// ═══════════════════════════════════════════════════════════════════════

/// Reads `file://` URIs and plain paths from disk.
///
/// Relative paths are taken from `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
    base_dir: Option<PathBuf>,
}

impl FileResolver {
    /// Resolve relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn path_for(&self, uri: &str) -> Result<PathBuf, ResolveError> {
        let path = if uri.starts_with("file:") {
            url::Url::parse(uri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| ResolveError::Unreachable {
                    uri: uri.to_string(),
                    message: "not a valid file URI".to_string(),
                })?
        } else {
            PathBuf::from(uri)
        };
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }
}

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(&self, uri: &str) -> Result<String, ResolveError> {
        let path = self.path_for(uri)?;
        tracing::trace!(uri, path = %path.display(), "reading document from disk");
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolveError::NotFound {
                uri: uri.to_string(),
            },
            _ => ResolveError::Unreachable {
                uri: uri.to_string(),
                message: e.to_string(),
            },
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════

/// Fetches `http://` and `https://` documents.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpResolver {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpResolver {
    /// Create a resolver with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, uri: &str) -> Result<String, ResolveError> {
        let unreachable = |e: reqwest::Error| ResolveError::Unreachable {
            uri: uri.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(uri).send().await.map_err(unreachable)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound {
                uri: uri.to_string(),
            });
        }
        let response = response.error_for_status().map_err(unreachable)?;
        response.text().await.map_err(unreachable)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Routing
// ═══════════════════════════════════════════════════════════════════════

/// Routes each URI to a resolver registered for its scheme.
///
/// URIs without a scheme (plain paths) go to the fallback resolver.
#[derive(Clone, Default)]
pub struct SchemeResolver {
    routes: Vec<(String, Arc<dyn Resolver>)>,
    fallback: Option<Arc<dyn Resolver>>,
}

impl SchemeResolver {
    /// Create a router with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `scheme` (e.g. `"https"`) to `resolver`.
    pub fn with_scheme(mut self, scheme: impl Into<String>, resolver: Arc<dyn Resolver>) -> Self {
        self.routes.push((scheme.into(), resolver));
        self
    }

    /// Handle URIs that have no scheme.
    pub fn with_fallback(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.fallback = Some(resolver);
        self
    }

    /// Disk for `file:` URIs and plain paths, plus `http`/`https` when the
    /// `http` feature is enabled.
    pub fn with_defaults() -> Self {
        let file: Arc<dyn Resolver> = Arc::new(FileResolver::new());
        let router = Self::new()
            .with_scheme("file", file.clone())
            .with_fallback(file);
        #[cfg(feature = "http")]
        let router = {
            let http: Arc<dyn Resolver> = Arc::new(HttpResolver::new());
            router
                .with_scheme("http", http.clone())
                .with_scheme("https", http)
        };
        router
    }

    fn route(&self, uri: &str) -> Option<&Arc<dyn Resolver>> {
        match url::Url::parse(uri) {
            Ok(url) => self
                .routes
                .iter()
                .find(|(scheme, _)| scheme == url.scheme())
                .map(|(_, resolver)| resolver),
            Err(_) => self.fallback.as_ref(),
        }
    }
}

impl std::fmt::Debug for SchemeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schemes: Vec<&str> = self.routes.iter().map(|(s, _)| s.as_str()).collect();
        write!(
            f,
            "SchemeResolver {{ schemes: {:?}, fallback: {} }}",
            schemes,
            self.fallback.is_some()
        )
    }
}

#[async_trait]
impl Resolver for SchemeResolver {
    async fn resolve(&self, uri: &str) -> Result<String, ResolveError> {
        match self.route(uri) {
            Some(resolver) => resolver.resolve(uri).await,
            None => Err(ResolveError::UnsupportedScheme {
                uri: uri.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_resolver_counts_fetches() {
        let resolver = MemoryResolver::new().with_document("a.json", "{}");
        resolver.resolve("a.json").await.unwrap();
        resolver.resolve("a.json").await.unwrap();
        let _ = resolver.resolve("missing.json").await;

        assert_eq!(resolver.fetch_count("a.json"), 2);
        assert_eq!(resolver.fetch_count("missing.json"), 1);
        assert_eq!(resolver.total_fetches(), 3);
    }

    #[tokio::test]
    async fn test_memory_resolver_not_found() {
        let resolver = MemoryResolver::new();
        assert_eq!(
            resolver.resolve("nope.json").await,
            Err(ResolveError::NotFound {
                uri: "nope.json".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_file_resolver_reads_relative_to_base() {
        let dir = std::env::temp_dir().join(format!("refwalk-file-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("doc.json"), "{\"a\": 1}").await.unwrap();

        let resolver = FileResolver::with_base_dir(dir.clone());
        assert_eq!(resolver.resolve("doc.json").await.unwrap(), "{\"a\": 1}");
        assert!(matches!(
            resolver.resolve("missing.json").await,
            Err(ResolveError::NotFound { .. })
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_scheme_resolver_routes() {
        let remote = Arc::new(MemoryResolver::new().with_document("https://x.io/a.json", "remote"));
        let local = Arc::new(MemoryResolver::new().with_document("a.json", "local"));
        let router = SchemeResolver::new()
            .with_scheme("https", remote.clone())
            .with_fallback(local.clone());

        assert_eq!(router.resolve("https://x.io/a.json").await.unwrap(), "remote");
        assert_eq!(router.resolve("a.json").await.unwrap(), "local");
        assert_eq!(
            router.resolve("ftp://x.io/a.json").await,
            Err(ResolveError::UnsupportedScheme {
                uri: "ftp://x.io/a.json".to_string()
            })
        );
    }
}
