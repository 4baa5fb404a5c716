//! One-shot loading of the external maps/places script.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::OnceCell;
use url::Url;

/// Failure to load the script resource. Logged by the loader, never returned.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Script request failed: {0}")]
    Request(String),
    #[error("Script returned status {0}")]
    Status(u16),
}

/// Environment that can inject a script resource and report whether the
/// capability it provides is present.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Inject the resource and wait for its load or error signal.
    async fn inject(&self, url: &Url) -> Result<(), ScriptError>;

    /// Whether the places capability is usable right now.
    fn places_available(&self) -> bool;
}

/// Script host that fetches the resource over HTTP.
///
/// The places capability counts as present once a fetch returned a
/// successful, non-empty body.
pub struct HttpScriptHost {
    client: Client,
    available: AtomicBool,
}

impl HttpScriptHost {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            available: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ScriptHost for HttpScriptHost {
    async fn inject(&self, url: &Url) -> Result<(), ScriptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScriptError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScriptError::Request(e.without_url().to_string()))?;
        if body.is_empty() {
            return Err(ScriptError::Request("empty script body".to_string()));
        }

        self.available.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn places_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Loads the script at most once for the loader's lifetime.
///
/// Every caller, including ones that arrive while the first load is still
/// pending, waits on the same load. The load always completes normally, even
/// when the resource failed: callers must check `places_available()` before
/// relying on the capability. There is no timeout, so a resource that never
/// signals keeps every caller waiting.
pub struct ScriptLoader {
    host: Arc<dyn ScriptHost>,
    loaded: OnceCell<()>,
}

impl ScriptLoader {
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        Self {
            host,
            loaded: OnceCell::new(),
        }
    }

    pub async fn load(&self, url: &Url) {
        self.loaded
            .get_or_init(|| async {
                if self.host.places_available() {
                    tracing::debug!("Places capability already present, skipping injection");
                    return;
                }

                // The query string carries the API key
                let target = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
                tracing::info!("Loading maps script from {}", target);
                match self.host.inject(url).await {
                    Ok(()) => tracing::info!("Maps script loaded"),
                    Err(e) => tracing::warn!("Maps script failed to load: {}", e),
                }
            })
            .await;
    }

    /// Whether a load has completed (successfully or not)
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub fn places_available(&self) -> bool {
        self.host.places_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingHost {
        injections: AtomicUsize,
        succeed: bool,
        present: AtomicBool,
    }

    impl CountingHost {
        fn new(succeed: bool) -> Self {
            Self {
                injections: AtomicUsize::new(0),
                succeed,
                present: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ScriptHost for CountingHost {
        async fn inject(&self, _url: &Url) -> Result<(), ScriptError> {
            self.injections.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.succeed {
                self.present.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                Err(ScriptError::Status(403))
            }
        }

        fn places_available(&self) -> bool {
            self.present.load(Ordering::SeqCst)
        }
    }

    fn script_url() -> Url {
        Url::parse("https://maps.example.com/api/js?key=k&libraries=places").unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_loads_inject_once() {
        let host = Arc::new(CountingHost::new(true));
        let loader = ScriptLoader::new(host.clone());
        let url = script_url();

        tokio::join!(loader.load(&url), loader.load(&url));
        loader.load(&url).await;

        assert_eq!(host.injections.load(Ordering::SeqCst), 1);
        assert!(loader.is_loaded());
        assert!(loader.places_available());
    }

    #[tokio::test]
    async fn test_failed_load_still_resolves() {
        let host = Arc::new(CountingHost::new(false));
        let loader = ScriptLoader::new(host.clone());

        loader.load(&script_url()).await;
        loader.load(&script_url()).await;

        assert!(loader.is_loaded());
        assert!(!loader.places_available());
        // No retry after a failure
        assert_eq!(host.injections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_present_capability_skips_injection() {
        let host = Arc::new(CountingHost::new(true));
        host.present.store(true, Ordering::SeqCst);
        let loader = ScriptLoader::new(host.clone());

        loader.load(&script_url()).await;

        assert_eq!(host.injections.load(Ordering::SeqCst), 0);
        assert!(loader.places_available());
    }
}
