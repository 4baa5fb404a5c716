use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use locamap_core::{AppContext, Component, WeatherConfig, WeatherError};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::provider::{AemetProvider, ForecastSource};
use crate::types::WeatherSnapshot;

/// Polls a forecast source and publishes the latest snapshot.
///
/// Cheap to clone; clones share the snapshot and the poller.
#[derive(Clone)]
pub struct WeatherWidget {
    inner: Arc<WidgetInner>,
}

struct WidgetInner {
    source: Arc<dyn ForecastSource>,
    /// Zero means fetch once on activation and never again
    period: Duration,
    snapshot: watch::Sender<WeatherSnapshot>,
    poller: Mutex<Option<Poller>>,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    fn stop(self) {
        self.cancel.cancel();
        // The task is detached; it exits at its next select point
        if !self.handle.is_finished() {
            tracing::debug!("Weather poller signalled to stop");
        }
    }
}

impl WidgetInner {
    async fn refresh(&self) -> WeatherSnapshot {
        let next = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Error fetching weather data from AEMET: {}", e);
                WeatherSnapshot::fallback()
            }
        };
        self.snapshot.send_replace(next.clone());
        next
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = (!self.period.is_zero()).then(|| {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        // Immediate first fetch, then one per tick
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = self.refresh() => {}
        }
        let Some(ticker) = ticker.as_mut() else {
            return;
        };
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.refresh() => {}
            }
        }
        tracing::debug!("Weather poller stopped");
    }
}

impl WeatherWidget {
    pub fn new(source: Arc<dyn ForecastSource>, period: Duration) -> Self {
        let (snapshot, _) = watch::channel(WeatherSnapshot::loading());
        Self {
            inner: Arc::new(WidgetInner {
                source,
                period,
                snapshot,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Widget backed by AEMET with the configured interval
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let provider = AemetProvider::new(config)?;
        Ok(Self::new(
            Arc::new(provider),
            Duration::from_secs(config.refresh_seconds),
        ))
    }

    /// Current snapshot
    pub fn snapshot(&self) -> WeatherSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every refresh
    pub fn subscribe(&self) -> watch::Receiver<WeatherSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Fetch once now. Any failure replaces the whole snapshot with the
    /// fallback values.
    pub async fn refresh_now(&self) -> WeatherSnapshot {
        self.inner.refresh().await
    }

    pub fn is_active(&self) -> bool {
        self.inner.poller.lock().is_some()
    }

    /// Start polling: one fetch immediately, then one per period.
    ///
    /// Returns false when already active or when called outside a runtime.
    pub fn activate(&self) -> bool {
        let mut poller = self.inner.poller.lock();
        if poller.is_some() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("Weather widget needs a Tokio runtime; not polling");
                return false;
            }
        };

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(self.inner.clone().run(cancel.clone()));
        *poller = Some(Poller { cancel, handle });

        tracing::info!(
            "Weather polling every {}s",
            self.inner.period.as_secs()
        );
        true
    }

    /// Stop polling. An in-flight fetch is dropped.
    pub fn deactivate(&self) {
        if let Some(poller) = self.inner.poller.lock().take() {
            poller.stop();
            tracing::info!("Weather polling cancelled");
        }
    }
}

impl Component for WeatherWidget {
    fn id(&self) -> &str {
        "weather"
    }

    fn name(&self) -> &str {
        "Weather Widget"
    }

    fn initialize(&mut self, _ctx: &AppContext) -> Result<()> {
        self.activate();
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.deactivate();
        Ok(())
    }
}
