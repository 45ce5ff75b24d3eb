//! Service metrics
//!
//! Counters and histograms emitted through the `metrics` facade. Nothing is
//! exported unless the binary is built with the `prometheus` feature.
//!
//! # Metrics
//!
//! - `story_requests_total`: Counter of generation requests that passed validation
//! - `stories_generated_total`: Counter of saved stories by origin (`model`, `fallback`)
//! - `story_generation_seconds`: Histogram of generation duration by origin
//! - `story_generation_active`: Gauge of in-flight generations
//! - `quota_denied_total`: Counter of quota denials by plan
//! - `storage_fallback_total`: Counter of remote store failures served from memory
//! - `subscription_changes_total`: Counter of simulated plan changes by target plan

use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Metrics for a single story generation request
///
/// Lives for the duration of one request. Exactly one of
/// [`record_story`](Self::record_story) or [`record_denied`](Self::record_denied)
/// takes effect; the in-flight gauge is released on drop either way.
#[derive(Debug)]
pub struct GenerationMetrics {
    start: Instant,
    recorded: AtomicBool,
}

impl GenerationMetrics {
    /// Start tracking a generation request
    ///
    /// # Examples
    ///
    /// ```
    /// use storymagic::metrics::GenerationMetrics;
    ///
    /// let metrics = GenerationMetrics::start();
    /// metrics.record_story("fallback");
    /// ```
    pub fn start() -> Self {
        increment_counter!("story_requests_total");
        increment_gauge!("story_generation_active", 1.0);

        Self {
            start: Instant::now(),
            recorded: AtomicBool::new(false),
        }
    }

    /// Record a saved story and how its text was produced
    pub fn record_story(&self, origin: &str) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }

        histogram!(
            "story_generation_seconds",
            self.start.elapsed().as_secs_f64(),
            "origin" => origin.to_string()
        );
        increment_counter!("stories_generated_total", "origin" => origin.to_string());
        decrement_gauge!("story_generation_active", 1.0);
    }

    /// Record a request refused by the plan quota
    pub fn record_denied(&self, plan: &str) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }

        increment_counter!("quota_denied_total", "plan" => plan.to_string());
        decrement_gauge!("story_generation_active", 1.0);
    }

    /// Time since the request started
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for GenerationMetrics {
    fn drop(&mut self) {
        if !self.recorded.load(Ordering::SeqCst) {
            decrement_gauge!("story_generation_active", 1.0);
        }
    }
}

/// Count a remote store operation that was served from memory
pub fn record_storage_fallback(operation: &str) {
    increment_counter!("storage_fallback_total", "operation" => operation.to_string());
}

/// Count a simulated subscription change
pub fn record_subscription_change(plan: &str) {
    increment_counter!("subscription_changes_total", "plan" => plan.to_string());
}

/// Install the Prometheus exporter on `0.0.0.0:{port}`
///
/// A no-op unless built with the `prometheus` feature.
pub fn init_metrics_exporter(port: u16) {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => tracing::info!("Prometheus exporter listening on {}", addr),
            Err(e) => tracing::warn!("Failed to install Prometheus exporter: {}", e),
        }
    }
    #[cfg(not(feature = "prometheus"))]
    {
        tracing::debug!("Metrics exporter disabled; port {} unused", port);
    }
}
