mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

pub use server::{configure, health_handler, metrics_handler, ServiceName};

// ============================================================================
// Metrics Module - Prometheus metrics for notification publishing
// ============================================================================
//
// Publish failures never reach the business caller, so this registry is
// where they become visible:
// - delivered events per microservice / entity / action
// - dropped events with the failure reason
// - publish latency
// - broker breaker state
//
// Scraped via GET /metrics on each service.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub notifications_published: IntCounterVec,
    pub notifications_dropped: IntCounterVec,
    pub publish_duration: HistogramVec,
    pub breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let notifications_published = IntCounterVec::new(
            Opts::new("notifications_published_total", "Notification events delivered to the broker"),
            &["microservice", "entity_type", "action"],
        )?;
        registry.register(Box::new(notifications_published.clone()))?;

        let notifications_dropped = IntCounterVec::new(
            Opts::new("notifications_dropped_total", "Notification events dropped after a failed publish"),
            &["microservice", "entity_type", "action", "reason"],
        )?;
        registry.register(Box::new(notifications_dropped.clone()))?;

        let publish_duration = HistogramVec::new(
            HistogramOpts::new("notification_publish_duration_seconds", "Time spent publishing one event")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["microservice"],
        )?;
        registry.register(Box::new(publish_duration.clone()))?;

        let breaker_state = IntGauge::new(
            "notifications_breaker_state",
            "Broker breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(breaker_state.clone()))?;

        Ok(Self {
            registry,
            notifications_published,
            notifications_dropped,
            publish_duration,
            breaker_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_published(&self, microservice: &str, entity_type: &str, action: &str, duration_secs: f64) {
        self.notifications_published
            .with_label_values(&[microservice, entity_type, action])
            .inc();
        self.publish_duration
            .with_label_values(&[microservice])
            .observe(duration_secs);
    }

    pub fn record_dropped(
        &self,
        microservice: &str,
        entity_type: &str,
        action: &str,
        reason: &str,
        duration_secs: f64,
    ) {
        self.notifications_dropped
            .with_label_values(&[microservice, entity_type, action, reason])
            .inc();
        self.publish_duration
            .with_label_values(&[microservice])
            .observe(duration_secs);
    }

    pub fn update_breaker_state(&self, state: i64) {
        self.breaker_state.set(state);
    }

    pub fn published_count(&self, microservice: &str, entity_type: &str, action: &str) -> u64 {
        self.notifications_published
            .with_label_values(&[microservice, entity_type, action])
            .get()
    }

    pub fn dropped_count(&self, microservice: &str, entity_type: &str, action: &str, reason: &str) -> u64 {
        self.notifications_dropped
            .with_label_values(&[microservice, entity_type, action, reason])
            .get()
    }
}
