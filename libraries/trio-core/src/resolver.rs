//! Stream resolution across several bridge instances
//!
//! Public stream bridges come and go. `FailoverResolver` asks each configured
//! instance in turn and returns the first URL any of them produces.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, TrioError};
use crate::traits::StreamResolver;
use crate::types::Track;

/// Resolver that tries a list of resolvers in order
///
/// An instance that fails with an error is skipped. An instance that answers
/// `None` is also skipped, since another instance may index different
/// content. The result is `None` only when no instance produced a URL and
/// at least one of them answered; if every instance failed, the last error
/// is returned.
pub struct FailoverResolver {
    instances: Vec<Arc<dyn StreamResolver>>,
}

impl FailoverResolver {
    /// Create a resolver over the given instances, in priority order
    pub fn new(instances: Vec<Arc<dyn StreamResolver>>) -> Self {
        Self { instances }
    }

    /// Number of configured instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is configured
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl StreamResolver for FailoverResolver {
    async fn resolve(&self, track: &Track) -> Result<Option<String>> {
        if self.instances.is_empty() {
            return Err(TrioError::resolver("no resolver instances configured"));
        }

        let mut last_error = None;
        let mut answered = false;

        for (position, instance) in self.instances.iter().enumerate() {
            match instance.resolve(track).await {
                Ok(Some(url)) if !url.trim().is_empty() => {
                    debug!(track = %track.id, instance = position, "Stream resolved");
                    return Ok(Some(url));
                }
                Ok(_) => answered = true,
                Err(e) => {
                    warn!(track = %track.id, instance = position, error = %e, "Resolver instance failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Scripted {
        answer: Option<&'static str>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answer: Option<&'static str>, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl StreamResolver for Scripted {
        async fn resolve(&self, _track: &Track) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TrioError::resolver("instance down"));
            }
            Ok(self.answer.map(str::to_string))
        }
    }

    fn catalog_track() -> Track {
        Track::new(
            "T",
            "A",
            "B",
            Duration::ZERO,
            TrackSource::Catalog {
                catalog_id: "c1".into(),
                stream_url: None,
            },
        )
    }

    #[tokio::test]
    async fn skips_failing_instances() {
        let down = Scripted::new(None, true);
        let up = Scripted::new(Some("https://b/stream"), false);
        let resolver = FailoverResolver::new(vec![down.clone() as Arc<dyn StreamResolver>, up]);

        let url = resolver.resolve(&catalog_track()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://b/stream"));
        assert_eq!(down.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_at_first_match() {
        let first = Scripted::new(Some("https://a/stream"), false);
        let second = Scripted::new(Some("https://b/stream"), false);
        let resolver =
            FailoverResolver::new(vec![first as Arc<dyn StreamResolver>, second.clone()]);

        let url = resolver.resolve(&catalog_track()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://a/stream"));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn none_when_no_instance_matches() {
        let resolver = FailoverResolver::new(vec![
            Scripted::new(None, true) as Arc<dyn StreamResolver>,
            Scripted::new(None, false),
        ]);
        assert_eq!(resolver.resolve(&catalog_track()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn error_when_every_instance_fails() {
        let resolver =
            FailoverResolver::new(vec![Scripted::new(None, true) as Arc<dyn StreamResolver>]);
        assert!(resolver.resolve(&catalog_track()).await.is_err());

        let empty = FailoverResolver::new(Vec::new());
        assert!(empty.resolve(&catalog_track()).await.is_err());
    }
}
