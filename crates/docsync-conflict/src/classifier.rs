//! Conflict classification
//!
//! Decides what happens to a document present on both sides with differing
//! size. The pair of sync states (each side against its own persisted
//! snapshot) selects one of three outcomes:
//!
//! | local \ remote | new          | equal          | modified     |
//! |----------------|--------------|----------------|--------------|
//! | new            | ask          | ask (anomaly)  | ask (anomaly)|
//! | equal          | ask (anomaly)| ask (anomaly)  | download     |
//! | modified       | upload       | ask (anomaly)  | ask          |
//!
//! "Anomaly" marks pairs that the size oracle should make impossible (for
//! example equal/equal while sizes differ). They are logged and still sent
//! through the resolver.

use std::sync::Arc;

use tracing::{debug, warn};

use docsync_core::domain::conflict::{ConflictContext, ConflictSide, Resolution};
use docsync_core::domain::sync_state::SyncState;
use docsync_core::ports::resolver::IConflictResolver;

use crate::error::ConflictError;

/// Outcome of the decision table alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The local side changed and the remote side did not
    Upload,
    /// The remote side changed and the local side did not
    Download,
    /// History does not decide; the resolver must be consulted
    Ask {
        /// The state pair should be impossible under the size oracle
        anomaly: bool,
    },
}

/// Applies the decision table to a (local, remote) state pair
pub fn classify(local: SyncState, remote: SyncState) -> Classification {
    use SyncState::{Equal, Modified, New};
    match (local, remote) {
        (Modified, Equal) => Classification::Upload,
        (Equal, Modified) => Classification::Download,
        (New, New) | (Modified, Modified) => Classification::Ask { anomaly: false },
        (New, Equal) | (New, Modified) | (Equal, New) | (Equal, Equal) | (Modified, New) => {
            Classification::Ask { anomaly: true }
        }
    }
}

/// Action to carry out for a classified conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Overwrite the remote document with the local one
    Upload,
    /// Overwrite the local document with the remote one
    Download,
    /// Leave both sides untouched this run
    Skip,
}

/// Final verdict on a conflicting document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// What to do
    pub action: ConflictAction,
    /// Whether the resolver was consulted
    pub asked: bool,
    /// Whether the state pair was anomalous
    pub anomaly: bool,
}

/// Runs the decision table and escalates ambiguous cases to a resolver
pub struct ConflictClassifier {
    resolver: Arc<dyn IConflictResolver>,
}

impl ConflictClassifier {
    /// Creates a classifier that escalates to `resolver`
    pub fn new(resolver: Arc<dyn IConflictResolver>) -> Self {
        Self { resolver }
    }

    /// Decides the action for a document present on both sides with
    /// differing size
    ///
    /// # Errors
    /// Returns `ConflictError::ResolverFailed` if the resolver fails
    pub async fn decide(
        &self,
        local: ConflictSide,
        remote: ConflictSide,
    ) -> Result<Verdict, ConflictError> {
        let classification = classify(local.state, remote.state);
        debug!(
            local = %local.path,
            remote = %remote.path,
            local_state = %local.state,
            remote_state = %remote.state,
            ?classification,
            "Classified conflict"
        );

        let anomaly = match classification {
            Classification::Upload => {
                return Ok(Verdict {
                    action: ConflictAction::Upload,
                    asked: false,
                    anomaly: false,
                })
            }
            Classification::Download => {
                return Ok(Verdict {
                    action: ConflictAction::Download,
                    asked: false,
                    anomaly: false,
                })
            }
            Classification::Ask { anomaly } => anomaly,
        };

        let context = ConflictContext {
            local,
            remote,
            anomaly,
        };
        if anomaly {
            warn!(
                path = %context.local.path,
                reason = %context.reason(),
                local_size = context.local.size,
                remote_size = context.remote.size,
                "Anomalous sync state pair; asking resolver"
            );
        }

        let resolution = self.resolver.resolve(&context).await?;
        let action = match resolution {
            Resolution::Local => ConflictAction::Upload,
            Resolution::Remote => ConflictAction::Download,
            Resolution::Skip => ConflictAction::Skip,
        };
        debug!(path = %context.local.path, %resolution, "Conflict resolved");

        Ok(Verdict {
            action,
            asked: true,
            anomaly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use docsync_core::domain::newtypes::EntryPath;

    use SyncState::{Equal, Modified, New};

    struct Recording {
        answer: Resolution,
        seen: Mutex<Vec<ConflictContext>>,
    }

    #[async_trait::async_trait]
    impl IConflictResolver for Recording {
        async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution> {
            self.seen.lock().unwrap().push(conflict.clone());
            Ok(self.answer)
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl IConflictResolver for Failing {
        async fn resolve(&self, _conflict: &ConflictContext) -> anyhow::Result<Resolution> {
            anyhow::bail!("no terminal")
        }
    }

    fn side(path: &str, state: SyncState, size: u64) -> ConflictSide {
        ConflictSide {
            path: EntryPath::parse(path).unwrap(),
            state,
            size,
            modified: None,
        }
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(classify(Modified, Equal), Classification::Upload);
        assert_eq!(classify(Equal, Modified), Classification::Download);
        assert_eq!(classify(New, New), Classification::Ask { anomaly: false });
        assert_eq!(classify(Modified, Modified), Classification::Ask { anomaly: false });
        for (l, r) in [
            (New, Equal),
            (New, Modified),
            (Equal, New),
            (Equal, Equal),
            (Modified, New),
        ] {
            assert_eq!(classify(l, r), Classification::Ask { anomaly: true }, "{l}/{r}");
        }
    }

    #[tokio::test]
    async fn test_history_decides_without_resolver() {
        let resolver = Arc::new(Recording {
            answer: Resolution::Skip,
            seen: Mutex::new(Vec::new()),
        });
        let classifier = ConflictClassifier::new(resolver.clone());

        let verdict = classifier
            .decide(side("r/a.pdf", Modified, 150), side("D/a.pdf", Equal, 100))
            .await
            .unwrap();
        assert_eq!(verdict.action, ConflictAction::Upload);
        assert!(!verdict.asked);
        assert!(resolver.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_maps_resolution() {
        for (answer, expected) in [
            (Resolution::Local, ConflictAction::Upload),
            (Resolution::Remote, ConflictAction::Download),
            (Resolution::Skip, ConflictAction::Skip),
        ] {
            let resolver = Arc::new(Recording {
                answer,
                seen: Mutex::new(Vec::new()),
            });
            let classifier = ConflictClassifier::new(resolver.clone());
            let verdict = classifier
                .decide(side("r/a.pdf", Modified, 150), side("D/a.pdf", Modified, 120))
                .await
                .unwrap();
            assert_eq!(verdict.action, expected);
            assert!(verdict.asked);
            assert!(!verdict.anomaly);
        }
    }

    #[tokio::test]
    async fn test_anomaly_is_flagged_to_resolver() {
        let resolver = Arc::new(Recording {
            answer: Resolution::Remote,
            seen: Mutex::new(Vec::new()),
        });
        let classifier = ConflictClassifier::new(resolver.clone());
        let verdict = classifier
            .decide(side("r/a.pdf", Equal, 100), side("D/a.pdf", Equal, 90))
            .await
            .unwrap();
        assert!(verdict.anomaly);
        let seen = resolver.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].anomaly);
        assert_eq!(seen[0].reason(), "L:equal R:equal");
    }

    #[tokio::test]
    async fn test_resolver_failure_propagates() {
        let classifier = ConflictClassifier::new(Arc::new(Failing));
        let result = classifier
            .decide(side("r/a.pdf", New, 1), side("D/a.pdf", New, 2))
            .await;
        assert!(matches!(result, Err(ConflictError::ResolverFailed(_))));
    }
}
