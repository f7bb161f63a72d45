//! Grammar checking
//!
//! `GrammarChecker` wraps exactly one provider chosen once at startup: the
//! local LanguageTool engine when it can be launched, otherwise the remote
//! LanguageTool service. The choice is fixed for the life of the process.
//! If neither initializes the checker runs degraded and every non-empty check
//! fails with `GrammarError::Unavailable`.

pub mod languagetool;
pub mod local;
pub mod remote;

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::GrammarConfig;
use crate::models::GrammarIssue;
use languagetool::LtMatch;
use local::LocalLanguageTool;
use remote::RemoteLanguageTool;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar service unavailable: {0}")]
    Unavailable(String),

    #[error("grammar check timed out after {0:?}")]
    Timeout(Duration),

    #[error("grammar service rate limit exceeded")]
    RateLimited,

    #[error("grammar service error: {0}")]
    Upstream(String),
}

/// Which backend is serving grammar checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    Local,
    Remote,
}

/// A grammar-analysis backend
#[async_trait]
pub trait GrammarProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Check `text`, returning backend-native matches
    async fn check(&self, text: &str) -> Result<Vec<LtMatch>, GrammarError>;

    /// Release any process or connection held by the provider
    async fn shutdown(&self) {}
}

enum Backend {
    Ready(Box<dyn GrammarProvider>),
    Unavailable(String),
}

/// Process-wide grammar checker.
///
/// Built once in `main` before the HTTP server starts and shared through
/// `Arc`; `shutdown` is called after the server stops.
pub struct GrammarChecker {
    backend: Backend,
    timeout: Duration,
}

impl GrammarChecker {
    /// Select a provider: local engine first, remote service as fallback.
    ///
    /// Errors only when `config.required` is set and neither provider works.
    pub async fn init(config: &GrammarConfig) -> Result<Self, GrammarError> {
        let checker = Self::select(
            LocalLanguageTool::start(&config.local, &config.language, config.timeout),
            || RemoteLanguageTool::connect(&config.remote_url, &config.language, config.timeout),
            config.timeout,
        )
        .await;

        if config.required {
            if let Backend::Unavailable(reason) = &checker.backend {
                return Err(GrammarError::Unavailable(reason.clone()));
            }
        }

        Ok(checker)
    }

    /// Await the local provider; on any error build the remote one instead
    pub async fn select<L, LP, R, RP>(local: L, remote: R, timeout: Duration) -> Self
    where
        L: Future<Output = Result<LP, GrammarError>>,
        LP: GrammarProvider + 'static,
        R: FnOnce() -> Result<RP, GrammarError>,
        RP: GrammarProvider + 'static,
    {
        let local_err = match local.await {
            Ok(provider) => {
                log::info!("[GRAMMAR] Using local grammar engine");
                return Self::with_provider(Box::new(provider), timeout);
            }
            Err(e) => e,
        };

        log::warn!(
            "[GRAMMAR] Local engine unavailable ({}), falling back to remote service",
            local_err
        );

        match remote() {
            Ok(provider) => {
                log::info!("[GRAMMAR] Using remote grammar service");
                Self::with_provider(Box::new(provider), timeout)
            }
            Err(remote_err) => {
                log::error!(
                    "[GRAMMAR] No grammar provider (local: {}; remote: {}); grammar checks disabled",
                    local_err,
                    remote_err
                );
                Self::unavailable(
                    format!("local: {}; remote: {}", local_err, remote_err),
                    timeout,
                )
            }
        }
    }

    pub fn with_provider(provider: Box<dyn GrammarProvider>, timeout: Duration) -> Self {
        Self {
            backend: Backend::Ready(provider),
            timeout,
        }
    }

    pub fn unavailable(reason: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend: Backend::Unavailable(reason.into()),
            timeout,
        }
    }

    /// `None` when running degraded
    pub fn provider_kind(&self) -> Option<ProviderKind> {
        match &self.backend {
            Backend::Ready(provider) => Some(provider.kind()),
            Backend::Unavailable(_) => None,
        }
    }

    /// Check `text`. Empty text yields no issues without contacting a backend.
    pub async fn check(&self, text: &str) -> Result<Vec<GrammarIssue>, GrammarError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let provider = match &self.backend {
            Backend::Ready(provider) => provider,
            Backend::Unavailable(reason) => {
                return Err(GrammarError::Unavailable(reason.clone()));
            }
        };

        let matches = tokio::time::timeout(self.timeout, provider.check(text))
            .await
            .map_err(|_| GrammarError::Timeout(self.timeout))??;

        log::debug!(
            "[GRAMMAR] {} provider returned {} matches for {} chars",
            provider.kind(),
            matches.len(),
            text.chars().count()
        );

        Ok(matches.into_iter().map(GrammarIssue::from).collect())
    }

    pub async fn shutdown(&self) {
        if let Backend::Ready(provider) = &self.backend {
            provider.shutdown().await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{lt_match, StaticProvider};
    use super::*;
    use std::sync::atomic::Ordering;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn sample_matches() -> Vec<LtMatch> {
        vec![lt_match(
            "Possible spelling mistake found.",
            5,
            3,
            &["one", "two", "three", "four", "five", "six"],
            Some("MORFOLOGIK_RULE_EN_US"),
        )]
    }

    #[tokio::test]
    async fn test_empty_text_yields_no_issues() {
        let provider = StaticProvider::new(ProviderKind::Local, sample_matches());
        let calls = provider.calls.clone();
        let checker = GrammarChecker::with_provider(Box::new(provider), TIMEOUT);

        assert!(checker.check("").await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let degraded = GrammarChecker::unavailable("nothing configured", TIMEOUT);
        assert!(degraded.check("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matches_are_translated() {
        let checker = GrammarChecker::with_provider(
            Box::new(StaticProvider::new(ProviderKind::Local, sample_matches())),
            TIMEOUT,
        );

        let issues = checker.check("Thiss is wrong").await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Possible spelling mistake found.");
        assert_eq!(issues[0].offset, 5);
        assert_eq!(issues[0].length, 3);
        assert_eq!(issues[0].replacements.len(), 5);
        assert_eq!(issues[0].replacements[4], "five");
        assert_eq!(issues[0].rule_id.as_deref(), Some("MORFOLOGIK_RULE_EN_US"));
    }

    #[tokio::test]
    async fn test_local_is_preferred() {
        let checker = GrammarChecker::select(
            async { Ok(StaticProvider::new(ProviderKind::Local, vec![])) },
            || -> Result<StaticProvider, GrammarError> { panic!("remote must not be built") },
            TIMEOUT,
        )
        .await;

        assert_eq!(checker.provider_kind(), Some(ProviderKind::Local));
    }

    #[tokio::test]
    async fn test_fallback_to_remote_keeps_response_shape() {
        let local_checker = GrammarChecker::with_provider(
            Box::new(StaticProvider::new(ProviderKind::Local, sample_matches())),
            TIMEOUT,
        );

        let fallback_checker = GrammarChecker::select(
            async {
                Err::<StaticProvider, _>(GrammarError::Unavailable("java not found".to_string()))
            },
            || Ok(StaticProvider::new(ProviderKind::Remote, sample_matches())),
            TIMEOUT,
        )
        .await;

        assert_eq!(fallback_checker.provider_kind(), Some(ProviderKind::Remote));

        let from_local = local_checker.check("Thiss is wrong").await.unwrap();
        let from_remote = fallback_checker.check("Thiss is wrong").await.unwrap();
        assert_eq!(from_local, from_remote);
        assert_eq!(
            serde_json::to_value(&from_local).unwrap(),
            serde_json::to_value(&from_remote).unwrap()
        );
    }

    #[tokio::test]
    async fn test_both_providers_unavailable_runs_degraded() {
        let checker = GrammarChecker::select(
            async { Err::<StaticProvider, _>(GrammarError::Unavailable("no jar".to_string())) },
            || Err::<StaticProvider, _>(GrammarError::Unavailable("bad url".to_string())),
            TIMEOUT,
        )
        .await;

        assert_eq!(checker.provider_kind(), None);
        let err = checker.check("some text").await.unwrap_err();
        assert!(matches!(
            err,
            GrammarError::Unavailable(reason)
                if reason.contains("no jar") && reason.contains("bad url")
        ));
    }

    #[tokio::test]
    async fn test_init_required_fails_without_providers() {
        let config = GrammarConfig {
            required: true,
            remote_url: "not a url".to_string(),
            ..GrammarConfig::default()
        };
        assert!(matches!(
            GrammarChecker::init(&config).await,
            Err(GrammarError::Unavailable(_))
        ));

        let config = GrammarConfig {
            required: false,
            remote_url: "not a url".to_string(),
            ..GrammarConfig::default()
        };
        let checker = GrammarChecker::init(&config).await.unwrap();
        assert_eq!(checker.provider_kind(), None);
    }

    #[tokio::test]
    async fn test_init_falls_back_to_remote_without_local_engine() {
        let config = GrammarConfig::default();
        let checker = GrammarChecker::init(&config).await.unwrap();
        assert_eq!(checker.provider_kind(), Some(ProviderKind::Remote));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut provider = StaticProvider::new(ProviderKind::Remote, sample_matches());
        provider.delay = Duration::from_secs(10);
        let checker = GrammarChecker::with_provider(Box::new(provider), Duration::from_millis(50));

        let err = checker.check("slow text").await.unwrap_err();
        assert_eq!(err, GrammarError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_provider_errors_are_surfaced() {
        let mut provider = StaticProvider::new(ProviderKind::Remote, vec![]);
        provider.result = Err(GrammarError::RateLimited);
        let checker = GrammarChecker::with_provider(Box::new(provider), TIMEOUT);

        assert_eq!(checker.check("text").await.unwrap_err(), GrammarError::RateLimited);
    }

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::Local.to_string(), "local");
        assert_eq!(ProviderKind::Remote.as_ref(), "remote");
    }
}
