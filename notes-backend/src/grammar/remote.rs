//! Remote grammar provider backed by the hosted LanguageTool API.
//!
//! The public endpoint is rate-limited; HTTP 429 surfaces as
//! `GrammarError::RateLimited` and is never retried here.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::languagetool::{LanguageToolClient, LtMatch};
use super::{GrammarError, GrammarProvider, ProviderKind};

pub struct RemoteLanguageTool {
    client: LanguageToolClient,
}

impl RemoteLanguageTool {
    pub fn connect(
        base_url: &str,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, GrammarError> {
        let url = Url::parse(base_url).map_err(|e| {
            GrammarError::Unavailable(format!("invalid LanguageTool URL {:?}: {}", base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GrammarError::Unavailable(format!(
                "unsupported LanguageTool URL scheme {:?}",
                url.scheme()
            )));
        }

        let client = LanguageToolClient::new(url.as_str(), language, timeout)?;
        log::info!("[GRAMMAR] Remote LanguageTool endpoint: {}", client.base_url());

        Ok(Self { client })
    }
}

#[async_trait]
impl GrammarProvider for RemoteLanguageTool {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    async fn check(&self, text: &str) -> Result<Vec<LtMatch>, GrammarError> {
        self.client.check(text).await
    }
}
