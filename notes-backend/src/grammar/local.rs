//! Local grammar engine: a LanguageTool server run as a child process.
//!
//! Spawns `java -cp languagetool-server.jar org.languagetool.server.HTTPServer`
//! on a localhost port, waits for it to answer, then forwards checks to it.
//! Access is serialized through a semaphore sized by `LANGUAGETOOL_LOCAL_PERMITS`.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, Semaphore};

use super::languagetool::{LanguageToolClient, LtMatch};
use super::{GrammarError, GrammarProvider, ProviderKind};
use crate::config::LocalEngineConfig;

const SERVER_MAIN_CLASS: &str = "org.languagetool.server.HTTPServer";
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct LocalLanguageTool {
    client: LanguageToolClient,
    child: Mutex<Option<Child>>,
    permits: Semaphore,
}

impl LocalLanguageTool {
    /// Launch the engine and wait until it is healthy
    pub async fn start(
        config: &LocalEngineConfig,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, GrammarError> {
        let jar = config
            .jar
            .as_ref()
            .ok_or_else(|| GrammarError::Unavailable("LANGUAGETOOL_JAR is not set".to_string()))?;

        if !jar.is_file() {
            return Err(GrammarError::Unavailable(format!(
                "LanguageTool jar not found at {}",
                jar.display()
            )));
        }

        let java = which::which(&config.java).map_err(|e| {
            GrammarError::Unavailable(format!("Java runtime {:?} not found: {}", config.java, e))
        })?;

        log::info!(
            "[GRAMMAR] Spawning local LanguageTool on 127.0.0.1:{} ({})",
            config.port,
            jar.display()
        );

        let mut child = Command::new(java)
            .arg("-cp")
            .arg(jar)
            .arg(SERVER_MAIN_CLASS)
            .arg("--port")
            .arg(config.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GrammarError::Unavailable(format!("failed to spawn LanguageTool: {}", e))
            })?;

        let client = LanguageToolClient::new(
            &format!("http://127.0.0.1:{}", config.port),
            language,
            timeout,
        )?;

        let deadline = Instant::now() + config.startup_timeout;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(GrammarError::Unavailable(format!(
                    "LanguageTool exited during startup ({})",
                    status
                )));
            }
            if client.health().await.unwrap_or(false) {
                break;
            }
            if Instant::now() > deadline {
                let _ = child.kill().await;
                return Err(GrammarError::Unavailable(format!(
                    "LanguageTool did not become healthy within {}s",
                    config.startup_timeout.as_secs()
                )));
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }

        log::info!("[GRAMMAR] Local LanguageTool is healthy at {}", client.base_url());

        Ok(Self {
            client,
            child: Mutex::new(Some(child)),
            permits: Semaphore::new(config.permits.max(1)),
        })
    }
}

#[async_trait]
impl GrammarProvider for LocalLanguageTool {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn check(&self, text: &str) -> Result<Vec<LtMatch>, GrammarError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| {
                GrammarError::Unavailable("local grammar engine is shut down".to_string())
            })?;

        self.client.check(text).await
    }

    async fn shutdown(&self) {
        self.permits.close();

        if let Some(mut child) = self.child.lock().await.take() {
            log::info!("[GRAMMAR] Stopping local LanguageTool");
            if let Err(e) = child.kill().await {
                log::warn!("[GRAMMAR] Failed to stop LanguageTool: {}", e);
            }
        }
    }
}
