//! Headless-Chromium page sessions via the Chrome DevTools Protocol.
//!
//! One Chromium process is shared by all sessions; each company traversal
//! gets its own tab. Career boards are routinely SPAs, so everything here
//! assumes JavaScript must run before the DOM is worth reading.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use jobsift_core::traits::PageSession;
use jobsift_core::{AppError, ScanConfig};

use crate::strategy::SessionFactory;
use crate::tables::OVERLAY_SELECTORS;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const RETRY_PAUSE: Duration = Duration::from_secs(2);
const SCROLL_PAUSE: Duration = Duration::from_millis(500);

/// Lowercased page-title fragments of the common anti-bot walls
/// (Cloudflare, Akamai, PerimeterX, Imperva).
const BLOCK_TITLE_MARKERS: &[&str] = &[
    "just a moment",
    "attention required",
    "access denied",
    "verify you are human",
    "pardon our interruption",
];

/// Launches and owns the shared Chromium process.
pub struct BrowserSessionFactory {
    browser: Arc<Browser>,
    config: ScanConfig,
}

impl BrowserSessionFactory {
    /// Launches headless Chromium with bot-detection-friendly settings:
    /// a desktop viewport, a real browser user agent, and the blink
    /// automation flag disabled.
    pub async fn launch(config: ScanConfig) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().window_size(1920, 1080);

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags. Locate the real binary when we can; otherwise
        // chromiumoxide does its own lookup.
        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let browser_config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={USER_AGENT}"))
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            config,
        })
    }
}

impl SessionFactory for BrowserSessionFactory {
    type Session = BrowserSession;

    async fn open_session(&self) -> Result<BrowserSession, AppError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to open tab: {e}")))?;

        Ok(BrowserSession {
            page,
            timeout: self.config.page_load_timeout,
            settle_delay: self.config.settle_delay,
            max_retries: self.config.max_retries,
        })
    }
}

/// One tab in the shared browser. Dropping the session leaks the tab's
/// CDP target until the browser exits, so each traversal keeps exactly
/// one of these alive at a time.
pub struct BrowserSession {
    page: Page,
    timeout: Duration,
    settle_delay: Duration,
    max_retries: u32,
}

impl BrowserSession {
    async fn evaluate_value<T: serde::de::DeserializeOwned>(
        &self,
        expression: &str,
    ) -> Result<T, AppError> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| AppError::BrowserError(format!("Evaluate failed: {e}")))?
            .into_value::<T>()
            .map_err(|e| AppError::BrowserError(format!("Evaluate result: {e}")))
    }

    /// Returns the marker of an anti-bot interstitial if the rendered page
    /// is one, judged by its title.
    async fn interstitial_marker(&self) -> Option<&'static str> {
        let title: String = self
            .evaluate_value("document.title.toLowerCase()")
            .await
            .ok()?;
        BLOCK_TITLE_MARKERS
            .iter()
            .copied()
            .find(|marker| title.contains(marker))
    }
}

impl PageSession for BrowserSession {
    async fn open(&mut self, url: &str) -> Result<(), AppError> {
        let attempts = self.max_retries.max(1);
        for attempt in 1..=attempts {
            let navigation = async {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| AppError::NetworkError(format!("Navigation to {url} failed: {e}")))?;
                // A rendered <body> is the minimal signal the page is usable.
                self.page
                    .find_element("body")
                    .await
                    .map_err(|e| AppError::BrowserError(format!("Page did not render body: {e}")))?;
                if let Some(marker) = self.interstitial_marker().await {
                    return Err(AppError::Blocked(format!("{url}: {marker}")));
                }
                Ok::<(), AppError>(())
            };

            match tokio::time::timeout(self.timeout, navigation).await {
                Ok(Ok(())) => return Ok(()),
                // A block wall will not clear within the retry pause.
                Ok(Err(e @ AppError::Blocked(_))) => return Err(e),
                Ok(Err(e)) if attempt < attempts => {
                    tracing::debug!(%url, attempt, error = %e, "Navigation failed; retrying");
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) if attempt < attempts => {
                    tracing::debug!(%url, attempt, "Navigation timed out; retrying");
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(_) => return Err(AppError::Timeout(self.timeout.as_secs())),
            }
        }
        Err(AppError::Timeout(self.timeout.as_secs()))
    }

    async fn await_settled(&mut self) {
        tokio::time::sleep(self.settle_delay).await;
    }

    async fn dismiss_overlays(&mut self) {
        let Ok(selectors) = serde_json::to_string(OVERLAY_SELECTORS) else {
            return;
        };
        let script = format!(
            "(() => {{
                for (const sel of {selectors}) {{
                    const el = document.querySelector(sel);
                    if (el && el.offsetParent !== null) {{ el.click(); return true; }}
                }}
                return false;
            }})()"
        );
        if let Err(e) = self.page.evaluate(script).await {
            tracing::debug!(error = %e, "Overlay dismissal skipped");
        }
    }

    async fn scroll_to_exhaustion(&mut self, max_iterations: u32) {
        let mut last_height = 0.0_f64;
        for _ in 0..max_iterations {
            if self.scroll_to_bottom().await.is_err() {
                return;
            }
            tokio::time::sleep(SCROLL_PAUSE).await;
            match self.scroll_height().await {
                Ok(height) if height > last_height => last_height = height,
                _ => return,
            }
        }
    }

    async fn content(&mut self) -> Result<String, AppError> {
        self.page
            .content()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read page content: {e}")))
    }

    async fn click_any(&mut self, selectors: &[&str]) -> Result<bool, AppError> {
        let selectors = serde_json::to_string(selectors)?;
        let script = format!(
            "(() => {{
                for (const sel of {selectors}) {{
                    let el;
                    try {{ el = document.querySelector(sel); }} catch (_) {{ continue; }}
                    if (!el || el.disabled) continue;
                    if (el.getAttribute('aria-disabled') === 'true') continue;
                    if (el.offsetParent === null) continue;
                    el.click();
                    return true;
                }}
                return false;
            }})()"
        );
        self.evaluate_value(&script).await
    }

    async fn scroll_height(&mut self) -> Result<f64, AppError> {
        self.evaluate_value("document.body ? document.body.scrollHeight : 0")
            .await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), AppError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| AppError::BrowserError(format!("Scroll failed: {e}")))?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, AppError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read URL: {e}")))?;
        url.ok_or_else(|| AppError::BrowserError("Page has no URL".to_string()))
    }
}

fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];
    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}
