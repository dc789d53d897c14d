use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::ports::{BrowserLauncher, BrowserPort, PagePort};
use crate::constants::BROWSER_USER_AGENT;
use crate::error::{Result, ScraperError};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SCROLL_SCRIPT: &str = r#"(() => {
    window.scrollBy(0, __PX__);
    const root = document.scrollingElement || document.documentElement;
    return Math.ceil(window.innerHeight + window.scrollY) >= root.scrollHeight;
})()"#;

/// Launches a local Chrome/Chromium over CDP.
pub struct ChromiumLauncher {
    headless: bool,
    chrome_path: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(headless: bool, chrome_path: Option<PathBuf>) -> Self {
        Self { headless, chrome_path }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserPort>> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", BROWSER_USER_AGENT));
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScraperError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });
        debug!("Browser launched (headless: {})", self.headless);

        Ok(Box::new(ChromiumBrowser { browser, handler_task }))
    }
}

pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserPort for ChromiumBrowser {
    async fn new_page(&self) -> Result<Box<dyn PagePort>> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumBrowser { mut browser, handler_task } = *self;
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        handler_task.abort();
        Ok(())
    }
}

pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PagePort for ChromiumPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScraperError::navigation(url, e.to_string())),
            Err(_) => Err(ScraperError::navigation(
                url,
                format!("navigation timed out after {}ms", timeout.as_millis()),
            )),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                let url = self.current_url().await.unwrap_or_default();
                return Err(ScraperError::navigation(
                    url,
                    format!("selector '{}' not found within {}ms", selector, timeout.as_millis()),
                ));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.click().await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn scroll_by(&mut self, pixels: u32) -> Result<bool> {
        let script = SCROLL_SCRIPT.replace("__PX__", &pixels.to_string());
        let reached_bottom: bool = self.page.evaluate(script).await?.into_value()?;
        Ok(reached_bottom)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
