//! Chrome DevTools backend for [`RenderSession`].

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use nse_api::types::SessionCookie;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{PagerCell, RenderSession, RowRead, SessionError, SessionFactory};
use crate::config::BrowserSettings;

/// Hides the most common automation tells before any page script runs.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
window.chrome = window.chrome || { runtime: {} };
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

impl From<CdpError> for SessionError {
    fn from(e: CdpError) -> Self {
        SessionError::Protocol(e.to_string())
    }
}

/// Launches one Chrome process per session.
#[derive(Debug, Clone, Default)]
pub struct ChromeFactory {
    settings: BrowserSettings,
}

impl ChromeFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SessionError> {
        let s = &self.settings;
        let mut builder = BrowserConfig::builder()
            .window_size(s.window_width, s.window_height)
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--start-maximized")
            .arg(format!("--user-agent={}", nse_api::user_agent::get_user_agent()));
        if let Some(path) = &s.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !s.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(SessionError::Launch)
    }
}

#[async_trait]
impl SessionFactory for ChromeFactory {
    type Session = ChromeSession;

    async fn open(&self) -> Result<ChromeSession, SessionError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(SessionError::Launch(e.to_string()));
            }
        };
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await?;
        info!(headless = self.settings.headless, "browser session opened");

        Ok(ChromeSession {
            browser: tokio::sync::Mutex::new(Some(browser)),
            handler_task: std::sync::Mutex::new(Some(handler_task)),
            page,
        })
    }
}

/// One browser process with a single working tab.
pub struct ChromeSession {
    browser: tokio::sync::Mutex<Option<Browser>>,
    handler_task: std::sync::Mutex<Option<JoinHandle<()>>>,
    page: Page,
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(task) = self.take_handler() {
            task.abort();
        }
    }
}

impl ChromeSession {
    fn take_handler(&self) -> Option<JoinHandle<()>> {
        self.handler_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    async fn eval(&self, script: String) -> Result<Value, SessionError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn read_row(row: &Element) -> Result<RowRead, CdpError> {
        let class = row.attribute("class").await?.unwrap_or_default();
        let mut cells = Vec::new();
        for cell in row.find_elements(":scope > td").await? {
            cells.push(cell.inner_text().await?.unwrap_or_default());
        }
        Ok(RowRead::Row { class, cells })
    }
}

/// Quotes `s` as a JavaScript string literal.
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        debug!("navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn run_script(&self, script: &str) -> Result<Value, SessionError> {
        self.eval(script.to_string()).await
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>, SessionError> {
        Ok(self
            .page
            .get_cookies()
            .await?
            .into_iter()
            .map(|c| SessionCookie::new(c.name, c.value))
            .collect())
    }

    async fn current_user_agent(&self) -> Result<String, SessionError> {
        let ua = self.eval("navigator.userAgent".to_string()).await?;
        Ok(ua.as_str().unwrap_or_default().to_string())
    }

    async fn element_exists(&self, selector: &str) -> Result<bool, SessionError> {
        let found = self
            .eval(format!("document.querySelector({}) !== null", js_str(selector)))
            .await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let text = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
                js_str(selector)
            ))
            .await?;
        Ok(text.as_str().map(str::to_string))
    }

    async fn body_text(&self) -> Result<String, SessionError> {
        let text = self
            .eval("document.body ? document.body.innerText : ''".to_string())
            .await?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<bool, SessionError> {
        let script = format!(
            r#"(() => {{
                const sel = document.querySelector({sel});
                if (!sel) return null;
                const offered = Array.from(sel.options).some(o => o.value === {val});
                if (!offered) return false;
                sel.value = {val};
                sel.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_str(selector),
            val = js_str(value)
        );
        match self.eval(script).await? {
            Value::Bool(offered) => Ok(offered),
            _ => Err(SessionError::ElementNotFound(selector.to_string())),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), SessionError> {
        let clicked = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
                js_str(selector)
            ))
            .await?;
        if clicked.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(selector.to_string()))
        }
    }

    async fn table_rows(&self, table_selector: &str) -> Result<Vec<RowRead>, SessionError> {
        let selector = format!(
            "{t} > tbody > tr, {t} > thead > tr, {t} > tr",
            t = table_selector
        );
        let rows = self.page.find_elements(selector).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::read_row(row).await {
                Ok(read) => out.push(read),
                Err(e) => {
                    debug!("row read failed: {}", e);
                    out.push(RowRead::Stale);
                }
            }
        }
        Ok(out)
    }

    async fn pager_cells(&self, selector: &str) -> Result<Vec<PagerCell>, SessionError> {
        let cells = self.page.find_elements(selector).await?;
        let mut out = Vec::with_capacity(cells.len());
        for cell in &cells {
            if let Ok(link) = cell.find_element("a").await {
                let label = link.inner_text().await?.unwrap_or_default();
                out.push(PagerCell::Link(label.trim().to_string()));
            } else if let Ok(span) = cell.find_element("span").await {
                let label = span.inner_text().await?.unwrap_or_default();
                out.push(PagerCell::Current(label.trim().to_string()));
            } else {
                out.push(PagerCell::Other);
            }
        }
        Ok(out)
    }

    async fn click_pager_link(&self, selector: &str, index: usize) -> Result<(), SessionError> {
        let script = format!(
            r#"(() => {{
                const links = Array.from(document.querySelectorAll({sel}))
                    .map(td => td.querySelector('a'))
                    .filter(a => a !== null);
                if ({idx} >= links.length) return false;
                links[{idx}].click();
                return true;
            }})()"#,
            sel = js_str(selector),
            idx = index
        );
        match self.eval(script).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(SessionError::StaleElement(format!(
                "pager link {} under {}",
                index, selector
            ))),
        }
    }

    async fn close(&self) {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                debug!("browser close failed: {}", e);
            }
            let _ = tokio::time::timeout(Duration::from_secs(5), browser.wait()).await;
            info!("browser session closed");
        }
        if let Some(task) = self.take_handler() {
            task.abort();
        }
    }
}
