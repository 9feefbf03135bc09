//! Chromium backend over the Chrome `DevTools` Protocol.
//!
//! Elements are addressed by stamping a `data-pagewright-id` attribute on
//! every node a lookup returns. Reads and state checks run as scripts against
//! the stamped node; clicks, typing and key presses go through real CDP input
//! events so framework listeners see them.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use async_trait::async_trait;

use crate::config::{PagewrightConfig, Viewport};
use crate::driver::{BrowserDriver, ElementHandle, WindowHandle};
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};

const HANDLE_ATTRIBUTE: &str = "data-pagewright-id";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const VISIBLE_FUNCTION: &str = "el => { const s = window.getComputedStyle(el); \
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
        && s.visibility !== 'hidden' && s.display !== 'none'; }";
const CLEAR_FUNCTION: &str = "el => { if (el.disabled || el.readOnly) return false; \
    el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return true; }";

fn handle_selector(element: &ElementHandle) -> String {
    format!("[{HANDLE_ATTRIBUTE}='{}']", element.id)
}

fn element_expr(element: &ElementHandle) -> String {
    format!("document.querySelector({:?})", handle_selector(element))
}

/// Script that stamps every node yielded by `nodes` and returns `[id, tag]` pairs
fn stamp_script(nodes: &str, prefix: &str) -> String {
    format!(
        "(() => {{ const found = {nodes}; \
         return found.filter(Boolean).map((el, i) => {{ \
           if (!el.getAttribute('{HANDLE_ATTRIBUTE}')) {{ el.setAttribute('{HANDLE_ATTRIBUTE}', '{prefix}-' + i); }} \
           return [el.getAttribute('{HANDLE_ATTRIBUTE}'), el.tagName.toLowerCase()]; }}); }})()"
    )
}

/// Script that applies `function` to the stamped node, reporting stale handles
fn call_script(element: &ElementHandle, function: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) {{ return {{ stale: true }}; }} \
         return {{ value: ({function})(el) }}; }})()",
        element_expr(element)
    )
}

fn page_script(script: &str, args: &[serde_json::Value]) -> PagewrightResult<String> {
    if args.is_empty() {
        return Ok(script.to_string());
    }
    let args = serde_json::to_string(args)?;
    Ok(format!("(function() {{ return ({script}); }}).apply(null, {args})"))
}

fn timeout(wait: Duration, message: String) -> PagewrightError {
    PagewrightError::Timeout {
        ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
        message,
    }
}

/// Chromium session driven over CDP
#[derive(Debug)]
pub struct CdpDriver {
    browser: Mutex<Browser>,
    current: Mutex<Page>,
    handler: JoinHandle<()>,
}

impl CdpDriver {
    /// Launch Chromium according to `config` and open a blank page
    pub async fn launch(config: &PagewrightConfig) -> PagewrightResult<Self> {
        if !config.browser.is_chromium_based() {
            return Err(PagewrightError::Config {
                message: format!(
                    "the CDP backend drives Chromium-based browsers only, not {}",
                    config.browser
                ),
            });
        }

        let mut builder =
            BrowserConfig::builder().window_size(config.viewport.width, config.viewport.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| PagewrightError::Config { message })?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(PagewrightError::driver)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(PagewrightError::driver)?;
        info!(browser = %config.browser, headless = config.headless, "launched browser over CDP");
        Ok(Self {
            browser: Mutex::new(browser),
            current: Mutex::new(page),
            handler,
        })
    }

    async fn page(&self) -> Page {
        self.current.lock().await.clone()
    }

    async fn eval(&self, script: String) -> PagewrightResult<serde_json::Value> {
        let result = self
            .page()
            .await
            .evaluate(script)
            .await
            .map_err(PagewrightError::driver)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn stamp(&self, nodes: &str) -> PagewrightResult<Vec<ElementHandle>> {
        let prefix = Uuid::new_v4().to_string();
        let value = self.eval(stamp_script(nodes, &prefix)).await?;
        let pairs: Vec<(String, String)> = serde_json::from_value(value)?;
        Ok(pairs
            .into_iter()
            .map(|(id, tag)| ElementHandle::new(id, tag))
            .collect())
    }

    async fn call_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> PagewrightResult<serde_json::Value> {
        let value = self.eval(call_script(element, function)).await?;
        if value.get("stale").is_some() {
            return Err(PagewrightError::driver(format!(
                "stale element handle {}",
                element.id
            )));
        }
        Ok(value.get("value").cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn cdp_element(&self, element: &ElementHandle) -> PagewrightResult<Element> {
        self.page()
            .await
            .find_element(handle_selector(element))
            .await
            .map_err(PagewrightError::driver)
    }

    async fn first_visible(&self, locator: &Locator) -> PagewrightResult<Option<ElementHandle>> {
        for element in self.find_elements(locator).await? {
            if self.is_visible(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn page_for(&self, window: &WindowHandle) -> PagewrightResult<Page> {
        let pages = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(PagewrightError::driver)?;
        pages
            .into_iter()
            .find(|page| page.target_id().inner() == &window.id)
            .ok_or_else(|| PagewrightError::driver(format!("no such window {}", window.id)))
    }

    async fn describe(page: &Page) -> PagewrightResult<WindowHandle> {
        let title = page
            .get_title()
            .await
            .map_err(PagewrightError::driver)?
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(PagewrightError::driver)?
            .unwrap_or_default();
        Ok(WindowHandle::new(page.target_id().inner().clone(), title, url))
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> PagewrightResult<()> {
        debug!(url, "navigate");
        let _ = self
            .page()
            .await
            .goto(url)
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> PagewrightResult<ElementHandle> {
        self.stamp(&format!("[{}]", locator.to_query()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    async fn find_elements(&self, locator: &Locator) -> PagewrightResult<Vec<ElementHandle>> {
        self.stamp(&locator.to_all_query_in("document")).await
    }

    async fn find_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<ElementHandle> {
        self.stamp(&format!("[{}]", locator.to_query_in(&element_expr(parent))))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<Vec<ElementHandle>> {
        self.stamp(&locator.to_all_query_in(&element_expr(parent)))
            .await
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let cleared = self.call_on(element, CLEAR_FUNCTION).await?;
        if cleared != serde_json::Value::Bool(true) {
            return Err(PagewrightError::driver(format!(
                "element {} does not accept input",
                element.id
            )));
        }
        if text.is_empty() {
            return Ok(());
        }
        let target = self.cdp_element(element).await?;
        let _ = target.focus().await.map_err(PagewrightError::driver)?;
        let _ = target
            .type_str(text)
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> PagewrightResult<()> {
        let _ = self
            .cdp_element(element)
            .await?
            .click()
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> PagewrightResult<Option<String>> {
        let function = format!(
            "el => ({name:?} === 'value' && 'value' in el) ? String(el.value) : el.getAttribute({name:?})"
        );
        Ok(self
            .call_on(element, &function)
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn text(&self, element: &ElementHandle) -> PagewrightResult<String> {
        Ok(self
            .call_on(element, "el => el.innerText || el.textContent || ''")
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn is_visible(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self
            .call_on(element, VISIBLE_FUNCTION)
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self
            .call_on(element, "el => !(el.disabled || el.readOnly)")
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn is_checked(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self
            .call_on(element, "el => !!el.checked")
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn select_option(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let wanted = text.trim();
        let function = format!(
            "el => {{ const o = Array.from(el.options || []).find(o => o.text.trim() === {wanted:?}); \
             if (!o) {{ return false; }} o.selected = true; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }}"
        );
        if self.call_on(element, &function).await?.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(PagewrightError::OptionNotFound {
                value: text.to_string(),
                locator: handle_selector(element),
            })
        }
    }

    async fn selected_option_text(
        &self,
        element: &ElementHandle,
    ) -> PagewrightResult<Option<String>> {
        Ok(self
            .call_on(
                element,
                "el => (el.options && el.selectedIndex >= 0) ? el.options[el.selectedIndex].text : null",
            )
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn press_key(&self, element: &ElementHandle, key: &str) -> PagewrightResult<()> {
        let target = self.cdp_element(element).await?;
        let _ = target.focus().await.map_err(PagewrightError::driver)?;
        let _ = target
            .press_key(key)
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> PagewrightResult<serde_json::Value> {
        self.call_on(element, function).await
    }

    async fn evaluate(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> PagewrightResult<serde_json::Value> {
        self.eval(page_script(script, &args)?).await
    }

    async fn wait_until_visible(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> PagewrightResult<ElementHandle> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(element) = self.first_visible(locator).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(timeout(wait, format!("waiting for {locator} to be visible")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_until_hidden(&self, locator: &Locator, wait: Duration) -> PagewrightResult<()> {
        let deadline = Instant::now() + wait;
        loop {
            if self.first_visible(locator).await?.is_none() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(timeout(wait, format!("waiting for {locator} to be hidden")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn windows(&self) -> PagewrightResult<Vec<WindowHandle>> {
        let pages = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(PagewrightError::driver)?;
        let mut windows = Vec::with_capacity(pages.len());
        for page in &pages {
            windows.push(Self::describe(page).await?);
        }
        Ok(windows)
    }

    async fn current_window(&self) -> PagewrightResult<WindowHandle> {
        Self::describe(&self.page().await).await
    }

    async fn switch_to_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        let page = self.page_for(window).await?;
        let _ = page.bring_to_front().await.map_err(PagewrightError::driver)?;
        *self.current.lock().await = page;
        Ok(())
    }

    async fn close_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        let page = self.page_for(window).await?;
        let was_current = self.page().await.target_id() == page.target_id();
        page.close().await.map_err(PagewrightError::driver)?;
        if was_current {
            let remaining = self
                .browser
                .lock()
                .await
                .pages()
                .await
                .map_err(PagewrightError::driver)?;
            if let Some(next) = remaining.into_iter().next() {
                *self.current.lock().await = next;
            }
        }
        Ok(())
    }

    async fn title(&self) -> PagewrightResult<String> {
        Ok(self
            .page()
            .await
            .get_title()
            .await
            .map_err(PagewrightError::driver)?
            .unwrap_or_default())
    }

    async fn current_url(&self) -> PagewrightResult<String> {
        Ok(self
            .page()
            .await
            .url()
            .await
            .map_err(PagewrightError::driver)?
            .unwrap_or_default())
    }

    async fn reload(&self) -> PagewrightResult<()> {
        let _ = self
            .page()
            .await
            .reload()
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn go_back(&self) -> PagewrightResult<()> {
        let _ = self.eval("history.back()".to_string()).await?;
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> PagewrightResult<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            false,
        );
        let _ = self
            .page()
            .await
            .execute(params)
            .await
            .map_err(PagewrightError::driver)?;
        Ok(())
    }

    async fn quit(&self) -> PagewrightResult<()> {
        let mut browser = self.browser.lock().await;
        let _ = browser.close().await.map_err(PagewrightError::driver)?;
        let _ = browser.wait().await;
        self.handler.abort();
        info!("browser closed");
        Ok(())
    }
}
