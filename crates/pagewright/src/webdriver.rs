//! W3C WebDriver backend.
//!
//! Talks to chromedriver, geckodriver, msedgedriver or a Selenium grid at
//! [`PagewrightConfig::webdriver_url`]. Located elements are kept in a table
//! keyed by their WebDriver element id, which is also the id of the
//! [`ElementHandle`] handed out.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use thirtyfour::{Capabilities, TypingData, WindowHandle as WdWindowHandle};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{BrowserKind, PagewrightConfig, Viewport};
use crate::driver::{BrowserDriver, ElementHandle, WindowHandle};
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn wd_error(err: WebDriverError) -> PagewrightError {
    PagewrightError::driver(err)
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::XPath(expr) => By::XPath(expr),
        other => By::Css(&other.as_css()),
    }
}

/// Named keys understood by [`BrowserDriver::press_key`]; anything else is typed as text
fn named_key(key: &str) -> Option<Key> {
    let key = match key.trim().to_lowercase().as_str() {
        "escape" | "esc" => Key::Escape,
        "enter" => Key::Enter,
        "return" => Key::Return,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "space" => Key::Space,
        "up" | "arrowup" => Key::Up,
        "down" | "arrowdown" => Key::Down,
        "left" | "arrowleft" => Key::Left,
        "right" | "arrowright" => Key::Right,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        _ => return None,
    };
    Some(key)
}

fn capabilities(config: &PagewrightConfig) -> PagewrightResult<Capabilities> {
    let caps: Capabilities = match config.browser {
        BrowserKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            if config.headless {
                caps.set_headless().map_err(wd_error)?;
            }
            caps.into()
        }
        BrowserKind::Edge => {
            let mut caps = DesiredCapabilities::edge();
            if config.headless {
                caps.set_headless().map_err(wd_error)?;
            }
            caps.into()
        }
        BrowserKind::Chrome | BrowserKind::Chromium => {
            let mut caps = DesiredCapabilities::chrome();
            if config.headless {
                caps.set_headless().map_err(wd_error)?;
            }
            if let Some(path) = &config.chrome_executable {
                caps.set_binary(&path.to_string_lossy()).map_err(wd_error)?;
            }
            caps.into()
        }
    };
    Ok(caps)
}

fn timeout(wait: Duration, message: String) -> PagewrightError {
    PagewrightError::Timeout {
        ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
        message,
    }
}

/// Browser session behind a W3C WebDriver endpoint
#[derive(Debug)]
pub struct WebDriverAdapter {
    driver: WebDriver,
    elements: Mutex<HashMap<String, WebElement>>,
}

impl WebDriverAdapter {
    /// Open a session at the configured endpoint and size its window
    pub async fn connect(config: &PagewrightConfig) -> PagewrightResult<Self> {
        let caps = capabilities(config)?;
        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(wd_error)?;
        driver
            .set_window_rect(0, 0, config.viewport.width, config.viewport.height)
            .await
            .map_err(wd_error)?;
        info!(
            browser = %config.browser,
            endpoint = %config.webdriver_url,
            headless = config.headless,
            "webdriver session started"
        );
        Ok(Self {
            driver,
            elements: Mutex::new(HashMap::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WebElement>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, element: WebElement, tag: String) -> ElementHandle {
        let id = element.element_id().to_string();
        let _ = self.lock().insert(id.clone(), element);
        ElementHandle::new(id, tag)
    }

    async fn handles(&self, found: Vec<WebElement>) -> PagewrightResult<Vec<ElementHandle>> {
        let mut handles = Vec::with_capacity(found.len());
        for element in found {
            let tag = element.tag_name().await.map_err(wd_error)?;
            handles.push(self.register(element, tag));
        }
        Ok(handles)
    }

    fn web_element(&self, element: &ElementHandle) -> PagewrightResult<WebElement> {
        self.lock()
            .get(&element.id)
            .cloned()
            .ok_or_else(|| PagewrightError::driver(format!("stale element handle {}", element.id)))
    }

    async fn first_visible(&self, locator: &Locator) -> PagewrightResult<Option<ElementHandle>> {
        for element in self.find_elements(locator).await? {
            if self.is_visible(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn focus(&self, window: &WindowHandle) -> PagewrightResult<()> {
        self.driver
            .switch_to_window(WdWindowHandle::from(window.id.clone()))
            .await
            .map_err(wd_error)
    }

    async fn describe_current(&self) -> PagewrightResult<WindowHandle> {
        let handle = self.driver.window().await.map_err(wd_error)?;
        let title = self.driver.title().await.map_err(wd_error)?;
        let url = self.driver.current_url().await.map_err(wd_error)?;
        Ok(WindowHandle::new(handle.to_string(), title, url.to_string()))
    }
}

#[async_trait]
impl BrowserDriver for WebDriverAdapter {
    async fn navigate(&self, url: &str) -> PagewrightResult<()> {
        debug!(url, "navigate");
        self.lock().clear();
        self.driver.goto(url).await.map_err(wd_error)
    }

    async fn find_element(&self, locator: &Locator) -> PagewrightResult<ElementHandle> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    async fn find_elements(&self, locator: &Locator) -> PagewrightResult<Vec<ElementHandle>> {
        let found = self.driver.find_all(to_by(locator)).await.map_err(wd_error)?;
        self.handles(found).await
    }

    async fn find_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<ElementHandle> {
        self.find_all_within(parent, locator)
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
        let parent = self.web_element(parent)?;
        let found = parent.find_all(to_by(locator)).await.map_err(wd_error)?;
        self.handles(found).await
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let target = self.web_element(element)?;
        target.clear().await.map_err(wd_error)?;
        if !text.is_empty() {
            target.send_keys(text).await.map_err(wd_error)?;
        }
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> PagewrightResult<()> {
        let target = self.web_element(element)?;
        target.scroll_into_view().await.map_err(wd_error)?;
        target.click().await.map_err(wd_error)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> PagewrightResult<Option<String>> {
        let target = self.web_element(element)?;
        if name == "value" {
            if let Some(value) = target.prop("value").await.map_err(wd_error)? {
                return Ok(Some(value));
            }
        }
        target.attr(name).await.map_err(wd_error)
    }

    async fn text(&self, element: &ElementHandle) -> PagewrightResult<String> {
        self.web_element(element)?.text().await.map_err(wd_error)
    }

    async fn is_visible(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        self.web_element(element)?
            .is_displayed()
            .await
            .map_err(wd_error)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        self.web_element(element)?
            .is_enabled()
            .await
            .map_err(wd_error)
    }

    async fn is_checked(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        self.web_element(element)?
            .is_selected()
            .await
            .map_err(wd_error)
    }

    async fn select_option(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let target = self.web_element(element)?;
        let select = SelectElement::new(&target).await.map_err(wd_error)?;
        select
            .select_by_visible_text(text.trim())
            .await
            .map_err(|_| PagewrightError::OptionNotFound {
                value: text.to_string(),
                locator: element.id.clone(),
            })
    }

    async fn selected_option_text(
        &self,
        element: &ElementHandle,
    ) -> PagewrightResult<Option<String>> {
        let target = self.web_element(element)?;
        let select = SelectElement::new(&target).await.map_err(wd_error)?;
        match select.first_selected_option().await {
            Ok(option) => Ok(Some(option.text().await.map_err(wd_error)?)),
            Err(_) => Ok(None),
        }
    }

    async fn press_key(&self, element: &ElementHandle, key: &str) -> PagewrightResult<()> {
        let target = self.web_element(element)?;
        let keys: TypingData = match named_key(key) {
            Some(named) => named.into(),
            None => key.into(),
        };
        target.send_keys(keys).await.map_err(wd_error)
    }

    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> PagewrightResult<serde_json::Value> {
        let target = self.web_element(element)?;
        let arg = target.to_json().map_err(wd_error)?;
        let ret = self
            .driver
            .execute(format!("return ({function})(arguments[0]);"), vec![arg])
            .await
            .map_err(wd_error)?;
        Ok(ret.json().clone())
    }

    async fn evaluate(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> PagewrightResult<serde_json::Value> {
        let ret = self
            .driver
            .execute(format!("return ({script});"), args)
            .await
            .map_err(wd_error)?;
        Ok(ret.json().clone())
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
        let original = self.driver.window().await.map_err(wd_error)?;
        let handles = self.driver.windows().await.map_err(wd_error)?;
        let mut windows = Vec::with_capacity(handles.len());
        for handle in handles {
            self.driver
                .switch_to_window(handle)
                .await
                .map_err(wd_error)?;
            windows.push(self.describe_current().await?);
        }
        self.driver
            .switch_to_window(original)
            .await
            .map_err(wd_error)?;
        Ok(windows)
    }

    async fn current_window(&self) -> PagewrightResult<WindowHandle> {
        self.describe_current().await
    }

    async fn switch_to_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        self.lock().clear();
        self.focus(window).await
    }

    async fn close_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        self.focus(window).await?;
        self.driver.close_window().await.map_err(wd_error)?;
        self.lock().clear();
        let remaining = self.driver.windows().await.map_err(wd_error)?;
        if let Some(next) = remaining.into_iter().next() {
            self.driver.switch_to_window(next).await.map_err(wd_error)?;
        }
        Ok(())
    }

    async fn title(&self) -> PagewrightResult<String> {
        self.driver.title().await.map_err(wd_error)
    }

    async fn current_url(&self) -> PagewrightResult<String> {
        Ok(self
            .driver
            .current_url()
            .await
            .map_err(wd_error)?
            .to_string())
    }

    async fn reload(&self) -> PagewrightResult<()> {
        self.lock().clear();
        self.driver.refresh().await.map_err(wd_error)
    }

    async fn go_back(&self) -> PagewrightResult<()> {
        self.lock().clear();
        self.driver.back().await.map_err(wd_error)
    }

    async fn set_viewport(&self, viewport: Viewport) -> PagewrightResult<()> {
        self.driver
            .set_window_rect(0, 0, viewport.width, viewport.height)
            .await
            .map_err(wd_error)
    }

    async fn quit(&self) -> PagewrightResult<()> {
        self.lock().clear();
        self.driver.clone().quit().await.map_err(wd_error)?;
        info!("webdriver session closed");
        Ok(())
    }
}
