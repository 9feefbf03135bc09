//! MockDriver - in-memory DOM for unit and behavioural tests.
//!
//! Elements are registered under one or more (scope, locator) keys. A lookup
//! matches keys exactly, so the tests state which locator finds which element
//! instead of relying on a selector engine. Every driver call is appended to a
//! call history that tests can assert on.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::Viewport;
use crate::driver::{BrowserDriver, ElementHandle, WindowHandle};
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};

/// What a click does to the mock DOM
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClickEffect {
    /// Nothing beyond recording the click
    #[default]
    None,
    /// Flip the checked state (checkbox)
    Toggle,
    /// Set the checked state (radio)
    Check,
    /// Flip `aria-checked` on another element
    ToggleAria {
        /// Element whose attribute flips
        target: String,
    },
    /// Make another element visible
    Reveal {
        /// Element to show
        target: String,
    },
    /// Copy this element's text into another element
    Choose {
        /// Element receiving the text
        target: String,
    },
}

/// A single element of the mock DOM
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Locator the element was registered under first
    pub locator: Locator,
    /// Lowercase tag name
    pub tag: String,
    /// Live `value` property
    pub value: Option<String>,
    /// Inner text
    pub text: String,
    /// Other attributes
    pub attributes: HashMap<String, String>,
    /// Rendered and visible
    pub visible: bool,
    /// Accepts input
    pub enabled: bool,
    /// Checked state
    pub checked: bool,
    /// `<select>` option texts
    pub options: Vec<String>,
    /// Index of the selected option
    pub selected: Option<usize>,
    /// Escape clears the value, like a date picker that rejects typed input
    pub clears_on_escape: bool,
    /// Results for `evaluate_on`, keyed by function source
    pub script_results: HashMap<String, serde_json::Value>,
    /// Click behaviour
    pub on_click: ClickEffect,
}

impl MockElement {
    /// Visible, enabled element with no value
    #[must_use]
    pub fn new(tag: &str, locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            tag: tag.to_lowercase(),
            value: None,
            text: String::new(),
            attributes: HashMap::new(),
            visible: true,
            enabled: true,
            checked: false,
            options: Vec::new(),
            selected: None,
            clears_on_escape: false,
            script_results: HashMap::new(),
            on_click: ClickEffect::None,
        }
    }

    /// Empty `<input>`
    #[must_use]
    pub fn input(locator: impl Into<Locator>) -> Self {
        Self::new("input", locator).with_value("")
    }

    /// Empty `<textarea>`
    #[must_use]
    pub fn textarea(locator: impl Into<Locator>) -> Self {
        Self::new("textarea", locator).with_value("")
    }

    /// Checkbox input that toggles on click
    #[must_use]
    pub fn checkbox(locator: impl Into<Locator>) -> Self {
        Self::input(locator)
            .with_attribute("type", "checkbox")
            .with_click(ClickEffect::Toggle)
    }

    /// Radio input that checks on click
    #[must_use]
    pub fn radio(locator: impl Into<Locator>) -> Self {
        Self::input(locator)
            .with_attribute("type", "radio")
            .with_click(ClickEffect::Check)
    }

    /// `<select>` with the given options and nothing selected
    #[must_use]
    pub fn select(locator: impl Into<Locator>, options: &[&str]) -> Self {
        let mut element = Self::new("select", locator);
        element.options = options.iter().map(|o| (*o).to_string()).collect();
        element
    }

    /// Read-only text element
    #[must_use]
    pub fn label(locator: impl Into<Locator>, text: &str) -> Self {
        Self::new("span", locator).with_text(text)
    }

    /// Set the value property
    #[must_use]
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Set the inner text
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        let _ = self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the click behaviour
    #[must_use]
    pub fn with_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }

    /// Result returned when `function` is evaluated on this element
    #[must_use]
    pub fn with_script_result(mut self, function: &str, result: serde_json::Value) -> Self {
        let _ = self.script_results.insert(function.to_string(), result);
        self
    }

    /// Not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Not accepting input
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Initially checked
    #[must_use]
    pub const fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Preselect an option by text
    #[must_use]
    pub fn with_selected(mut self, text: &str) -> Self {
        self.selected = self.options.iter().position(|o| o == text);
        self
    }

    /// Escape clears the typed value
    #[must_use]
    pub const fn clearing_on_escape(mut self) -> Self {
        self.clears_on_escape = true;
        self
    }
}

/// Element ids created by [`MockDriver::add_table`]
#[derive(Debug, Clone)]
pub struct MockTable {
    /// The `<table>` element
    pub table: String,
    /// Body rows, in order
    pub rows: Vec<String>,
}

#[derive(Debug)]
struct Alias {
    id: String,
    scope: Option<String>,
    locator: Locator,
}

#[derive(Debug, Default)]
struct MockState {
    elements: HashMap<String, MockElement>,
    aliases: Vec<Alias>,
    windows: Vec<WindowHandle>,
    pending_windows: Vec<(u32, WindowHandle)>,
    current: usize,
    back_stack: Vec<String>,
    routes: HashMap<String, String>,
    scripts: HashMap<String, serde_json::Value>,
    viewport: Option<Viewport>,
    quit: bool,
    call_history: Vec<String>,
}

impl MockState {
    fn record(&mut self, call: String) {
        debug!(call = %call, "mock driver call");
        self.call_history.push(call);
    }

    fn matches(&self, scope: Option<&str>, locator: &Locator) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|a| a.scope.as_deref() == scope && &a.locator == locator)
            .map(|a| a.id.clone())
            .collect()
    }

    fn handle(&self, id: &str) -> Option<ElementHandle> {
        self.elements
            .get(id)
            .map(|e| ElementHandle::new(id, e.tag.clone()))
    }

    fn element(&self, handle: &ElementHandle) -> PagewrightResult<&MockElement> {
        self.elements
            .get(&handle.id)
            .ok_or_else(|| PagewrightError::driver(format!("stale element handle {}", handle.id)))
    }

    fn element_mut(&mut self, handle: &ElementHandle) -> PagewrightResult<&mut MockElement> {
        self.elements
            .get_mut(&handle.id)
            .ok_or_else(|| PagewrightError::driver(format!("stale element handle {}", handle.id)))
    }

    fn window(&self) -> PagewrightResult<&WindowHandle> {
        self.windows
            .get(self.current)
            .ok_or_else(|| PagewrightError::driver("no open windows"))
    }

    fn window_mut(&mut self) -> PagewrightResult<&mut WindowHandle> {
        let current = self.current;
        self.windows
            .get_mut(current)
            .ok_or_else(|| PagewrightError::driver("no open windows"))
    }
}

/// Mock driver for unit testing
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Mock with a single blank window and an empty document
    #[must_use]
    pub fn new() -> Self {
        let state = MockState {
            windows: vec![WindowHandle::new(new_id(), "", "about:blank")],
            ..MockState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element at document level, returning its id
    pub fn add(&self, element: MockElement) -> String {
        self.insert(None, element)
    }

    /// Add an element inside `parent`, returning its id
    pub fn add_child(&self, parent: &str, element: MockElement) -> String {
        self.insert(Some(parent.to_string()), element)
    }

    fn insert(&self, scope: Option<String>, element: MockElement) -> String {
        let id = new_id();
        let mut state = self.lock();
        state.aliases.push(Alias {
            id: id.clone(),
            scope,
            locator: element.locator.clone(),
        });
        let _ = state.elements.insert(id.clone(), element);
        id
    }

    /// Make an existing element also reachable through `locator` in `scope`
    pub fn alias(&self, id: &str, scope: Option<&str>, locator: impl Into<Locator>) {
        self.lock().aliases.push(Alias {
            id: id.to_string(),
            scope: scope.map(str::to_string),
            locator: locator.into(),
        });
    }

    /// Build a grid.
    ///
    /// Registers `th` cells inside the table, `tbody tr` rows inside the table
    /// and at document level under [`Locator::row`], and `td:nth-child(k)` cells
    /// both inside their row and inside the table.
    pub fn add_table(&self, table: &Locator, headers: &[&str], rows: &[&[&str]]) -> MockTable {
        let table_id = self.add(MockElement::new("table", table.clone()));
        for header in headers {
            let _ = self.add_child(&table_id, MockElement::new("th", "th").with_text(header));
        }
        let row_ids = rows
            .iter()
            .enumerate()
            .map(|(index, cells)| {
                let row_id = self.add_child(&table_id, MockElement::new("tr", "tbody tr"));
                self.alias(&row_id, None, table.row(index + 1));
                for (column, cell) in cells.iter().enumerate() {
                    let cell_locator = Locator::css(format!("td:nth-child({})", column + 1));
                    let cell_id = self.add_child(
                        &row_id,
                        MockElement::new("td", cell_locator.clone()).with_text(cell),
                    );
                    self.alias(&cell_id, Some(&table_id), cell_locator);
                }
                row_id
            })
            .collect();
        MockTable {
            table: table_id,
            rows: row_ids,
        }
    }

    /// Open another window immediately
    pub fn add_window(&self, title: &str, url: &str) -> WindowHandle {
        let window = WindowHandle::new(new_id(), title, url);
        self.lock().windows.push(window.clone());
        window
    }

    /// Open a window that shows up on the `after`-th enumeration
    pub fn open_window_later(&self, title: &str, url: &str, after: u32) {
        let window = WindowHandle::new(new_id(), title, url);
        self.lock().pending_windows.push((after, window));
    }

    /// Title a URL receives when navigated to
    pub fn route(&self, url: &str, title: &str) {
        let _ = self.lock().routes.insert(url.to_string(), title.to_string());
    }

    /// Result returned when `script` is evaluated in the page
    pub fn set_script_result(&self, script: &str, result: serde_json::Value) {
        let _ = self.lock().scripts.insert(script.to_string(), result);
    }

    /// Show or hide an element
    pub fn set_visible(&self, id: &str, visible: bool) {
        if let Some(element) = self.lock().elements.get_mut(id) {
            element.visible = visible;
        }
    }

    /// Change what clicking an element does
    pub fn set_click(&self, id: &str, effect: ClickEffect) {
        if let Some(element) = self.lock().elements.get_mut(id) {
            element.on_click = effect;
        }
    }

    /// Snapshot of an element
    #[must_use]
    pub fn element(&self, id: &str) -> Option<MockElement> {
        self.lock().elements.get(id).cloned()
    }

    /// Value of the first document-level element registered under `locator`
    #[must_use]
    pub fn value_of(&self, locator: impl Into<Locator>) -> Option<String> {
        let state = self.lock();
        state
            .matches(None, &locator.into())
            .first()
            .and_then(|id| state.elements.get(id))
            .and_then(|e| e.value.clone())
    }

    /// Last viewport set
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.lock().viewport
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(method))
    }

    /// Number of calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn not_found(locator: &Locator) -> PagewrightError {
    PagewrightError::ElementNotFound {
        locator: locator.to_string(),
    }
}

fn timeout(timeout: Duration, message: String) -> PagewrightError {
    PagewrightError::Timeout {
        ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        message,
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> PagewrightResult<()> {
        let mut state = self.lock();
        state.record(format!("navigate:{url}"));
        let title = state.routes.get(url).cloned().unwrap_or_default();
        let previous = state.window()?.url.clone();
        state.back_stack.push(previous);
        let window = state.window_mut()?;
        window.url = url.to_string();
        window.title = title;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> PagewrightResult<ElementHandle> {
        let state = self.lock();
        state
            .matches(None, locator)
            .first()
            .and_then(|id| state.handle(id))
            .ok_or_else(|| not_found(locator))
    }

    async fn find_elements(&self, locator: &Locator) -> PagewrightResult<Vec<ElementHandle>> {
        let state = self.lock();
        Ok(state
            .matches(None, locator)
            .iter()
            .filter_map(|id| state.handle(id))
            .collect())
    }

    async fn find_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<ElementHandle> {
        let state = self.lock();
        state
            .matches(Some(&parent.id), locator)
            .first()
            .and_then(|id| state.handle(id))
            .ok_or_else(|| not_found(locator))
    }

    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<Vec<ElementHandle>> {
        let state = self.lock();
        Ok(state
            .matches(Some(&parent.id), locator)
            .iter()
            .filter_map(|id| state.handle(id))
            .collect())
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let mut state = self.lock();
        let target = state.element_mut(element)?;
        if !target.enabled {
            return Err(PagewrightError::driver(format!(
                "element {} is disabled",
                target.locator
            )));
        }
        target.value = Some(text.to_string());
        let call = format!("fill:{}:{text}", target.locator);
        state.record(call);
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> PagewrightResult<()> {
        let mut state = self.lock();
        let target = state.element_mut(element)?;
        let effect = target.on_click.clone();
        let call = format!("click:{}", target.locator);
        let own_text = target.text.clone();
        match &effect {
            ClickEffect::Toggle => target.checked = !target.checked,
            ClickEffect::Check => target.checked = true,
            _ => {}
        }
        match effect {
            ClickEffect::ToggleAria { target } => {
                if let Some(other) = state.elements.get_mut(&target) {
                    let next = if other.attributes.get("aria-checked").map(String::as_str)
                        == Some("true")
                    {
                        "false"
                    } else {
                        "true"
                    };
                    let _ = other
                        .attributes
                        .insert("aria-checked".to_string(), next.to_string());
                }
            }
            ClickEffect::Reveal { target } => {
                if let Some(other) = state.elements.get_mut(&target) {
                    other.visible = true;
                }
            }
            ClickEffect::Choose { target } => {
                if let Some(other) = state.elements.get_mut(&target) {
                    other.text = own_text;
                }
            }
            ClickEffect::None | ClickEffect::Toggle | ClickEffect::Check => {}
        }
        state.record(call);
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> PagewrightResult<Option<String>> {
        let state = self.lock();
        let target = state.element(element)?;
        if name == "value" && target.value.is_some() {
            return Ok(target.value.clone());
        }
        Ok(target.attributes.get(name).cloned())
    }

    async fn text(&self, element: &ElementHandle) -> PagewrightResult<String> {
        Ok(self.lock().element(element)?.text.clone())
    }

    async fn is_visible(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self.lock().element(element)?.visible)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self.lock().element(element)?.enabled)
    }

    async fn is_checked(&self, element: &ElementHandle) -> PagewrightResult<bool> {
        Ok(self.lock().element(element)?.checked)
    }

    async fn select_option(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()> {
        let mut state = self.lock();
        let target = state.element_mut(element)?;
        let position = target.options.iter().position(|o| o.trim() == text.trim());
        let Some(position) = position else {
            return Err(PagewrightError::OptionNotFound {
                value: text.to_string(),
                locator: target.locator.to_string(),
            });
        };
        target.selected = Some(position);
        let call = format!("select:{}:{text}", target.locator);
        state.record(call);
        Ok(())
    }

    async fn selected_option_text(
        &self,
        element: &ElementHandle,
    ) -> PagewrightResult<Option<String>> {
        let state = self.lock();
        let target = state.element(element)?;
        Ok(target
            .selected
            .and_then(|index| target.options.get(index))
            .cloned())
    }

    async fn press_key(&self, element: &ElementHandle, key: &str) -> PagewrightResult<()> {
        let mut state = self.lock();
        let target = state.element_mut(element)?;
        if key == "Escape" && target.clears_on_escape {
            target.value = Some(String::new());
        }
        let call = format!("press:{}:{key}", target.locator);
        state.record(call);
        Ok(())
    }

    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> PagewrightResult<serde_json::Value> {
        let mut state = self.lock();
        let target = state.element(element)?;
        let result = target
            .script_results
            .get(function)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let call = format!("evaluate_on:{}", target.locator);
        state.record(call);
        Ok(result)
    }

    async fn evaluate(
        &self,
        script: &str,
        _args: Vec<serde_json::Value>,
    ) -> PagewrightResult<serde_json::Value> {
        let mut state = self.lock();
        state.record(format!("evaluate:{script}"));
        Ok(state
            .scripts
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn wait_until_visible(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> PagewrightResult<ElementHandle> {
        let state = self.lock();
        state
            .matches(None, locator)
            .iter()
            .find(|id| state.elements.get(*id).is_some_and(|e| e.visible))
            .and_then(|id| state.handle(id))
            .ok_or_else(|| timeout(wait, format!("waiting for {locator} to be visible")))
    }

    async fn wait_until_hidden(&self, locator: &Locator, wait: Duration) -> PagewrightResult<()> {
        let state = self.lock();
        let shown = state
            .matches(None, locator)
            .iter()
            .any(|id| state.elements.get(id).is_some_and(|e| e.visible));
        if shown {
            return Err(timeout(wait, format!("waiting for {locator} to be hidden")));
        }
        Ok(())
    }

    async fn windows(&self) -> PagewrightResult<Vec<WindowHandle>> {
        let mut state = self.lock();
        state.record("windows".to_string());
        let pending = std::mem::take(&mut state.pending_windows);
        for (remaining, window) in pending {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                state.windows.push(window);
            } else {
                state.pending_windows.push((remaining, window));
            }
        }
        Ok(state.windows.clone())
    }

    async fn current_window(&self) -> PagewrightResult<WindowHandle> {
        Ok(self.lock().window()?.clone())
    }

    async fn switch_to_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        let mut state = self.lock();
        let index = state
            .windows
            .iter()
            .position(|w| w.id == window.id)
            .ok_or_else(|| PagewrightError::driver(format!("no such window {}", window.id)))?;
        state.current = index;
        state.record(format!("switch:{}", window.title));
        Ok(())
    }

    async fn close_window(&self, window: &WindowHandle) -> PagewrightResult<()> {
        let mut state = self.lock();
        let index = state
            .windows
            .iter()
            .position(|w| w.id == window.id)
            .ok_or_else(|| PagewrightError::driver(format!("no such window {}", window.id)))?;
        let _ = state.windows.remove(index);
        if state.current >= index && state.current > 0 {
            state.current -= 1;
        }
        state.record(format!("close:{}", window.title));
        Ok(())
    }

    async fn title(&self) -> PagewrightResult<String> {
        Ok(self.lock().window()?.title.clone())
    }

    async fn current_url(&self) -> PagewrightResult<String> {
        Ok(self.lock().window()?.url.clone())
    }

    async fn reload(&self) -> PagewrightResult<()> {
        self.lock().record("reload".to_string());
        Ok(())
    }

    async fn go_back(&self) -> PagewrightResult<()> {
        let mut state = self.lock();
        state.record("go_back".to_string());
        if let Some(previous) = state.back_stack.pop() {
            let title = state.routes.get(&previous).cloned().unwrap_or_default();
            let window = state.window_mut()?;
            window.url = previous;
            window.title = title;
        }
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> PagewrightResult<()> {
        let mut state = self.lock();
        state.viewport = Some(viewport);
        state.record(format!("set_viewport:{}x{}", viewport.width, viewport.height));
        Ok(())
    }

    async fn quit(&self) -> PagewrightResult<()> {
        let mut state = self.lock();
        state.quit = true;
        state.record("quit".to_string());
        Ok(())
    }
}
