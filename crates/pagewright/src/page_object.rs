//! Page Object Model support.
//!
//! Page objects are plain data: a kind, a name, a workflow namespace and a
//! table of named locators. They are registered once at suite start in a
//! [`PageObjectRegistry`] and looked up by convention from step text:
//!
//! ```text
//! <namespace>.<workflow>[.section|.grids|.dialogs|.tabs.<page>].<Name>
//! ```
//!
//! Lookups are ordinary map reads. A miss is a typed error that names the
//! path or field the suite author has to create.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::locator::Locator;
use crate::naming::{field_name, page_object_name};
use crate::result::{PagewrightError, PagewrightResult};

/// Default namespace that conventional paths start from
pub const DEFAULT_NAMESPACE: &str = "pages";

/// Kind of page object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageObjectKind {
    /// A full page
    Page,
    /// A section within a page
    Section,
    /// A grid or table region
    Grid,
    /// A modal dialog
    Dialog,
    /// A tab belonging to a page
    Tab {
        /// Name of the owning page as written in step text
        page: String,
    },
}

impl PageObjectKind {
    /// Label used in messages
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::Section => "Section",
            Self::Grid => "Grid",
            Self::Dialog => "Dialog",
            Self::Tab { .. } => "Tab",
        }
    }

    /// Field that every page object of this kind declares to prove it rendered
    #[must_use]
    pub const fn loaded_marker(&self) -> &'static str {
        match self {
            Self::Page => "PAGE_LOADED",
            Self::Section => "SECTION_LOADED",
            Self::Grid => "GRID_LOADED",
            Self::Dialog => "DIALOG_LOADED",
            Self::Tab { .. } => "TAB_LOADED",
        }
    }

    fn path_segment(&self) -> Option<String> {
        match self {
            Self::Page => None,
            Self::Section => Some("section".to_string()),
            Self::Grid => Some("grids".to_string()),
            Self::Dialog => Some("dialogs".to_string()),
            Self::Tab { page } => Some(format!("tabs.{}", page_object_name(page).to_lowercase())),
        }
    }

    /// Parse a kind from step text ("page", "section", "grid", "dialog")
    ///
    /// Tabs need an owning page and are built directly.
    pub fn parse(text: &str) -> PagewrightResult<Self> {
        match text.trim().to_lowercase().as_str() {
            "page" => Ok(Self::Page),
            "section" => Ok(Self::Section),
            "grid" => Ok(Self::Grid),
            "dialog" => Ok(Self::Dialog),
            other => Err(PagewrightError::InvalidArgument {
                argument: "page object kind".to_string(),
                value: other.to_string(),
                accepted: ["page", "section", "grid", "dialog"]
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            }),
        }
    }
}

impl fmt::Display for PageObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a declared locator may be resolved from step text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Resolvable
    Public,
    /// Declared for internal use by the page object only
    Private,
}

#[derive(Debug, Clone)]
struct LocatorEntry {
    locator: Locator,
    visibility: Visibility,
}

/// Declarative description of one page, section, grid, dialog or tab
#[derive(Debug, Clone)]
pub struct PageObjectDescriptor {
    kind: PageObjectKind,
    name: String,
    workflow: Option<String>,
    default_url: Option<String>,
    locators: HashMap<String, LocatorEntry>,
}

impl PageObjectDescriptor {
    /// Start building a descriptor. `name` is normalized like step text.
    #[must_use]
    pub fn builder(kind: PageObjectKind, name: &str) -> PageObjectBuilder {
        PageObjectBuilder::new(kind, name)
    }

    /// Kind of this page object
    #[must_use]
    pub const fn kind(&self) -> &PageObjectKind {
        &self.kind
    }

    /// Normalized name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Workflow namespace, if any
    #[must_use]
    pub fn workflow(&self) -> Option<&str> {
        self.workflow.as_deref()
    }

    /// URL opened by "navigate to" steps
    #[must_use]
    pub fn default_url(&self) -> Option<&str> {
        self.default_url.as_deref()
    }

    /// Path of this descriptor under `namespace`
    #[must_use]
    pub fn path_in(&self, namespace: &str) -> String {
        conventional_path(namespace, &self.kind, &self.name, self.workflow.as_deref())
    }

    /// Canonical names of resolvable locators, sorted
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .locators
            .iter()
            .filter(|(_, e)| e.visibility == Visibility::Public)
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

fn conventional_path(
    namespace: &str,
    kind: &PageObjectKind,
    name: &str,
    workflow: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);
    if !namespace.is_empty() {
        parts.push(namespace.to_string());
    }
    if let Some(workflow) = workflow {
        parts.push(page_object_name(workflow).to_lowercase());
    }
    if let Some(segment) = kind.path_segment() {
        parts.push(segment);
    }
    parts.push(page_object_name(name));
    parts.join(".")
}

/// Builder for [`PageObjectDescriptor`]
#[derive(Debug, Clone)]
pub struct PageObjectBuilder {
    descriptor: PageObjectDescriptor,
}

impl PageObjectBuilder {
    fn new(kind: PageObjectKind, name: &str) -> Self {
        Self {
            descriptor: PageObjectDescriptor {
                kind,
                name: page_object_name(name),
                workflow: None,
                default_url: None,
                locators: HashMap::new(),
            },
        }
    }

    /// Set the workflow namespace
    #[must_use]
    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.descriptor.workflow = Some(workflow.into());
        self
    }

    /// Set the default URL
    #[must_use]
    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.descriptor.default_url = Some(url.into());
        self
    }

    /// Add a resolvable locator. The name is normalized like step text.
    #[must_use]
    pub fn with_locator(self, name: &str, locator: impl Into<Locator>) -> Self {
        self.with_entry(name, locator.into(), Visibility::Public)
    }

    /// Add a locator that step text may not resolve
    #[must_use]
    pub fn with_private_locator(self, name: &str, locator: impl Into<Locator>) -> Self {
        self.with_entry(name, locator.into(), Visibility::Private)
    }

    /// Add the kind's loaded-marker locator
    #[must_use]
    pub fn with_loaded_marker(self, locator: impl Into<Locator>) -> Self {
        let marker = self.descriptor.kind.loaded_marker();
        self.with_entry(marker, locator.into(), Visibility::Public)
    }

    fn with_entry(mut self, name: &str, locator: Locator, visibility: Visibility) -> Self {
        let _ = self.descriptor.locators.insert(
            field_name(name),
            LocatorEntry {
                locator,
                visibility,
            },
        );
        self
    }

    /// Finish the descriptor
    #[must_use]
    pub fn build(self) -> PageObjectDescriptor {
        self.descriptor
    }
}

/// Typed page objects that can describe themselves.
///
/// # Example
///
/// ```
/// use pagewright::page_object::{PageObject, PageObjectKind};
/// use pagewright::Locator;
///
/// struct LoginPage;
///
/// impl PageObject for LoginPage {
///     fn name(&self) -> &str {
///         "Login"
///     }
///
///     fn workflow(&self) -> Option<&str> {
///         Some("Main")
///     }
///
///     fn locators(&self) -> Vec<(&str, Locator)> {
///         vec![
///             ("PAGE_LOADED", Locator::css("form#login")),
///             ("Email", Locator::css("input[name='email']")),
///         ]
///     }
/// }
///
/// let descriptor = LoginPage.descriptor();
/// assert_eq!(descriptor.path_in("pages"), "pages.main.Login");
/// ```
pub trait PageObject {
    /// Kind of page object
    fn kind(&self) -> PageObjectKind {
        PageObjectKind::Page
    }

    /// Name as written in step text
    fn name(&self) -> &str;

    /// Workflow namespace
    fn workflow(&self) -> Option<&str> {
        None
    }

    /// URL opened by "navigate to" steps
    fn default_url(&self) -> Option<&str> {
        None
    }

    /// Named locators
    fn locators(&self) -> Vec<(&str, Locator)>;

    /// Build the registrable descriptor
    fn descriptor(&self) -> PageObjectDescriptor {
        let mut builder = PageObjectDescriptor::builder(self.kind(), self.name());
        if let Some(workflow) = self.workflow() {
            builder = builder.with_workflow(workflow);
        }
        if let Some(url) = self.default_url() {
            builder = builder.with_default_url(url);
        }
        self.locators()
            .into_iter()
            .fold(builder, |b, (name, locator)| b.with_locator(name, locator))
            .build()
    }
}

/// A locator together with the page object that declared it
#[derive(Debug, Clone)]
pub struct ResolvedLocator {
    /// The locator
    pub locator: Locator,
    /// Declaring page object
    pub descriptor: Arc<PageObjectDescriptor>,
}

/// Registry of page objects keyed by conventional path
#[derive(Debug)]
pub struct PageObjectRegistry {
    namespace: String,
    descriptors: HashMap<String, Arc<PageObjectDescriptor>>,
}

impl Default for PageObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PageObjectRegistry {
    /// Create an empty registry under the default namespace
    #[must_use]
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Create an empty registry under `namespace`
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            descriptors: HashMap::new(),
        }
    }

    /// Namespace paths start from
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register a descriptor, replacing any at the same path
    pub fn register(&mut self, descriptor: PageObjectDescriptor) -> Arc<PageObjectDescriptor> {
        let path = descriptor.path_in(&self.namespace);
        debug!(path = %path, fields = descriptor.locators.len(), "registered page object");
        let descriptor = Arc::new(descriptor);
        let _ = self.descriptors.insert(path, Arc::clone(&descriptor));
        descriptor
    }

    /// Register a typed page object
    pub fn register_object<P: PageObject + ?Sized>(
        &mut self,
        page_object: &P,
    ) -> Arc<PageObjectDescriptor> {
        self.register(page_object.descriptor())
    }

    /// Number of registered page objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Conventional path for a page object
    #[must_use]
    pub fn path_for(&self, kind: &PageObjectKind, name: &str, workflow: Option<&str>) -> String {
        conventional_path(&self.namespace, kind, name, workflow)
    }

    /// Find the page object for step text
    pub fn resolve_descriptor(
        &self,
        kind: &PageObjectKind,
        name: &str,
        workflow: Option<&str>,
    ) -> PagewrightResult<Arc<PageObjectDescriptor>> {
        let path = self.path_for(kind, name, workflow);
        self.descriptors
            .get(&path)
            .cloned()
            .ok_or_else(|| PagewrightError::DescriptorNotFound {
                kind: kind.label().to_string(),
                path,
            })
    }

    /// Find a field's locator on a resolved page object
    pub fn resolve_locator(
        &self,
        descriptor: &Arc<PageObjectDescriptor>,
        field: &str,
    ) -> PagewrightResult<ResolvedLocator> {
        let key = field_name(field);
        match descriptor.locators.get(&key) {
            Some(entry) if entry.visibility == Visibility::Public => Ok(ResolvedLocator {
                locator: entry.locator.clone(),
                descriptor: Arc::clone(descriptor),
            }),
            Some(_) => Err(PagewrightError::LocatorAccess {
                field: key,
                path: descriptor.path_in(&self.namespace),
            }),
            None => Err(PagewrightError::LocatorNotFound {
                field: key,
                path: descriptor.path_in(&self.namespace),
            }),
        }
    }

    /// Resolve page object and field in one call
    pub fn resolve_field(
        &self,
        kind: &PageObjectKind,
        name: &str,
        workflow: Option<&str>,
        field: &str,
    ) -> PagewrightResult<ResolvedLocator> {
        let descriptor = self.resolve_descriptor(kind, name, workflow)?;
        self.resolve_locator(&descriptor, field)
    }
}
