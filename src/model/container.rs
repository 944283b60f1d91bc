use super::map::ModelMap;
use super::value::AttributeValue;
use crate::error::DispatchError;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Prefix that turns a view name into a redirect.
pub const REDIRECT_URL_PREFIX: &str = "redirect:";

/// Opaque view object handed to the rendering collaborator.
pub trait View: Send + Sync + fmt::Debug {
    /// Redirecting views switch the container into the redirect scenario.
    fn is_redirect(&self) -> bool {
        false
    }
}

/// Either a symbolic view name or a view object.
#[derive(Debug, Clone)]
pub enum ViewSelector {
    Name(String),
    View(Arc<dyn View>),
}

impl ViewSelector {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            ViewSelector::Name(name) => Some(name),
            ViewSelector::View(_) => None,
        }
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        match self {
            ViewSelector::Name(name) => name.starts_with(REDIRECT_URL_PREFIX),
            ViewSelector::View(view) => view.is_redirect(),
        }
    }
}

impl PartialEq for ViewSelector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ViewSelector::Name(a), ViewSelector::Name(b)) => a == b,
            (ViewSelector::View(a), ViewSelector::View(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ViewSelector {
    fn from(name: &str) -> Self {
        ViewSelector::Name(name.to_string())
    }
}

impl From<String> for ViewSelector {
    fn from(name: String) -> Self {
        ViewSelector::Name(name)
    }
}

/// Handle a handler uses to declare its conversational session finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatus {
    complete: bool,
}

impl SessionStatus {
    pub fn set_complete(&mut self) {
        self.complete = true;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Dedicated model for the redirect scenario, plus flash attributes that
/// survive the redirect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectAttributes {
    attributes: ModelMap,
    flash: ModelMap,
}

impl RedirectAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.add_attribute(name, value);
    }

    pub fn add_flash_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.flash.add_attribute(name, value);
    }

    #[must_use]
    pub fn attributes(&self) -> &ModelMap {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ModelMap {
        &mut self.attributes
    }

    #[must_use]
    pub fn flash_attributes(&self) -> &ModelMap {
        &self.flash
    }
}

/// Per-request model and view state.
///
/// `model()` returns the default model unless the container is in a redirect
/// scenario and either a redirect model has been set or falling back to the
/// default model is disabled. When fallback is disabled a fresh redirect
/// model is created as soon as the redirect scenario starts.
#[derive(Debug, Default)]
pub struct ModelContainer {
    ignore_default_model_on_redirect: bool,
    view: Option<ViewSelector>,
    default_model: ModelMap,
    redirect_model: Option<RedirectAttributes>,
    redirect_model_scenario: bool,
    session_status: SessionStatus,
    request_handled: bool,
}

impl ModelContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ignore_default_model_on_redirect(&mut self, ignore: bool) {
        self.ignore_default_model_on_redirect = ignore;
        self.ensure_redirect_model();
    }

    #[must_use]
    pub fn ignore_default_model_on_redirect(&self) -> bool {
        self.ignore_default_model_on_redirect
    }

    /// True when [`model`](Self::model) returns the default model.
    #[must_use]
    pub fn uses_default_model(&self) -> bool {
        !self.redirect_model_scenario
            || (self.redirect_model.is_none() && !self.ignore_default_model_on_redirect)
    }

    /// The active model.
    #[must_use]
    pub fn model(&self) -> &ModelMap {
        match (&self.redirect_model, self.uses_default_model()) {
            (Some(redirect), false) => redirect.attributes(),
            _ => &self.default_model,
        }
    }

    /// The active model, mutable.
    pub fn model_mut(&mut self) -> &mut ModelMap {
        let use_default = self.uses_default_model();
        match (&mut self.redirect_model, use_default) {
            (Some(redirect), false) => redirect.attributes_mut(),
            _ => &mut self.default_model,
        }
    }

    /// The default model regardless of the redirect scenario.
    #[must_use]
    pub fn default_model(&self) -> &ModelMap {
        &self.default_model
    }

    pub fn default_model_mut(&mut self) -> &mut ModelMap {
        &mut self.default_model
    }

    /// Provide the dedicated redirect model.
    pub fn set_redirect_model(&mut self, redirect: RedirectAttributes) {
        self.redirect_model = Some(redirect);
    }

    #[must_use]
    pub fn redirect_model(&self) -> Option<&RedirectAttributes> {
        self.redirect_model.as_ref()
    }

    pub fn redirect_model_mut(&mut self) -> Option<&mut RedirectAttributes> {
        self.redirect_model.as_mut()
    }

    pub fn set_redirect_model_scenario(&mut self, redirect: bool) {
        self.redirect_model_scenario = redirect;
        self.ensure_redirect_model();
    }

    #[must_use]
    pub fn is_redirect_model_scenario(&self) -> bool {
        self.redirect_model_scenario
    }

    pub fn set_view(&mut self, view: impl Into<ViewSelector>) {
        self.view = Some(view.into());
    }

    pub fn set_view_name(&mut self, name: impl Into<String>) {
        self.view = Some(ViewSelector::Name(name.into()));
    }

    #[must_use]
    pub fn view(&self) -> Option<&ViewSelector> {
        self.view.as_ref()
    }

    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view.as_ref().and_then(ViewSelector::name)
    }

    #[must_use]
    pub fn is_view_reference(&self) -> bool {
        matches!(self.view, Some(ViewSelector::Name(_)))
    }

    #[must_use]
    pub fn session_status(&self) -> &SessionStatus {
        &self.session_status
    }

    pub fn session_status_mut(&mut self) -> &mut SessionStatus {
        &mut self.session_status
    }

    pub fn set_request_handled(&mut self, handled: bool) {
        self.request_handled = handled;
    }

    #[must_use]
    pub fn is_request_handled(&self) -> bool {
        self.request_handled
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.model_mut().add_attribute(name, value);
    }

    /// Add under the value's conventional name.
    pub fn add_value(&mut self, value: AttributeValue) -> Result<(), DispatchError> {
        self.model_mut().add_value(value)
    }

    pub fn add_all_attributes(&mut self, attributes: &ModelMap) {
        self.model_mut().add_all(attributes);
    }

    /// Copy attributes whose names are not present yet.
    pub fn merge_attributes(&mut self, attributes: &ModelMap) {
        self.model_mut().merge_attributes(attributes);
    }

    pub fn remove_attributes(&mut self, attributes: &ModelMap) {
        let model = self.model_mut();
        for name in attributes.names() {
            model.remove(name);
        }
    }

    #[must_use]
    pub fn contains_attribute(&self, name: &str) -> bool {
        self.model().contains(name)
    }

    fn ensure_redirect_model(&mut self) {
        if self.redirect_model_scenario
            && self.ignore_default_model_on_redirect
            && self.redirect_model.is_none()
        {
            self.redirect_model = Some(RedirectAttributes::new());
        }
    }

    /// Snapshot the container into the outbound result.
    #[must_use]
    pub fn to_model_and_view(&self, status: Option<StatusCode>) -> ModelAndView {
        let output_flash = match (&self.redirect_model, self.uses_default_model()) {
            (Some(redirect), false) => redirect.flash_attributes().clone(),
            _ => ModelMap::new(),
        };
        ModelAndView {
            view: self.view.clone(),
            model: self.model().clone(),
            status,
            output_flash,
        }
    }
}

/// View selection plus model, either returned by a handler or produced as
/// the final result of a dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAndView {
    pub view: Option<ViewSelector>,
    pub model: ModelMap,
    pub status: Option<StatusCode>,
    /// Flash attributes to hand to the next request after a redirect.
    pub output_flash: ModelMap,
}

impl ModelAndView {
    #[must_use]
    pub fn new(view: impl Into<ViewSelector>) -> Self {
        Self {
            view: Some(view.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.model.add_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view.as_ref().and_then(ViewSelector::name)
    }
}
