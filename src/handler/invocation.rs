use super::value::ArgumentValue;
use crate::context::{Principal, RequestContext};
use crate::error::HandlerError;
use crate::model::{AttributeValue, ModelContainer, ModelMap, RedirectAttributes, SessionStatus};
use serde::de::DeserializeOwned;

/// Resolved arguments plus access to the live model and request, handed to
/// a handler callable.
pub struct Invocation<'a> {
    args: Vec<ArgumentValue>,
    container: &'a mut ModelContainer,
    ctx: &'a RequestContext,
}

impl<'a> Invocation<'a> {
    pub fn new(
        args: Vec<ArgumentValue>,
        container: &'a mut ModelContainer,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            args,
            container,
            ctx,
        }
    }

    #[must_use]
    pub fn args(&self) -> &[ArgumentValue] {
        &self.args
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&ArgumentValue> {
        self.args.get(index)
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<&AttributeValue> {
        self.arg(index).and_then(ArgumentValue::as_value)
    }

    #[must_use]
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(|v| v.value().as_str())
    }

    #[must_use]
    pub fn i64_arg(&self, index: usize) -> Option<i64> {
        self.value(index).and_then(|v| v.value().as_i64())
    }

    #[must_use]
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        self.value(index).and_then(|v| v.value().as_bool())
    }

    /// Deserialize an object argument into a Rust type.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<T, HandlerError> {
        let value = self
            .value(index)
            .ok_or_else(|| format!("argument #{index} has no value"))?;
        Ok(serde_json::from_value(value.value().clone())?)
    }

    #[must_use]
    pub fn locale(&self) -> String {
        self.ctx.locale()
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.ctx.principal()
    }

    /// The active model.
    pub fn model(&mut self) -> &mut ModelMap {
        self.container.model_mut()
    }

    pub fn container(&mut self) -> &mut ModelContainer {
        self.container
    }

    pub fn session_status(&mut self) -> &mut SessionStatus {
        self.container.session_status_mut()
    }

    /// Present once a `RedirectAttributes` parameter has been resolved.
    pub fn redirect_attributes(&mut self) -> Option<&mut RedirectAttributes> {
        self.container.redirect_model_mut()
    }

    #[must_use]
    pub fn request(&self) -> &RequestContext {
        self.ctx
    }
}
