use super::composite::ReturnValueHandler;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ReturnType, ReturnValue};
use crate::model::{AttributeValue, ModelContainer};

/// Return values added to the model, under the declared name or the value's
/// conventional name. Null values are skipped.
///
/// The instance built with `annotation_not_required` also takes plain
/// object returns and sits last in the default list.
#[derive(Debug, Default)]
pub struct ModelAttributeReturnHandler {
    annotation_not_required: bool,
}

impl ModelAttributeReturnHandler {
    #[must_use]
    pub fn new(annotation_not_required: bool) -> Self {
        Self {
            annotation_not_required,
        }
    }
}

impl ReturnValueHandler for ModelAttributeReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        match return_type {
            ReturnType::ModelAttribute { .. } => true,
            ReturnType::Object => self.annotation_not_required,
            _ => false,
        }
    }

    fn handle(
        &self,
        value: ReturnValue,
        return_type: &ReturnType,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        let attribute = match value {
            ReturnValue::Attribute(attribute) => attribute,
            ReturnValue::Body(body) => AttributeValue::new(body),
            _ => return Ok(()),
        };
        if attribute.is_null() {
            return Ok(());
        }
        let declared = match return_type {
            ReturnType::ModelAttribute { name } => name.as_deref().filter(|n| !n.is_empty()),
            _ => None,
        };
        match declared {
            Some(name) => {
                container.add_attribute(name, attribute);
                Ok(())
            }
            None => container.add_value(attribute),
        }
    }
}
