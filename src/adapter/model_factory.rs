use super::invocable::invoke_callable;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{Binding, HandlerMethod, ModelAttributeMethod, ReturnType, ReturnValue};
use crate::model::{
    binding_result, binding_result_key, AttributeKind, AttributeValue, ModelContainer, BINDING_RESULT_PREFIX,
};
use crate::resolver::ArgumentResolverComposite;
use crate::session::SessionAttributesHandler;
use tracing::debug;

/// Builds the model before the handler runs and persists session
/// attributes after it.
pub(crate) struct ModelFactory<'a> {
    global_methods: &'a [ModelAttributeMethod],
    local_methods: &'a [ModelAttributeMethod],
    session: &'a SessionAttributesHandler,
    arguments: &'a ArgumentResolverComposite,
}

impl<'a> ModelFactory<'a> {
    pub(crate) fn new(
        global_methods: &'a [ModelAttributeMethod],
        local_methods: &'a [ModelAttributeMethod],
        session: &'a SessionAttributesHandler,
        arguments: &'a ArgumentResolverComposite,
    ) -> Self {
        Self {
            global_methods,
            local_methods,
            session,
            arguments,
        }
    }

    /// Populate `container` in order: input flash attributes, retrieved
    /// session attributes, attribute-producing methods (global first), then
    /// session attributes the handler's model attribute parameters need.
    pub(crate) fn init_model(
        &self,
        ctx: &RequestContext,
        container: &mut ModelContainer,
        handler: &HandlerMethod,
    ) -> Result<(), DispatchError> {
        container.add_all_attributes(ctx.input_flash());
        let retrieved = self.session.retrieve_attributes(ctx);
        container.merge_attributes(&retrieved);

        for method in self.global_methods.iter().chain(self.local_methods) {
            self.invoke_model_attribute_method(ctx, container, method)?;
        }

        for parameter in handler.parameters() {
            if !matches!(parameter.binding, Binding::ModelAttribute { .. }) {
                continue;
            }
            let name = parameter.model_attribute_name();
            if !self.session.is_session_attribute(&name, parameter.ty.type_name())
                || container.contains_attribute(&name)
            {
                continue;
            }
            let value = self
                .session
                .retrieve_attribute(ctx, &name)
                .ok_or_else(|| DispatchError::MissingSessionAttribute { name: name.clone() })?;
            container.add_attribute(name, value);
        }
        Ok(())
    }

    fn invoke_model_attribute_method(
        &self,
        ctx: &RequestContext,
        container: &mut ModelContainer,
        method: &ModelAttributeMethod,
    ) -> Result<(), DispatchError> {
        if let Some(name) = method.name() {
            if container.contains_attribute(name) {
                debug!(method = %method.id(), attribute = %name, "Model attribute already present, skipping producer");
                return Ok(());
            }
        }

        let value = invoke_callable(
            self.arguments,
            ctx,
            container,
            method.id(),
            method.parameters(),
            method.callable(),
        )?;
        if method.is_void() {
            return Ok(());
        }

        let attribute = match value {
            ReturnValue::Attribute(attribute) => attribute,
            ReturnValue::Body(body) => AttributeValue::new(body),
            ReturnValue::Void => return Ok(()),
            other => {
                return Err(DispatchError::UnsupportedReturnType {
                    handler: method.id().to_string(),
                    return_type: ReturnType::of(&other).to_string(),
                })
            }
        };
        let name = match method.name() {
            Some(name) => name.to_string(),
            None => match attribute.conventional_name() {
                Some(name) => name,
                None => return Ok(()),
            },
        };
        if !container.contains_attribute(&name) {
            debug!(method = %method.id(), attribute = %name, "Model attribute produced");
            container.add_attribute(name, attribute);
        }
        Ok(())
    }

    /// Persist or clean up session attributes, then add binding results
    /// for candidate attributes when the view layer will render the model.
    pub(crate) fn update_model(&self, ctx: &RequestContext, container: &mut ModelContainer) {
        if container.session_status().is_complete() {
            self.session.cleanup_attributes(ctx);
        } else {
            self.session.store_attributes(ctx, container.model());
        }
        if container.is_request_handled() {
            return;
        }

        let candidates: Vec<String> = container
            .model()
            .iter()
            .filter(|(name, value)| self.is_binding_candidate(name, value))
            .map(|(name, _)| name.to_string())
            .collect();
        for name in candidates {
            let key = binding_result_key(&name);
            if !container.contains_attribute(&key) {
                container.add_attribute(key, binding_result(&name, &[]));
            }
        }
    }

    fn is_binding_candidate(&self, name: &str, value: &AttributeValue) -> bool {
        if name.starts_with(BINDING_RESULT_PREFIX) {
            return false;
        }
        if self.session.is_session_attribute(name, value.type_name()) {
            return true;
        }
        value.kind() == AttributeKind::Object
    }
}
