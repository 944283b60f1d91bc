use super::composite::ArgumentResolver;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ArgumentValue, MethodParameter, ParamType};
use crate::model::{ModelContainer, RedirectAttributes};

/// Resolvers keyed purely on the declared parameter type.
#[derive(Debug, Default)]
pub struct ModelResolver;

impl ArgumentResolver for ModelResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.ty == ParamType::Model
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(ArgumentValue::Model)
    }
}

#[derive(Debug, Default)]
pub struct SessionStatusResolver;

impl ArgumentResolver for SessionStatusResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.ty == ParamType::SessionStatus
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(ArgumentValue::SessionStatus)
    }
}

/// Installs a fresh redirect model on the container.
#[derive(Debug, Default)]
pub struct RedirectAttributesResolver;

impl ArgumentResolver for RedirectAttributesResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.ty == ParamType::RedirectAttributes
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        container.set_redirect_model(RedirectAttributes::new());
        Ok(ArgumentValue::RedirectAttributes)
    }
}

#[derive(Debug, Default)]
pub struct LocaleResolver;

impl ArgumentResolver for LocaleResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.ty == ParamType::Locale
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(ArgumentValue::Locale(ctx.locale()))
    }
}

#[derive(Debug, Default)]
pub struct PrincipalResolver;

impl ArgumentResolver for PrincipalResolver {
    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.ty == ParamType::Principal
    }

    fn resolve(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<ArgumentValue, DispatchError> {
        Ok(ArgumentValue::Principal(ctx.principal().cloned()))
    }
}
