use super::composite::ReturnValueHandler;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ReturnType, ReturnValue};
use crate::model::{ModelContainer, ViewSelector, REDIRECT_URL_PREFIX};
use tracing::debug;

/// True for view names of the form `redirect:<target>`.
#[must_use]
pub fn is_redirect_view_name(name: &str) -> bool {
    name.starts_with(REDIRECT_URL_PREFIX)
}

fn select_view(view: ViewSelector, container: &mut ModelContainer) {
    if view.is_redirect() {
        container.set_redirect_model_scenario(true);
    }
    container.set_view(view);
}

/// [`ModelAndView`](crate::model::ModelAndView) results: view, status and
/// model are copied onto the container. An absent value marks the request
/// handled.
#[derive(Debug, Default)]
pub struct ModelAndViewReturnHandler;

impl ReturnValueHandler for ModelAndViewReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::ModelAndView
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        let ReturnValue::ModelAndView(mav) = value else {
            container.set_request_handled(true);
            return Ok(());
        };
        if let Some(view) = mav.view {
            select_view(view, container);
        }
        if let Some(status) = mav.status {
            ctx.set_response_status(status, None);
        }
        container.add_all_attributes(&mav.model);
        Ok(())
    }
}

/// A returned [`ModelMap`](crate::model::ModelMap) is added to the active model.
#[derive(Debug, Default)]
pub struct ModelReturnHandler;

impl ReturnValueHandler for ModelReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::Model
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        if let ReturnValue::Model(model) = value {
            container.add_all_attributes(&model);
        }
        Ok(())
    }
}

/// View objects; a redirecting view starts the redirect scenario.
#[derive(Debug, Default)]
pub struct ViewReturnHandler;

impl ReturnValueHandler for ViewReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::View
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        if let ReturnValue::View(view) = value {
            select_view(ViewSelector::View(view), container);
        }
        Ok(())
    }
}

/// View names, and void results that leave view selection to defaults.
#[derive(Debug, Default)]
pub struct ViewNameReturnHandler;

impl ReturnValueHandler for ViewNameReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        matches!(return_type, ReturnType::ViewName | ReturnType::Void)
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        _ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        if let ReturnValue::ViewName(name) = value {
            if is_redirect_view_name(&name) {
                debug!(view = %name, "Redirect view selected");
                container.set_redirect_model_scenario(true);
            }
            container.set_view_name(name);
        }
        Ok(())
    }
}
