use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{HandlerFn, HandlerMethod, Invocation, MethodParameter, ReturnType, ReturnValue};
use crate::model::ModelContainer;
use crate::resolver::ArgumentResolverComposite;
use crate::returns::ReturnValueHandlerComposite;
use tracing::debug;

/// Resolve `parameters` and call `callable`. Errors raised by the callable
/// come back as [`DispatchError::Handler`], untouched.
pub(crate) fn invoke_callable(
    arguments: &ArgumentResolverComposite,
    ctx: &RequestContext,
    container: &mut ModelContainer,
    id: &str,
    parameters: &[MethodParameter],
    callable: &HandlerFn,
) -> Result<ReturnValue, DispatchError> {
    let mut args = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        match arguments.resolve_argument(id, parameter, container, ctx) {
            Ok(value) => args.push(value),
            Err(err) => {
                debug!(
                    handler = %id,
                    parameter = %parameter.name,
                    index = parameter.index,
                    error = %err,
                    "Could not resolve parameter"
                );
                return Err(err);
            }
        }
    }
    let mut invocation = Invocation::new(args, container, ctx);
    (**callable)(&mut invocation).map_err(DispatchError::Handler)
}

/// Apply the declared response status, then decide whether the return value
/// still needs processing.
///
/// A void result is final when the request is not modified, a response
/// status was declared, or the container is already handled. A declared
/// status reason makes any result final. Everything else goes through the
/// return value pipeline.
pub(crate) fn handle_result(
    returns: &ReturnValueHandlerComposite,
    ctx: &RequestContext,
    container: &mut ModelContainer,
    handler: &HandlerMethod,
    value: ReturnValue,
    declared: &ReturnType,
) -> Result<(), DispatchError> {
    if let Some(status) = handler.response_status() {
        ctx.set_response_status(status, handler.response_reason().map(str::to_string));
    }

    if value.is_void() {
        if ctx.is_not_modified() || handler.response_status().is_some() || container.is_request_handled() {
            container.set_request_handled(true);
            return Ok(());
        }
    } else if handler.response_reason().is_some_and(|r| !r.is_empty()) {
        container.set_request_handled(true);
        return Ok(());
    }

    container.set_request_handled(false);
    returns.handle_return_value(handler.id(), value, declared, container, ctx)
}
