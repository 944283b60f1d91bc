//! # Return Value Module
//!
//! The return value pipeline: an ordered list of [`ReturnValueHandler`]s.
//! The first handler that supports the value's effective return type (see
//! [`effective_return_type`]) processes it.
//!
//! ## Default order
//!
//! model-and-view, model, view, entity, async, annotated model attribute,
//! response body, view name (and void), custom handlers, then the catch-all
//! model attribute handler for plain object returns.
//!
//! Handlers that answer the request themselves (entity, response body) mark
//! the container handled so no view is selected.

mod attribute;
mod body;
mod composite;
mod deferred;
#[cfg(test)]
mod tests;
mod view;

pub use attribute::ModelAttributeReturnHandler;
pub use body::{EntityReturnHandler, ResponseBodyReturnHandler};
pub use composite::{effective_return_type, ReturnValueHandler, ReturnValueHandlerComposite};
pub use deferred::AsyncReturnHandler;
pub use view::{
    is_redirect_view_name, ModelAndViewReturnHandler, ModelReturnHandler, ViewNameReturnHandler,
    ViewReturnHandler,
};

use std::sync::Arc;

pub(crate) fn default_return_handlers(
    custom: Vec<Arc<dyn ReturnValueHandler>>,
    async_handler: AsyncReturnHandler,
) -> Vec<Arc<dyn ReturnValueHandler>> {
    let mut handlers: Vec<Arc<dyn ReturnValueHandler>> = vec![
        Arc::new(ModelAndViewReturnHandler),
        Arc::new(ModelReturnHandler),
        Arc::new(ViewReturnHandler),
        Arc::new(EntityReturnHandler),
        Arc::new(async_handler),
        Arc::new(ModelAttributeReturnHandler::new(false)),
        Arc::new(ResponseBodyReturnHandler),
        Arc::new(ViewNameReturnHandler),
    ];
    handlers.extend(custom);
    handlers.push(Arc::new(ModelAttributeReturnHandler::new(true)));
    handlers
}
