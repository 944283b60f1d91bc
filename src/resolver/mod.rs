//! # Resolver Module
//!
//! The argument pipeline: an ordered list of [`ArgumentResolver`]s, the first
//! one that supports a parameter produces its value.
//!
//! ## Default order
//!
//! 1. Annotation-driven: request param, request param map, path variable,
//!    path variable map, model attribute, request body, request header,
//!    request header map
//! 2. Type-driven: locale, principal, redirect attributes, model, session
//!    status
//! 3. Custom resolvers, in registration order
//! 4. Catch-alls: unannotated simple types bind as request parameters,
//!    every other unannotated type binds as a model attribute
//!
//! The selected resolver is cached per [`MethodParameter`](crate::handler::MethodParameter),
//! so the `supports` scan happens once per distinct descriptor.

mod composite;
mod model;
mod named;
mod typed;

pub use composite::{ArgumentResolver, ArgumentResolverComposite};
pub use model::{ModelAttributeResolver, RequestBodyResolver};
pub use named::{
    PathVariableMapResolver, PathVariableResolver, RequestHeaderMapResolver, RequestHeaderResolver,
    RequestParamMapResolver, RequestParamResolver,
};
pub use typed::{
    LocaleResolver, ModelResolver, PrincipalResolver, RedirectAttributesResolver,
    SessionStatusResolver,
};

pub(crate) use named::convert;

use std::sync::Arc;

/// The default resolver list with `custom` inserted before the catch-alls.
pub(crate) fn default_resolvers(
    custom: Vec<Arc<dyn ArgumentResolver>>,
) -> Vec<Arc<dyn ArgumentResolver>> {
    let mut resolvers: Vec<Arc<dyn ArgumentResolver>> = vec![
        Arc::new(RequestParamResolver::new(false)),
        Arc::new(RequestParamMapResolver),
        Arc::new(PathVariableResolver),
        Arc::new(PathVariableMapResolver),
        Arc::new(ModelAttributeResolver::new(false)),
        Arc::new(RequestBodyResolver),
        Arc::new(RequestHeaderResolver),
        Arc::new(RequestHeaderMapResolver),
        Arc::new(LocaleResolver),
        Arc::new(PrincipalResolver),
        Arc::new(RedirectAttributesResolver),
        Arc::new(ModelResolver),
        Arc::new(SessionStatusResolver),
    ];
    resolvers.extend(custom);
    resolvers.push(Arc::new(RequestParamResolver::new(true)));
    resolvers.push(Arc::new(ModelAttributeResolver::new(true)));
    resolvers
}
