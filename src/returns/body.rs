use super::composite::ReturnValueHandler;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::handler::{ReturnType, ReturnValue};
use crate::model::ModelContainer;
use http::header::ETAG;

/// Response entities: status, headers and body go straight to the response
/// record, and the request is handled.
///
/// An entity carrying an `ETag` that matches `If-None-Match` is answered
/// with 304 and no body.
#[derive(Debug, Default)]
pub struct EntityReturnHandler;

impl ReturnValueHandler for EntityReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::Entity
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        container.set_request_handled(true);
        let ReturnValue::Entity(entity) = value else {
            return Ok(());
        };

        for (name, value) in &entity.headers {
            ctx.set_response_header(name.clone(), value.clone());
        }
        let etag = entity
            .headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(etag) = etag {
            if entity.status.is_success() && ctx.check_not_modified(&etag) {
                return Ok(());
            }
        }

        ctx.set_response_status(entity.status, None);
        if let Some(body) = entity.body {
            ctx.write_body(body);
        }
        Ok(())
    }
}

/// Values written as the response body.
#[derive(Debug, Default)]
pub struct ResponseBodyReturnHandler;

impl ReturnValueHandler for ResponseBodyReturnHandler {
    fn supports(&self, return_type: &ReturnType) -> bool {
        *return_type == ReturnType::ResponseBody
    }

    fn handle(
        &self,
        value: ReturnValue,
        _return_type: &ReturnType,
        container: &mut ModelContainer,
        ctx: &RequestContext,
    ) -> Result<(), DispatchError> {
        container.set_request_handled(true);
        match value {
            ReturnValue::Body(body) => ctx.write_body(body),
            ReturnValue::Attribute(attribute) => ctx.write_body(attribute.into_value()),
            _ => {}
        }
        Ok(())
    }
}
