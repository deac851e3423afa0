//! Structured query execution and result unwrapping.

use beacon_types::BinaryNode;
use beacon_types::api::{ErrorItem, QueryRequest, ResultEnvelope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{QueryKind, build_mex_query};
use crate::coerce;
use crate::error::{QueryError, Result};
use crate::transport::Transport;

/// Send a structured query and return the raw response node.
///
/// Commands that only need the exchange to succeed stop here.
pub async fn send_query<T: Transport>(
    transport: &T,
    kind: &QueryKind,
    request: &QueryRequest,
) -> Result<BinaryNode> {
    let node = build_mex_query(transport.generate_message_tag(), kind, request);
    debug!(query_id = %request.query_id, "sending structured query");
    Ok(transport.query(node).await?)
}

/// Send a structured query and unwrap `data[result_key]` from its result.
pub async fn execute<T: Transport>(
    transport: &T,
    kind: &QueryKind,
    request: &QueryRequest,
    result_key: Option<&str>,
) -> Result<Value> {
    let response = send_query(transport, kind, request).await?;
    unwrap_result(&response, result_key)
}

/// [`execute`], deserializing the returned slice into `R`.
pub async fn execute_as<T: Transport, R: DeserializeOwned>(
    transport: &T,
    kind: &QueryKind,
    request: &QueryRequest,
    result_key: Option<&str>,
) -> Result<R> {
    let value = execute(transport, kind, request, result_key).await?;
    Ok(serde_json::from_value(value)?)
}

/// Pull the requested data out of a response's `result` node.
///
/// A non-empty `errors` list always wins over data. A missing `result`
/// node, an empty one, or an undefined slice all end in the generic
/// `Failed to <action>` error.
pub fn unwrap_result(response: &BinaryNode, result_key: Option<&str>) -> Result<Value> {
    if let Some(envelope) = read_envelope(response)? {
        reject_errors(&envelope)?;

        if let Some(value) = envelope.data_slice(result_key) {
            return Ok(value.clone());
        }
    }

    let action = result_key.unwrap_or_default().replace('_', " ");
    warn!(result_key = ?result_key, "structured query returned no usable result");

    Err(QueryError {
        message: format!("Failed to {action}"),
        code: coerce::DEFAULT_ERROR_CODE,
        detail: serde_json::to_value(response).unwrap_or(Value::Null),
    }
    .into())
}

/// Fail with the folded [`QueryError`] when the response reports errors.
///
/// For commands that read the payload themselves instead of through
/// [`unwrap_result`].
pub fn check_errors(response: &BinaryNode) -> Result<()> {
    match read_envelope(response)? {
        Some(envelope) => reject_errors(&envelope),
        None => Ok(()),
    }
}

/// The JSON envelope of a non-empty `result` child.
fn read_envelope(response: &BinaryNode) -> Result<Option<ResultEnvelope>> {
    let payload = response
        .child("result")
        .and_then(BinaryNode::bytes)
        .filter(|bytes| !bytes.is_empty());

    match payload {
        Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
        None => Ok(None),
    }
}

fn reject_errors(envelope: &ResultEnvelope) -> Result<()> {
    let Some(errors) = envelope.errors() else {
        return Ok(());
    };

    let err = compose_error(errors);
    warn!(code = err.code, "structured query returned errors: {}", err.message);
    Err(err.into())
}

/// Fold a non-empty error list into one error. The code and detail come
/// from the first entry.
fn compose_error(errors: &[ErrorItem]) -> QueryError {
    let message = errors
        .iter()
        .map(ErrorItem::message_text)
        .collect::<Vec<_>>()
        .join(", ");

    let first = errors.first();
    QueryError {
        message,
        code: coerce::error_code(first.and_then(ErrorItem::error_code)),
        detail: first
            .and_then(|e| serde_json::to_value(e).ok())
            .unwrap_or(Value::Null),
    }
}
