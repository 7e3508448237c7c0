//! Router for the MCP JSON-RPC endpoint

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use super::public::{
    self, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND, PARSE_ERROR, ToolCallParams, ToolResult,
};
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::tools::ToolError;

type SharedState = Arc<AppState>;

pub async fn mcp_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<JsonRpcResponse>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("Rejected MCP body: {}", rejection);
            return Ok(Json(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                "Parse error",
            )));
        }
    };

    // Anything but a JSON object can't be a request
    if !body.is_object() {
        return Ok(Json(JsonRpcResponse::failure(
            Value::Null,
            INVALID_REQUEST,
            "Invalid Request",
        )));
    }
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!("Malformed MCP request: {}", err);
            return Ok(Json(JsonRpcResponse::failure(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request",
            )));
        }
    };

    let response = dispatch(&state, request).await?;
    Ok(Json(response))
}

async fn dispatch(state: &AppState, request: JsonRpcRequest) -> Result<JsonRpcResponse, ApiError> {
    let id = request.id;
    let Some(method) = request.method else {
        return Ok(JsonRpcResponse::failure(
            id,
            INVALID_REQUEST,
            "Invalid Request",
        ));
    };
    tracing::debug!("MCP request {} (id {})", method, id);

    let response = match method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": public::PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": public::SERVER_NAME,
                    "version": public::SERVER_VERSION,
                },
            }),
        ),
        "notifications/initialized" | "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(
            id,
            json!({ "tools": serde_json::to_value(state.tools.tools())? }),
        ),
        "tools/call" => call_tool(state, id, request.params).await?,
        other => JsonRpcResponse::failure(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        ),
    };

    Ok(response)
}

async fn call_tool(state: &AppState, id: Value, params: Value) -> Result<JsonRpcResponse, ApiError> {
    let params: ToolCallParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(err) => {
            return Ok(JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Invalid params: {}", err),
            ));
        }
    };
    let Some(name) = params.name else {
        return Ok(JsonRpcResponse::failure(
            id,
            INVALID_PARAMS,
            "Invalid params: missing tool name",
        ));
    };

    let result = match state.tools.call(&name, params.arguments).await {
        Ok(value) => ToolResult::text(serde_json::to_string(&value)?, false),
        Err(ToolError::InvalidArguments(message)) => {
            tracing::info!("Tool {} rejected its arguments: {}", name, message);
            ToolResult::text(message, true)
        }
        Err(err @ ToolError::UnknownTool(_)) => {
            return Ok(JsonRpcResponse::failure(id, INVALID_PARAMS, err.to_string()));
        }
        Err(ToolError::External(err)) => {
            tracing::error!("Tool {} failed: {:?}", name, err);
            return Ok(JsonRpcResponse::failure(
                id,
                INTERNAL_ERROR,
                "Internal error while talking to the calendar",
            ));
        }
    };

    Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
}
