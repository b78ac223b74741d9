//! JSON-RPC over HTTP
//!
//! ```text
//! POST <url>  {"jsonrpc":"2.0","id":7,"method":"pxe_getTxReceipt","params":["0x…"]}
//!          ←  {"jsonrpc":"2.0","id":7,"result":{"txHash":"0x…","status":"pending"}}
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shieldmint_note::ExtendedNote;
use shieldmint_primitives::{AztecAddress, CompleteAddress, NodeInfo, TxHash, TxReceipt};

use crate::rpc::{FunctionCall, Pxe};
use crate::PxeError;

/// Encodes as `[]`
const NO_PARAMS: [(); 0] = [];

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Null when the server could not read the request id
    #[serde(default)]
    id: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// PXE client speaking JSON-RPC 2.0 to a single endpoint
#[derive(Debug)]
pub struct HttpPxeClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpPxeClient {
    pub fn new(url: impl Into<String>) -> Result<Self, PxeError> {
        Self::with_timeout(url, None)
    }

    /// `timeout` bounds each individual request, not transaction inclusion
    pub fn with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, PxeError> {
        let url = url.into();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| PxeError::Transport {
            url: url.clone(),
            source,
        })?;

        Ok(Self {
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<P, R>(&self, method: &str, params: P) -> Result<R, PxeError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("PXE request #{id}: {method}");

        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|source| self.transport(source))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PxeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| self.transport(source))?;
        let envelope: JsonRpcResponse =
            serde_json::from_slice(&bytes).map_err(|source| PxeError::Decode {
                method: method.to_string(),
                source,
            })?;

        if !envelope.id.is_null() && envelope.id != Value::from(id) {
            return Err(PxeError::UnexpectedResult {
                method: method.to_string(),
                reason: format!("response id {} does not match request id {id}", envelope.id),
            });
        }

        if let Some(error) = envelope.error {
            return Err(PxeError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(envelope.result).map_err(|source| PxeError::Decode {
            method: method.to_string(),
            source,
        })
    }

    fn transport(&self, source: reqwest::Error) -> PxeError {
        PxeError::Transport {
            url: self.url.clone(),
            source,
        }
    }
}

impl Pxe for HttpPxeClient {
    async fn get_node_info(&self) -> Result<NodeInfo, PxeError> {
        self.request("pxe_getNodeInfo", NO_PARAMS).await
    }

    async fn get_registered_accounts(&self) -> Result<Vec<CompleteAddress>, PxeError> {
        self.request("pxe_getRegisteredAccounts", NO_PARAMS).await
    }

    async fn simulate_call(
        &self,
        call: &FunctionCall,
        from: Option<AztecAddress>,
    ) -> Result<Value, PxeError> {
        self.request("pxe_simulateCall", (call, from)).await
    }

    async fn send_call(&self, call: &FunctionCall, from: AztecAddress) -> Result<TxHash, PxeError> {
        self.request("pxe_sendCall", (call, from)).await
    }

    async fn get_tx_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, PxeError> {
        self.request("pxe_getTxReceipt", (tx_hash,)).await
    }

    async fn add_note(&self, note: &ExtendedNote) -> Result<(), PxeError> {
        let _: Value = self.request("pxe_addNote", (note,)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 3,
            method: "pxe_getTxReceipt",
            params: (TxHash([1u8; 32]),),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 3);
        assert_eq!(json["params"][0], format!("0x{}", "01".repeat(32)));
    }

    #[test]
    fn test_empty_params_serialize_as_array() {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "pxe_getNodeInfo",
            params: NO_PARAMS,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["params"], serde_json::json!([]));
    }

    #[test]
    fn test_error_envelope() {
        let envelope: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#)
                .unwrap();
        assert!(envelope.result.is_null());
        assert_eq!(envelope.id, Value::from(1u64));
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "nope");
    }
}
