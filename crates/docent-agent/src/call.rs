//! Bounded calls into the engine and tools

use std::future::Future;
use std::time::Duration;

use docent_ai::{Context, OutputSchema, ReasoningEngine};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Await `fut`, failing with [`Error::Timeout`] once `limit` passes
pub async fn with_timeout<T, F>(limit: Option<Duration>, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout {
                operation: operation.to_string(),
            })?,
        None => fut.await,
    }
}

/// Decode a structured engine value into `T`
pub fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::MalformedOutput(format!("{}: {}", std::any::type_name::<T>(), e))
    })
}

/// Ask the engine for a `T` under `context`
pub async fn structured<T>(
    engine: &dyn ReasoningEngine,
    context: &Context,
    limit: Option<Duration>,
) -> Result<T>
where
    T: JsonSchema + DeserializeOwned,
{
    let schema = OutputSchema::of::<T>();
    debug!(
        schema = %schema.name,
        messages = context.messages.len(),
        "Requesting structured output"
    );
    let value = with_timeout(limit, "structured response", async {
        Ok(engine.respond_structured(context, &schema).await?)
    })
    .await?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AnswerResponse;
    use crate::test_support::MockEngine;

    #[tokio::test]
    async fn test_timeout_expires() {
        let result: Result<()> = with_timeout(Some(Duration::from_millis(10)), "tool", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(Error::Timeout { operation }) => assert_eq!(operation, "tool"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_limit_waits() {
        let value = with_timeout(None, "tool", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_decode_wrong_shape_is_malformed() {
        let err = decode::<AnswerResponse>(serde_json::json!({"answer": 5})).unwrap_err();
        assert!(matches!(err, Error::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_structured_passes_schema() {
        let engine = MockEngine::new();
        engine.push_structured(serde_json::json!({"answer": "ok", "confidence": 0.5}));
        let answer: AnswerResponse =
            structured(&engine, &Context::from_prompt("q"), None).await.unwrap();
        assert_eq!(answer.answer, "ok");
        assert_eq!(engine.schema_names(), vec!["AnswerResponse"]);
    }
}
