use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RunConfig;
use crate::errors::DecisionError;
use crate::providers::{LLMProvider, Message};
use crate::tools::{ToolCall, ToolInvocation, ToolKind, ToolRuntime};

const FINAL_ANSWER_PROMPT: &str = "Tool budget used up. Reply now with your final JSON answer \
                                   containing every output field. Do not request another tool.";

/// Configuration for the Agent Executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Tool calls allowed before a final answer is demanded
    pub max_tool_rounds: usize,
    /// Bound on every single inference call
    pub inference_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for ExecutorConfig {
    fn from(run: &RunConfig) -> Self {
        Self {
            max_tool_rounds: run.max_tool_rounds,
            inference_timeout: run.inference_timeout(),
        }
    }
}

/// Final structured answer plus the tools used to reach it.
#[derive(Debug, Clone)]
pub struct Decision {
    pub value: Value,
    pub tool_calls: Vec<ToolInvocation>,
}

#[derive(Debug)]
enum Reply {
    Tool { name: String, params: Value },
    Answer(Value),
}

/// Runs one decision: an inference conversation with an optional tool loop.
pub struct AgentExecutor {
    llm_provider: Arc<dyn LLMProvider>,
    tool_runtime: ToolRuntime,
    config: ExecutorConfig,
}

impl AgentExecutor {
    pub fn new(llm_provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        Self {
            llm_provider,
            tool_runtime: ToolRuntime::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Tool schemas for a prompt, one JSON object per line.
    pub fn tool_schemas(&self, allowed: &[ToolKind]) -> String {
        let schemas = self.tool_runtime.get_schemas(allowed);
        if schemas.is_empty() {
            return "(none)".to_string();
        }
        schemas
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn decide(
        &self,
        system: &str,
        user: &str,
        allowed_tools: &[ToolKind],
    ) -> Result<Decision, DecisionError> {
        let mut messages = vec![Message::system(system), Message::user(user)];
        let mut tool_calls: Vec<ToolInvocation> = Vec::new();

        loop {
            let budget_spent = tool_calls.len() >= self.config.max_tool_rounds;
            let response = self.complete(messages.clone()).await?;

            let (name, params) = match parse_reply(&response)? {
                Reply::Answer(value) => return Ok(Decision { value, tool_calls }),
                Reply::Tool { name, params } => (name, params),
            };

            if budget_spent {
                return Err(DecisionError::ToolBudgetExhausted(self.config.max_tool_rounds));
            }

            let kind = name
                .parse::<ToolKind>()
                .ok()
                .filter(|k| allowed_tools.contains(k))
                .ok_or_else(|| DecisionError::UnknownTool(name.clone()))?;

            let call = ToolCall {
                kind,
                params: params.clone(),
            };
            let result = self
                .tool_runtime
                .execute(&call)
                .map_err(|e| DecisionError::Tool {
                    tool: name.clone(),
                    message: format!("{:#}", e),
                })?;
            log::debug!("Tool {} returned {}", name, result);

            messages.push(Message::assistant(response));
            messages.push(Message::user(format!("Tool {} result: {}", name, result)));
            tool_calls.push(ToolInvocation {
                tool: kind,
                arguments: params,
                result,
            });

            if tool_calls.len() >= self.config.max_tool_rounds {
                messages.push(Message::user(FINAL_ANSWER_PROMPT));
            }
        }
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String, DecisionError> {
        let timeout = self.config.inference_timeout;
        match tokio::time::timeout(timeout, self.llm_provider.complete(messages)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(DecisionError::Inference(format!("{:#}", e))),
            Err(_) => Err(DecisionError::Timeout(timeout)),
        }
    }
}

/// Drop a surrounding Markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // skip the info string (e.g. `json`)
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json_object(text: &str) -> Option<Value> {
    let cleaned = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return value.is_object().then_some(value);
    }
    // Prose around a single object
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&cleaned[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn parse_reply(response: &str) -> Result<Reply, DecisionError> {
    let value = parse_json_object(response).ok_or_else(|| {
        let preview: String = response.chars().take(120).collect();
        DecisionError::InvalidOutput(format!("expected a JSON object, got: {}", preview))
    })?;

    match value.get("tool").and_then(Value::as_str) {
        Some(name) => Ok(Reply::Tool {
            name: name.to_string(),
            params: value
                .get("params")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        }),
        None => Ok(Reply::Answer(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MockReply, ScriptedLLMProvider};
    use serde_json::json;

    fn create_test_executor(replies: Vec<MockReply>, max_tool_rounds: usize) -> (AgentExecutor, Arc<ScriptedLLMProvider>) {
        let provider = Arc::new(ScriptedLLMProvider::new(replies));
        let executor = AgentExecutor::new(
            provider.clone(),
            ExecutorConfig {
                max_tool_rounds,
                inference_timeout: Duration::from_millis(200),
            },
        );
        (executor, provider)
    }

    fn text(s: &str) -> MockReply {
        MockReply::Text(s.to_string())
    }

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_tool_rounds, 5);
        assert_eq!(config.inference_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_reply() {
        let reply = parse_reply("Here you go: {\"mtow\": 12.0} thanks").unwrap();
        assert!(matches!(reply, Reply::Answer(v) if v["mtow"] == 12.0));

        let reply = parse_reply("{\"tool\": \"cost_estimator\"}").unwrap();
        assert!(matches!(reply, Reply::Tool { ref name, ref params } if name == "cost_estimator" && params.is_object()));

        assert!(matches!(
            parse_reply("no json here"),
            Err(DecisionError::InvalidOutput(_))
        ));
        assert!(parse_reply("[1, 2]").is_err());
    }

    #[tokio::test]
    async fn test_tool_loop_records_invocations() {
        let (executor, provider) = create_test_executor(
            vec![
                text(r#"{"tool": "power_requirement_calculator", "params": {"weight": 10.0, "velocity": 20.0}}"#),
                text("```json\n{\"engine_power_kw\": 2.0}\n```"),
            ],
            5,
        );

        let decision = executor
            .decide("sys", "user", &[ToolKind::PowerRequirementCalculator])
            .await
            .unwrap();

        assert_eq!(decision.value, json!({"engine_power_kw": 2.0}));
        assert_eq!(decision.tool_calls.len(), 1);
        assert_eq!(decision.tool_calls[0].tool, ToolKind::PowerRequirementCalculator);

        let conversations = provider.conversations();
        let second = &conversations[1];
        assert_eq!(second.len(), 4);
        assert!(second[3].content.starts_with("Tool power_requirement_calculator result:"));
    }

    #[tokio::test]
    async fn test_tool_outside_role_set_rejected() {
        let (executor, _) = create_test_executor(
            vec![text(r#"{"tool": "cost_estimator", "params": {}}"#)],
            5,
        );
        let err = executor
            .decide("sys", "user", &[ToolKind::WeightEstimator])
            .await
            .unwrap_err();
        assert_eq!(err, DecisionError::UnknownTool("cost_estimator".to_string()));
    }

    #[tokio::test]
    async fn test_final_answer_forced_after_budget() {
        let tool = r#"{"tool": "weight_estimator", "params": {"length": 1.0, "width": 1.0, "material": "steel"}}"#;
        let (executor, provider) = create_test_executor(
            vec![text(tool), text(tool), text(r#"{"done": true}"#)],
            2,
        );

        let decision = executor
            .decide("sys", "user", &[ToolKind::WeightEstimator])
            .await
            .unwrap();
        assert_eq!(decision.tool_calls.len(), 2);

        let last = provider.conversations().pop().unwrap();
        assert_eq!(last.last().unwrap().content, FINAL_ANSWER_PROMPT);
    }

    #[tokio::test]
    async fn test_tool_request_after_budget_fails() {
        let tool = r#"{"tool": "weight_estimator", "params": {"length": 1.0, "width": 1.0, "material": "steel"}}"#;
        let (executor, _) = create_test_executor(vec![text(tool), text(tool)], 1);

        let err = executor
            .decide("sys", "user", &[ToolKind::WeightEstimator])
            .await
            .unwrap_err();
        assert_eq!(err, DecisionError::ToolBudgetExhausted(1));
    }

    #[tokio::test]
    async fn test_bad_tool_arguments_fail_decision() {
        let (executor, _) = create_test_executor(
            vec![text(r#"{"tool": "weight_estimator", "params": {"length": 1.0}}"#)],
            5,
        );
        let err = executor
            .decide("sys", "user", &[ToolKind::WeightEstimator])
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::Tool { ref tool, .. } if tool == "weight_estimator"));
    }

    #[tokio::test]
    async fn test_inference_timeout() {
        let (executor, _) = create_test_executor(
            vec![MockReply::Delayed(Duration::from_secs(5), "{}".to_string())],
            5,
        );
        let err = executor.decide("sys", "user", &[]).await.unwrap_err();
        assert_eq!(err, DecisionError::Timeout(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_inference_error() {
        let (executor, _) = create_test_executor(vec![MockReply::Error("503".to_string())], 5);
        let err = executor.decide("sys", "user", &[]).await.unwrap_err();
        assert!(matches!(err, DecisionError::Inference(ref m) if m.contains("503")));
    }
}
