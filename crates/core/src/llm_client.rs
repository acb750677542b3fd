use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionNamedToolChoice, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionToolArgs,
        ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FunctionName, FunctionObjectArgs,
    },
};
use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde_json::Value;

/// A function declaration the model is forced to call in structured mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl FunctionSchema {
    /// Builds a function declaration whose parameters are the JSON schema of `T`.
    pub fn for_type<T: JsonSchema>(name: &str, description: &str) -> Result<Self> {
        let parameters = serde_json::to_value(schema_for!(T))
            .context("Failed to serialize JSON schema")?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        })
    }
}

/// How the model is asked to answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMode {
    /// Unstructured text in the message content.
    FreeText,
    /// Arguments of a forced function call, validated against the schema by the service.
    Structured(FunctionSchema),
}

/// A single system+user prompt pair sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub mode: ResponseMode,
}

impl CompletionRequest {
    pub fn free_text(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            mode: ResponseMode::FreeText,
        }
    }

    pub fn structured(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        schema: FunctionSchema,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            mode: ResponseMode::Structured(schema),
        }
    }
}

/// The payload of one successful completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Raw text returned in free-text mode.
    Text(String),
    /// Decoded function-call arguments returned in structured mode.
    Arguments(Value),
}

impl Completion {
    pub fn into_text(self) -> Result<String> {
        match self {
            Completion::Text(text) => Ok(text),
            Completion::Arguments(_) => Err(anyhow!("Expected free text, got function arguments")),
        }
    }

    pub fn into_arguments(self) -> Result<Value> {
        match self {
            Completion::Arguments(value) => Ok(value),
            Completion::Text(_) => Err(anyhow!("Expected function arguments, got free text")),
        }
    }
}

/// A generic client for interacting with an LLM.
///
/// Implementations perform exactly one request per call. Retrying is the job
/// of [`crate::retry::CompletionClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-3.5-turbo-0125").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_prompt)
                .build()?
                .into(),
        ]);

        if let ResponseMode::Structured(schema) = &request.mode {
            let tool = ChatCompletionToolArgs::default()
                .function(
                    FunctionObjectArgs::default()
                        .name(schema.name.clone())
                        .description(schema.description.clone())
                        .parameters(schema.parameters.clone())
                        .build()?,
                )
                .build()?;
            args.tools(vec![tool])
                .tool_choice(ChatCompletionToolChoiceOption::Named(
                    ChatCompletionNamedToolChoice {
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionName {
                            name: schema.name.clone(),
                        },
                    },
                ));
        }

        let response: CreateChatCompletionResponse =
            self.client.chat().create(args.build()?).await?;
        let message = &response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message;

        match request.mode {
            ResponseMode::FreeText => {
                let content = message
                    .content
                    .as_ref()
                    .context("No content in LLM response")?;
                Ok(Completion::Text(content.clone()))
            }
            ResponseMode::Structured(schema) => {
                let call = message
                    .tool_calls
                    .as_ref()
                    .and_then(|calls| calls.first())
                    .context("LLM response had no tool calls")?;
                if call.function.name != schema.name {
                    return Err(anyhow!(
                        "LLM called '{}' instead of '{}'",
                        call.function.name,
                        schema.name
                    ));
                }
                let arguments: Value = serde_json::from_str(&call.function.arguments)
                    .context("Function arguments were not valid JSON")?;
                Ok(Completion::Arguments(arguments))
            }
        }
    }
}
