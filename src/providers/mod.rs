pub mod demo;
pub mod llm;

pub use demo::demo_provider;
pub use llm::{
    AnthropicProvider, LLMProvider, Message, MockLLMProvider, MockReply, OpenAIProvider,
    ScriptedLLMProvider,
};
