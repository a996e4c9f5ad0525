pub mod offline;
pub mod scripted;
pub mod unified;

pub use offline::OfflineProvider;
pub use scripted::ScriptedProvider;
pub use unified::{
    AnthropicProvider, BaseProvider, OpenAICompatibleProvider, ProviderConfig, ProviderFactory,
    RateLimiter,
};
