//! Built-in [`ActionProvider`](crate::ActionProvider) implementations.

mod ai;
mod scripted;

pub use ai::AiProvider;
pub use scripted::ScriptedProvider;
