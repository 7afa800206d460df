//! Client side of lazy views: finds deferred-fragment placeholders, fetches
//! their content in one batch and applies the server's command list to the page.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod freeze;
pub mod host;
pub mod merge;
pub mod page;
pub mod query;
pub mod replace;
pub mod request;
pub mod scanner;
pub mod settings;

pub use crate::command::{Command, CommandKind, InsertCommand, SettingsCommand, decode_commands};
pub use crate::config::LazyViewsConfig;
pub use crate::dispatch::{CommandHandler, CommandRegistry, DispatchContext, DispatchReport};
pub use crate::error::{ConfigError, HandlerError, LazyViewsError};
pub use crate::fetch::FetchCoordinator;
pub use crate::freeze::LayoutFreeze;
pub use crate::host::{Attachment, HeadlessHost, PageHost};
pub use crate::merge::SettingsHandler;
pub use crate::page::LazyViews;
pub use crate::query::extract_query;
pub use crate::replace::{FadeTimings, InsertHandler, ReplacementEngine};
pub use crate::request::BatchRequest;
pub use crate::scanner::{ClaimSet, PlaceholderScanner};
pub use crate::settings::{Settings, deep_merge};

/// Status string handed to every command handler for a decoded response.
pub const SUCCESS_STATUS: &str = "success";
