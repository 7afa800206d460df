//! Response commands.
//!
//! A response body is a JSON array of objects tagged by their `command` field.
//! Entries with a missing, unknown or malformed tag decode to
//! `Command::Unrecognized` and keep their slot so response order is preserved.
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Insert,
    Settings,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Insert => "insert",
            CommandKind::Settings => "settings",
        }
    }

    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "insert" => Some(CommandKind::Insert),
            "settings" => Some(CommandKind::Settings),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InsertCommand {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    /// Markup to insert.
    #[serde(default)]
    pub data: Option<String>,
    /// Settings to attach behaviors with instead of the page store.
    #[serde(default)]
    pub settings: Option<Value>,
}

impl InsertCommand {
    pub const DEFAULT_METHOD: &'static str = "replaceWith";

    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or(Self::DEFAULT_METHOD)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SettingsCommand {
    #[serde(default)]
    pub settings: Value,
    #[serde(default, deserialize_with = "truthy")]
    pub merge: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Insert(InsertCommand),
    Settings(SettingsCommand),
    Unrecognized { kind: Option<String> },
}

impl Command {
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Command::Insert(_) => Some(CommandKind::Insert),
            Command::Settings(_) => Some(CommandKind::Settings),
            Command::Unrecognized { .. } => None,
        }
    }

    pub fn from_value(value: &Value) -> Command {
        let Some(tag) = value.get("command").and_then(Value::as_str) else {
            return Command::Unrecognized { kind: None };
        };
        let decoded = match CommandKind::from_wire(tag) {
            Some(CommandKind::Insert) => InsertCommand::deserialize(value).map(Command::Insert),
            Some(CommandKind::Settings) => {
                SettingsCommand::deserialize(value).map(Command::Settings)
            }
            None => {
                log::debug!(target: "lazy_views.command", "unknown command `{tag}`");
                return Command::Unrecognized {
                    kind: Some(tag.to_string()),
                };
            }
        };
        decoded.unwrap_or_else(|err| {
            log::warn!(target: "lazy_views.command", "malformed `{tag}` command: {err}");
            Command::Unrecognized {
                kind: Some(tag.to_string()),
            }
        })
    }
}

/// Decodes a response body. Only a top-level array is a valid command list.
pub fn decode_commands(body: &[u8]) -> Result<Vec<Command>, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_slice(body)?;
    Ok(entries.iter().map(Command::from_value).collect())
}

/// Script-style truthiness, so `1`, `"1"` and `true` all enable merging.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
