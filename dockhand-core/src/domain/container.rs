//! Container records reported by the container runtime
//!
//! Records are relayed to API clients exactly as the runtime printed them.
//! Dockhand never interprets their fields beyond reading the ID for logging.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One container as described by the runtime's structured listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerRecord(Map<String, Value>);

impl ContainerRecord {
    /// Decodes a single line of runtime output
    ///
    /// Returns `None` when the line is not a JSON object.
    pub fn from_line(line: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Container ID, when the runtime reports one under `ID` or `Id`
    pub fn id(&self) -> Option<&str> {
        self.get("ID")
            .or_else(|| self.get("Id"))
            .and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// Result of listing the runtime's containers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerListing {
    /// Records in the runtime's native order
    pub records: Vec<ContainerRecord>,

    /// Number of output lines that could not be decoded into a record
    pub skipped: usize,
}
