use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque cart line identifier, unique within a cart.
///
/// Generated locally for guest lines, store-assigned for remote lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(String);

impl LineId {
    pub fn new(value: String) -> Result<Self, String> {
        if value.is_empty() {
            return Err("Line ID cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LineId> for String {
    fn from(id: LineId) -> Self {
        id.0
    }
}
