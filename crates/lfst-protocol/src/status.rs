use serde::{Deserialize, Serialize};

/// Wire-level result of a command: a numeric code plus message lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: u32,
    pub messages: Vec<String>,
}

impl Status {
    pub const OK: u32 = 200;

    pub fn success() -> Self {
        Self {
            code: Self::OK,
            messages: Vec::new(),
        }
    }

    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            messages: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::OK
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.code)?;
        for message in &self.messages {
            write!(f, "\n{message}")?;
        }
        Ok(())
    }
}
