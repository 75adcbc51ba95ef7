use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Body returned for every failed request: `{"code": <status>, "response": <message>}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub response: String,
}

impl ErrorEnvelope {
    pub fn new(code: u16, response: impl Into<String>) -> Self {
        Self { code, response: response.into() }
    }
}
