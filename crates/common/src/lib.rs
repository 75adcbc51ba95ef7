pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn envelope_serializes_code_and_response() {
        let env = types::ErrorEnvelope::new(404, "missing");
        let json = serde_json::to_value(&env).expect("serialize envelope");
        assert_eq!(json, serde_json::json!({"code": 404, "response": "missing"}));
    }
}
