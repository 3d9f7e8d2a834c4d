//! Secret store documents shared across tests.

/// A store with no secrets and no access restrictions.
pub const EMPTY_STORE: &str = "{}";

/// Static and leased secrets, open to any caller.
pub const STANDARD_STORE: &str = r#"{
    "secrets": {
        "secret/app": {
            "data": { "API_KEY": "sk-test-12345", "REGION": "eu-west-1" }
        },
        "secret/db": {
            "data": { "password": "hunter2", "user": "app" },
            "lease_duration": 3600,
            "renewable": true
        }
    }
}"#;

/// A store locked to a token.
pub const TOKEN_STORE: &str = r#"{
    "token": "s.test-token",
    "secrets": {
        "secret/app": { "data": { "API_KEY": "sk-test-12345" } }
    }
}"#;

/// A store whose only secret holds a short non-renewable lease.
pub fn short_lease_store(seconds: u64) -> String {
    format!(
        r#"{{
    "secrets": {{
        "secret/db": {{
            "data": {{ "password": "hunter2" }},
            "lease_duration": {seconds},
            "renewable": false
        }}
    }}
}}"#
    )
}
