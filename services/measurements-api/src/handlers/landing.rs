//! Landing page handler.

/// GET / - Liveness string
pub async fn landing_handler() -> &'static str {
    "Hello, world!"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_landing_is_plain_text() {
        assert_eq!(landing_handler().await, "Hello, world!");
    }
}
