/// Error carried up to `main`, which turns it into a message plus exit code.
///
/// Exit codes:
/// - `2`: configuration or file I/O
/// - `3`: no usable data
/// - `4`: remote API / transport
/// - `5`: SQLite store
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_and_code_are_kept() {
        let err = AppError::new(4, format!("request to {} failed", "http://api.test"));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.message(), "request to http://api.test failed");
        assert_eq!(err.to_string(), err.message());
    }
}
