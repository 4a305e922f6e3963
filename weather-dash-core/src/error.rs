use thiserror::Error;

/// Coarse classification of a failure, used by callers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing caller input.
    Validation,
    /// City unknown to the geocoder, or history id absent.
    NotFound,
    /// Third-party API failed, timed out, or returned garbage.
    Upstream,
    /// History file could not be read or written.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Storage => "storage",
        }
    }

    /// HTTP status a route layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Upstream => 502,
            ErrorKind::Storage => 500,
        }
    }

    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Upstream => 4,
            ErrorKind::Storage => 5,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("History storage error: {0}")]
    Storage(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Validation(_) => ErrorKind::Validation,
            WeatherError::NotFound(_) => ErrorKind::NotFound,
            WeatherError::Upstream(_) => ErrorKind::Upstream,
            WeatherError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn storage(action: &str, path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        WeatherError::Storage(format!("Failed to {action} {}: {err}", path.display()))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Upstream(format!("request timed out: {err}"))
        } else {
            WeatherError::Upstream(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(WeatherError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(WeatherError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(WeatherError::Upstream("x".into()).kind(), ErrorKind::Upstream);
        assert_eq!(WeatherError::Storage("x".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(ErrorKind::Validation.http_status(), 400);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Upstream.http_status(), 502);
        assert_eq!(ErrorKind::Storage.http_status(), 500);
    }

    #[test]
    fn not_found_message_is_not_prefixed() {
        let err = WeatherError::NotFound("City not found: Qwxyzzz".into());
        assert_eq!(err.to_string(), "City not found: Qwxyzzz");
    }
}
