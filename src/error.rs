use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComicgrepError {
    // Request validation
    #[error("bad arguments: {0}")]
    BadArguments(String),

    #[error("phrase exceeds {limit} bytes, chunk the input")]
    TooLarge { limit: usize },

    // Auth
    #[error("unauthorized")]
    Unauthorized,

    // Domain
    #[error("comic not found: {id}")]
    NotFound { id: u32 },

    #[error("an update is already running")]
    AlreadyExists,

    // Admission
    #[error("service unavailable")]
    Unavailable,

    // Boot
    #[error("startup error: {0}")]
    Starting(String),

    // Collaborators
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(String),

    // Config
    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ComicgrepError {
    fn from(e: reqwest::Error) -> Self {
        ComicgrepError::Upstream(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComicgrepError>;

impl ComicgrepError {
    pub fn status_code(&self) -> u16 {
        match self {
            ComicgrepError::BadArguments(_) | ComicgrepError::TooLarge { .. } => 400,

            ComicgrepError::Unauthorized => 401,

            ComicgrepError::NotFound { .. } => 404,

            // The update endpoint answers "already running" with Accepted.
            ComicgrepError::AlreadyExists => 202,

            ComicgrepError::Unavailable => 503,

            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_arguments_status_code() {
        let err = ComicgrepError::BadArguments("phrase is empty".into());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_too_large_status_code() {
        let err = ComicgrepError::TooLarge { limit: 4096 };
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_unauthorized_status_code() {
        assert_eq!(ComicgrepError::Unauthorized.status_code(), 401);
    }

    #[test]
    fn test_not_found_status_code() {
        let err = ComicgrepError::NotFound { id: 42 };
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_already_exists_status_code() {
        assert_eq!(ComicgrepError::AlreadyExists.status_code(), 202);
    }

    #[test]
    fn test_unavailable_status_code() {
        assert_eq!(ComicgrepError::Unavailable.status_code(), 503);
    }

    #[test]
    fn test_default_status_code() {
        assert_eq!(ComicgrepError::Upstream("boom".into()).status_code(), 500);
        assert_eq!(ComicgrepError::Storage("boom".into()).status_code(), 500);
        assert_eq!(ComicgrepError::Config("boom".into()).status_code(), 500);
        assert_eq!(ComicgrepError::Starting("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_display_formatting() {
        let err = ComicgrepError::NotFound { id: 404 };
        assert!(err.to_string().contains("404"));

        let err = ComicgrepError::TooLarge { limit: 4096 };
        assert!(err.to_string().contains("4096"));
    }
}
