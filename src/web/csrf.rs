use rand::RngExt;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::StudioError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

/// A POST body that carries nothing but the CSRF token.
#[derive(Deserialize)]
pub(crate) struct CsrfForm {
    pub(crate) csrf_token: String,
}

pub(crate) fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub(crate) async fn csrf_token(session: &Session) -> Result<String, StudioError> {
    let existing = session.get::<String>(CSRF_TOKEN_KEY).await?;
    let token = existing.unwrap_or_else(generate_token);
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), StudioError> {
    let stored = session.get::<String>(CSRF_TOKEN_KEY).await?;
    match stored {
        Some(expected) if !token.is_empty() && expected == token => Ok(()),
        _ => Err(StudioError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn token_is_stable_and_checked() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let token = csrf_token(&session).await.expect("token");
        assert_eq!(token.len(), 32);
        assert_eq!(csrf_token(&session).await.expect("token"), token);
        assert!(validate_csrf(&session, &token).await.is_ok());
        assert!(matches!(
            validate_csrf(&session, "nope").await,
            Err(StudioError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(matches!(
            validate_csrf(&session, "").await,
            Err(StudioError::Unauthorized)
        ));
    }
}
