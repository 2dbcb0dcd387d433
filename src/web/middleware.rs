use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::csrf::generate_token;
use super::prelude::*;
use crate::session::StudioHandle;

const STUDIO_TOKEN_KEY: &str = "studio_token";

/// The visitor's studio, looked up through the token kept in their cookie
/// session. A token is issued on first contact.
#[derive(Clone, Debug)]
pub(crate) struct CurrentStudio {
    pub(crate) handle: Arc<StudioHandle>,
}

impl FromRequestParts<AppState> for CurrentStudio {
    type Rejection = StudioError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let session = parts.extensions.get::<Session>().cloned();
        let studios = state.studios.clone();

        async move {
            let session = session.ok_or_else(|| {
                StudioError::InternalServerError("session layer missing".to_string())
            })?;
            let token = match session.get::<String>(STUDIO_TOKEN_KEY).await? {
                Some(token) => token,
                None => {
                    let token = generate_token();
                    session.insert(STUDIO_TOKEN_KEY, token.clone()).await?;
                    debug!("Issued new studio token");
                    token
                }
            };
            Ok(Self {
                handle: studios.get_or_create(&token).await,
            })
        }
    }
}
