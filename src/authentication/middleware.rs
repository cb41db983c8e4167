use log::warn;
use warp::{reject::Rejection, Filter};

use crate::error::ApiError;

use super::jwt::{SessionData, TokenSigner};

const TOKEN_PREFIXES: &[&str] = &["Bearer ", "Token "];

/// Token carried by an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    TOKEN_PREFIXES
        .iter()
        .find_map(|prefix| header.strip_prefix(prefix))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn with_session(
    signer: TokenSigner,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let signer = signer.clone();
        async move {
            let Some(token) = header.as_deref().and_then(bearer_token) else {
                return Err(Rejection::from(ApiError::unauthorized(
                    "Authentication credentials were not provided.",
                )));
            };

            signer.verify(token).map_err(|e| {
                warn!("Rejected token: {e}");
                Rejection::from(e)
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::schema::User;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"0123456789abcdef0123456789abcdef", Duration::hours(1)).unwrap()
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Token abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
    }

    #[tokio::test]
    async fn test_with_session_requires_header() {
        let result = warp::test::request()
            .filter(&with_session(signer()))
            .await;

        let rejection = result.unwrap_err();
        assert!(matches!(
            rejection.find::<ApiError>(),
            Some(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_with_session_extracts_caller() {
        let signer = signer();
        let user = User {
            id: 3,
            email: "test@londonappdev.com".to_string(),
            name: String::new(),
            password: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        };
        let token = signer.generate(&user).unwrap();

        let session = warp::test::request()
            .header("authorization", format!("Bearer {token}"))
            .filter(&with_session(signer))
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
    }
}
