use log::{info, warn};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::SessionData,
    },
    error::{ApiError, NON_FIELD_ERRORS},
    schema::{NewUser, User, UserChanges},
    store::RecordStore,
    transfer::UserPayload,
};

/// Lowercases the domain part of an email address; the local part is kept as is.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();

    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Builds an insertable user, hashing the password.
pub fn new_user(email: Option<&str>, password: &str, name: &str) -> Result<NewUser, ApiError> {
    let email = match email.map(str::trim) {
        Some(email) if !email.is_empty() => normalize_email(email),
        _ => return Err(ApiError::validation("email", "Users must have an email address")),
    };

    Ok(NewUser {
        email,
        name: name.to_string(),
        password: hash_password(password)?,
        is_staff: false,
        is_superuser: false,
    })
}

pub async fn create_user<S: RecordStore>(
    store: &S,
    email: Option<&str>,
    password: &str,
) -> Result<User, ApiError> {
    let user = store.insert_user(new_user(email, password, "")?).await?;
    info!("Created user {}", user.id);

    Ok(user)
}

pub async fn create_superuser<S: RecordStore>(
    store: &S,
    email: Option<&str>,
    password: &str,
) -> Result<User, ApiError> {
    let mut user = new_user(email, password, "")?;
    user.is_staff = true;
    user.is_superuser = true;

    let user = store.insert_user(user).await?;
    info!("Created superuser {}", user.id);

    Ok(user)
}

pub fn check_password(user: &User, password: &str) -> Result<bool, ApiError> {
    verify_password(password, &user.password)
}

/// Creates a user from the public sign-up payload.
pub async fn register_user<S: RecordStore>(
    store: &S,
    payload: UserPayload,
) -> Result<User, ApiError> {
    payload.validate(false)?;

    let mut user = new_user(
        payload.email.as_deref(),
        payload.password.as_deref().unwrap_or_default(),
        payload.name.as_deref().unwrap_or_default(),
    )?;
    user.name = user.name.trim().to_string();

    if store.find_user_by_email(&user.email).await?.is_some() {
        return Err(ApiError::validation(
            "email",
            "user with this email already exists.",
        ));
    }

    let user = store.insert_user(user).await?;
    info!("Registered user {}", user.id);

    Ok(user)
}

/// Resolves credentials to an active user.
pub async fn authenticate<S: RecordStore>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let rejected = || {
        ApiError::validation(
            NON_FIELD_ERRORS,
            "Unable to authenticate with provided credentials",
        )
    };

    let Some(user) = store.find_user_by_email(&normalize_email(email)).await? else {
        warn!("Authentication failed: unknown email");
        return Err(rejected());
    };

    if !user.is_active || !check_password(&user, password)? {
        warn!("Authentication failed for user {}", user.id);
        return Err(rejected());
    }

    Ok(user)
}

/// The caller's own account. A token for a user that no longer exists is
/// treated like an invalid token.
pub async fn get_me<S: RecordStore>(store: &S, session: &SessionData) -> Result<User, ApiError> {
    match store.get_user(session.user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(ApiError::unauthorized("User not found or inactive.")),
    }
}

pub async fn update_me<S: RecordStore>(
    store: &S,
    session: &SessionData,
    payload: UserPayload,
    partial: bool,
) -> Result<User, ApiError> {
    payload.validate(partial)?;
    let user = get_me(store, session).await?;

    let changes = UserChanges {
        email: payload.email.as_deref().map(normalize_email),
        name: payload.name.map(|name| name.trim().to_string()),
        password: match payload.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        },
    };

    let user = store
        .update_user(user.id, changes)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive."))?;
    info!("Updated user {}", user.id);

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_new_user_email_normalized() {
        assert_eq!(
            normalize_email("test@LONDONAPPDEV.COM"),
            "test@londonappdev.com"
        );
        assert_eq!(normalize_email("Test.User@Example.ORG"), "Test.User@example.org");
        assert_eq!(normalize_email("  spaced@Host.io "), "spaced@host.io");
    }

    #[test]
    fn test_new_user_invalid_email() {
        assert!(new_user(None, "test123", "").is_err());
        assert!(new_user(Some(""), "test123", "").is_err());
        assert!(new_user(Some("   "), "test123", "").is_err());
    }

    #[tokio::test]
    async fn test_create_user_with_email_successful() {
        let store = MemoryStore::new();
        let user = create_user(&store, Some("test@londonappdev.com"), "testpass123")
            .await
            .unwrap();

        assert_eq!(user.email, "test@londonappdev.com");
        assert_ne!(user.password, "testpass123");
        assert!(check_password(&user, "testpass123").unwrap());
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn test_create_new_superuser() {
        let store = MemoryStore::new();
        let user = create_superuser(&store, Some("test@londonappdev.com"), "test123")
            .await
            .unwrap();

        assert!(user.is_superuser);
        assert!(user.is_staff);
    }

    #[tokio::test]
    async fn test_create_user_without_email_fails() {
        let store = MemoryStore::new();

        assert!(matches!(
            create_user(&store, None, "test123").await,
            Err(ApiError::Validation(_))
        ));
        assert!(store.find_user_by_email("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = MemoryStore::new();
        create_user(&store, Some("test@londonappdev.com"), "testpass")
            .await
            .unwrap();

        assert!(authenticate(&store, "test@LondonAppDev.com", "testpass")
            .await
            .is_ok());
        assert!(authenticate(&store, "test@londonappdev.com", "wrong")
            .await
            .is_err());
        assert!(authenticate(&store, "nobody@londonappdev.com", "testpass")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_me_rehashes_password() {
        let store = MemoryStore::new();
        let user = create_user(&store, Some("test@londonappdev.com"), "testpass")
            .await
            .unwrap();
        let session = SessionData {
            user_id: user.id,
            email: user.email.to_owned(),
            is_staff: false,
            is_superuser: false,
        };

        let payload = UserPayload {
            email: None,
            password: Some("newpassword123".to_string()),
            name: Some("new name".to_string()),
        };
        let updated = update_me(&store, &session, payload, true).await.unwrap();

        assert_eq!(updated.name, "new name");
        assert!(check_password(&updated, "newpassword123").unwrap());
        assert!(!check_password(&updated, "testpass").unwrap());
    }
}
