use std::sync::Arc;

use crate::modules::auth::jwt::JwtCodec;
use crate::modules::auth::password;
use crate::modules::users::model::User;
use crate::modules::users::service::{NewUser, UserService, normalize_email, validate_name};
use crate::shared::core::errors::AppError;
use crate::shared::core::identity::{AuthUser, Role};

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<UserService>,
    jwt: Arc<JwtCodec>,
    bootstrap_admin_email: Option<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        jwt: Arc<JwtCodec>,
        bootstrap_admin_email: Option<String>,
    ) -> Self {
        Self {
            users,
            jwt,
            bootstrap_admin_email: bootstrap_admin_email.map(|email| normalize_email(&email)),
        }
    }

    pub fn jwt(&self) -> &JwtCodec {
        &self.jwt
    }

    fn role_for(&self, email: &str) -> Role {
        match &self.bootstrap_admin_email {
            Some(admin) if *admin == normalize_email(email) => Role::Admin,
            _ => Role::User,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<Session, AppError> {
        validate_name(&registration.name)?;
        if !registration.email.contains('@') {
            return Err(AppError::BadRequest("email must be an email".into()));
        }
        password::validate(&registration.password)?;

        let user = self
            .users
            .create(NewUser {
                role: self.role_for(&registration.email),
                password_hash: password::hash(&registration.password)?,
                name: registration.name,
                email: registration.email,
            })
            .await?;
        self.session_for(user)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<Session, AppError> {
        let user = self.users.find_by_email(&credentials.email).await?;
        match user {
            Some(user) if password::verify(&credentials.password, &user.password_hash) => {
                tracing::info!(user_id = %user.id, "login succeeded");
                self.session_for(user)
            }
            _ => {
                tracing::info!("login rejected");
                Err(AppError::Unauthenticated("Invalid credentials".into()))
            }
        }
    }

    pub async fn me(&self, caller: &AuthUser) -> Result<User, AppError> {
        self.users.get(&caller.id).await
    }

    fn session_for(&self, user: User) -> Result<Session, AppError> {
        let access_token = self.jwt.issue(&AuthUser::from(&user))?;
        Ok(Session { access_token, user })
    }
}

#[cfg(test)]
mod auth_service_tests {
    use super::*;
    use crate::shared::guards::authentication::TokenVerifier;
    use crate::tests::fixtures::connection::open_connection;
    use rstest::{fixture, rstest};

    #[fixture]
    async fn service() -> AuthService {
        let users = Arc::new(UserService::new(&open_connection().await));
        AuthService::new(
            users,
            Arc::new(JwtCodec::new("test-secret", 60)),
            Some("Root@Example.com".into()),
        )
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Ada".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_register_and_issue_a_verifiable_token(#[future] service: AuthService) {
        let service = service.await;
        let session = service
            .register(registration("ada@example.com", "s3cret-pass"))
            .await
            .unwrap();
        let caller = service.jwt().verify(&session.access_token).unwrap();
        assert_eq!(caller.id, session.user.id);
        assert_eq!(caller.role, Role::User);
        assert_ne!(session.user.password_hash, "s3cret-pass");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_promote_the_bootstrap_admin(#[future] service: AuthService) {
        let service = service.await;
        let session = service
            .register(registration("root@example.com", "s3cret-pass"))
            .await
            .unwrap();
        assert_eq!(session.user.role, Role::Admin);
    }

    #[rstest]
    #[case(registration("ada@example.com", "short"))]
    #[case(registration("not-an-email", "s3cret-pass"))]
    #[case(Registration { name: "".into(), ..registration("ada@example.com", "s3cret-pass") })]
    #[tokio::test]
    async fn it_should_reject_bad_registrations(
        #[future] service: AuthService,
        #[case] input: Registration,
    ) {
        let service = service.await;
        assert!(matches!(
            service.register(input).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_log_in_with_the_right_password_only(#[future] service: AuthService) {
        let service = service.await;
        service
            .register(registration("ada@example.com", "s3cret-pass"))
            .await
            .unwrap();

        let ok = service
            .login(Credentials {
                email: "ADA@example.com".into(),
                password: "s3cret-pass".into(),
            })
            .await;
        assert!(ok.is_ok());

        for (email, password) in [("ada@example.com", "wrong-pass"), ("who@example.com", "s3cret-pass")] {
            let result = service
                .login(Credentials {
                    email: email.into(),
                    password: password.into(),
                })
                .await;
            assert_eq!(
                result,
                Err(AppError::Unauthenticated("Invalid credentials".into()))
            );
        }
    }
}
