//! Account operations: login, registration, password changes and the
//! accounts created at startup

use leaveflow_auth::PasswordService;
use leaveflow_core::{
    config::BootstrapConfig,
    models::{NewUser, User, UserRole},
    traits::LeaveStore,
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Minimum length of a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Password shared by the demo employee accounts
const DEMO_PASSWORD: &str = "employee123";

/// Demo employees: (name, email, total leave)
const DEMO_EMPLOYEES: [(&str, &str, i32); 4] = [
    ("John Employee", "employee@leaveflow.com", 20),
    ("Jane Smith", "jane@leaveflow.com", 18),
    ("Mike Johnson", "mike@leaveflow.com", 22),
    ("Sarah Wilson", "sarah@leaveflow.com", 19),
];

/// Data for an admin-created account
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub total_leave: Option<i32>,
}

pub struct AccountService {
    store: Arc<dyn LeaveStore>,
    passwords: PasswordService,
    default_total_leave: i32,
}

impl AccountService {
    pub fn new(store: Arc<dyn LeaveStore>, default_total_leave: i32) -> Self {
        Self {
            store,
            passwords: PasswordService::new(),
            default_total_leave,
        }
    }

    /// Check credentials and return the matching user
    ///
    /// Unknown emails and wrong passwords fail the same way.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        if email.is_empty() || password.is_empty() {
            debug!("Login with missing credentials");
            return Err(AppError::InvalidCredentials);
        }

        let Some(user) = self.store.get_user_by_email(email).await? else {
            debug!("Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify_password(password, &user.password_hash)? {
            info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(user)
    }

    /// Reload the user behind a session
    ///
    /// A session whose user no longer exists counts as unauthenticated.
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(AppError::unauthenticated)
    }

    /// Create an account with a full balance
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> AppResult<User> {
        check_password_length(&registration.password)?;

        let total_leave = registration.total_leave.unwrap_or(self.default_total_leave);
        if total_leave < 0 {
            return Err(AppError::Validation(
                "Total leave must not be negative".to_string(),
            ));
        }

        let user = self
            .store
            .create_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash: self.passwords.hash_password(&registration.password)?,
                role: registration.role,
                total_leave,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, total_leave, "User registered");
        Ok(user)
    }

    /// Replace the user's password after checking the current one
    ///
    /// Sessions are stateless tokens, so ones issued before the change stay
    /// valid until they expire (`auth.session_ttl_secs`).
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        if new_password != confirm_password {
            return Err(AppError::Validation(
                "New passwords don't match".to_string(),
            ));
        }
        check_password_length(new_password)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        if !self
            .passwords
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::IncorrectPassword);
        }

        let hash = self.passwords.hash_password(new_password)?;
        self.store.update_user_password(user_id, &hash).await?;

        info!("Password changed");
        Ok(())
    }

    /// Make sure the configured admin exists and, when enabled, the demo
    /// employees too. Existing accounts are left untouched.
    pub async fn bootstrap(&self, config: &BootstrapConfig) -> AppResult<()> {
        if config.uses_default_admin_password() {
            warn!(
                email = %config.admin_email,
                "Admin account uses the default password, set LEAVEFLOW__BOOTSTRAP__ADMIN_PASSWORD"
            );
        }

        self.ensure_account(
            &config.admin_name,
            &config.admin_email,
            &config.admin_password,
            UserRole::Admin,
            config.admin_total_leave,
        )
        .await?;

        if config.seed_demo_accounts {
            for (name, email, total_leave) in DEMO_EMPLOYEES {
                self.ensure_account(name, email, DEMO_PASSWORD, UserRole::Employee, total_leave)
                    .await?;
            }
        }

        Ok(())
    }

    async fn ensure_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
        total_leave: i32,
    ) -> AppResult<()> {
        if self.store.get_user_by_email(email).await?.is_some() {
            debug!(email, "Account already present");
            return Ok(());
        }

        let result = self
            .store
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: self.passwords.hash_password(password)?,
                role,
                total_leave,
            })
            .await;

        match result {
            Ok(user) => {
                info!(user_id = %user.id, email, role = %role, "Created startup account");
                Ok(())
            }
            // Another instance created it between the lookup and the insert
            Err(AppError::AlreadyExists(_)) => {
                warn!(email, "Startup account created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn check_password_length(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
