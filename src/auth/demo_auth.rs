use serde::{Deserialize, Serialize};

use crate::auth::models::{AuthenticatedUser, User};
use crate::error::AppError;

/// Name of the cookie carrying the demo session.
pub const SESSION_COOKIE: &str = "kbfacets_demo_user";

/// Built-in demo user definition.
#[derive(Debug, Clone)]
struct DemoUser {
    username: &'static str,
    password: &'static str,
    groups: &'static [&'static str],
    is_superuser: bool,
}

/// The hard-coded demo accounts.
const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "reader",
        password: "reader",
        groups: &[],
        is_superuser: false,
    },
    DemoUser {
        username: "staff",
        password: "staff",
        groups: &["staff"],
        is_superuser: false,
    },
    DemoUser {
        username: "admin",
        password: "admin",
        groups: &[],
        is_superuser: true,
    },
];

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: AuthenticatedUser,
}

impl DemoUser {
    fn to_user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: format!("demo-{}", self.username),
            username: self.username.to_string(),
            groups: self.groups.iter().map(|g| g.to_string()).collect(),
            is_superuser: self.is_superuser,
        }
    }
}

/// Validate demo credentials and return the corresponding user.
pub fn authenticate_demo_user(username: &str, password: &str) -> Result<AuthenticatedUser, AppError> {
    DEMO_USERS
        .iter()
        .find(|u| u.username == username && u.password == password)
        .map(DemoUser::to_user)
        .ok_or_else(|| AppError::Auth("Invalid username or password".into()))
}

/// Resolve a session cookie value. The cookie only names a demo account;
/// groups and superuser status always come from the account table, so an
/// unknown name is an anonymous caller.
pub fn user_from_session(value: Option<&str>) -> User {
    let Some(username) = value else {
        return User::Anonymous;
    };
    match DEMO_USERS.iter().find(|u| u.username == username) {
        Some(demo) => User::Authenticated(demo.to_user()),
        None => {
            tracing::debug!("Ignoring session cookie for unknown user");
            User::Anonymous
        }
    }
}

/// Resolve the caller of a request from its cookies.
#[cfg(feature = "server")]
pub fn current_user(jar: &axum_extra::extract::CookieJar) -> User {
    user_from_session(jar.get(SESSION_COOKIE).map(|c| c.value()))
}

/// `POST /api/auth/login`: demo login.
///
/// Validates credentials against the built-in user table.
/// On success, sets the session cookie and returns the user info.
#[cfg(feature = "server")]
pub async fn login_handler(
    jar: axum_extra::extract::CookieJar,
    axum::Json(req): axum::Json<LoginRequest>,
) -> Result<(axum_extra::extract::CookieJar, axum::Json<LoginResponse>), AppError> {
    let user = authenticate_demo_user(&req.username, &req.password)?;

    let cookie = axum_extra::extract::cookie::Cookie::build((SESSION_COOKIE, user.username.clone()))
        .path("/")
        .http_only(true)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .build();

    tracing::info!(username = %user.username, "Demo user logged in");

    Ok((
        jar.add(cookie),
        axum::Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// `GET /api/auth/me`: the demo user of the session cookie.
#[cfg(feature = "server")]
pub async fn me_handler(
    jar: axum_extra::extract::CookieJar,
) -> Result<axum::Json<AuthenticatedUser>, AppError> {
    match current_user(&jar) {
        User::Authenticated(user) => Ok(axum::Json(user)),
        User::Anonymous => Err(AppError::Auth("Not logged in".into())),
    }
}

/// `POST /api/auth/logout`: clears the demo session cookie.
#[cfg(feature = "server")]
pub async fn logout_handler(
    jar: axum_extra::extract::CookieJar,
) -> axum_extra::extract::CookieJar {
    let cookie = axum_extra::extract::cookie::Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .build();

    jar.remove(cookie)
}
