use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::auth::{
        AuthSession, ChangePasswordRequest, CurrentUserResponse, SignInRequest, SignUpRequest,
    },
    entity::{
        Users,
        clients::{ActiveModel as ClientActive, Column as ClientCol, Entity as Clients},
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult, required},
    middleware::auth::{AuthUser, issue_token},
    models::{Client, GUEST_PLACEHOLDER_NAME, Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub async fn sign_up(
    state: &AppState,
    payload: SignUpRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<AuthSession>> {
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;
    let full_name = required("full_name", &payload.full_name)?;
    let phone = required("phone", &payload.phone)?;

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::validation("Email is already taken"));
    }

    let password_hash = hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(Some(email.clone())),
        password_hash: Set(Some(password_hash)),
        role: Set(Role::Client.as_str().to_string()),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.id)),
        full_name: Set(full_name),
        phone: Set(phone),
        email: Set(email),
        is_guest: Set(false),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    record_audit(
        &state.orm,
        Some(user.id),
        "user_sign_up",
        "users",
        serde_json::json!({ "user_id": user.id, "client_id": client.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "user signed up");

    let session = session_for(state, User::try_from(user)?, Some(client.into()), now)?;
    Ok(ApiResponse::success("User created", session, None))
}

pub async fn sign_in(
    state: &AppState,
    payload: SignInRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<AuthSession>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let stored = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(stored, &payload.password)? {
        return Err(AppError::Unauthorized);
    }

    let client = Clients::find()
        .filter(ClientCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
        .map(Client::from);

    record_audit(
        &state.orm,
        Some(user.id),
        "user_sign_in",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let session = session_for(state, User::try_from(user)?, client, now)?;
    Ok(ApiResponse::success("Logged in", session, Some(Meta::empty())))
}

/// Anonymous account with a placeholder client profile. The guest quota and
/// profile gate apply when it books.
pub async fn guest_sign_in(
    state: &AppState,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<AuthSession>> {
    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(None),
        password_hash: Set(None),
        role: Set(Role::Client.as_str().to_string()),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.id)),
        full_name: Set(GUEST_PLACEHOLDER_NAME.to_string()),
        phone: Set(String::new()),
        email: Set(String::new()),
        is_guest: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    record_audit(
        &state.orm,
        Some(user.id),
        "guest_sign_in",
        "users",
        serde_json::json!({ "user_id": user.id, "client_id": client.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, client_id = %client.id, "guest signed in");

    let session = session_for(state, User::try_from(user)?, Some(client.into()), now)?;
    Ok(ApiResponse::success("Guest session", session, Some(Meta::empty())))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let stored = model
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Guest accounts have no password".into()))?;
    if !verify_password(stored, &payload.current_password)? {
        return Err(AppError::validation("current password is incorrect"));
    }
    validate_password(&payload.new_password)?;

    let mut active: UserActive = model.into();
    active.password_hash = Set(Some(hash_password(&payload.new_password)?));
    let updated = active.update(&state.orm).await?;

    record_audit(
        &state.orm,
        Some(user.user_id),
        "user_change_password",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password changed",
        User::try_from(updated)?,
        Some(Meta::empty()),
    ))
}

pub async fn current_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CurrentUserResponse>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let client = Clients::find()
        .filter(ClientCol::UserId.eq(model.id))
        .one(&state.orm)
        .await?
        .map(Client::from);

    let user = User::try_from(model)?;
    let data = CurrentUserResponse {
        user_id: user.id,
        role: user.role,
        email: user.email,
        client,
    };
    Ok(ApiResponse::success("Current user", data, Some(Meta::empty())))
}

fn session_for(
    state: &AppState,
    user: User,
    client: Option<Client>,
    now: DateTime<Utc>,
) -> AppResult<AuthSession> {
    let token = issue_token(&state.config, user.id, user.role, now)?;
    Ok(AuthSession {
        token,
        token_type: "Bearer".to_string(),
        user,
        client,
    })
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(stored: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::validation("email must be a valid address"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
