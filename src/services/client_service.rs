use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::clients::UpdateProfileRequest,
    entity::clients::{ActiveModel as ClientActive, Column as ClientCol, Entity as Clients, Model},
    error::{AppError, AppResult, required},
    middleware::auth::AuthUser,
    models::Client,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Client profile owned by a login.
pub async fn client_for_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Model> {
    Clients::find()
        .filter(ClientCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("client"))
}

pub async fn get_my_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Client>> {
    let client = client_for_user(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "Profile",
        Client::from(client),
        Some(Meta::empty()),
    ))
}

/// Guests finish their profile here before they are allowed to book.
pub async fn update_my_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Client>> {
    let client = client_for_user(&state.orm, user.user_id).await?;
    let client_id = client.id;

    let mut active: ClientActive = client.clone().into();
    let mut changed = Vec::new();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(required("full_name", &full_name)?);
        changed.push("full_name");
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(required("phone", &phone)?);
        changed.push("phone");
    }
    if let Some(email) = payload.email {
        let email = required("email", &email)?;
        if !email.contains('@') {
            return Err(AppError::validation("email must be a valid address"));
        }
        active.email = Set(email);
        changed.push("email");
    }

    if changed.is_empty() {
        return Ok(ApiResponse::success(
            "Profile unchanged",
            Client::from(client),
            Some(Meta::empty()),
        ));
    }

    let updated = active.update(&state.orm).await?;
    record_audit(
        &state.orm,
        Some(user.user_id),
        "client_profile_update",
        "clients",
        serde_json::json!({ "client_id": client_id, "fields": changed }),
    )
    .await;

    let client = Client::from(updated);
    tracing::debug!(%client_id, missing = ?client.missing_profile_fields(), "profile updated");
    Ok(ApiResponse::success("Profile updated", client, Some(Meta::empty())))
}
