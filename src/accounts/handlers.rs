use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    accounts::{dto::AccountPayload, repo_types::Account},
    error::{AccountError, Result},
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts",
            get(list_accounts)
                .post(create_account)
                .fallback(collection_method_not_allowed),
        )
        .route(
            "/accounts/:id",
            get(read_account)
                .put(update_account)
                .delete(delete_account)
                .fallback(item_method_not_allowed),
        )
}

/// Numeric account id taken from the path. Anything that is not an
/// integer cannot name an account and is rejected as not found.
pub struct AccountId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AccountId
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!(error = %e.body_text(), "account path not extracted");
                AccountError::RouteNotFound
            })?;
        raw.parse::<i64>()
            .map(AccountId)
            .map_err(|_| AccountError::NotFound(raw))
    }
}

fn require_json(headers: &HeaderMap) -> Result<()> {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(AccountError::UnsupportedMediaType(
            "Content-Type not set".into(),
        ));
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(AccountError::UnsupportedMediaType(format!(
            "Content-Type must be application/json, got {content_type}"
        )))
    }
}

#[instrument(skip(state))]
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>> {
    let accounts = state.accounts.list_all().await?;
    info!(count = accounts.len(), "accounts listed");
    Ok(Json(accounts))
}

#[instrument(skip(state, headers, body))]
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    require_json(&headers)?;
    let payload = AccountPayload::from_slice(&body)?;

    let account = state.accounts.create(payload).await?;
    info!(account_id = account.id, "account created");

    let location = format!("/accounts/{}", account.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(account),
    ))
}

#[instrument(skip(state))]
pub async fn read_account(
    State(state): State<AppState>,
    AccountId(id): AccountId,
) -> Result<Json<Account>> {
    match state.accounts.find_by_id(id).await? {
        Some(account) => Ok(Json(account)),
        None => {
            warn!(account_id = id, "account not found");
            Err(AccountError::NotFound(id.to_string()))
        }
    }
}

/// Full replacement of an existing account. Existence is checked before
/// the body is validated, so an unknown id is 404 whatever the body.
#[instrument(skip(state, headers, body))]
pub async fn update_account(
    State(state): State<AppState>,
    AccountId(id): AccountId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Account>> {
    require_json(&headers)?;
    if state.accounts.find_by_id(id).await?.is_none() {
        warn!(account_id = id, "update of unknown account");
        return Err(AccountError::NotFound(id.to_string()));
    }
    let payload = AccountPayload::from_slice(&body)?;

    let account = state.accounts.update(id, payload).await?;
    info!(account_id = account.id, "account updated");
    Ok(Json(account))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AccountId(id): AccountId,
) -> Result<StatusCode> {
    state.accounts.delete(id).await?;
    info!(account_id = id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn collection_method_not_allowed() -> impl IntoResponse {
    method_not_allowed("GET,HEAD,POST")
}

async fn item_method_not_allowed() -> impl IntoResponse {
    method_not_allowed("GET,HEAD,PUT,DELETE")
}

fn method_not_allowed(allow: &'static str) -> impl IntoResponse {
    ([(header::ALLOW, allow)], AccountError::MethodNotAllowed)
}
