//! User account and session routes
//!
//! Login and refresh set the `accessToken`/`refreshToken` cookies and also
//! return both tokens in the body for non-browser clients. Logout clears
//! the cookies and the stored refresh token.

use super::extract::ApiJson;
use crate::auth::{auth_middleware, AuthUser, TokenPair, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
use crate::auth::cookie::get_cookie;
use crate::error::{ApiError, ApiResult};
use crate::services::{SessionService, UserService};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, patch, post},
    Json, Router,
};
use videotube_shared::{
    ApiResponse, AuthTokens, ChangePasswordRequest, Empty, LoginData, LoginRequest,
    RefreshTokenRequest, RegisterRequest, UpdateAccountRequest, UserResponse,
};

/// Create user routes
///
/// Routes behind `auth_middleware` resolve the caller once per request.
pub fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
}

type SessionCookies = AppendHeaders<[(axum::http::HeaderName, HeaderValue); 2]>;

fn session_cookies(state: &AppState, tokens: &TokenPair) -> SessionCookies {
    let cookies = state.cookies();
    let jwt = state.jwt();
    AppendHeaders([
        (
            SET_COOKIE,
            cookies.session(ACCESS_COOKIE_NAME, &tokens.access_token, jwt.access_token_expiry_secs()),
        ),
        (
            SET_COOKIE,
            cookies.session(REFRESH_COOKIE_NAME, &tokens.refresh_token, jwt.refresh_token_expiry_secs()),
        ),
    ])
}

fn cleared_cookies(state: &AppState) -> SessionCookies {
    let cookies = state.cookies();
    AppendHeaders([
        (SET_COOKIE, cookies.clear(ACCESS_COOKIE_NAME)),
        (SET_COOKIE, cookies.clear(REFRESH_COOKIE_NAME)),
    ])
}

/// POST /api/v1/users/register
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let user = UserService::register(state.users(), &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.as_u16(),
            user.to_response(),
            "User registered successfully",
        )),
    ))
}

/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = UserService::login(state.users(), state.jwt(), &req).await?;
    let cookies = session_cookies(&state, &outcome.tokens);

    let body = ApiResponse::new(
        StatusCode::OK.as_u16(),
        LoginData {
            user: outcome.user.to_response(),
            access_token: outcome.tokens.access_token,
            refresh_token: outcome.tokens.refresh_token,
        },
        "User logged in successfully",
    );

    Ok((cookies, Json(body)))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    UserService::logout(state.users(), auth.user_id).await?;

    Ok((
        cleared_cookies(&state),
        Json(ApiResponse::new(StatusCode::OK.as_u16(), Empty {}, "User logged out")),
    ))
}

/// POST /api/v1/users/refresh-token
///
/// The refresh token comes from the cookie, or from the JSON body when no
/// cookie is present. The body is optional.
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let from_body = body.and_then(|Json(req)| req.refresh_token);
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .map(str::to_string)
        .or(from_body);

    let (_user, tokens) =
        SessionService::refresh_session(state.users(), state.jwt(), token.as_deref()).await?;
    let cookies = session_cookies(&state, &tokens);

    let body = ApiResponse::new(
        StatusCode::OK.as_u16(),
        AuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
        "Access token refreshed",
    );

    Ok((cookies, Json(body)))
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    UserService::change_password(state.users(), auth.user_id, &req).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.as_u16(),
        Empty {},
        "Password changed successfully",
    )))
}

/// GET /api/v1/users/current-user
async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .users()
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.as_u16(),
        user.to_response(),
        "Current user fetched successfully",
    )))
}

/// PATCH /api/v1/users/update-account
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = UserService::update_account(state.users(), auth.user_id, &req).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.as_u16(),
        user.to_response(),
        "Account details updated successfully",
    )))
}
