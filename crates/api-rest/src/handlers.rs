use crate::error::ApiResult;
use crate::session::{session_token, unauthenticated_if_revoked, CurrentSession};
use crate::AppState;
use admission_core::backend::BackendError;
use admission_core::dashboard;
use admission_core::examination::ExamSlot;
use admission_core::notify::{Notification, NotificationKind, UserAction};
use admission_core::rules::{conditional_fields, is_visible};
use admission_core::schema::{Attachment, DocumentUrls, FormDraft, RegistrationDraft};
use admission_core::session::Profile;
use admission_core::status::DashboardView;
use admission_core::steps::Step;
use admission_core::validation::{validate_form, validate_step as check_step};
use admission_core::AdmissionError;
use admission_files::{detect_media_type, BlobPath};
use api_shared::{clear_session_cookie, parse_bearer, session_cookie, HealthRes, HealthService};
use axum::{
    extract::{Path as AxumPath, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationRes {
    /// `success` or `destructive`
    pub kind: String,
    pub title: String,
}

impl From<Notification> for NotificationRes {
    fn from(notification: Notification) -> Self {
        let kind = match notification.kind {
            NotificationKind::Success => "success",
            NotificationKind::Destructive => "destructive",
        };
        Self {
            kind: kind.into(),
            title: notification.title,
        }
    }
}

fn success(action: UserAction) -> NotificationRes {
    Notification::success(action).into()
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRes {
    pub user_id: String,
    pub notification: NotificationRes,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInRes {
    pub token: String,
    #[schema(value_type = Object)]
    pub profile: Profile,
    pub notification: NotificationRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginRes {
    #[schema(value_type = Object)]
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRes {
    pub signed_out: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StepRes {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepCheckRes {
    pub step: String,
    /// Id of the step the applicant moves to, absent on the last step.
    pub next: Option<String>,
    pub ready_to_submit: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRes {
    pub admission_id: String,
    #[schema(value_type = Object)]
    pub documents: DocumentUrls,
    pub notification: NotificationRes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadRes {
    pub url: String,
    pub notification: NotificationRes,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRes {
    pub complete_exam_date: i64,
    pub notification: NotificationRes,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub(crate) async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/register",
    responses(
        (status = 201, description = "Account and user profile created", body = RegisterRes),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Registration field errors"),
        (status = 502, description = "Backend failure")
    )
)]
/// Register a new applicant account
///
/// Name and phone filters are applied before validation. The password is handed to the auth
/// service only; it never reaches the stored user profile.
#[axum::debug_handler]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(draft): Json<RegistrationDraft>,
) -> ApiResult<(StatusCode, Json<RegisterRes>)> {
    let user_id = state.auth.register(&draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterRes {
            user_id,
            notification: success(UserAction::Register),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/sign-in",
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed in", body = SignInRes),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "User is not authorized")
    )
)]
/// Check credentials and the applicant role, returning a bearer token
#[axum::debug_handler]
pub(crate) async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInReq>,
) -> ApiResult<Json<SignInRes>> {
    let session = state.auth.sign_in(&req.email, &req.password).await?;
    Ok(Json(SignInRes {
        token: session.token().to_string(),
        profile: session.profile().clone(),
        notification: success(UserAction::SignIn),
    }))
}

#[utoipa::path(
    post,
    path = "/api/login",
    responses(
        (status = 200, description = "Session cookie set", body = LoginRes),
        (status = 401, description = "Missing, malformed or revoked bearer token"),
        (status = 403, description = "User is not authorized")
    )
)]
/// Exchange an `Authorization: Bearer <token>` header for the session cookie
#[axum::debug_handler]
pub(crate) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let token = parse_bearer(header).map_err(|e| {
        tracing::debug!("login rejected: {e}");
        AdmissionError::Unauthenticated
    })?;
    let session = state
        .auth
        .resume(token)
        .await
        .map_err(unauthenticated_if_revoked)?;

    let cookie = session_cookie(state.cfg.session_cookie_name(), session.token());
    let body = LoginRes {
        profile: session.profile().clone(),
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutRes)
    )
)]
/// Revoke the current session token and clear the session cookie
///
/// Always clears the cookie. `signedOut` reports whether a live session was revoked.
#[axum::debug_handler]
pub(crate) async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let cookie_name = state.cfg.session_cookie_name();
    let mut signed_out = false;
    if let Some(token) = session_token(&headers, cookie_name) {
        match state.auth.resume(&token).await {
            Ok(session) => {
                state.auth.sign_out(session).await?;
                signed_out = true;
            }
            Err(AdmissionError::Backend(BackendError::InvalidToken)) => {}
            Err(other) => return Err(other.into()),
        }
    }

    let cookie = clear_session_cookie(cookie_name);
    Ok(([(SET_COOKIE, cookie)], Json(LogoutRes { signed_out })).into_response())
}

#[utoipa::path(
    get,
    path = "/api/form/steps",
    responses(
        (status = 200, description = "Form steps in order", body = [StepRes])
    )
)]
/// List the admission form steps with the field paths each one owns
#[axum::debug_handler]
pub(crate) async fn list_steps() -> Json<Vec<StepRes>> {
    let steps = Step::ALL
        .into_iter()
        .map(|step| StepRes {
            index: step.index(),
            id: step.id(),
            title: step.title().to_string(),
            fields: step.fields().into_iter().map(|f| f.to_string()).collect(),
        })
        .collect();
    Json(steps)
}

#[utoipa::path(
    post,
    path = "/api/form/steps/{index}/validate",
    params(
        ("index" = usize, Path, description = "Zero-based step index")
    ),
    responses(
        (status = 200, description = "The step's fields are valid", body = StepCheckRes),
        (status = 400, description = "Unknown step or malformed draft"),
        (status = 422, description = "Field errors for the step")
    )
)]
/// Validate only the fields owned by one step of a draft
#[axum::debug_handler]
pub(crate) async fn validate_step(
    AxumPath(index): AxumPath<usize>,
    Json(mut draft): Json<FormDraft>,
) -> ApiResult<Json<StepCheckRes>> {
    let step = Step::from_index(index)
        .ok_or_else(|| AdmissionError::InvalidInput(format!("no form step at index {index}")))?;
    draft.sanitize();
    check_step(&draft, step).map_err(AdmissionError::Validation)?;

    Ok(Json(StepCheckRes {
        step: step.id(),
        next: step.next().map(Step::id),
        ready_to_submit: step.is_last(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/form/visibility",
    responses(
        (status = 200, description = "Visibility of each conditional field, keyed by field path")
    )
)]
/// Report which conditional fields a draft currently shows
#[axum::debug_handler]
pub(crate) async fn visibility(Json(mut draft): Json<FormDraft>) -> Json<BTreeMap<String, bool>> {
    draft.sanitize();
    let visible = conditional_fields()
        .into_iter()
        .map(|(field, _)| (field.to_string(), is_visible(&draft, field)))
        .collect();
    Json(visible)
}

#[utoipa::path(
    post,
    path = "/api/admissions",
    responses(
        (status = 201, description = "Documents uploaded and admission created", body = SubmitRes),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "An admission already exists for this applicant"),
        (status = 422, description = "Field errors across the whole form"),
        (status = 502, description = "Upload or write failure")
    )
)]
/// Validate the whole form, upload its documents, then create the admission record
#[axum::debug_handler]
pub(crate) async fn submit_admission(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(mut draft): Json<FormDraft>,
) -> ApiResult<(StatusCode, Json<SubmitRes>)> {
    draft.sanitize();
    let form = validate_form(&draft).map_err(AdmissionError::Validation)?;
    let receipt = state.pipeline.submit(&session, form).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRes {
            admission_id: receipt.admission_id,
            documents: receipt.documents,
            notification: success(UserAction::SubmitAdmission),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admissions/me",
    responses(
        (status = 200, description = "Dashboard view: noAdmission or admission"),
        (status = 401, description = "Not signed in")
    )
)]
/// Project the applicant's admission into the dashboard view
#[axum::debug_handler]
pub(crate) async fn my_admission(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<DashboardView>> {
    let view = dashboard::snapshot(state.store.as_ref(), &session).await?;
    Ok(Json(view))
}

async fn upload_screenshot(
    state: AppState,
    session: CurrentSession,
    slot: ExamSlot,
    attachment: Attachment,
) -> ApiResult<Json<UploadRes>> {
    let url = state
        .exams
        .upload_screenshot(&session.0, slot, attachment)
        .await?;
    Ok(Json(UploadRes {
        url,
        notification: success(UserAction::UploadScreenshot(slot)),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admissions/me/examination/proof",
    responses(
        (status = 200, description = "Proof screenshot stored", body = UploadRes),
        (status = 404, description = "No admission or no examination scheduled"),
        (status = 409, description = "Proof already uploaded")
    )
)]
/// Upload the examination proof screenshot
#[axum::debug_handler]
pub(crate) async fn upload_proof(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(attachment): Json<Attachment>,
) -> ApiResult<Json<UploadRes>> {
    upload_screenshot(state, session, ExamSlot::Proof, attachment).await
}

#[utoipa::path(
    post,
    path = "/api/admissions/me/examination/receipt",
    responses(
        (status = 200, description = "Receipt screenshot stored", body = UploadRes),
        (status = 404, description = "No admission or no examination scheduled"),
        (status = 409, description = "Receipt already uploaded")
    )
)]
/// Upload the examination receipt screenshot
#[axum::debug_handler]
pub(crate) async fn upload_receipt(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(attachment): Json<Attachment>,
) -> ApiResult<Json<UploadRes>> {
    upload_screenshot(state, session, ExamSlot::Receipt, attachment).await
}

#[utoipa::path(
    post,
    path = "/api/admissions/me/examination/complete",
    responses(
        (status = 200, description = "Examination marked complete", body = CompleteRes),
        (status = 404, description = "No admission or no examination scheduled"),
        (status = 409, description = "Not ongoing, or a screenshot is missing")
    )
)]
/// Mark the examination complete once both screenshots are in
#[axum::debug_handler]
pub(crate) async fn mark_complete(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<CompleteRes>> {
    let complete_exam_date = state.exams.mark_complete(&session).await?;
    Ok(Json(CompleteRes {
        complete_exam_date,
        notification: success(UserAction::MarkExamComplete),
    }))
}

#[utoipa::path(
    get,
    path = "/files/{path}",
    params(
        ("path" = String, Path, description = "Stored blob path, e.g. documents/tor/<digest>-tor.png")
    ),
    responses(
        (status = 200, description = "Blob bytes"),
        (status = 400, description = "Unsafe path"),
        (status = 404, description = "Nothing stored at this path")
    )
)]
/// Serve an uploaded document or screenshot
#[axum::debug_handler]
pub(crate) async fn serve_file(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> ApiResult<Response> {
    let path = BlobPath::parse(&path)?;
    let files = state.files.clone();
    let bytes = tokio::task::spawn_blocking(move || files.read(&path))
        .await
        .map_err(|e| BackendError::Storage(format!("read task failed: {e}")))??;

    let media_type = detect_media_type(&bytes).unwrap_or("application/octet-stream");
    Ok(([(CONTENT_TYPE, media_type)], bytes).into_response())
}
