use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{EmailTemplate, GatewayConfig, GatewayName, MenuItem, SiteContent};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// ── Site content ──

#[derive(Deserialize)]
pub struct SiteContentPayload {
    pub section: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub position: i64,
}

// GET /api/admin/content
pub async fn list_site_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SiteContent>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let content = {
        let db = state.db.lock().unwrap();
        queries::list_site_content(&db)?
    };

    Ok(Json(content))
}

// POST /api/admin/content
pub async fn create_site_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SiteContentPayload>,
) -> Result<Json<SiteContent>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.section.trim().is_empty() {
        return Err(AppError::Validation("section is required".to_string()));
    }

    let now = Utc::now().naive_utc();
    let record = SiteContent {
        id: Uuid::new_v4().to_string(),
        section: payload.section.trim().to_string(),
        title: payload.title,
        body: payload.body,
        position: payload.position,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_site_content(&db, &record)?;
    }

    Ok(Json(record))
}

// PUT /api/admin/content/:id
pub async fn update_site_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<SiteContentPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.section.trim().is_empty() {
        return Err(AppError::Validation("section is required".to_string()));
    }

    let now = Utc::now().naive_utc();
    let record = SiteContent {
        id,
        section: payload.section.trim().to_string(),
        title: payload.title,
        body: payload.body,
        position: payload.position,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_site_content(&db, &record)?
    };

    if updated {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound("content block not found".to_string()))
    }
}

// DELETE /api/admin/content/:id
pub async fn delete_site_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::delete_site_content(&db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Menu items ──

#[derive(Deserialize)]
pub struct MenuItemPayload {
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
}

// GET /api/admin/menu
pub async fn list_menu_items(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let items = {
        let db = state.db.lock().unwrap();
        queries::list_menu_items(&db)?
    };

    Ok(Json(items))
}

// POST /api/admin/menu
pub async fn create_menu_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MenuItemPayload>,
) -> Result<Json<MenuItem>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.label.trim().is_empty() || payload.url.trim().is_empty() {
        return Err(AppError::Validation("label and url are required".to_string()));
    }

    let now = Utc::now().naive_utc();
    let item = MenuItem {
        id: Uuid::new_v4().to_string(),
        label: payload.label.trim().to_string(),
        url: payload.url.trim().to_string(),
        position: payload.position,
        visible: payload.visible,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_menu_item(&db, &item)?;
    }

    Ok(Json(item))
}

// PUT /api/admin/menu/:id
pub async fn update_menu_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<MenuItemPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.label.trim().is_empty() || payload.url.trim().is_empty() {
        return Err(AppError::Validation("label and url are required".to_string()));
    }

    let now = Utc::now().naive_utc();
    let item = MenuItem {
        id,
        label: payload.label.trim().to_string(),
        url: payload.url.trim().to_string(),
        position: payload.position,
        visible: payload.visible,
        created_at: now,
        updated_at: now,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_menu_item(&db, &item)?
    };

    if updated {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound("menu item not found".to_string()))
    }
}

// DELETE /api/admin/menu/:id
pub async fn delete_menu_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::delete_menu_item(&db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Email templates ──

#[derive(Deserialize)]
pub struct EmailTemplatePayload {
    pub name: String,
    pub subject: String,
    pub body_html: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// GET /api/admin/email-templates
pub async fn list_email_templates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<EmailTemplate>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let templates = {
        let db = state.db.lock().unwrap();
        queries::list_email_templates(&db)?
    };

    Ok(Json(templates))
}

// POST /api/admin/email-templates
pub async fn create_email_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<EmailTemplatePayload>,
) -> Result<Json<EmailTemplate>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() || payload.subject.trim().is_empty() {
        return Err(AppError::Validation("name and subject are required".to_string()));
    }

    let template = {
        let db = state.db.lock().unwrap();
        if queries::get_email_template(&db, &name)?.is_some() {
            return Err(AppError::Conflict("template name already in use".to_string()));
        }

        let template = EmailTemplate {
            id: Uuid::new_v4().to_string(),
            name,
            subject: payload.subject,
            body_html: payload.body_html,
            enabled: payload.enabled,
        };
        queries::insert_email_template(&db, &template)?;
        template
    };

    Ok(Json(template))
}

// PUT /api/admin/email-templates/:id
pub async fn update_email_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<EmailTemplatePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payload.name.trim().is_empty() || payload.subject.trim().is_empty() {
        return Err(AppError::Validation("name and subject are required".to_string()));
    }

    let template = EmailTemplate {
        id,
        name: payload.name.trim().to_string(),
        subject: payload.subject,
        body_html: payload.body_html,
        enabled: payload.enabled,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_email_template(&db, &template)?
    };

    if updated {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound("email template not found".to_string()))
    }
}

// DELETE /api/admin/email-templates/:id
pub async fn delete_email_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::delete_email_template(&db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Payment gateways ──

#[derive(Deserialize)]
pub struct GatewayPayload {
    pub name: GatewayName,
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub test_mode: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
    #[serde(default)]
    pub priority: i64,
}

fn default_config() -> serde_json::Value {
    serde_json::json!({})
}

// GET /api/admin/gateways
pub async fn list_gateways(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<GatewayConfig>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let gateways = {
        let db = state.db.lock().unwrap();
        queries::list_gateways(&db, false)?
    };

    Ok(Json(gateways))
}

// PUT /api/admin/gateways
/// Replaces the whole configured set in one transaction; gateways absent
/// from the request are removed. A failed save leaves the previous set
/// untouched.
pub async fn replace_gateways(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Vec<GatewayPayload>>,
) -> Result<Json<Vec<GatewayConfig>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut seen = HashSet::new();
    for gateway in &payload {
        if !seen.insert(gateway.name) {
            return Err(AppError::Validation(format!(
                "duplicate gateway name: {}",
                gateway.name.as_str()
            )));
        }
    }

    let configs: Vec<GatewayConfig> = payload
        .into_iter()
        .map(|g| GatewayConfig {
            name: g.name,
            display_name: g.display_name,
            enabled: g.enabled,
            test_mode: g.test_mode,
            api_key: g.api_key,
            api_secret: g.api_secret,
            config: g.config,
            priority: g.priority,
        })
        .collect();

    let stored = {
        let mut db = state.db.lock().unwrap();
        queries::replace_gateway_set(&mut db, &configs)?;
        queries::list_gateways(&db, false)?
    };

    tracing::info!(count = stored.len(), "payment gateway set replaced");
    Ok(Json(stored))
}
