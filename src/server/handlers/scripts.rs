// ===== src/server/handlers/scripts.rs =====
use crate::core::error::AppError;
use crate::server::types::{AppState, NameRequest, SaveScriptRequest, SuccessResponse};
use crate::server::utils::validation::has_script_extension;
use actix_web::{web, HttpResponse, Result as ActixResult};

// GET /api/folders
pub async fn list_folders_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let folders = state.scripts.list_folders().await?;
    Ok(HttpResponse::Ok().json(folders))
}

// GET /api/scripts/{folder}
pub async fn list_scripts_handler(
    folder: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let scripts = state.scripts.list_scripts(&folder).await?;
    Ok(HttpResponse::Ok().json(scripts))
}

// POST /api/save/{folder}/{name}
pub async fn save_script_handler(
    path: web::Path<(String, String)>,
    body: web::Json<SaveScriptRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (folder, name) = path.into_inner();
    state
        .scripts
        .save_script(&folder, &name, &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

// DELETE /api/delete/{folder}/{name}
pub async fn delete_script_handler(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (folder, name) = path.into_inner();
    if state.scripts.delete_script(&folder, &name).await? {
        Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
    } else {
        Err(AppError::NotFound(format!("{}/{}", folder, name)).into())
    }
}

// POST /api/create-folder
pub async fn create_folder_handler(
    body: web::Json<NameRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    state.scripts.create_folder(body.name.trim()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

// POST /api/create-script/{folder}
pub async fn create_script_handler(
    folder: web::Path<String>,
    body: web::Json<NameRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let name = body.name.trim();
    // a missing extension is a bad request here, not a forbidden file
    if !has_script_extension(name, state.scripts.extension()) {
        return Err(AppError::Validation(format!(
            "Script name must end with {}",
            state.scripts.extension()
        ))
        .into());
    }
    state.scripts.create_script(&folder, name).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
