use std::convert::Infallible;

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse, Responder};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::constants::{
    MESSAGE_CAN_NOT_DELETE_DATA, MESSAGE_CAN_NOT_FETCH_DATA, MESSAGE_CAN_NOT_INSERT_DATA,
    MESSAGE_CAN_NOT_UPDATE_DATA, MESSAGE_FILE_CREATED, MESSAGE_FILE_EXISTS, MIME_EVENT_STREAM,
};
use crate::error::StoreError;
use crate::model::NewFile;
use crate::notify::Subscriber;
use crate::repo::FileRepo;

#[derive(Deserialize)]
pub struct DescriptionReq {
    #[serde(default)]
    pub description: String,
}

pub struct FileHandler;

impl FileHandler {

    pub async fn get_files(repo: web::Data<FileRepo>) -> impl Responder {
        match repo.list_all().await {
            Ok(files) => HttpResponse::Ok().json(files),
            Err(e) => storage_failure(MESSAGE_CAN_NOT_FETCH_DATA, &e),
        }
    }

    pub async fn get_file_by_id(
        repo: web::Data<FileRepo>,
        file_id: web::Path<String>,
    ) -> impl Responder {
        match repo.get_by_file_id(&file_id).await {
            Ok(Some(file)) => HttpResponse::Ok().json(file),
            Ok(None) => HttpResponse::NoContent().finish(),
            Err(e) => storage_failure(MESSAGE_CAN_NOT_FETCH_DATA, &e),
        }
    }

    pub async fn create_file(
        repo: web::Data<FileRepo>,
        file: web::Json<NewFile>,
    ) -> impl Responder {
        match repo.insert(&file).await {
            Ok(true) => HttpResponse::Created().json(MESSAGE_FILE_CREATED),
            Ok(false) => HttpResponse::Ok().json(MESSAGE_FILE_EXISTS),
            Err(e) if !e.is_storage() => HttpResponse::BadRequest().body(e.to_string()),
            Err(e) => storage_failure(MESSAGE_CAN_NOT_INSERT_DATA, &e),
        }
    }

    pub async fn delete_file(
        repo: web::Data<FileRepo>,
        file_id: web::Path<String>,
    ) -> impl Responder {
        log::info!("## Deleting file: {}", file_id);
        match repo.delete_by_file_id(&file_id).await {
            Ok(deleted) => HttpResponse::Ok().json(json!({ "deleted": deleted })),
            Err(e) => storage_failure(MESSAGE_CAN_NOT_DELETE_DATA, &e),
        }
    }

    pub async fn update_description(
        repo: web::Data<FileRepo>,
        file_id: web::Path<String>,
        body: web::Json<DescriptionReq>,
    ) -> impl Responder {
        match repo.update_description_by_file_id(&file_id, &body.description).await {
            Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
            Err(e) => storage_failure(MESSAGE_CAN_NOT_UPDATE_DATA, &e),
        }
    }

    /// Server-sent events, one `data:` frame per change notification.
    pub async fn events(subscriber: web::Data<Subscriber>) -> impl Responder {
        let stream = subscriber
            .get_ref()
            .clone()
            .into_stream()
            .filter_map(|event| async move {
                match event.to_json() {
                    Ok(payload) => Some(Ok::<_, Infallible>(Bytes::from(format!("data: {}\n\n", payload)))),
                    Err(e) => {
                        log::error!("failed to encode {:?}: {}", event, e);
                        None
                    }
                }
            });

        HttpResponse::Ok()
            .content_type(MIME_EVENT_STREAM)
            .insert_header(("Cache-Control", "no-cache"))
            .streaming(stream)
    }
}

fn storage_failure(message: &str, e: &StoreError) -> HttpResponse {
    log::error!("{}: {}", message, e);
    HttpResponse::InternalServerError().body(message.to_string())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/files", web::get().to(FileHandler::get_files))
        .route("/files", web::post().to(FileHandler::create_file))
        .route("/files/{file_id}", web::get().to(FileHandler::get_file_by_id))
        .route("/files/{file_id}", web::delete().to(FileHandler::delete_file))
        .route("/files/{file_id}/description", web::put().to(FileHandler::update_description))
        .route("/events", web::get().to(FileHandler::events));
}
