//! Order submission form and its multipart handler.
//!
//! - `GET /gwup` renders the form and any pending notices.
//! - `POST /gwup/process` spools the uploaded files, runs the ingestion
//!   pipeline and redirects back to the form with the outcome as notices.

use actix_multipart::{Field, Multipart};
use actix_web::cookie::Key;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use futures_util::StreamExt;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::api::flash;
use crate::db::DbPool;
use crate::error::{AppError, AppResult, IngestError};
use crate::models::{IngestionSummary, OrderFields, SkipReason};
use crate::services::{IngestionPipeline, SpooledFile, Upload};

/// Path of the form page; the handler redirects back here.
pub const FORM_PATH: &str = "/gwup";

/// Multipart field carrying the files.
const FILE_FIELD: &str = "input";

/// Upper bound for a single text field.
const MAX_TEXT_FIELD_LEN: usize = 4096;

/// Submission form; notices are rendered HTML-escaped.
const FORM_TEMPLATE: &str = include_str!("templates/upload_form.hbs");

const FORM_TEMPLATE_NAME: &str = "upload_form";

#[derive(Serialize)]
struct FormContext<'a> {
    messages: &'a [String],
}

/// Configure upload routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(process);
}

/// Render the submission form, consuming any pending notices.
#[get("/gwup", wrap = "crate::middleware::RequestLogger::new(\"index\")")]
async fn index(req: HttpRequest, key: web::Data<Key>) -> AppResult<HttpResponse> {
    let messages = flash::read(&req, &key);
    let body = render_form(&messages)?;

    let mut response = HttpResponse::Ok();
    response.content_type("text/html; charset=utf-8");
    if !messages.is_empty() {
        response.cookie(flash::removal_cookie());
    }

    Ok(response.body(body))
}

/// Accept a submission.
///
/// POST /gwup/process
/// Content-Type: multipart/form-data
///
/// Fields: `name`, `institution`, `email`, and any number of `input` files.
#[post("/gwup/process", wrap = "crate::middleware::RequestLogger::new(\"process\")")]
async fn process(
    mut payload: Multipart,
    pipeline: web::Data<IngestionPipeline<DbPool>>,
    max_upload_size: web::Data<usize>,
    key: web::Data<Key>,
) -> HttpResponse {
    let submission = match read_submission(&mut payload, *max_upload_size.get_ref()).await {
        Ok(submission) => submission,
        Err(AppError::PayloadTooLarge(msg)) => {
            warn!("Submission rejected: {}", msg);
            let notice = format!(
                "Upload exceeds the maximum size of {} MB",
                max_upload_size.get_ref() / 1024 / 1024
            );
            return redirect_with(&key, &[notice]);
        }
        Err(AppError::InvalidInput(msg)) => {
            warn!("Malformed submission: {}", msg);
            return HttpResponse::BadRequest()
                .content_type("text/html; charset=utf-8")
                .body("invalid request");
        }
        Err(e) => {
            error!("Failed to read submission: {}", e);
            return redirect_with(&key, &["Upload failed, please try again".to_string()]);
        }
    };

    info!(files = submission.uploads.len(), "Processing order submission");

    let Submission {
        fields,
        uploads,
        spool,
    } = submission;
    let result = pipeline.run(fields, uploads).await;
    // Spooled copies are no longer needed once the pipeline has run.
    drop(spool);

    if let Err(e) = &result {
        match e {
            IngestError::MissingFields { .. } => info!("Submission rejected: {}", e),
            _ => error!(code = e.code(), "Submission failed: {}", e),
        }
    }

    redirect_with(&key, &outcome_messages(&result))
}

/// Parsed form: order fields plus spooled files, in upload order.
struct Submission {
    fields: OrderFields,
    uploads: Vec<Upload>,
    /// Owns the spooled files; removed on drop.
    spool: TempDir,
}

/// Read every multipart field, spooling file parts to a private temp directory.
async fn read_submission(payload: &mut Multipart, max_upload_size: usize) -> AppResult<Submission> {
    let spool = tempfile::Builder::new()
        .prefix("order-intake-")
        .tempdir()
        .map_err(|e| AppError::FileSystem(format!("Failed to create spool directory: {}", e)))?;

    let mut fields = OrderFields::default();
    let mut uploads = Vec::new();
    let mut total_size: usize = 0;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let Some(disposition) = field.content_disposition() else {
            drain_field(&mut field).await?;
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(base_name);

        match (name.as_str(), filename) {
            (FILE_FIELD, Some(filename)) if !filename.is_empty() => {
                let spool_path = spool.path().join(format!("upload_{}", uploads.len()));
                let budget = max_upload_size.saturating_sub(total_size);
                total_size += spool_field(&mut field, &spool_path, budget).await?;
                uploads.push(Upload::new(filename, SpooledFile::new(spool_path)));
            }
            ("name", None) => fields.name = read_text_field(&mut field).await?,
            ("institution", None) => fields.institution = read_text_field(&mut field).await?,
            ("email", None) => fields.email = read_text_field(&mut field).await?,
            _ => drain_field(&mut field).await?,
        }
    }

    Ok(Submission {
        fields,
        uploads,
        spool,
    })
}

/// Stream one file part to `path`, failing once more than `budget` bytes arrive.
async fn spool_field(field: &mut Field, path: &Path, budget: usize) -> AppResult<usize> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to create spool file: {}", e)))?;

    let mut size: usize = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        size += chunk.len();
        if size > budget {
            return Err(AppError::PayloadTooLarge(format!("submission exceeds {} bytes", budget)));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to write spool file: {}", e)))?;
    }
    file.flush()
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to flush spool file: {}", e)))?;

    Ok(size)
}

async fn read_text_field(field: &mut Field) -> AppResult<String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_LEN {
            return Err(AppError::InvalidInput("Form field too long".to_string()));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Drain a multipart field without saving.
async fn drain_field(field: &mut Field) -> AppResult<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
    }
    Ok(())
}

/// Strip any client-side directory from an uploaded filename.
fn base_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Turn a pipeline result into user-facing notices.
fn outcome_messages(result: &Result<IngestionSummary, IngestError>) -> Vec<String> {
    match result {
        Ok(summary) => {
            let mut messages: Vec<String> = summary
                .skipped_files
                .iter()
                .map(|skipped| match &skipped.reason {
                    SkipReason::UnreadableUpload => {
                        format!("Error reading file {}", skipped.filename)
                    }
                    reason => format!("skipping file: {}. {}", skipped.filename, reason),
                })
                .collect();

            if summary.is_empty() {
                messages.push("No files were uploaded!".to_string());
            } else {
                messages.push(format!(
                    "Added {} files to order {}",
                    summary.stored_file_count, summary.order_number
                ));
            }
            messages
        }
        Err(IngestError::MissingFields { .. }) => vec!["Missing info".to_string()],
        Err(IngestError::AllocationExhausted { .. }) => {
            vec!["Can't create destination dir".to_string()]
        }
        Err(_) => vec!["Upload failed, please try again".to_string()],
    }
}

fn redirect_with(key: &Key, messages: &[String]) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, FORM_PATH))
        .cookie(flash::flash_cookie(key, messages))
        .finish()
}

fn render_form(messages: &[String]) -> AppResult<String> {
    let mut reg = Handlebars::new();
    reg.register_template_string(FORM_TEMPLATE_NAME, FORM_TEMPLATE)
        .map_err(|e| AppError::Template(e.to_string()))?;
    reg.render(FORM_TEMPLATE_NAME, &FormContext { messages })
        .map_err(|e| AppError::Template(e.to_string()))
}
