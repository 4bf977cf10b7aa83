//! File upload endpoint.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Accept a multipart `file` field and store it in the upload directory.
///
/// The stored name is the original one, sanitized and prefixed with a
/// UUID so repeated uploads never collide.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Unreadable multipart body: {}", e);
                return soft_error("Unreadable multipart body");
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        if original.is_empty() {
            return soft_error("No file selected");
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read upload {}: {}", original, e);
                return soft_error("Failed to read uploaded file");
            }
        };

        let filename = format!("{}_{}", Uuid::new_v4().simple(), sanitize(&original));
        let path = state.upload_dir.join(&filename);
        if let Err(e) = tokio::fs::write(&path, &data).await {
            error!("Failed to store upload at {}: {}", path.display(), e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "Failed to store file" })),
            );
        }

        info!("Stored upload {} ({} bytes)", filename, data.len());
        return (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "File uploaded",
                "filename": filename,
            })),
        );
    }

    soft_error("Missing file field")
}

fn soft_error(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "message": message })),
    )
}

/// Strip directories and anything outside `[A-Za-z0-9._-]`.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\docs\\resume.docx"), "resume.docx");
        assert_eq!(sanitize("nota fiscal (2).pdf"), "nota_fiscal__2_.pdf");
    }
}
