use axum::http::HeaderMap;
use axum::http::header::CONTENT_DISPOSITION;

use super::csrf::CsrfForm;
use super::images::{
    DownloadCacheHeaders, apply_cache_headers, is_not_modified, not_modified_response,
};
use super::prelude::*;
use crate::export::ExportFormat;
use crate::session::Design;

#[derive(Clone, Debug)]
pub(crate) struct HistoryItem {
    id: u64,
    prompt: String,
    time_caption: String,
    width: u32,
    height: u32,
}

impl From<&Arc<Design>> for HistoryItem {
    fn from(design: &Arc<Design>) -> Self {
        Self {
            id: design.id,
            prompt: design.request.prompt.clone(),
            time_caption: design.time_caption(),
            width: design.image.width(),
            height: design.image.height(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DownloadLink {
    slug: &'static str,
    label: &'static str,
    file_name: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "history.html")]
pub(crate) struct HistoryTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    designs: Vec<HistoryItem>,
}

#[derive(Template, WebTemplate)]
#[template(path = "design.html")]
pub(crate) struct DesignTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    design: HistoryItem,
    full_prompt: String,
    style_name: String,
    downloads: Vec<DownloadLink>,
}

#[derive(Deserialize)]
pub(crate) struct DownloadPath {
    id: u64,
    format: String,
}

async fn find_design(studio: &CurrentStudio, id: u64) -> Result<Arc<Design>, StudioError> {
    studio
        .handle
        .state()
        .await
        .find(id)
        .ok_or_else(|| StudioError::NotFound(format!("design {id}")))
}

pub(crate) async fn history_page(
    session: Session,
    studio: CurrentStudio,
) -> Result<HistoryTemplate, StudioError> {
    let designs = studio
        .handle
        .state()
        .await
        .history()
        .iter()
        .map(HistoryItem::from)
        .collect();
    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = flash::take_flash_fields(&session).await?;
    Ok(HistoryTemplate {
        csrf_token,
        has_flash,
        flash_message,
        flash_class,
        designs,
    })
}

pub(crate) async fn clear_history_handler(
    session: Session,
    studio: CurrentStudio,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, StudioError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let dropped = studio.handle.state().await.clear_history();
    info!("Cleared {} designs from history", dropped);
    flash::set_flash(&session, flash::FLASH_HISTORY_CLEARED).await?;
    Ok(Redirect::to("/designs"))
}

pub(crate) async fn design_page(
    session: Session,
    studio: CurrentStudio,
    Path(id): Path<u64>,
) -> Result<DesignTemplate, StudioError> {
    let design = find_design(&studio, id).await?;
    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = flash::take_flash_fields(&session).await?;
    let downloads = ExportFormat::ALL
        .into_iter()
        .map(|format| DownloadLink {
            slug: format.slug(),
            label: format.label(),
            file_name: format.file_name(),
        })
        .collect();
    debug!("Showing design {}", id);
    Ok(DesignTemplate {
        csrf_token,
        has_flash,
        flash_message,
        flash_class,
        full_prompt: design.request.full_prompt.clone(),
        style_name: design.request.style_name.clone(),
        design: HistoryItem::from(&design),
        downloads,
    })
}

pub(crate) async fn download_handler(
    studio: CurrentStudio,
    headers: HeaderMap,
    Path(path): Path<DownloadPath>,
) -> Result<Response, StudioError> {
    let format: ExportFormat = path
        .format
        .parse()
        .map_err(|_| StudioError::BadRequest)?;
    let design = find_design(&studio, path.id).await?;

    let cache_headers = DownloadCacheHeaders::for_design(&design, format);
    if is_not_modified(&headers, &cache_headers) {
        return not_modified_response(&cache_headers);
    }

    let encoding = design.clone();
    let bytes = tokio::task::spawn_blocking(move || format.encode(&encoding.image)).await??;
    debug!(
        "Encoded design {} as {} ({} bytes)",
        design.id,
        format.slug(),
        bytes.len()
    );

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        format.file_name()
    ))
    .map_err(|err| StudioError::InternalServerError(err.to_string()))?;
    let builder = Response::builder()
        .header(CONTENT_TYPE, format.mime())
        .header(CONTENT_DISPOSITION, disposition);
    apply_cache_headers(builder, &cache_headers)
        .body(axum::body::Body::from(bytes))
        .map_err(StudioError::from)
}
