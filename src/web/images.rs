use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use httpdate::{fmt_http_date, parse_http_date};

use crate::constants::DOWNLOAD_CACHE_CONTROL;
use crate::error::StudioError;
use crate::export::ExportFormat;
use crate::session::Design;

/// Cache validators for one encoded variant of a design.
#[derive(Clone, Debug)]
pub(crate) struct DownloadCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: SystemTime,
}

impl DownloadCacheHeaders {
    /// Designs never change once recorded, so the id, creation time and
    /// format identify the bytes.
    pub(crate) fn for_design(design: &Design, format: ExportFormat) -> Self {
        let seconds = u64::try_from(design.created_at.timestamp()).unwrap_or_default();
        let modified_at = UNIX_EPOCH + Duration::from_secs(seconds);
        let etag =
            HeaderValue::from_str(&format!("W/\"{}-{}-{}\"", design.id, seconds, format.slug()))
                .ok();
        let last_modified = HeaderValue::from_str(&fmt_http_date(modified_at)).ok();
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }

    pub(crate) fn etag(&self) -> Option<&HeaderValue> {
        self.etag.as_ref()
    }

    pub(crate) fn last_modified(&self) -> Option<&HeaderValue> {
        self.last_modified.as_ref()
    }
}

/// Applies download cache headers to a response builder.
pub(crate) fn apply_cache_headers(mut builder: Builder, cache: &DownloadCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, DOWNLOAD_CACHE_CONTROL.as_str());
    if let Some(etag) = cache.etag() {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = cache.last_modified() {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
pub(crate) fn is_not_modified(headers: &HeaderMap, cache: &DownloadCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if let Ok(value) = if_none_match.to_str() {
            let value = value.trim();
            if value == "*" {
                return true;
            }
            if let Some(etag) = cache.etag().and_then(|value| value.to_str().ok())
                && value.split(',').any(|candidate| candidate.trim() == etag)
            {
                return true;
            }
        }
        return false;
    }

    if let Some(if_modified_since) = headers.get(IF_MODIFIED_SINCE)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
        && cache.modified_at <= since
    {
        return true;
    }

    false
}

/// Builds a 304 response that preserves cache headers.
pub(crate) fn not_modified_response(cache: &DownloadCacheHeaders) -> Result<Response, StudioError> {
    let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    let builder = apply_cache_headers(builder, cache);
    builder.body(Body::empty()).map_err(StudioError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Local, TimeZone};
    use image::{Rgba, RgbaImage};

    use crate::catalog::Catalog;
    use crate::design::DesignForm;

    fn design() -> Design {
        let catalog = Catalog::bundled().expect("catalog");
        let request = DesignForm {
            prompt: "poster".to_string(),
            ..DesignForm::for_catalog(&catalog)
        }
        .validate(&catalog)
        .expect("valid");
        Design {
            id: 7,
            image: RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
            created_at: Local
                .timestamp_opt(1_700_000_000, 500_000_000)
                .single()
                .expect("timestamp"),
            request,
        }
    }

    #[test]
    fn etag_differs_per_format() {
        let design = design();
        let png = DownloadCacheHeaders::for_design(&design, ExportFormat::Png);
        let jpg = DownloadCacheHeaders::for_design(&design, ExportFormat::Jpeg);
        assert_eq!(
            png.etag().expect("etag"),
            &HeaderValue::from_static("W/\"7-1700000000-png\"")
        );
        assert_ne!(png.etag(), jpg.etag());
    }

    #[test]
    fn conditional_requests() {
        let cache = DownloadCacheHeaders::for_design(&design(), ExportFormat::Web);

        let mut headers = HeaderMap::new();
        headers.insert(
            IF_NONE_MATCH,
            HeaderValue::from_static("\"other\", W/\"7-1700000000-web\""),
        );
        assert!(is_not_modified(&headers, &cache));

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"8-1-web\""));
        assert!(!is_not_modified(&headers, &cache));

        let mut headers = HeaderMap::new();
        let last_modified = cache.last_modified().expect("last modified").clone();
        headers.insert(IF_MODIFIED_SINCE, last_modified);
        assert!(is_not_modified(&headers, &cache));

        assert!(!is_not_modified(&HeaderMap::new(), &cache));
    }
}
