use super::prelude::*;
use super::views::SelectOption;

#[derive(Template, WebTemplate)]
#[template(path = "captions.html")]
pub(crate) struct CaptionsTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    has_error: bool,
    error_message: String,
    kinds: Vec<SelectOption>,
    context: String,
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct CaptionsForm {
    csrf_token: String,
    kind: String,
    #[serde(default)]
    context: String,
}

impl CaptionsTemplate {
    fn new(state: &AppState, csrf_token: String, kind: &str, context: String) -> Self {
        let kinds = state
            .catalog
            .caption_types
            .iter()
            .map(|caption_type| SelectOption::new(&caption_type.name, &caption_type.name, kind))
            .collect();
        Self {
            csrf_token,
            has_flash: false,
            flash_message: String::new(),
            flash_class: String::new(),
            has_error: false,
            error_message: String::new(),
            kinds,
            context,
            suggestions: Vec::new(),
        }
    }
}

pub(crate) async fn captions_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<CaptionsTemplate, StudioError> {
    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = flash::take_flash_fields(&session).await?;
    let first = state
        .catalog
        .caption_types
        .first()
        .map(|caption_type| caption_type.name.clone())
        .unwrap_or_default();
    Ok(CaptionsTemplate {
        has_flash,
        flash_message,
        flash_class,
        ..CaptionsTemplate::new(&state, csrf_token, &first, String::new())
    })
}

pub(crate) async fn captions_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CaptionsForm>,
) -> Result<Response, StudioError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let csrf_token = csrf_token(&session).await?;
    let mut page = CaptionsTemplate::new(&state, csrf_token, &form.kind, form.context.clone());
    match state.catalog.caption_suggestions(&form.kind, &form.context) {
        Some(suggestions) => {
            debug!("{} caption suggestions for {}", suggestions.len(), form.kind);
            page.suggestions = suggestions;
            Ok(page.into_response())
        }
        None => {
            let error = StudioError::Validation(format!("Unknown caption type: {}", form.kind));
            page.has_error = true;
            page.error_message = error.user_message();
            Ok((error.status(), page).into_response())
        }
    }
}
