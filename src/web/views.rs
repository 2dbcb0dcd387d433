use rand::RngExt;

use super::csrf::CsrfForm;
use super::prelude::*;
use crate::compositor::VerticalAnchor;
use crate::constants::{CUSTOM_DIMENSION_RANGE, TEXT_SIZE_RANGE};
use crate::design::{DesignForm, DesignRequest, ENHANCER_FIELD_PREFIX};
use crate::session::{Design, StudioHandle, StudioSession};

#[derive(Clone, Debug)]
pub(crate) struct SelectOption {
    pub(crate) value: String,
    pub(crate) label: String,
    pub(crate) selected: bool,
}

impl SelectOption {
    pub(crate) fn new(value: &str, label: &str, current: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: value == current,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct EnhancerView {
    field: String,
    label: String,
    help: String,
    checked: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "create.html")]
pub(crate) struct CreateTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    has_error: bool,
    error_message: String,
    has_tip: bool,
    purpose_tip: String,
    has_current: bool,
    current_id: u64,
    purposes: Vec<SelectOption>,
    sizes: Vec<SelectOption>,
    styles: Vec<SelectOption>,
    positions: Vec<SelectOption>,
    enhancers: Vec<EnhancerView>,
    min_dimension: u32,
    max_dimension: u32,
    min_text_size: u32,
    max_text_size: u32,
    form: DesignForm,
    effects_enabled: bool,
}

impl CreateTemplate {
    fn new(
        state: &AppState,
        form: DesignForm,
        csrf_token: String,
        flash: (bool, String, String),
        error: Option<String>,
        current: Option<Arc<Design>>,
    ) -> Self {
        let catalog = &state.catalog;
        let (has_flash, flash_message, flash_class) = flash;
        let purpose_tip = catalog.purpose_tip(&form.purpose);
        let purposes = catalog
            .purposes
            .iter()
            .map(|purpose| SelectOption::new(purpose, purpose, &form.purpose))
            .collect();
        let sizes = catalog
            .sizes
            .iter()
            .map(|size| {
                let label = if size.custom {
                    size.name.clone()
                } else {
                    format!("{} ({}×{})", size.name, size.width, size.height)
                };
                SelectOption::new(&size.name, &label, &form.size)
            })
            .collect();
        let styles = catalog
            .styles
            .iter()
            .map(|style| SelectOption::new(&style.name, &style.name, &form.style))
            .collect();
        let positions = VerticalAnchor::ALL
            .into_iter()
            .map(|anchor| SelectOption::new(anchor.value(), anchor.label(), &form.position))
            .collect();
        let enhancers = catalog
            .enhancers
            .iter()
            .map(|enhancer| EnhancerView {
                field: format!("{ENHANCER_FIELD_PREFIX}{}", enhancer.key),
                label: enhancer.label.clone(),
                help: enhancer.help.clone(),
                checked: form.enhancer_selected(&enhancer.key),
            })
            .collect();

        Self {
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
            has_error: error.is_some(),
            error_message: error.unwrap_or_default(),
            has_tip: purpose_tip.is_some(),
            purpose_tip: purpose_tip.unwrap_or_default(),
            has_current: current.is_some(),
            current_id: current.map(|design| design.id).unwrap_or_default(),
            purposes,
            sizes,
            styles,
            positions,
            enhancers,
            min_dimension: *CUSTOM_DIMENSION_RANGE.start(),
            max_dimension: *CUSTOM_DIMENSION_RANGE.end(),
            min_text_size: *TEXT_SIZE_RANGE.start(),
            max_text_size: *TEXT_SIZE_RANGE.end(),
            effects_enabled: form.effects.is_some(),
            form,
        }
    }
}

/// Form shown on `/`: a selected template's prompt wins, otherwise the
/// settings of the current design carry over.
fn starting_form(state: &AppState, studio: &StudioSession) -> DesignForm {
    let mut form = match studio.current() {
        Some(design) => design.request.form.clone(),
        None => DesignForm::for_catalog(&state.catalog),
    };
    if let Some(template) = studio.selected_template() {
        form.prompt = template.prompt.clone();
    }
    form
}

/// handles the / GET
pub(crate) async fn create_page(
    State(state): State<AppState>,
    session: Session,
    studio: CurrentStudio,
) -> Result<CreateTemplate, StudioError> {
    let (form, current) = {
        let studio = studio.handle.state().await;
        (starting_form(&state, &studio), studio.current())
    };
    let csrf_token = csrf_token(&session).await?;
    let flash = flash::take_flash_fields(&session).await?;
    Ok(CreateTemplate::new(
        &state, form, csrf_token, flash, None, current,
    ))
}

/// Generates, finishes and records one design. Only one generation per
/// studio runs at a time; nothing is recorded when any step fails.
#[instrument(skip_all, fields(width = request.width, height = request.height))]
pub(crate) async fn run_generation(
    state: &AppState,
    studio: &StudioHandle,
    request: DesignRequest,
) -> Result<Arc<Design>, StudioError> {
    let Some(_generating) = studio.try_begin_generation() else {
        info!("Rejected overlapping generation");
        return Err(StudioError::Busy);
    };

    let raw = state
        .generator
        .fetch(
            &request.full_prompt,
            request.width,
            request.height,
            &request.style_keywords,
        )
        .await?;

    let fonts = state.fonts.clone();
    let finishing = request.clone();
    let finished =
        tokio::task::spawn_blocking(move || finishing.finish(&raw, fonts.as_ref())).await?;

    let mut studio = studio.state().await;
    let design = studio.record(finished, request);
    studio.take_template();
    info!("Recorded design {}", design.id);
    Ok(design)
}

/// Re-renders the create form with the error, keeping what was typed.
async fn form_with_error(
    state: &AppState,
    session: &Session,
    studio: &StudioHandle,
    form: DesignForm,
    error: &StudioError,
) -> Result<Response, StudioError> {
    let status = error.status();
    let message = error.user_message();
    let current = studio.state().await.current();
    let csrf_token = csrf_token(session).await?;
    let page = CreateTemplate::new(
        state,
        form,
        csrf_token,
        (false, String::new(), String::new()),
        Some(message),
        current,
    );
    Ok((status, page).into_response())
}

async fn generate_or_show_error(
    state: &AppState,
    session: &Session,
    studio: &StudioHandle,
    request: DesignRequest,
) -> Result<Response, StudioError> {
    let form = request.form.clone();
    match run_generation(state, studio, request).await {
        Ok(design) => Ok(Redirect::to(&format!("/designs/{}", design.id)).into_response()),
        Err(
            error @ (StudioError::Busy
            | StudioError::Generation(_)
            | StudioError::Validation(_)),
        ) => form_with_error(state, session, studio, form, &error).await,
        Err(error) => Err(error),
    }
}

pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    session: Session,
    studio: CurrentStudio,
    Form(form): Form<DesignForm>,
) -> Result<Response, StudioError> {
    validate_csrf(&session, form.csrf_token()).await?;
    match form.validate(&state.catalog) {
        Ok(request) => generate_or_show_error(&state, &session, &studio.handle, request).await,
        Err(reason) => {
            form_with_error(
                &state,
                &session,
                &studio.handle,
                form,
                &StudioError::Validation(reason),
            )
            .await
        }
    }
}

pub(crate) async fn remix_handler(
    State(state): State<AppState>,
    session: Session,
    studio: CurrentStudio,
    Form(form): Form<CsrfForm>,
) -> Result<Response, StudioError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let current = studio.handle.state().await.current();
    let Some(design) = current else {
        flash::set_flash(&session, flash::FLASH_NOTHING_TO_REMIX).await?;
        return Ok(Redirect::to("/").into_response());
    };
    debug!("Remixing design {}", design.id);
    generate_or_show_error(&state, &session, &studio.handle, design.request.clone()).await
}

pub(crate) async fn surprise_handler(
    State(state): State<AppState>,
    session: Session,
    studio: CurrentStudio,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, StudioError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let templates: Vec<_> = state.catalog.templates().collect();
    if templates.is_empty() {
        return Err(StudioError::NotFound("templates".to_string()));
    }
    let pick = rand::rng().random_range(0..templates.len());
    if let Some(template) = templates.get(pick) {
        debug!("Surprise template {}", template.name);
        studio
            .handle
            .state()
            .await
            .select_template((*template).clone());
    }
    flash::set_flash(&session, flash::FLASH_SURPRISE).await?;
    Ok(Redirect::to("/"))
}
