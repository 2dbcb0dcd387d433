use super::prelude::*;
use crate::catalog::TemplateCategory;

#[derive(Template, WebTemplate)]
#[template(path = "templates.html")]
pub(crate) struct TemplatesTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    categories: Vec<TemplateCategory>,
}

#[derive(Deserialize)]
pub(crate) struct SelectTemplateForm {
    csrf_token: String,
    category: String,
    name: String,
}

pub(crate) async fn templates_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<TemplatesTemplate, StudioError> {
    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = flash::take_flash_fields(&session).await?;
    Ok(TemplatesTemplate {
        csrf_token,
        has_flash,
        flash_message,
        flash_class,
        categories: state.catalog.template_categories.clone(),
    })
}

#[instrument(skip_all, fields(category = %form.category, name = %form.name))]
pub(crate) async fn select_template_handler(
    State(state): State<AppState>,
    session: Session,
    studio: CurrentStudio,
    Form(form): Form<SelectTemplateForm>,
) -> Result<Redirect, StudioError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let template = state
        .catalog
        .template(&form.category, &form.name)
        .ok_or_else(|| StudioError::NotFound(format!("template {}", form.name)))?
        .clone();
    studio.handle.state().await.select_template(template);
    flash::set_flash(&session, flash::FLASH_TEMPLATE_LOADED).await?;
    Ok(Redirect::to("/"))
}
