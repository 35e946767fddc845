use std::borrow::Cow;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use crate::{
    articles::Category,
    media::ImageUpload,
    moderation::{self, MAX_TITLE_CHARS, SubmissionForm, SubmitError},
    web::{
        AppState,
        templates::{PageLayout, escape_html, render_page},
    },
};

const BUSY_MESSAGE: &str = "This article is already being submitted. Please wait.";

/// Submission form as read from the request, plus the token identifying this form render.
pub struct SubmissionRequest {
    pub form_id: Option<Uuid>,
    pub form: SubmissionForm,
}

pub async fn create_page() -> Html<String> {
    Html(render_submission_page(
        &SubmissionForm::default(),
        None,
        Uuid::new_v4(),
    ))
}

pub async fn process_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, (StatusCode, Html<String>)> {
    let request = read_submission(multipart).await.map_err(|message| {
        (
            StatusCode::BAD_REQUEST,
            Html(render_submission_page(
                &SubmissionForm::default(),
                Some(&message),
                Uuid::new_v4(),
            )),
        )
    })?;

    handle_submission(&state, request).await
}

/// Runs the submit workflow once per form render; repeated posts of the same form while
/// the first is outstanding are turned away.
pub async fn handle_submission(
    state: &AppState,
    request: SubmissionRequest,
) -> Result<Redirect, (StatusCode, Html<String>)> {
    let SubmissionRequest { form_id, form } = request;
    let form_id = form_id.unwrap_or_else(Uuid::new_v4);

    let Some(_ticket) = state.submissions().try_begin(form_id) else {
        return Err((
            StatusCode::CONFLICT,
            Html(render_submission_page(&form, Some(BUSY_MESSAGE), form_id)),
        ));
    };

    let echo = SubmissionForm {
        author: form.author.clone(),
        title: form.title.clone(),
        category: form.category.clone(),
        content: form.content.clone(),
        image: None,
    };

    match moderation::submit(state.articles(), state.images(), form, Utc::now()).await {
        Ok(_) => Ok(Redirect::to("/?status=submitted")),
        Err(err) => {
            let status = match &err {
                SubmitError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SubmitError::Upload(_) => StatusCode::BAD_GATEWAY,
                SubmitError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if !matches!(err, SubmitError::Validation(_)) {
                error!(?err, "article submission failed");
            }
            Err((
                status,
                Html(render_submission_page(
                    &echo,
                    Some(err.user_message()),
                    form_id,
                )),
            ))
        }
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionRequest, String> {
    let mut form = SubmissionForm::default();
    let mut form_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("Could not read the submitted form: {err}"))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| format!("Could not read the cover image: {err}"))?;

            if !file_name.is_empty() || !bytes.is_empty() {
                form.image = Some(ImageUpload::new(file_name, content_type, bytes.to_vec()));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| format!("Could not read field `{name}`: {err}"))?;

        match name.as_str() {
            "author" => form.author = value,
            "title" => form.title = value,
            "content" => form.content = value,
            "category" => form.category = Category::from_str(&value),
            "form_id" => form_id = Uuid::parse_str(value.trim()).ok(),
            _ => {}
        }
    }

    Ok(SubmissionRequest { form_id, form })
}

fn render_submission_page(form: &SubmissionForm, error: Option<&str>, form_id: Uuid) -> String {
    let flash = error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let options = Category::OFFERED
        .iter()
        .map(|category| {
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = escape_html(category.as_str()),
                selected = if *category == form.category {
                    " selected"
                } else {
                    ""
                },
            )
        })
        .collect::<String>();

    let body = format!(
        r#"        <section class="panel">
            <form method="post" action="/create" enctype="multipart/form-data">
                <input type="hidden" name="form_id" value="{form_id}">
                <label for="author">Author name</label>
                <input id="author" name="author" value="{author}" required>
                <label for="title">Article title</label>
                <input id="title" name="title" value="{title}" maxlength="{max_title}" required>
                <label for="category">Category</label>
                <select id="category" name="category">{options}</select>
                <label for="content">Content</label>
                <textarea id="content" name="content" rows="10" required>{content}</textarea>
                <label for="image">Cover image (max 2MB)</label>
                <input id="image" type="file" name="image" accept="image/*" required>
                <div class="actions">
                    <button type="reset" class="secondary">Clear</button>
                    <button type="submit">Submit for Review</button>
                </div>
            </form>
        </section>
        <p class="note"><strong>Tip:</strong> Clear structure and headings improve SEO and readability.</p>"#,
        author = escape_html(&form.author),
        title = escape_html(&form.title),
        content = escape_html(&form.content),
        max_title = MAX_TITLE_CHARS,
    );

    render_page(PageLayout {
        meta_title: "Create article",
        heading: "Create Article",
        subtitle: Some("Share your insights and knowledge with the community"),
        admin_nav: false,
        flash_html: Cow::Owned(flash),
        body_html: Cow::Owned(body),
    })
}
