//! Submission and review of articles: draft form → pending → approved or deleted.

use std::{
    collections::HashSet,
    hash::Hash,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    articles::{Article, ArticleStore, Category, NewArticle, StoreError},
    format::generate_slug,
    media::{ImageHost, ImageUpload, UploadError},
};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit article. Please try again.";

/// Raw values posted by the submission form.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub author: String,
    pub title: String,
    pub category: Category,
    pub content: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingAuthor,
    MissingTitle,
    TitleTooLong,
    MissingContent,
    MissingImage,
    InvalidImageType,
    ImageTooLarge,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::MissingAuthor => "Author name is required",
            ValidationError::MissingTitle => "Article title is required",
            ValidationError::TitleTooLong => "Title should be less than 100 characters",
            ValidationError::MissingContent => "Article content is required",
            ValidationError::MissingImage => "Cover image is required",
            ValidationError::InvalidImageType => "Please upload a valid image file",
            ValidationError::ImageTooLarge => "Image size should be less than 2MB",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Submission that passed every client-side check, with text fields trimmed.
#[derive(Debug)]
struct ValidSubmission {
    author: String,
    title: String,
    category: Category,
    content: String,
    image: ImageUpload,
}

impl SubmissionForm {
    fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let author = self.author.trim();
        if author.is_empty() {
            return Err(ValidationError::MissingAuthor);
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong);
        }

        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::MissingContent);
        }

        let image = match self.image {
            Some(image) if !image.bytes.is_empty() => image,
            _ => return Err(ValidationError::MissingImage),
        };
        check_image(&image)?;

        Ok(ValidSubmission {
            author: author.to_string(),
            title: title.to_string(),
            category: self.category,
            content: content.to_string(),
            image,
        })
    }
}

/// Cover images must carry an `image/*` content type and stay within [`MAX_IMAGE_BYTES`].
pub fn check_image(image: &ImageUpload) -> Result<(), ValidationError> {
    let is_image = image
        .content_type
        .parse::<mime::Mime>()
        .map(|parsed| parsed.type_() == mime::IMAGE)
        .unwrap_or(false);
    if !is_image {
        return Err(ValidationError::InvalidImageType);
    }

    if image.size() > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge);
    }

    Ok(())
}

#[derive(Debug)]
pub enum SubmitError {
    Validation(ValidationError),
    Upload(UploadError),
    Store(StoreError),
}

impl SubmitError {
    /// Text shown inline on the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::Validation(err) => err.message(),
            SubmitError::Upload(_) | SubmitError::Store(_) => SUBMIT_FAILED_MESSAGE,
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Validation(err) => write!(f, "invalid submission: {err}"),
            SubmitError::Upload(err) => write!(f, "{err}"),
            SubmitError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        SubmitError::Validation(err)
    }
}

impl From<UploadError> for SubmitError {
    fn from(err: UploadError) -> Self {
        SubmitError::Upload(err)
    }
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        SubmitError::Store(err)
    }
}

/// Validates the form, uploads the cover image, then writes a pending record.
///
/// Nothing is persisted before the final create call, so a failed upload leaves no trace.
pub async fn submit(
    store: &dyn ArticleStore,
    host: &dyn ImageHost,
    form: SubmissionForm,
    now: DateTime<Utc>,
) -> Result<Article, SubmitError> {
    let valid = form.validate()?;
    let cover_image = host.upload(valid.image).await?;

    let article = store
        .create(NewArticle {
            slug: generate_slug(&valid.title, now),
            title: valid.title,
            content: valid.content,
            category: valid.category,
            cover_image,
            author: valid.author,
        })
        .await?;

    info!(id = %article.id, slug = %article.slug, "article submitted for review");
    Ok(article)
}

#[derive(Debug)]
pub enum ModerationError {
    NotFound(Uuid),
    Store(StoreError),
}

impl std::fmt::Display for ModerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationError::NotFound(id) => write!(f, "article {id} does not exist"),
            ModerationError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ModerationError {}

impl From<StoreError> for ModerationError {
    fn from(err: StoreError) -> Self {
        ModerationError::Store(err)
    }
}

/// Publishes an article. Approving twice simply re-stamps approver and time.
pub async fn approve(
    store: &dyn ArticleStore,
    id: Uuid,
    approver: &str,
) -> Result<Article, ModerationError> {
    let article = store
        .approve(id, approver)
        .await?
        .ok_or(ModerationError::NotFound(id))?;

    info!(%id, approver, "article approved");
    Ok(article)
}

/// Answer to the "delete permanently?" prompt shown before a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Denied,
}

impl Confirmation {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("yes") | Some("true") | Some("on") => Confirmation::Granted,
            _ => Confirmation::Denied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected,
    Cancelled,
}

/// Deletes a pending article once the moderator confirmed. No copy is kept.
pub async fn reject(
    store: &dyn ArticleStore,
    id: Uuid,
    confirmation: Confirmation,
) -> Result<RejectOutcome, ModerationError> {
    if confirmation == Confirmation::Denied {
        return Ok(RejectOutcome::Cancelled);
    }

    let article = store.get(id).await?.ok_or(ModerationError::NotFound(id))?;
    if !store.delete(id).await? {
        return Err(ModerationError::NotFound(id));
    }

    warn!(%id, title = %article.title, author = %article.author, "article rejected and deleted");
    Ok(RejectOutcome::Rejected)
}

/// Keys with an outstanding request. A second attempt on a busy key is refused while
/// other keys proceed; this is a duplicate-submit guard, not a lock on the article.
pub struct InFlight<K> {
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            active: Arc::clone(&self.active),
        }
    }
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self, key: K) -> Option<InFlightTicket<K>> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(key.clone()) {
            return None;
        }

        Some(InFlightTicket {
            active: Arc::clone(&self.active),
            key,
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self, key: &K) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }
}

/// Releases its key when dropped.
pub struct InFlightTicket<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightTicket<K> {
    fn drop(&mut self) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.key);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::articles::{ArticleStatus, MemoryArticleStore};

    /// Image host that records calls and returns a fixed URL.
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub(crate) calls: AtomicUsize,
        pub(crate) fail: bool,
    }

    impl RecordingHost {
        pub(crate) fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UploadError::new("media host returned 500"));
            }
            Ok(format!("https://img.example/{}", image.file_name))
        }
    }

    pub(crate) fn png(size: usize) -> ImageUpload {
        ImageUpload::new("cover.png", "image/png", vec![7; size])
    }

    pub(crate) fn complete_form() -> SubmissionForm {
        SubmissionForm {
            author: "  Ada Lovelace ".to_string(),
            title: " Search In 2024 ".to_string(),
            category: Category::Marketing,
            content: "Line one\nLine two\n".to_string(),
            image: Some(png(1024)),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn submit_creates_pending_article() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::default();

        let article = submit(&store, &host, complete_form(), fixed_now())
            .await
            .unwrap();

        assert_eq!(article.status, ArticleStatus::Pending);
        assert_eq!(article.author, "Ada Lovelace");
        assert_eq!(article.title, "Search In 2024");
        assert_eq!(article.content, "Line one\nLine two");
        assert_eq!(article.category, Category::Marketing);
        assert_eq!(article.cover_image, "https://img.example/cover.png");
        assert_eq!(
            article.slug,
            format!("search-in-2024-{}", fixed_now().timestamp_millis())
        );
        assert_eq!(host.calls(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn submit_with_missing_field_never_writes() {
        let cases: Vec<(SubmissionForm, ValidationError)> = vec![
            (
                SubmissionForm {
                    author: "   ".to_string(),
                    ..complete_form()
                },
                ValidationError::MissingAuthor,
            ),
            (
                SubmissionForm {
                    title: String::new(),
                    ..complete_form()
                },
                ValidationError::MissingTitle,
            ),
            (
                SubmissionForm {
                    content: "\n\n".to_string(),
                    ..complete_form()
                },
                ValidationError::MissingContent,
            ),
            (
                SubmissionForm {
                    image: None,
                    ..complete_form()
                },
                ValidationError::MissingImage,
            ),
        ];

        for (form, expected) in cases {
            let store = MemoryArticleStore::new();
            let host = RecordingHost::default();
            let err = submit(&store, &host, form, fixed_now()).await.unwrap_err();

            assert!(matches!(err, SubmitError::Validation(found) if found == expected));
            assert_eq!(host.calls(), 0);
            assert_eq!(store.len().await, 0);
        }
    }

    #[tokio::test]
    async fn oversized_image_fails_before_upload() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::default();
        let form = SubmissionForm {
            image: Some(png(3 * 1024 * 1024)),
            ..complete_form()
        };

        let err = submit(&store, &host, form, fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::ImageTooLarge)
        ));
        assert_eq!(err.user_message(), "Image size should be less than 2MB");
        assert_eq!(host.calls(), 0);
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn image_checks_cover_type_and_size() {
        assert!(check_image(&png(MAX_IMAGE_BYTES)).is_ok());
        assert_eq!(
            check_image(&png(MAX_IMAGE_BYTES + 1)),
            Err(ValidationError::ImageTooLarge)
        );
        assert_eq!(
            check_image(&ImageUpload::new("a.pdf", "application/pdf", vec![1])),
            Err(ValidationError::InvalidImageType)
        );
        assert_eq!(
            check_image(&ImageUpload::new("a", "", vec![1])),
            Err(ValidationError::InvalidImageType)
        );
    }

    #[tokio::test]
    async fn long_titles_are_rejected() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::default();
        let form = SubmissionForm {
            title: "x".repeat(MAX_TITLE_CHARS + 1),
            ..complete_form()
        };

        let err = submit(&store, &host, form, fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::TitleTooLong)
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn failed_upload_surfaces_generic_message() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::failing();

        let err = submit(&store, &host, complete_form(), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Upload(_)));
        assert_eq!(err.user_message(), SUBMIT_FAILED_MESSAGE);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn approve_stamps_approver_and_time() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::default();
        let draft = submit(&store, &host, complete_form(), fixed_now())
            .await
            .unwrap();

        let approved = approve(&store, draft.id, "a@b.com").await.unwrap();
        assert_eq!(approved.status, ArticleStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("a@b.com"));
        assert!(approved.approved_at.is_some());

        let stored = store.get(draft.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Approved);

        let again = approve(&store, draft.id, "c@d.com").await.unwrap();
        assert_eq!(again.approved_by.as_deref(), Some("c@d.com"));
    }

    #[tokio::test]
    async fn approve_unknown_id_is_not_found() {
        let store = MemoryArticleStore::new();
        let missing = Uuid::new_v4();
        let err = approve(&store, missing, "a@b.com").await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn reject_requires_confirmation() {
        let store = MemoryArticleStore::new();
        let host = RecordingHost::default();
        let draft = submit(&store, &host, complete_form(), fixed_now())
            .await
            .unwrap();

        let outcome = reject(&store, draft.id, Confirmation::Denied).await.unwrap();
        assert_eq!(outcome, RejectOutcome::Cancelled);
        let untouched = store.get(draft.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, ArticleStatus::Pending);

        let outcome = reject(&store, draft.id, Confirmation::Granted).await.unwrap();
        assert_eq!(outcome, RejectOutcome::Rejected);
        assert!(store.get(draft.id).await.unwrap().is_none());

        let err = reject(&store, draft.id, Confirmation::Granted)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
    }

    #[test]
    fn confirmation_flag_parsing() {
        assert_eq!(Confirmation::from_flag(Some("yes")), Confirmation::Granted);
        assert_eq!(Confirmation::from_flag(Some("true")), Confirmation::Granted);
        assert_eq!(Confirmation::from_flag(Some("no")), Confirmation::Denied);
        assert_eq!(Confirmation::from_flag(None), Confirmation::Denied);
    }

    #[test]
    fn in_flight_refuses_duplicates_until_released() {
        let guard: InFlight<Uuid> = InFlight::new();
        let key = Uuid::new_v4();
        let other = Uuid::new_v4();

        let ticket = guard.try_begin(key).expect("first attempt proceeds");
        assert!(guard.is_busy(&key));
        assert!(guard.try_begin(key).is_none());

        let other_ticket = guard.clone().try_begin(other);
        assert!(other_ticket.is_some());

        drop(ticket);
        assert!(!guard.is_busy(&key));
        assert!(guard.try_begin(key).is_some());
    }
}
