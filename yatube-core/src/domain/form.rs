use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::group::NewGroup;
use crate::domain::post::Post;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const INVALID_SLUG: &str =
    "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.";

const GROUP_TITLE_MAX: usize = 200;
const GROUP_SLUG_MAX: usize = 100;
const GROUP_DESCRIPTION_MAX: usize = 2000;
const IMAGE_NAME_MAX: usize = 100;

/// Field name -> messages, in a stable order for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Uploaded file as received from a multipart body.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ImageUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    fn validate(&self, errors: &mut FieldErrors) {
        if self.file_name.trim().is_empty() {
            errors.add("image", "No file was submitted. Check the encoding type on the form.");
        } else if self.file_name.chars().count() > IMAGE_NAME_MAX {
            errors.add(
                "image",
                format!("Ensure this filename has at most {IMAGE_NAME_MAX} characters."),
            );
        }
        if self.content.is_empty() {
            errors.add("image", EMPTY_FILE);
        } else if sniff_image(&self.content).is_none() {
            errors.add("image", INVALID_IMAGE);
        }
    }
}

/// Detects the image format from the leading bytes.
pub fn sniff_image(content: &[u8]) -> Option<&'static str> {
    if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        Some("gif")
    } else if content.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        Some("webp")
    } else if content.starts_with(b"BM") && content.len() > 14 {
        Some("bmp")
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// Post fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<ImageUpload>,
}

impl PostForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group = Some(group_id);
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Edit form populated from the stored post. The current image stays on
    /// the post; only a new upload replaces it.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
            image: None,
        }
    }

    pub fn validate(&self) -> Result<CleanPost, FieldErrors> {
        let mut errors = FieldErrors::default();
        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        if let Some(image) = &self.image {
            image.validate(&mut errors);
        }
        errors.into_result(CleanPost {
            text: text.to_string(),
            group_id: self.group,
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::default();
        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(text.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl GroupForm {
    pub fn validate(&self) -> Result<NewGroup, FieldErrors> {
        let mut errors = FieldErrors::default();

        let slug = self.slug.trim();
        if slug.is_empty() {
            errors.add("slug", REQUIRED);
        } else {
            if !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                errors.add("slug", INVALID_SLUG);
            }
            check_length(&mut errors, "slug", slug, GROUP_SLUG_MAX);
        }

        let title = non_blank(&self.title);
        if let Some(title) = title.as_deref() {
            check_length(&mut errors, "title", title, GROUP_TITLE_MAX);
        }
        let description = non_blank(&self.description);
        if let Some(description) = description.as_deref() {
            check_length(&mut errors, "description", description, GROUP_DESCRIPTION_MAX);
        }

        errors.into_result(NewGroup {
            title,
            slug: slug.to_string(),
            description,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF!\xF9\x04\x00\x00\x00\x00\x00,\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\n\x00;";

    #[test]
    fn blank_text_is_rejected() {
        let errors = PostForm::new("   \n").validate().unwrap_err();
        assert_eq!(errors.get("text"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn valid_post_is_trimmed() {
        let clean = PostForm::new("  hello  ").with_group(3).validate().unwrap();
        assert_eq!(clean.text, "hello");
        assert_eq!(clean.group_id, Some(3));
        assert!(clean.image.is_none());
    }

    #[test]
    fn gif_upload_is_accepted() {
        let form = PostForm::new("pic").with_image(ImageUpload::new("small.gif", SMALL_GIF.to_vec()));
        assert!(form.validate().is_ok());
        assert_eq!(sniff_image(SMALL_GIF), Some("gif"));
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let form = PostForm::new("pic")
            .with_image(ImageUpload::new("notes.txt", b"plain text".to_vec()));
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("image"), Some(&[INVALID_IMAGE.to_string()][..]));
        assert!(!errors.contains("text"));
    }

    #[test]
    fn empty_upload_is_rejected() {
        let form = PostForm::new("").with_image(ImageUpload::new("a.png", Vec::new()));
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["image", "text"]);
        assert_eq!(errors.get("image"), Some(&[EMPTY_FILE.to_string()][..]));
    }

    #[test]
    fn comment_requires_text() {
        assert!(CommentForm::new("").validate().is_err());
        assert_eq!(CommentForm::new(" nice ").validate().unwrap(), "nice");
    }

    #[test]
    fn group_form_rules() {
        let errors = GroupForm {
            title: "x".repeat(201),
            slug: "bad slug!".into(),
            description: String::new(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("title"));
        assert_eq!(errors.get("slug"), Some(&[INVALID_SLUG.to_string()][..]));

        let group = GroupForm {
            title: "  ".into(),
            slug: "cats_and-dogs".into(),
            description: "About pets".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(group.title, None);
        assert_eq!(group.slug, "cats_and-dogs");
        assert_eq!(group.description.as_deref(), Some("About pets"));
    }

    #[test]
    fn missing_slug_is_required() {
        let errors = GroupForm::default().validate().unwrap_err();
        assert_eq!(errors.get("slug"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.to_string(), format!("slug: {REQUIRED}"));
    }
}
