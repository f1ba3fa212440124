//! Attachment encoding
//!
//! Turns one [`Attachment`] into the content part spliced into a multimodal
//! message. Encoding never fails: anything that cannot be decoded becomes a
//! text part telling the model the file was unreadable.

use crate::message::{Attachment, AttachmentKind, ContentPart, ImageDetail, ImageUrl};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

/// Maximum number of characters of a text file forwarded to the model
pub const MAX_TEXT_ATTACHMENT_CHARS: usize = 8000;

const PDF_MIME: &str = "application/pdf";
const TEXT_MIME: &str = "text/plain";

/// Standard alphabet, padding optional
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encode one attachment as a content part
pub fn encode(attachment: &Attachment) -> ContentPart {
    match attachment.kind {
        AttachmentKind::Image => ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", attachment.mime_type, attachment.data),
                detail: ImageDetail::Auto,
            },
        },
        AttachmentKind::Document => ContentPart::text(describe_document(attachment)),
    }
}

fn describe_document(attachment: &Attachment) -> String {
    let name = &attachment.name;
    match attachment.mime_type.as_str() {
        PDF_MIME => format!(
            "[User attached a PDF document named \"{name}\". Treat its content as context and provide relevant social media / content advice based on it.]"
        ),
        TEXT_MIME => match decode_text(&attachment.data) {
            Some(text) => format!(
                "[User attached a text file named \"{name}\". Here is its content:\n\n{text}]"
            ),
            None => {
                tracing::warn!("Could not decode text attachment '{}'", name);
                format!("[User attached a text file named \"{name}\" but it could not be read.]")
            }
        },
        other => format!(
            "[User attached a document named \"{name}\" ({other}). Acknowledge this and let them know you can best work with plain text, PDF, or image files for analysis.]"
        ),
    }
}

/// Decode base64 text, keeping at most [`MAX_TEXT_ATTACHMENT_CHARS`].
///
/// Line breaks and other ASCII whitespace are ignored. Invalid UTF-8 is
/// replaced rather than rejected; only data that is not base64 yields `None`.
fn decode_text(data: &str) -> Option<String> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = LENIENT.decode(compact).ok()?;
    Some(
        String::from_utf8_lossy(&bytes)
            .chars()
            .take(MAX_TEXT_ATTACHMENT_CHARS)
            .collect(),
    )
}
