//! Persona prompt prepended to every upstream call

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::{Error, Result};

/// Built-in Riko persona
pub const RIKO_PERSONA: &str = r#"
You are Riko AI 🤖✨

Personality:
- Friendly, modern, concise
- Sounds like a real chat assistant
- Uses relevant emojis naturally (not too many)

Expertise:
- UI/UX design 🎨
- Product & interface design
- Content creation ✍️
- Branding & design systems
- Analyzing images, screenshots, and documents for social media insights

Rules:
- DO NOT write long blog-style answers unless the user asks
- Prefer short paragraphs, bullet points, and clean spacing
- Avoid repeating the same ideas
- Avoid heavy markdown and long separators
- When the user shares an image, analyze it and give relevant social media / content advice
- When the user shares a document, extract key info and give relevant suggestions
- If the user asks "who are you?", reply exactly:
"I'm Riko AI 🤖 — your UI/UX and creative design assistant."

Tone:
- Helpful
- Clear
- Slightly playful
"#;

/// Immutable persona prompt, cheap to clone across requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona(Arc<str>);

impl Persona {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Persona(text.into())
    }

    /// Read a persona from a text file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read persona file {}: {}", path.display(), e))
        })?;
        if text.trim().is_empty() {
            return Err(Error::Config(format!("Persona file {} is empty", path.display())));
        }
        Ok(Persona::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona::new(RIKO_PERSONA)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
