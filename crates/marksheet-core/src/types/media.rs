//! Accepted upload media types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{MarksheetError, MarksheetResult};

/// Media types the extraction pipeline accepts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
pub enum MediaType {
    #[strum(serialize = "image/jpeg")]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    #[serde(rename = "image/png")]
    Png,
    #[strum(serialize = "application/pdf")]
    #[serde(rename = "application/pdf")]
    Pdf,
}

impl MediaType {
    /// Parse a `Content-Type` value, ignoring parameters and case.
    pub fn parse(content_type: &str) -> MarksheetResult<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        Self::from_str(&essence)
            .map_err(|_| MarksheetError::unsupported_media_type(content_type.trim()))
    }

    /// The canonical MIME string.
    pub fn as_mime(&self) -> &'static str {
        self.into()
    }

    /// Whether the content goes through OCR.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }

    /// All accepted MIME strings.
    pub fn accepted() -> Vec<&'static str> {
        Self::iter().map(|m| m.as_mime()).collect()
    }
}
