//! Document slots and attached files.

use crate::validation::ErrorKind;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Media types accepted for application documents and examination screenshots.
pub const ALLOWED_DOCUMENT_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// A named document upload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    HonorableDismissal,
    Tor,
    GeneralWeightedAverage,
    BirthCertificate,
    IdPicture,
    MarriageCertificate,
}

impl DocumentSlot {
    /// Slots in upload order.
    pub const ALL: [DocumentSlot; 6] = [
        DocumentSlot::HonorableDismissal,
        DocumentSlot::Tor,
        DocumentSlot::GeneralWeightedAverage,
        DocumentSlot::BirthCertificate,
        DocumentSlot::IdPicture,
        DocumentSlot::MarriageCertificate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DocumentSlot::HonorableDismissal => "honorableDismissal",
            DocumentSlot::Tor => "tor",
            DocumentSlot::GeneralWeightedAverage => "generalWeightedAverage",
            DocumentSlot::BirthCertificate => "birthCertificate",
            DocumentSlot::IdPicture => "idPicture",
            DocumentSlot::MarriageCertificate => "marriageCertificate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentSlot::HonorableDismissal => "Honorable Dismissal",
            DocumentSlot::Tor => "Transcript of Records",
            DocumentSlot::GeneralWeightedAverage => "General Weighted Average",
            DocumentSlot::BirthCertificate => "Birth Certificate",
            DocumentSlot::IdPicture => "ID Picture",
            DocumentSlot::MarriageCertificate => "Marriage Certificate",
        }
    }

    pub fn is_mandatory(self) -> bool {
        !matches!(self, DocumentSlot::MarriageCertificate)
    }

    /// Blob folder for this slot, e.g. `documents/tor`.
    pub fn storage_folder(self) -> String {
        format!("{}/{}", crate::constants::DOCUMENTS_FOLDER, self.key())
    }
}

/// A file selected by the applicant, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    #[serde(rename = "data", with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Checks the file is non-empty and is a PNG or JPEG.
    ///
    /// The declared content type must be allowed. When the bytes carry a recognisable
    /// signature, the sniffed type must be allowed too.
    pub fn check(&self) -> Result<(), ErrorKind> {
        if self.bytes.is_empty() {
            return Err(ErrorKind::EmptyFile);
        }
        let declared = self.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_DOCUMENT_TYPES.contains(&declared.as_str()) {
            return Err(ErrorKind::UnsupportedFileType {
                content_type: self.content_type.clone(),
            });
        }
        if let Some(sniffed) = admission_files::detect_media_type(&self.bytes) {
            if !ALLOWED_DOCUMENT_TYPES.contains(&sniffed) {
                return Err(ErrorKind::UnsupportedFileType {
                    content_type: sniffed.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Attachments for every document slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAttachments {
    pub honorable_dismissal: Option<Attachment>,
    pub tor: Option<Attachment>,
    pub general_weighted_average: Option<Attachment>,
    pub birth_certificate: Option<Attachment>,
    pub id_picture: Option<Attachment>,
    pub marriage_certificate: Option<Attachment>,
}

impl DocumentAttachments {
    pub fn get(&self, slot: DocumentSlot) -> Option<&Attachment> {
        match slot {
            DocumentSlot::HonorableDismissal => self.honorable_dismissal.as_ref(),
            DocumentSlot::Tor => self.tor.as_ref(),
            DocumentSlot::GeneralWeightedAverage => self.general_weighted_average.as_ref(),
            DocumentSlot::BirthCertificate => self.birth_certificate.as_ref(),
            DocumentSlot::IdPicture => self.id_picture.as_ref(),
            DocumentSlot::MarriageCertificate => self.marriage_certificate.as_ref(),
        }
    }

    pub fn set(&mut self, slot: DocumentSlot, attachment: Option<Attachment>) {
        let target = match slot {
            DocumentSlot::HonorableDismissal => &mut self.honorable_dismissal,
            DocumentSlot::Tor => &mut self.tor,
            DocumentSlot::GeneralWeightedAverage => &mut self.general_weighted_average,
            DocumentSlot::BirthCertificate => &mut self.birth_certificate,
            DocumentSlot::IdPicture => &mut self.id_picture,
            DocumentSlot::MarriageCertificate => &mut self.marriage_certificate,
        };
        *target = attachment;
    }
}

/// Download URLs stored on a submitted admission. A missing optional slot is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentUrls {
    pub honorable_dismissal: String,
    pub tor: String,
    pub general_weighted_average: String,
    pub birth_certificate: String,
    pub id_picture: String,
    pub marriage_certificate: String,
}

impl DocumentUrls {
    pub fn get(&self, slot: DocumentSlot) -> &str {
        match slot {
            DocumentSlot::HonorableDismissal => &self.honorable_dismissal,
            DocumentSlot::Tor => &self.tor,
            DocumentSlot::GeneralWeightedAverage => &self.general_weighted_average,
            DocumentSlot::BirthCertificate => &self.birth_certificate,
            DocumentSlot::IdPicture => &self.id_picture,
            DocumentSlot::MarriageCertificate => &self.marriage_certificate,
        }
    }

    pub fn set(&mut self, slot: DocumentSlot, url: String) {
        let target = match slot {
            DocumentSlot::HonorableDismissal => &mut self.honorable_dismissal,
            DocumentSlot::Tor => &mut self.tor,
            DocumentSlot::GeneralWeightedAverage => &mut self.general_weighted_average,
            DocumentSlot::BirthCertificate => &mut self.birth_certificate,
            DocumentSlot::IdPicture => &mut self.id_picture,
            DocumentSlot::MarriageCertificate => &mut self.marriage_certificate,
        };
        *target = url;
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}
