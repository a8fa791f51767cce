use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::codec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationType {
    Image,
    Pdf,
}

impl CertificationType {
    /// Anything that is not declared as `image/*` is treated as a PDF.
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.starts_with("image/") {
            CertificationType::Image
        } else {
            CertificationType::Pdf
        }
    }

    pub fn download_extension(self) -> &'static str {
        match self {
            CertificationType::Image => "jpg",
            CertificationType::Pdf => "pdf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CertificationType::Image => "image",
            CertificationType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for CertificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Image,
    Pdf,
}

impl TypeFilter {
    pub fn matches(self, kind: CertificationType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Image => kind == CertificationType::Image,
            TypeFilter::Pdf => kind == CertificationType::Pdf,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "image" | "images" => Ok(TypeFilter::Image),
            "pdf" | "pdfs" => Ok(TypeFilter::Pdf),
            other => Err(format!(
                "Invalid type filter '{}'. Use 'all', 'image', or 'pdf'",
                other
            )),
        }
    }
}

/// Raw uploaded file: the bytes plus what the uploader declared about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub kind: CertificationType,
    pub upload_date: String,
    pub size_label: String,
    pub file: FileBlob,
    pub preview_data_uri: Option<String>,
}

impl Certification {
    /// Builds the pending record for a fresh upload. The preview is patched
    /// in later for images.
    pub fn from_upload(file: FileBlob, uploaded_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: codec::display_name(&file.file_name),
            kind: CertificationType::from_media_type(&file.media_type),
            upload_date: codec::upload_date(uploaded_at),
            size_label: codec::size_label(file.bytes.len()),
            file,
            preview_data_uri: None,
        }
    }

    pub fn size_mb(&self) -> f64 {
        codec::parse_size_label(&self.size_label).unwrap_or(0.0)
    }

    pub fn download_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.download_extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub count: usize,
    pub total_size_mb: String,
    pub image_count: usize,
    pub pdf_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CertificationType,
    pub upload_date: String,
    pub size: String,
    pub has_preview: bool,
}

impl From<&Certification> for CertificationSummary {
    fn from(cert: &Certification) -> Self {
        Self {
            id: cert.id.clone(),
            name: cert.name.clone(),
            kind: cert.kind,
            upload_date: cert.upload_date.clone(),
            size: cert.size_label.clone(),
            has_preview: cert.preview_data_uri.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CertificationType,
    pub upload_date: String,
    pub size: String,
    pub file_name: String,
    pub media_type: String,
    pub preview: Option<String>,
}

impl From<&Certification> for CertificationDetail {
    fn from(cert: &Certification) -> Self {
        Self {
            id: cert.id.clone(),
            name: cert.name.clone(),
            kind: cert.kind,
            upload_date: cert.upload_date.clone(),
            size: cert.size_label.clone(),
            file_name: cert.file.file_name.clone(),
            media_type: cert.file.media_type.clone(),
            preview: cert.preview_data_uri.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CertificationListResponse {
    pub certifications: Vec<CertificationSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub submitted: usize,
    pub certifications: Vec<CertificationSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub supported_formats: Vec<String>,
    pub max_upload_mb: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn classifies_by_media_type_prefix() {
        assert_eq!(CertificationType::from_media_type("image/png"), CertificationType::Image);
        assert_eq!(CertificationType::from_media_type("application/pdf"), CertificationType::Pdf);
        assert_eq!(CertificationType::from_media_type(""), CertificationType::Pdf);
        assert_eq!(CertificationType::from_media_type("text/image/"), CertificationType::Pdf);
    }

    #[test]
    fn from_upload_derives_metadata() {
        let blob = FileBlob::new("diploma.final.png", "image/png", vec![0u8; 2 * 1_048_576]);
        let cert = Certification::from_upload(blob, at_noon());

        assert_eq!(cert.name, "diploma.final");
        assert_eq!(cert.kind, CertificationType::Image);
        assert_eq!(cert.size_label, "2.00 MB");
        assert_eq!(cert.upload_date, "3/7/2024");
        assert!(cert.preview_data_uri.is_none());
        assert!(Uuid::parse_str(&cert.id).is_ok());
    }

    #[test]
    fn download_name_uses_type_extension() {
        let png = Certification::from_upload(FileBlob::new("scan.png", "image/png", vec![1]), at_noon());
        let pdf = Certification::from_upload(FileBlob::new("cert.pdf", "application/pdf", vec![1]), at_noon());

        assert_eq!(png.download_name(), "scan.jpg");
        assert_eq!(pdf.download_name(), "cert.pdf");
    }

    #[test]
    fn type_filter_parsing() {
        assert_eq!("ALL".parse::<TypeFilter>(), Ok(TypeFilter::All));
        assert_eq!("image".parse::<TypeFilter>(), Ok(TypeFilter::Image));
        assert_eq!("pdf".parse::<TypeFilter>(), Ok(TypeFilter::Pdf));
        assert!("docx".parse::<TypeFilter>().is_err());
        assert!(TypeFilter::All.matches(CertificationType::Pdf));
        assert!(!TypeFilter::Image.matches(CertificationType::Pdf));
    }
}
