//! Versioned JSON layout of the durable certification slot.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::codec;
use crate::models::{Certification, CertificationType, FileBlob};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCertification {
    pub id: String,
    pub name: String,
    pub file_name: String,
    pub file_media_type: String,
    pub file_data_encoded: String,
    #[serde(rename = "type")]
    pub kind: CertificationType,
    pub upload_date: String,
    pub size_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_data_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredEnvelope {
    pub version: u32,
    pub certifications: Vec<StoredCertification>,
}

impl From<&Certification> for StoredCertification {
    fn from(cert: &Certification) -> Self {
        Self {
            id: cert.id.clone(),
            name: cert.name.clone(),
            file_name: cert.file.file_name.clone(),
            file_media_type: cert.file.media_type.clone(),
            file_data_encoded: codec::encode_contents(&cert.file.bytes),
            kind: cert.kind,
            upload_date: cert.upload_date.clone(),
            size_label: cert.size_label.clone(),
            preview_data_uri: cert.preview_data_uri.clone(),
        }
    }
}

impl TryFrom<StoredCertification> for Certification {
    type Error = anyhow::Error;

    fn try_from(stored: StoredCertification) -> Result<Self> {
        if stored.kind == CertificationType::Pdf && stored.preview_data_uri.is_some() {
            bail!("Stored pdf certification {} carries an image preview", stored.id);
        }
        let bytes = codec::decode_contents(&stored.file_data_encoded)
            .with_context(|| format!("Certification {} has unreadable contents", stored.id))?;

        Ok(Self {
            id: stored.id,
            name: stored.name,
            kind: stored.kind,
            upload_date: stored.upload_date,
            size_label: stored.size_label,
            file: FileBlob::new(stored.file_name, stored.file_media_type, bytes),
            preview_data_uri: stored.preview_data_uri,
        })
    }
}

pub fn encode_envelope(certifications: &[Certification]) -> Result<String> {
    let envelope = StoredEnvelope {
        version: SCHEMA_VERSION,
        certifications: certifications.iter().map(StoredCertification::from).collect(),
    };
    serde_json::to_string(&envelope).context("Failed to serialize certifications")
}

/// Parses and validates a slot payload. Any problem fails the whole payload.
pub fn decode_envelope(raw: &str) -> Result<Vec<Certification>> {
    let envelope: StoredEnvelope =
        serde_json::from_str(raw).context("Failed to parse stored certifications")?;

    if envelope.version != SCHEMA_VERSION {
        bail!(
            "Unsupported certification schema version {} (expected {})",
            envelope.version,
            SCHEMA_VERSION
        );
    }

    let mut seen = HashSet::new();
    let mut certifications = Vec::with_capacity(envelope.certifications.len());
    for stored in envelope.certifications {
        if !seen.insert(stored.id.clone()) {
            bail!("Duplicate certification id {} in stored data", stored.id);
        }
        certifications.push(Certification::try_from(stored)?);
    }

    Ok(certifications)
}
