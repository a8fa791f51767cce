use chrono::Local;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::{self, JoinHandle};
use uuid::Uuid;

use crate::codec;
use crate::models::{
    Certification, CertificationType, Download, FileBlob, Stats, TypeFilter,
};
use crate::notify::{Notification, Notifier};
use crate::schema;
use crate::slot::DurableSlot;

/// Ordered certification collection mirrored to a [`DurableSlot`].
///
/// Cloning yields another handle to the same collection. Storage failures
/// never surface to callers: they are logged and the store carries on as if
/// the slot were empty or unavailable.
#[derive(Clone)]
pub struct CertificationStore {
    inner: Arc<Inner>,
}

struct Inner {
    certifications: RwLock<Vec<Certification>>,
    slot: Box<dyn DurableSlot>,
    notifier: Box<dyn Notifier>,
}

/// Outcome of one [`CertificationStore::add`] call.
///
/// PDFs are already in the collection when this is returned; images are
/// appended by background tasks once their preview is encoded. Dropping the
/// batch detaches those tasks, it does not cancel them.
pub struct UploadBatch {
    submitted: usize,
    appended: Vec<Certification>,
    pending: Vec<JoinHandle<Certification>>,
}

impl UploadBatch {
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for every pending image and returns all records of the batch:
    /// PDFs first, as appended during `add`, then images in submission order.
    /// Collection order may differ, since images append as they finish.
    pub async fn settled(self) -> Vec<Certification> {
        let mut certifications = self.appended;
        for handle in self.pending {
            match handle.await {
                Ok(cert) => certifications.push(cert),
                Err(e) => tracing::warn!(error = %e, "Upload task ended without a result"),
            }
        }
        certifications
    }
}

impl CertificationStore {
    /// Opens the store and restores whatever the slot holds.
    pub fn open(slot: impl DurableSlot + 'static, notifier: impl Notifier + 'static) -> Self {
        let certifications = restore(&slot);

        Self {
            inner: Arc::new(Inner {
                certifications: RwLock::new(certifications),
                slot: Box::new(slot),
                notifier: Box::new(notifier),
            }),
        }
    }

    pub async fn add(&self, files: Vec<FileBlob>) -> UploadBatch {
        let submitted = files.len();
        let uploaded_at = Local::now();
        let mut appended = Vec::new();
        let mut pending = Vec::new();

        for file in files {
            let cert = Certification::from_upload(file, uploaded_at);
            tracing::debug!(id = %cert.id, kind = %cert.kind, size = %cert.size_label, "Accepted upload");

            match cert.kind {
                CertificationType::Pdf => appended.push(self.append(cert).await),
                CertificationType::Image => {
                    let store = self.clone();
                    pending.push(tokio::spawn(async move { store.complete_image(cert).await }));
                }
            }
        }

        self.inner
            .notifier
            .notify(Notification::Uploaded { count: submitted });

        UploadBatch {
            submitted,
            appended,
            pending,
        }
    }

    async fn complete_image(self, mut cert: Certification) -> Certification {
        let media_type = cert.file.media_type.clone();
        let bytes = cert.file.bytes.clone();

        match task::spawn_blocking(move || codec::data_uri(&media_type, &bytes)).await {
            Ok(uri) => cert.preview_data_uri = Some(uri),
            Err(e) => tracing::warn!(
                id = %cert.id,
                error = %e,
                "Preview encoding failed, keeping certification without preview"
            ),
        }

        self.append(cert).await
    }

    async fn append(&self, mut cert: Certification) -> Certification {
        let mut certifications = self.inner.certifications.write().await;

        while certifications.iter().any(|c| c.id == cert.id) {
            cert.id = Uuid::new_v4().to_string();
        }

        certifications.push(cert.clone());
        self.persist(&certifications);
        cert
    }

    /// Returns `true` when a record was removed. Notifies either way.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut certifications = self.inner.certifications.write().await;
            match certifications.iter().position(|c| c.id == id) {
                Some(index) => {
                    certifications.remove(index);
                    self.persist(&certifications);
                    true
                }
                None => false,
            }
        };

        if !removed {
            tracing::debug!(id, "Remove requested for unknown certification");
        }
        self.inner.notifier.notify(Notification::Deleted);
        removed
    }

    /// Returns `true` when a record was renamed. Notifies either way.
    pub async fn rename(&self, id: &str, new_name: &str) -> bool {
        let renamed = {
            let mut certifications = self.inner.certifications.write().await;
            match certifications.iter_mut().find(|c| c.id == id) {
                Some(cert) => {
                    cert.name = new_name.to_string();
                    self.persist(&certifications);
                    true
                }
                None => false,
            }
        };

        if !renamed {
            tracing::debug!(id, "Rename requested for unknown certification");
        }
        self.inner.notifier.notify(Notification::Renamed);
        renamed
    }

    pub async fn clear(&self) {
        let mut certifications = self.inner.certifications.write().await;
        certifications.clear();
        self.persist(&certifications);
        drop(certifications);

        self.inner.notifier.notify(Notification::Cleared);
    }

    /// Records whose name contains `search` (case-insensitive) and whose type
    /// passes `filter`, in collection order.
    pub async fn query(&self, search: &str, filter: TypeFilter) -> Vec<Certification> {
        let needle = search.to_lowercase();
        let certifications = self.inner.certifications.read().await;

        certifications
            .iter()
            .filter(|c| filter.matches(c.kind))
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Certification> {
        let certifications = self.inner.certifications.read().await;
        certifications.iter().find(|c| c.id == id).cloned()
    }

    pub async fn download(&self, id: &str) -> Option<Download> {
        let cert = self.get(id).await?;

        self.inner.notifier.notify(Notification::Downloaded {
            name: cert.name.clone(),
        });

        Some(Download {
            file_name: cert.download_name(),
            media_type: cert.file.media_type,
            bytes: cert.file.bytes,
        })
    }

    pub async fn stats(&self) -> Stats {
        let certifications = self.inner.certifications.read().await;
        let total: f64 = certifications.iter().map(Certification::size_mb).sum();
        let image_count = certifications
            .iter()
            .filter(|c| c.kind == CertificationType::Image)
            .count();

        Stats {
            count: certifications.len(),
            total_size_mb: format!("{:.2}", total),
            image_count,
            pdf_count: certifications.len() - image_count,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.certifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.certifications.read().await.is_empty()
    }

    /// Writes the whole collection to the slot, or deletes the slot when the
    /// collection is empty. Called with the write lock held.
    fn persist(&self, certifications: &[Certification]) {
        let result = if certifications.is_empty() {
            self.inner.slot.delete()
        } else {
            schema::encode_envelope(certifications).and_then(|raw| self.inner.slot.save(&raw))
        };

        if let Err(e) = result {
            tracing::warn!(error = %format!("{:#}", e), "Failed to persist certifications");
        }
    }
}

fn restore(slot: &dyn DurableSlot) -> Vec<Certification> {
    let raw = match slot.load() {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Failed to read stored certifications, starting empty");
            return Vec::new();
        }
    };

    match schema::decode_envelope(&raw) {
        Ok(certifications) => {
            tracing::info!(count = certifications.len(), "Restored certifications");
            certifications
        }
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Stored certifications are unreadable, starting empty");
            Vec::new()
        }
    }
}
