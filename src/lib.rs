//! Certification vault: an ordered collection of uploaded images and PDFs,
//! mirrored to a single durable text slot and served over HTTP.

pub mod api;
pub mod codec;
pub mod models;
pub mod notify;
pub mod schema;
pub mod slot;
pub mod store;

pub use models::{Certification, CertificationType, Download, FileBlob, Stats, TypeFilter};
pub use notify::{ChannelNotifier, LogNotifier, Notification, Notifier};
pub use slot::{DurableSlot, FileSlot, MemorySlot};
pub use store::{CertificationStore, UploadBatch};
