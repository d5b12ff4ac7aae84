//! Attachment module
//!
//! Uploaded blobs, their on-disk store and the content resolved from them.

mod file_store;
mod model;
mod repository;

pub use file_store::FileAttachmentStore;
pub use model::{Attachment, NewAttachment, ResolvedAttachmentContent, StoredAttachment};
pub use repository::AttachmentRepository;
