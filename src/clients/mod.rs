pub mod mailer;
pub mod object_storage;

pub use mailer::MailClient;
pub use object_storage::{ObjectStorage, PresignedUpload};
