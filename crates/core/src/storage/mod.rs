//! Product images on Cloudinary.
//!
//! Uploads go through Cloudinary's signed upload API: every request carries
//! a SHA-256 signature over its sorted parameters and the API secret, so the
//! secret itself never leaves the server.
//!
//! ```text
//! POST {api_base}/{cloud_name}/image/upload    file, folder, timestamp, signature
//! POST {api_base}/{cloud_name}/image/destroy   public_id, timestamp, signature
//! ```

mod config;
mod error;
mod service;

pub use config::CloudinaryConfig;
pub use error::StorageError;
pub use service::{MediaStorage, UploadRequest, UploadedMedia};
