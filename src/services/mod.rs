pub mod cloudinary;
pub mod media;
pub mod session;
pub mod sheets;
pub mod store;
pub mod threads;
