pub mod debayer;
pub mod image_io;
pub mod psf;
pub mod transient;
