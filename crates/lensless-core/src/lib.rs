pub mod capture;
pub mod compute;
pub mod consts;
pub mod error;
pub mod finalize;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod prepare;
pub mod recon;
pub mod viz;
