mod download;
mod upload;

pub use download::block2_download;
pub use upload::block1_upload;
