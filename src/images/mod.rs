mod source;
mod tools;

pub use source::{HttpImageSource, ImageSource};
#[cfg(test)]
pub(crate) use tools::png_bytes;
pub use tools::{decode_image, safe_file_stem, save_cover, ClientError, DecodedImage, FetchError, SaveError};
