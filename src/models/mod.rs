pub mod anime;

pub use anime::AnimeInfo;
