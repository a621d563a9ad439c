mod content_fetcher;
mod image_extractor;
mod page;

pub use content_fetcher::{ContentExtractor, ContentFetcher};
pub use image_extractor::{HtmlImageExtractor, ImageExtractor, ImageSettings};
