mod article;
mod timestamp;

pub use article::{
    Article, ArticleRecord, Candidate, Category, ExtractedContent, LifecycleDates,
    NewArticle,
};
pub use timestamp::{format_timestamp, parse_timestamp, parse_wall_clock};
