//! Data provider backed by page scraping and LLM field extraction

mod extractor;
mod html;
mod page_source;
mod scraping;

pub use extractor::{parse_fields, LlmFieldExtractor};
pub use html::html_to_text;
pub use page_source::HttpPageSource;
pub use scraping::ScrapingDataProvider;
