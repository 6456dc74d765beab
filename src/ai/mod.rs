mod extractor;

pub use extractor::KeywordExtractor;
