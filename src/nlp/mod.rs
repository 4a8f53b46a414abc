pub mod annotate;
pub mod embedding;
pub mod extract;
pub mod stopwords;

pub use annotate::UdpipeAnnotator;
pub use extract::TermExtractor;
