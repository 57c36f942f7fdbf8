pub mod comparator;
pub mod content;
pub mod filter;
pub mod scanner;
pub mod structure;
pub mod text;

pub use comparator::Comparator;
pub use content::ContentComparator;
pub use filter::{IgnoreRules, PathFilter};
pub use scanner::TreeScanner;
pub use structure::StructureComparator;
pub use text::{encoding_for_label, DecodePolicy, TextComparator};
