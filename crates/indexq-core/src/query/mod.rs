mod results;
pub mod translate;

pub use results::{Occurrence, OccurrenceList, PatternSearch, Symbol, SymbolsAtLocation};
