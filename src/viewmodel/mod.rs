//! View-model assembly layer.

pub mod assembler;
pub mod structs;

pub use assembler::assemble;
pub use structs::{
    ActivityItem, ChartDataset, ChartKind, ChartSeries, SectionKind, SectionViewModel,
    StatsViewModel, TableViewModel,
};
