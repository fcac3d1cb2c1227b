//! Command implementations for mutstrand.

pub mod background;
pub mod count;
pub mod expression;
pub mod filter_genes;
pub mod overlap;
pub mod parse_genes;
pub mod parse_vcf;

pub use background::{BackgroundCommand, BackgroundStats};
pub use count::{CountCommand, CountStats};
pub use expression::{ExpressionCommand, ExpressionStats, TissueFilter};
pub use filter_genes::{FilterGenesCommand, FilterGenesStats};
pub use overlap::{OverlapCommand, OverlapStats};
pub use parse_genes::{ParseGenesCommand, ParseGenesStats};
pub use parse_vcf::{ParseVcfCommand, ParseVcfStats, SampleTable};
