//! Display module for formatted CLI output

pub mod colors;
pub mod describe;
pub mod human;
pub mod icons;
pub mod printer;
pub mod table;

pub use colors::ColorTheme;
pub use describe::DescribeWriter;
pub use icons::StatusIcon;
pub use printer::{print_document, print_list, print_object, OutputFormat};
pub use table::{sort_for_listing, PrintContext, Printable, TableRenderer};
