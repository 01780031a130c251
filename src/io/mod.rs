//! I/O modules: image sources, CSV export and interactive inputs

pub mod source;
pub mod export;
pub mod prompt;
#[cfg(feature = "gdal")]
pub mod geotiff;

pub use source::{ImageSource, MemoryImageSource, parse_product_timestamp};
pub use export::{export_csv, export_filename, write_csv};
pub use prompt::{LakeCatalog, MemoryLakeCatalog, PromptInputs};
#[cfg(feature = "gdal")]
pub use geotiff::GeotiffImageSource;
