//! Reads and writes the CSV files used for bulk import and export.
//!
//! Import files (`to_add.csv`, `to_delete.csv`) are `;`-delimited without a header.
//! The export file (`env_variables.csv`) is `,`-delimited with a `Name,Value` header.

mod csv_files;

pub use csv_files::*;
