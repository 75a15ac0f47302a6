pub mod pdf;

pub use pdf::{create_pdf, pdf_data_uri};
