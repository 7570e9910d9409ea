pub mod arxiv_client;
pub mod backend_client;
pub mod pdf_client;

pub use arxiv_client::{ArxivClient, PaperSource, SortKey, SortOrder};
pub use backend_client::{BackendClient, UploadService};
pub use pdf_client::{PdfClient, PdfService};
