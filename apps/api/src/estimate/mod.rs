// Estimate PDF endpoint: payload normalization, lenient item parsing, and
// the response emitter. Rendering itself lives behind `pdf::PdfGenerator`.

pub mod handlers;
pub mod items;
pub mod payload;
