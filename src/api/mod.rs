//! OpenAPI 文档
//! OpenAPI documentation

pub mod swagger;

pub use swagger::{api_docs_path, swagger_ui, ApiDoc};
