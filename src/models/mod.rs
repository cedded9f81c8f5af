// Request descriptors and decoded responses

pub mod request;
pub mod response;

pub use request::{ApiRequest, RequestBody};
pub use response::ApiResponse;
