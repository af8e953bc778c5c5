pub mod request_id;

pub use request_id::{add_request_id, RequestId};
