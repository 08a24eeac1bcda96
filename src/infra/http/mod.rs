mod ledger;
mod middleware;

pub use ledger::{AppState, build_router};
pub use middleware::RequestContext;
