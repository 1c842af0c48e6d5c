pub mod actor;
pub mod routes;
pub mod state;

pub use actor::Actor;
pub use routes::create_router;
pub use state::AppState;
