pub mod app_state;

pub use app_state::{build_state, AppState, StateBuilder};
