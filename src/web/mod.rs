pub mod admin;
pub mod articles;
pub mod auth;
pub mod gate;
pub mod router;
pub mod state;
pub mod submit;
pub mod templates;

pub use state::AppState;
pub use templates::render_login_page;
