pub mod components;
pub mod list_renderer;
pub mod nav_state;
pub mod post_renderer;
