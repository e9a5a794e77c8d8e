pub mod gouraud;
pub mod lighting;
pub mod phong;
pub mod sky;
