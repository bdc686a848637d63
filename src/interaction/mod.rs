pub mod click;
pub mod input;
pub mod navigate;
pub mod scroll;
pub mod wait;
