pub mod board_render;
pub mod command_parser;
pub mod config_loader;
pub mod scoreboard;
pub mod scroll_flow;
pub mod standings;
