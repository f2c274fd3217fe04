pub mod app;
mod chart_view;
mod comparison;
mod dashboard;
mod editor;
mod image_cache;
mod preview;
mod session;
mod theme;
mod widgets;
