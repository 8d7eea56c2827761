mod app;
mod config;
mod display;
mod history;
mod logging;
mod operator;
mod telemetry;

pub use app::run_from_args;
