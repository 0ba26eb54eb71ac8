mod app;
mod audio;
mod config;
mod notes;
mod playback;
mod theme;
mod widget;

use app::Rollscope;
use iced::{application, Result};

fn main() -> Result {
    env_logger::init();

    application("rollscope", Rollscope::update, Rollscope::view)
        .subscription(Rollscope::subscription)
        .theme(Rollscope::theme)
        .antialiasing(true)
        .run_with(Rollscope::create)
}
