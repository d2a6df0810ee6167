use clap::Parser;
use env_logger::Env;
use log::error;

mod app;
mod args;
mod quad;

use app::App;
use args::Args;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // clion needs help in trait annotation
    let args = <Args as Parser>::parse();

    let app = match App::new(&args) {
        Ok(app) => app,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    app.run();
}
