mod build;
mod catalog;
mod cli;
mod content;
mod logging;
mod runner;
mod tree;

fn main() -> anyhow::Result<()> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app)
}
