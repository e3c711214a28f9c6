mod command;
mod logging;
mod terminal;
mod ui;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
