//! Shell completions and man pages.

use std::io::Write;
use std::path::Path;

use clap::CommandFactory;

use crate::Cli;

const BIN_NAME: &str = "tzsleuth";

fn write_completions(shell: clap_complete::Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}

fn render_man(out: &mut impl Write) -> std::io::Result<()> {
    clap_mangen::Man::new(Cli::command()).render(out)
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

/// Print the main page, or write every page into `output`.
pub(crate) fn handle_man(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dir) = output else {
        let mut stdout = std::io::stdout().lock();
        render_man(&mut stdout)?;
        return Ok(());
    };
    std::fs::create_dir_all(dir)?;
    clap_mangen::generate_to(Cli::command(), dir)?;
    println!("Generated man pages in: {}", dir.display());
    Ok(())
}
