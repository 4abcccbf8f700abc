// Renders hivectl(1) plus one hivectl-<command>(1) page per visible
// subcommand into $OUT_DIR/man.

use std::fs;
use std::path::Path;

use clap::CommandFactory;

// The argument definitions need nothing beyond clap and clap_complete.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("man page directory is writable");

    let hivectl = cli::Cli::command();
    write_page(&hivectl, &man_dir);

    // Commands are one level deep: thermostats, devices, set, watch, completions.
    for command in hivectl.get_subcommands().filter(|c| !c.is_hide_set()) {
        let page = command
            .clone()
            .name(format!("{}-{}", hivectl.get_name(), command.get_name()));
        write_page(&page, &man_dir);
    }
}

fn write_page(cmd: &clap::Command, dir: &Path) {
    let path = dir.join(format!("{}.1", cmd.get_name()));

    let mut roff = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut roff)
        .unwrap_or_else(|e| panic!("rendering {}: {e}", path.display()));
    fs::write(&path, roff).unwrap_or_else(|e| panic!("writing {}: {e}", path.display()));
}
