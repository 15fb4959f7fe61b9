//! `umbra`: computes volumetric self-shadowing for a tiled density atlas.
//!
//! Configuration is loaded from `umbra.ron` (or `--config`) and can be
//! overridden via CLI flags, e.g.
//! `umbra --input cloud.png --output shadow.png --light 1 0 0 --steps 81`.

mod run;

fn main() {
    std::process::exit(run::run_cli(std::env::args_os()));
}
