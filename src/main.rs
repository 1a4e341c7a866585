//! Inspect UFO fonts as observable object graphs and watch them for changes
//! made by other programs.

use bezy_objects::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::run_app(cli_args) {
        core::platform::handle_error(error);
    }
}
