use std::{
    fmt::Debug,
    fs::read_to_string,
    io::{self, IsTerminal, Read, Result},
    path::Path,
};

use tracing::{debug, trace};

/// Return the string contents of a file
pub fn read_file<P: AsRef<Path> + Debug>(file_name: P) -> Result<String> {
    trace!("Trying to read from {:?}", file_name);

    let result = read_to_string(file_name);

    if result.is_err() {
        debug!("Error reading file: {:?}", result);
    } else {
        trace!("File read successfully");
    };

    result
}

/// Return everything piped into stdin, or `None` when stdin is a terminal
pub fn read_piped_stdin() -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        trace!("stdin is a terminal, not reading a plan from it");
        return Ok(None);
    }
    let mut input = String::new();
    stdin.lock().read_to_string(&mut input)?;
    trace!(bytes = input.len(), "read plan from stdin");
    Ok(Some(input))
}

/// Terminal width taken from `COLUMNS`, falling back to `default`
pub fn terminal_width(default: usize) -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(default)
}
