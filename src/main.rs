//! rcoach main entrypoint.

use rcoach::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if e.is_retryable() {
            eprintln!("The appointment store is busy; the operation can be retried.");
        }
        std::process::exit(1);
    }
}
