//! Example: Find a free port, hold it, then find another one.

use portfinder_core::{PortFinder, ProbeOutcome, ProbeRequest};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let finder = PortFinder::loopback();

    let request = match ProbeRequest::new(7000, 100, 5000) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Invalid request: {}", e);
            return;
        }
    };

    let first = match finder.find(&request).await {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Error finding port: {}", e);
            return;
        }
    };
    println!("First free port: {}", first);

    // Hold the first port so the next search has to step over it.
    let _listener = match TcpListener::bind(("127.0.0.1", first)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Port {} was taken before we could bind it: {}", first, e);
            return;
        }
    };

    match finder.find_outcome(&request).await {
        Ok(ProbeOutcome::Found { port }) => println!("Next free port:  {}", port),
        Ok(ProbeOutcome::Failed { reason }) => println!("No second port: {}", reason),
        Err(e) => eprintln!("Error finding port: {}", e),
    }
}
