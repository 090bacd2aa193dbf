use std::process::exit;

#[tokio::main]
async fn main() {
    match tinker::run().await {
        Ok(()) => exit(0),
        Err(e) => {
            eprintln!("An error occurred: {e}");
            exit(1);
        }
    }
}
